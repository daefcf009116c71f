//! Fiber Registry - Arena storage for both fiber trees.
//!
//! Manages the lifecycle of fiber records:
//! - Allocation into a slot map (stale ids never alias new fibers)
//! - Release of whole subtrees once a commit replaces them
//! - Pre-order traversal bounded to a pass root
//! - Host parent lookup for commit
//!
//! The committed tree and the work-in-progress tree share this arena.
//! Dropping an abandoned pass is a bulk release of the ids it allocated.

use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

use super::fiber::{Fiber, FiberId};

// =============================================================================
// Registry
// =============================================================================

pub(crate) struct FiberRegistry<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FiberRegistry<N> {
    pub(crate) fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    pub(crate) fn allocate(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub(crate) fn release(&mut self, id: FiberId) -> Option<Fiber<N>> {
        self.fibers.remove(id)
    }

    /// Release `id` and every descendant reachable through child links.
    ///
    /// Siblings of `id` itself are left alone. Returns the number released.
    pub(crate) fn release_subtree(&mut self, id: FiberId) -> usize {
        let mut released = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(fiber) = self.fibers.remove(current) else {
                continue;
            };
            released += 1;
            let mut child = fiber.child;
            while let Some(child_id) = child {
                stack.push(child_id);
                child = self.fibers.get(child_id).and_then(|c| c.sibling);
            }
        }
        released
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub(crate) fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    pub(crate) fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Children of `id` in sibling order.
    pub(crate) fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut child = self.fibers.get(id).and_then(|f| f.child);
        while let Some(child_id) = child {
            out.push(child_id);
            child = self.fibers.get(child_id).and_then(|c| c.sibling);
        }
        out
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Next fiber in pre-order after `id`, never leaving the subtree of
    /// `root`.
    ///
    /// First child if present; otherwise climb parents until a sibling
    /// exists. Reaching `root` while climbing ends the walk, so the root's
    /// own sibling is never visited.
    pub(crate) fn next_in_subtree(&self, id: FiberId, root: FiberId) -> Option<FiberId> {
        let fiber = self.fibers.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            let fiber = self.fibers.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            current = fiber.parent?;
        }
    }

    /// `root` and all its descendants in pre-order.
    pub(crate) fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.next_in_subtree(id, root);
        }
        out
    }

    /// Nearest ancestor of `id` that owns a host node.
    ///
    /// Component fibers own no node, so the host tree can be sparser than
    /// the fiber tree.
    pub(crate) fn host_parent(&self, id: FiberId) -> Option<&N> {
        let mut parent = self.fibers.get(id)?.parent;
        while let Some(parent_id) = parent {
            let fiber = self.fibers.get(parent_id)?;
            if let Some(host) = fiber.host.as_ref() {
                return Some(host);
            }
            parent = fiber.parent;
        }
        None
    }
}

impl<N> Index<FiberId> for FiberRegistry<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Fiber<N> {
        &self.fibers[id]
    }
}

impl<N> IndexMut<FiberId> for FiberRegistry<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        &mut self.fibers[id]
    }
}

// =============================================================================
// Tests
// =============================================================================
