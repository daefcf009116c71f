//! Fiber - Unit of work and persistent tree node.
//!
//! Fibers link into a tree through `parent`, `child` and `sibling` ids
//! ("first child + next sibling"), so inserting one node during a diff is
//! O(1). `alternate` points at the fiber for the same position in the other
//! buffer. All links are [`FiberId`]s into the registry arena, never owning
//! references.

use std::rc::Rc;

use crate::primitives::{ElementType, Props};
use crate::state::HookState;
use crate::types::PendingOp;

slotmap::new_key_type! {
    /// Handle to a fiber in the registry arena.
    pub struct FiberId;
}

/// One fiber record.
pub(crate) struct Fiber<N> {
    pub(crate) kind: ElementType,
    pub(crate) props: Rc<Props>,
    /// Host node owned by this position. Always `None` for components.
    pub(crate) host: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) op: PendingOp,
    /// Hook lists, present only on component fibers that have rendered.
    pub(crate) hooks: Option<HookState>,
    /// Host node was created during the current, uncommitted pass.
    pub(crate) fresh_host: bool,
}

impl<N> Fiber<N> {
    pub(crate) fn new(kind: ElementType, props: Rc<Props>, parent: Option<FiberId>) -> Self {
        Self {
            kind,
            props,
            host: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            op: PendingOp::None,
            hooks: None,
            fresh_host: false,
        }
    }

    /// New position: no host node yet, no alternate.
    pub(crate) fn placement(kind: ElementType, props: Rc<Props>, parent: FiberId) -> Self {
        Self {
            op: PendingOp::Place,
            ..Self::new(kind, props, Some(parent))
        }
    }

    pub(crate) fn is_component(&self) -> bool {
        self.kind.is_component()
    }
}

impl<N: Clone> Fiber<N> {
    /// Same type at the same position: reuse the old host node with new
    /// props.
    pub(crate) fn reuse(old: &Fiber<N>, old_id: FiberId, props: Rc<Props>, parent: FiberId) -> Self {
        Self {
            host: old.host.clone(),
            alternate: Some(old_id),
            op: PendingOp::Update,
            ..Self::new(old.kind.clone(), props, Some(parent))
        }
    }

    /// Fresh copy of a committed fiber, used as the root of a state-update
    /// pass. Keeps the old position (parent and sibling) but no children.
    pub(crate) fn rerender(old: &Fiber<N>, old_id: FiberId) -> Self {
        Self {
            host: old.host.clone(),
            sibling: old.sibling,
            alternate: Some(old_id),
            ..Self::new(old.kind.clone(), Rc::clone(&old.props), old.parent)
        }
    }
}
