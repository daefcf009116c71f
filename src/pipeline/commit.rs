//! Commit - Apply a finished pass to the host and make it current.
//!
//! Steps, in this fixed order:
//! 1. Deletions: detach the host nodes of every fiber in the deletion set
//! 2. Placements and updates, pre-order over the new tree
//! 3. Effect cleanups: unmounted subtrees, then effects whose deps changed
//! 4. Effect callbacks for new, changed or dependency-less effects
//! 5. Swap: the pass becomes current, replaced fibers are released
//!
//! Only steps 1 and 2 talk to the host and can fail. A failure there detaches
//! whatever the pass attached and discards its new nodes. Deletions and prop
//! updates already applied stay applied, so the old tree stays current but is
//! marked stale, and the next full render rebuilds the top level.

use std::rc::Rc;

use log::{debug, trace, warn};

use crate::engine::{Engine, FiberId, Pass, PassTarget};
use crate::error::{Error, Result};
use crate::renderer::{HostAdapter, apply_props};
use crate::types::{CommitStats, ConfigFlags, PendingOp, Phase};

impl<H: HostAdapter> Engine<H> {
    /// Commit the finished pass. No-op without one.
    pub(crate) fn commit_root(&mut self) -> Result<CommitStats> {
        let Some(pass) = self.pass.take() else {
            return Ok(CommitStats::default());
        };
        self.next_unit = None;
        self.phase = Phase::Committing;
        let deletions = std::mem::take(&mut self.deletions);
        let order = self.fibers.subtree(pass.root);

        let mut stats = CommitStats {
            deletions: deletions.len(),
            ..Default::default()
        };

        let mut attached = Vec::new();
        let result = self.commit_mutations(
            &order,
            &deletions,
            pass.rebuild,
            &mut attached,
            &mut stats,
        );
        if let Err(err) = result {
            warn!("commit failed, committed tree is now stale: {err}");
            self.detach_attached(&attached);
            self.drop_failed_pass(pass, deletions);
            return Err(err);
        }

        self.settle_hooks(&order);
        self.commit_cleanups(&order, &deletions, &mut stats);
        if let PassTarget::Root {
            replaced: Some(replaced),
        } = pass.target
        {
            // A root without alternate moved to another container. The old
            // tree is orphaned.
            if self.fibers[pass.root].alternate.is_none() {
                self.unmount_subtree(replaced, &mut stats);
            }
        }
        self.commit_effects(&order, &mut stats);
        self.swap_trees(&pass, &order);

        debug!(
            "committed: {} placed, {} updated, {} deleted, {} effects, {} cleanups",
            stats.placements, stats.updates, stats.deletions, stats.effects_run, stats.cleanups_run
        );
        self.phase = Phase::Idle;
        Ok(stats)
    }

    // =========================================================================
    // Host Mutations
    // =========================================================================

    /// Apply deletions, then placements and updates. Every successful append
    /// is recorded in `attached` as `(parent, node)`.
    ///
    /// A rebuild pass deletes nodes a failed commit may already have removed,
    /// so it logs missing ones instead of failing.
    fn commit_mutations(
        &mut self,
        order: &[FiberId],
        deletions: &[FiberId],
        rebuild: bool,
        attached: &mut Vec<(H::Node, H::Node)>,
        stats: &mut CommitStats,
    ) -> Result<()> {
        for &id in deletions {
            self.commit_deletion(id, rebuild)?;
        }

        for &id in order {
            let fiber = &self.fibers[id];
            match fiber.op {
                PendingOp::Place => {
                    stats.placements += 1;
                    let Some(node) = fiber.host.clone() else {
                        continue;
                    };
                    let parent = self
                        .fibers
                        .host_parent(id)
                        .cloned()
                        .ok_or(Error::MissingHostParent)?;
                    trace!("append {node:?} into {parent:?}");
                    self.host.append_child(&parent, &node)?;
                    attached.push((parent, node));
                }
                PendingOp::Update => {
                    stats.updates += 1;
                    let Some(node) = fiber.host.clone() else {
                        continue;
                    };
                    let next = Rc::clone(&fiber.props);
                    let prev = fiber
                        .alternate
                        .and_then(|alt| self.fibers.get(alt))
                        .map(|alt| Rc::clone(&alt.props));
                    if let Some(prev) = prev {
                        if !Rc::ptr_eq(&prev, &next) {
                            apply_props(&mut self.host, &node, &prev, &next)?;
                        }
                    }
                }
                PendingOp::Delete | PendingOp::None => {}
            }
        }
        Ok(())
    }

    /// Detach the host nodes owned by a deleted fiber.
    ///
    /// Component fibers own no node, so their children are searched for the
    /// nearest owned nodes instead.
    fn commit_deletion(&mut self, id: FiberId, tolerate_missing: bool) -> Result<()> {
        let parent = self
            .fibers
            .host_parent(id)
            .cloned()
            .ok_or(Error::MissingHostParent)?;
        let mut nodes = Vec::new();
        self.owned_host_nodes(id, &mut nodes);
        for node in nodes {
            trace!("remove {node:?} from {parent:?}");
            match self.host.remove_child(&parent, &node) {
                Ok(()) => {}
                Err(err) if tolerate_missing => warn!("stale node {node:?} not removed: {err}"),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Nearest host nodes at or below `id`.
    fn owned_host_nodes(&self, id: FiberId, out: &mut Vec<H::Node>) {
        if let Some(node) = self.fibers[id].host.as_ref() {
            out.push(node.clone());
            return;
        }
        for child in self.fibers.children(id) {
            self.owned_host_nodes(child, out);
        }
    }

    /// Undo the appends of a failed commit. Nodes whose parent was attached
    /// by the same commit leave together with that parent.
    fn detach_attached(&mut self, attached: &[(H::Node, H::Node)]) {
        for (parent, node) in attached {
            if attached.iter().any(|(_, other)| other == parent) {
                continue;
            }
            trace!("detach {node:?} from {parent:?}");
            if let Err(err) = self.host.remove_child(parent, node) {
                warn!("detach of {node:?} failed: {err}");
            }
        }
    }

    /// Release a pass whose commit failed and mark the old tree stale.
    ///
    /// Goes through the same path as a superseded pass, so the nodes it
    /// created are handed back through `discard_node`.
    fn drop_failed_pass(&mut self, pass: Pass, deletions: Vec<FiberId>) {
        self.deletions = deletions;
        self.pass = Some(pass);
        self.abandon_pass();
        self.inbox.clear();
        self.stale = true;
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Make each rendered state value the committed one and point every
    /// component instance at its new fiber.
    fn settle_hooks(&mut self, order: &[FiberId]) {
        for &id in order {
            let Some(hooks) = self.fibers.get_mut(id).and_then(|f| f.hooks.as_mut()) else {
                continue;
            };
            for state in &mut hooks.states {
                state.settle();
            }
            hooks.instance.mount(id);
        }
    }

    fn commit_cleanups(&mut self, order: &[FiberId], deletions: &[FiberId], stats: &mut CommitStats) {
        for &id in deletions {
            self.unmount_subtree(id, stats);
        }

        for &id in order {
            let Some(alt) = self.fibers[id].alternate else {
                continue;
            };
            let (Some(next), Some(prev)) = (
                self.fibers[id].hooks.as_ref(),
                self.fibers.get(alt).and_then(|f| f.hooks.as_ref()),
            ) else {
                continue;
            };
            let changed: Vec<bool> = next
                .effects
                .iter()
                .enumerate()
                .map(|(index, effect)| effect.changed_since(prev.effects.get(index)))
                .collect();
            let previous_count = prev.effects.len();

            for index in 0..previous_count {
                let cleanup = self
                    .fibers
                    .get_mut(alt)
                    .and_then(|f| f.hooks.as_mut())
                    .and_then(|h| h.effects.get_mut(index))
                    .and_then(|e| e.cleanup.take());

                match changed.get(index) {
                    // Unchanged: nothing runs, the cleanup moves forward.
                    Some(false) => {
                        if let Some(effect) = self
                            .fibers
                            .get_mut(id)
                            .and_then(|f| f.hooks.as_mut())
                            .and_then(|h| h.effects.get_mut(index))
                        {
                            effect.callback = None;
                            effect.cleanup = cleanup;
                        }
                    }
                    // Changed, or dropped from this render.
                    _ => {
                        if let Some(cleanup) = cleanup {
                            cleanup();
                            stats.cleanups_run += 1;
                        }
                    }
                }
            }
        }
    }

    fn commit_effects(&mut self, order: &[FiberId], stats: &mut CommitStats) {
        for &id in order {
            let count = self
                .fibers
                .get(id)
                .and_then(|f| f.hooks.as_ref())
                .map_or(0, |h| h.effects.len());
            for index in 0..count {
                let Some(effect) = self
                    .fibers
                    .get_mut(id)
                    .and_then(|f| f.hooks.as_mut())
                    .and_then(|h| h.effects.get_mut(index))
                else {
                    continue;
                };
                let Some(callback) = effect.callback.take() else {
                    continue;
                };
                effect.cleanup = callback();
                stats.effects_run += 1;
            }
        }
    }

    /// Mark every component under `root` unmounted and run its pending
    /// cleanups when configured to.
    fn unmount_subtree(&mut self, root: FiberId, stats: &mut CommitStats) {
        let run_cleanups = self.config.flags.contains(ConfigFlags::UNMOUNT_CLEANUPS);
        for id in self.fibers.subtree(root) {
            let Some(hooks) = self.fibers.get_mut(id).and_then(|f| f.hooks.as_mut()) else {
                continue;
            };
            trace!("unmount `{}`", hooks.instance.name());
            hooks.instance.unmount();
            if !run_cleanups {
                continue;
            }
            for effect in &mut hooks.effects {
                if let Some(cleanup) = effect.cleanup.take() {
                    cleanup();
                    stats.cleanups_run += 1;
                }
            }
        }
    }

    // =========================================================================
    // Tree Swap
    // =========================================================================

    fn swap_trees(&mut self, pass: &Pass, order: &[FiberId]) {
        for &id in order {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.alternate = None;
                fiber.op = PendingOp::None;
                fiber.fresh_host = false;
            }
        }

        match pass.target {
            PassTarget::Root { replaced } => {
                self.current = Some(pass.root);
                self.stale = false;
                if let Some(replaced) = replaced.filter(|old| *old != pass.root) {
                    self.fibers.release_subtree(replaced);
                }
            }
            PassTarget::Subtree { committed } => {
                self.splice(pass.root, committed);
                self.fibers.release_subtree(committed);
            }
        }
    }

    /// Put `fresh` where `old` sits in its parent's child chain.
    fn splice(&mut self, fresh: FiberId, old: FiberId) {
        let Some(parent) = self.fibers.get(old).and_then(|f| f.parent) else {
            return;
        };
        if self.fibers[parent].child == Some(old) {
            self.fibers[parent].child = Some(fresh);
            return;
        }
        let mut cursor = self.fibers[parent].child;
        while let Some(id) = cursor {
            let sibling = self.fibers[id].sibling;
            if sibling == Some(old) {
                self.fibers[id].sibling = Some(fresh);
                return;
            }
            cursor = sibling;
        }
    }
}
