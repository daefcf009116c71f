//! Fiber engine - Session context for one host adapter.
//!
//! The engine owns the data structures every pipeline stage works on:
//! - Registry: slot-map arena holding both fiber trees
//! - Fiber: one tree position, linked by ids
//! - Engine: current root, in-flight pass, work cursor, deletion set
//!
//! # Double buffering
//!
//! ```text
//!  current ──► #root ──► App ──► div ──► p      (committed, host-accurate)
//!                ▲         ▲       ▲      ▲
//!                │alternate│       │      │
//!  pass.root ─► #root ──► App ──► div ──► p      (work in progress)
//! ```
//!
//! Only the work-in-progress tree is mutated during reconcile. Commit makes
//! it current in one step and releases the fibers it replaced.
//!
//! # Passes
//!
//! A pass is either a full render seeded by [`Engine::render`], or a subtree
//! update seeded by a state setter. At most one pass exists at a time; a new
//! request abandons the one in flight.

mod fiber;
mod registry;

use std::rc::Rc;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::primitives::{Element, ElementType, Props};
use crate::renderer::HostAdapter;
use crate::scheduler::{Budget, Unbounded, WorkStatus};
use crate::state::{Inbox, Instance};
use crate::types::{CommitStats, EngineConfig, PendingOp, Phase};

pub use fiber::FiberId;
pub(crate) use fiber::Fiber;
pub(crate) use registry::FiberRegistry;

/// Type tag of the fiber that wraps a host container.
pub(crate) const ROOT_TAG: &str = "#root";

// =============================================================================
// Pass
// =============================================================================

/// What a pass replaces when it commits.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PassTarget {
    /// Whole tree. `replaced` is the root it supersedes.
    Root { replaced: Option<FiberId> },
    /// One committed component fiber and its descendants.
    Subtree { committed: FiberId },
}

/// One in-flight render pass.
pub(crate) struct Pass {
    pub(crate) root: FiberId,
    pub(crate) target: PassTarget,
    /// Every fiber allocated by this pass, for bulk release on abandon.
    pub(crate) fibers: Vec<FiberId>,
    /// Recreate every top-level child instead of diffing. Set after a failed
    /// commit left the committed tree out of step with the host.
    pub(crate) rebuild: bool,
}

// =============================================================================
// Engine
// =============================================================================

/// Fiber reconciliation engine bound to one host adapter.
///
/// # Example
///
/// ```ignore
/// let mut host = RecordingHost::new();
/// let container = host.container();
/// let mut engine = Engine::new(host);
///
/// engine.render(build("div", Props::new(), children!["hello"]), container);
/// engine.flush()?;
/// ```
pub struct Engine<H: HostAdapter> {
    pub(crate) host: H,
    pub(crate) config: EngineConfig,
    pub(crate) fibers: FiberRegistry<H::Node>,
    /// Root of the committed tree.
    pub(crate) current: Option<FiberId>,
    pub(crate) pass: Option<Pass>,
    /// Next unit of work. `None` with a pass present means ready to commit.
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) inbox: Rc<Inbox>,
    pub(crate) phase: Phase,
    /// A commit failed part way. The committed tree no longer mirrors the
    /// host until the next full render commits.
    pub(crate) stale: bool,
}

impl<H: HostAdapter> Engine<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        Self {
            host,
            config,
            fibers: FiberRegistry::new(),
            current: None,
            pass: None,
            next_unit: None,
            deletions: Vec::new(),
            inbox: Rc::new(Inbox::default()),
            phase: Phase::Idle,
            stale: false,
        }
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Seed a full render of `element` into `container`.
    ///
    /// Supersedes any in-flight pass and any pending state update. Nothing is
    /// computed until [`work_loop`](Self::work_loop) or [`flush`](Self::flush)
    /// runs. Rendering into the container of the current tree diffs against
    /// it; a different container starts a fresh tree.
    pub fn render(&mut self, element: Element, container: H::Node) {
        self.start_root_pass(vec![element], container);
    }

    /// Remove everything rendered into the current container.
    ///
    /// Schedules a pass with no children, so every fiber is deleted and its
    /// effect cleanups run on commit. No-op when nothing is mounted.
    pub fn unmount(&mut self) {
        let container = self
            .current
            .and_then(|root| self.fibers.get(root))
            .and_then(|root| root.host.clone());
        match container {
            Some(container) => self.start_root_pass(Vec::new(), container),
            None => debug!("unmount requested with nothing mounted"),
        }
    }

    /// Perform units of work until the budget runs out or the pass commits.
    ///
    /// Picks up a pending state update first. At least one unit is performed
    /// per call whenever a pass exists, so progress is guaranteed even with
    /// an exhausted budget.
    ///
    /// # Errors
    ///
    /// A reconcile error abandons the pass. A commit error detaches the nodes
    /// that pass managed to attach, but other host mutations stay applied.
    /// The committed tree is then marked stale: state updates are dropped and
    /// the next [`render`](Self::render) recreates the top-level children
    /// instead of diffing against it. Either way the engine is idle again.
    pub fn work_loop(&mut self, budget: &dyn Budget) -> Result<WorkStatus> {
        if let Some(instance) = self.inbox.take() {
            self.start_update(&instance);
        }
        let Some(root) = self.pass.as_ref().map(|pass| pass.root) else {
            return Ok(WorkStatus::Idle);
        };

        while let Some(unit) = self.next_unit {
            match self.perform_unit_of_work(unit, root) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    self.abandon_pass();
                    return Err(err);
                }
            }
            if budget.should_yield() {
                break;
            }
        }

        if self.next_unit.is_some() {
            return Ok(WorkStatus::Yielded);
        }
        self.commit_root().map(WorkStatus::Committed)
    }

    /// Run to completion, including updates scheduled by effects.
    ///
    /// Returns the summed statistics of every commit.
    ///
    /// # Errors
    ///
    /// [`Error::UpdateDepthExceeded`] once `max_flush_passes` commits ran and
    /// work is still pending.
    pub fn flush(&mut self) -> Result<CommitStats> {
        let mut total = CommitStats::default();
        let mut passes = 0;
        loop {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Idle => return Ok(total),
                WorkStatus::Yielded => {}
                WorkStatus::Committed(stats) => {
                    total += stats;
                    passes += 1;
                    if passes >= self.config.max_flush_passes && self.has_pending_work() {
                        self.inbox.clear();
                        return Err(Error::UpdateDepthExceeded { passes });
                    }
                }
            }
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A failed commit left the committed tree out of step with the host.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// A pass is in flight or a state update is waiting to start one.
    pub fn has_pending_work(&self) -> bool {
        self.pass.is_some() || self.inbox.is_pending()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Container of the committed tree.
    pub fn root_host_node(&self) -> Option<&H::Node> {
        self.current
            .and_then(|root| self.fibers.get(root))
            .and_then(|root| root.host.as_ref())
    }

    /// Fibers alive in the arena, across both trees.
    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }

    /// Fibers in the committed tree, its root included.
    pub fn committed_fiber_count(&self) -> usize {
        self.current
            .map(|root| self.fibers.subtree(root).len())
            .unwrap_or(0)
    }

    // =========================================================================
    // Pass Lifecycle
    // =========================================================================

    fn start_root_pass(&mut self, children: Vec<Element>, container: H::Node) {
        self.abandon_pass();
        self.inbox.clear();

        let alternate = self.current.filter(|root| {
            self.fibers.get(*root).and_then(|f| f.host.as_ref()) == Some(&container)
        });
        let mut props = Props::new();
        props.set_children(children);

        let mut root = Fiber::new(ElementType::from(ROOT_TAG), Rc::new(props), None);
        root.host = Some(container);
        root.alternate = alternate;
        let id = self.fibers.allocate(root);

        let rebuild = self.stale && alternate.is_some();
        debug!(
            "render pass seeded ({})",
            match (alternate, rebuild) {
                (Some(_), true) => "rebuild",
                (Some(_), false) => "diff",
                (None, _) => "fresh tree",
            }
        );
        self.pass = Some(Pass {
            root: id,
            target: PassTarget::Root {
                replaced: self.current,
            },
            fibers: vec![id],
            rebuild,
        });
        self.next_unit = Some(id);
        self.phase = Phase::Reconciling;
    }

    /// Seed a pass that re-renders one committed component.
    fn start_update(&mut self, instance: &Instance) {
        if self.stale {
            warn!(
                "state update for `{}` dropped: committed tree is stale",
                instance.name()
            );
            return;
        }
        let Some(committed) = instance.fiber().filter(|id| self.fibers.contains(*id)) else {
            warn!(
                "state update for `{}` dropped: no committed fiber",
                instance.name()
            );
            return;
        };
        self.abandon_pass();

        let fiber = Fiber::rerender(&self.fibers[committed], committed);
        let id = self.fibers.allocate(fiber);
        debug!("update pass seeded for `{}`", instance.name());
        self.pass = Some(Pass {
            root: id,
            target: PassTarget::Subtree { committed },
            fibers: vec![id],
            rebuild: false,
        });
        self.next_unit = Some(id);
        self.phase = Phase::Reconciling;
    }

    /// Drop the in-flight pass without touching the committed tree.
    ///
    /// Host nodes created for the pass are detached by now; they are handed
    /// back through [`HostAdapter::discard_node`].
    pub(crate) fn abandon_pass(&mut self) {
        let Some(pass) = self.pass.take() else {
            return;
        };
        if self.next_unit.is_some() {
            warn!("abandoning uncommitted pass ({} fibers)", pass.fibers.len());
        }
        for id in self.deletions.drain(..) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.op = PendingOp::None;
            }
        }
        for id in pass.fibers {
            let Some(fiber) = self.fibers.release(id) else {
                continue;
            };
            if !fiber.fresh_host {
                continue;
            }
            if let Some(node) = fiber.host {
                if let Err(err) = self.host.discard_node(&node) {
                    warn!("discard_node failed for {node:?}: {err}");
                }
            }
        }
        self.next_unit = None;
        self.phase = Phase::Idle;
    }

    /// Allocate a fiber owned by the current pass.
    pub(crate) fn allocate(&mut self, fiber: Fiber<H::Node>) -> FiberId {
        let id = self.fibers.allocate(fiber);
        if let Some(pass) = self.pass.as_mut() {
            pass.fibers.push(id);
        }
        id
    }
}

// =============================================================================
// Tests
// =============================================================================
