//! Hook runtime - `use_state` and `use_effect` for function components.
//!
//! Hooks are identified by call order, not by name. Each render of a
//! component fiber gets a fresh [`Hooks`] cursor that walks the previous
//! render's hook list (reached through the fiber's alternate) in step with
//! the calls the component makes.
//!
//! # State slots
//!
//! A state slot is created on first render and then shared by reference
//! across every later render of the same component instance. Setters push
//! actions onto the slot's queue. A render folds the queue over the
//! committed value without consuming it; the fold only becomes the new
//! committed value when that render commits. An abandoned render therefore
//! loses nothing.
//!
//! # Effects
//!
//! `use_effect` only records the callback and its dependency array. The
//! commit stage decides whether to run it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::engine::FiberId;
use crate::error::{Error, Result};
use crate::primitives::{Cleanup, PropValue};
use crate::types::ConfigFlags;

// =============================================================================
// Hook Shape
// =============================================================================

/// Kind of hook at one call index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
}

pub(crate) type HookShape = SmallVec<[HookKind; 8]>;

// =============================================================================
// Dependencies
// =============================================================================

/// Dependency array of an effect. Compared per index by value; listeners
/// compare by identity.
pub type Deps = SmallVec<[PropValue; 4]>;

/// Build a [`Deps`] array: `deps![count, name]`, or `deps![]` for run-once.
#[macro_export]
macro_rules! deps {
    () => { $crate::Deps::new() };
    ($($dep:expr),+ $(,)?) => {{
        let mut deps = $crate::Deps::new();
        $(deps.push($crate::PropValue::from($dep));)+
        deps
    }};
}

/// Shallow per-index equality. Differing lengths never match.
pub(crate) fn deps_equal(prev: &Deps, next: &Deps) -> bool {
    prev.len() == next.len() && prev.iter().zip(next.iter()).all(|(a, b)| a == b)
}

// =============================================================================
// Component Instance & Update Inbox
// =============================================================================

/// Identity of one mounted component, shared across all of its renders.
///
/// Records which committed fiber currently represents the component so that
/// setters can find it. `None` before first commit and after unmount.
pub(crate) struct Instance {
    name: Rc<str>,
    fiber: Cell<Option<FiberId>>,
}

impl Instance {
    pub(crate) fn new(name: Rc<str>) -> Self {
        Self {
            name,
            fiber: Cell::new(None),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn fiber(&self) -> Option<FiberId> {
        self.fiber.get()
    }

    pub(crate) fn mount(&self, fiber: FiberId) {
        self.fiber.set(Some(fiber));
    }

    pub(crate) fn unmount(&self) {
        self.fiber.set(None);
    }
}

/// Single-entry mailbox between setters and the engine.
///
/// Only one pending re-render exists at a time: the latest request wins.
#[derive(Default)]
pub(crate) struct Inbox {
    pending: RefCell<Option<Rc<Instance>>>,
}

impl Inbox {
    pub(crate) fn schedule(&self, instance: Rc<Instance>) {
        *self.pending.borrow_mut() = Some(instance);
    }

    pub(crate) fn take(&self) -> Option<Rc<Instance>> {
        self.pending.borrow_mut().take()
    }

    pub(crate) fn clear(&self) {
        self.pending.borrow_mut().take();
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

// =============================================================================
// State Slot
// =============================================================================

type Action<T> = Rc<dyn Fn(&T) -> T>;

struct SlotInner<T> {
    committed: T,
    queue: Vec<Action<T>>,
}

/// Persistent storage behind one `use_state` call site.
pub(crate) struct StateSlot<T> {
    inner: RefCell<SlotInner<T>>,
}

impl<T: Clone + 'static> StateSlot<T> {
    fn new(initial: T) -> Self {
        Self {
            inner: RefCell::new(SlotInner {
                committed: initial,
                queue: Vec::new(),
            }),
        }
    }

    /// Fold queued actions left-to-right over the committed value.
    ///
    /// Returns the value and how many actions it consumed. Actions run with
    /// the slot unborrowed and may enqueue more; those wait for the next
    /// render.
    fn resolve(&self) -> (T, usize) {
        let (committed, queue) = {
            let inner = self.inner.borrow();
            (inner.committed.clone(), inner.queue.clone())
        };
        let value = queue.iter().fold(committed, |acc, action| action(&acc));
        (value, queue.len())
    }

    /// Make `value` the committed value and drop the actions it consumed.
    /// Actions queued after the render stay queued.
    fn settle(&self, value: T, consumed: usize) {
        let mut inner = self.inner.borrow_mut();
        inner.committed = value;
        let consumed = consumed.min(inner.queue.len());
        inner.queue.drain(..consumed);
    }

    fn enqueue(&self, action: Action<T>) {
        self.inner.borrow_mut().queue.push(action);
    }
}

/// One state hook as recorded on a work-in-progress fiber.
pub(crate) struct StateRecord {
    slot: Rc<dyn Any>,
    settle: Option<Box<dyn FnOnce()>>,
}

impl StateRecord {
    /// Commit the value this render computed.
    pub(crate) fn settle(&mut self) {
        if let Some(settle) = self.settle.take() {
            settle();
        }
    }
}

// =============================================================================
// Setter
// =============================================================================

/// Updater returned by [`Hooks::use_state`].
///
/// Each call enqueues an action on the state slot and schedules a re-render
/// of the owning component's subtree. Setters outlive renders freely; calls
/// after the component unmounted (or the engine was dropped) are ignored.
pub struct Setter<T> {
    slot: Weak<StateSlot<T>>,
    instance: Weak<Instance>,
    inbox: Weak<Inbox>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            instance: self.instance.clone(),
            inbox: self.inbox.clone(),
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("live", &(self.slot.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + 'static> Setter<T> {
    /// Replace the state with `value`.
    pub fn set(&self, value: T) {
        self.dispatch(Rc::new(move |_: &T| value.clone()));
    }

    /// Derive the next state from the previous one.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        self.dispatch(Rc::new(f));
    }

    fn dispatch(&self, action: Action<T>) {
        let (Some(slot), Some(instance), Some(inbox)) = (
            self.slot.upgrade(),
            self.instance.upgrade(),
            self.inbox.upgrade(),
        ) else {
            log::warn!("state update ignored: component or engine is gone");
            return;
        };
        if instance.fiber().is_none() {
            log::warn!(
                "state update ignored: `{}` is not mounted",
                instance.name()
            );
            return;
        }
        slot.enqueue(action);
        log::trace!("state update scheduled for `{}`", instance.name());
        inbox.schedule(instance);
    }
}

// =============================================================================
// Effect Hook
// =============================================================================

pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;

/// One effect hook as recorded on a fiber.
pub(crate) struct EffectHook {
    pub(crate) callback: Option<EffectFn>,
    pub(crate) deps: Option<Deps>,
    pub(crate) cleanup: Option<Cleanup>,
}

impl EffectHook {
    /// Whether this effect must run given the previous render's hook.
    pub(crate) fn changed_since(&self, previous: Option<&EffectHook>) -> bool {
        match (previous, &self.deps) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(prev), Some(next)) => match &prev.deps {
                Some(prev_deps) => !deps_equal(prev_deps, next),
                None => true,
            },
        }
    }
}

// =============================================================================
// Fiber Hook State
// =============================================================================

/// Hook lists of one component fiber, rebuilt on every render.
pub(crate) struct HookState {
    pub(crate) instance: Rc<Instance>,
    pub(crate) states: Vec<StateRecord>,
    pub(crate) effects: Vec<EffectHook>,
    pub(crate) shape: HookShape,
}

/// Read-only view of the previous render's hooks, taken before a render.
pub(crate) struct PreviousHooks {
    slots: Vec<Rc<dyn Any>>,
    effect_deps: Vec<Option<Deps>>,
    shape: HookShape,
}

impl PreviousHooks {
    pub(crate) fn capture(state: &HookState) -> Self {
        Self {
            slots: state.states.iter().map(|s| Rc::clone(&s.slot)).collect(),
            effect_deps: state.effects.iter().map(|e| e.deps.clone()).collect(),
            shape: state.shape.clone(),
        }
    }
}

// =============================================================================
// Hooks Cursor
// =============================================================================

/// Per-render hook cursor handed to a component.
///
/// Call hooks unconditionally and in the same order on every render.
pub struct Hooks {
    instance: Rc<Instance>,
    inbox: Weak<Inbox>,
    previous: Option<PreviousHooks>,
    flags: ConfigFlags,
    state_index: usize,
    states: Vec<StateRecord>,
    effects: Vec<EffectHook>,
    shape: HookShape,
}

impl Hooks {
    pub(crate) fn new(
        instance: Rc<Instance>,
        inbox: Weak<Inbox>,
        previous: Option<PreviousHooks>,
        flags: ConfigFlags,
    ) -> Self {
        Self {
            instance,
            inbox,
            previous,
            flags,
            state_index: 0,
            states: Vec::new(),
            effects: Vec::new(),
            shape: HookShape::new(),
        }
    }

    /// Component-local state.
    ///
    /// Returns the current value and a setter. `initial` is only used on the
    /// first render.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (count, set_count) = hooks.use_state(0)?;
    /// set_count.update(|n| n + 1);
    /// ```
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> Result<(T, Setter<T>)> {
        self.record(HookKind::State)?;
        let index = self.state_index;

        let previous = self.previous.as_ref().and_then(|p| p.slots.get(index)).cloned();
        let slot: Rc<StateSlot<T>> = match previous {
            Some(slot) => slot.downcast::<StateSlot<T>>().map_err(|_| {
                self.violation(format!(
                    "state hook #{index} now holds a different type ({})",
                    std::any::type_name::<T>()
                ))
            })?,
            None => Rc::new(StateSlot::new(initial)),
        };

        let (value, consumed) = slot.resolve();
        let settled = value.clone();
        let settle_slot = Rc::clone(&slot);
        self.states.push(StateRecord {
            slot: Rc::clone(&slot) as Rc<dyn Any>,
            settle: Some(Box::new(move || settle_slot.settle(settled, consumed))),
        });
        self.state_index += 1;

        let setter = Setter {
            slot: Rc::downgrade(&slot),
            instance: Rc::downgrade(&self.instance),
            inbox: self.inbox.clone(),
        };
        Ok((value, setter))
    }

    /// Side effect run after commit.
    ///
    /// - `deps = None`: runs after every commit of this component
    /// - `deps = Some(deps![])`: runs once, cleaned up on unmount
    /// - `deps = Some(deps![a, b])`: runs when any dependency changes
    ///
    /// The callback may return a cleanup, which runs before the next run of
    /// this effect and on unmount.
    pub fn use_effect<F>(&mut self, callback: F, deps: Option<Deps>) -> Result<()>
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        self.record(HookKind::Effect)?;
        let index = self.effects.len();

        if self.flags.contains(ConfigFlags::STRICT_DEPS) {
            let previous = self
                .previous
                .as_ref()
                .and_then(|p| p.effect_deps.get(index))
                .and_then(Option::as_ref);
            if let (Some(prev), Some(next)) = (previous, deps.as_ref()) {
                if prev.len() != next.len() {
                    return Err(Error::DepsArity {
                        component: self.instance.name().to_string(),
                        index,
                        previous: prev.len(),
                        next: next.len(),
                    });
                }
            }
        }

        self.effects.push(EffectHook {
            callback: Some(Box::new(callback)),
            deps,
            cleanup: None,
        });
        Ok(())
    }

    /// Close the render: check the total hook count and hand the lists over
    /// to the fiber.
    pub(crate) fn finish(self) -> Result<HookState> {
        if self.flags.contains(ConfigFlags::STRICT_HOOKS) {
            if let Some(previous) = &self.previous {
                if previous.shape.len() != self.shape.len() {
                    return Err(self.violation(format!(
                        "rendered {} hooks, previous render called {}",
                        self.shape.len(),
                        previous.shape.len()
                    )));
                }
            }
        }
        Ok(HookState {
            instance: self.instance,
            states: self.states,
            effects: self.effects,
            shape: self.shape,
        })
    }

    fn record(&mut self, kind: HookKind) -> Result<()> {
        let position = self.shape.len();
        if self.flags.contains(ConfigFlags::STRICT_HOOKS) {
            if let Some(previous) = &self.previous {
                match previous.shape.get(position) {
                    Some(prev) if *prev == kind => {}
                    Some(prev) => {
                        return Err(self.violation(format!(
                            "hook #{position} was {prev:?} and is now {kind:?}"
                        )));
                    }
                    None => {
                        return Err(self.violation(format!(
                            "hook #{position} ({kind:?}) was not called in the previous render"
                        )));
                    }
                }
            }
        }
        self.shape.push(kind);
        Ok(())
    }

    fn violation(&self, detail: String) -> Error {
        Error::HookOrder {
            component: self.instance.name().to_string(),
            detail,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
