//! State Module - Per-component memory across renders.
//!
//! - **Hooks** - `use_state` / `use_effect` slots indexed by call order
//! - **Setters** - Queue updates and schedule subtree re-renders

mod hooks;

pub use hooks::{Deps, HookKind, Hooks, Setter};

pub(crate) use hooks::{HookState, Inbox, Instance, PreviousHooks};
