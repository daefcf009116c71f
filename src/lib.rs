//! # spark-fiber
//!
//! Incremental UI reconciliation engine for retained host trees.
//!
//! ## Architecture
//!
//! spark-fiber keeps two fiber trees in one arena: the committed tree, which
//! mirrors the host exactly, and a work-in-progress tree built one unit of
//! work at a time. Reconciliation can stop between any two units and resume
//! later; nothing reaches the host until the pass commits.
//!
//! ```text
//! Element tree → render() → reconcile (resumable) → commit → Host tree
//!                  ▲                                   │
//!                  └───────── Setter (use_state) ◄─────┘ effects
//! ```
//!
//! ## Modules
//!
//! - [`primitives`] - Elements, components, property values
//! - [`engine`] - Fiber arena and the [`Engine`] session
//! - [`pipeline`] - Reconcile and commit stages
//! - [`state`] - `use_state` / `use_effect` hook runtime
//! - [`renderer`] - Host adapter contract, prop diffing, recording host
//! - [`scheduler`] - Cooperative yield budgets
//! - [`types`] - Shared enums and configuration
//!
//! ## Example
//!
//! ```ignore
//! use spark_fiber::*;
//!
//! let counter = Component::new("Counter", |_props: &Props, hooks: &mut Hooks| {
//!     let (count, set_count) = hooks.use_state(0i64)?;
//!     let on_click = PropValue::listener(move |_| set_count.update(|n| n + 1));
//!     Ok(build("button", Props::new().with("onClick", on_click), children![count]))
//! });
//!
//! let mut host = RecordingHost::new();
//! let container = host.container();
//! let mut engine = Engine::new(host);
//! engine.render(build(&counter, Props::new(), children![]), container);
//! engine.flush()?;
//! ```

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod scheduler;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::{Engine, FiberId};

pub use error::{Error, HostError, Result};

pub use primitives::{
    build, text, Child, Cleanup, Component, Element, ElementType, IntoRendered, Listener,
    PropValue, Props, CHILDREN, NODE_VALUE,
};

pub use renderer::{apply_props, HostAdapter, HostCall, NodeId, RecordingHost};

pub use scheduler::{Budget, Deadline, UnitBudget, Unbounded, WorkStatus};

pub use state::{Deps, HookKind, Hooks, Setter};
