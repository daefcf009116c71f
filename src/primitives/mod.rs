//! Primitives - Elements, components and prop values.
//!
//! This module provides the declarative side of the engine:
//! - [`build`] / [`text`] - Element builders
//! - [`Component`] - Function components with hooks
//! - [`PropValue`] / [`Props`] - Property bags
//!
//! # Architecture
//!
//! Elements are immutable descriptions. Each render produces a fresh element
//! tree, and the reconciler diffs it against the fibers it built last time:
//!
//! ```text
//! build("div", props, children![...]) → Element → render() → Fiber tree → Host tree
//! ```

mod element;
mod types;

pub use element::*;
pub use types::*;
