//! Error taxonomy for the engine.
//!
//! None of these are retried internally. The only recovery path after an
//! error is issuing a fresh `render()`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`HostAdapter`](crate::renderer::HostAdapter) call.
///
/// Adapters build these from whatever their platform reports. Removals and
/// property writes applied before the failing call stay applied; there is no
/// rollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything that can abort a render pass or a commit.
#[derive(Debug, Error)]
pub enum Error {
    /// A component rendered something other than exactly one element.
    #[error("component `{component}` rendered {count} elements, expected exactly one")]
    MalformedTree { component: String, count: usize },

    /// Hook calls differ in count, kind or state type between two renders.
    #[error("hook order violation in `{component}`: {detail}")]
    HookOrder { component: String, detail: String },

    /// An effect's dependency array changed length between renders.
    #[error(
        "effect #{index} in `{component}` changed dependency arity from {previous} to {next}"
    )]
    DepsArity {
        component: String,
        index: usize,
        previous: usize,
        next: usize,
    },

    /// The host adapter rejected an operation.
    #[error("host adapter failure: {0}")]
    Host(#[from] HostError),

    /// No ancestor of a fiber owns a host node. Every tree must be rooted in
    /// a host container, so this is an engine invariant violation.
    #[error("no ancestor fiber owns a host node")]
    MissingHostParent,

    /// `flush()` kept committing because effects kept scheduling updates.
    #[error("update depth exceeded after {passes} committed passes")]
    UpdateDepthExceeded { passes: usize },
}
