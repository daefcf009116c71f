//! Render Pipeline
//!
//! The two stages every pass goes through, implemented on [`Engine`].
//!
//! # Pipeline Architecture
//!
//! ```text
//! render() / setter ─► seed pass ─► reconcile (unit by unit, resumable) ─► commit
//! ```
//!
//! ## Data Flow
//!
//! 1. **reconcile** - Walks the work-in-progress tree one fiber at a time,
//!    runs components, diffs children, tags fibers with a [`PendingOp`]
//! 2. **commit** - Applies the tagged fibers to the host in a fixed order,
//!    runs effects, then swaps the trees
//!
//! ## Key Design Principles
//!
//! - **Committed tree is read-only during reconcile**: a pass can be dropped
//!   at any unit boundary without touching the host tree
//! - **Host mutation only in commit**: reconcile may create detached nodes,
//!   never attach or detach them
//!
//! [`Engine`]: crate::Engine
//! [`PendingOp`]: crate::PendingOp

mod commit;
mod reconcile;
