//! Core types for spark-fiber.
//!
//! Small shared enums and configuration that every stage of the pipeline
//! agrees on: what a fiber needs at commit time, which phase the engine is
//! in, and how strict the engine should be.

use std::ops::AddAssign;

// =============================================================================
// Pending Operation
// =============================================================================

/// Host mutation a fiber requires at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingOp {
    /// Nothing to apply (pass roots, freshly committed fibers).
    #[default]
    None,
    /// New fiber: create and append its host node.
    Place,
    /// Reused fiber: diff props in place on the existing host node.
    Update,
    /// Old fiber slated for removal. Lives in the deletion set only.
    Delete,
}

// =============================================================================
// Engine Phase
// =============================================================================

/// Where the engine is in its `IDLE → RECONCILING → COMMITTING → IDLE` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A work-in-progress tree exists and units of work remain or are done.
    Reconciling,
    /// Host mutations and effects are being applied.
    Committing,
}

// =============================================================================
// Config Flags
// =============================================================================

bitflags::bitflags! {
    /// Engine behaviour switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigFlags: u8 {
        const NONE = 0;
        /// Fail a render when hook count, kind or state type drifts.
        const STRICT_HOOKS = 1 << 0;
        /// Fail a render when an effect's dependency array changes length.
        const STRICT_DEPS = 1 << 1;
        /// Run effect cleanups for deleted subtrees.
        const UNMOUNT_CLEANUPS = 1 << 2;
    }
}

impl Default for ConfigFlags {
    fn default() -> Self {
        Self::STRICT_HOOKS | Self::STRICT_DEPS | Self::UNMOUNT_CLEANUPS
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub flags: ConfigFlags,
    /// Upper bound on commits a single `flush()` may perform before it gives
    /// up on effects that keep scheduling updates.
    pub max_flush_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flags: ConfigFlags::default(),
            max_flush_passes: 50,
        }
    }
}

impl EngineConfig {
    pub fn with_flags(mut self, flags: ConfigFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_max_flush_passes(mut self, passes: usize) -> Self {
        self.max_flush_passes = passes;
        self
    }
}

// =============================================================================
// Commit Statistics
// =============================================================================

/// Counts of what one commit applied, by fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    pub effects_run: usize,
    pub cleanups_run: usize,
}

impl CommitStats {
    /// True when the commit changed the shape of the host tree.
    pub fn is_structural(&self) -> bool {
        self.placements > 0 || self.deletions > 0
    }
}

impl AddAssign for CommitStats {
    fn add_assign(&mut self, rhs: Self) {
        self.placements += rhs.placements;
        self.updates += rhs.updates;
        self.deletions += rhs.deletions;
        self.effects_run += rhs.effects_run;
        self.cleanups_run += rhs.cleanups_run;
    }
}
