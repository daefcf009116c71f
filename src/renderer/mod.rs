//! Renderer - Host adapter contract and property diffing.
//!
//! The engine never touches a presentation medium directly. Everything it
//! needs from the platform goes through [`HostAdapter`]: create nodes, apply
//! property changes, attach and detach children.
//!
//! # Property classes
//!
//! Props split into two classes that follow the same add/remove/update rules
//! but use different adapter calls:
//! - **Listeners**: keys starting with `on` (any case) holding a
//!   [`PropValue::Listener`]. The event name is the rest of the key,
//!   lowercased: `onClick` → `click`.
//! - **Properties**: everything else except `children`.
//!
//! # Diff order
//!
//! [`apply_props`] always runs in this order:
//! 1. Remove listeners that are gone or changed
//! 2. Remove properties that are gone
//! 3. Set properties that are new or changed
//! 4. Add listeners that are new or changed

mod recording;

use std::fmt::Debug;

use crate::error::HostError;
use crate::primitives::{CHILDREN, Listener, PropValue, Props};

pub use recording::{HostCall, NodeId, RecordingHost};

// =============================================================================
// Host Adapter
// =============================================================================

/// Platform hooks the engine drives during reconcile and commit.
///
/// All calls may fail. A failure aborts the current pass (during reconcile)
/// or the current commit step; mutations already applied stay applied.
pub trait HostAdapter {
    /// Handle to one host node. Cloned into every fiber that reuses it.
    type Node: Clone + PartialEq + Debug;

    fn create_node(&mut self, tag: &str) -> Result<Self::Node, HostError>;

    fn create_text_node(&mut self, value: &str) -> Result<Self::Node, HostError>;

    fn set_property(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn remove_property(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    fn add_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Release a node that was created for a pass that never committed.
    ///
    /// The node is detached by the time this runs. Adapters that own no
    /// resources per node can leave this as a no-op.
    fn discard_node(&mut self, _node: &Self::Node) -> Result<(), HostError> {
        Ok(())
    }
}

// =============================================================================
// Property Classification
// =============================================================================

/// Whether `key` names an event subscription.
pub fn is_event(key: &str) -> bool {
    key.len() > 2 && key.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

/// Event name for a listener key: `onClick` → `click`.
pub fn event_name(key: &str) -> String {
    key[2..].to_ascii_lowercase()
}

fn as_listener<'a>(key: &str, value: &'a PropValue) -> Option<&'a Listener> {
    if is_event(key) {
        value.as_listener()
    } else {
        None
    }
}

fn is_property(key: &str, value: &PropValue) -> bool {
    key != CHILDREN && as_listener(key, value).is_none()
}

// =============================================================================
// Apply Props
// =============================================================================

/// Apply the difference between two prop bags to a host node.
///
/// Unchanged values produce no adapter calls at all, so re-rendering an
/// identical tree is silent at the host level.
pub fn apply_props<H: HostAdapter + ?Sized>(
    host: &mut H,
    node: &H::Node,
    prev: &Props,
    next: &Props,
) -> Result<(), HostError> {
    // 1. Stale listeners
    for (key, value) in prev.iter() {
        if let Some(listener) = as_listener(key, value) {
            if next.get(key) != Some(value) {
                log::trace!("remove_listener {node:?} {key}");
                host.remove_listener(node, &event_name(key), listener)?;
            }
        }
    }

    // 2. Gone properties, including keys that turned into listeners
    for (key, value) in prev.iter() {
        let kept = next.get(key).is_some_and(|next_value| is_property(key, next_value));
        if is_property(key, value) && !kept {
            log::trace!("remove_property {node:?} {key}");
            host.remove_property(node, key)?;
        }
    }

    // 3. New or changed properties
    for (key, value) in next.iter() {
        if is_property(key, value) && prev.get(key) != Some(value) {
            log::trace!("set_property {node:?} {key}={value:?}");
            host.set_property(node, key, value)?;
        }
    }

    // 4. New or changed listeners
    for (key, value) in next.iter() {
        if let Some(listener) = as_listener(key, value) {
            if prev.get(key) != Some(value) {
                log::trace!("add_listener {node:?} {key}");
                host.add_listener(node, &event_name(key), listener)?;
            }
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
