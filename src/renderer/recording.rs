//! Recording host - an in-memory host tree that logs every adapter call.
//!
//! Used by tests and as a reference adapter. The tree it maintains is real:
//! nodes have children, properties and listeners, and [`RecordingHost::markup`]
//! serializes it so assertions can compare whole trees at once.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::HostAdapter;
use crate::error::HostError;
use crate::primitives::{Listener, NODE_VALUE, PropValue};

/// Handle to a node owned by a [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One logged adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    CreateNode { tag: String },
    CreateTextNode { value: String },
    SetProperty { node: NodeId, name: String },
    RemoveProperty { node: NodeId, name: String },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    DiscardNode { node: NodeId },
}

#[derive(Debug, Clone)]
enum NodeKind {
    Container,
    Element(String),
    Text(String),
}

struct NodeRecord {
    kind: NodeKind,
    props: BTreeMap<String, PropValue>,
    listeners: BTreeMap<String, Listener>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    discarded: bool,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            props: BTreeMap::new(),
            listeners: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            discarded: false,
        }
    }
}

/// In-memory host adapter.
#[derive(Default)]
pub struct RecordingHost {
    nodes: Vec<NodeRecord>,
    calls: Vec<HostCall>,
    fail_create: Option<String>,
    fail_append: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container node to render into. Not logged as a call.
    pub fn container(&mut self) -> NodeId {
        self.push(NodeKind::Container)
    }

    /// Make every `create_node(tag)` call fail from now on.
    pub fn fail_on_create(&mut self, tag: &str) {
        self.fail_create = Some(tag.to_string());
    }

    /// Make every `append_child` of a `tag` element fail from now on.
    pub fn fail_on_append(&mut self, tag: &str) {
        self.fail_append = Some(tag.to_string());
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Count logged calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Node creations of either kind.
    pub fn creates(&self) -> usize {
        self.count(|c| matches!(c, HostCall::CreateNode { .. } | HostCall::CreateTextNode { .. }))
    }

    /// Appends into `parent`.
    pub fn appends_into(&self, parent: NodeId) -> usize {
        self.count(|c| matches!(c, HostCall::AppendChild { parent: p, .. } if *p == parent))
    }

    pub fn removes(&self) -> usize {
        self.count(|c| matches!(c, HostCall::RemoveChild { .. }))
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(node.0).and_then(|n| n.props.get(name))
    }

    /// Tag of an element node, `None` for text and containers.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_discarded(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.discarded)
    }

    /// Invoke the listener registered for `event` on `node`.
    ///
    /// Returns false when no listener is attached.
    pub fn dispatch(&self, node: NodeId, event: &str, payload: &PropValue) -> bool {
        let listener = self
            .nodes
            .get(node.0)
            .and_then(|n| n.listeners.get(event))
            .cloned();
        match listener {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }

    /// Serialize the subtree under `node` as markup.
    ///
    /// Containers render only their children, listeners are omitted.
    pub fn markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(record) = self.nodes.get(node.0) else {
            return;
        };
        match &record.kind {
            NodeKind::Text(value) => out.push_str(value),
            NodeKind::Container => {
                for child in &record.children {
                    self.write_markup(*child, out);
                }
            }
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &record.props {
                    let _ = write!(out, " {name}=\"{}\"", value.to_text());
                }
                out.push('>');
                for child in &record.children {
                    self.write_markup(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeRecord::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    fn record_mut(&mut self, node: &NodeId) -> Result<&mut NodeRecord, HostError> {
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| HostError::new(format!("unknown node {}", node.0)))
    }
}

impl HostAdapter for RecordingHost {
    type Node = NodeId;

    fn create_node(&mut self, tag: &str) -> Result<NodeId, HostError> {
        if self.fail_create.as_deref() == Some(tag) {
            return Err(HostError::new(format!("creation of <{tag}> rejected")));
        }
        self.calls.push(HostCall::CreateNode { tag: tag.to_string() });
        Ok(self.push(NodeKind::Element(tag.to_string())))
    }

    fn create_text_node(&mut self, value: &str) -> Result<NodeId, HostError> {
        self.calls.push(HostCall::CreateTextNode { value: value.to_string() });
        Ok(self.push(NodeKind::Text(value.to_string())))
    }

    fn set_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if let NodeKind::Text(text) = &mut record.kind {
            if name == NODE_VALUE {
                *text = value.to_text();
            }
        } else {
            record.props.insert(name.to_string(), value.clone());
        }
        self.calls.push(HostCall::SetProperty {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if let NodeKind::Text(text) = &mut record.kind {
            if name == NODE_VALUE {
                text.clear();
            }
        }
        record.props.remove(name);
        self.calls.push(HostCall::RemoveProperty {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.record_mut(node)?
            .listeners
            .insert(event.to_string(), listener.clone());
        self.calls.push(HostCall::AddListener {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        _listener: &Listener,
    ) -> Result<(), HostError> {
        self.record_mut(node)?.listeners.remove(event);
        self.calls.push(HostCall::RemoveListener {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        if let (Some(failing), Some(tag)) = (self.fail_append.as_deref(), self.tag(*child)) {
            if failing == tag {
                return Err(HostError::new(format!("append of <{tag}> rejected")));
            }
        }
        // Appending an attached node moves it.
        if let Some(old_parent) = self.record_mut(child)?.parent.take() {
            self.record_mut(&old_parent)?.children.retain(|c| c != child);
        }
        self.record_mut(parent)?.children.push(*child);
        self.record_mut(child)?.parent = Some(*parent);
        self.calls.push(HostCall::AppendChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let record = self.record_mut(parent)?;
        let Some(position) = record.children.iter().position(|c| c == child) else {
            return Err(HostError::new(format!(
                "node {} is not a child of {}",
                child.0, parent.0
            )));
        };
        record.children.remove(position);
        self.record_mut(child)?.parent = None;
        self.calls.push(HostCall::RemoveChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn discard_node(&mut self, node: &NodeId) -> Result<(), HostError> {
        self.record_mut(node)?.discarded = true;
        self.calls.push(HostCall::DiscardNode { node: *node });
        Ok(())
    }
}
