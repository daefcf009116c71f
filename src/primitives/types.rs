//! Primitive types - Prop values, property bags and cleanup.
//!
//! These types define what an element can carry. Values are plain data so
//! that two renders of the same tree compare equal; listeners are the one
//! exception and compare by identity.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::element::Element;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by effects.
///
/// Runs before the effect re-runs, or when its component unmounts.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Callback Types
// =============================================================================

/// Event listener stored in a listener-class prop.
///
/// Using Rc so the same listener can be shared between a prop bag and the
/// host node it is attached to. The argument is the event payload.
pub type Listener = Rc<dyn Fn(&PropValue)>;

// =============================================================================
// Prop Value
// =============================================================================

/// A single property value.
#[derive(Clone, Default)]
pub enum PropValue {
    /// Absence marker.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Event subscription. Equal only to the very same `Rc`.
    Listener(Listener),
}

impl PropValue {
    /// Wrap a closure as a listener value.
    pub fn listener(f: impl Fn(&PropValue) + 'static) -> Self {
        PropValue::Listener(Rc::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            PropValue::Listener(l) => Some(l),
            _ => None,
        }
    }

    /// Text a primitive renders as inside a text node.
    ///
    /// The absence marker renders as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            PropValue::Null => String::new(),
            PropValue::Bool(v) => v.to_string(),
            PropValue::Int(v) => v.to_string(),
            PropValue::Float(v) => v.to_string(),
            PropValue::Str(s) => s.to_string(),
            PropValue::Listener(_) => String::new(),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Listener(a), PropValue::Listener(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("Null"),
            PropValue::Bool(v) => write!(f, "Bool({v})"),
            PropValue::Int(v) => write!(f, "Int({v})"),
            PropValue::Float(v) => write!(f, "Float({v})"),
            PropValue::Str(s) => write!(f, "Str({s:?})"),
            PropValue::Listener(l) => write!(f, "Listener({:p})", Rc::as_ptr(l)),
        }
    }
}

impl From<()> for PropValue {
    fn from(_: ()) -> Self {
        PropValue::Null
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<Listener> for PropValue {
    fn from(value: Listener) -> Self {
        PropValue::Listener(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Reserved key that never reaches the host as a property.
pub const CHILDREN: &str = "children";

/// Key holding a text element's value.
pub const NODE_VALUE: &str = "nodeValue";

/// Property bag of an element: named values plus the ordered children.
///
/// Keys iterate in sorted order so host calls are deterministic.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    values: BTreeMap<Rc<str>, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let props = Props::new().with("id", "main").with("tabIndex", 2);
    /// ```
    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value. `children` is not a value and is ignored.
    pub fn set(&mut self, key: &str, value: impl Into<PropValue>) {
        if key == CHILDREN {
            log::warn!("`children` cannot be set as a prop value; pass children to build()");
            return;
        }
        self.values.insert(Rc::from(key), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate values in key order. Children are not included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn set_children(&mut self, children: Vec<Element>) {
        self.children = children;
    }

    /// Value of a text element, as display text.
    pub fn node_value(&self) -> String {
        self.get(NODE_VALUE).map(PropValue::to_text).unwrap_or_default()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("values", &self.values)
            .field("children", &self.children.len())
            .finish()
    }
}
