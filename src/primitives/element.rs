//! Element Builder - Immutable tree descriptions.
//!
//! An element says what should be rendered at one tree position. Elements
//! are produced fresh on every render and never mutated; the reconciler
//! compares them against the fibers of the previous render.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::{build, children, Props};
//!
//! let tree = build(
//!     "div",
//!     Props::new().with("id", "root"),
//!     children![
//!         build("p", Props::new(), children!["hi"]),
//!         build("span", Props::new(), children![42]),
//!     ],
//! );
//! ```

use std::fmt;
use std::rc::Rc;

use super::types::{NODE_VALUE, PropValue, Props};
use crate::error::Result;
use crate::state::Hooks;

// =============================================================================
// Component
// =============================================================================

type RenderFn = dyn Fn(&Props, &mut Hooks) -> Result<Vec<Element>>;

/// A function component.
///
/// Components receive their props and a [`Hooks`] cursor and return exactly
/// one element. Two components are the same type only when they share the
/// same `Rc`, so create each component once and clone it.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    /// Wrap a render function.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let counter = Component::new("Counter", |_props, hooks| {
    ///     let (count, _set) = hooks.use_state(0)?;
    ///     Ok(build("span", Props::new(), children![count]))
    /// });
    /// ```
    pub fn new<F, R>(name: &str, render: F) -> Self
    where
        F: Fn(&Props, &mut Hooks) -> Result<R> + 'static,
        R: IntoRendered,
    {
        let render: Rc<RenderFn> = Rc::new(move |props: &Props, hooks: &mut Hooks| {
            render(props, hooks).map(IntoRendered::into_rendered)
        });
        Self {
            name: Rc::from(name),
            render,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_rc(&self) -> Rc<str> {
        Rc::clone(&self.name)
    }

    pub(crate) fn call(&self, props: &Props, hooks: &mut Hooks) -> Result<Vec<Element>> {
        (self.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// What a component may return. Anything other than one element is rejected
/// by the reconciler.
pub trait IntoRendered {
    fn into_rendered(self) -> Vec<Element>;
}

impl IntoRendered for Element {
    fn into_rendered(self) -> Vec<Element> {
        vec![self]
    }
}

impl IntoRendered for Option<Element> {
    fn into_rendered(self) -> Vec<Element> {
        self.into_iter().collect()
    }
}

impl IntoRendered for Vec<Element> {
    fn into_rendered(self) -> Vec<Element> {
        self
    }
}

// =============================================================================
// Element Type
// =============================================================================

/// Type tag of an element, decided once at construction.
#[derive(Clone, PartialEq)]
pub enum ElementType {
    /// Text node. Its value lives in the `nodeValue` prop.
    Text,
    /// Host node identified by a tag such as `"div"`.
    Host(Rc<str>),
    /// Function component.
    Component(Component),
}

impl ElementType {
    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }

    /// Name used in logs and errors.
    pub fn label(&self) -> &str {
        match self {
            ElementType::Text => "#text",
            ElementType::Host(tag) => tag,
            ElementType::Component(c) => c.name(),
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Text => f.write_str("Text"),
            ElementType::Host(tag) => write!(f, "Host({tag})"),
            ElementType::Component(c) => c.fmt(f),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(Rc::from(tag))
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        ElementType::Component(component.clone())
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable description of one tree position.
///
/// Cloning is cheap: the prop bag is shared.
#[derive(Clone)]
pub struct Element {
    kind: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub(crate) fn from_parts(kind: ElementType, props: Props) -> Self {
        Self {
            kind,
            props: Rc::new(props),
        }
    }

    pub fn kind(&self) -> &ElementType {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && (Rc::ptr_eq(&self.props, &other.props) || self.props == other.props)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .finish()
    }
}

// =============================================================================
// Children
// =============================================================================

/// One child argument to [`build`]: an element, or a primitive that becomes a
/// text element.
#[derive(Clone, Debug)]
pub enum Child {
    Element(Element),
    Value(PropValue),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Value(value) => text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&Element> for Child {
    fn from(element: &Element) -> Self {
        Child::Element(element.clone())
    }
}

macro_rules! child_from_primitive {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Value(value.into())
                }
            }
        )*
    };
}

child_from_primitive!((), bool, i32, i64, usize, f64, &str, String);

/// Collect heterogeneous child arguments for [`build`].
#[macro_export]
macro_rules! children {
    () => { ::std::vec::Vec::<$crate::Child>::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),+]
    };
}

// =============================================================================
// Builders
// =============================================================================

/// Build an element from a type tag, a property bag and child arguments.
///
/// Primitive children are wrapped into text elements; element children pass
/// through unchanged. Zero children is fine.
pub fn build(
    kind: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut props = props;
    props.set_children(children.into_iter().map(Child::into_element).collect());
    Element::from_parts(kind.into(), props)
}

/// Build a text element holding `value`.
pub fn text(value: impl Into<PropValue>) -> Element {
    let value: PropValue = value.into();
    let props = Props::new().with(NODE_VALUE, value.to_text());
    Element::from_parts(ElementType::Text, props)
}
