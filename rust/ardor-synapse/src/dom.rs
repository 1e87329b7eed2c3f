//! The document seam.
//!
//! Everything the bridge reads from or does to the page goes through
//! [`Dom`]. The browser implementation lives in the `web` module; the
//! `helpers` feature adds [`MemoryDom`], an emulated document used by the
//! test suites.
//!
//! Style property names are the camelCase names of `CSSStyleDeclaration`
//! (`backgroundColor`, `zIndex`, ...), matching what a host frame sends in
//! `UPDATE_STYLE` commands.

use std::fmt::Debug;

#[cfg(any(test, feature = "helpers"))]
mod memory;
#[cfg(any(test, feature = "helpers"))]
pub use memory::*;

/// A viewport-relative box, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Distance from the top of the viewport
    pub top: f64,
    /// Distance from the left of the viewport
    pub left: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl Rect {
    /// Shift the box by the current scroll position, turning viewport
    /// coordinates into document coordinates.
    pub fn offset_by(self, scroll: ScrollOffset) -> Self {
        Self {
            top: self.top + scroll.y,
            left: self.left + scroll.x,
            ..self
        }
    }
}

/// The document's current scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    /// Horizontal scroll (`window.scrollX`)
    pub x: f64,
    /// Vertical scroll (`window.scrollY`)
    pub y: f64,
}

/// The measurements the document height is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeightSources {
    /// `body.scrollHeight`
    pub body_scroll: f64,
    /// `body.offsetHeight`
    pub body_offset: f64,
    /// `documentElement.clientHeight`
    pub root_client: f64,
    /// `documentElement.scrollHeight`
    pub root_scroll: f64,
    /// `documentElement.offsetHeight`
    pub root_offset: f64,
}

impl HeightSources {
    /// The document height: the largest of all sources.
    pub fn height(&self) -> f64 {
        [
            self.body_scroll,
            self.body_offset,
            self.root_client,
            self.root_scroll,
            self.root_offset,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

/// Access to the embedded document.
///
/// Methods take `&self`; implementations use interior mutability the way
/// the browser DOM does. None of the operations fail: a missing node or an
/// unsupported query degrades to `None`, an empty string or a no-op.
pub trait Dom {
    /// Handle to an element
    type Node: Clone + PartialEq + Debug;

    /// `document.body`
    fn body(&self) -> Option<Self::Node>;

    /// `document.documentElement`
    fn root(&self) -> Option<Self::Node>;

    /// The element's tag name as the DOM reports it (usually upper case)
    fn tag_name(&self, node: &Self::Node) -> String;

    /// The element's class list, or `None` when `className` is not a plain
    /// string (as on SVG elements)
    fn class_name(&self, node: &Self::Node) -> Option<String>;

    /// Read an attribute
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Write an attribute
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Element children in document order; text nodes are not included
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// The viewport-relative bounding box, or `None` when the node cannot
    /// report geometry
    fn bounding_rect(&self, node: &Self::Node) -> Option<Rect>;

    /// The document's scroll position
    fn scroll_offset(&self) -> ScrollOffset;

    /// Rendered text content, when the element exposes one
    fn inner_text(&self, node: &Self::Node) -> Option<String>;

    /// A computed style property
    fn computed_style(&self, node: &Self::Node, property: &str) -> String;

    /// An inline style property (empty when unset)
    fn inline_style(&self, node: &Self::Node, property: &str) -> String;

    /// Write an inline style property
    fn set_inline_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Create a detached element
    fn create_element(&self, tag: &str) -> Option<Self::Node>;

    /// Append an element as the last child of the body
    fn append_to_body(&self, node: &Self::Node);

    /// Detach an element from its parent
    fn remove(&self, node: &Self::Node);

    /// The first attached element whose attribute `name` equals `value`
    fn find_by_attribute(&self, name: &str, value: &str) -> Option<Self::Node>;

    /// Smoothly scroll the element to the centre of the viewport
    fn scroll_into_view(&self, node: &Self::Node);

    /// The measurements the document height is derived from
    fn height_sources(&self) -> HeightSources;

    /// Attach the capturing pointer-move and click listeners
    fn bind_pointer_listeners(&self);

    /// Detach the capturing pointer-move and click listeners
    fn unbind_pointer_listeners(&self);

    /// Tell same-window observers that the inspector changed state
    fn notify_inspector_change(&self, enabled: bool);

    /// Whether the document is running inside another frame
    fn is_embedded(&self) -> bool;

    /// Write a line to the page's own console
    fn write_console(&self, line: &str);
}
