//! The highlight overlay.
//!
//! A single box, created once and reused, drawn over whatever element is
//! hovered or selected. It sits above everything else and never takes part
//! in hit-testing, so it cannot swallow the pointer events it visualises.
//!
//! Its position is not tracked automatically: callers re-invoke
//! [`Overlay::position`] whenever the covered element may have moved.

use crate::{Dom, Rect};

/// Base styles applied when the overlay element is created.
pub const OVERLAY_STYLE: [(&str, &str); 8] = [
    ("position", "absolute"),
    ("pointerEvents", "none"),
    ("background", "rgba(59, 130, 246, 0.2)"),
    ("border", "2px solid #3b82f6"),
    ("zIndex", "2147483647"),
    ("display", "none"),
    ("transition", "all 0.05s ease"),
    ("boxSizing", "border-box"),
];

/// Where the overlay currently is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OverlayState {
    /// Not displayed
    #[default]
    Hidden,
    /// Displayed over a box in document coordinates
    Shown(Rect),
}

/// Owner of the overlay element.
#[derive(Debug)]
pub struct Overlay<N> {
    id: String,
    node: Option<N>,
    state: OverlayState,
}

impl<N: Clone + PartialEq> Overlay<N> {
    /// An overlay whose element will carry the DOM id `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node: None,
            state: OverlayState::Hidden,
        }
    }

    /// The overlay's current state.
    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// The overlay element, once created.
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    /// Create and attach the overlay element. Does nothing if it exists.
    pub fn create<D: Dom<Node = N>>(&mut self, dom: &D) {
        if self.node.is_some() {
            return;
        }
        let Some(node) = dom.create_element("div") else {
            return;
        };

        dom.set_attribute(&node, "id", &self.id);
        for (property, value) in OVERLAY_STYLE {
            dom.set_inline_style(&node, property, value);
        }
        dom.append_to_body(&node);

        self.node = Some(node);
        self.state = OverlayState::Hidden;
    }

    /// Cover `target`, or hide when there is no target or it cannot report
    /// geometry.
    pub fn position<D: Dom<Node = N>>(&mut self, dom: &D, target: Option<&N>) {
        self.create(dom);

        let Some(rect) = target.and_then(|target| dom.bounding_rect(target)) else {
            self.hide(dom);
            return;
        };
        let Some(node) = &self.node else {
            return;
        };

        let rect = rect.offset_by(dom.scroll_offset());
        dom.set_inline_style(node, "display", "block");
        dom.set_inline_style(node, "top", &pixels(rect.top));
        dom.set_inline_style(node, "left", &pixels(rect.left));
        dom.set_inline_style(node, "width", &pixels(rect.width));
        dom.set_inline_style(node, "height", &pixels(rect.height));
        self.state = OverlayState::Shown(rect);
    }

    /// Hide the overlay.
    pub fn hide<D: Dom<Node = N>>(&mut self, dom: &D) {
        if let Some(node) = &self.node {
            dom.set_inline_style(node, "display", "none");
        }
        self.state = OverlayState::Hidden;
    }

    /// Whether `node` is the overlay element (or impersonates it by id).
    pub fn is_overlay<D: Dom<Node = N>>(&self, dom: &D, node: &N) -> bool {
        self.node.as_ref() == Some(node) || dom.attribute(node, "id").as_deref() == Some(&self.id)
    }

    /// Detach the overlay element. A later [`Overlay::create`] makes a new
    /// one.
    pub fn destroy<D: Dom<Node = N>>(&mut self, dom: &D) {
        if let Some(node) = self.node.take() {
            dom.remove(&node);
        }
        self.state = OverlayState::Hidden;
    }
}

fn pixels(value: f64) -> String {
    format!("{value}px")
}
