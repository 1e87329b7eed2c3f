//! The inspector's interaction state.
//!
//! ```text
//!            enable
//!   Disabled ──────▸ Enabled
//!      ▲               │
//!      └───────────────┘
//!     disable / Escape
//! ```
//!
//! While enabled, the body shows a crosshair cursor and capturing
//! pointer-move and click listeners are attached at the document level.
//! Both transitions notify same-window observers.

use crate::{Dom, overlay::Overlay};

/// Cursor shown over the page while the inspector is on.
pub const INSPECTOR_CURSOR: &str = "crosshair";

/// Whether the inspector is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InspectorState {
    /// Pointer events reach the page as usual
    #[default]
    Disabled,
    /// Pointer events are intercepted to hover and select elements
    Enabled,
}

/// The mouse button of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Usually the left button
    Primary,
    /// Any other button
    Other,
}

impl PointerButton {
    /// Classify a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Self {
        if button == 0 {
            PointerButton::Primary
        } else {
            PointerButton::Other
        }
    }
}

/// What the platform adapter must do to the pointer event it delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerOutcome {
    /// Call `preventDefault()`
    pub prevent_default: bool,
    /// Call `stopPropagation()`
    pub stop_propagation: bool,
}

impl PointerOutcome {
    /// Let the event through untouched.
    pub const PASS: Self = Self {
        prevent_default: false,
        stop_propagation: false,
    };

    /// Keep the event from reaching the page's own handlers.
    pub const STOP: Self = Self {
        prevent_default: false,
        stop_propagation: true,
    };

    /// Swallow the event entirely.
    pub const SWALLOW: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };
}

/// The inspector state machine.
#[derive(Debug, Default)]
pub struct Inspector {
    state: InspectorState,
    saved_cursor: Option<String>,
}

impl Inspector {
    /// The current state.
    pub fn state(&self) -> InspectorState {
        self.state
    }

    /// Whether the inspector is on.
    pub fn is_enabled(&self) -> bool {
        self.state == InspectorState::Enabled
    }

    /// Turn the inspector on.
    pub fn enable<D: Dom>(&mut self, dom: &D) {
        if !self.is_enabled() {
            if let Some(body) = dom.body() {
                self.saved_cursor = Some(dom.inline_style(&body, "cursor"));
                dom.set_inline_style(&body, "cursor", INSPECTOR_CURSOR);
            }
            dom.bind_pointer_listeners();
            self.state = InspectorState::Enabled;
        }
        dom.notify_inspector_change(true);
    }

    /// Turn the inspector off, restoring the cursor and hiding `overlay`.
    pub fn disable<D: Dom>(&mut self, dom: &D, overlay: &mut Overlay<D::Node>) {
        if self.is_enabled() {
            if let Some(body) = dom.body() {
                let cursor = self.saved_cursor.take().unwrap_or_default();
                dom.set_inline_style(&body, "cursor", &cursor);
            }
            dom.unbind_pointer_listeners();
            self.state = InspectorState::Disabled;
        }
        overlay.hide(dom);
        dom.notify_inspector_change(false);
    }

    /// Whether `node` can be hovered or selected: anything except the
    /// document root, the body and the overlay itself.
    pub fn is_target<D: Dom>(&self, dom: &D, overlay: &Overlay<D::Node>, node: &D::Node) -> bool {
        dom.body().as_ref() != Some(node)
            && dom.root().as_ref() != Some(node)
            && !overlay.is_overlay(dom, node)
    }
}
