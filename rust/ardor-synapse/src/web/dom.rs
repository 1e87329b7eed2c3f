use std::{cell::RefCell, rc::Rc};

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, HtmlElement, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, Window,
};

use crate::{Dom, HeightSources, Rect, ScrollOffset};

use super::listener::{Handler, Listener};

/// Name of the window event fired whenever the inspector is toggled.
pub const INSPECTOR_CHANGE_EVENT: &str = "ardor-inspector-change";

#[derive(Default)]
struct PointerListeners {
    handlers: Vec<(&'static str, Handler)>,
    active: Vec<Listener>,
}

/// [`Dom`] over the live browser document.
#[derive(Clone)]
pub struct WebDom {
    window: Window,
    document: Document,
    pointer: Rc<RefCell<PointerListeners>>,
}

impl WebDom {
    /// The document of `window`, if it has one.
    pub fn new(window: Window) -> Option<Self> {
        let document = window.document()?;
        Some(Self {
            window,
            document,
            pointer: Rc::default(),
        })
    }

    /// The window this document belongs to.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The document itself.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Set the handlers attached while the inspector is enabled.
    pub fn set_pointer_handlers(&self, mouse_over: Handler, click: Handler) {
        let mut pointer = self.pointer.borrow_mut();
        pointer.active.clear();
        pointer.handlers = vec![("mouseover", mouse_over), ("click", click)];
    }

    /// Detach and forget the pointer handlers.
    pub fn clear_pointer_handlers(&self) {
        let mut pointer = self.pointer.borrow_mut();
        pointer.active.clear();
        pointer.handlers.clear();
    }

    fn style_of(node: &Element) -> Option<JsValue> {
        Reflect::get(node, &"style".into())
            .ok()
            .filter(JsValue::is_object)
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn root(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name()
    }

    fn class_name(&self, node: &Element) -> Option<String> {
        Reflect::get(node, &"className".into())
            .ok()
            .and_then(|name| name.as_string())
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(error) = node.set_attribute(name, value) {
            tracing::debug!(?error, name, "Failed to set attribute");
        }
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        let children = node.children();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .collect()
    }

    fn bounding_rect(&self, node: &Element) -> Option<Rect> {
        let rect = node.get_bounding_client_rect();
        Some(Rect {
            top: rect.top(),
            left: rect.left(),
            width: rect.width(),
            height: rect.height(),
        })
    }

    fn scroll_offset(&self) -> ScrollOffset {
        ScrollOffset {
            x: self.window.scroll_x().unwrap_or_default(),
            y: self.window.scroll_y().unwrap_or_default(),
        }
    }

    fn inner_text(&self, node: &Element) -> Option<String> {
        node.dyn_ref::<HtmlElement>().map(HtmlElement::inner_text)
    }

    fn computed_style(&self, node: &Element, property: &str) -> String {
        self.window
            .get_computed_style(node)
            .ok()
            .flatten()
            .and_then(|style| Reflect::get(&style, &property.into()).ok())
            .and_then(|value| value.as_string())
            .unwrap_or_default()
    }

    fn inline_style(&self, node: &Element, property: &str) -> String {
        Self::style_of(node)
            .and_then(|style| Reflect::get(&style, &property.into()).ok())
            .and_then(|value| value.as_string())
            .unwrap_or_default()
    }

    fn set_inline_style(&self, node: &Element, property: &str, value: &str) {
        let Some(style) = Self::style_of(node) else {
            return;
        };
        if let Err(error) = Reflect::set(&style, &property.into(), &value.into()) {
            tracing::debug!(?error, property, "Failed to set inline style");
        }
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_to_body(&self, node: &Element) {
        if let Some(body) = self.document.body() {
            if let Err(error) = body.append_child(node) {
                tracing::debug!(?error, "Failed to append to body");
            }
        }
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn find_by_attribute(&self, name: &str, value: &str) -> Option<Element> {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        self.document
            .query_selector(&format!("[{name}=\"{escaped}\"]"))
            .ok()
            .flatten()
    }

    fn scroll_into_view(&self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn height_sources(&self) -> HeightSources {
        let body = self.document.body();
        let root = self.document.document_element();
        let root_offset = root
            .as_ref()
            .and_then(|root| root.dyn_ref::<HtmlElement>())
            .map(HtmlElement::offset_height);

        HeightSources {
            body_scroll: body.as_ref().map(|body| body.scroll_height()).unwrap_or(0) as f64,
            body_offset: body.as_ref().map(|body| body.offset_height()).unwrap_or(0) as f64,
            root_client: root.as_ref().map(Element::client_height).unwrap_or(0) as f64,
            root_scroll: root.as_ref().map(Element::scroll_height).unwrap_or(0) as f64,
            root_offset: root_offset.unwrap_or(0) as f64,
        }
    }

    fn bind_pointer_listeners(&self) {
        let mut pointer = self.pointer.borrow_mut();
        if !pointer.active.is_empty() {
            return;
        }
        let PointerListeners { handlers, active } = &mut *pointer;
        for (kind, handler) in handlers.iter() {
            match Listener::attach(&self.document, kind, handler.clone(), true) {
                Ok(listener) => active.push(listener),
                Err(error) => tracing::warn!(%error, kind, "Failed to bind pointer listener"),
            }
        }
    }

    fn unbind_pointer_listeners(&self) {
        self.pointer.borrow_mut().active.clear();
    }

    fn notify_inspector_change(&self, enabled: bool) {
        let detail = js_sys::Object::new();
        if Reflect::set(&detail, &"enabled".into(), &enabled.into()).is_err() {
            return;
        }
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(INSPECTOR_CHANGE_EVENT, &init) {
            Ok(event) => {
                let _ = self.window.dispatch_event(&event);
            }
            Err(error) => tracing::debug!(?error, "Failed to create inspector change event"),
        }
    }

    fn is_embedded(&self) -> bool {
        match self.window.top() {
            Ok(Some(top)) => top != self.window,
            _ => true,
        }
    }

    fn write_console(&self, line: &str) {
        web_sys::console::log_1(&line.into());
    }
}
