//! An emulated, in-memory document.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use super::{Dom, HeightSources, Rect, ScrollOffset};

/// Handle to an element of a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
struct Element {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    inline_style: BTreeMap<String, String>,
    computed_style: BTreeMap<String, String>,
    rect: Option<Rect>,
    text: Option<String>,
    svg: bool,
}

#[derive(Debug)]
struct Document {
    elements: Vec<Element>,
    root: NodeId,
    body: NodeId,
    scroll: ScrollOffset,
    heights: HeightSources,
    embedded: bool,
    listeners_bound: bool,
    bind_calls: usize,
    notifications: Vec<bool>,
    scrolled_into_view: Vec<NodeId>,
    console: Vec<String>,
}

impl Document {
    fn get(&self, node: NodeId) -> &Element {
        &self.elements[node.0]
    }

    fn get_mut(&mut self, node: NodeId) -> &mut Element {
        &mut self.elements[node.0]
    }

    fn push(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.elements.len());
        self.elements.push(Element {
            tag: tag.to_ascii_uppercase(),
            rect: Some(Rect::default()),
            ..Default::default()
        });
        id
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.get_mut(node).parent.take() {
            self.get_mut(parent).children.retain(|child| *child != node);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.get_mut(child).parent = Some(parent);
        self.get_mut(parent).children.push(child);
    }

    /// Attached elements in document order.
    fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.get(node).children.iter().rev().copied());
        }
        order
    }
}

/// A [`Dom`] held entirely in memory.
///
/// Clones share the same document, so a test can hand one clone to a
/// [`Bridge`](crate::Bridge) and keep another to build fixtures and make
/// assertions. Every element starts with a zero-sized box at the origin.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    document: Rc<RefCell<Document>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// An empty `<html><body></body></html>` document.
    pub fn new() -> Self {
        let mut document = Document {
            elements: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            scroll: ScrollOffset::default(),
            heights: HeightSources::default(),
            embedded: true,
            listeners_bound: false,
            bind_calls: 0,
            notifications: Vec::new(),
            scrolled_into_view: Vec::new(),
            console: Vec::new(),
        };
        let root = document.push("html");
        let body = document.push("body");
        document.attach(root, body);
        document.root = root;
        document.body = body;

        Self {
            document: Rc::new(RefCell::new(document)),
        }
    }

    /// The `<body>` element.
    pub fn body_node(&self) -> NodeId {
        self.document.borrow().body
    }

    /// The `<html>` element.
    pub fn root_node(&self) -> NodeId {
        self.document.borrow().root
    }

    /// Create an element and append it to `parent`.
    pub fn append(&self, parent: NodeId, tag: &str) -> NodeId {
        let mut document = self.document.borrow_mut();
        let child = document.push(tag);
        document.attach(parent, child);
        child
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.document.borrow_mut().attach(parent, child);
    }

    /// The element's parent, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.document.borrow().get(node).parent
    }

    /// Set the element's bounding box.
    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.document.borrow_mut().get_mut(node).rect = Some(rect);
    }

    /// Make the element unable to report geometry.
    pub fn clear_rect(&self, node: NodeId) {
        self.document.borrow_mut().get_mut(node).rect = None;
    }

    /// Set the element's rendered text.
    pub fn set_text(&self, node: NodeId, text: &str) {
        self.document.borrow_mut().get_mut(node).text = Some(text.to_string());
    }

    /// Set a computed style value that is not overridden inline.
    pub fn set_computed_style(&self, node: NodeId, property: &str, value: &str) {
        self.document
            .borrow_mut()
            .get_mut(node)
            .computed_style
            .insert(property.to_string(), value.to_string());
    }

    /// Give the element a non-string `className`, as SVG elements have.
    pub fn make_svg(&self, node: NodeId) {
        self.document.borrow_mut().get_mut(node).svg = true;
    }

    /// Set the document's scroll position.
    pub fn set_scroll(&self, scroll: ScrollOffset) {
        self.document.borrow_mut().scroll = scroll;
    }

    /// Set the document's height measurements.
    pub fn set_heights(&self, heights: HeightSources) {
        self.document.borrow_mut().heights = heights;
    }

    /// Pretend the document is (or is not) inside a frame.
    pub fn set_embedded(&self, embedded: bool) {
        self.document.borrow_mut().embedded = embedded;
    }

    /// Whether the pointer listeners are currently attached.
    pub fn pointer_listeners_bound(&self) -> bool {
        self.document.borrow().listeners_bound
    }

    /// How many times the pointer listeners were attached.
    pub fn pointer_bind_count(&self) -> usize {
        self.document.borrow().bind_calls
    }

    /// Every inspector change notification, oldest first.
    pub fn notifications(&self) -> Vec<bool> {
        self.document.borrow().notifications.clone()
    }

    /// Every line written to the console, oldest first.
    pub fn console_lines(&self) -> Vec<String> {
        self.document.borrow().console.clone()
    }

    /// Every element scrolled into view, oldest first.
    pub fn scrolled_into_view(&self) -> Vec<NodeId> {
        self.document.borrow().scrolled_into_view.clone()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.document.borrow().body)
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.document.borrow().root)
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.document.borrow().get(*node).tag.clone()
    }

    fn class_name(&self, node: &NodeId) -> Option<String> {
        let document = self.document.borrow();
        let element = document.get(*node);
        if element.svg {
            return None;
        }
        Some(element.attributes.get("class").cloned().unwrap_or_default())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.document.borrow().get(*node).attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.document
            .borrow_mut()
            .get_mut(*node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.document.borrow().get(*node).children.clone()
    }

    fn bounding_rect(&self, node: &NodeId) -> Option<Rect> {
        self.document.borrow().get(*node).rect
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.document.borrow().scroll
    }

    fn inner_text(&self, node: &NodeId) -> Option<String> {
        self.document.borrow().get(*node).text.clone()
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> String {
        let document = self.document.borrow();
        let element = document.get(*node);
        element
            .inline_style
            .get(property)
            .or_else(|| element.computed_style.get(property))
            .cloned()
            .unwrap_or_default()
    }

    fn inline_style(&self, node: &NodeId, property: &str) -> String {
        self.document
            .borrow()
            .get(*node)
            .inline_style
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_inline_style(&self, node: &NodeId, property: &str, value: &str) {
        let mut document = self.document.borrow_mut();
        let style = &mut document.get_mut(*node).inline_style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    fn create_element(&self, tag: &str) -> Option<NodeId> {
        Some(self.document.borrow_mut().push(tag))
    }

    fn append_to_body(&self, node: &NodeId) {
        let mut document = self.document.borrow_mut();
        let body = document.body;
        document.attach(body, *node);
    }

    fn remove(&self, node: &NodeId) {
        self.document.borrow_mut().detach(*node);
    }

    fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        let document = self.document.borrow();
        document.walk().into_iter().find(|node| {
            document.get(*node).attributes.get(name).map(String::as_str) == Some(value)
        })
    }

    fn scroll_into_view(&self, node: &NodeId) {
        self.document.borrow_mut().scrolled_into_view.push(*node);
    }

    fn height_sources(&self) -> HeightSources {
        self.document.borrow().heights
    }

    fn bind_pointer_listeners(&self) {
        let mut document = self.document.borrow_mut();
        document.listeners_bound = true;
        document.bind_calls += 1;
    }

    fn unbind_pointer_listeners(&self) {
        self.document.borrow_mut().listeners_bound = false;
    }

    fn notify_inspector_change(&self, enabled: bool) {
        self.document.borrow_mut().notifications.push(enabled);
    }

    fn is_embedded(&self) -> bool {
        self.document.borrow().embedded
    }

    fn write_console(&self, line: &str) {
        self.document.borrow_mut().console.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_starts_with_a_body_inside_the_root() {
        let dom = MemoryDom::new();
        assert_eq!(dom.parent(dom.body_node()), Some(dom.root_node()));
        assert_eq!(dom.tag_name(&dom.body_node()), "BODY");
    }

    #[test]
    fn it_finds_attached_elements_in_document_order() {
        let dom = MemoryDom::new();
        let first = dom.append(dom.body_node(), "div");
        let second = dom.append(first, "span");
        dom.set_attribute(&second, "data-x", "1");
        dom.set_attribute(&first, "data-x", "1");

        assert_eq!(dom.find_by_attribute("data-x", "1"), Some(first));

        dom.remove(&first);
        assert_eq!(dom.find_by_attribute("data-x", "1"), None);
    }

    #[test]
    fn it_lets_inline_styles_win_over_computed_ones() {
        let dom = MemoryDom::new();
        let node = dom.append(dom.body_node(), "p");
        dom.set_computed_style(node, "color", "rgb(0, 0, 0)");
        dom.set_inline_style(&node, "color", "red");

        assert_eq!(dom.computed_style(&node, "color"), "red");

        dom.set_inline_style(&node, "color", "");
        assert_eq!(dom.computed_style(&node, "color"), "rgb(0, 0, 0)");
        assert_eq!(dom.inline_style(&node, "color"), "");
    }
}
