//! Serialisation of the live DOM into a transferable tree.
//!
//! The walk is depth-first over element children and uses an explicit
//! stack, so deep documents cannot exhaust the call stack. Every visited
//! element is tagged through the [`IdentityTagger`]. The overlay and any
//! `<script>` or `<style>` element are skipped together with their whole
//! subtree.

use serde::{Deserialize, Serialize};

use crate::{Dom, identity::IdentityTagger};

/// One element of a DOM snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    /// The element's bridge identifier
    pub id: String,
    /// Lower-case tag name
    pub tag_name: String,
    /// Class list, empty when absent or not a plain string
    pub class_name: String,
    /// Serialised element children in document order
    pub children: Vec<SerializedNode>,
}

/// Walks a document into [`SerializedNode`]s.
pub struct TreeSerializer<'a, D: Dom> {
    dom: &'a D,
    identity: &'a mut IdentityTagger,
    overlay_id: &'a str,
}

struct Frame<N> {
    node: SerializedNode,
    pending: std::vec::IntoIter<N>,
}

impl<'a, D: Dom> TreeSerializer<'a, D> {
    /// A serializer tagging elements with `identity` and skipping the
    /// element whose DOM id is `overlay_id`.
    pub fn new(dom: &'a D, identity: &'a mut IdentityTagger, overlay_id: &'a str) -> Self {
        Self {
            dom,
            identity,
            overlay_id,
        }
    }

    /// Serialise the document body.
    pub fn serialize_body(&mut self) -> Option<SerializedNode> {
        let body = self.dom.body()?;
        self.serialize(&body)
    }

    /// Serialise the subtree rooted at `root`, or `None` if `root` itself
    /// is excluded.
    pub fn serialize(&mut self, root: &D::Node) -> Option<SerializedNode> {
        if self.is_excluded(root) {
            return None;
        }

        let mut stack = vec![self.open(root)];

        loop {
            let frame = stack.last_mut()?;
            match frame.pending.next() {
                Some(child) => {
                    if !self.is_excluded(&child) {
                        let frame = self.open(&child);
                        stack.push(frame);
                    }
                }
                None => {
                    let finished = stack.pop()?;
                    match stack.last_mut() {
                        Some(parent) => parent.node.children.push(finished.node),
                        None => return Some(finished.node),
                    }
                }
            }
        }
    }

    fn open(&mut self, node: &D::Node) -> Frame<D::Node> {
        Frame {
            node: SerializedNode {
                id: self.identity.ensure_id(self.dom, node),
                tag_name: self.dom.tag_name(node).to_lowercase(),
                class_name: self.dom.class_name(node).unwrap_or_default(),
                children: Vec::new(),
            },
            pending: self.dom.children(node).into_iter(),
        }
    }

    fn is_excluded(&self, node: &D::Node) -> bool {
        if self.dom.attribute(node, "id").as_deref() == Some(self.overlay_id) {
            return true;
        }
        let tag = self.dom.tag_name(node);
        tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeId};
    use pretty_assertions::assert_eq;

    fn tags(node: &SerializedNode) -> Vec<String> {
        let mut out = vec![node.tag_name.clone()];
        for child in &node.children {
            out.extend(tags(child));
        }
        out
    }

    fn page() -> (MemoryDom, NodeId) {
        let dom = MemoryDom::new();
        let body = dom.body_node();
        let main = dom.append(body, "main");
        dom.set_attribute(&main, "class", "layout grid");
        let header = dom.append(main, "header");
        dom.append(header, "h1");
        dom.append(main, "script");
        let section = dom.append(main, "section");
        let style = dom.append(section, "style");
        dom.append(style, "span");
        dom.append(section, "p");
        (dom, main)
    }

    #[test]
    fn it_serializes_in_document_order_with_lowercase_tags() {
        let (dom, _) = page();
        let mut identity = IdentityTagger::new("data-ardor-id");

        let tree = TreeSerializer::new(&dom, &mut identity, "ardor-overlay")
            .serialize_body()
            .expect("body is serializable");

        assert_eq!(
            tags(&tree),
            vec!["body", "main", "header", "h1", "section", "p"]
        );
        assert_eq!(tree.children[0].class_name, "layout grid");
    }

    #[test]
    fn it_drops_scripts_styles_and_the_overlay_with_their_subtrees() {
        let (dom, main) = page();
        let overlay = dom.append(dom.body_node(), "div");
        dom.set_attribute(&overlay, "id", "ardor-overlay");
        let nested = dom.append(overlay, "div");
        let mut identity = IdentityTagger::new("data-ardor-id");

        let tree = TreeSerializer::new(&dom, &mut identity, "ardor-overlay")
            .serialize_body()
            .expect("body is serializable");

        assert!(!tags(&tree).iter().any(|tag| tag == "script" || tag == "style"));
        assert_eq!(tree.children.len(), 1);
        assert_eq!(dom.attribute(&nested, "data-ardor-id"), None);
        assert!(dom.attribute(&main, "data-ardor-id").is_some());
    }

    #[test]
    fn it_returns_none_for_an_excluded_root() {
        let dom = MemoryDom::new();
        let script = dom.append(dom.body_node(), "script");
        let mut identity = IdentityTagger::new("data-ardor-id");

        assert_eq!(
            TreeSerializer::new(&dom, &mut identity, "ardor-overlay").serialize(&script),
            None
        );
    }

    #[test]
    fn it_produces_identical_identifiers_for_an_unchanged_document() {
        let (dom, _) = page();
        let mut identity = IdentityTagger::new("data-ardor-id");

        let first = TreeSerializer::new(&dom, &mut identity, "ardor-overlay").serialize_body();
        let second = TreeSerializer::new(&dom, &mut identity, "ardor-overlay").serialize_body();

        assert_eq!(first, second);
    }

    #[test]
    fn it_reports_svg_class_names_as_empty() {
        let dom = MemoryDom::new();
        let svg = dom.append(dom.body_node(), "svg");
        dom.set_attribute(&svg, "class", "icon");
        dom.make_svg(svg);
        let mut identity = IdentityTagger::new("data-ardor-id");

        let tree = TreeSerializer::new(&dom, &mut identity, "ardor-overlay")
            .serialize_body()
            .expect("body is serializable");

        assert_eq!(tree.children[0].class_name, "");
    }

    #[test]
    fn it_survives_very_deep_documents() {
        let dom = MemoryDom::new();
        let mut parent = dom.body_node();
        for _ in 0..20_000 {
            parent = dom.append(parent, "div");
        }
        let mut identity = IdentityTagger::new("data-ardor-id");

        let tree = TreeSerializer::new(&dom, &mut identity, "ardor-overlay").serialize_body();

        let mut depth = 0;
        let mut cursor = tree.as_ref();
        while let Some(node) = cursor {
            depth += 1;
            cursor = node.children.first();
        }
        assert_eq!(depth, 20_001);
        // Dropping a tree this deep recurses; unwind it by hand.
        let mut pending = tree.map(|node| node.children).unwrap_or_default();
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
