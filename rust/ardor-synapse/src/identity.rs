//! Stable element identifiers.
//!
//! Elements are referenced across the frame boundary by an opaque
//! `el-<n>` string stored in an attribute. Identifiers are assigned lazily
//! the first time an element is referenced and are never rewritten, so a
//! host frame can keep using an identifier for as long as the element
//! lives.

use crate::Dom;

/// Hands out identifiers from a per-document sequence.
#[derive(Debug, Clone)]
pub struct IdentityTagger {
    attribute: String,
    next: u64,
}

impl IdentityTagger {
    /// A tagger storing identifiers in `attribute`, starting at `el-1`.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            next: 1,
        }
    }

    /// The attribute identifiers are stored in.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Return the element's identifier, assigning the next one in sequence
    /// if it has none yet.
    ///
    /// An identifier already present on the element (ours or an author's)
    /// is returned as is.
    pub fn ensure_id<D: Dom>(&mut self, dom: &D, node: &D::Node) -> String {
        if let Some(existing) = dom.attribute(node, &self.attribute) {
            return existing;
        }

        let id = format!("el-{}", self.next);
        self.next += 1;
        dom.set_attribute(node, &self.attribute, &id);
        id
    }

    /// Look up the element carrying `id`.
    pub fn find<D: Dom>(&self, dom: &D, id: &str) -> Option<D::Node> {
        dom.find_by_attribute(&self.attribute, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use std::collections::HashSet;

    #[test]
    fn it_assigns_once_and_then_returns_the_same_identifier() {
        let dom = MemoryDom::new();
        let node = dom.append(dom.body_node(), "div");
        let mut tagger = IdentityTagger::new("data-ardor-id");

        let first = tagger.ensure_id(&dom, &node);
        let second = tagger.ensure_id(&dom, &node);

        assert_eq!(first, "el-1");
        assert_eq!(first, second);
        assert_eq!(dom.attribute(&node, "data-ardor-id").as_deref(), Some("el-1"));
    }

    #[test]
    fn it_never_hands_the_same_identifier_to_two_elements() {
        let dom = MemoryDom::new();
        let mut tagger = IdentityTagger::new("data-ardor-id");
        let mut seen = HashSet::new();

        for _ in 0..64 {
            let node = dom.append(dom.body_node(), "li");
            assert!(seen.insert(tagger.ensure_id(&dom, &node)));
        }
    }

    #[test]
    fn it_keeps_identifiers_written_by_someone_else() {
        let dom = MemoryDom::new();
        let node = dom.append(dom.body_node(), "div");
        dom.set_attribute(&node, "data-ardor-id", "custom");
        let mut tagger = IdentityTagger::new("data-ardor-id");

        assert_eq!(tagger.ensure_id(&dom, &node), "custom");

        let fresh = dom.append(dom.body_node(), "div");
        assert_eq!(tagger.ensure_id(&dom, &fresh), "el-1");
    }

    #[test]
    fn it_finds_elements_by_identifier() {
        let dom = MemoryDom::new();
        let node = dom.append(dom.body_node(), "div");
        let mut tagger = IdentityTagger::new("data-ardor-id");
        let id = tagger.ensure_id(&dom, &node);

        assert_eq!(tagger.find(&dom, &id), Some(node));
        assert_eq!(tagger.find(&dom, "el-999"), None);
    }
}
