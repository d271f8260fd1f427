//! The normalized element tree shared by both tree-building back-ends (`strict` and `lenient`).

use std::collections::HashMap;

/// A single node of the normalized element tree.
///
/// Tag names are always uppercase ASCII, regardless of the case used in the source document.
/// A node with non-empty `text` and no `children` is a leaf; anything else is an aggregate.
#[derive(Debug, Default, Clone)]
pub(crate) struct Element {
    pub(crate) tag: String,
    pub(crate) attributes: HashMap<String, String>,
    pub(crate) children: Vec<Element>,
    pub(crate) text: String,
}

impl Element {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Element { tag: tag.into(), ..Default::default() }
    }

    /// Search for the first immediate child [`Element`] with the given tag name, or return `None`
    /// if no such child is present.
    pub(crate) fn find_child(&self, tag_name: &str) -> Option<&Element> {
        self.children.iter().find(|&child| child.tag == tag_name)
    }

    /// Find the first descendant of this element with the given tag name, searching recursively
    /// in document order.
    pub(crate) fn find_descendant(&self, tag_name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.tag == tag_name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(tag_name) {
                return Some(found);
            }
        }
        None
    }

    /// Return an iterator over all immediate children with the given tag name.
    pub(crate) fn find_children<'a>(&'a self, tag_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag_name)
    }

    /// Return an iterator over the element's children.
    pub(crate) fn iter_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// An element is a leaf iff it has no children and non-empty trimmed text.
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty() && !self.text.trim().is_empty()
    }

    pub(crate) fn text_trimmed(&self) -> &str {
        self.text.trim()
    }
}
