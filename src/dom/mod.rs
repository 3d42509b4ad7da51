//! Browser document seam.
//!
//! The editing layer never talks to a DOM library directly. An embedder
//! implements [`Page`] over the live document; [`MemoryPage`] is the
//! in-process implementation used by tests and headless hosts.

mod memory;

pub use memory::MemoryPage;

use crate::geometry::{Rect, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text,
}

/// One entry of a mutation observer batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    Attribute { target: NodeId, name: String },
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
}

pub trait Page {
    fn body(&self) -> NodeId;
    fn node_kind(&self, node: NodeId) -> Option<NodeKind>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&self, node: NodeId, name: &str);

    fn text_content(&self, node: NodeId) -> String;
    fn set_text_content(&self, node: NodeId, text: &str);

    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    fn set_style(&self, node: NodeId, property: &str, value: &str);
    fn remove_style(&self, node: NodeId, property: &str);
    fn computed_style(&self, node: NodeId) -> Vec<(String, String)>;

    /// Viewport-relative bounding box.
    fn bounding_rect(&self, node: NodeId) -> Rect;
    fn viewport(&self) -> Viewport;

    fn create_element(&self, tag: &str) -> NodeId;
    fn append_child(&self, parent: NodeId, child: NodeId);
    fn remove_node(&self, node: NodeId);

    fn observe_resize(&self, _node: NodeId) {}
    fn unobserve_resize(&self, _node: NodeId) {}
    fn observe_mutations(&self, _root: NodeId) {}
    fn disconnect_mutations(&self) {}

    fn reload(&self);

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match self.node_kind(node)? {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text => None,
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|name| name == class))
    }

    fn add_class(&self, node: NodeId, class: &str) {
        let current = self.attribute(node, "class").unwrap_or_default();
        if current.split_whitespace().any(|name| name == class) {
            return;
        }
        let next = if current.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {class}", current.trim())
        };
        self.set_attribute(node, "class", &next);
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        let Some(current) = self.attribute(node, "class") else {
            return;
        };
        let next = current
            .split_whitespace()
            .filter(|name| *name != class)
            .collect::<Vec<_>>()
            .join(" ");
        if next.is_empty() {
            self.remove_attribute(node, "class");
        } else if next != current {
            self.set_attribute(node, "class", &next);
        }
    }

    fn is_content_editable(&self, node: NodeId) -> bool {
        self.attribute(node, "contenteditable")
            .is_some_and(|value| value.is_empty() || value == "true")
    }
}

/// Nearest inclusive ancestor satisfying `predicate`.
pub fn closest(page: &dyn Page, node: NodeId, predicate: impl Fn(NodeId) -> bool) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(candidate) = current {
        if predicate(candidate) {
            return Some(candidate);
        }
        current = page.parent(candidate);
    }
    None
}

pub fn closest_with_attribute(page: &dyn Page, node: NodeId, name: &str) -> Option<NodeId> {
    closest(page, node, |candidate| page.attribute(candidate, name).is_some())
}

pub fn closest_with_class(page: &dyn Page, node: NodeId, class: &str) -> Option<NodeId> {
    closest(page, node, |candidate| page.has_class(candidate, class))
}

/// Descendants of `root` (exclusive) in document order.
pub fn descendants(page: &dyn Page, root: NodeId) -> Vec<NodeId> {
    let mut ordered = Vec::new();
    let mut stack: Vec<NodeId> = page.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        ordered.push(node);
        stack.extend(page.children(node).into_iter().rev());
    }
    ordered
}

pub fn descendants_with_attribute(page: &dyn Page, root: NodeId, name: &str) -> Vec<NodeId> {
    descendants(page, root)
        .into_iter()
        .filter(|node| page.attribute(*node, name).is_some())
        .collect()
}

pub fn is_descendant_of(page: &dyn Page, node: NodeId, ancestor: NodeId) -> bool {
    closest(page, node, |candidate| candidate == ancestor).is_some()
}
