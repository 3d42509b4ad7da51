use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use super::{NodeId, NodeKind, Page};
use crate::geometry::{Rect, Viewport};

#[derive(Debug, Clone)]
struct MemoryNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    computed: Vec<(String, String)>,
    text: String,
    rect: Rect,
}

impl MemoryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            styles: Vec::new(),
            computed: Vec::new(),
            text: String::new(),
            rect: Rect::default(),
        }
    }
}

/// Arena-backed document with the same observable behavior the editing
/// layer relies on from a browser.
#[derive(Debug)]
pub struct MemoryPage {
    nodes: RefCell<Vec<MemoryNode>>,
    viewport: Cell<Viewport>,
    resize_observed: RefCell<BTreeSet<NodeId>>,
    mutations_observed: Cell<bool>,
    reloads: Cell<u32>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    pub fn new() -> Self {
        let body = MemoryNode::new(NodeKind::Element {
            tag: "body".to_string(),
        });
        Self {
            nodes: RefCell::new(vec![body]),
            viewport: Cell::new(Viewport::new(1024.0, 768.0)),
            resize_observed: RefCell::new(BTreeSet::new()),
            mutations_observed: Cell::new(false),
            reloads: Cell::new(0),
        }
    }

    fn push(&self, node: MemoryNode) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        NodeId((nodes.len() - 1) as u32)
    }

    fn with_node<R>(&self, node: NodeId, read: impl FnOnce(&MemoryNode) -> R) -> Option<R> {
        self.nodes.borrow().get(node.0 as usize).map(read)
    }

    fn with_node_mut(&self, node: NodeId, write: impl FnOnce(&mut MemoryNode)) {
        if let Some(entry) = self.nodes.borrow_mut().get_mut(node.0 as usize) {
            write(entry);
        }
    }

    fn detach(&self, node: NodeId) {
        let Some(parent) = self.with_node(node, |entry| entry.parent).flatten() else {
            return;
        };
        self.with_node_mut(parent, |entry| entry.children.retain(|child| *child != node));
        self.with_node_mut(node, |entry| entry.parent = None);
    }

    /// Creates `<tag>` with `attributes` and appends it to `parent`.
    pub fn append_element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    pub fn append_text(&self, parent: NodeId, text: &str) -> NodeId {
        let mut entry = MemoryNode::new(NodeKind::Text);
        entry.text = text.to_string();
        let node = self.push(entry);
        self.append_child(parent, node);
        node
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.with_node_mut(node, |entry| entry.rect = rect);
    }

    pub fn set_computed_style(&self, node: NodeId, declarations: &[(&str, &str)]) {
        self.with_node_mut(node, |entry| {
            entry.computed = declarations
                .iter()
                .map(|(property, value)| (property.to_string(), value.to_string()))
                .collect();
        });
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }

    pub fn resize_observed(&self) -> Vec<NodeId> {
        self.resize_observed.borrow().iter().copied().collect()
    }

    pub fn is_observing_mutations(&self) -> bool {
        self.mutations_observed.get()
    }

    pub fn reload_count(&self) -> u32 {
        self.reloads.get()
    }

    /// First node (document order) carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
        self.find_all_by_class(class).into_iter().next()
    }

    pub fn find_all_by_class(&self, class: &str) -> Vec<NodeId> {
        super::descendants(self, self.body())
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }
}

impl Page for MemoryPage {
    fn body(&self) -> NodeId {
        NodeId(0)
    }

    fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.with_node(node, |entry| entry.kind.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.with_node(node, |entry| entry.parent).flatten()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.with_node(node, |entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let body = self.body();
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == body {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, |entry| {
            entry
                .attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
        .flatten()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_node_mut(node, |entry| {
            match entry.attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => entry
                    .attributes
                    .push((name.to_string(), value.to_string())),
            }
        });
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.with_node_mut(node, |entry| entry.attributes.retain(|(key, _)| key != name));
    }

    fn text_content(&self, node: NodeId) -> String {
        match self.node_kind(node) {
            Some(NodeKind::Text) => self
                .with_node(node, |entry| entry.text.clone())
                .unwrap_or_default(),
            Some(NodeKind::Element { .. }) => self
                .children(node)
                .into_iter()
                .map(|child| self.text_content(child))
                .collect(),
            None => String::new(),
        }
    }

    fn set_text_content(&self, node: NodeId, text: &str) {
        if matches!(self.node_kind(node), Some(NodeKind::Text)) {
            self.with_node_mut(node, |entry| entry.text = text.to_string());
            return;
        }
        for child in self.children(node) {
            self.detach(child);
        }
        if !text.is_empty() {
            self.append_text(node, text);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.with_node(node, |entry| {
            entry
                .styles
                .iter()
                .find(|(key, _)| key == property)
                .map(|(_, value)| value.clone())
        })
        .flatten()
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) {
        self.with_node_mut(node, |entry| {
            match entry.styles.iter_mut().find(|(key, _)| key == property) {
                Some((_, existing)) => *existing = value.to_string(),
                None => entry.styles.push((property.to_string(), value.to_string())),
            }
        });
    }

    fn remove_style(&self, node: NodeId, property: &str) {
        self.with_node_mut(node, |entry| entry.styles.retain(|(key, _)| key != property));
    }

    fn computed_style(&self, node: NodeId) -> Vec<(String, String)> {
        self.with_node(node, |entry| {
            let mut declarations = entry.computed.clone();
            for (property, value) in &entry.styles {
                match declarations.iter_mut().find(|(key, _)| key == property) {
                    Some((_, existing)) => *existing = value.clone(),
                    None => declarations.push((property.clone(), value.clone())),
                }
            }
            declarations
        })
        .unwrap_or_default()
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        if !self.is_connected(node) {
            return Rect::default();
        }
        self.with_node(node, |entry| entry.rect).unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.push(MemoryNode::new(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        }))
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.with_node_mut(parent, |entry| entry.children.push(child));
        self.with_node_mut(child, |entry| entry.parent = Some(parent));
    }

    fn remove_node(&self, node: NodeId) {
        self.detach(node);
    }

    fn observe_resize(&self, node: NodeId) {
        self.resize_observed.borrow_mut().insert(node);
    }

    fn unobserve_resize(&self, node: NodeId) {
        self.resize_observed.borrow_mut().remove(&node);
    }

    fn observe_mutations(&self, _root: NodeId) {
        self.mutations_observed.set(true);
    }

    fn disconnect_mutations(&self) {
        self.mutations_observed.set(false);
    }

    fn reload(&self) {
        tracing::info!("page reload requested");
        self.reloads.set(self.reloads.get() + 1);
    }
}
