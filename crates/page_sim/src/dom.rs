//! In-memory document tree
//!
//! Flat node table keyed by `ElementId`; parent/child links are ids.

use std::collections::HashMap;
use std::fmt::Write as _;

use contracts::{ContractError, ElementId, Placement};

/// Single element node
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub inner_html: Option<String>,
    pub children: Vec<ElementId>,
    pub parent: Option<ElementId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            inner_html: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Document with a fixed `html > head + body` skeleton
#[derive(Debug)]
pub struct Document {
    nodes: HashMap<ElementId, Node>,
    next_id: u64,
    root: ElementId,
    head: Option<ElementId>,
    body: ElementId,
}

impl Document {
    /// Create a document; `with_head`/`with_footer` control which containers exist
    pub fn new(with_head: bool, with_footer: bool) -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            next_id: 0,
            root: ElementId(0),
            head: None,
            body: ElementId(0),
        };

        doc.root = doc.create("html");
        if with_head {
            let head = doc.create("head");
            doc.attach(doc.root, head, false);
            doc.head = Some(head);
        }
        let body = doc.create("body");
        doc.attach(doc.root, body, false);
        doc.body = body;

        let main = doc.create("main");
        doc.attach(body, main, false);
        if with_footer {
            let footer = doc.create("footer");
            doc.attach(body, footer, false);
        }
        doc
    }

    /// Allocate a detached node
    pub fn create(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag));
        id
    }

    pub fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: ElementId) -> Result<&mut Node, ContractError> {
        self.nodes.get_mut(&id).ok_or(ContractError::UnknownElement(id))
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Resolve a well-known container without fallback
    pub fn container(&self, placement: Placement) -> Option<ElementId> {
        match placement {
            Placement::Head => self.head,
            Placement::Body => Some(self.body),
            Placement::Footer => self.first_by_tag("footer"),
        }
    }

    /// First element with the given tag, in document order
    pub fn first_by_tag(&self, tag: &str) -> Option<ElementId> {
        self.walk().into_iter().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| n.tag.eq_ignore_ascii_case(tag))
        })
    }

    /// All attached elements with the given tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<ElementId> {
        self.walk()
            .into_iter()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.tag.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    /// Attach `child` under `parent`, detaching it from any previous parent
    pub fn insert(
        &mut self,
        parent: ElementId,
        child: ElementId,
        first: bool,
    ) -> Result<(), ContractError> {
        if !self.nodes.contains_key(&parent) {
            return Err(ContractError::UnknownElement(parent));
        }
        if !self.nodes.contains_key(&child) {
            return Err(ContractError::UnknownElement(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(ContractError::host(format!(
                "cannot insert {child} into its own subtree"
            )));
        }
        self.attach(parent, child, first);
        Ok(())
    }

    /// Whether the element is reachable from the root
    pub fn is_attached(&self, id: ElementId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Serialize the attached tree as indented HTML
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(self.root, 0, &mut out);
        out
    }

    fn attach(&mut self, parent: ElementId, child: ElementId, first: bool) {
        if let Some(old_parent) = self.nodes.get(&child).and_then(|n| n.parent) {
            if let Some(node) = self.nodes.get_mut(&old_parent) {
                node.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            if first {
                node.children.insert(0, child);
            } else {
                node.children.push(child);
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    fn is_ancestor(&self, ancestor: ElementId, of: ElementId) -> bool {
        let mut cursor = self.nodes.get(&of).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Pre-order traversal from the root
    fn walk(&self) -> Vec<ElementId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    fn render_node(&self, id: ElementId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let indent = "  ".repeat(depth);

        let _ = write!(out, "{indent}<{}", node.tag);
        for (name, value) in &node.attributes {
            if value.is_empty() {
                let _ = write!(out, " {name}");
            } else {
                let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
            }
        }
        out.push('>');

        if node.children.is_empty() {
            if let Some(inner) = &node.inner_html {
                out.push_str(inner);
            }
            let _ = writeln!(out, "</{}>", node.tag);
            return;
        }

        out.push('\n');
        if let Some(inner) = &node.inner_html {
            let _ = writeln!(out, "{indent}  {inner}");
        }
        for child in &node.children {
            self.render_node(*child, depth + 1, out);
        }
        let _ = writeln!(out, "{indent}</{}>", node.tag);
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
