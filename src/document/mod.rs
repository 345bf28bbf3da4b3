//! Mutable document model over the `scraper` HTML parser.
//!
//! The parser owns tree construction and selector matching; this module keeps
//! an arena copy of the parsed tree that actions can mutate in place. Markup
//! inserted by actions is held as raw fragments until the next
//! [`Document::normalize`], which serializes the arena and parses it again so
//! every node is a real parsed node before the next action runs.
mod serialize;

use scraper::{Html, Selector};
use std::collections::HashMap;
use thiserror::Error;

/// Handle to a node in a [`Document`].
///
/// Handles are only meaningful until the next normalization; a normalized
/// document is a fresh tree and old handles must be queried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Doctype(String),
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    /// Unparsed markup inserted by a mutation; emitted verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed HTML document that supports selector queries and in-place edits.
#[derive(Clone)]
pub struct Document {
    html: Html,
    nodes: Vec<Node>,
    dirty: bool,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Document {
    /// Parse a complete HTML document.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let nodes = build_arena(&html);
        Self {
            html,
            nodes,
            dirty: false,
        }
    }

    /// Return all elements matching `selector`, in document order.
    ///
    /// Pending edits are normalized first, which invalidates earlier handles.
    pub fn query(&mut self, selector: &str) -> Result<Vec<NodeId>, DocumentError> {
        let parsed = Selector::parse(selector).map_err(|err| DocumentError::InvalidSelector {
            selector: selector.to_string(),
            reason: err.to_string(),
        })?;
        if self.dirty {
            self.normalize();
        }
        // Arena slots were assigned in pre-order, so a node's position in the
        // parser's descendant walk is its arena index.
        let positions: HashMap<_, _> = self
            .html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();
        let mut matches: Vec<NodeId> = self
            .html
            .select(&parsed)
            .filter_map(|element| positions.get(&element.id()).copied())
            .map(NodeId)
            .collect();
        matches.sort();
        matches.dedup();
        Ok(matches)
    }

    /// Return the first element matching `selector`, if any.
    pub fn query_one(&mut self, selector: &str) -> Result<Option<NodeId>, DocumentError> {
        Ok(self.query(selector)?.into_iter().next())
    }

    /// Serialize the whole document as `<!DOCTYPE html>` plus the document
    /// element's markup.
    pub fn serialize(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        if let Some(root) = self.document_element() {
            serialize::write_node(self, root, &mut out);
        }
        out
    }

    /// Serialize the document, parse the result again and adopt it as the
    /// current tree. Returns the serialized markup.
    pub fn normalize(&mut self) -> String {
        let markup = self.serialize();
        *self = Self::parse(&markup);
        markup
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes
            .first()?
            .children
            .iter()
            .copied()
            .find(|id| matches!(self.node(*id).kind, NodeKind::Element { .. }))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, attribute: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name == attribute)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, attribute: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            match attrs.iter_mut().find(|(name, _)| name == attribute) {
                Some(entry) => entry.1 = value.to_string(),
                None => attrs.push((attribute.to_string(), value.to_string())),
            }
            self.dirty = true;
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, attribute: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            attrs.retain(|(name, _)| name != attribute);
            self.dirty = true;
        }
    }

    /// Markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in &self.node(id).children {
            serialize::write_node(self, *child, &mut out);
        }
        out
    }

    /// Markup of the node itself, children included.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out);
        out
    }

    /// Replace the node's children with `markup`.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        self.clear_children(id);
        self.append_html(id, markup);
    }

    /// Replace the node's children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let child = self.push_node(NodeKind::Text(text.to_string()));
            self.attach(id, child, None);
        }
    }

    /// Append `markup` after the node's existing children.
    pub fn append_html(&mut self, id: NodeId, markup: &str) {
        if markup.is_empty() {
            return;
        }
        let child = self.push_node(NodeKind::Raw(markup.to_string()));
        self.attach(id, child, None);
    }

    /// Append a new `<tag>` element holding `text` as its only child.
    pub fn append_element(&mut self, id: NodeId, tag: &str, text: &str) -> NodeId {
        let element = self.push_node(NodeKind::Element {
            name: tag.to_string(),
            attrs: Vec::new(),
        });
        self.attach(id, element, None);
        self.set_text(element, text);
        element
    }

    /// Insert `markup` as the node's next sibling.
    pub fn insert_html_after(&mut self, id: NodeId, markup: &str) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if markup.is_empty() {
            return;
        }
        let position = self
            .node(parent)
            .children
            .iter()
            .position(|child| *child == id)
            .map(|index| index + 1);
        let sibling = self.push_node(NodeKind::Raw(markup.to_string()));
        self.attach(parent, sibling, position);
    }

    /// Remove the node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|child| *child != id);
            self.dirty = true;
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.dirty = true;
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        self.node_mut(child).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        match position {
            Some(index) if index <= children.len() => children.insert(index, child),
            _ => children.push(child),
        }
        self.dirty = true;
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

fn build_arena(html: &Html) -> Vec<Node> {
    let mut positions = HashMap::new();
    let mut nodes: Vec<Node> = Vec::new();
    for (index, node) in html.tree.root().descendants().enumerate() {
        positions.insert(node.id(), index);
        let kind = match node.value() {
            scraper::Node::Doctype(doctype) => NodeKind::Doctype(doctype.name().to_string()),
            scraper::Node::Element(element) => NodeKind::Element {
                name: element.name().to_string(),
                attrs: element
                    .attrs
                    .iter()
                    .map(|(name, value)| {
                        // Foreign attributes (`xlink:href`, `xml:lang`) keep their prefix.
                        let name = match name.prefix.as_deref() {
                            Some(prefix) => format!("{prefix}:{}", &*name.local),
                            None => name.local.to_string(),
                        };
                        (name, value.to_string())
                    })
                    .collect(),
            },
            scraper::Node::Text(text) => NodeKind::Text(text.to_string()),
            scraper::Node::Comment(comment) => NodeKind::Comment(comment.to_string()),
            _ => NodeKind::Root,
        };
        let parent = node
            .parent()
            .and_then(|parent| positions.get(&parent.id()).copied());
        nodes.push(Node {
            kind,
            parent: parent.map(NodeId),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            nodes[parent].children.push(NodeId(index));
        }
    }
    nodes
}

#[cfg(test)]
mod tests;
