//! Document - Arena-based DOM representation
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal, assigned in document order
//! - Attribute nodes stored directly after their element
//! - String interning for names and text

use super::node::{Node, NodeId, NodeKind, DOCUMENT_NODE};
use super::strings::StringPool;
use crate::error::{ImportError, Result};
use std::ops::Range;
use std::str::FromStr;

/// How the markup was parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentMode {
    /// Forgiving HTML5 tree construction
    Html,
    /// Strict, well-formed XML
    Xml,
}

impl FromStr for DocumentMode {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(DocumentMode::Html),
            "xml" => Ok(DocumentMode::Xml),
            _ => Err(ImportError::invalid_argument("Mode must be 'html' or 'xml'")),
        }
    }
}

/// A parsed document stored in arena format
#[derive(Debug)]
pub struct Document {
    mode: DocumentMode,
    /// Arena of nodes, slot 0 is the document node
    nodes: Vec<Node>,
    /// Interned names and text
    strings: StringPool,
    /// Root element node ID (not document node)
    root_element: Option<NodeId>,
}

impl Document {
    /// Create an empty document holding only the document node
    pub fn new(mode: DocumentMode) -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(Node::document());
        Document {
            mode,
            nodes,
            strings: StringPool::new(),
            root_element: None,
        }
    }

    /// Parse markup in the given mode
    pub fn parse(input: &str, mode: DocumentMode) -> Result<Self> {
        match mode {
            DocumentMode::Html => Ok(Self::parse_html(input)),
            DocumentMode::Xml => Self::parse_xml(input),
        }
    }

    /// Parse HTML; never fails
    pub fn parse_html(input: &str) -> Self {
        super::html::parse(input)
    }

    /// Parse XML in strict mode
    pub fn parse_xml(input: &str) -> Result<Self> {
        super::xml::parse_strict(input).map_err(ImportError::MalformedDocument)
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Append an element as the last child of `parent`
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        let depth = self.depth_below(parent);
        let id = self.push(Node::element(name_id, parent, depth));
        self.link_child(parent, id);

        if self.root_element.is_none() && parent == DOCUMENT_NODE {
            self.root_element = Some(id);
        }
        id
    }

    /// Append an attribute to `element`.
    ///
    /// Attributes must be added before any child or following node so that
    /// they sit between the element and its content in document order.
    pub fn append_attribute(&mut self, element: NodeId, name: &str, value: &str) -> NodeId {
        debug_assert_eq!(
            self.nodes.len() as NodeId,
            element + 1 + self.nodes[element as usize].attr_count,
            "attributes must directly follow their element"
        );
        let name_id = self.strings.intern(name);
        let value_id = self.strings.intern(value);
        let depth = self.depth_below(element);
        let id = self.push(Node::attribute(name_id, value_id, element, depth));
        self.nodes[element as usize].attr_count += 1;
        id
    }

    /// Append a text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append_character_data(NodeKind::Text, parent, text)
    }

    /// Append a CDATA section
    pub fn append_cdata(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append_character_data(NodeKind::CData, parent, text)
    }

    /// Append a comment
    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append_character_data(NodeKind::Comment, parent, text)
    }

    /// Append a processing instruction
    pub fn append_processing_instruction(&mut self, parent: NodeId, target: &str, data: &str) -> NodeId {
        let name_id = self.strings.intern(target);
        let value_id = self.strings.intern(data);
        let depth = self.depth_below(parent);
        let id = self.push(Node::processing_instruction(name_id, value_id, parent, depth));
        self.link_child(parent, id);
        id
    }

    fn append_character_data(&mut self, kind: NodeKind, parent: NodeId, text: &str) -> NodeId {
        let value_id = self.strings.intern(text);
        let depth = self.depth_below(parent);
        let id = self.push(Node::character_data(kind, value_id, parent, depth));
        self.link_child(parent, id);
        id
    }

    fn depth_below(&self, parent: NodeId) -> u16 {
        self.nodes[parent as usize].depth.saturating_add(1)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Kind of a node, Document for unknown IDs
    pub fn node_kind(&self, id: NodeId) -> NodeKind {
        self.get_node(id).map(|n| n.kind).unwrap_or(NodeKind::Document)
    }

    /// Name of an element, attribute or PI target
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::Attribute | NodeKind::ProcessingInstruction => {
                self.strings.get(node.name_id)
            }
            _ => None,
        }
    }

    /// Node name without its namespace prefix
    pub fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        match name.find(':') {
            Some(pos) => Some(&name[pos + 1..]),
            None => Some(name),
        }
    }

    /// Namespace prefix of an element or attribute name, if any
    pub fn node_prefix(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        name.find(':').map(|pos| &name[..pos])
    }

    /// Stored content of a text, CDATA, comment, attribute or PI node
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Document | NodeKind::Element => None,
            _ => self.strings.get(node.value_id),
        }
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    pub fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.next_sibling
    }

    pub fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.prev_sibling
    }

    /// IDs of the attribute nodes of an element
    pub fn attributes(&self, id: NodeId) -> Range<NodeId> {
        match self.get_node(id) {
            Some(node) if node.is_element() => id + 1..id + 1 + node.attr_count,
            _ => 0..0,
        }
    }

    /// Get attribute value by (qualified) name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .find(|&attr| self.node_name(attr) == Some(name))
            .and_then(|attr| self.node_value(attr))
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node in document order
    /// (attribute nodes are not descendants)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }

    /// Child element IDs with the given local name
    pub fn child_elements<'d>(&'d self, id: NodeId, name: &'d str) -> impl Iterator<Item = NodeId> + 'd {
        self.children(id).filter(move |&child| {
            self.node_kind(child) == NodeKind::Element && self.node_local_name(child) == Some(name)
        })
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// String-value of a node: flattened descendant text for documents and
    /// elements, stored content for everything else.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.node_kind(id) {
            NodeKind::Document | NodeKind::Element => {
                let mut result = String::new();
                for descendant in self.descendants(id) {
                    if let Some(node) = self.get_node(descendant) {
                        if node.is_text() {
                            result.push_str(self.strings.get(node.value_id).unwrap_or(""));
                        }
                    }
                }
                result
            }
            _ => self.node_value(id).unwrap_or("").to_string(),
        }
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (pre-order)
pub struct DescendantIter<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.doc.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.doc.get_node(id).and_then(|n| n.prev_sibling);
            }
        }
        Some(current)
    }
}
