//! DOM Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// The document node always occupies slot 0
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Attribute of an element (not linked as a child)
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root); owner element for attributes
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for name (elements, attributes, PI targets)
    pub name_id: u32,
    /// Index into string pool for content (text, comments, attribute values, PI data)
    pub value_id: u32,
    /// Number of attribute nodes stored right after this element
    pub attr_count: u32,
    /// Depth in document tree
    pub depth: u16,
}

impl Node {
    fn blank(kind: NodeKind, parent: Option<NodeId>, depth: u16) -> Self {
        Node {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            value_id: 0,
            attr_count: 0,
            depth,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::blank(NodeKind::Document, None, 0)
    }

    /// Create a new element node
    pub fn element(name_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            name_id,
            ..Self::blank(NodeKind::Element, Some(parent), depth)
        }
    }

    /// Create an attribute node owned by `owner`
    pub fn attribute(name_id: u32, value_id: u32, owner: NodeId, depth: u16) -> Self {
        Node {
            name_id,
            value_id,
            ..Self::blank(NodeKind::Attribute, Some(owner), depth)
        }
    }

    /// Create a character-data node (text, CDATA or comment)
    pub fn character_data(kind: NodeKind, value_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            value_id,
            ..Self::blank(kind, Some(parent), depth)
        }
    }

    /// Create a processing instruction node
    pub fn processing_instruction(name_id: u32, value_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            name_id,
            value_id,
            ..Self::blank(NodeKind::ProcessingInstruction, Some(parent), depth)
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text or CDATA node
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }
}
