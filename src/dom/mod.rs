//! DOM Module - Arena-based Document
//!
//! Implements an efficient read-only DOM using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element/attribute names and text
//!
//! Both HTML (forgiving) and XML (strict) input build the same arena.

pub mod document;
pub mod html;
pub mod node;
pub mod strings;
pub mod xml;

pub use document::{ChildIter, DescendantIter, Document, DocumentMode};
pub use node::{Node, NodeId, NodeKind, DOCUMENT_NODE};
pub use strings::StringPool;
