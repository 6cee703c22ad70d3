//! Structural Locator
//!
//! Finds every table or list in a document and picks one by a one-based
//! position.

use crate::dom::{Document, NodeId};
use crate::error::{ImportError, Result};
use crate::query::{self, QueryResult};
use std::fmt;
use std::str::FromStr;

/// Kind of structure to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Table,
    List,
}

impl Role {
    /// XPath selecting every structure of this kind
    pub fn locator(self) -> &'static str {
        match self {
            Role::Table => "//table",
            Role::List => "//ul | //ol",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Table => "Table",
            Role::List => "List",
        }
    }
}

impl FromStr for Role {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Role::Table),
            "list" => Ok(Role::List),
            _ => Err(ImportError::invalid_argument(
                "Data type must be 'table' or 'list'",
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Table => "table",
            Role::List => "list",
        })
    }
}

/// All structures of `role`, in document order. May be empty.
pub fn locate(doc: &Document, role: Role) -> Result<QueryResult> {
    query::select(doc, role.locator())
}

/// Pick the `index`-th match (one-based). Zero, negative and too-large
/// indices are `NotFound`.
pub fn select_index(matches: &QueryResult, index: i64, role: Role) -> Result<NodeId> {
    index
        .checked_sub(1)
        .and_then(|adjusted| usize::try_from(adjusted).ok())
        .and_then(|adjusted| matches.get(adjusted))
        .ok_or_else(|| ImportError::not_found(format!("{} not found", role.label())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_role_parsing() {
        assert_eq!("table".parse::<Role>().unwrap(), Role::Table);
        assert_eq!(" List ".parse::<Role>().unwrap(), Role::List);
        let err = "grid".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "Data type must be 'table' or 'list'");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_locate_lists_in_document_order() {
        let doc = Document::parse_html("<ol><li>1</li></ol><ul><li>2</li></ul>");
        let lists = locate(&doc, Role::List).unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(doc.node_name(lists.nodes()[0]), Some("ol"));
        assert_eq!(doc.node_name(lists.nodes()[1]), Some("ul"));
    }

    #[test]
    fn test_locate_nothing_is_empty() {
        let doc = Document::parse_html("<p>no tables</p>");
        assert!(locate(&doc, Role::Table).unwrap().is_empty());
    }

    #[test]
    fn test_select_index_is_one_based() {
        let doc = Document::parse_html("<table id='a'></table><table id='b'></table>");
        let tables = locate(&doc, Role::Table).unwrap();
        let first = select_index(&tables, 1, Role::Table).unwrap();
        assert_eq!(doc.get_attribute(first, "id"), Some("a"));
        let second = select_index(&tables, 2, Role::Table).unwrap();
        assert_eq!(doc.get_attribute(second, "id"), Some("b"));

        for bad in [0, -1, 3, i64::MIN] {
            let err = select_index(&tables, bad, Role::Table).unwrap_err();
            assert_eq!(err, ImportError::not_found("Table not found"));
        }
    }

    #[test]
    fn test_select_index_on_empty() {
        let err = select_index(&QueryResult::default(), 1, Role::List).unwrap_err();
        assert_eq!(err.to_string(), "List not found");
    }
}
