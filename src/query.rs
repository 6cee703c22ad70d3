//! Query Evaluation
//!
//! Thin boundary over the XPath engine: blank expressions are rejected,
//! engine errors become `ImportError::Query`, and the result must be a
//! node-set. Several expressions against one document run on rayon.

use crate::dom::{Document, NodeId, DOCUMENT_NODE};
use crate::error::{require, ImportError, Result};
use crate::xpath::{self, EvalContext, XPathValue};
use rayon::prelude::*;

/// Nodes selected by a query, in document order without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    nodes: Vec<NodeId>,
}

impl QueryResult {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// String-value of every selected node
    pub fn texts(&self, doc: &Document) -> Vec<String> {
        self.iter().map(|node| doc.text_content(node)).collect()
    }
}

/// Evaluate `expression` with the document node as context
pub fn select(doc: &Document, expression: &str) -> Result<QueryResult> {
    select_from(doc, DOCUMENT_NODE, expression)
}

/// Evaluate `expression` with `context` as the context node
pub fn select_from(doc: &Document, context: NodeId, expression: &str) -> Result<QueryResult> {
    let expression = require(expression, "XPath query is required")?;
    let compiled = xpath::compile(expression).map_err(ImportError::Query)?;
    let value = xpath::evaluate_compiled(&compiled, &EvalContext::new(doc, context))
        .map_err(ImportError::Query)?;

    match value {
        XPathValue::NodeSet(nodes) => Ok(QueryResult { nodes }),
        other => Err(ImportError::Query(format!(
            "expression returns a {}, not a node-set",
            other.type_name()
        ))),
    }
}

/// Evaluate several expressions against one document in parallel.
/// Results come back in the order of `expressions`.
pub fn select_many<S>(doc: &Document, expressions: &[S]) -> Vec<Result<QueryResult>>
where
    S: AsRef<str> + Sync,
{
    expressions
        .par_iter()
        .map(|expression| select(doc, expression.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn doc() -> Document {
        Document::parse_xml("<root><a>1</a><b> two </b><a>3</a></root>").unwrap()
    }

    #[test]
    fn test_select_in_document_order() {
        let doc = doc();
        let result = select(&doc, "//a").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.texts(&doc), vec!["1", "3"]);
    }

    #[test]
    fn test_empty_match_is_not_an_error() {
        let doc = doc();
        let result = select(&doc, "//missing").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.first(), None);
    }

    #[test]
    fn test_blank_expression() {
        let doc = doc();
        let err = select(&doc, "   ").unwrap_err();
        assert_eq!(err, ImportError::invalid_argument("XPath query is required"));
    }

    #[test]
    fn test_syntax_error_is_query_error() {
        let doc = doc();
        assert_eq!(select(&doc, "//a[").unwrap_err().kind(), ErrorKind::Query);
        assert_eq!(select(&doc, "//a]").unwrap_err().kind(), ErrorKind::Query);
        assert_eq!(select(&doc, "//a[$x]").unwrap_err().kind(), ErrorKind::Query);
    }

    #[test]
    fn test_deep_nesting_is_query_error() {
        let doc = doc();
        let deep = format!("{}//a{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = select(&doc, &deep).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().contains("nested too deeply"));
    }

    #[test]
    fn test_non_node_set_is_query_error() {
        let doc = doc();
        let err = select(&doc, "count(//a)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_text_is_untrimmed() {
        let doc = doc();
        let result = select(&doc, "//b").unwrap();
        assert_eq!(result.texts(&doc), vec![" two "]);
    }

    #[test]
    fn test_select_from_sub_root() {
        let doc = doc();
        let b = select(&doc, "//b").unwrap().first().unwrap();
        let siblings = select_from(&doc, b, "following-sibling::a").unwrap();
        assert_eq!(siblings.texts(&doc), vec!["3"]);
    }

    #[test]
    fn test_select_many_keeps_order() {
        let doc = doc();
        let results = select_many(&doc, &["//a", "//[", "//b"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), 2);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().len(), 1);
    }
}
