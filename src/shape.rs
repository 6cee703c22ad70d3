//! Result Shaping
//!
//! Every successful call returns one of three shapes. Empty results are
//! turned into `NotFound` here so callers never see an empty scalar,
//! sequence or grid.

use crate::config::MatchPolicy;
use crate::dom::Document;
use crate::error::{ImportError, Result};
use crate::query::QueryResult;

/// Rectangular rows of cell text
pub type Grid = Vec<Vec<String>>;

const NO_QUERY_DATA: &str = "No data found for the given XPath query";

/// Shaped extraction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Scalar(String),
    /// Presented as N rows of one column
    Sequence(Vec<String>),
    Grid(Grid),
}

pub type ExtractionResult = Result<Extracted>;

impl Extracted {
    /// Row-major form used at the host boundary; a sequence becomes one
    /// value per row.
    pub fn into_rows(self) -> Grid {
        match self {
            Extracted::Scalar(value) => vec![vec![value]],
            Extracted::Sequence(values) => values.into_iter().map(|value| vec![value]).collect(),
            Extracted::Grid(grid) => grid,
        }
    }
}

/// Text of the first match
pub fn scalar(doc: &Document, result: &QueryResult) -> ExtractionResult {
    result
        .first()
        .map(|node| Extracted::Scalar(doc.text_content(node)))
        .ok_or_else(|| ImportError::not_found(NO_QUERY_DATA))
}

/// Text of every match, document order
pub fn sequence(doc: &Document, result: &QueryResult) -> ExtractionResult {
    if result.is_empty() {
        return Err(ImportError::not_found(NO_QUERY_DATA));
    }
    Ok(Extracted::Sequence(result.texts(doc)))
}

/// Pass a grid through, rejecting an empty one
pub fn grid(grid: Grid) -> ExtractionResult {
    if grid.first().map_or(true, Vec::is_empty) {
        return Err(ImportError::not_found("No data found in the table"));
    }
    Ok(Extracted::Grid(grid))
}

/// Shape a query result according to the multi-match policy
pub fn query(doc: &Document, result: &QueryResult, policy: MatchPolicy) -> ExtractionResult {
    match policy {
        MatchPolicy::First => scalar(doc, result),
        MatchPolicy::All => sequence(doc, result),
    }
}
