//! Structural Extraction
//!
//! Locate every table or list, pick one by one-based index, and turn it
//! into a grid or a sequence.

pub mod list;
pub mod locate;
pub mod table;

pub use list::{extract_list, extract_list_with};
pub use locate::{locate, select_index, Role};
pub use table::{extract_table, extract_table_with};

use crate::dom::Document;
use crate::error::Result;
use crate::shape::{self, Extracted};

/// Extract the `index`-th (one-based) table or list of `doc`
pub fn extract_structured(doc: &Document, role: Role, index: i64) -> Result<Extracted> {
    let matches = locate(doc, role)?;
    tracing::debug!(%role, index, found = matches.len(), "located structures");
    let node = select_index(&matches, index, role)?;

    match role {
        Role::Table => extract_table(doc, node).and_then(shape::grid),
        Role::List => extract_list(doc, node).map(Extracted::Sequence),
    }
}
