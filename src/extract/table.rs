//! Tabular Extractor
//!
//! Rows are the table's own `tr` elements (directly or through
//! `thead`/`tbody`/`tfoot`), so rows of a nested table never leak into the
//! outer grid. Short rows are padded with `""` to the widest row.

use crate::dom::{Document, NodeId};
use crate::error::{ImportError, Result};
use crate::query;
use crate::shape::Grid;

/// Rows of a table, relative to the table element
pub const ROW_SELECTOR: &str = "./tr | ./thead/tr | ./tbody/tr | ./tfoot/tr";

/// Header and data cells of a row, relative to the row element
pub const CELL_SELECTOR: &str = "./th | ./td";

const EMPTY_TABLE: &str = "No data found in the table";

/// Extract a table with the default row and cell selectors
pub fn extract_table(doc: &Document, table: NodeId) -> Result<Grid> {
    extract_table_with(doc, table, ROW_SELECTOR, CELL_SELECTOR)
}

/// Extract a table with caller-supplied row and cell selectors
pub fn extract_table_with(
    doc: &Document,
    table: NodeId,
    row_selector: &str,
    cell_selector: &str,
) -> Result<Grid> {
    let rows = query::select_from(doc, table, row_selector)?;

    let mut grid: Grid = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        let cells = query::select_from(doc, row, cell_selector)?;
        grid.push(cells.iter().map(|cell| cell_text(doc, cell)).collect());
    }

    match grid.first() {
        Some(first) if !first.is_empty() => {}
        _ => return Err(ImportError::not_found(EMPTY_TABLE)),
    }

    pad_rows(&mut grid);
    tracing::debug!(rows = grid.len(), columns = grid[0].len(), "extracted table");
    Ok(grid)
}

/// Flattened descendant text, trimmed; whitespace-only becomes ""
pub fn cell_text(doc: &Document, cell: NodeId) -> String {
    doc.text_content(cell).trim().to_string()
}

fn pad_rows(grid: &mut Grid) {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in grid.iter_mut() {
        row.resize(width, String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::extract::locate::{locate, Role};

    fn first_table(doc: &Document) -> NodeId {
        locate(doc, Role::Table).unwrap().first().unwrap()
    }

    fn grid_of(html: &str) -> Result<Grid> {
        let doc = Document::parse_html(html);
        let table = first_table(&doc);
        extract_table(&doc, table)
    }

    #[test]
    fn test_round_trip_two_by_two() {
        let grid = grid_of("<table><tr><td> a </td><td>b</td></tr><tr><td>c</td><td>\nd\n</td></tr></table>").unwrap();
        assert_eq!(grid, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_header_sections_in_document_order() {
        let grid = grid_of(
            "<table><thead><tr><th>Name</th><th>Age</th></tr></thead>\
             <tbody><tr><td>Ann</td><td>31</td></tr></tbody>\
             <tfoot><tr><td>Total</td><td>1</td></tr></tfoot></table>",
        )
        .unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec!["Name", "Age"]);
        assert_eq!(grid[2], vec!["Total", "1"]);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let grid = grid_of(
            "<table><tr><th colspan='3'>Wide header</th></tr><tr><td>1</td><td>2</td><td>3</td></tr></table>",
        )
        .unwrap();
        assert_eq!(grid[0], vec!["Wide header", "", ""]);
        assert!(grid.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn test_whitespace_cell_kept_as_empty() {
        let grid = grid_of("<table><tr><td>x</td><td>   </td><td>y</td></tr></table>").unwrap();
        assert_eq!(grid, vec![vec!["x", "", "y"]]);
    }

    #[test]
    fn test_nested_table_rows_stay_inside_cell() {
        let html = "<table><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>";
        let grid = grid_of(html).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0], vec!["outerinner"]);
    }

    #[test]
    fn test_empty_table_is_not_found() {
        let err = grid_of("<table></table>").unwrap_err();
        assert_eq!(err, ImportError::not_found("No data found in the table"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_first_row_without_cells_is_not_found() {
        let err = grid_of("<table><tr></tr><tr><td>late</td></tr></table>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_custom_selectors() {
        let doc = Document::parse_xml(
            "<sheet><line><v>1</v><v>2</v></line><line><v>3</v></line></sheet>",
        )
        .unwrap();
        let sheet = doc.root_element_id().unwrap();
        let grid = extract_table_with(&doc, sheet, "./line", "./v").unwrap();
        assert_eq!(grid, vec![vec!["1", "2"], vec!["3", ""]]);
    }

    #[test]
    fn test_bad_selector_is_query_error() {
        let doc = Document::parse_html("<table><tr><td>1</td></tr></table>");
        let table = first_table(&doc);
        let err = extract_table_with(&doc, table, "./tr[", CELL_SELECTOR).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
    }
}
