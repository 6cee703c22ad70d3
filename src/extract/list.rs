//! List Extractor

use crate::dom::{Document, NodeId};
use crate::error::{ImportError, Result};
use crate::query;

/// Direct items of a list, relative to the list element
pub const ITEM_SELECTOR: &str = "./li";

/// Extract a list with the default item selector
pub fn extract_list(doc: &Document, list: NodeId) -> Result<Vec<String>> {
    extract_list_with(doc, list, ITEM_SELECTOR)
}

/// Item texts in document order, trimmed. A nested list stays inside the
/// flattened text of the item that contains it.
pub fn extract_list_with(doc: &Document, list: NodeId, item_selector: &str) -> Result<Vec<String>> {
    let items = query::select_from(doc, list, item_selector)?;
    if items.is_empty() {
        return Err(ImportError::not_found("No data found in the list"));
    }

    let texts: Vec<String> = items
        .iter()
        .map(|item| doc.text_content(item).trim().to_string())
        .collect();
    tracing::debug!(items = texts.len(), "extracted list");
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::locate::{locate, Role};

    fn list_items(html: &str, index: usize) -> Result<Vec<String>> {
        let doc = Document::parse_html(html);
        let list = locate(&doc, Role::List).unwrap().get(index).unwrap();
        extract_list(&doc, list)
    }

    #[test]
    fn test_items_in_order() {
        let items = list_items("<ul><li> one </li><li>two</li><li>three</li></ul>", 0).unwrap();
        assert_eq!(items, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_nested_list_stays_in_parent_item() {
        let html = "<ul><li>a<ul><li>b</li><li>c</li></ul></li><li>d</li></ul>";
        let items = list_items(html, 0).unwrap();
        assert_eq!(items, vec!["abc", "d"]);
        // The nested list is still a list of its own
        assert_eq!(list_items(html, 1).unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_empty_list_is_not_found() {
        let err = list_items("<ol></ol>", 0).unwrap_err();
        assert_eq!(err, ImportError::not_found("No data found in the list"));
    }

    #[test]
    fn test_custom_item_selector() {
        let doc = Document::parse_xml("<menu><entry>x</entry><entry>y</entry></menu>").unwrap();
        let menu = doc.root_element_id().unwrap();
        assert_eq!(extract_list_with(&doc, menu, "./entry").unwrap(), vec!["x", "y"]);
    }
}
