//! HTML Tree Builder
//!
//! Runs html5ever (through `scraper`) and copies the resulting tree into the
//! arena. HTML parsing never fails: the parser repairs whatever it is given,
//! inserting implied `html`, `head`, `body` and `tbody` elements.

use super::document::{Document, DocumentMode};
use super::node::DOCUMENT_NODE;
use scraper::{Html, Node as HtmlNode};

/// Parse an HTML document into the arena
pub fn parse(input: &str) -> Document {
    let html = Html::parse_document(input);
    let mut doc = Document::new(DocumentMode::Html);

    // Pre-order walk; popped nodes get their arena IDs in document order.
    let mut pending: Vec<_> = html
        .tree
        .root()
        .children()
        .map(|child| (child, DOCUMENT_NODE))
        .collect();
    pending.reverse();

    while let Some((node, parent)) = pending.pop() {
        match node.value() {
            HtmlNode::Element(element) => {
                let id = doc.append_element(parent, element.name());
                for (name, value) in element.attrs() {
                    doc.append_attribute(id, name, value);
                }
                let children: Vec<_> = node.children().collect();
                for child in children.into_iter().rev() {
                    pending.push((child, id));
                }
            }
            HtmlNode::Text(text) => {
                doc.append_text(parent, &**text);
            }
            HtmlNode::Comment(comment) => {
                doc.append_comment(parent, &**comment);
            }
            // Doctype and fragment wrappers carry no queryable content
            _ => {}
        }
    }

    doc
}
