//! Strict XML Tree Builder
//!
//! Pull-parses with `quick-xml` and appends each event to the arena.
//! Well-formedness violations abort the parse with a message that carries
//! the byte position where the reader stopped. General entities declared in
//! the internal DTD subset are expanded in text and attribute values.

use super::document::{Document, DocumentMode};
use super::node::{NodeId, DOCUMENT_NODE};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Entity name -> replacement text
type Entities = HashMap<String, String>;

/// Parse a well-formed XML document into the arena
pub fn parse_strict(input: &str) -> Result<Document, String> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut doc = Document::new(DocumentMode::Xml);
    let mut open: Vec<NodeId> = Vec::with_capacity(32);
    let mut seen_event = false;
    let mut entities = Entities::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{} at position {}", e, reader.buffer_position()))?;

        let parent = open.last().copied().unwrap_or(DOCUMENT_NODE);
        let at_document_level = open.is_empty();
        let position = reader.buffer_position();

        match event {
            Event::Start(start) => {
                let id = open_element(&mut doc, parent, &start, position, &entities)?;
                open.push(id);
            }
            Event::Empty(start) => {
                open_element(&mut doc, parent, &start, position, &entities)?;
            }
            Event::End(_) => {
                if open.pop().is_none() {
                    return Err(format!("Unexpected closing tag at position {}", position));
                }
            }
            Event::Text(text) => {
                let content = text
                    .unescape_with(|name| resolve(&entities, name))
                    .map_err(|e| format!("{} at position {}", e, position))?;
                if at_document_level {
                    if !content.trim().is_empty() {
                        return Err(format!("Text outside the root element at position {}", position));
                    }
                } else {
                    doc.append_text(parent, &content);
                }
            }
            Event::CData(cdata) => {
                if at_document_level {
                    return Err(format!("CDATA outside the root element at position {}", position));
                }
                doc.append_cdata(parent, &String::from_utf8_lossy(&cdata));
            }
            Event::Comment(comment) => {
                doc.append_comment(parent, &String::from_utf8_lossy(&comment));
            }
            Event::PI(pi) => {
                let target = String::from_utf8_lossy(pi.target());
                let data = String::from_utf8_lossy(pi.content());
                doc.append_processing_instruction(parent, &target, data.trim());
            }
            Event::Decl(_) => {
                if seen_event {
                    return Err(format!("XML declaration not at start of document at position {}", position));
                }
            }
            Event::DocType(doctype) => {
                if doc.root_element_id().is_some() {
                    return Err(format!("DOCTYPE after the root element at position {}", position));
                }
                entities = declared_entities(&String::from_utf8_lossy(&doctype));
            }
            Event::Eof => break,
        }
        seen_event = true;
    }

    if !open.is_empty() {
        let name = open
            .last()
            .and_then(|&id| doc.node_name(id))
            .unwrap_or("")
            .to_string();
        return Err(format!("Unclosed tag <{}> at end of input", name));
    }
    if doc.root_element_id().is_none() {
        return Err("No root element".to_string());
    }

    Ok(doc)
}

fn open_element(
    doc: &mut Document,
    parent: NodeId,
    start: &BytesStart<'_>,
    position: u64,
    entities: &Entities,
) -> Result<NodeId, String> {
    if parent == DOCUMENT_NODE && doc.root_element_id().is_some() {
        return Err(format!("Multiple root elements at position {}", position));
    }

    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| format!("{} at position {}", e, position))?
        .to_string();

    // Collect first so a bad attribute leaves no half-built element behind
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| format!("{} at position {}", e, position))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| format!("{} at position {}", e, position))?
            .to_string();
        let value = attr
            .unescape_value_with(|name| resolve(entities, name))
            .map_err(|e| format!("{} at position {}", e, position))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = doc.append_element(parent, &name);
    for (key, value) in &attributes {
        doc.append_attribute(id, key, value);
    }
    Ok(id)
}

fn resolve<'e>(entities: &'e Entities, name: &str) -> Option<&'e str> {
    resolve_predefined_entity(name).or_else(|| entities.get(name).map(String::as_str))
}

/// Internal `<!ENTITY name "value">` declarations of a DOCTYPE.
/// Parameter and external entities are skipped; the first declaration of a
/// name wins.
fn declared_entities(doctype: &str) -> Entities {
    const DECL: &str = "<!ENTITY";

    let mut entities = Entities::new();
    let mut rest = doctype;
    while let Some(start) = rest.find(DECL) {
        rest = rest[start + DECL.len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(len) = rest[1..].find(quote) else {
            break;
        };
        let raw = &rest[1..1 + len];
        rest = &rest[len + 2..];

        if !name.is_empty() {
            entities
                .entry(name.to_string())
                .or_insert_with(|| unescape(raw).map_or_else(|_| raw.to_string(), |v| v.into_owned()));
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;

    #[test]
    fn test_well_formed() {
        let doc = parse_strict(
            r#"<?xml version="1.0"?><catalog><book id="1"><title>A &amp; B</title></book><!-- c --><book id="2"/></catalog>"#,
        )
        .unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("catalog"));
        let books: Vec<_> = doc.child_elements(root, "book").collect();
        assert_eq!(books.len(), 2);
        assert_eq!(doc.get_attribute(books[1], "id"), Some("2"));
        assert_eq!(doc.text_content(books[0]), "A & B");
    }

    #[test]
    fn test_cdata_and_pi() {
        let doc = parse_strict("<r><?style sheet?><![CDATA[<raw>]]></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let kinds: Vec<_> = doc.children(root).map(|c| doc.node_kind(c)).collect();
        assert_eq!(kinds, vec![NodeKind::ProcessingInstruction, NodeKind::CData]);
        assert_eq!(doc.text_content(root), "<raw>");
    }

    #[test]
    fn test_mismatched_tag() {
        assert!(parse_strict("<a><b></a></b>").is_err());
    }

    #[test]
    fn test_unclosed_tag() {
        let err = parse_strict("<a><b></b>").unwrap_err();
        assert!(err.contains("Unclosed"));
    }

    #[test]
    fn test_multiple_roots() {
        let err = parse_strict("<a/><b/>").unwrap_err();
        assert!(err.contains("Multiple root"));
    }

    #[test]
    fn test_text_outside_root() {
        assert!(parse_strict("<a/>tail").is_err());
        assert!(parse_strict("  <a/>\n").is_ok());
    }

    #[test]
    fn test_duplicate_attribute() {
        assert!(parse_strict(r#"<a x="1" x="2"/>"#).is_err());
    }

    #[test]
    fn test_undefined_entity() {
        assert!(parse_strict("<a>&nope;</a>").is_err());
    }

    #[test]
    fn test_internal_entities_expand() {
        let doc = parse_strict(
            r#"<!DOCTYPE r [
                <!ENTITY e "x">
                <!ENTITY copy '&#169; 2024'>
                <!ENTITY % pe "ignored">
                <!ENTITY ext SYSTEM "ext.xml">
            ]><r note="&e;!">&e;&amp;&copy;</r>"#,
        )
        .unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.text_content(root), "x&\u{a9} 2024");
        assert_eq!(doc.get_attribute(root, "note"), Some("x!"));
    }

    #[test]
    fn test_entity_needs_declaration() {
        assert!(parse_strict("<!DOCTYPE r [<!ENTITY e \"x\">]><r>&f;</r>").is_err());
        assert!(parse_strict("<!DOCTYPE r><r>&e;</r>").is_err());
    }

    #[test]
    fn test_declared_entities() {
        let entities = declared_entities(r#"r [<!ENTITY a "1"><!ENTITY a "2"><!ENTITY b 'q"t'>]"#);
        assert_eq!(entities.get("a").map(String::as_str), Some("1"));
        assert_eq!(entities.get("b").map(String::as_str), Some("q\"t"));
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_empty_and_html_input() {
        assert!(parse_strict("").is_err());
        assert!(parse_strict("<html><body><p>one<p>two</body></html>").is_err());
    }
}
