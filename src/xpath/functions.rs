//! XPath 1.0 Functions
//!
//! Implements the XPath 1.0 core function library:
//!
//! Node Set Functions:
//! - position(), last(), count(), local-name(), namespace-uri(), name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()
//!
//! `id()` is recognised but always fails: there is no DTD to declare ID
//! attributes.

use super::value::{parse_number, XPathValue};
use crate::dom::{Document, NodeId, NodeKind};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const KNOWN_FUNCTIONS: &[&str] = &[
    "position",
    "last",
    "count",
    "local-name",
    "namespace-uri",
    "name",
    "id",
    "string",
    "concat",
    "starts-with",
    "contains",
    "substring",
    "substring-before",
    "substring-after",
    "string-length",
    "normalize-space",
    "translate",
    "boolean",
    "not",
    "true",
    "false",
    "lang",
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
];

/// Whether `name` is a function this engine can call
pub fn is_known(name: &str) -> bool {
    KNOWN_FUNCTIONS.contains(&name)
}

/// Evaluate a function call
pub fn call(
    name: &str,
    args: Vec<XPathValue>,
    doc: &Document,
    context: NodeId,
    position: usize,
    size: usize,
) -> Result<XPathValue, String> {
    match name {
        // Node Set Functions
        "position" => no_args(name, &args).map(|_| XPathValue::Number(position as f64)),
        "last" => no_args(name, &args).map(|_| XPathValue::Number(size as f64)),
        "count" => fn_count(args),
        "local-name" => fn_local_name(args, doc, context),
        "namespace-uri" => fn_namespace_uri(args, doc, context),
        "name" => fn_name(args, doc, context),
        "id" => fn_id(args),

        // String Functions
        "string" => fn_string(args, doc, context),
        "concat" => fn_concat(args, doc),
        "starts-with" => fn_starts_with(args, doc),
        "contains" => fn_contains(args, doc),
        "substring" => fn_substring(args, doc),
        "substring-before" => fn_substring_before(args, doc),
        "substring-after" => fn_substring_after(args, doc),
        "string-length" => fn_string_length(args, doc, context),
        "normalize-space" => fn_normalize_space(args, doc, context),
        "translate" => fn_translate(args, doc),

        // Boolean Functions
        "boolean" => fn_boolean(args),
        "not" => fn_not(args),
        "true" => no_args(name, &args).map(|_| XPathValue::Boolean(true)),
        "false" => no_args(name, &args).map(|_| XPathValue::Boolean(false)),
        "lang" => fn_lang(args, doc, context),

        // Number Functions
        "number" => fn_number(args, doc, context),
        "sum" => fn_sum(args, doc),
        "floor" => fn_floor(args, doc),
        "ceiling" => fn_ceiling(args, doc),
        "round" => fn_round(args, doc),

        _ => Err(format!("Unknown function: {}", name)),
    }
}

fn no_args(name: &str, args: &[XPathValue]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("{}() takes no arguments", name))
    }
}

/// Node named by an optional node-set argument, or the context node.
/// `Ok(None)` for an empty node-set.
fn optional_node_arg(
    name: &str,
    args: &[XPathValue],
    context: NodeId,
) -> Result<Option<NodeId>, String> {
    match args {
        [] => Ok(Some(context)),
        [XPathValue::NodeSet(nodes)] => Ok(nodes.first().copied()),
        [_] => Err(format!("{}() argument must be a node-set", name)),
        _ => Err(format!("{}() requires 0 or 1 arguments", name)),
    }
}

/// String from an optional argument, or the context node's string-value
fn optional_string_arg(
    name: &str,
    args: &[XPathValue],
    doc: &Document,
    context: NodeId,
) -> Result<String, String> {
    match args {
        [] => Ok(doc.text_content(context)),
        [value] => Ok(value.to_string_in(doc)),
        _ => Err(format!("{}() requires 0 or 1 arguments", name)),
    }
}

fn exactly<'v>(name: &str, args: &'v [XPathValue], count: usize) -> Result<&'v [XPathValue], String> {
    if args.len() == count {
        Ok(args)
    } else {
        Err(format!(
            "{}() requires exactly {} argument{}",
            name,
            count,
            if count == 1 { "" } else { "s" }
        ))
    }
}

// Node Set Functions

fn fn_count(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    match exactly("count", &args, 1)? {
        [XPathValue::NodeSet(nodes)] => Ok(XPathValue::Number(nodes.len() as f64)),
        _ => Err("count() argument must be a node-set".to_string()),
    }
}

fn fn_local_name(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let name = optional_node_arg("local-name", &args, context)?
        .and_then(|node| doc.node_local_name(node))
        .unwrap_or("");
    Ok(XPathValue::String(name.to_string()))
}

fn fn_namespace_uri(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let uri = optional_node_arg("namespace-uri", &args, context)?
        .and_then(|node| namespace_uri(doc, node))
        .unwrap_or("");
    Ok(XPathValue::String(uri.to_string()))
}

fn fn_name(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let name = optional_node_arg("name", &args, context)?
        .and_then(|node| doc.node_name(node))
        .unwrap_or("");
    Ok(XPathValue::String(name.to_string()))
}

fn fn_id(_args: Vec<XPathValue>) -> Result<XPathValue, String> {
    Err("id() is not supported: documents carry no DTD ID declarations".to_string())
}

/// Resolve the namespace URI of an element or attribute from the `xmlns`
/// declarations in scope. Unprefixed attributes have no namespace.
fn namespace_uri(doc: &Document, node: NodeId) -> Option<&str> {
    let kind = doc.node_kind(node);
    let (prefix, mut element) = match kind {
        NodeKind::Element => (doc.node_prefix(node), node),
        NodeKind::Attribute => (Some(doc.node_prefix(node)?), doc.parent_of(node)?),
        _ => return None,
    };

    let declaration = match prefix {
        Some("xml") => return Some(XML_NAMESPACE),
        Some(prefix) => format!("xmlns:{}", prefix),
        None => "xmlns".to_string(),
    };

    loop {
        if let Some(uri) = doc.get_attribute(element, &declaration) {
            return if uri.is_empty() { None } else { Some(uri) };
        }
        element = doc.parent_of(element)?;
    }
}

// String Functions

fn fn_string(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    optional_string_arg("string", &args, doc, context).map(XPathValue::String)
}

fn fn_concat(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    if args.len() < 2 {
        return Err("concat() requires at least 2 arguments".to_string());
    }
    let result: String = args.iter().map(|a| a.to_string_in(doc)).collect();
    Ok(XPathValue::String(result))
}

fn two_strings(name: &str, args: &[XPathValue], doc: &Document) -> Result<(String, String), String> {
    let args = exactly(name, args, 2)?;
    Ok((args[0].to_string_in(doc), args[1].to_string_in(doc)))
}

fn fn_starts_with(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let (s, prefix) = two_strings("starts-with", &args, doc)?;
    Ok(XPathValue::Boolean(s.starts_with(&prefix)))
}

fn fn_contains(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let (s, pattern) = two_strings("contains", &args, doc)?;
    Ok(XPathValue::Boolean(s.contains(&pattern)))
}

fn fn_substring(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    if args.len() < 2 || args.len() > 3 {
        return Err("substring() requires 2 or 3 arguments".to_string());
    }

    let s = args[0].to_string_in(doc);
    let start = xpath_round(args[1].to_number_in(doc));
    let end = match args.get(2) {
        Some(len) => start + xpath_round(len.to_number_in(doc)),
        None => f64::INFINITY,
    };

    // Character positions are one-based; NaN bounds select nothing
    let result: String = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let p = (*i + 1) as f64;
            p >= start && p < end
        })
        .map(|(_, c)| c)
        .collect();

    Ok(XPathValue::String(result))
}

fn fn_substring_before(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let (s, pattern) = two_strings("substring-before", &args, doc)?;
    let result = match s.find(&pattern) {
        Some(pos) => s[..pos].to_string(),
        None => String::new(),
    };
    Ok(XPathValue::String(result))
}

fn fn_substring_after(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let (s, pattern) = two_strings("substring-after", &args, doc)?;
    let result = match s.find(&pattern) {
        Some(pos) => s[pos + pattern.len()..].to_string(),
        None => String::new(),
    };
    Ok(XPathValue::String(result))
}

fn fn_string_length(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let s = optional_string_arg("string-length", &args, doc, context)?;
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn fn_normalize_space(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let s = optional_string_arg("normalize-space", &args, doc, context)?;
    let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(XPathValue::String(normalized))
}

fn fn_translate(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let args = exactly("translate", &args, 3)?;

    let s = args[0].to_string_in(doc);
    let from: Vec<char> = args[1].to_string_in(doc).chars().collect();
    let to: Vec<char> = args[2].to_string_in(doc).chars().collect();

    // First occurrence in `from` wins; characters past the end of `to` are dropped
    let result: String = s
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect();

    Ok(XPathValue::String(result))
}

// Boolean Functions

fn fn_boolean(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    let args = exactly("boolean", &args, 1)?;
    Ok(XPathValue::Boolean(args[0].to_boolean()))
}

fn fn_not(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    let args = exactly("not", &args, 1)?;
    Ok(XPathValue::Boolean(!args[0].to_boolean()))
}

fn fn_lang(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let args = exactly("lang", &args, 1)?;
    let target_lang = args[0].to_string_in(doc).to_lowercase();

    // Nearest xml:lang (or HTML lang) on the ancestor-or-self chain decides
    let mut node = Some(context);
    while let Some(current) = node {
        let declared = doc
            .get_attribute(current, "xml:lang")
            .or_else(|| doc.get_attribute(current, "lang"));
        if let Some(lang_val) = declared {
            let lang_lower = lang_val.to_lowercase();
            let matches = lang_lower == target_lang
                || (lang_lower.starts_with(&target_lang)
                    && lang_lower.as_bytes().get(target_lang.len()) == Some(&b'-'));
            return Ok(XPathValue::Boolean(matches));
        }
        node = doc.parent_of(current);
    }
    Ok(XPathValue::Boolean(false))
}

// Number Functions

fn fn_number(args: Vec<XPathValue>, doc: &Document, context: NodeId) -> Result<XPathValue, String> {
    let value = match args.as_slice() {
        [] => parse_number(&doc.text_content(context)),
        [value] => value.to_number_in(doc),
        _ => return Err("number() requires 0 or 1 arguments".to_string()),
    };
    Ok(XPathValue::Number(value))
}

fn fn_sum(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    match exactly("sum", &args, 1)? {
        [XPathValue::NodeSet(nodes)] => {
            let total = nodes
                .iter()
                .map(|&node| parse_number(&doc.text_content(node)))
                .sum();
            Ok(XPathValue::Number(total))
        }
        _ => Err("sum() argument must be a node-set".to_string()),
    }
}

fn fn_floor(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let args = exactly("floor", &args, 1)?;
    Ok(XPathValue::Number(args[0].to_number_in(doc).floor()))
}

fn fn_ceiling(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let args = exactly("ceiling", &args, 1)?;
    Ok(XPathValue::Number(args[0].to_number_in(doc).ceil()))
}

fn fn_round(args: Vec<XPathValue>, doc: &Document) -> Result<XPathValue, String> {
    let args = exactly("round", &args, 1)?;
    Ok(XPathValue::Number(xpath_round(args[0].to_number_in(doc))))
}

/// round(): nearest integer, halves towards positive infinity
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}
