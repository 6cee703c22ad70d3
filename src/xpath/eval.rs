//! XPath Evaluation Engine
//!
//! Evaluates compiled XPath expressions against a document.

use super::axes::{matches_node_test, navigate};
use super::compiler::{CompiledExpr, Op};
use super::functions;
use super::parser::BinaryOp;
use super::value::XPathValue;
use crate::dom::{Document, NodeId, DOCUMENT_NODE};
use std::collections::HashSet;

/// Evaluation context
pub struct EvalContext<'a> {
    pub doc: &'a Document,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(doc: &'a Document, context_node: NodeId) -> Self {
        EvalContext {
            doc,
            context_node,
            context_position: 1,
            context_size: 1,
        }
    }
}

/// Evaluate an XPath expression with the document node as context
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate(doc: &Document, xpath: &str) -> Result<XPathValue, String> {
    evaluate_from_node(doc, DOCUMENT_NODE, xpath)
}

/// Evaluate an XPath expression from a specific context node
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node(doc: &Document, context_node: NodeId, xpath: &str) -> Result<XPathValue, String> {
    let compiled = super::compiler::compile(xpath)?;
    evaluate_compiled(&compiled, &EvalContext::new(doc, context_node))
}

fn pop(stack: &mut Vec<XPathValue>) -> Result<XPathValue, String> {
    stack.pop().ok_or_else(|| "Malformed expression".to_string())
}

fn pop_nodeset(stack: &mut Vec<XPathValue>, what: &str) -> Result<Vec<NodeId>, String> {
    match pop(stack)? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(format!("{} requires a node-set, got a {}", what, other.type_name())),
    }
}

/// Evaluate a compiled expression
pub fn evaluate_compiled(expr: &CompiledExpr, ctx: &EvalContext<'_>) -> Result<XPathValue, String> {
    let doc = ctx.doc;
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            Op::Root => stack.push(XPathValue::single_node(DOCUMENT_NODE)),

            Op::Context => stack.push(XPathValue::single_node(ctx.context_node)),

            Op::Step(axis, node_test, predicates) => {
                let nodes = pop_nodeset(&mut stack, "A location step")?;
                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());

                for node in nodes {
                    let mut candidates: Vec<NodeId> = navigate(doc, node, *axis)
                        .into_iter()
                        .filter(|&candidate| matches_node_test(doc, candidate, node_test, *axis))
                        .collect();
                    // Proximity positions follow axis order, per context node
                    for predicate in predicates {
                        candidates = apply_predicate(predicate, candidates, doc)?;
                    }
                    for candidate in candidates {
                        if seen.insert(candidate) {
                            result.push(candidate);
                        }
                    }
                }

                // Node IDs are assigned in document order
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Filter(predicate) => {
                let nodes = pop_nodeset(&mut stack, "A predicate")?;
                stack.push(XPathValue::NodeSet(apply_predicate(predicate, nodes, doc)?));
            }

            Op::Union => {
                let right = pop_nodeset(&mut stack, "Union")?;
                let left = pop_nodeset(&mut stack, "Union")?;
                let mut seen: HashSet<NodeId> = left.iter().copied().collect();
                let mut result = left;
                result.extend(right.into_iter().filter(|node| seen.insert(*node)));
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Number(n) => stack.push(XPathValue::Number(*n)),

            Op::String(s) => stack.push(XPathValue::String(s.clone())),

            Op::Negate => {
                let val = pop(&mut stack)?;
                stack.push(XPathValue::Number(-val.to_number_in(doc)));
            }

            Op::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;

                let result = match op {
                    BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
                    BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
                    BinaryOp::Eq
                    | BinaryOp::NotEq
                    | BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq => XPathValue::Boolean(compare_values(doc, *op, &left, &right)),
                    BinaryOp::Add => XPathValue::Number(left.to_number_in(doc) + right.to_number_in(doc)),
                    BinaryOp::Sub => XPathValue::Number(left.to_number_in(doc) - right.to_number_in(doc)),
                    BinaryOp::Mul => XPathValue::Number(left.to_number_in(doc) * right.to_number_in(doc)),
                    BinaryOp::Div => XPathValue::Number(left.to_number_in(doc) / right.to_number_in(doc)),
                    BinaryOp::Mod => XPathValue::Number(left.to_number_in(doc) % right.to_number_in(doc)),
                };

                stack.push(result);
            }

            Op::Call(name, arg_count) => {
                if stack.len() < *arg_count {
                    return Err("Malformed expression".to_string());
                }
                let args = stack.split_off(stack.len() - arg_count);
                let result = functions::call(
                    name,
                    args,
                    doc,
                    ctx.context_node,
                    ctx.context_position,
                    ctx.context_size,
                )?;
                stack.push(result);
            }
        }
    }

    pop(&mut stack)
}

/// Keep the nodes for which `predicate` holds. A numeric result selects by
/// position within `nodes`.
fn apply_predicate(predicate: &CompiledExpr, nodes: Vec<NodeId>, doc: &Document) -> Result<Vec<NodeId>, String> {
    let size = nodes.len();
    let mut filtered = Vec::with_capacity(size);

    for (i, node) in nodes.into_iter().enumerate() {
        let pred_ctx = EvalContext {
            doc,
            context_node: node,
            context_position: i + 1,
            context_size: size,
        };

        let include = match evaluate_compiled(predicate, &pred_ctx)? {
            XPathValue::Number(n) => (i + 1) as f64 == n,
            other => other.to_boolean(),
        };

        if include {
            filtered.push(node);
        }
    }

    Ok(filtered)
}

/// Compare two values per XPath 1.0: a node-set operand compares true if
/// any of its nodes does.
fn compare_values(doc: &Document, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(ln), XPathValue::NodeSet(rn)) => {
            let right_values: Vec<XPathValue> = rn
                .iter()
                .map(|&r| XPathValue::String(doc.text_content(r)))
                .collect();
            ln.iter().any(|&l| {
                let lv = XPathValue::String(doc.text_content(l));
                right_values.iter().any(|rv| compare_atoms(doc, op, &lv, rv))
            })
        }
        (XPathValue::NodeSet(nodes), other) => nodes
            .iter()
            .any(|&n| compare_atoms(doc, op, &node_atom(doc, n, other), other))
            || (nodes.is_empty() && boolean_against_empty(doc, op, left, right)),
        (other, XPathValue::NodeSet(nodes)) => nodes
            .iter()
            .any(|&n| compare_atoms(doc, op, other, &node_atom(doc, n, other)))
            || (nodes.is_empty() && boolean_against_empty(doc, op, left, right)),
        _ => compare_atoms(doc, op, left, right),
    }
}

/// A node converted to the type it is compared against
fn node_atom(doc: &Document, node: NodeId, other: &XPathValue) -> XPathValue {
    match other {
        XPathValue::Boolean(_) => XPathValue::Boolean(true),
        XPathValue::Number(_) => XPathValue::Number(doc_number(doc, node)),
        _ => XPathValue::String(doc.text_content(node)),
    }
}

/// An empty node-set still converts to boolean false
fn boolean_against_empty(doc: &Document, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(_), XPathValue::Boolean(_)) => {
            compare_atoms(doc, op, &XPathValue::Boolean(false), right)
        }
        (XPathValue::Boolean(_), XPathValue::NodeSet(_)) => {
            compare_atoms(doc, op, left, &XPathValue::Boolean(false))
        }
        _ => false,
    }
}

fn doc_number(doc: &Document, node: NodeId) -> f64 {
    super::value::parse_number(&doc.text_content(node))
}

/// Compare two non-node-set values
fn compare_atoms(doc: &Document, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    let equal = match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            if matches!(left, XPathValue::Boolean(_)) || matches!(right, XPathValue::Boolean(_)) {
                left.to_boolean() == right.to_boolean()
            } else if matches!(left, XPathValue::Number(_)) || matches!(right, XPathValue::Number(_)) {
                left.to_number_in(doc) == right.to_number_in(doc)
            } else {
                left.to_string_in(doc) == right.to_string_in(doc)
            }
        }
        _ => {
            let (l, r) = (left.to_number_in(doc), right.to_number_in(doc));
            return match op {
                BinaryOp::Lt => l < r,
                BinaryOp::LtEq => l <= r,
                BinaryOp::Gt => l > r,
                BinaryOp::GtEq => l >= r,
                _ => false,
            };
        }
    };

    if op == BinaryOp::Eq {
        equal
    } else {
        !equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(doc: &Document, xpath: &str) -> Vec<NodeId> {
        evaluate(doc, xpath).unwrap().into_nodeset().unwrap()
    }

    fn texts(doc: &Document, xpath: &str) -> Vec<String> {
        nodes(doc, xpath).into_iter().map(|n| doc.text_content(n)).collect()
    }

    fn xml(input: &str) -> Document {
        Document::parse_xml(input).unwrap()
    }

    #[test]
    fn test_simple_path() {
        let doc = xml("<root><child/></root>");
        assert_eq!(nodes(&doc, "/root/child").len(), 1);
        assert_eq!(nodes(&doc, "root/child").len(), 1);
        assert_eq!(nodes(&doc, "/"), vec![DOCUMENT_NODE]);
    }

    #[test]
    fn test_descendant() {
        let doc = xml("<root><a><b/></a></root>");
        assert_eq!(nodes(&doc, "//b").len(), 1);
    }

    #[test]
    fn test_step_predicate_is_per_parent() {
        let doc = xml("<r><l><i>a</i><i>b</i></l><l><i>c</i><i>d</i></l></r>");
        assert_eq!(texts(&doc, "//i[1]"), vec!["a", "c"]);
        assert_eq!(texts(&doc, "(//i)[1]"), vec!["a"]);
        assert_eq!(texts(&doc, "//i[last()]"), vec!["b", "d"]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        let doc = xml("<r><a>1</a><a>2</a><a>3</a></r>");
        assert_eq!(texts(&doc, "/r/a[3]/preceding-sibling::a[1]"), vec!["2"]);
        assert_eq!(texts(&doc, "/r/a[3]/preceding-sibling::a"), vec!["1", "2"]);
    }

    #[test]
    fn test_attribute_nodes() {
        let doc = xml(r#"<r><a href="x"/><a href="y"/><a/></r>"#);
        assert_eq!(texts(&doc, "//a/@href"), vec!["x", "y"]);
        assert_eq!(nodes(&doc, "//a[@href]").len(), 2);
        assert_eq!(nodes(&doc, "//a[@href='y']").len(), 1);
        assert_eq!(nodes(&doc, "//@*").len(), 2);
    }

    #[test]
    fn test_union_in_document_order() {
        let doc = xml("<r><b>2</b><a>1</a><b>3</b></r>");
        assert_eq!(texts(&doc, "//a | //b"), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_count_and_arithmetic() {
        let doc = xml("<root><a/><b/><c/></root>");
        let doc_ref = &doc;
        let number = |x: &str| evaluate(doc_ref, x).unwrap().to_number_in(doc_ref);
        assert_eq!(number("count(/root/*)"), 3.0);
        assert_eq!(number("7 mod 3"), 1.0);
        assert_eq!(number("6 div 4"), 1.5);
        assert_eq!(number("-(2 * 3)"), -6.0);
        assert_eq!(number("string-length('hello')"), 5.0);
    }

    #[test]
    fn test_comparisons() {
        let doc = xml("<r><n>1</n><n>5</n><s>abc</s></r>");
        let doc_ref = &doc;
        let truth = |x: &str| evaluate(doc_ref, x).unwrap().to_boolean();
        assert!(truth("//n = 5"));
        assert!(truth("//n != 5"));
        assert!(truth("//n > 4"));
        assert!(!truth("//n > 5"));
        assert!(truth("//s = 'abc'"));
        assert!(truth("//missing = false()"));
        assert!(!truth("//missing = 'x'"));
        assert!(truth("1 < 2 and 'a' = 'a'"));
        assert!(truth("true() = 'yes'"));
    }

    #[test]
    fn test_div_element_name() {
        let doc = Document::parse_html("<div><p>one</p></div><div>two</div>");
        assert_eq!(nodes(&doc, "//div").len(), 2);
        assert_eq!(texts(&doc, "//div[2]"), vec!["two"]);
    }

    #[test]
    fn test_context_from_node() {
        let doc = xml("<r><t><x>1</x></t><x>2</x></r>");
        let t = nodes(&doc, "//t")[0];
        let result = evaluate_from_node(&doc, t, ".//x").unwrap().into_nodeset().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(doc.text_content(result[0]), "1");
        let up = evaluate_from_node(&doc, t, "..").unwrap().into_nodeset().unwrap();
        assert_eq!(doc.node_name(up[0]), Some("r"));
    }

    #[test]
    fn test_text_and_comment_tests() {
        let doc = xml("<r>a<!--c--><b>x</b>z</r>");
        assert_eq!(texts(&doc, "/r/text()"), vec!["a", "z"]);
        assert_eq!(texts(&doc, "//comment()"), vec!["c"]);
        assert_eq!(nodes(&doc, "/r/node()").len(), 4);
    }

    #[test]
    fn test_errors() {
        let doc = xml("<r/>");
        assert!(evaluate(&doc, "//r[").is_err());
        assert!(evaluate(&doc, "'a'/b").is_err());
        assert!(evaluate(&doc, "1 | //r").is_err());
        assert!(evaluate(&doc, "unknown()").is_err());
    }
}
