//! XPath Axes Implementation
//!
//! All 13 XPath 1.0 axes:
//! - child, parent, self
//! - descendant, descendant-or-self
//! - ancestor, ancestor-or-self
//! - following, following-sibling
//! - preceding, preceding-sibling
//! - attribute, namespace
//!
//! Every axis returns its nodes in axis order: document order for forward
//! axes, nearest-first for reverse axes.

use super::compiler::CompiledNodeTest;
use super::parser::Axis;
use crate::dom::{Document, NodeId, NodeKind, DOCUMENT_NODE};

/// Navigate along an axis from a context node
pub fn navigate(doc: &Document, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => doc.descendants(context).collect(),
        Axis::DescendantOrSelf => descendant_or_self_axis(doc, context),
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Ancestor => ancestor_axis(doc, context),
        Axis::AncestorOrSelf => ancestor_or_self_axis(doc, context),
        Axis::FollowingSibling => following_sibling_axis(doc, context),
        Axis::PrecedingSibling => preceding_sibling_axis(doc, context),
        Axis::Following => following_axis(doc, context),
        Axis::Preceding => preceding_axis(doc, context),
        Axis::Self_ => vec![context],
        Axis::Attribute => doc.attributes(context).collect(),
        // Namespace nodes are not modelled
        Axis::Namespace => Vec::new(),
    }
}

fn descendant_or_self_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = vec![context];
    result.extend(doc.descendants(context));
    result
}

fn ancestor_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;

    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }

    result
}

fn ancestor_or_self_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = vec![context];
    result.extend(ancestor_axis(doc, context));
    result
}

/// Attributes have no siblings
fn is_attribute(doc: &Document, node: NodeId) -> bool {
    doc.node_kind(node) == NodeKind::Attribute
}

fn following_sibling_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    if is_attribute(doc, context) {
        return Vec::new();
    }
    std::iter::successors(doc.next_sibling_of(context), |&id| doc.next_sibling_of(id)).collect()
}

fn preceding_sibling_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    if is_attribute(doc, context) {
        return Vec::new();
    }
    std::iter::successors(doc.prev_sibling_of(context), |&id| doc.prev_sibling_of(id)).collect()
}

/// following:: axis - nodes after the context in document order,
/// excluding its descendants and attribute nodes
fn following_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    // An attribute's following nodes start with its owner's content
    let (mut current, include_children) = if is_attribute(doc, context) {
        match doc.parent_of(context) {
            Some(owner) => (owner, true),
            None => return result,
        }
    } else {
        (context, false)
    };

    if include_children {
        result.extend(doc.descendants(current));
    }

    loop {
        let mut sibling = doc.next_sibling_of(current);
        while let Some(sib_id) = sibling {
            result.push(sib_id);
            result.extend(doc.descendants(sib_id));
            sibling = doc.next_sibling_of(sib_id);
        }
        match doc.parent_of(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    result
}

/// preceding:: axis - nodes before the context in document order,
/// excluding ancestors and attribute nodes, nearest first
fn preceding_axis(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let start = if is_attribute(doc, context) {
        match doc.parent_of(context) {
            Some(owner) => owner,
            None => return Vec::new(),
        }
    } else {
        context
    };
    let ancestors = ancestor_axis(doc, start);

    // IDs are in document order, so everything preceding has a smaller ID
    let mut result: Vec<NodeId> = std::iter::once(DOCUMENT_NODE)
        .chain(doc.descendants(DOCUMENT_NODE))
        .take_while(|&id| id < start)
        .filter(|id| !ancestors.contains(id))
        .collect();

    result.reverse();
    result
}

/// Check if a node matches a node test.
///
/// `*` and name tests select the axis' principal node type: attributes on
/// the attribute axis, elements everywhere else. Names compare by local
/// name; a prefixed test also requires the same prefix.
pub fn matches_node_test(doc: &Document, node_id: NodeId, node_test: &CompiledNodeTest, axis: Axis) -> bool {
    let kind = doc.node_kind(node_id);
    let principal = if axis == Axis::Attribute {
        NodeKind::Attribute
    } else {
        NodeKind::Element
    };

    match node_test {
        CompiledNodeTest::Any => kind == principal,
        CompiledNodeTest::Name(name) => {
            kind == principal && doc.node_local_name(node_id) == Some(name.as_str())
        }
        CompiledNodeTest::QName(prefix, local) => {
            kind == principal
                && doc.node_prefix(node_id) == Some(prefix.as_str())
                && doc.node_local_name(node_id) == Some(local.as_str())
        }
        CompiledNodeTest::NamespaceWildcard(prefix) => {
            kind == principal && doc.node_prefix(node_id) == Some(prefix.as_str())
        }
        CompiledNodeTest::Node => true,
        CompiledNodeTest::Text => kind == NodeKind::Text || kind == NodeKind::CData,
        CompiledNodeTest::Comment => kind == NodeKind::Comment,
        CompiledNodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target
                    .as_deref()
                    .map_or(true, |expected| doc.node_name(node_id) == Some(expected))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &Document, name: &str) -> NodeId {
        doc.descendants(DOCUMENT_NODE)
            .find(|&id| doc.node_kind(id) == NodeKind::Element && doc.node_name(id) == Some(name))
            .unwrap()
    }

    fn names(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| doc.node_name(id))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_child_axis() {
        let doc = Document::parse_xml("<root a=\"1\"><a/><b/></root>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(names(&doc, &navigate(&doc, root, Axis::Child)), vec!["a", "b"]);
    }

    #[test]
    fn test_descendant_axis() {
        let doc = Document::parse_xml("<root><a><b/></a><c/></root>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(
            names(&doc, &navigate(&doc, root, Axis::Descendant)),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_ancestor_axis_is_nearest_first() {
        let doc = Document::parse_xml("<root><a><b/></a></root>").unwrap();
        let b = element(&doc, "b");
        let ancestors = navigate(&doc, b, Axis::Ancestor);
        assert_eq!(ancestors.len(), 3); // a, root, document
        assert_eq!(names(&doc, &ancestors), vec!["a", "root"]);
        assert_eq!(ancestors[2], DOCUMENT_NODE);
    }

    #[test]
    fn test_sibling_axes() {
        let doc = Document::parse_xml("<r><a/><b/><c/></r>").unwrap();
        let b = element(&doc, "b");
        assert_eq!(names(&doc, &navigate(&doc, b, Axis::FollowingSibling)), vec!["c"]);
        assert_eq!(names(&doc, &navigate(&doc, b, Axis::PrecedingSibling)), vec!["a"]);
    }

    #[test]
    fn test_following_and_preceding() {
        let doc = Document::parse_xml("<r><a><x/></a><b><y/></b><c/></r>").unwrap();
        let b = element(&doc, "b");
        assert_eq!(names(&doc, &navigate(&doc, b, Axis::Following)), vec!["c"]);
        assert_eq!(names(&doc, &navigate(&doc, b, Axis::Preceding)), vec!["x", "a"]);
        let y = element(&doc, "y");
        assert_eq!(names(&doc, &navigate(&doc, y, Axis::Preceding)), vec!["x", "a"]);
    }

    #[test]
    fn test_attribute_axis() {
        let doc = Document::parse_xml("<r id=\"1\" class=\"k\"><c/></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let attrs = navigate(&doc, root, Axis::Attribute);
        assert_eq!(names(&doc, &attrs), vec!["id", "class"]);
        assert!(navigate(&doc, attrs[0], Axis::FollowingSibling).is_empty());
        assert_eq!(names(&doc, &navigate(&doc, attrs[0], Axis::Following)), vec!["c"]);
        assert!(navigate(&doc, root, Axis::Namespace).is_empty());
    }

    #[test]
    fn test_principal_node_type() {
        let doc = Document::parse_xml("<r id=\"1\"><id/></r>").unwrap();
        let root = doc.root_element_id().unwrap();
        let test = CompiledNodeTest::Name("id".to_string());
        let attr = root + 1;
        let child = element(&doc, "id");
        assert!(matches_node_test(&doc, attr, &test, Axis::Attribute));
        assert!(!matches_node_test(&doc, attr, &test, Axis::Child));
        assert!(matches_node_test(&doc, child, &test, Axis::Child));
        assert!(!matches_node_test(&doc, child, &test, Axis::Attribute));
    }
}
