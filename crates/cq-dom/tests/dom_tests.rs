//! Tests for tree construction, traversal and class-list mutation.

use cq_dom::{DomTree, ElementData, NodeId};

fn element_with_class(tag: &str, class: &str) -> ElementData {
    let mut data = ElementData::new(tag);
    let _ = data.attrs.insert("class".to_string(), class.to_string());
    data
}

#[test]
fn test_append_sets_sibling_links() {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let a = tree.append_element(html, ElementData::new("a"));
    let b = tree.append_element(html, ElementData::new("b"));

    assert_eq!(tree.children(html), &[a, b]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
    assert_eq!(tree.preceding_siblings(b).collect::<Vec<_>>(), vec![a]);
}

#[test]
fn test_tag_names_are_lowercased() {
    assert_eq!(ElementData::new("DIV").tag_name, "div");
}

#[test]
fn test_document_element_and_parent_element() {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));

    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.parent_element(body), Some(html));
    // The document node is not an element.
    assert_eq!(tree.parent_element(html), None);
    assert_eq!(tree.ancestors(body).collect::<Vec<_>>(), vec![html, NodeId::ROOT]);
}

#[test]
fn test_elements_in_tree_order() {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let first = tree.append_element(body, ElementData::new("div"));
    let inner = tree.append_element(first, ElementData::new("span"));
    let _ = tree.append_text(inner, "hello");
    let second = tree.append_element(body, ElementData::new("div"));

    assert_eq!(tree.elements(), vec![html, body, first, inner, second]);
    assert_eq!(tree.text_content(body), "hello");
}

#[test]
fn test_class_tokens_split_on_any_whitespace() {
    let data = element_with_class("div", "  card\tlarge\nwide ");
    let classes: Vec<&str> = data.classes().collect();
    assert_eq!(classes, vec!["card", "large", "wide"]);
    assert!(data.has_class("large"));
    assert!(!data.has_class("Large"));
}

#[test]
fn test_add_class_is_idempotent() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, element_with_class("div", "card"));

    assert!(tree.add_class(div, ":container(min-width:300px)"));
    assert!(!tree.add_class(div, ":container(min-width:300px)"));

    let data = tree.as_element(div).unwrap();
    assert_eq!(data.attrs["class"], "card :container(min-width:300px)");
}

#[test]
fn test_remove_class_keeps_other_tokens() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, element_with_class("div", "a b c"));

    assert!(tree.remove_class(div, "b"));
    assert!(!tree.remove_class(div, "b"));
    assert_eq!(tree.as_element(div).unwrap().attrs["class"], "a c");
}

#[test]
fn test_add_class_without_attribute() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, ElementData::new("div"));
    assert!(tree.add_class(div, "x"));
    assert_eq!(tree.as_element(div).unwrap().attrs["class"], "x");
}

#[test]
fn test_class_mutation_on_text_node_is_noop() {
    let mut tree = DomTree::new();
    let text = tree.append_text(NodeId::ROOT, "t");
    assert!(!tree.add_class(text, "x"));
    assert!(!tree.remove_class(text, "x"));
}
