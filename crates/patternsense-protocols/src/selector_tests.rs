use super::*;
use crate::dom_ext::DocumentEnvExt;
use crate::test_support::TreeDoc;

fn sample() -> (TreeDoc, NodeId, NodeId, NodeId) {
    let mut doc = TreeDoc::new("body");
    let root = doc.root_id();
    let form = doc.add(root, "form", &[("id", "signup"), ("class", "card wide")], "");
    let row = doc.add(form, "div", &[("class", "row")], "");
    let input = doc.add(
        row,
        "input",
        &[("type", "email"), ("placeholder", "Your email address")],
        "",
    );
    (doc, form, row, input)
}

#[test]
fn test_parse_compound() {
    let sel = Selector::parse("input.search#q[type=text]").unwrap();
    let compound = &sel.groups()[0].compounds[0];
    assert_eq!(compound.tag.as_deref(), Some("input"));
    assert_eq!(compound.id.as_deref(), Some("q"));
    assert_eq!(compound.classes, vec!["search".to_string()]);
    assert_eq!(compound.attrs[0].op, AttrOp::Equals);
    assert_eq!(compound.attrs[0].value, "text");
}

#[test]
fn test_parse_groups_and_combinators() {
    let sel = Selector::parse("form .row > input, [role=search]").unwrap();
    assert_eq!(sel.groups().len(), 2);
    assert_eq!(
        sel.groups()[0].combinators,
        vec![Combinator::Descendant, Combinator::Child]
    );
}

#[test]
fn test_parse_quoted_values() {
    let sel = Selector::parse(r#"[aria-label*="cookie settings"]"#).unwrap();
    assert_eq!(sel.groups()[0].compounds[0].attrs[0].value, "cookie settings");
    assert_eq!(sel.groups()[0].compounds[0].attrs[0].op, AttrOp::Contains);
}

#[test]
fn test_parse_errors() {
    assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    assert!(matches!(
        Selector::parse("[type=text"),
        Err(SelectorError::UnterminatedAttribute(_))
    ));
    assert!(matches!(
        Selector::parse("[title='open"),
        Err(SelectorError::UnterminatedQuote(_))
    ));
    assert!(Selector::parse("div,").is_err());
    assert!(Selector::parse("div >").is_err());
    assert!(Selector::parse("!div").is_err());
}

#[test]
fn test_universal_matches_everything() {
    let (doc, form, _, input) = sample();
    let sel = Selector::parse("*").unwrap();
    assert!(sel.matches(&doc, form));
    assert!(sel.matches(&doc, input));
}

#[test]
fn test_match_class_and_id() {
    let (doc, form, row, _) = sample();
    assert!(Selector::parse("#signup").unwrap().matches(&doc, form));
    assert!(Selector::parse(".card.wide").unwrap().matches(&doc, form));
    assert!(!Selector::parse(".card.narrow").unwrap().matches(&doc, form));
    assert!(!Selector::parse("#signup").unwrap().matches(&doc, row));
}

#[test]
fn test_attribute_operators() {
    let (doc, _, _, input) = sample();
    assert!(Selector::parse("[placeholder]").unwrap().matches(&doc, input));
    assert!(Selector::parse("[placeholder*=email]").unwrap().matches(&doc, input));
    assert!(Selector::parse("[placeholder^=Your]").unwrap().matches(&doc, input));
    assert!(Selector::parse("[placeholder$=address]").unwrap().matches(&doc, input));
    assert!(Selector::parse("[placeholder~=email]").unwrap().matches(&doc, input));
    assert!(!Selector::parse("[placeholder=email]").unwrap().matches(&doc, input));
    assert!(!Selector::parse("[name]").unwrap().matches(&doc, input));
}

#[test]
fn test_descendant_and_child() {
    let (doc, _, _, input) = sample();
    assert!(Selector::parse("form input").unwrap().matches(&doc, input));
    assert!(Selector::parse(".row > input").unwrap().matches(&doc, input));
    assert!(!Selector::parse("form > input").unwrap().matches(&doc, input));
    assert!(Selector::parse("body form .row input").unwrap().matches(&doc, input));
}

#[test]
fn test_query_all_document_order() {
    let (doc, form, row, input) = sample();
    let found = doc.query_all(&Selector::parse("form, div, input").unwrap());
    assert_eq!(found, vec![form, row, input]);
}

#[test]
fn test_broken_node_never_matches() {
    let (mut doc, form, _, _) = sample();
    doc.break_node(form);
    assert!(!Selector::parse("form").unwrap().matches(&doc, form));
}

#[test]
fn test_display_keeps_source() {
    let sel: Selector = " [role=log] ".parse().unwrap();
    assert_eq!(sel.to_string(), "[role=log]");
}
