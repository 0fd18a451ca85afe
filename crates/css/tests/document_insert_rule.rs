//! Document-level stylesheet bookkeeping and the replaceable `insertRule` primitive.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use css::{CssRule, Document, DomException, InsertRuleFn, SheetAccess, StyleSheet};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn selectors(sheet: &StyleSheet) -> Vec<String> {
    sheet
        .css_rules()
        .unwrap()
        .iter()
        .filter_map(CssRule::as_style)
        .map(|rule| rule.selector_text.clone())
        .collect()
}

#[test]
fn style_elements_and_links_are_listed_in_document_order() {
    init_logger();
    let mut doc = Document::new();
    let inline = doc.add_style_element(".a { color: red }").unwrap();
    let linked = doc
        .add_linked_sheet("https://cdn.example/site.css", ".b { color: blue }", SheetAccess::Clean)
        .unwrap();

    let ids: Vec<_> = doc.style_sheets().unwrap().iter().map(StyleSheet::id).collect();
    assert_eq!(ids, [inline, linked]);
    assert!(doc.sheet(inline).unwrap().owner_node().style_element().is_some());
    assert_eq!(doc.sheet(linked).unwrap().href(), Some("https://cdn.example/site.css"));
}

#[test]
fn missing_stylesheet_collection_rejects_new_sheets() {
    let mut doc = Document::without_style_sheets();
    assert!(doc.style_sheets().is_none());
    assert_eq!(doc.add_style_element(".a { color: red }"), Err(DomException::NotFoundError));
}

#[test]
fn set_style_text_reparses_the_owning_sheet() {
    let mut doc = Document::new();
    let id = doc.add_style_element("").unwrap();
    let key = doc.sheet(id).unwrap().owner_node().style_element().unwrap().key;

    doc.set_style_text(key, ".x { color: red } .y { color: blue }").unwrap();

    let sheet = doc.sheet(id).unwrap();
    assert_eq!(selectors(sheet), [".x", ".y"]);
    assert_eq!(
        sheet.owner_node().style_element().unwrap().text,
        ".x { color: red } .y { color: blue }"
    );
}

#[test]
fn insert_rule_without_index_inserts_at_front() {
    let mut doc = Document::new();
    let id = doc.add_style_element(".a { color: red }").unwrap();
    assert_eq!(doc.insert_rule(id, ".b { color: blue }", None), Ok(0));
    assert_eq!(selectors(doc.sheet(id).unwrap()), [".b", ".a"]);
    doc.delete_rule(id, 0).unwrap();
    assert_eq!(selectors(doc.sheet(id).unwrap()), [".a"]);
}

#[test]
fn replaced_primitive_receives_every_page_insertion() {
    let mut doc = Document::new();
    let id = doc.add_style_element(".a { color: red }").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let original = doc.insert_rule_primitive();
    let counter = Arc::clone(&calls);
    let wrapper: InsertRuleFn = Arc::new(move |sheet: &mut StyleSheet, text: &str, index: Option<usize>| {
        counter.fetch_add(1, Ordering::SeqCst);
        original(sheet, text, index)
    });
    doc.replace_insert_rule(wrapper);

    assert_eq!(doc.insert_rule(id, ".b { color: blue }", Some(1)), Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(selectors(doc.sheet(id).unwrap()), [".a", ".b"]);
}

#[test]
fn sheet_added_notifications_follow_attachment() {
    let mut doc = Document::new();
    let mut events = doc.subscribe_sheet_added();
    let id = doc.add_style_element(".a { color: red }").unwrap();
    assert_eq!(events.try_recv().unwrap(), id);
    assert!(events.try_recv().is_err());
}

#[test]
fn native_primitive_survives_replacement() {
    let mut doc = Document::new();
    let id = doc.add_style_element(".a { color: red }").unwrap();
    let rejecting: InsertRuleFn = Arc::new(|_: &mut StyleSheet, _: &str, _: Option<usize>| {
        Err(DomException::NotFoundError)
    });
    doc.replace_insert_rule(rejecting);

    assert_eq!(doc.insert_rule(id, ".b { color: blue }", Some(1)), Err(DomException::NotFoundError));

    let native = doc.native_insert_rule_primitive();
    let sheet = doc.sheet_mut(id).unwrap();
    assert_eq!(native(sheet, ".b { color: blue }", Some(1)), Ok(1));
    assert_eq!(selectors(doc.sheet(id).unwrap()), [".a", ".b"]);
}
