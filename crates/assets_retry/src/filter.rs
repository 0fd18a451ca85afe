use css::{SheetId, StyleSheet};

use crate::domain::{DomainMap, get_current_domain};
use crate::registry::HandledRegistry;

/// The stylesheets a scan should visit, in document order.
///
/// - sheets without an accessible rule list are never candidates
/// - inline sheets qualify once, and only while their `<style>` element has text; rules added to
///   an empty `<style>` arrive through the `insertRule` hook instead
/// - linked sheets qualify until handled, and only if their `href` is on a configured domain.
///   Unresolvable sheets are left unmarked and re-checked on every scan.
pub fn style_sheets_to_handle(
    sheets: &[StyleSheet],
    registry: &HandledRegistry,
    domain_map: &DomainMap,
) -> Vec<SheetId> {
    sheets
        .iter()
        .filter(|sheet| is_candidate(sheet, registry, domain_map))
        .map(StyleSheet::id)
        .collect()
}

fn is_candidate(sheet: &StyleSheet, registry: &HandledRegistry, domain_map: &DomainMap) -> bool {
    if !sheet.has_rule_list() {
        return false;
    }
    let Some(href) = sheet.href() else {
        return sheet.owner_node().style_element().is_some_and(|element| {
            !registry.is_style_tag_handled(element.key) && !element.text.is_empty()
        });
    };
    !registry.is_stylesheet_handled(href) && get_current_domain(href, domain_map).is_some()
}
