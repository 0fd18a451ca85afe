use css::{CssRule, InsertRuleFn, StyleSheet};

use crate::options::RetryOptions;
use crate::property::WatchedProperty;
use crate::registry::HandledRegistry;
use crate::rewriter::rewrite_rule;

/// Rewrite every watched property of every style rule in `sheets`, then record the sheets as
/// handled. Returns the number of overrides inserted.
///
/// A sheet whose rules cannot be read contributes nothing; if it is linked it is still recorded,
/// so an unreadable cross-origin sheet is tried only once.
pub fn scan_style_sheets<'sheet, I>(
    sheets: I,
    registry: &mut HandledRegistry,
    options: &RetryOptions,
    insert: &InsertRuleFn,
) -> usize
where
    I: IntoIterator<Item = &'sheet mut StyleSheet>,
{
    let mut inserted = 0;
    for sheet in sheets {
        let snapshot = match sheet.css_rules() {
            Ok(rules) => Some(rules.to_vec()),
            Err(err) => {
                log::debug!(
                    target: "assets_retry::css",
                    "cannot read rules of {:?} ({:?}): {err}",
                    sheet.href(),
                    sheet.access()
                );
                None
            }
        };
        if let Some(snapshot) = snapshot {
            for rule in snapshot.iter().filter_map(CssRule::as_style) {
                for property in WatchedProperty::ALL {
                    if rewrite_rule(property, rule, sheet, options, insert).is_some() {
                        inserted += 1;
                    }
                }
            }
            if let Some(element) = sheet.owner_node().style_element() {
                registry.record_style_tag(element.key);
            }
        }
        if let Some(href) = sheet.href() {
            registry.mark_stylesheet(href);
        }
    }
    inserted
}
