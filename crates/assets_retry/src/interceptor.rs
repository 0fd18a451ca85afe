//! Wrapping `insertRule` so rules added by script get the same treatment as loaded ones.

use std::sync::Arc;

use css::{CssRule, Document, DomException, InsertRuleFn, StyleSheet};

use crate::options::RetryOptions;
use crate::property::WatchedProperty;
use crate::rewriter::rewrite_rule;

/// Replace the document's `insertRule` with a wrapper around the native primitive and return
/// that native primitive.
///
/// The wrapper inserts through the native primitive first, so validation and errors are
/// unchanged, then rewrites the rule that landed. Overrides go through the native primitive too
/// and therefore never re-enter any wrapper. Installing again replaces the previous wrapper
/// instead of stacking on it. The wrapper returns the requested index (0 when none was given).
pub fn install_insert_rule_hook(document: &mut Document, options: Arc<RetryOptions>) -> InsertRuleFn {
    let original = document.native_insert_rule_primitive();
    let inner = Arc::clone(&original);
    let wrapper: InsertRuleFn = Arc::new(
        move |sheet: &mut StyleSheet, text: &str, index: Option<usize>| -> Result<usize, DomException> {
            let inserted = inner(sheet, text, index)?;
            rewrite_inserted(sheet, inserted, &options, &inner);
            Ok(index.unwrap_or(0))
        },
    );
    document.replace_insert_rule(wrapper);
    log::debug!(target: "assets_retry::css", "insertRule hook installed");
    original
}

fn rewrite_inserted(sheet: &mut StyleSheet, inserted: usize, options: &RetryOptions, insert: &InsertRuleFn) {
    let rule = match sheet.css_rules() {
        Ok(rules) => rules.get(inserted).and_then(CssRule::as_style).cloned(),
        Err(_) => None,
    };
    let Some(rule) = rule else {
        return;
    };
    for property in WatchedProperty::ALL {
        rewrite_rule(property, &rule, sheet, options, insert);
    }
}
