//! Turning one url-valued declaration into an `!important` override listing every mirror.

use css::{CssRule, InsertRuleFn, StyleRule, StyleSheet};
use css_syntax::{leading_url, serialize_url};

use crate::domain::get_current_domain;
use crate::options::RetryOptions;
use crate::property::WatchedProperty;

/// Inject a fallback override for `property` of `rule` into `sheet`.
///
/// The override is appended after the sheet's current rules and, if that fails, inserted at
/// index 0. `insert` must be the unwrapped native primitive so the override is not itself
/// intercepted.
///
/// Returns the index of the inserted override, or `None` when nothing applied or both
/// insertions failed.
pub fn rewrite_rule(
    property: WatchedProperty,
    rule: &StyleRule,
    sheet: &mut StyleSheet,
    options: &RetryOptions,
    insert: &InsertRuleFn,
) -> Option<usize> {
    let css_text = override_rule_text(property, rule, options)?;
    let end = sheet.css_rules().map_or(0, <[CssRule]>::len);
    match insert(sheet, &css_text, Some(end)) {
        Ok(index) => {
            log::debug!(target: "assets_retry::css", "{property} override for {:?} at {index}", rule.selector_text);
            Some(index)
        }
        Err(at_end) => {
            log::debug!(target: "assets_retry::css", "override at {end} rejected ({at_end}), retrying at 0");
            match insert(sheet, &css_text, Some(0)) {
                Ok(index) => Some(index),
                Err(at_start) => {
                    log::debug!(target: "assets_retry::css", "dropping {property} override for {:?}: {at_start}", rule.selector_text);
                    None
                }
            }
        }
    }
}

/// Build `<selector> { <property>: url("…"),url("…") !important; }` for a rule, or `None` when
/// the property is unset, embeds a `data:` url, or points at a domain with no replacement.
pub fn override_rule_text(
    property: WatchedProperty,
    rule: &StyleRule,
    options: &RetryOptions,
) -> Option<String> {
    let value = rule.style.property_value(property.css_name())?;
    let original_url = leading_url(&value)?;
    if is_data_url(&original_url) {
        return None;
    }
    let domain_map = &options.domain_map;
    let current_domain = get_current_domain(&original_url, domain_map)?;
    if domain_map.get(current_domain).is_none_or(str::is_empty) {
        return None;
    }
    let url_list = domain_map
        .domains()
        .map(|domain| {
            let candidate = replace_domain(&original_url, current_domain, domain);
            serialize_url(&(options.on_retry)(&candidate, &original_url))
        })
        .collect::<Vec<_>>()
        .join(",");
    Some(format!(
        "{} {{ {}: {url_list} !important; }}",
        rule.selector_text,
        property.css_name()
    ))
}

fn is_data_url(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Replace the first occurrence of `from` in `url` with `to`, ignoring ASCII case.
fn replace_domain(url: &str, from: &str, to: &str) -> String {
    let Some(start) = url
        .to_ascii_lowercase()
        .find(&from.to_ascii_lowercase())
    else {
        return url.to_owned();
    };
    let end = start + from.len();
    format!("{}{to}{}", &url[..start], &url[end..])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use css::{DomException, native_insert_rule};

    use super::*;
    use crate::domain::DomainMap;

    fn options() -> RetryOptions {
        RetryOptions::new(DomainMap::from_pairs([("a.com", "A"), ("b.com", "B")]))
    }

    fn first_style_rule(sheet: &StyleSheet) -> StyleRule {
        sheet.css_rules().unwrap()[0].as_style().unwrap().clone()
    }

    #[test]
    fn fans_out_one_url_per_domain() {
        let sheet = StyleSheet::constructed(".foo { background-image: url(http://a.com/x.png) }");
        let text = override_rule_text(
            WatchedProperty::BackgroundImage,
            &first_style_rule(&sheet),
            &options(),
        );
        assert_eq!(
            text.as_deref(),
            Some(".foo { background-image: url(\"http://a.com/x.png\"),url(\"http://b.com/x.png\") !important; }")
        );
    }

    #[test]
    fn on_retry_sees_candidate_and_original() {
        let sheet = StyleSheet::constructed(".foo { list-style-image: url('//b.com/dot.png') }");
        let opts = options().with_on_retry(|candidate, original| format!("{candidate}?from={original}"));
        let text = override_rule_text(WatchedProperty::ListStyleImage, &first_style_rule(&sheet), &opts).unwrap();
        assert!(text.contains("url(\"//a.com/dot.png?from=//b.com/dot.png\")"));
        assert!(text.contains("url(\"//b.com/dot.png?from=//b.com/dot.png\")"));
    }

    #[test]
    fn skips_inapplicable_values() {
        let opts = options();
        for css in [
            ".foo { background-image: url(data:image/png;base64,AAAA) }",
            ".foo { background-image: url(\"DATA:image/png;base64,AAAA\") }",
            ".foo { background-image: none }",
            ".foo { background-image: url(http://c.com/x.png) }",
            ".foo { background-image: url(/relative.png) }",
            ".foo { color: red }",
        ] {
            let sheet = StyleSheet::constructed(css);
            assert_eq!(
                override_rule_text(WatchedProperty::BackgroundImage, &first_style_rule(&sheet), &opts),
                None,
                "{css}"
            );
        }
    }

    #[test]
    fn empty_replacement_disables_a_domain() {
        let sheet = StyleSheet::constructed(".foo { background-image: url(http://a.com/x.png) }");
        let opts = RetryOptions::new(DomainMap::from_pairs([("a.com", ""), ("b.com", "a.com")]));
        assert_eq!(
            override_rule_text(WatchedProperty::BackgroundImage, &first_style_rule(&sheet), &opts),
            None
        );
    }

    #[test]
    fn override_is_appended_after_existing_rules() {
        let mut sheet = StyleSheet::constructed(".foo { border-image: url(http://a.com/b.png) 30 round }");
        let rule = first_style_rule(&sheet);
        let inserted = rewrite_rule(
            WatchedProperty::BorderImage,
            &rule,
            &mut sheet,
            &options(),
            &native_insert_rule(),
        );
        assert_eq!(inserted, Some(1));
        let rules = sheet.css_rules().unwrap();
        assert_eq!(rules.len(), 2);
        let added = rules[1].as_style().unwrap();
        assert!(added.style.is_important("border-image"));
    }

    #[test]
    fn end_insertion_failure_retries_at_front() {
        let mut sheet = StyleSheet::constructed(".foo { background-image: url(http://a.com/x.png) }");
        let rule = first_style_rule(&sheet);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let native = native_insert_rule();
        let flaky: InsertRuleFn = Arc::new(move |target: &mut StyleSheet, text: &str, index: Option<usize>| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(DomException::IndexSizeError { index: 9, length: 1 });
            }
            native(target, text, index)
        });

        let inserted = rewrite_rule(WatchedProperty::BackgroundImage, &rule, &mut sheet, &options(), &flaky);

        assert_eq!(inserted, Some(0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sheet.css_rules().unwrap().len(), 2);
    }

    #[test]
    fn double_failure_is_swallowed() {
        let mut sheet = StyleSheet::constructed(".foo { background-image: url(http://a.com/x.png) }");
        let rule = first_style_rule(&sheet);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let rejecting: InsertRuleFn = Arc::new(move |_: &mut StyleSheet, _: &str, _: Option<usize>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Err(DomException::HierarchyRequestError("rejected".to_owned()))
        });

        let inserted = rewrite_rule(WatchedProperty::BackgroundImage, &rule, &mut sheet, &options(), &rejecting);

        assert_eq!(inserted, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sheet.css_rules().unwrap().len(), 1);
    }

    #[test]
    fn overrides_for_one_rule_keep_property_order() {
        let mut sheet = StyleSheet::constructed(
            ".foo { background-image: url(http://a.com/x.png); list-style-image: url(http://b.com/y.png) }",
        );
        let rule = first_style_rule(&sheet);
        let insert = native_insert_rule();
        for property in WatchedProperty::ALL {
            rewrite_rule(property, &rule, &mut sheet, &options(), &insert);
        }
        let rules = sheet.css_rules().unwrap();
        assert_eq!(rules.len(), 3);
        assert!(rules[1].as_style().unwrap().style.is_important("background-image"));
        assert!(rules[2].as_style().unwrap().style.is_important("list-style-image"));
    }

    #[test]
    fn replace_domain_only_touches_first_occurrence() {
        assert_eq!(
            replace_domain("http://A.com/a.com/x.png", "a.com", "b.com"),
            "http://b.com/a.com/x.png"
        );
        assert_eq!(replace_domain("http://c.com/x.png", "a.com", "b.com"), "http://c.com/x.png");
    }
}
