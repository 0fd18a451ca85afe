//! `CSSStyleSheet`: an ordered rule list plus the node that owns it.
//! Spec: <https://drafts.csswg.org/cssom/#the-cssstylesheet-interface>

use core::sync::atomic::{AtomicU64, Ordering};

use css_syntax::{parse_rule, parse_stylesheet};

use crate::NodeKey;
use crate::exception::DomException;
use crate::rule::CssRule;

static NEXT_SHEET_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a stylesheet for as long as it is attached to a document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SheetId(pub u64);

impl SheetId {
    fn mint() -> Self {
        Self(NEXT_SHEET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An inline `<style>` element and its current text content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleElement {
    pub key: NodeKey,
    pub text: String,
}

/// The node a stylesheet came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerNode {
    /// `<style>…</style>`
    Style(StyleElement),
    /// `<link rel="stylesheet">`
    Link(NodeKey),
    /// Constructed stylesheets have no owner node.
    None,
}

impl OwnerNode {
    /// The owning `<style>` element, if any.
    pub const fn style_element(&self) -> Option<&StyleElement> {
        match self {
            Self::Style(element) => Some(element),
            Self::Link(_) | Self::None => None,
        }
    }
}

/// Whether script may read a stylesheet's rule list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SheetAccess {
    #[default]
    Clean,
    /// Served from another origin without CORS: the rule list does not exist for script.
    CrossOrigin,
    /// The rule list exists but reading it fails until loading completes.
    Loading,
}

/// A stylesheet attached to a document.
#[derive(Clone, Debug)]
pub struct StyleSheet {
    id: SheetId,
    href: Option<String>,
    owner_node: OwnerNode,
    access: SheetAccess,
    rules: Vec<CssRule>,
}

impl StyleSheet {
    /// Build a stylesheet from CSS text. Unparseable rules are dropped.
    pub fn new(href: Option<String>, owner_node: OwnerNode, access: SheetAccess, text: &str) -> Self {
        Self {
            id: SheetId::mint(),
            href,
            owner_node,
            access,
            rules: parse_rules(text),
        }
    }

    /// A constructed stylesheet (`new CSSStyleSheet()` + `replaceSync`).
    pub fn constructed(text: &str) -> Self {
        Self::new(None, OwnerNode::None, SheetAccess::Clean, text)
    }

    pub const fn id(&self) -> SheetId {
        self.id
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub const fn owner_node(&self) -> &OwnerNode {
        &self.owner_node
    }

    pub const fn access(&self) -> SheetAccess {
        self.access
    }

    pub const fn set_access(&mut self, access: SheetAccess) {
        self.access = access;
    }

    /// Cheap probe for whether a rule list exists at all, without reading it.
    pub fn has_rule_list(&self) -> bool {
        self.access != SheetAccess::CrossOrigin
    }

    /// Read the rule list (`cssRules`).
    ///
    /// # Errors
    ///
    /// `SecurityError` for cross-origin sheets, `InvalidAccessError` while loading.
    pub fn css_rules(&self) -> Result<&[CssRule], DomException> {
        self.check_access()?;
        Ok(&self.rules)
    }

    /// The native `insertRule` algorithm. Returns the index the rule was inserted at.
    ///
    /// Spec: <https://drafts.csswg.org/cssom/#insert-a-css-rule>
    ///
    /// # Errors
    ///
    /// - access errors as for [`Self::css_rules`]
    /// - `SyntaxError` when `text` is not exactly one rule
    /// - `IndexSizeError` when `index` is past the end of the rule list
    /// - `HierarchyRequestError` when the rule would break `@import` ordering
    pub fn insert_rule(&mut self, text: &str, index: usize) -> Result<usize, DomException> {
        self.check_access()?;
        let rule = CssRule::from(parse_rule(text)?);
        let length = self.rules.len();
        if index > length {
            return Err(DomException::IndexSizeError { index, length });
        }
        let (before, after) = self.rules.split_at(index);
        if rule.is_import() && before.iter().any(|existing| !existing.is_import()) {
            return Err(DomException::HierarchyRequestError(
                "@import must precede all other rules".to_owned(),
            ));
        }
        if !rule.is_import() && after.iter().any(CssRule::is_import) {
            return Err(DomException::HierarchyRequestError(
                "rule cannot be inserted before an @import".to_owned(),
            ));
        }
        log::trace!(target: "css::cssom", "insert rule into sheet {:?} at {index}", self.id);
        self.rules.insert(index, rule);
        Ok(index)
    }

    /// The native `deleteRule` algorithm.
    ///
    /// # Errors
    ///
    /// Access errors as for [`Self::css_rules`], `IndexSizeError` when `index` is out of range.
    pub fn delete_rule(&mut self, index: usize) -> Result<(), DomException> {
        self.check_access()?;
        let length = self.rules.len();
        if index >= length {
            return Err(DomException::IndexSizeError { index, length });
        }
        self.rules.remove(index);
        Ok(())
    }

    /// Replace the rules with a fresh parse of `text`, as happens when a `<style>` element's
    /// text changes.
    pub(crate) fn reparse(&mut self, text: &str) {
        if let OwnerNode::Style(element) = &mut self.owner_node {
            text.clone_into(&mut element.text);
        }
        self.rules = parse_rules(text);
    }

    const fn check_access(&self) -> Result<(), DomException> {
        match self.access {
            SheetAccess::Clean => Ok(()),
            SheetAccess::CrossOrigin => Err(DomException::SecurityError),
            SheetAccess::Loading => Err(DomException::InvalidAccessError),
        }
    }
}

fn parse_rules(text: &str) -> Vec<CssRule> {
    parse_stylesheet(text)
        .rules
        .into_iter()
        .map(CssRule::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rule_appends_and_prepends() {
        let mut sheet = StyleSheet::constructed(".a { color: red }");
        assert_eq!(sheet.insert_rule(".b { color: blue }", 1), Ok(1));
        assert_eq!(sheet.insert_rule(".c { color: green }", 0), Ok(0));
        let selectors: Vec<&str> = sheet
            .css_rules()
            .unwrap()
            .iter()
            .filter_map(CssRule::as_style)
            .map(|rule| rule.selector_text.as_str())
            .collect();
        assert_eq!(selectors, [".c", ".a", ".b"]);
    }

    #[test]
    fn insert_rule_rejects_bad_index_and_text() {
        let mut sheet = StyleSheet::constructed(".a { color: red }");
        assert_eq!(
            sheet.insert_rule(".b { color: blue }", 5),
            Err(DomException::IndexSizeError { index: 5, length: 1 })
        );
        assert!(matches!(
            sheet.insert_rule("garbage", 0),
            Err(DomException::SyntaxError(_))
        ));
        assert_eq!(sheet.css_rules().unwrap().len(), 1);
    }

    #[test]
    fn import_ordering_is_enforced() {
        let mut sheet = StyleSheet::constructed("@import url(a.css); .a { color: red }");
        assert!(matches!(
            sheet.insert_rule(".b { color: blue }", 0),
            Err(DomException::HierarchyRequestError(_))
        ));
        assert!(matches!(
            sheet.insert_rule("@import url(b.css);", 2),
            Err(DomException::HierarchyRequestError(_))
        ));
        assert_eq!(sheet.insert_rule("@import url(b.css);", 1), Ok(1));
    }

    #[test]
    fn inaccessible_sheets_reject_reads_and_writes() {
        let mut sheet = StyleSheet::new(
            Some("https://other.example/site.css".to_owned()),
            OwnerNode::Link(NodeKey(7)),
            SheetAccess::CrossOrigin,
            ".a { color: red }",
        );
        assert!(!sheet.has_rule_list());
        assert_eq!(sheet.css_rules(), Err(DomException::SecurityError));
        assert_eq!(sheet.insert_rule(".b { color: blue }", 0), Err(DomException::SecurityError));

        sheet.set_access(SheetAccess::Loading);
        assert!(sheet.has_rule_list());
        assert_eq!(sheet.css_rules(), Err(DomException::InvalidAccessError));

        sheet.set_access(SheetAccess::Clean);
        assert_eq!(sheet.access(), SheetAccess::Clean);
        assert_eq!(sheet.css_rules().unwrap().len(), 1);
    }
}
