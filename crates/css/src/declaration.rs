//! `CSSStyleDeclaration`: the property block of a style rule.
//! Spec: <https://drafts.csswg.org/cssom/#the-cssstyledeclaration-interface>

use core::fmt::Write as _;

use css_syntax::{Declaration, find_url, serialize_url};

/// Longhands whose value can come from a url-bearing shorthand.
const URL_SHORTHANDS: [(&str, &str); 2] = [
    ("background-image", "background"),
    ("list-style-image", "list-style"),
];

/// The declarations of one rule, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    declarations: Vec<Declaration>,
}

impl StyleDeclaration {
    pub(crate) const fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Value of a property by its hyphenated name, or `None` when the block does not set it.
    ///
    /// Later declarations win over earlier ones and `!important` wins over normal. For
    /// `background-image` and `list-style-image` a `background`/`list-style` shorthand also
    /// supplies the value, yielding its url serialized as `url("…")` or `none`.
    pub fn property_value(&self, name: &str) -> Option<String> {
        let shorthand = URL_SHORTHANDS
            .iter()
            .find(|(longhand, _)| *longhand == name)
            .map(|(_, short)| *short);
        let mut winner: Option<&Declaration> = None;
        for decl in &self.declarations {
            let relevant = decl.name == name || shorthand.is_some_and(|short| decl.name == short);
            if relevant && winner.is_none_or(|current| decl.important || !current.important) {
                winner = Some(decl);
            }
        }
        let decl = winner?;
        if decl.name == name {
            return Some(decl.value.clone());
        }
        Some(find_url(&decl.value).map_or_else(|| "none".to_owned(), |url| serialize_url(&url)))
    }

    /// Whether the declaration for `name` carries `!important`.
    pub fn is_important(&self, name: &str) -> bool {
        self.declarations
            .iter()
            .rev()
            .find(|decl| decl.name == name)
            .is_some_and(|decl| decl.important)
    }

    /// Number of declarations in the block.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialize the block as `name: value; …`.
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        for (idx, decl) in self.declarations.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            let important = if decl.important { " !important" } else { "" };
            // Writing into a String cannot fail.
            let _ignored = write!(out, "{}: {}{important};", decl.name, decl.value);
        }
        out
    }
}
