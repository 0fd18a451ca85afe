//! `CSSRule` and `CSSStyleRule`.
//! Spec: <https://drafts.csswg.org/cssom/#css-rules>

use css_syntax::Rule as SyntaxRule;

use crate::declaration::StyleDeclaration;

pub use css_syntax::AtRule;

/// A style rule: selector text plus its declaration block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Selector list as written.
    pub selector_text: String,
    /// The rule's declarations.
    pub style: StyleDeclaration,
}

/// One entry of a stylesheet's rule list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CssRule {
    Style(StyleRule),
    /// Any at-rule; kept verbatim.
    Other(AtRule),
}

impl CssRule {
    /// The style rule, if this is one.
    pub const fn as_style(&self) -> Option<&StyleRule> {
        match self {
            Self::Style(rule) => Some(rule),
            Self::Other(_) => None,
        }
    }

    pub(crate) fn is_import(&self) -> bool {
        matches!(self, Self::Other(at) if at.name == "import")
    }

    /// Serialize the rule back to CSS text.
    pub fn css_text(&self) -> String {
        match self {
            Self::Style(rule) => format!("{} {{ {} }}", rule.selector_text, rule.style.css_text()),
            Self::Other(at) => match &at.block {
                Some(block) => format!("@{} {} {{ {block} }}", at.name, at.prelude),
                None => format!("@{} {};", at.name, at.prelude),
            },
        }
    }
}

impl From<SyntaxRule> for CssRule {
    fn from(rule: SyntaxRule) -> Self {
        match rule {
            SyntaxRule::Style(style) => Self::Style(StyleRule {
                selector_text: style.prelude,
                style: StyleDeclaration::new(style.declarations),
            }),
            SyntaxRule::At(at) => Self::Other(at),
        }
    }
}
