//! DOM exceptions raised by the CSS Object Model.
//! Spec: <https://webidl.spec.whatwg.org/#idl-DOMException-error-names>

use core::fmt::{Display, Formatter, Result as FmtResult};
use std::error::Error;

use css_syntax::SyntaxError;

/// Errors surfaced by stylesheet operations, named after their `DOMException` counterparts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomException {
    /// An index was past the end of a rule list.
    IndexSizeError { index: usize, length: usize },
    /// Rule text did not parse as exactly one rule.
    SyntaxError(SyntaxError),
    /// The rule may not appear at the requested position (for example `@import` after a style rule).
    HierarchyRequestError(String),
    /// The rule list belongs to a cross-origin stylesheet.
    SecurityError,
    /// The rule list is not available yet (the stylesheet is still loading).
    InvalidAccessError,
    /// No node or stylesheet with the given key exists.
    NotFoundError,
}

impl Display for DomException {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::IndexSizeError { index, length } => write!(
                formatter,
                "IndexSizeError: index {index} is greater than the rule count {length}"
            ),
            Self::SyntaxError(err) => write!(formatter, "SyntaxError: {err}"),
            Self::HierarchyRequestError(message) => {
                write!(formatter, "HierarchyRequestError: {message}")
            }
            Self::SecurityError => {
                write!(formatter, "SecurityError: cannot access rules of a cross-origin stylesheet")
            }
            Self::InvalidAccessError => {
                write!(formatter, "InvalidAccessError: stylesheet rules are not available yet")
            }
            Self::NotFoundError => write!(formatter, "NotFoundError: no such node"),
        }
    }
}

impl Error for DomException {}

impl From<SyntaxError> for DomException {
    fn from(err: SyntaxError) -> Self {
        Self::SyntaxError(err)
    }
}
