//! In-memory CSS Object Model.
//!
//! Documents own an ordered list of stylesheets; each stylesheet owns an ordered rule list that
//! script can read and grow through `insertRule`. Parsing is delegated to `css_syntax`.
//! Spec: <https://drafts.csswg.org/cssom/>

pub mod declaration;
pub mod document;
pub mod exception;
pub mod rule;
pub mod sheet;

pub use declaration::StyleDeclaration;
pub use document::{Document, InsertRuleFn, native_insert_rule};
pub use exception::DomException;
pub use rule::{AtRule, CssRule, StyleRule};
pub use sheet::{OwnerNode, SheetAccess, SheetId, StyleElement, StyleSheet};

/// A 64-bit stable key for DOM nodes that own stylesheets.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey(pub u64);
