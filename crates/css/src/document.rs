//! The document-level stylesheet list and the page-wide `insertRule` primitive.
//! Spec: <https://drafts.csswg.org/cssom/#extensions-to-the-document-or-shadow-root-interface>

use core::mem;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::NodeKey;
use crate::exception::DomException;
use crate::sheet::{OwnerNode, SheetAccess, SheetId, StyleElement, StyleSheet};

/// Signature of `CSSStyleSheet.prototype.insertRule`: `(this, rule, index?) -> index`.
pub type InsertRuleFn =
    Arc<dyn Fn(&mut StyleSheet, &str, Option<usize>) -> Result<usize, DomException> + Send + Sync>;

/// Capacity of the "stylesheet added" notification channel.
const SHEET_EVENTS_CAPACITY: usize = 64;

/// The browser's own `insertRule`, before any script replaced it.
pub fn native_insert_rule() -> InsertRuleFn {
    Arc::new(|sheet: &mut StyleSheet, text: &str, index: Option<usize>| {
        sheet.insert_rule(text, index.unwrap_or(0))
    })
}

/// A document's stylesheets plus the shared `insertRule` slot every page script goes through.
pub struct Document {
    /// `None` when the host has no `document.styleSheets` at all.
    style_sheets: Option<Vec<StyleSheet>>,
    insert_rule: InsertRuleFn,
    /// What `insert_rule` was before any replacement. Never replaced.
    native_insert_rule: InsertRuleFn,
    next_node: u64,
    sheet_added: broadcast::Sender<SheetId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_style_sheets(Some(Vec::new()))
    }

    /// A document whose host exposes no stylesheet collection.
    pub fn without_style_sheets() -> Self {
        Self::with_style_sheets(None)
    }

    fn with_style_sheets(style_sheets: Option<Vec<StyleSheet>>) -> Self {
        let (sheet_added, _receiver) = broadcast::channel(SHEET_EVENTS_CAPACITY);
        let native = native_insert_rule();
        Self {
            style_sheets,
            insert_rule: Arc::clone(&native),
            native_insert_rule: native,
            next_node: 1,
            sheet_added,
        }
    }

    /// `document.styleSheets`, in document order.
    pub fn style_sheets(&self) -> Option<&[StyleSheet]> {
        self.style_sheets.as_deref()
    }

    pub fn style_sheets_mut(&mut self) -> Option<&mut [StyleSheet]> {
        self.style_sheets.as_deref_mut()
    }

    pub fn sheet(&self, id: SheetId) -> Option<&StyleSheet> {
        self.style_sheets()?.iter().find(|sheet| sheet.id() == id)
    }

    pub fn sheet_mut(&mut self, id: SheetId) -> Option<&mut StyleSheet> {
        self.style_sheets_mut()?
            .iter_mut()
            .find(|sheet| sheet.id() == id)
    }

    /// Insert `<style>text</style>` and return its stylesheet.
    ///
    /// # Errors
    ///
    /// `NotFoundError` when the document has no stylesheet collection.
    pub fn add_style_element(&mut self, text: &str) -> Result<SheetId, DomException> {
        let key = self.mint_node();
        let owner = OwnerNode::Style(StyleElement {
            key,
            text: text.to_owned(),
        });
        self.attach(StyleSheet::new(None, owner, SheetAccess::Clean, text))
    }

    /// Insert `<link rel="stylesheet" href=…>` whose response body is `text`.
    ///
    /// # Errors
    ///
    /// `NotFoundError` when the document has no stylesheet collection.
    pub fn add_linked_sheet(
        &mut self,
        href: &str,
        text: &str,
        access: SheetAccess,
    ) -> Result<SheetId, DomException> {
        let key = self.mint_node();
        self.attach(StyleSheet::new(
            Some(href.to_owned()),
            OwnerNode::Link(key),
            access,
            text,
        ))
    }

    /// Replace the text of a `<style>` element; its stylesheet is reparsed.
    ///
    /// # Errors
    ///
    /// `NotFoundError` when no `<style>` element has this key.
    pub fn set_style_text(&mut self, key: NodeKey, text: &str) -> Result<(), DomException> {
        let sheet = self
            .style_sheets_mut()
            .and_then(|sheets| {
                sheets.iter_mut().find(|sheet| {
                    sheet
                        .owner_node()
                        .style_element()
                        .is_some_and(|element| element.key == key)
                })
            })
            .ok_or(DomException::NotFoundError)?;
        sheet.reparse(text);
        Ok(())
    }

    /// `sheet.insertRule(text, index)` as page script calls it: dispatched through whatever
    /// primitive is currently installed.
    ///
    /// # Errors
    ///
    /// `NotFoundError` for an unknown sheet, otherwise whatever the primitive raises.
    pub fn insert_rule(
        &mut self,
        id: SheetId,
        text: &str,
        index: Option<usize>,
    ) -> Result<usize, DomException> {
        let primitive = Arc::clone(&self.insert_rule);
        let sheet = self.sheet_mut(id).ok_or(DomException::NotFoundError)?;
        primitive(sheet, text, index)
    }

    /// `sheet.deleteRule(index)`.
    ///
    /// # Errors
    ///
    /// `NotFoundError` for an unknown sheet, otherwise as [`StyleSheet::delete_rule`].
    pub fn delete_rule(&mut self, id: SheetId, index: usize) -> Result<(), DomException> {
        self.sheet_mut(id)
            .ok_or(DomException::NotFoundError)?
            .delete_rule(index)
    }

    /// The currently installed `insertRule`.
    pub fn insert_rule_primitive(&self) -> InsertRuleFn {
        Arc::clone(&self.insert_rule)
    }

    /// The document's own `insertRule`, unaffected by [`Self::replace_insert_rule`].
    pub fn native_insert_rule_primitive(&self) -> InsertRuleFn {
        Arc::clone(&self.native_insert_rule)
    }

    /// Install a new `insertRule`, returning the one it replaces.
    pub fn replace_insert_rule(&mut self, primitive: InsertRuleFn) -> InsertRuleFn {
        mem::replace(&mut self.insert_rule, primitive)
    }

    /// Notifications for every stylesheet attached after subscribing.
    pub fn subscribe_sheet_added(&self) -> broadcast::Receiver<SheetId> {
        self.sheet_added.subscribe()
    }

    fn attach(&mut self, sheet: StyleSheet) -> Result<SheetId, DomException> {
        let id = sheet.id();
        self.style_sheets
            .as_mut()
            .ok_or(DomException::NotFoundError)?
            .push(sheet);
        // No receivers is fine: nobody is watching yet.
        if self.sheet_added.send(id).is_err() {
            log::trace!(target: "css::cssom", "sheet {id:?} attached with no watchers");
        }
        Ok(id)
    }

    const fn mint_node(&mut self) -> NodeKey {
        let key = NodeKey(self.next_node);
        self.next_node += 1;
        key
    }
}
