//! Fallback domains for images referenced from stylesheets.
//!
//! When a CDN serving `background-image`, `border-image` or `list-style-image` urls may be
//! unreachable, every style rule pointing at a configured domain gets an `!important` override
//! listing the same url on every mirror, so the browser's own image fallback can pick one that
//! loads. Two paths feed the rewriter:
//!
//! ```text
//! scan timer (250ms) -> eligibility filter -> sheet scanner -> rule rewriter
//! insertRule hook    ---------------------------------------> rule rewriter
//! ```
//!
//! Both paths share one [`HandledRegistry`] per engine instance, so a stylesheet is scanned at
//! most once. Nothing here surfaces errors to page code: unreadable sheets and rejected
//! insertions are skipped.

pub mod domain;
pub mod filter;
pub mod interceptor;
pub mod options;
pub mod property;
pub mod registry;
pub mod rewriter;
pub mod scanner;
pub mod scheduler;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use css::{Document, InsertRuleFn, NodeKey};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub use domain::{DomainMap, get_current_domain};
pub use options::{OnRetry, RetryConfig, RetryOptions, SCAN_INTERVAL};
pub use property::WatchedProperty;
pub use registry::HandledRegistry;

/// A document shared between page script and the retry engine.
pub type SharedDocument = Arc<Mutex<Document>>;

/// One installed CSS retry engine. Cloning shares the same state.
#[derive(Clone)]
pub struct CssRetry {
    document: SharedDocument,
    registry: Arc<Mutex<HandledRegistry>>,
    options: Arc<RetryOptions>,
    /// The unwrapped `insertRule`; overrides go through this one.
    native_insert: InsertRuleFn,
}

impl CssRetry {
    /// Install the `insertRule` hook on `document`.
    ///
    /// Returns `None`, changing nothing, when the document has no stylesheet collection.
    pub fn install(document: &SharedDocument, options: RetryOptions) -> Option<Self> {
        let options = Arc::new(options);
        let native_insert = {
            let mut doc = document.lock();
            doc.style_sheets()?;
            interceptor::install_insert_rule_hook(&mut doc, Arc::clone(&options))
        };
        log::debug!(
            target: "assets_retry::css",
            "css retry installed for {} domain(s)",
            options.domain_map.len()
        );
        Some(Self {
            document: Arc::clone(document),
            registry: Arc::new(Mutex::new(HandledRegistry::new())),
            options,
            native_insert,
        })
    }

    /// Run one scan now. Returns the number of override rules inserted.
    pub fn tick(&self) -> usize {
        let mut doc = self.document.lock();
        let mut registry = self.registry.lock();
        scheduler::scan_once(&mut doc, &mut registry, &self.options, &self.native_insert)
    }

    /// Start the periodic scan on the current tokio runtime. The task runs until the runtime
    /// shuts down.
    ///
    /// # Errors
    ///
    /// Returns `Err` when called outside a tokio runtime.
    pub fn spawn_scheduler(&self) -> Result<JoinHandle<()>> {
        let handle = Handle::try_current().context("css retry scheduler needs a tokio runtime")?;
        Ok(self.spawn_on(&handle))
    }

    fn spawn_on(&self, handle: &Handle) -> JoinHandle<()> {
        let sheet_added = self.document.lock().subscribe_sheet_added();
        handle.spawn(scheduler::run(self.clone(), sheet_added))
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    pub fn is_stylesheet_handled(&self, href: &str) -> bool {
        self.registry.lock().is_stylesheet_handled(href)
    }

    pub fn handled_style_tags(&self) -> Vec<NodeKey> {
        self.registry.lock().handled_style_tags().to_vec()
    }
}

/// Turn on CSS retry for `document`: hook `insertRule` and start scanning every
/// `options.scan_interval`.
///
/// Returns `false`, installing nothing, when the document has no stylesheet collection. It also
/// returns `false` when called outside a tokio runtime, since the periodic scan has nowhere to
/// run; use [`CssRetry::install`] and [`CssRetry::tick`] to drive the engine without one.
pub fn init_css(document: &SharedDocument, options: RetryOptions) -> bool {
    let Ok(handle) = Handle::try_current() else {
        log::warn!(target: "assets_retry::css", "no tokio runtime, css retry disabled");
        return false;
    };
    let Some(engine) = CssRetry::install(document, options) else {
        log::debug!(target: "assets_retry::css", "no document.styleSheets, css retry disabled");
        return false;
    };
    drop(engine.spawn_on(&handle));
    true
}
