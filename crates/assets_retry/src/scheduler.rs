//! The recurring stylesheet scan.

use std::collections::HashSet;

use css::{Document, InsertRuleFn, SheetId};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::CssRetry;
use crate::filter::style_sheets_to_handle;
use crate::options::RetryOptions;
use crate::registry::HandledRegistry;
use crate::scanner::scan_style_sheets;

/// One scan: pick the eligible stylesheets and rewrite them. Returns the overrides inserted.
pub fn scan_once(
    document: &mut Document,
    registry: &mut HandledRegistry,
    options: &RetryOptions,
    insert: &InsertRuleFn,
) -> usize {
    let Some(sheets) = document.style_sheets_mut() else {
        return 0;
    };
    let candidates: HashSet<SheetId> =
        style_sheets_to_handle(sheets, registry, &options.domain_map)
            .into_iter()
            .collect();
    if candidates.is_empty() {
        return 0;
    }
    log::trace!(target: "assets_retry::css", "scanning {} stylesheet(s)", candidates.len());
    let targets = sheets
        .iter_mut()
        .filter(|sheet| candidates.contains(&sheet.id()));
    scan_style_sheets(targets, registry, options, insert)
}

/// Scan every `scan_interval` forever, the first scan one period after start. A newly attached
/// stylesheet triggers an early scan; the interval stays as the fallback when notifications lag
/// or stop.
pub(crate) async fn run(engine: CssRetry, mut sheet_added: Receiver<SheetId>) {
    let period = engine.options().scan_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut watching = true;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            event = sheet_added.recv(), if watching => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => watching = false,
            },
        }
        engine.tick();
    }
}
