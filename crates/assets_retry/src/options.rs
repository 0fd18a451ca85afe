//! Engine options and their environment-driven configuration.

use core::fmt::{Debug, Formatter, Result as FmtResult};
use core::time::Duration;
use std::env;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use url::Host;

use crate::domain::DomainMap;

/// Period of the stylesheet scan.
pub const SCAN_INTERVAL: Duration = Duration::from_millis(250);

/// Hook applied to every candidate url before it is written into an override rule:
/// `(candidate_url, original_url) -> url_to_use`.
pub type OnRetry = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Everything the CSS retry engine needs from its caller.
#[derive(Clone)]
pub struct RetryOptions {
    /// Retryable domains and their replacements.
    pub domain_map: DomainMap,
    /// Url transformer, identity by default. Must not panic.
    pub on_retry: OnRetry,
    /// How often stylesheets are polled.
    pub scan_interval: Duration,
}

impl RetryOptions {
    pub fn new(domain_map: DomainMap) -> Self {
        Self {
            domain_map,
            on_retry: Arc::new(|candidate: &str, _original: &str| candidate.to_owned()),
            scan_interval: SCAN_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_on_retry<F>(mut self, on_retry: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.on_retry = Arc::new(on_retry);
        self
    }

    #[must_use]
    pub const fn with_scan_interval(mut self, scan_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self
    }
}

impl Debug for RetryOptions {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        formatter
            .debug_struct("RetryOptions")
            .field("domain_map", &self.domain_map)
            .field("scan_interval", &self.scan_interval)
            .finish_non_exhaustive()
    }
}

/// Retry configuration as read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Rotation list: each domain fails over to the next.
    pub domains: Vec<String>,
    /// Scan period in milliseconds (minimum 1).
    pub scan_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            scan_interval_ms: 250,
        }
    }
}

impl RetryConfig {
    /// Load configuration from environment variables.
    ///
    /// - `ASSETS_RETRY_DOMAINS`: comma-separated rotation list, e.g. `cdn1.com,cdn2.com`
    /// - `ASSETS_RETRY_SCAN_MS`: scan period in milliseconds (default: 250)
    ///
    /// # Errors
    ///
    /// Returns `Err` if a listed domain is not a valid host.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a listed domain is not a valid host.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domains = match lookup("ASSETS_RETRY_DOMAINS") {
            Some(raw) => parse_domains(&raw).context("invalid ASSETS_RETRY_DOMAINS")?,
            None => Vec::new(),
        };
        let scan_interval_ms = lookup("ASSETS_RETRY_SCAN_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(250)
            .max(1);
        Ok(Self {
            domains,
            scan_interval_ms,
        })
    }

    pub fn into_options(self) -> RetryOptions {
        RetryOptions::new(DomainMap::from_rotation(self.domains))
            .with_scan_interval(Duration::from_millis(self.scan_interval_ms))
    }
}

/// Split a comma-separated domain list, validating each `host[:port]` entry. IPv6 literals are
/// not supported.
fn parse_domains(raw: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let host = match entry.rsplit_once(':') {
            Some((host, port)) => {
                port.parse::<u16>()
                    .with_context(|| format!("bad port in {entry:?}"))?;
                host
            }
            None => entry,
        };
        Host::parse(host).with_context(|| format!("bad host {entry:?}"))?;
        out.push(entry.to_owned());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_variables() {
        let config = RetryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RetryConfig::default());
        let options = config.into_options();
        assert!(options.domain_map.is_empty());
        assert_eq!(options.scan_interval, SCAN_INTERVAL);
        assert_eq!((options.on_retry)("http://b.com/x", "http://a.com/x"), "http://b.com/x");
    }

    #[test]
    fn reads_domains_and_interval() {
        let config = RetryConfig::from_lookup(|key| match key {
            "ASSETS_RETRY_DOMAINS" => Some(" a.com, b.com:8080 ,".to_owned()),
            "ASSETS_RETRY_SCAN_MS" => Some("0".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.domains, ["a.com", "b.com:8080"]);
        assert_eq!(config.scan_interval_ms, 1);
        let options = config.into_options();
        assert_eq!(options.domain_map.get("b.com:8080"), Some("a.com"));
    }

    #[test]
    fn rejects_invalid_hosts() {
        let result = RetryConfig::from_lookup(|key| {
            (key == "ASSETS_RETRY_DOMAINS").then(|| "a.com,bad host".to_owned())
        });
        assert!(result.is_err());
        let result = RetryConfig::from_lookup(|key| {
            (key == "ASSETS_RETRY_DOMAINS").then(|| "a.com:http".to_owned())
        });
        assert!(result.is_err());
    }
}
