//! Retryable domains and url-to-domain resolution.

use url::Url;

/// Ordered map from a source domain to the domain it fails over to.
///
/// Keys are the complete set of domains considered retryable. Iteration follows insertion order,
/// which is also the order fallback urls are emitted in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainMap {
    entries: Vec<(String, String)>,
}

impl DomainMap {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from explicit `(source, replacement)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (domain, replacement) in pairs {
            map.insert(domain, replacement);
        }
        map
    }

    /// Build from a rotation list: each domain fails over to the next, the last to the first.
    pub fn from_rotation<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = domains.into_iter().map(Into::into).collect();
        let mut map = Self::new();
        for (idx, domain) in list.iter().enumerate() {
            let next = &list[(idx + 1) % list.len()];
            map.insert(domain.clone(), next.clone());
        }
        map
    }

    /// Insert or overwrite a mapping. Overwriting keeps the key's original position.
    pub fn insert(&mut self, domain: impl Into<String>, replacement: impl Into<String>) {
        let domain = domain.into();
        let replacement = replacement.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == domain) {
            entry.1 = replacement;
        } else {
            self.entries.push((domain, replacement));
        }
    }

    pub fn get(&self, domain: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == domain)
            .map(|(_, replacement)| replacement.as_str())
    }

    /// Source domains in insertion order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The configured domain serving `url`, if any.
///
/// Matches the url's `host:port` or bare host against the map's keys, first key wins.
/// Relative urls, `data:` urls and anything else without a host resolve to `None`.
pub fn get_current_domain<'map>(url: &str, domain_map: &'map DomainMap) -> Option<&'map str> {
    let parsed = if url.starts_with("//") {
        Url::parse(&format!("http:{url}"))
    } else {
        Url::parse(url)
    }
    .ok()?;
    let host = parsed.host_str()?;
    let authority = parsed.port().map(|port| format!("{host}:{port}"));
    domain_map.domains().find(|domain| {
        domain.eq_ignore_ascii_case(host)
            || authority
                .as_deref()
                .is_some_and(|with_port| domain.eq_ignore_ascii_case(with_port))
    })
}
