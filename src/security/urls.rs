//! Image URL validation
//!
//! URLs are checked against a scheme allow-list and a domain block-list.
//! Hosts outside the trust list are accepted with a warning. Verdicts are
//! memoized in a [`UrlCache`].

use log::warn;
use parking_lot::Mutex;
use std::collections::HashMap;
use url::Url;

use crate::config::SecurityConfig;

/// Memo of URL verdicts.
///
/// When the cache is full it is emptied before the next insert.
#[derive(Debug)]
pub struct UrlCache {
    capacity: usize,
    entries: Mutex<HashMap<String, bool>>,
}

impl UrlCache {
    pub fn new(capacity: usize) -> Self {
        UrlCache {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, url: &str) -> Option<bool> {
        self.entries.lock().get(url).copied()
    }

    pub fn insert(&self, url: &str, verdict: bool) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains_key(url) {
            entries.clear();
        }
        entries.insert(url.to_string(), verdict);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for UrlCache {
    fn default() -> Self {
        UrlCache::new(1000)
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    !domain.is_empty()
        && (host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.')))
}

/// Uncached verdict for a single URL
pub(crate) fn check_url(config: &SecurityConfig, raw: &str) -> bool {
    if raw.trim().is_empty() {
        return false;
    }

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            warn!("Invalid image URL '{raw}': {e}");
            return false;
        }
    };

    let scheme = url.scheme();
    if !config
        .allowed_protocols
        .iter()
        .any(|allowed| allowed.trim_end_matches(':').eq_ignore_ascii_case(scheme))
    {
        warn!("Unsupported image URL scheme '{scheme}:'");
        return false;
    }

    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        if let Some(blocked) = config
            .blocked_domains
            .iter()
            .find(|domain| host_matches(&host, domain))
        {
            warn!("Image host {host} is on the block list ({blocked})");
            return false;
        }

        if matches!(scheme, "http" | "https")
            && !config
                .trusted_domains
                .iter()
                .any(|domain| host_matches(&host, domain))
        {
            warn!("Image host {host} is not a trusted domain");
        }
    }

    true
}
