//! "Fetch bytes by URL" capability.
//!
//! The engine only needs a blocking `fetch(url) -> bytes`; [`CurlFetcher`] is the
//! production implementation, tests substitute their own.

mod client;

pub use client::CurlFetcher;

use crate::error::SegmentError;
use std::time::Duration;

/// Blocking byte fetcher shared by all worker threads.
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the full body. Non-2xx statuses are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SegmentError>;
}

/// User agents rotated per request when none is configured.
pub(crate) const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:108.0) Gecko/20100101 Firefox/108.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13.1; rv:108.0) Gecko/20100101 Firefox/108.0",
    "Mozilla/5.0 (Windows NT 10.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
];

/// Per-run HTTP client settings, passed to the fetcher at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub cookie: Option<String>,
    /// Fixed user agent; `None` rotates through a built-in browser list.
    pub user_agent: Option<String>,
    pub connect_timeout: Duration,
    /// Wall-clock limit for one request, body included.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: None,
            referer: None,
            cookie: None,
            user_agent: None,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Extra request headers as `name: value` lines (user agent excluded).
    pub fn header_lines(&self) -> Vec<String> {
        [
            ("origin", &self.origin),
            ("referer", &self.referer),
            ("cookie", &self.cookie),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}: {}", name, v))
        })
        .collect()
    }
}
