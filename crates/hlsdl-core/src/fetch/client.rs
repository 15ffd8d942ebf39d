//! Blocking curl GET with per-run headers and timeouts.

use super::{ClientConfig, Fetcher, DEFAULT_USER_AGENTS};
use crate::error::SegmentError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// [`Fetcher`] backed by one curl Easy handle per request.
pub struct CurlFetcher {
    config: ClientConfig,
    ua_cursor: AtomicUsize,
}

impl CurlFetcher {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            ua_cursor: AtomicUsize::new(0),
        }
    }

    fn user_agent(&self) -> &str {
        match self.config.user_agent.as_deref().filter(|ua| !ua.trim().is_empty()) {
            Some(ua) => ua,
            None => {
                let i = self.ua_cursor.fetch_add(1, Ordering::Relaxed);
                DEFAULT_USER_AGENTS[i % DEFAULT_USER_AGENTS.len()]
            }
        }
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SegmentError> {
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.config.connect_timeout)?;
        easy.timeout(self.config.request_timeout)?;
        easy.useragent(self.user_agent())?;

        let header_lines = self.config.header_lines();
        if !header_lines.is_empty() {
            let mut list = curl::easy::List::new();
            for line in &header_lines {
                list.append(line)?;
            }
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(SegmentError::Http(code));
        }
        Ok(body)
    }
}
