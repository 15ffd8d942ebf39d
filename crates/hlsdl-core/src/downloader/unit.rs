//! Fetch-decrypt-persist for a single segment index.

use super::normalize::trim_to_sync_byte;
use crate::crypto::aes128_cbc_decrypt;
use crate::error::SegmentError;
use crate::fetch::Fetcher;
use crate::source::SegmentSource;
use crate::storage::SegmentStore;
use crate::url_model::resolve_uri;
use std::sync::Arc;

/// What a successful attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutcome {
    /// Resolved URL the segment was fetched from.
    pub uri: String,
    /// Bytes written to the segment file.
    pub bytes: usize,
    /// Leading bytes dropped before the first sync byte.
    pub trimmed: usize,
}

/// One attempt at one segment. Called concurrently from every worker thread,
/// never twice at once for the same index.
pub trait SegmentProcessor: Send + Sync {
    fn process(&self, index: usize) -> Result<SegmentOutcome, SegmentError>;
}

/// Production processor: fetch, optional AES-128 decrypt, trim, persist.
pub struct SegmentUnit {
    source: Arc<SegmentSource>,
    fetcher: Arc<dyn Fetcher>,
    store: SegmentStore,
}

impl SegmentUnit {
    pub fn new(source: Arc<SegmentSource>, fetcher: Arc<dyn Fetcher>, store: SegmentStore) -> Self {
        Self {
            source,
            fetcher,
            store,
        }
    }
}

impl SegmentProcessor for SegmentUnit {
    fn process(&self, index: usize) -> Result<SegmentOutcome, SegmentError> {
        let segment = self
            .source
            .segment(index)
            .ok_or(SegmentError::InvalidIndex(index))?;
        let url = resolve_uri(&self.source.base_url, &segment.uri)
            .map_err(|e| SegmentError::Unresolvable(format!("{}: {}", segment.uri, e)))?;

        let mut data = self.fetcher.fetch(url.as_str())?;

        if let Some(key) = self.source.key_for(segment) {
            data = aes128_cbc_decrypt(&data, &key.key, &key.iv)
                .map_err(|e| SegmentError::Decrypt(e.to_string()))?;
        }

        let body = trim_to_sync_byte(&data);
        let trimmed = data.len() - body.len();
        if !body.is_empty() && body[0] != super::normalize::TS_SYNC_BYTE {
            tracing::warn!(index, uri = %url, "segment has no TS sync byte, keeping it as-is");
        } else if trimmed > 0 {
            tracing::debug!(index, trimmed, "dropped bytes before first sync byte");
        }

        self.store.persist(index, body)?;

        Ok(SegmentOutcome {
            uri: url.into(),
            bytes: body.len(),
            trimmed,
        })
    }
}
