//! Per-segment error type shared by fetch, decrypt and persist steps.

use thiserror::Error;

/// Error returned by one attempt at a segment (fetch, decrypt, or write).
/// Kept typed so the pool can classify it before deciding to requeue.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Transport(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Segment URI could not be resolved against the manifest base.
    #[error("unresolvable uri: {0}")]
    Unresolvable(String),
    /// Decryption with the referenced key/IV failed.
    #[error("decrypt: {0}")]
    Decrypt(String),
    /// Disk/storage write failed (e.g. disk full, permission denied).
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// Index outside `[0, segment_count)`.
    #[error("invalid segment index: {0}")]
    InvalidIndex(usize),
}
