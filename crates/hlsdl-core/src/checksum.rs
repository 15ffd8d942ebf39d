//! Short content digests for naming per-run artifacts.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
const SHORT_LEN: usize = 16;

/// First 16 lowercase hex chars of SHA-256(`text`).
///
/// Stable for a given manifest URL, so re-running the same URL reuses the
/// same working directory name.
pub fn short_digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(SHORT_LEN);
    hex
}
