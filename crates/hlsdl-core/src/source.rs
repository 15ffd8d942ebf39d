//! Segment source: the finished result of manifest parsing.
//!
//! An ordered list of segment descriptors plus the key table they reference.
//! Immutable once built; shared read-only by every worker.

use std::collections::HashMap;
use url::Url;

/// Reference into a [`KeyTable`]. One per distinct (key URI, IV) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRef(pub usize);

/// Raw symmetric key bytes and the IV to use with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Key bytes as served by the key URI. Empty means "no decryption".
    pub key: Vec<u8>,
    pub iv: [u8; 16],
}

pub type KeyTable = HashMap<KeyRef, KeyMaterial>;

/// One numbered segment as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Zero-based position in the manifest.
    pub index: usize,
    /// URI exactly as written in the manifest (relative or absolute).
    pub uri: String,
    pub key: Option<KeyRef>,
}

/// Ordered segments, the key table and the base URL relative URIs resolve against.
#[derive(Debug, Clone)]
pub struct SegmentSource {
    pub base_url: Url,
    pub segments: Vec<SegmentDescriptor>,
    pub keys: KeyTable,
}

impl SegmentSource {
    /// Source of unencrypted segments, indexed in the order given.
    pub fn plain(base_url: Url, uris: impl IntoIterator<Item = String>) -> Self {
        let segments = uris
            .into_iter()
            .enumerate()
            .map(|(index, uri)| SegmentDescriptor {
                index,
                uri,
                key: None,
            })
            .collect();
        Self {
            base_url,
            segments,
            keys: KeyTable::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<&SegmentDescriptor> {
        self.segments.get(index)
    }

    /// Key material for a segment, if it references a key with non-empty bytes.
    pub fn key_for(&self, segment: &SegmentDescriptor) -> Option<&KeyMaterial> {
        segment
            .key
            .and_then(|r| self.keys.get(&r))
            .filter(|k| !k.key.is_empty())
    }
}
