//! Key table construction: fetch each key URI once, assign one ref per (URI, IV).

use super::PlaylistError;
use crate::crypto::{iv_from_sequence, parse_iv};
use crate::fetch::Fetcher;
use crate::source::{KeyMaterial, KeyRef, KeyTable};
use crate::url_model::resolve_uri;
use m3u8_rs::{Key, KeyMethod};
use std::collections::HashMap;
use url::Url;

const AES_128_KEY_LEN: usize = 16;

pub(super) struct KeyResolver<'a> {
    fetcher: &'a dyn Fetcher,
    base: &'a Url,
    /// Key bytes by resolved key URL.
    fetched: HashMap<String, Vec<u8>>,
    refs: HashMap<(String, [u8; 16]), KeyRef>,
    table: KeyTable,
}

impl<'a> KeyResolver<'a> {
    pub(super) fn new(fetcher: &'a dyn Fetcher, base: &'a Url) -> Self {
        Self {
            fetcher,
            base,
            fetched: HashMap::new(),
            refs: HashMap::new(),
            table: KeyTable::new(),
        }
    }

    /// Key ref for `key` applied to the segment with media sequence `sequence`.
    /// `None` for `METHOD=NONE`.
    pub(super) fn resolve(
        &mut self,
        key: &Key,
        sequence: u64,
    ) -> Result<Option<KeyRef>, PlaylistError> {
        match &key.method {
            KeyMethod::None => return Ok(None),
            KeyMethod::AES128 => {}
            KeyMethod::SampleAES => {
                return Err(PlaylistError::UnsupportedEncryption("SAMPLE-AES".into()))
            }
            KeyMethod::Other(name) => return Err(PlaylistError::UnsupportedEncryption(name.clone())),
        }

        let uri = key
            .uri
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(PlaylistError::MissingKeyUri)?;
        let key_url = resolve_uri(self.base, uri)
            .map_err(|e| PlaylistError::InvalidUrl {
                url: uri.to_string(),
                source: e,
            })?
            .to_string();

        let iv = match key.iv.as_deref() {
            Some(text) => parse_iv(text).ok_or_else(|| PlaylistError::InvalidIv(text.to_string()))?,
            None => iv_from_sequence(sequence),
        };

        if let Some(r) = self.refs.get(&(key_url.clone(), iv)) {
            return Ok(Some(*r));
        }

        let bytes = self.key_bytes(&key_url)?;
        let r = KeyRef(self.table.len());
        self.table.insert(r, KeyMaterial { key: bytes, iv });
        self.refs.insert((key_url, iv), r);
        Ok(Some(r))
    }

    fn key_bytes(&mut self, key_url: &str) -> Result<Vec<u8>, PlaylistError> {
        if let Some(bytes) = self.fetched.get(key_url) {
            return Ok(bytes.clone());
        }
        let bytes = self.fetcher.fetch(key_url).map_err(|e| PlaylistError::Fetch {
            url: key_url.to_string(),
            source: e,
        })?;
        // Empty key bytes are allowed and mean "not encrypted".
        if !bytes.is_empty() && bytes.len() != AES_128_KEY_LEN {
            return Err(PlaylistError::KeyLength {
                uri: key_url.to_string(),
                len: bytes.len(),
            });
        }
        tracing::debug!(uri = key_url, "fetched decryption key");
        self.fetched.insert(key_url.to_string(), bytes.clone());
        Ok(bytes)
    }

    pub(super) fn into_table(self) -> KeyTable {
        self.table
    }
}
