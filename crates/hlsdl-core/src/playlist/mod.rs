//! Manifest acquisition: fetch and parse an HLS playlist into a [`SegmentSource`].
//!
//! Master playlists are followed to their highest-bandwidth variant. Segment
//! URIs are kept as written; the download unit resolves them later.

mod keys;

use crate::error::SegmentError;
use crate::fetch::Fetcher;
use crate::source::{SegmentDescriptor, SegmentSource};
use crate::url_model::resolve_uri;
use keys::KeyResolver;
use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("invalid playlist url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: SegmentError,
    },
    #[error("parse {url}: {message}")]
    Parse { url: String, message: String },
    #[error("master playlist has no playable variants")]
    NoVariants,
    #[error("variant {0} is itself a master playlist")]
    NestedMaster(String),
    #[error("unsupported encryption method: {0}")]
    UnsupportedEncryption(String),
    #[error("EXT-X-KEY without URI")]
    MissingKeyUri,
    #[error("invalid IV '{0}'")]
    InvalidIv(String),
    #[error("key at {uri} is {len} bytes, expected 16")]
    KeyLength { uri: String, len: usize },
}

fn fetch_playlist(fetcher: &dyn Fetcher, url: &Url) -> Result<Playlist, PlaylistError> {
    let body = fetcher.fetch(url.as_str()).map_err(|e| PlaylistError::Fetch {
        url: url.to_string(),
        source: e,
    })?;
    m3u8_rs::parse_playlist_res(&body).map_err(|e| PlaylistError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Highest-bandwidth variant, ignoring I-frame-only streams.
fn pick_variant(master: &MasterPlaylist) -> Option<&str> {
    master
        .variants
        .iter()
        .filter(|v| !v.is_i_frame && !v.uri.trim().is_empty())
        .max_by_key(|v| v.bandwidth)
        .map(|v| v.uri.as_str())
}

/// Fetch `url`, follow a master playlist to its best variant, and build the source.
pub fn load(fetcher: &dyn Fetcher, url: &str) -> Result<SegmentSource, PlaylistError> {
    let manifest_url = Url::parse(url.trim()).map_err(|e| PlaylistError::InvalidUrl {
        url: url.to_string(),
        source: e,
    })?;

    let (media, media_url) = match fetch_playlist(fetcher, &manifest_url)? {
        Playlist::MediaPlaylist(pl) => (pl, manifest_url),
        Playlist::MasterPlaylist(master) => {
            let variant = pick_variant(&master).ok_or(PlaylistError::NoVariants)?;
            let variant_url =
                resolve_uri(&manifest_url, variant).map_err(|e| PlaylistError::InvalidUrl {
                    url: variant.to_string(),
                    source: e,
                })?;
            tracing::info!("master playlist: using variant {}", variant_url);
            match fetch_playlist(fetcher, &variant_url)? {
                Playlist::MediaPlaylist(pl) => (pl, variant_url),
                Playlist::MasterPlaylist(_) => {
                    return Err(PlaylistError::NestedMaster(variant_url.to_string()))
                }
            }
        }
    };

    build_source(fetcher, &media, media_url)
}

/// Turn a parsed media playlist into a [`SegmentSource`], fetching keys as needed.
///
/// A key tag applies to its segment and every following one until the next
/// key tag; `METHOD=NONE` clears it.
pub fn build_source(
    fetcher: &dyn Fetcher,
    media: &MediaPlaylist,
    base_url: Url,
) -> Result<SegmentSource, PlaylistError> {
    let mut resolver = KeyResolver::new(fetcher, &base_url);
    let mut current_key = None;
    let mut segments = Vec::with_capacity(media.segments.len());

    for (index, seg) in media.segments.iter().enumerate() {
        if seg.key.is_some() {
            current_key = seg.key.as_ref();
        }
        let sequence = media.media_sequence + index as u64;
        let key = match current_key {
            Some(k) => resolver.resolve(k, sequence)?,
            None => None,
        };
        segments.push(SegmentDescriptor {
            index,
            uri: seg.uri.trim().to_string(),
            key,
        });
    }

    let keys = resolver.into_table();
    tracing::debug!(
        segments = segments.len(),
        keys = keys.len(),
        base = %base_url,
        "playlist parsed"
    );
    Ok(SegmentSource {
        base_url,
        segments,
        keys,
    })
}
