//! Segment and key URI resolution against the manifest URL.

use url::Url;

/// Resolves a manifest-relative URI using standard URL reference resolution.
///
/// Absolute URIs pass through unchanged; scheme-relative (`//host/x.ts`),
/// root-relative (`/x.ts`) and path-relative (`x.ts`) URIs resolve against `base`.
pub fn resolve_uri(base: &Url, uri: &str) -> Result<Url, url::ParseError> {
    base.join(uri.trim())
}
