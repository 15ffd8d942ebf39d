//! URL resolution and on-disk naming.
//!
//! Resolves segment URIs against the manifest URL and derives the per-run
//! working directory and output file names.

mod resolve;
mod sanitize;

pub use resolve::resolve_uri;
pub use sanitize::sanitize_output_name;

use crate::checksum::short_digest;

/// Extension of persisted per-segment files.
pub const SEGMENT_EXT: &str = ".ts";

/// File name of a persisted segment: the index plus [`SEGMENT_EXT`].
pub fn segment_filename(index: usize) -> String {
    format!("{}{}", index, SEGMENT_EXT)
}

/// Name of the per-run working directory for a manifest URL (`ts_<digest16>`).
pub fn work_dir_name(manifest_url: &str) -> String {
    format!("ts_{}", short_digest(manifest_url))
}

/// Output file name for a run.
///
/// Uses the sanitized `requested` name; falls back to `merged_<digest16>.ts`
/// when nothing usable is left.
pub fn output_filename(requested: &str, manifest_url: &str) -> String {
    let sanitized = sanitize_output_name(requested);
    if sanitized.is_empty() {
        format!("merged_{}.ts", short_digest(manifest_url))
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_names_are_index_plus_ext() {
        assert_eq!(segment_filename(0), "0.ts");
        assert_eq!(segment_filename(1025), "1025.ts");
    }

    #[test]
    fn work_dir_is_stable_per_url() {
        let a = work_dir_name("https://example.com/a.m3u8");
        let b = work_dir_name("https://example.com/a.m3u8");
        let c = work_dir_name("https://example.com/b.m3u8");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("ts_"));
        assert_eq!(a.len(), "ts_".len() + 16);
    }

    #[test]
    fn output_filename_fallback() {
        let url = "https://example.com/a.m3u8";
        assert_eq!(output_filename("main.mp4", url), "main.mp4");
        assert_eq!(
            output_filename("  ", url),
            format!("merged_{}.ts", short_digest(url))
        );
        assert_eq!(output_filename("..", url), format!("merged_{}.ts", short_digest(url)));
    }
}
