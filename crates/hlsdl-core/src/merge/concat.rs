//! Direct binary concatenation of segment files in index order.

use crate::storage::SegmentStore;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConcatStats {
    pub merged: usize,
    /// Segments skipped because they were absent.
    pub missing: usize,
    /// Segments that existed but could not be read or appended.
    pub failed: usize,
}

/// Append every `<index>.ts` for `[0, total)` to a fresh `output`.
///
/// Creating the output is the only fatal step; per-segment read/write errors
/// are counted and the loop moves on. Progress goes to the debug log.
pub fn concatenate(store: &SegmentStore, total: usize, output: &Path) -> Result<ConcatStats> {
    concatenate_with_progress(store, total, output, |done, total| {
        tracing::debug!(
            done,
            total,
            "merge {:.2}%",
            done as f64 * 100.0 / total as f64
        );
    })
}

/// [`concatenate`], calling `on_progress(done, total)` after each index is visited.
pub fn concatenate_with_progress<F>(
    store: &SegmentStore,
    total: usize,
    output: &Path,
    mut on_progress: F,
) -> Result<ConcatStats>
where
    F: FnMut(usize, usize),
{
    let file = File::create(output)
        .with_context(|| format!("create output file '{}'", output.display()))?;
    let mut writer = BufWriter::new(file);
    let mut stats = ConcatStats::default();

    for index in 0..total {
        match store.read(index) {
            Ok(bytes) => match writer.write_all(&bytes) {
                Ok(()) => stats.merged += 1,
                Err(e) => {
                    tracing::warn!(index, "append segment to output: {}", e);
                    stats.failed += 1;
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => stats.missing += 1,
            Err(e) => {
                tracing::warn!(index, "read segment for merge: {}", e);
                stats.failed += 1;
            }
        }
        on_progress(index + 1, total);
    }

    writer
        .flush()
        .with_context(|| format!("flush output file '{}'", output.display()))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts")).unwrap();
        // Persist out of order; output must still follow the index.
        store.persist(2, b"CC").unwrap();
        store.persist(0, b"AA").unwrap();
        store.persist(1, b"BB").unwrap();

        let out = dir.path().join("out.ts");
        let stats = concatenate(&store, 3, &out).unwrap();
        assert_eq!(stats, ConcatStats { merged: 3, missing: 0, failed: 0 });
        assert_eq!(std::fs::read(out).unwrap(), b"AABBCC");
    }

    #[test]
    fn holes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts")).unwrap();
        store.persist(0, b"first").unwrap();
        store.persist(2, b"third").unwrap();

        let out = dir.path().join("out.ts");
        let stats = concatenate(&store, 3, &out).unwrap();
        assert_eq!(stats.merged, 2);
        assert_eq!(stats.missing, 1);
        assert_eq!(std::fs::read(out).unwrap(), b"firstthird");
    }

    #[test]
    fn unreadable_segment_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts")).unwrap();
        store.persist(0, b"ok").unwrap();
        // A directory under the segment name cannot be read as a file.
        std::fs::create_dir(store.segment_path(1)).unwrap();

        let out = dir.path().join("out.ts");
        let stats = concatenate(&store, 2, &out).unwrap();
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn progress_reported_for_every_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts")).unwrap();
        store.persist(0, b"a").unwrap();
        store.persist(2, b"c").unwrap();

        let mut seen = Vec::new();
        let out = dir.path().join("out.ts");
        let stats =
            concatenate_with_progress(&store, 3, &out, |done, total| seen.push((done, total)))
                .unwrap();
        assert_eq!(stats.merged, 2);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn output_in_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts")).unwrap();
        let out = dir.path().join("no/such/dir/out.ts");
        assert!(concatenate(&store, 0, &out).is_err());
    }
}
