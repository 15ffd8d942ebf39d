//! Merge stage: ordered assembly of persisted segments into the final artifact.
//!
//! Runs once after the worker pool has stopped, whether or not every segment
//! made it. Missing segments are a warning, never an error: partial output
//! beats no output. An external muxer is tried first when configured and
//! present; any failure falls back to direct concatenation.

mod concat;
mod external;
mod file_list;

pub use concat::{concatenate, concatenate_with_progress, ConcatStats};
pub use external::{find_on_path, ExternalMuxer, FfmpegMuxer};
pub use file_list::{scan, write_file_list, SegmentScan, FILE_LIST_NAME};

use crate::storage::SegmentStore;
use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Output produced by the external tool.
    External,
    /// Output produced by byte concatenation.
    Concat,
}

/// What the merge produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Segment count from the source.
    pub expected: usize,
    /// Segment files found at merge time.
    pub present: usize,
    pub missing: usize,
    /// Segments written into the output.
    pub merged: usize,
    /// Segments present but unreadable or not appended.
    pub failed: usize,
    pub method: MergeMethod,
    pub output: PathBuf,
}

impl MergeReport {
    pub fn is_complete(&self) -> bool {
        self.missing == 0 && self.failed == 0 && self.merged == self.expected
    }
}

/// Merge `[0, total)` from `store` into `output`, then remove the segment directory.
///
/// Errors only when the output file itself cannot be created or flushed; the
/// segment directory is kept in that case so nothing downloaded is lost.
pub fn merge(
    store: &SegmentStore,
    total: usize,
    output: &Path,
    muxer: Option<&dyn ExternalMuxer>,
) -> Result<MergeReport> {
    let found = scan(store, total);
    if found.missing > 0 {
        tracing::warn!("{} of {} segment files missing", found.missing, total);
    }

    let file_list = match write_file_list(store, &found.present) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!("could not write {}: {}", FILE_LIST_NAME, e);
            None
        }
    };

    if let (Some(m), Some(list)) = (muxer, file_list.as_deref()) {
        if !m.is_available() {
            tracing::debug!("`{}` not available, concatenating directly", m.name());
        } else {
            match m.mux(list, output) {
                Ok(()) => {
                    cleanup(store);
                    tracing::info!("merged {} segments with {}", found.present.len(), m.name());
                    return Ok(MergeReport {
                        expected: total,
                        present: found.present.len(),
                        missing: found.missing,
                        merged: found.present.len(),
                        failed: 0,
                        method: MergeMethod::External,
                        output: output.to_path_buf(),
                    });
                }
                Err(e) => {
                    tracing::warn!("{} merge failed, concatenating directly: {:#}", m.name(), e);
                }
            }
        }
    }

    let stats = concatenate(store, total, output)?;
    cleanup(store);

    if stats.merged != total {
        tracing::warn!("{} of {} segments not merged", total - stats.merged, total);
    }
    tracing::info!("output written to {}", output.display());

    Ok(MergeReport {
        expected: total,
        present: found.present.len(),
        missing: found.missing,
        merged: stats.merged,
        failed: stats.failed,
        method: MergeMethod::Concat,
        output: output.to_path_buf(),
    })
}

fn cleanup(store: &SegmentStore) {
    if let Err(e) = store.remove_all() {
        tracing::warn!(dir = %store.dir().display(), "could not remove segment directory: {}", e);
    }
}
