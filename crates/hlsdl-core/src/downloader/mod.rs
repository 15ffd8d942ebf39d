//! Segment acquisition engine.
//!
//! Seeds a work queue with every segment index, runs a bounded pool of worker
//! threads that fetch, decrypt, trim and persist each segment (requeueing
//! failures), then merges the persisted files in index order.

mod normalize;
mod pool;
mod unit;

pub use normalize::{trim_to_sync_byte, TS_SYNC_BYTE};
pub use pool::{run_pool, PoolSummary, ProgressEvent};
pub use unit::{SegmentOutcome, SegmentProcessor, SegmentUnit};

use crate::fetch::Fetcher;
use crate::merge::{self, ExternalMuxer, FfmpegMuxer, MergeReport};
use crate::queue::WorkQueue;
use crate::retry::RetryPolicy;
use crate::source::SegmentSource;
use crate::storage::SegmentStore;
use crate::url_model;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

/// Default worker count.
pub const DEFAULT_THREADS: usize = 8;

/// Per-run settings for [`Downloader`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Directory receiving the final artifact and the per-run segment directory.
    pub output_dir: PathBuf,
    /// Final artifact name (sanitized; empty falls back to `merged_<digest>.ts`).
    pub filename: String,
    pub threads: usize,
    /// Try ffmpeg before direct concatenation.
    pub use_external_muxer: bool,
    pub retry: RetryPolicy,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filename: "main.mp4".to_string(),
            threads: DEFAULT_THREADS,
            use_external_muxer: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub pool: PoolSummary,
    pub merge: MergeReport,
}

impl DownloadReport {
    /// True when every segment was downloaded and merged.
    pub fn is_complete(&self) -> bool {
        self.pool.abandoned == 0 && self.merge.is_complete()
    }
}

/// Drives one download: pool, then merge.
pub struct Downloader {
    source: Arc<SegmentSource>,
    fetcher: Arc<dyn Fetcher>,
    store: SegmentStore,
    output_path: PathBuf,
    threads: usize,
    retry: RetryPolicy,
    muxer: Option<Box<dyn ExternalMuxer>>,
}

impl Downloader {
    /// Prepare a run: creates the output directory and the per-run segment
    /// directory `<output_dir>/ts_<digest(manifest_url)>`.
    pub fn new(
        manifest_url: &str,
        source: SegmentSource,
        fetcher: Arc<dyn Fetcher>,
        options: DownloadOptions,
    ) -> Result<Self> {
        let output_dir = options.output_dir.as_path();
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("create output directory '{}'", output_dir.display()))?;
        let store = SegmentStore::create(&output_dir.join(url_model::work_dir_name(manifest_url)))?;
        let output_path =
            output_dir.join(url_model::output_filename(&options.filename, manifest_url));
        let muxer: Option<Box<dyn ExternalMuxer>> = if options.use_external_muxer {
            Some(Box::new(FfmpegMuxer::default()))
        } else {
            None
        };

        Ok(Self {
            source: Arc::new(source),
            fetcher,
            store,
            output_path,
            threads: options.threads.max(1),
            retry: options.retry,
            muxer,
        })
    }

    /// Replace the external muxer (or disable it with `None`).
    pub fn with_muxer(mut self, muxer: Option<Box<dyn ExternalMuxer>>) -> Self {
        self.muxer = muxer;
        self
    }

    pub fn segment_count(&self) -> usize {
        self.source.len()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn segment_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Download every segment, then merge. The merge always runs, even when
    /// segments were abandoned; check [`DownloadReport::is_complete`].
    ///
    /// Consumes the downloader: the merge removes the segment directory, so a
    /// second run would have nowhere to persist.
    ///
    /// ```compile_fail
    /// # fn twice(dl: hlsdl_core::downloader::Downloader) {
    /// let _ = dl.run(None);
    /// let _ = dl.run(None);
    /// # }
    /// ```
    pub fn run(self, progress_tx: Option<mpsc::Sender<ProgressEvent>>) -> Result<DownloadReport> {
        let total = self.source.len();
        tracing::info!(
            segments = total,
            threads = self.threads,
            dir = %self.store.dir().display(),
            "starting download"
        );

        let queue = Arc::new(WorkQueue::new(total));
        let unit = Arc::new(SegmentUnit::new(
            Arc::clone(&self.source),
            Arc::clone(&self.fetcher),
            self.store.clone(),
        ));
        let pool = run_pool(queue, unit, self.threads, self.retry, progress_tx);
        if pool.abandoned > 0 {
            tracing::warn!("{} segment(s) abandoned after retries", pool.abandoned);
        }

        let merge = merge::merge(&self.store, total, &self.output_path, self.muxer.as_deref())?;
        Ok(DownloadReport { pool, merge })
    }
}
