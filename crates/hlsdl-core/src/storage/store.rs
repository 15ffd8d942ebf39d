//! Per-run directory of persisted segment files, one path per index.

use super::writer::SegmentWriter;
use super::temp_path;
use crate::url_model::segment_filename;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding `<index>.ts` files for one run.
///
/// Paths are disjoint per index, so concurrent workers never contend on a file;
/// only the temp-then-rename order matters.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    dir: PathBuf,
}

impl SegmentStore {
    /// Create the directory (and parents) if missing.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create segment directory '{}'", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.dir.join(segment_filename(index))
    }

    /// True if the canonical file for `index` exists.
    pub fn contains(&self, index: usize) -> bool {
        self.segment_path(index).is_file()
    }

    /// Write `data` for `index` via `<index>.ts.part` and rename into place.
    /// On any failure the temp file is removed and nothing appears under the final name.
    pub fn persist(&self, index: usize, data: &[u8]) -> io::Result<PathBuf> {
        let final_path = self.segment_path(index);
        let tp = temp_path(&final_path);
        let result = SegmentWriter::create(&tp).and_then(|mut w| {
            w.write_all(data)?;
            w.finalize(&final_path)
        });
        if let Err(e) = result {
            let _ = fs::remove_file(&tp);
            return Err(e);
        }
        Ok(final_path)
    }

    pub fn read(&self, index: usize) -> io::Result<Vec<u8>> {
        fs::read(self.segment_path(index))
    }

    /// Remove the directory and everything in it.
    pub fn remove_all(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
