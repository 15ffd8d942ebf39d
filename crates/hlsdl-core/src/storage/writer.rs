//! Temp-file writer that becomes visible under its final name only on finalize.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes a segment body to a `.part` file; `finalize` closes it and renames.
pub struct SegmentWriter {
    file: BufWriter<File>,
    temp_path: PathBuf,
}

impl SegmentWriter {
    /// Create (or truncate) the temp file at `temp_path`.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(Self {
            file: BufWriter::new(file),
            temp_path: temp_path.to_path_buf(),
        })
    }

    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)
    }

    /// Flush, sync, close the handle, then atomically rename to `final_path`.
    /// Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        let file = self.file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        // Handle must be released before the rename on some platforms.
        drop(file);
        std::fs::rename(&self.temp_path, final_path)
    }
}
