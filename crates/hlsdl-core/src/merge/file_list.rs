//! Scan for persisted segments and write the concat list for the external tool.

use crate::storage::SegmentStore;
use crate::url_model::segment_filename;
use std::fs;
use std::io;
use std::path::PathBuf;

/// File name of the concat list inside the segment directory.
pub const FILE_LIST_NAME: &str = "merge.txt";

/// Which indices in `[0, total)` have a persisted file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentScan {
    pub present: Vec<usize>,
    pub missing: usize,
}

pub fn scan(store: &SegmentStore, total: usize) -> SegmentScan {
    let mut out = SegmentScan::default();
    for index in 0..total {
        if store.contains(index) {
            out.present.push(index);
        } else {
            out.missing += 1;
        }
    }
    out
}

/// Write `file '<index>.ts'` lines for `present`, in order, next to the segments.
/// Names are relative, which the concat demuxer resolves against the list's directory.
pub fn write_file_list(store: &SegmentStore, present: &[usize]) -> io::Result<PathBuf> {
    let mut body = String::with_capacity(present.len() * 16);
    for &index in present {
        body.push_str(&format!("file '{}'\n", segment_filename(index)));
    }
    let path = store.dir().join(FILE_LIST_NAME);
    fs::write(&path, body)?;
    Ok(path)
}
