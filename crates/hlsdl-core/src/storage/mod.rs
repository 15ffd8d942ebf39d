//! Segment persistence and file lifecycle.
//!
//! Each segment is written to `<index>.ts.part`, synced, closed, then atomically
//! renamed to `<index>.ts`, so the canonical name never refers to a partial file.

mod store;
mod writer;

pub use store::SegmentStore;
pub use writer::SegmentWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `3.ts` → `3.ts.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("7.ts"));
        assert_eq!(p.to_string_lossy(), "7.ts.part");
        let p2 = temp_path(Path::new("/tmp/ts_abc/12.ts"));
        assert_eq!(p2.to_string_lossy(), "/tmp/ts_abc/12.ts.part");
    }

    #[test]
    fn persist_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts_x")).unwrap();
        assert!(!store.contains(3));

        let path = store.persist(3, b"\x47payload").unwrap();
        assert_eq!(path, store.segment_path(3));
        assert!(store.contains(3));
        assert!(!temp_path(&path).exists());
        assert_eq!(store.read(3).unwrap(), b"\x47payload");
    }

    #[test]
    fn persist_overwrites_previous_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(dir.path()).unwrap();
        store.persist(0, b"first-attempt-longer").unwrap();
        store.persist(0, b"second").unwrap();
        assert_eq!(store.read(0).unwrap(), b"second");
    }

    #[test]
    fn failed_persist_leaves_no_canonical_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("gone")).unwrap();
        store.remove_all().unwrap();
        assert!(store.persist(1, b"data").is_err());
        assert!(!store.contains(1));
        assert!(!temp_path(&store.segment_path(1)).exists());
    }

    #[test]
    fn remove_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&dir.path().join("ts_y")).unwrap();
        store.persist(0, b"x").unwrap();
        store.remove_all().unwrap();
        assert!(!store.dir().exists());
        store.remove_all().unwrap();
    }
}
