//! file-slot: JSON file implementation of the `SlotStorage` port.
//!
//! Purpose
//! - Give the partnership store a durable slot on local disk, the way the
//!   browser tool kept its list under a single local-storage key.
//! - One file holds the whole serialized sequence; every write replaces it.
//!
//! Notes
//! - Writes go to a sibling temp file first and are then renamed over the
//!   target, so a crash mid-write leaves the previous contents intact.
//! - A missing file reads as an empty slot, not an error.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use domain::{CoreError, SlotStorage};
use tracing::trace;

/// Default slot location relative to the working directory.
pub const DEFAULT_PATH: &str = "./data/partnerships.json";

/// Slot backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Use the file at `path`. Nothing is touched on disk until the first
    /// write.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Like [`FileSlot::new`], but also creates missing parent directories.
    pub fn create<P: Into<PathBuf>>(path: P) -> Result<Self, CoreError> {
        let slot = Self::new(path);
        if let Some(dir) = slot.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| map_ioerr(dir, e))?;
        }
        Ok(slot)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SlotStorage for FileSlot {
    fn read(&self) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                trace!(path = %self.path.display(), bytes = contents.len(), "slot read");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_ioerr(&self.path, e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), CoreError> {
        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(|e| map_ioerr(&tmp, e))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| map_ioerr(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|e| map_ioerr(&self.path, e))?;
        trace!(path = %self.path.display(), bytes = contents.len(), "slot written");
        Ok(())
    }
}

fn map_ioerr(path: &Path, e: io::Error) -> CoreError {
    CoreError::Storage(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::adapters::memory_slot::InMemorySlot;
    use domain::id::ObjectIdGenerator;
    use domain::store::RecordStore;
    use domain::{Clock, NewPartnership};
    use std::time::SystemTime;

    struct TestClock;
    impl Clock for TestClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH
        }
    }

    fn tmp_slot() -> (FileSlot, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::create(dir.path().join("nested/dir/partnerships.json")).unwrap();
        (slot, dir)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (slot, _dir) = tmp_slot();
        assert_eq!(slot.read().unwrap(), None);
    }

    #[test]
    fn write_then_read_overwrites() {
        let (slot, _dir) = tmp_slot();
        slot.write("[1]").unwrap();
        slot.write("[]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[]"));
        assert!(!slot.temp_path().exists());
    }

    #[test]
    fn io_failures_are_storage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let as_dir = FileSlot::new(dir.path());
        assert!(matches!(as_dir.read(), Err(CoreError::Storage(_))));

        let no_parent = FileSlot::new(dir.path().join("missing/partnerships.json"));
        assert!(matches!(no_parent.write("[]"), Err(CoreError::Storage(_))));
    }

    #[test]
    fn store_state_survives_reopen() {
        let (slot, _dir) = tmp_slot();
        let mut store = RecordStore::open(slot.clone(), TestClock, ObjectIdGenerator::new(3));
        let rec = store
            .create(NewPartnership {
                name: Some("Acme".into()),
                portal_url: Some("https://acme.example".into()),
                ..NewPartnership::default()
            })
            .unwrap();
        let expected = store.list();

        let reopened = RecordStore::open(slot.clone(), TestClock, ObjectIdGenerator::new(3));
        assert_eq!(reopened.list(), expected);
        assert_eq!(reopened.list()[0].id, rec.id);
        assert_eq!(reopened.len(), 3);

        let raw = slot.read().unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v[0]["name"], "Acme");
    }

    #[test]
    fn corrupt_file_falls_back_to_seeds() {
        let (slot, _dir) = tmp_slot();
        slot.write("{{{").unwrap();
        let store = RecordStore::open(slot, TestClock, ObjectIdGenerator::new(3));
        let mem = RecordStore::open(InMemorySlot::new(), TestClock, ObjectIdGenerator::new(3));
        assert_eq!(store.list(), mem.list());
    }
}
