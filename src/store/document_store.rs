//! Integrity-checked, schema-gated document store
//!
//! One flat directory holds one slot per document name. Every slot is a
//! complete stored record; writers replace it atomically with a rename, so a
//! reader sees either the previous record or the new one.

use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::locks::SlotLocks;
use crate::naming::{DocumentKind, DocumentName, FilenameGuard};
use crate::observability::Logger;
use crate::schema::SchemaGate;
use crate::storage::IntegrityCodec;

const TEMP_SUFFIX: &str = ".tmp";

/// What a read checks beyond the integrity prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Decode and validate against the current schema on every read.
    #[default]
    Revalidate,
    /// Checksum and decode only. Records written under an older schema stay
    /// readable.
    TrustStored,
}

/// A verified document as read from its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub name: DocumentName,
    /// Content with the checksum prefix stripped.
    pub payload: Vec<u8>,
}

impl StoredDocument {
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Flat-directory document store.
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
    kind: DocumentKind,
    gate: SchemaGate,
    policy: ReadPolicy,
    locks: SlotLocks,
}

impl DocumentStore {
    /// Opens the profile store rooted at `dir`, creating the directory if
    /// needed.
    pub fn open(dir: impl Into<PathBuf>, gate: SchemaGate, policy: ReadPolicy) -> StoreResult<Self> {
        Self::open_kind(dir, DocumentKind::Profile, gate, policy)
    }

    pub fn open_kind(
        dir: impl Into<PathBuf>,
        kind: DocumentKind,
        gate: SchemaGate,
        policy: ReadPolicy,
    ) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(dir.display().to_string(), e))?;

        Ok(Self {
            dir,
            kind,
            gate,
            policy,
            locks: SlotLocks::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Lists slot names currently in the directory.
    ///
    /// The sequence is lazy and reflects the directory at iteration time;
    /// order is whatever the filesystem returns.
    pub fn list(&self) -> StoreResult<DocumentNames> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| StoreError::io(self.dir.display().to_string(), e))?;
        Ok(DocumentNames {
            entries,
            kind: self.kind,
        })
    }

    /// Reads, verifies, decodes and (per the store's policy) validates one
    /// document.
    pub fn read(&self, raw_name: &str) -> StoreResult<StoredDocument> {
        self.read_with(raw_name, self.policy)
    }

    /// Like [`read`](Self::read) with an explicit policy.
    pub fn read_with(&self, raw_name: &str, policy: ReadPolicy) -> StoreResult<StoredDocument> {
        let name = FilenameGuard::validate(raw_name, self.kind)?;

        let stored = fs::read(self.slot_path(&name))
            .map_err(|e| StoreError::from_slot_io(name.as_str(), e))?;

        let content = IntegrityCodec::unwrap(&stored).map_err(|e| {
            let reason = e.to_string();
            Logger::warn(
                "INTEGRITY_CHECK_FAILED",
                &[("name", name.as_str()), ("reason", reason.as_str())],
            );
            e
        })?;

        let document = self.gate.decode(content)?;
        if policy == ReadPolicy::Revalidate {
            self.gate
                .validate(&document)
                .into_result(&self.gate.label())?;
        }

        Ok(StoredDocument {
            payload: content.to_vec(),
            name,
        })
    }

    /// Validates `raw` and atomically replaces the slot with it.
    ///
    /// Nothing on disk changes unless the name and the document are both
    /// accepted.
    pub fn write(&self, raw_name: &str, raw: &[u8]) -> StoreResult<DocumentName> {
        let name = FilenameGuard::validate(raw_name, self.kind)?;
        self.gate.admit(raw)?;

        let record = IntegrityCodec::wrap(raw);

        let _slot = self.locks.acquire(name.as_str());
        self.replace_slot(&name, &record)?;

        let bytes = raw.len().to_string();
        Logger::info("DOCUMENT_WRITTEN", &[("name", name.as_str()), ("bytes", bytes.as_str())]);
        Ok(name)
    }

    /// Removes one slot.
    pub fn delete(&self, raw_name: &str) -> StoreResult<()> {
        let name = FilenameGuard::validate(raw_name, self.kind)?;

        let _slot = self.locks.acquire(name.as_str());
        fs::remove_file(self.slot_path(&name))
            .map_err(|e| StoreError::from_slot_io(name.as_str(), e))?;
        sync_dir_after_commit(&self.dir);

        Logger::info("DOCUMENT_DELETED", &[("name", name.as_str())]);
        Ok(())
    }

    fn slot_path(&self, name: &DocumentName) -> PathBuf {
        self.dir.join(name)
    }

    fn replace_slot(&self, name: &DocumentName, record: &[u8]) -> StoreResult<()> {
        // Leading dot keeps temp files outside every slot grammar. The slot
        // name is not part of it, so any name the guard accepts fits.
        let temp_path = self
            .dir
            .join(format!(".{}{}", Uuid::new_v4(), TEMP_SUFFIX));

        let result = write_synced(&temp_path, record).and_then(|_| {
            fs::rename(&temp_path, self.slot_path(name))
                .map_err(|e| StoreError::io(temp_path.display().to_string(), e))
        });

        if result.is_err() && temp_path.exists() {
            if let Err(e) = fs::remove_file(&temp_path) {
                let path = temp_path.display().to_string();
                let error = e.to_string();
                Logger::warn(
                    "TEMP_FILE_CLEANUP_FAILED",
                    &[("path", path.as_str()), ("error", error.as_str())],
                );
            }
        }
        result?;

        sync_dir_after_commit(&self.dir);
        Ok(())
    }

    /// Removes temp files left by interrupted writes and returns how many.
    ///
    /// Only safe while no writer is active on this directory, i.e. at
    /// startup before serving.
    pub fn sweep_temp_files(&self) -> StoreResult<usize> {
        let mut removed = 0;
        let entries =
            fs::read_dir(&self.dir).map_err(|e| StoreError::io(self.dir.display().to_string(), e))?;

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') && file_name.ends_with(TEMP_SUFFIX) {
                let path = entry.path();
                let shown = path.display().to_string();
                fs::remove_file(&path).map_err(|e| StoreError::io(shown.clone(), e))?;
                Logger::warn("STALE_TEMP_FILE_REMOVED", &[("path", shown.as_str())]);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Lazy sequence of slot names in a store directory.
///
/// Entries that are not regular files or do not satisfy the grammar are
/// skipped.
pub struct DocumentNames {
    entries: ReadDir,
    kind: DocumentKind,
}

impl Iterator for DocumentNames {
    type Item = StoreResult<DocumentName>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(StoreError::io("directory entry", e))),
            };

            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => {}
                Ok(_) => continue,
                Err(e) => return Some(Err(StoreError::io(entry.path().display().to_string(), e))),
            }

            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Ok(name) = FilenameGuard::validate(&file_name, self.kind) {
                return Some(Ok(name));
            }
        }
        None
    }
}

/// Writes `data` to a fresh file and fsyncs it.
fn write_synced(path: &Path, data: &[u8]) -> StoreResult<()> {
    let io_err = |e| StoreError::io(path.display().to_string(), e);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(data).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

/// fsyncs a directory so a rename or unlink inside it is durable.
fn sync_dir(dir: &Path) -> StoreResult<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| StoreError::io(dir.display().to_string(), e))
}

/// Directory fsync after a rename or unlink has already taken effect.
///
/// The slot has changed by now, so a failure is logged and not reported to
/// the caller. Returns whether the sync succeeded.
fn sync_dir_after_commit(dir: &Path) -> bool {
    match sync_dir(dir) {
        Ok(()) => true,
        Err(e) => {
            let error = e.to_string();
            Logger::warn("DIR_SYNC_FAILED", &[("error", error.as_str())]);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocumentValidator, ValidationOutcome, Violation};
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Requires an object with an integer "v" in 0..=10.
    struct SmallV;

    impl DocumentValidator for SmallV {
        fn validate(&self, document: &Value) -> ValidationOutcome {
            match document.get("v").and_then(Value::as_i64) {
                Some(v) if (0..=10).contains(&v) => ValidationOutcome::Valid,
                _ => ValidationOutcome::Invalid(vec![Violation::out_of_range("v", "0..=10", "other")]),
            }
        }

        fn label(&self) -> String {
            "small-v".into()
        }
    }

    fn open(dir: &Path, policy: ReadPolicy) -> DocumentStore {
        DocumentStore::open(dir, SchemaGate::new(Arc::new(SmallV)), policy).unwrap()
    }

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("profiles");
        let store = open(&dir, ReadPolicy::Revalidate);
        assert!(store.dir().is_dir());
        assert_eq!(store.list().unwrap().count(), 0);
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);

        store.write("a.a7p", br#"{"v": 3}"#).unwrap();
        let doc = store.read("a.a7p").unwrap();
        assert_eq!(doc.payload, br#"{"v": 3}"#);
        assert_eq!(doc.name.as_str(), "a.a7p");

        let on_disk = fs::read(temp.path().join("a.a7p")).unwrap();
        assert_eq!(on_disk.len(), 32 + doc.payload.len());
    }

    #[test]
    fn test_rejected_write_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);

        store.write("a.a7p", br#"{"v": 1}"#).unwrap();
        let before = fs::read(temp.path().join("a.a7p")).unwrap();

        assert!(matches!(
            store.write("a.a7p", br#"{"v": 99}"#),
            Err(StoreError::SchemaValidationFailed(_))
        ));
        assert!(matches!(store.write("a.a7p", b"not json"), Err(StoreError::Decode(_))));
        assert!(matches!(
            store.write("../a.a7p", br#"{"v": 1}"#),
            Err(StoreError::InvalidFilename(_))
        ));

        assert_eq!(fs::read(temp.path().join("a.a7p")).unwrap(), before);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_delete_twice() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);

        store.write("a.a7p", br#"{"v": 1}"#).unwrap();
        store.delete("a.a7p").unwrap();
        assert!(matches!(store.delete("a.a7p"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.read("a.a7p"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_list_filters_by_grammar() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);

        store.write("a.a7p", br#"{"v": 1}"#).unwrap();
        store.write("b.a7p", br#"{"v": 2}"#).unwrap();
        fs::write(temp.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(temp.path().join("dir.a7p")).unwrap();

        let mut names: Vec<String> = store
            .list()
            .unwrap()
            .map(|n| n.unwrap().into_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.a7p", "b.a7p"]);
    }

    #[test]
    fn test_read_policy() {
        let temp = TempDir::new().unwrap();
        // A record written before the schema tightened.
        fs::write(temp.path().join("old.a7p"), IntegrityCodec::wrap(br#"{"v": 50}"#)).unwrap();

        let strict = open(temp.path(), ReadPolicy::Revalidate);
        assert!(matches!(
            strict.read("old.a7p"),
            Err(StoreError::SchemaValidationFailed(_))
        ));

        let trusting = open(temp.path(), ReadPolicy::TrustStored);
        assert_eq!(trusting.read("old.a7p").unwrap().payload, br#"{"v": 50}"#);
        assert!(trusting.read_with("old.a7p", ReadPolicy::Revalidate).is_err());
    }

    #[test]
    fn test_trusting_read_still_decodes() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("junk.a7p"),
            IntegrityCodec::wrap(b"\xff\xfe not a document"),
        )
        .unwrap();

        let trusting = open(temp.path(), ReadPolicy::TrustStored);
        assert!(matches!(trusting.read("junk.a7p"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_long_name_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);
        let name = format!("{}.a7p", "a".repeat(246));
        assert_eq!(name.len(), 250);

        store.write(&name, br#"{"v": 2}"#).unwrap();
        assert_eq!(store.read(&name).unwrap().payload, br#"{"v": 2}"#);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_dir_sync_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        assert!(sync_dir_after_commit(temp.path()));
        assert!(!sync_dir_after_commit(&temp.path().join("gone")));
    }

    #[test]
    fn test_corruption_detected() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);
        store.write("a.a7p", br#"{"v": 1}"#).unwrap();

        let path = temp.path().join("a.a7p");
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 2;
        bytes[last] ^= 0x01;
        fs::write(&path, &bytes).unwrap();

        let err = store.read("a.a7p").unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_sweep_removes_stale_temp_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".a.a7p.1234.tmp"), b"partial").unwrap();
        fs::write(temp.path().join(".hidden"), b"keep").unwrap();
        let store = open(temp.path(), ReadPolicy::Revalidate);
        assert!(temp.path().join(".a.a7p.1234.tmp").exists());

        assert_eq!(store.sweep_temp_files().unwrap(), 1);
        assert!(!temp.path().join(".a.a7p.1234.tmp").exists());
        assert!(temp.path().join(".hidden").exists());
        assert_eq!(store.list().unwrap().count(), 0);
    }
}
