//! A JSON document on disk guarded by its own lock.
//!
//! Every read and every read-modify-write of the document happens while the
//! document lock is held, so interleaved callers cannot lose each other's
//! updates. Writes replace the whole file atomically (temp file + rename).

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::StoreError;

/// Whole-document JSON file with a transactional update API.
pub struct JsonDocument<T> {
    name: &'static str,
    path: PathBuf,
    lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Debug for JsonDocument<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDocument")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq,
{
    /// Create a handle for the document at `path`. The file is created lazily
    /// on the first write.
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
            lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consistent snapshot of the document. A missing file reads as empty.
    pub fn read(&self) -> Result<T, StoreError> {
        let _guard = self.guard();
        self.load()
    }

    /// Atomic read-modify-write.
    ///
    /// `f` runs with the lock held against the current document. The file is
    /// rewritten only when `f` changed the document. If the current file
    /// cannot be read or parsed, `f` is not run and nothing is written.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let _guard = self.guard();
        let before = self.load()?;
        let mut doc = before.clone();
        let result = f(&mut doc);
        if doc != before {
            self.save(&doc)?;
        }
        Ok(result)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, a panic in another holder cannot leave it inconsistent.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self) -> Result<T, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&raw).map_err(|e| StoreError::Parse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn save(&self, doc: &T) -> Result<(), StoreError> {
        let write_err = |message: String| StoreError::Write {
            path: self.path.display().to_string(),
            message,
        };

        let json = serde_json::to_string_pretty(doc).map_err(|e| write_err(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| write_err(e.to_string()))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| write_err(e.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| write_err(e.to_string()))?;
        temp.persist(&self.path)
            .map_err(|e| write_err(e.error.to_string()))?;
        Ok(())
    }
}
