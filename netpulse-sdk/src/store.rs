//! Shared key-value stores for publishing snapshots across processes.
//!
//! A store is a namespace identified by a group id. Entries are JSON values
//! and every write replaces an entry as a whole: a reader sees either the
//! previous value or the new one, never a mixture.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// A process-external key-value namespace.
///
/// Passed around as an injected dependency so the publisher and reader can be
/// exercised against an in-memory store.
pub trait SharedStore: Send + Sync + Debug {
    /// Replace the entry at `key` with `value`.
    fn write_entry(&self, key: &str, value: &Value) -> Result<()>;

    /// Read the entry at `key`, or `None` if it has never been written.
    fn read_entry(&self, key: &str) -> Result<Option<Value>>;

    /// The namespace this store addresses.
    fn namespace(&self) -> &str;
}

/// A store that keeps each entry as a JSON file under `root/<group_id>/`.
///
/// Writes go to a temporary file in the same directory that is then renamed
/// over the entry, so concurrent readers in other processes never observe a
/// partially written file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    namespace: String,
}

impl FileStore {
    /// Create a store for `group_id` under `root`.
    ///
    /// Nothing touches the filesystem until the first write.
    pub fn new(root: impl AsRef<Path>, group_id: impl Into<String>) -> Self {
        let namespace = group_id.into();
        Self {
            dir: root.as_ref().join(&namespace),
            namespace,
        }
    }

    /// Directory holding this namespace's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SharedStore for FileStore {
    fn write_entry(&self, key: &str, value: &Value) -> Result<()> {
        let write_err = |e: std::io::Error| Error::StoreWrite(format!("{}: {}", self.dir.display(), e));

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let json =
            serde_json::to_vec_pretty(value).map_err(|e| Error::StoreWrite(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.persist(self.entry_path(key))
            .map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn read_entry(&self, key: &str) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::StoreRead(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// An in-process store.
///
/// Useful for tests and for consumers living in the same process as the
/// sampler.
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespace: String,
    entries: RwLock<BTreeMap<String, Value>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl SharedStore for MemoryStore {
    fn write_entry(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_entry(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
