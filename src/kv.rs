// src/kv.rs
//! Local key-value capability used for favorites and the tags snapshot.
//!
//! Passed around as `Arc<dyn KvStore>` so tests can swap in [`MemoryStore`].

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KvStore: Send + Sync {
    /// `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Durable store: one JSON object (`key -> string`) in a single file.
///
/// Writes go to a sibling temp file and are renamed into place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing kv file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("reading kv file {}", self.path.display())),
        }
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().expect("kv file mutex poisoned");
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().expect("kv file mutex poisoned");

        let mut map = match self.read_map() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    path = %self.path.display(),
                    "kv file unreadable, starting fresh"
                );
                BTreeMap::new()
            }
        };
        map.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating kv dir {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(&map)?;
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing kv file {}", self.path.display()))?;
        Ok(())
    }
}

/// Non-durable store, used for tests and when no store path is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a slot, e.g. with a corrupt value.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.inner
            .lock()
            .expect("memory kv mutex poisoned")
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .inner
            .lock()
            .expect("memory kv mutex poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .lock()
            .expect("memory kv mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
