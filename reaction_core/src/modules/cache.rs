use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

pub const DEFAULT_STORE_NAME: &str = "likes";

/// Key set of item ids this client has liked.
///
/// Membership is a client-side hint. It can drift from the server when a
/// request fails after the server already applied it.
pub trait LikeStore: Send + Sync {
    fn name(&self) -> &str;
    fn has(&self, key: &str) -> bool;
    fn set(&self, key: &str, value: &str);
    fn unset(&self, key: &str);
    fn clear(&self);
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct MemoryLikeStore {
    name: String,
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryLikeStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLikeStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_NAME)
    }
}

impl LikeStore for MemoryLikeStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn has(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.entries).insert(key.to_string(), value.to_string());
    }

    fn unset(&self, key: &str) {
        lock(&self.entries).remove(key);
    }

    fn clear(&self) {
        lock(&self.entries).clear();
    }
}

/// File-backed store: `<dir>/<name>.json` holding a flat JSON object.
///
/// The in-memory map is authoritative for the process lifetime; every
/// mutation rewrites the file and a failed write is only logged.
#[derive(Debug)]
pub struct JsonFileLikeStore {
    name: String,
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileLikeStore {
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", normalize_name(name)));

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            name: name.to_string(),
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) {
        if let Err(e) = write_entries(&self.path, entries) {
            tracing::warn!(store = %self.name, path = %self.path.display(), "like store flush failed: {e}");
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) {
        let mut entries = lock(&self.entries);
        if f(&mut entries) {
            self.persist(&entries);
        }
    }
}

impl LikeStore for JsonFileLikeStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn has(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.mutate(|e| e.insert(key.to_string(), value.to_string()).as_deref() != Some(value));
    }

    fn unset(&self, key: &str) {
        self.mutate(|e| e.remove(key).is_some());
    }

    fn clear(&self) {
        self.mutate(|e| {
            let had = !e.is_empty();
            e.clear();
            had
        });
    }
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let payload = serde_json::to_string(entries)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, payload)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if cleaned.is_empty() {
        DEFAULT_STORE_NAME.to_string()
    } else {
        cleaned.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("reaction-store-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn memory_store_set_unset_clear() {
        let store = MemoryLikeStore::default();
        assert_eq!(store.name(), "likes");
        store.set("a", "a");
        store.set("b", "b");
        assert!(store.has("a"));
        store.unset("a");
        assert!(!store.has("a"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_keeps_working_after_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryLikeStore::default());
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(store.entries.is_poisoned());

        store.set("a", "a");
        assert!(store.has("a"));
        store.unset("a");
        assert!(!store.has("a"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = scratch_dir("reopen");
        {
            let store = JsonFileLikeStore::open(&dir, "likes").unwrap();
            store.set("c-1", "c-1");
            store.set("c-2", "c-2");
            store.unset("c-2");
        }
        let reopened = JsonFileLikeStore::open(&dir, "likes").unwrap();
        assert!(reopened.has("c-1"));
        assert!(!reopened.has("c-2"));

        reopened.clear();
        let again = JsonFileLikeStore::open(&dir, "likes").unwrap();
        assert!(!again.has("c-1"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_namespaces_by_name() {
        let dir = scratch_dir("ns");
        let likes = JsonFileLikeStore::open(&dir, "likes").unwrap();
        let owns = JsonFileLikeStore::open(&dir, "Owns").unwrap();
        likes.set("x", "x");
        assert!(!owns.has("x"));
        assert!(owns.path().ends_with("owns.json"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
