//! Persistence backends for the favorites store.
//!
//! A backend holds one serialized value, the JSON array of favorited movies.
//! The store decides what goes in it; backends only move the string.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::CoreError;

/// Durable slot for the serialized favorites set.
pub trait FavoritesBackend {
    /// Read the stored value. `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<String>, CoreError>;

    /// Replace the stored value with `serialized`.
    fn save(&mut self, serialized: &str) -> Result<(), CoreError>;
}

/// Single JSON file on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
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

impl FavoritesBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, CoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, serialized: &str) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = ?self.path, bytes = serialized.len(), "favorites written");
        Ok(())
    }
}

/// In-process slot. Clones share the same slot, so a test can keep a handle
/// while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that already holds `content`, as if written by an earlier session.
    pub fn with_contents(content: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.lock() = Some(content.into());
        backend
    }

    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail, like a full or disabled storage area.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FavoritesBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, CoreError> {
        Ok(self.contents())
    }

    fn save(&mut self, serialized: &str) -> Result<(), CoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Io(std::io::Error::new(
                ErrorKind::Other,
                "storage quota exceeded",
            )));
        }
        *self.lock() = Some(serialized.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
