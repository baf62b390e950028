use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use log::debug;

use crate::error::Result;

struct Entry<T> {
    modified: SystemTime,
    value: Arc<T>,
}

/// An in-memory cache of values derived from files, keyed by path and modification time.
///
/// A cached value is reused only while the file's modification time is unchanged, so rewriting
/// the file recomputes on the next access.
pub struct FileCache<T> {
    entries: Mutex<HashMap<PathBuf, Entry<T>>>,
}

impl<T> Default for FileCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> FileCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `path`, computing it with `compute` when absent or stale
    pub fn get_or_compute<P, F>(&self, path: P, compute: F) -> Result<Arc<T>>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<T>,
    {
        let path = path.as_ref();
        let modified = std::fs::metadata(path)?.modified()?;

        if let Some(entry) = self.lock().get(path) {
            if entry.modified == modified {
                return Ok(entry.value.clone());
            }
        }

        debug!("Computing cached value for {}", path.display());

        let value = Arc::new(compute(path)?);

        self.lock().insert(
            path.to_path_buf(),
            Entry {
                modified,
                value: value.clone(),
            },
        );

        Ok(value)
    }

    /// Drop the cached value for `path`, returning whether one was present
    pub fn invalidate<P: AsRef<Path>>(&self, path: P) -> bool {
        self.lock().remove(path.as_ref()).is_some()
    }

    /// Drop every cached value
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The number of cached values
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry<T>>> {
        // Entries are replaced whole, so a panic elsewhere cannot leave one half-written
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
