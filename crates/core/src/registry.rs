//! Directory-keyed registry with nearest-ancestor lookup
//!
//! Shared by the tsconfig map, the pnpm project map and the per-package
//! configuration tree: each registers values against workspace directories and
//! later asks for the value owning an arbitrary file or directory.

use crate::paths;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DirRegistry<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for DirRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> DirRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value for a directory. Returns the value back if the
    /// directory is already taken, leaving the existing entry untouched.
    pub fn insert(&mut self, dir: &str, value: T) -> Result<(), T> {
        let key = paths::normalize_dir(dir);
        if self.entries.contains_key(&key) {
            return Err(value);
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Exact lookup of a registered directory.
    pub fn get(&self, dir: &str) -> Option<&T> {
        self.entries.get(&paths::normalize_dir(dir))
    }

    pub fn get_mut(&mut self, dir: &str) -> Option<&mut T> {
        self.entries.get_mut(&paths::normalize_dir(dir))
    }

    pub fn contains(&self, dir: &str) -> bool {
        self.get(dir).is_some()
    }

    /// The nearest registered directory at or above `dir`, with its value.
    pub fn find(&self, dir: &str) -> Option<(&str, &T)> {
        paths::ancestors(dir)
            .find_map(|candidate| self.entries.get_key_value(&candidate))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// The nearest registered directory strictly above `dir`.
    pub fn find_parent(&self, dir: &str) -> Option<(&str, &T)> {
        let dir = paths::normalize_dir(dir);
        if dir.is_empty() {
            return None;
        }
        self.find(&paths::dir(&dir))
    }

    /// Registered directories in sorted order.
    pub fn dirs(&self) -> Vec<&str> {
        let mut dirs: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        dirs.sort_unstable();
        dirs
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}
