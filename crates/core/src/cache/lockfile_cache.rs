use crate::error::{Error, Result};
use crate::pnpm::{self, WorkspacePackageVersionMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Parsed pnpm lockfiles, validated by the hash of the lockfile content.
#[derive(Debug, Default)]
pub struct LockfileCache {
    entries: HashMap<PathBuf, CacheEntry>,
    cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    path: PathBuf,
    file_hash: String,
    lockfile: WorkspacePackageVersionMap,
}

impl LockfileCache {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self {
            entries: HashMap::new(),
            cache_dir,
        }
    }

    /// The cached parse of a lockfile, if its content is unchanged.
    pub fn get(&self, file_path: &Path, contents: &str) -> Option<&WorkspacePackageVersionMap> {
        let entry = self.entries.get(file_path)?;

        if entry.file_hash != compute_hash(contents) {
            return None;
        }

        Some(&entry.lockfile)
    }

    pub fn insert(&mut self, file_path: PathBuf, contents: &str, lockfile: WorkspacePackageVersionMap) -> Result<()> {
        let entry = CacheEntry {
            path: file_path.clone(),
            file_hash: compute_hash(contents),
            lockfile,
        };

        // Persist to disk if cache_dir is set
        if self.cache_dir.is_some() {
            self.save_entry_to_disk(&entry)?;
        }

        self.entries.insert(file_path, entry);
        Ok(())
    }

    /// Parse a lockfile, reusing the cached result when the content is unchanged.
    /// `display_path` names the lockfile in errors.
    pub fn load_or_parse(&mut self, file_path: &Path, display_path: &str) -> Result<WorkspacePackageVersionMap> {
        let contents = std::fs::read_to_string(file_path)?;

        if let Some(cached) = self.get(file_path, &contents) {
            trace!("Lockfile cache hit for {}", display_path);
            return Ok(cached.clone());
        }

        let lockfile = pnpm::parse_lockfile(display_path, &contents)?;
        self.insert(file_path.to_path_buf(), &contents, lockfile.clone())?;
        Ok(lockfile)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load_from_disk(&mut self) -> Result<()> {
        let Some(ref cache_dir) = self.cache_dir else {
            return Ok(());
        };

        if !cache_dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            // Unreadable entries are stale leftovers and simply reparsed later
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<CacheEntry>(&contents) {
                Ok(cache_entry) => {
                    self.entries.insert(cache_entry.path.clone(), cache_entry);
                }
                Err(e) => debug!("Ignoring cache entry {}: {}", path.display(), e),
            }
        }

        debug!("Loaded {} cached lockfiles", self.entries.len());
        Ok(())
    }

    fn save_entry_to_disk(&self, entry: &CacheEntry) -> Result<()> {
        if let Some(ref cache_dir) = self.cache_dir {
            std::fs::create_dir_all(cache_dir)?;

            let cache_path = cache_dir.join(format!("{}.json", encode_cache_filename(&entry.path)));

            let contents = serde_json::to_string_pretty(entry)
                .map_err(|e| Error::ConfigError(format!("Failed to serialize cache entry: {e}")))?;

            std::fs::write(cache_path, contents)?;
        }

        Ok(())
    }
}

fn compute_hash(contents: &str) -> String {
    format!("{:x}", md5::compute(contents.as_bytes()))
}

fn encode_cache_filename(file_path: &Path) -> String {
    file_path
        .to_string_lossy()
        .replace(['/', '\\'], "__")
        .replace(':', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOCKFILE: &str = "lockfileVersion: '6.0'\ndependencies:\n  lodash:\n    specifier: ^4.0.0\n    version: 4.17.21\n";

    #[test]
    fn test_cache_basic_operations() -> Result<()> {
        let dir = TempDir::new()?;
        let lockfile_path = dir.path().join("pnpm-lock.yaml");
        std::fs::write(&lockfile_path, LOCKFILE)?;

        let mut cache = LockfileCache::new(None);
        let parsed = cache.load_or_parse(&lockfile_path, "pnpm-lock.yaml")?;
        assert_eq!(parsed["."]["lodash"], "4.17.21");
        assert!(cache.get(&lockfile_path, LOCKFILE).is_some());

        // Changed content invalidates the entry
        assert!(cache.get(&lockfile_path, "lockfileVersion: '6.0'\n").is_none());
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_cache_with_disk_persistence() -> Result<()> {
        let dir = TempDir::new()?;
        let cache_dir = dir.path().join("cache");
        let lockfile_path = dir.path().join("pnpm-lock.yaml");
        std::fs::write(&lockfile_path, LOCKFILE)?;

        let mut cache = LockfileCache::new(Some(cache_dir.clone()));
        cache.load_or_parse(&lockfile_path, "pnpm-lock.yaml")?;

        let mut cache2 = LockfileCache::new(Some(cache_dir));
        cache2.load_from_disk()?;
        assert_eq!(cache2.len(), 1);

        let cached = cache2.get(&lockfile_path, LOCKFILE).unwrap();
        assert_eq!(cached["."]["lodash"], "4.17.21");
        Ok(())
    }

    #[test]
    fn test_parse_errors_not_cached() {
        let dir = TempDir::new().unwrap();
        let lockfile_path = dir.path().join("pnpm-lock.yaml");
        std::fs::write(&lockfile_path, "lockfileVersion: '3.0'\n").unwrap();

        let mut cache = LockfileCache::new(None);
        assert!(matches!(
            cache.load_or_parse(&lockfile_path, "pnpm-lock.yaml"),
            Err(Error::UnsupportedLockfileVersion { .. })
        ));
        assert!(cache.is_empty());
    }
}
