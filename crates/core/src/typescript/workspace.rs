use super::tsconfig::{self, ParsedConfigs, TsConfig};
use crate::paths;
use crate::registry::DirRegistry;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// All tsconfig files of a workspace.
///
/// Config locations are registered during the single-threaded configure walk.
/// The configs themselves are parsed lazily while resolving, possibly from
/// many threads, so the parse cache lives behind a lock.
#[derive(Debug)]
pub struct TsWorkspace {
    root: PathBuf,
    config_files: DirRegistry<String>,
    configs: RwLock<ParsedConfigs>,
}

impl TsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_files: DirRegistry::new(),
            configs: RwLock::new(ParsedConfigs::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register the tsconfig file of a directory. The first registration wins.
    pub fn add_config(&mut self, dir: &str, file_name: &str) {
        if let Err(rejected) = self.config_files.insert(dir, file_name.to_string()) {
            let existing = self.config_files.get(dir).map(String::as_str).unwrap_or_default();
            warn!(
                "Duplicate tsconfig file {}, already using {}",
                paths::join(&[dir, rejected.as_str()]),
                paths::join(&[dir, existing])
            );
            return;
        }
        debug!("Registered tsconfig {:?}", paths::join(&[dir, file_name]));
    }

    /// The parsed config registered for exactly `dir`, `None` if there is none
    /// or it failed to parse.
    pub fn get_config(&self, dir: &str) -> Option<Arc<TsConfig>> {
        let dir = paths::normalize_dir(dir);
        let file_name = self.config_files.get(&dir)?;
        let key = paths::join(&[dir.as_str(), file_name.as_str()]);

        if let Some(entry) = self.configs.read().get(&key) {
            return entry.clone();
        }

        let mut configs = self.configs.write();

        // Another thread may have parsed it while waiting for the lock
        if let Some(entry) = configs.get(&key) {
            return entry.clone();
        }

        match tsconfig::parse_tsconfig_file(&mut configs, &self.root, &dir, file_name) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse tsconfig file {}: {}", key, e);
                configs.insert(key, None);
                None
            }
        }
    }

    /// The nearest config at or above `dir`, with the directory it lives in.
    pub fn find_config(&self, dir: &str) -> Option<(String, Arc<TsConfig>)> {
        let (config_dir, _) = self.config_files.find(dir)?;
        let config_dir = config_dir.to_string();
        let config = self.get_config(&config_dir)?;
        Some((config_dir, config))
    }

    /// Expand an import found in `from_file` through the nearest config. An
    /// import without any config expands to itself.
    pub fn expand_paths(&self, from_file: &str, import_path: &str) -> Vec<String> {
        match self.find_config(&paths::dir(from_file)) {
            Some((_, config)) => config.expand_paths(import_path),
            None => vec![import_path.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(files: &[(&str, &str)]) -> (TempDir, TsWorkspace) {
        let dir = TempDir::new().unwrap();
        let mut ws = TsWorkspace::new(dir.path());
        for (rel, content) in files {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            ws.add_config(&paths::normalize_dir(&paths::dir(rel)), paths::base(rel));
        }
        (dir, ws)
    }

    #[test]
    fn test_find_nearest_config() {
        let (_dir, ws) = workspace(&[
            ("tsconfig.json", "{}"),
            ("apps/web/tsconfig.json", r#"{"compilerOptions": {"rootDir": "src"}}"#),
        ]);

        let (dir, config) = ws.find_config("apps/web/src/components").unwrap();
        assert_eq!(dir, "apps/web");
        assert_eq!(config.root_dir, "src");

        let (dir, _) = ws.find_config("libs/x").unwrap();
        assert_eq!(dir, "");
    }

    #[test]
    fn test_no_config() {
        let ws = TsWorkspace::new("/nonexistent");
        assert!(ws.find_config("a/b").is_none());
        assert_eq!(ws.expand_paths("a/b.ts", "x"), vec!["x"]);
    }

    #[test]
    fn test_invalid_config_is_none() {
        let (_dir, ws) = workspace(&[("bad/tsconfig.json", "{ nope")]);
        assert!(ws.get_config("bad").is_none());
        // Cached as invalid
        assert!(ws.find_config("bad/src").is_none());
    }

    #[test]
    fn test_duplicate_config_ignored() {
        let (_dir, mut ws) = workspace(&[("tsconfig.json", r#"{"compilerOptions": {"rootDir": "a"}}"#)]);
        ws.add_config("", "tsconfig.other.json");
        assert_eq!(ws.get_config("").unwrap().config_name, "tsconfig.json");
    }

    #[test]
    fn test_expand_through_nearest_config() {
        let (_dir, ws) = workspace(&[(
            "web/tsconfig.json",
            r#"{"compilerOptions": {"rootDir": "src", "paths": {"@/*": ["src/*"]}}}"#,
        )]);

        assert_eq!(ws.expand_paths("web/src/main.ts", "@/util"), vec!["@/util", "web/src/util"]);
        assert_eq!(ws.expand_paths("other/main.ts", "@/util"), vec!["@/util"]);
    }

    #[test]
    fn test_concurrent_lookups() {
        let (_dir, ws) = workspace(&[("tsconfig.json", r#"{"compilerOptions": {"baseUrl": "."}}"#)]);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let (_, config) = ws.find_config("a/b/c").unwrap();
                    assert_eq!(config.base_url.as_deref(), Some("."));
                });
            }
        });
    }
}
