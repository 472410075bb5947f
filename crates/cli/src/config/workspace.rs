use anyhow::{Context, Result};
use gazelle_js_core::cache::LockfileCache;
use gazelle_js_core::{JsConfigTree, JsWorkspace, Settings};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The workspace root: the given directory or the current one.
pub fn workspace_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => env::current_dir().context("Failed to get current directory")?,
    };

    root.canonicalize()
        .with_context(|| format!("Failed to canonicalize workspace root {}", root.display()))
}

/// Load the settings file given explicitly, or the one found from `root` upwards.
pub fn load_settings(root: &Path, config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Settings::discover(root).context("Failed to load settings"),
    }
}

/// Configure a workspace: per-package settings plus every tsconfig file and
/// pnpm lockfile below the root.
pub fn load_workspace(root: &Path, settings: &Settings, cache_dir: Option<PathBuf>) -> Result<JsWorkspace> {
    let configs = JsConfigTree::from_settings(settings).context("Invalid package directives")?;

    let mut cache = LockfileCache::new(cache_dir.or_else(|| settings.cache_dir.clone()));
    cache.load_from_disk().context("Failed to load lockfile cache")?;

    let mut workspace = JsWorkspace::new(root, "", configs);
    workspace
        .configure(&mut cache)
        .with_context(|| format!("Failed to configure workspace {}", root.display()))?;

    debug!("Configured workspace {}", root.display());
    Ok(workspace)
}
