//! The configure walk: discovers tsconfig files and pnpm lockfiles

use crate::cache::LockfileCache;
use crate::error::Result;
use crate::paths;
use crate::workspace::JsWorkspace;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &["node_modules"];

fn is_skipped_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name) || name.starts_with('.') || name.starts_with("bazel-")
}

/// The workspace-relative directories of `root`, parents before children and
/// siblings sorted by name. The root itself is `""`.
pub fn workspace_dirs(root: &Path) -> Vec<String> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // The root is walked even when its own name would be skipped
            e.depth() == 0 || !e.file_type().is_dir() || !e.file_name().to_str().is_some_and(is_skipped_dir)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            Some(rel.to_string_lossy().replace('\\', "/"))
        })
        .collect()
}

/// Walk the workspace registering the tsconfig file and pnpm lockfile of every
/// directory, as named by the directory's configuration.
pub fn configure(ws: &mut JsWorkspace, cache: &mut LockfileCache) -> Result<()> {
    let dirs = workspace_dirs(ws.root());
    debug!("Configuring {} directories of {}", dirs.len(), ws.root().display());

    for rel in &dirs {
        configure_dir(ws, cache, rel)?;
    }

    Ok(())
}

fn configure_dir(ws: &mut JsWorkspace, cache: &mut LockfileCache, rel: &str) -> Result<()> {
    let config = ws.config(rel);
    let lockfile_rel = paths::join(&[rel, config.pnpm_lockfile()]);
    let tsconfig_name = config.tsconfig_file().to_string();
    let link_all_name = config.npm_link_all_target_name().to_string();

    let lockfile_path = ws.root().join(&lockfile_rel);
    if lockfile_path.is_file() {
        add_pnpm_lockfile(ws, cache, &lockfile_path, &lockfile_rel, &link_all_name)?;
    }

    if ws.root().join(rel).join(&tsconfig_name).is_file() {
        ws.tsconfig.add_config(rel, &tsconfig_name);
    }

    Ok(())
}

fn add_pnpm_lockfile(
    ws: &mut JsWorkspace,
    cache: &mut LockfileCache,
    lockfile_path: &Path,
    lockfile_rel: &str,
    link_all_name: &str,
) -> Result<()> {
    info!("pnpm add {:?}", lockfile_rel);

    let parsed = match cache.load_or_parse(lockfile_path, lockfile_rel) {
        Ok(parsed) => parsed,
        Err(e) if !e.is_fatal() => {
            warn!("Skipping pnpm lockfile: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let repo = ws.repo().to_string();
    ws.pnpm.add_lockfile(lockfile_rel, &parsed, &repo, link_all_name)?;
    Ok(())
}
