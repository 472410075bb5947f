use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// The workspace-relative, slash separated path of a file given on the command
/// line. Relative arguments are taken from the current directory.
pub fn to_workspace_path(root: &Path, file: &Path) -> Result<String> {
    let absolute = if file.is_absolute() {
        file.to_path_buf()
    } else {
        env::current_dir()
            .context("Failed to get current directory")?
            .join(file)
    };

    // The file itself may not exist yet, only its directory must
    let absolute = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(absolute.clone()),
        _ => absolute.clone(),
    };

    let rel = absolute.strip_prefix(root).with_context(|| {
        format!("{} is not within the workspace {}", absolute.display(), root.display())
    })?;

    Ok(rel.to_string_lossy().replace('\\', "/"))
}
