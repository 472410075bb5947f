use anyhow::Result;
use gazelle_js_core::ImportStatement;
use std::path::Path;

use crate::config::{load_settings, load_workspace, workspace_root};
use crate::utils::to_workspace_path;

pub fn expand_command(root: Option<&Path>, config: Option<&Path>, from_file: &Path, import: &str) -> Result<()> {
    let root = workspace_root(root)?;
    let settings = load_settings(&root, config)?;
    let workspace = load_workspace(&root, &settings, None)?;

    let source = to_workspace_path(&root, from_file)?;
    let stmt = ImportStatement::new(&source, import);

    match workspace.tsconfig().find_config(&gazelle_js_core::paths::dir(&source)) {
        Some((dir, config)) => {
            let dir = if dir.is_empty() { "." } else { dir.as_str() };
            println!("📄 {} ({})", gazelle_js_core::paths::join(&[dir, &config.config_name]), stmt.imp);
        }
        None => println!("📄 no tsconfig for {source}"),
    }

    for candidate in workspace.tsconfig().expand_paths(&source, &stmt.imp) {
        println!("   {candidate}");
    }

    Ok(())
}
