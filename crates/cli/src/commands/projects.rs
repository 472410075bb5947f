use anyhow::Result;
use std::path::Path;

use crate::config::{load_settings, load_workspace, workspace_root};
use crate::display::format_projects;

pub fn projects_command(root: Option<&Path>, config: Option<&Path>, json: bool) -> Result<()> {
    let root = workspace_root(root)?;
    let settings = load_settings(&root, config)?;
    let workspace = load_workspace(&root, &settings, None)?;

    let projects = workspace.pnpm().projects();
    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        println!("No pnpm projects found in {}", root.display());
    } else {
        print!("{}", format_projects(&projects));
    }

    Ok(())
}
