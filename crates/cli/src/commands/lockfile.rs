use anyhow::{Context, Result};
use gazelle_js_core::pnpm;
use std::fs;
use std::path::Path;

pub fn lockfile_command(path: &Path) -> Result<()> {
    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let parsed = pnpm::parse_lockfile(&path.display().to_string(), &contents)?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);

    Ok(())
}
