use anyhow::{Context, Result};
use gazelle_js_core::RulesManifest;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{load_settings, load_workspace, workspace_root};
use crate::display::format_rule_results;

pub fn resolve_command(
    root: Option<&Path>,
    rules: &Path,
    config: Option<&Path>,
    json: bool,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    let root = workspace_root(root)?;
    let settings = load_settings(&root, config)?;

    let manifest = RulesManifest::load_from_file(rules)
        .with_context(|| format!("Failed to load rules manifest {}", rules.display()))?;
    debug!("Loaded {} rules from {}", manifest.rules.len(), rules.display());

    let mut workspace = load_workspace(&root, &settings, cache_dir)?;
    workspace
        .index_rules(&manifest.rules)
        .context("Failed to index rules")?;

    // Warnings go to stderr, keeping stdout for the results
    let results = workspace.resolve_rules(&manifest.rules, &mut io::stderr().lock())?;
    info!("Resolved {} rules", results.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_rule_results(&results));
    }

    Ok(())
}
