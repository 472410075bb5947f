use crate::error::{Error, Result};
use crate::label::Label;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::ValidationMode;

/// The settings file names, looked up from the workspace root upwards.
pub const SETTINGS_FILE_NAMES: &[&str] = &[".gazelle-js.json", "gazelle-js.json"];

/// Directives applying to one package directory and, unless overridden, its
/// subdirectories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PackageDirectives {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_import_statements: Option<ValidationMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnpm_lockfile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsconfig_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_link_all_target_name: Option<String>,

    /// Import globs which are never resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_imports: Vec<String>,

    /// Import globs resolved to a fixed label, first match wins
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resolve: IndexMap<String, Label>,

    /// Exact imports resolved to a fixed label
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, Label>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    /// Where parsed lockfiles are cached, disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Directives keyed by workspace-relative package directory (`""` for the root)
    #[serde(default)]
    pub packages: BTreeMap<String, PackageDirectives>,
}

impl Settings {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse settings {}: {e}", path.display())))?;
        Ok(settings)
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in SETTINGS_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Load the settings found from `start_path`, or the defaults if there are none.
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
