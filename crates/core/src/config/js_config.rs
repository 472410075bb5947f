use crate::error::{Error, Result};
use crate::label::Label;
use crate::paths;
use crate::registry::DirRegistry;
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::{PackageDirectives, Settings};

pub const DEFAULT_PNPM_LOCKFILE: &str = "pnpm-lock.yaml";
pub const DEFAULT_TSCONFIG_FILE: &str = "tsconfig.json";
pub const DEFAULT_NPM_LINK_ALL_TARGET_NAME: &str = "node_modules";

/// What happens when imports of a target can not be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Fail with an error
    #[default]
    Error,
    /// Print a warning and continue
    Warn,
    /// Silently continue
    Off,
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "error" => Ok(ValidationMode::Error),
            "warn" => Ok(ValidationMode::Warn),
            "off" => Ok(ValidationMode::Off),
            other => Err(Error::ConfigError(format!(
                "Invalid validation mode {other:?}, expected one of error, warn, off"
            ))),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationMode::Error => "error",
            ValidationMode::Warn => "warn",
            ValidationMode::Off => "off",
        };
        f.write_str(s)
    }
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

#[derive(Debug, Clone)]
struct ResolveGlob {
    matcher: GlobMatcher,
    label: Label,
}

/// The effective JS configuration of one package directory.
///
/// Children start as a copy of their parent. Globs declared closer to the
/// package are consulted first.
#[derive(Debug, Clone)]
pub struct JsConfig {
    rel: String,
    validate_import_statements: ValidationMode,
    pnpm_lockfile: String,
    tsconfig_file: String,
    npm_link_all_target_name: String,
    ignore_imports: Vec<GlobMatcher>,
    resolves: Vec<ResolveGlob>,
    overrides: HashMap<String, Label>,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            rel: String::new(),
            validate_import_statements: ValidationMode::Error,
            pnpm_lockfile: DEFAULT_PNPM_LOCKFILE.to_string(),
            tsconfig_file: DEFAULT_TSCONFIG_FILE.to_string(),
            npm_link_all_target_name: DEFAULT_NPM_LINK_ALL_TARGET_NAME.to_string(),
            ignore_imports: Vec::new(),
            resolves: Vec::new(),
            overrides: HashMap::new(),
        }
    }
}

impl JsConfig {
    pub fn new_child(&self, rel: &str) -> Self {
        Self {
            rel: paths::normalize_dir(rel),
            ..self.clone()
        }
    }

    /// Apply the directives declared for this package.
    pub fn apply(&mut self, directives: &PackageDirectives) -> Result<()> {
        if let Some(mode) = directives.validate_import_statements {
            self.validate_import_statements = mode;
        }
        if let Some(lockfile) = &directives.pnpm_lockfile {
            self.pnpm_lockfile = lockfile.clone();
        }
        if let Some(tsconfig) = &directives.tsconfig_file {
            self.tsconfig_file = tsconfig.clone();
        }
        if let Some(name) = &directives.npm_link_all_target_name {
            self.npm_link_all_target_name = name.clone();
        }

        for glob in &directives.ignore_imports {
            self.add_ignored_import(glob)?;
        }

        let mut resolves = Vec::with_capacity(directives.resolve.len() + self.resolves.len());
        for (glob, label) in &directives.resolve {
            resolves.push(ResolveGlob {
                matcher: compile_glob(glob)?,
                label: label.clone(),
            });
        }
        resolves.append(&mut self.resolves);
        self.resolves = resolves;

        for (imp, label) in &directives.overrides {
            self.overrides.insert(imp.clone(), label.clone());
        }

        Ok(())
    }

    pub fn add_ignored_import(&mut self, glob: &str) -> Result<()> {
        self.ignore_imports.push(compile_glob(glob)?);
        Ok(())
    }

    pub fn add_resolve(&mut self, glob: &str, label: Label) -> Result<()> {
        self.resolves.insert(
            0,
            ResolveGlob {
                matcher: compile_glob(glob)?,
                label,
            },
        );
        Ok(())
    }

    pub fn add_override(&mut self, imp: &str, label: Label) {
        self.overrides.insert(imp.to_string(), label);
    }

    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn validate_import_statements(&self) -> ValidationMode {
        self.validate_import_statements
    }

    pub fn pnpm_lockfile(&self) -> &str {
        &self.pnpm_lockfile
    }

    pub fn tsconfig_file(&self) -> &str {
        &self.tsconfig_file
    }

    pub fn npm_link_all_target_name(&self) -> &str {
        &self.npm_link_all_target_name
    }

    /// Whether an import is ignored here or in any parent package.
    pub fn is_import_ignored(&self, imp: &str) -> bool {
        self.ignore_imports.iter().any(|g| g.is_match(imp))
    }

    /// The `js_resolve` label of the nearest matching glob.
    pub fn get_resolution(&self, imp: &str) -> Option<&Label> {
        self.resolves
            .iter()
            .find(|r| r.matcher.is_match(imp))
            .map(|r| &r.label)
    }

    /// The exact `resolve` override of an import.
    pub fn get_override(&self, imp: &str) -> Option<&Label> {
        self.overrides.get(imp)
    }
}

/// The per-package configurations of a workspace
#[derive(Debug)]
pub struct JsConfigTree {
    configs: DirRegistry<JsConfig>,
    root: JsConfig,
}

impl Default for JsConfigTree {
    fn default() -> Self {
        let mut configs = DirRegistry::new();
        let _ = configs.insert("", JsConfig::default());
        Self {
            configs,
            root: JsConfig::default(),
        }
    }
}

impl JsConfigTree {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut configs: DirRegistry<JsConfig> = DirRegistry::new();

        let mut root = JsConfig::default();
        let mut packages: Vec<(String, &PackageDirectives)> = settings
            .packages
            .iter()
            .map(|(dir, d)| (paths::normalize_dir(dir), d))
            .collect();

        // Parents sort before their children
        packages.sort_by(|a, b| a.0.cmp(&b.0));

        for (dir, directives) in packages {
            if dir.is_empty() {
                root.apply(directives)?;
                continue;
            }

            let parent = configs.find(&dir).map(|(_, c)| c).unwrap_or(&root);
            let mut config = parent.new_child(&dir);
            config.apply(directives)?;

            if configs.insert(&dir, config).is_err() {
                return Err(Error::ConfigError(format!(
                    "Directives declared twice for package {dir:?}"
                )));
            }
        }

        let _ = configs.insert("", root.clone());
        Ok(Self { configs, root })
    }

    /// The configuration effective for a package directory.
    pub fn for_dir(&self, dir: &str) -> &JsConfig {
        self.configs.find(dir).map(|(_, c)| c).unwrap_or(&self.root)
    }

    pub fn root(&self) -> &JsConfig {
        &self.root
    }

    /// Directories with their own directives, sorted.
    pub fn dirs(&self) -> Vec<&str> {
        self.configs.dirs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;

    fn label(s: &str) -> Label {
        Label::parse(s).unwrap()
    }

    #[test]
    fn test_validation_mode_parse() {
        assert_eq!("warn".parse::<ValidationMode>().unwrap(), ValidationMode::Warn);
        assert_eq!("off".parse::<ValidationMode>().unwrap(), ValidationMode::Off);
        assert!("loud".parse::<ValidationMode>().is_err());
        assert_eq!(ValidationMode::default().to_string(), "error");
    }

    #[test]
    fn test_globs_do_not_cross_directories() {
        let mut config = JsConfig::default();
        config.add_ignored_import("*.css").unwrap();
        config.add_ignored_import("assets/**").unwrap();

        assert!(config.is_import_ignored("app.css"));
        assert!(!config.is_import_ignored("styles/app.css"));
        assert!(config.is_import_ignored("assets/img/logo.svg"));
        assert!(config.add_ignored_import("a[").is_err());
    }

    #[test]
    fn test_child_inherits_and_nearest_resolve_wins() {
        let settings = Settings {
            cache_dir: None,
            packages: BTreeMap::from([
                (
                    "".to_string(),
                    PackageDirectives {
                        validate_import_statements: Some(ValidationMode::Warn),
                        ignore_imports: vec!["**/*.css".to_string()],
                        resolve: IndexMap::from([("@gen/*".to_string(), label("//gen:root"))]),
                        overrides: BTreeMap::from([("exact".to_string(), label("//exact"))]),
                        ..Default::default()
                    },
                ),
                (
                    "apps/web".to_string(),
                    PackageDirectives {
                        npm_link_all_target_name: Some("npm".to_string()),
                        resolve: IndexMap::from([("@gen/*".to_string(), label("//gen:web"))]),
                        ..Default::default()
                    },
                ),
            ]),
        };

        let tree = JsConfigTree::from_settings(&settings).unwrap();

        let web = tree.for_dir("apps/web/src");
        assert_eq!(web.rel(), "apps/web");
        assert_eq!(web.validate_import_statements(), ValidationMode::Warn);
        assert_eq!(web.npm_link_all_target_name(), "npm");
        assert!(web.is_import_ignored("styles/app.css"));
        assert_eq!(web.get_resolution("@gen/api"), Some(&label("//gen:web")));
        assert_eq!(web.get_override("exact"), Some(&label("//exact")));

        let other = tree.for_dir("libs/x");
        assert_eq!(other.rel(), "");
        assert_eq!(other.npm_link_all_target_name(), "node_modules");
        assert_eq!(other.get_resolution("@gen/api"), Some(&label("//gen:root")));
        assert_eq!(other.get_resolution("other"), None);
    }

    #[test]
    fn test_duplicate_package_directives() {
        let settings = Settings {
            cache_dir: None,
            packages: BTreeMap::from([
                ("a".to_string(), PackageDirectives::default()),
                ("./a".to_string(), PackageDirectives::default()),
            ]),
        };
        assert!(JsConfigTree::from_settings(&settings).is_err());
    }
}
