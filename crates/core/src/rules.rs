//! The rules manifest handed over by the host indexer
//!
//! Rule creation and source parsing happen elsewhere; this crate only receives
//! the resulting rules with the raw import strings found in their sources.

use crate::error::{Error, Result};
use crate::imports::{self, ImportStatement};
use crate::label::Label;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    TsProject,
    JsLibrary,
    TsConfig,
    TsProtoLibrary,
    NpmPackage,
}

impl RuleKind {
    /// The attribute resolved labels are written to.
    pub fn deps_attr(self) -> &'static str {
        match self {
            RuleKind::NpmPackage => "srcs",
            _ => "deps",
        }
    }
}

/// A raw import found in one of a rule's sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleImport {
    /// The import as written
    pub path: String,
    /// Workspace-relative path of the importing file
    pub source: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub types_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub label: Label,
    pub kind: RuleKind,
    /// Package-relative source files
    #[serde(default)]
    pub srcs: Vec<String>,
    /// Package-relative generated outputs
    #[serde(default)]
    pub outs: Vec<String>,
    #[serde(default)]
    pub imports: Vec<RuleImport>,
    /// Ambient `declare module "..."` names declared by the sources
    #[serde(default)]
    pub modules: Vec<String>,
}

impl Rule {
    pub fn new(label: Label, kind: RuleKind) -> Self {
        Self {
            label,
            kind,
            srcs: Vec::new(),
            outs: Vec::new(),
            imports: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn pkg(&self) -> &str {
        &self.label.pkg
    }

    /// The import keys this rule provides to the rest of the workspace.
    pub fn provides(&self) -> Vec<String> {
        match self.kind {
            // Only the tsconfig file itself is exposed
            RuleKind::TsConfig => self
                .srcs
                .iter()
                .map(|src| paths::join(&[self.pkg(), src.as_str()]))
                .collect(),
            RuleKind::TsProtoLibrary => self
                .srcs
                .iter()
                .flat_map(|src| proto_ts_paths(&paths::join(&[self.pkg(), src.as_str()])))
                .flat_map(|dts| imports::to_import_paths(&dts))
                .collect(),
            _ => self
                .srcs
                .iter()
                .flat_map(|src| imports::to_import_paths(&paths::join(&[self.pkg(), src.as_str()])))
                .collect(),
        }
    }

    /// The rule's raw imports as normalized import statements. Every import
    /// source must be a workspace-relative path.
    pub fn import_statements(&self) -> Result<Vec<ImportStatement>> {
        let mut statements = Vec::with_capacity(self.imports.len());
        for i in &self.imports {
            if i.source.is_empty() || paths::is_abs(&i.source) || paths::escapes_root(&i.source) {
                return Err(Error::ConfigError(format!(
                    "Import {:?} of {} has source {:?} outside the workspace",
                    i.path, self.label, i.source
                )));
            }

            statements.push(
                ImportStatement::new(&i.source, &i.path)
                    .optional(i.optional)
                    .types_only(i.types_only),
            );
        }

        statements.sort();
        statements.dedup();
        Ok(statements)
    }
}

/// The typescript declaration files generated for a `.proto` file.
fn proto_ts_paths(src: &str) -> [String; 2] {
    let stem = &src[..src.len() - paths::ext(src).len()];
    [format!("{stem}_connect.d.ts"), format!("{stem}_pb.d.ts")]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesManifest {
    /// Name of the repository the rules belong to, empty for the main repository
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RulesManifest {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut manifest: RulesManifest = serde_json::from_str(&contents).map_err(|e| {
            Error::ConfigError(format!("Failed to parse rules manifest {}: {e}", path.display()))
        })?;

        // Labels are written without a repo inside their own repository
        for rule in &mut manifest.rules {
            if rule.label.repo.is_empty() {
                rule.label.repo = manifest.repo.clone();
            }
        }

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_rule_provides() {
        let mut rule = Rule::new(Label::new("", "lib/a", "a"), RuleKind::TsProject);
        rule.srcs = vec!["index.ts".into(), "util.ts".into()];

        let mut provides = rule.provides();
        provides.sort();
        assert_eq!(
            provides,
            vec!["lib/a", "lib/a/index", "lib/a/index.js", "lib/a/util", "lib/a/util.js"]
        );
    }

    #[test]
    fn test_tsconfig_and_proto_provides() {
        let mut tsconfig = Rule::new(Label::new("", "", "tsconfig"), RuleKind::TsConfig);
        tsconfig.srcs = vec!["tsconfig.json".into()];
        assert_eq!(tsconfig.provides(), vec!["tsconfig.json"]);

        let mut proto = Rule::new(Label::new("", "api", "api_ts"), RuleKind::TsProtoLibrary);
        proto.srcs = vec!["service.proto".into()];
        let provides = proto.provides();
        assert!(provides.contains(&"api/service_pb".to_string()));
        assert!(provides.contains(&"api/service_pb.js".to_string()));
        assert!(provides.contains(&"api/service_connect".to_string()));
    }

    #[test]
    fn test_manifest_parsing() {
        let json = r#"{
            "repo": "",
            "rules": [{
                "label": "//app:app",
                "kind": "ts_project",
                "srcs": ["main.ts"],
                "imports": [
                    {"path": "./util", "source": "app/main.ts"},
                    {"path": "./util", "source": "app/main.ts"},
                    {"path": "lodash", "source": "app/main.ts", "types_only": true}
                ]
            }]
        }"#;

        let manifest: RulesManifest = serde_json::from_str(json).unwrap();
        let rule = &manifest.rules[0];
        assert_eq!(rule.kind.deps_attr(), "deps");

        let statements = rule.import_statements().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].imp, "app/util");
        assert!(statements[1].types_only);
    }

    #[test]
    fn test_sources_outside_workspace_are_rejected() {
        for source in ["/app/main.ts", "../other/main.ts", ""] {
            let mut rule = Rule::new(Label::new("", "app", "app"), RuleKind::TsProject);
            rule.imports = vec![RuleImport {
                path: "./util".into(),
                source: source.into(),
                optional: false,
                types_only: false,
            }];

            let err = rule.import_statements().unwrap_err();
            assert!(matches!(err, Error::ConfigError(_)), "source {source:?}: {err:?}");
        }
    }
}
