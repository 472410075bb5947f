//! The workspace context: frozen indices plus the per-rule resolve pass

use crate::cache::LockfileCache;
use crate::config::{JsConfig, JsConfigTree};
use crate::configure;
use crate::error::Result;
use crate::imports::ImportStatement;
use crate::index::{FileLabels, ModuleDeclarations, RuleIndex};
use crate::label::Label;
use crate::pnpm::PnpmProjectMap;
use crate::resolve::Resolver;
use crate::rules::{Rule, RuleKind};
use crate::typescript::TsWorkspace;
use crate::validation::{UnresolvedImport, ValidationReporter};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The resolved dependencies of one rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleResult {
    pub label: Label,
    pub kind: RuleKind,
    /// The attribute the dependencies belong to
    pub attr: &'static str,
    /// Labels relative to the rule's package
    pub deps: Vec<String>,
    pub unresolved: Vec<UnresolvedImport>,
}

/// Everything known about a workspace once it has been configured and indexed.
///
/// Mutated only while configuring and indexing. Resolving takes `&self` and
/// runs across threads.
#[derive(Debug)]
pub struct JsWorkspace {
    root: PathBuf,
    repo: String,
    configs: JsConfigTree,
    pub(crate) tsconfig: TsWorkspace,
    pub(crate) pnpm: PnpmProjectMap,
    index: RuleIndex,
    file_labels: FileLabels,
    modules: ModuleDeclarations,
}

impl JsWorkspace {
    pub fn new(root: impl Into<PathBuf>, repo: impl Into<String>, configs: JsConfigTree) -> Self {
        let root = root.into();
        Self {
            tsconfig: TsWorkspace::new(root.clone()),
            root,
            repo: repo.into(),
            configs,
            pnpm: PnpmProjectMap::new(),
            index: RuleIndex::new(),
            file_labels: FileLabels::new(),
            modules: ModuleDeclarations::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn configs(&self) -> &JsConfigTree {
        &self.configs
    }

    pub fn config(&self, dir: &str) -> &JsConfig {
        self.configs.for_dir(dir)
    }

    pub fn tsconfig(&self) -> &TsWorkspace {
        &self.tsconfig
    }

    pub fn pnpm(&self) -> &PnpmProjectMap {
        &self.pnpm
    }

    /// Discover the tsconfig files and pnpm lockfiles of the workspace.
    pub fn configure(&mut self, cache: &mut LockfileCache) -> Result<()> {
        configure::configure(self, cache)
    }

    /// Register what every rule provides: importable sources, generated
    /// files and ambient module declarations.
    pub fn index_rules(&mut self, rules: &[Rule]) -> Result<()> {
        for rule in rules {
            self.index.add_rule(rule);
            self.file_labels.add_outputs(rule)?;
            for module in &rule.modules {
                self.modules.add(module, rule.label.clone())?;
            }
        }

        info!("Indexed {} rules, {} import paths", rules.len(), self.index.len());
        Ok(())
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.index, &self.file_labels, &self.modules, &self.pnpm)
    }

    /// The import statements of a rule with their tsconfig alternates.
    pub fn import_statements(&self, rule: &Rule) -> Result<Vec<ImportStatement>> {
        let statements = rule
            .import_statements()?
            .into_iter()
            .map(|stmt| {
                if stmt.leaves_workspace() {
                    return stmt;
                }
                let alt = self.tsconfig.expand_paths(&stmt.source_path, &stmt.imp);
                stmt.with_alternates(alt)
            })
            .collect();
        Ok(statements)
    }

    /// Resolve the imports of one rule, without applying validation.
    pub fn resolve_rule(&self, rule: &Rule) -> Result<RuleResult> {
        let config = self.configs.for_dir(rule.pkg());
        let imports = self.import_statements(rule)?;

        debug!("Resolving {} imports of {}", imports.len(), rule.label);
        let resolved = self.resolver().resolve_module_deps(config, &imports, &rule.label)?;

        Ok(RuleResult {
            label: rule.label.clone(),
            kind: rule.kind,
            attr: rule.kind.deps_attr(),
            deps: resolved.deps.labels().iter().map(Label::to_string).collect(),
            unresolved: resolved.unresolved,
        })
    }

    /// Resolve every rule in parallel and validate the results in manifest
    /// order. Warnings go to `warnings`; the first error in manifest order is
    /// returned.
    pub fn resolve_rules<W: Write>(&self, rules: &[Rule], warnings: &mut W) -> Result<Vec<RuleResult>> {
        let resolved: Vec<Result<RuleResult>> = rules.par_iter().map(|rule| self.resolve_rule(rule)).collect();

        let mut results = Vec::with_capacity(resolved.len());
        for result in resolved {
            let result = result?;

            let mode = self.configs.for_dir(&result.label.pkg).validate_import_statements();
            ValidationReporter::new(mode).report(&result.label, &result.unresolved, warnings)?;

            results.push(result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PackageDirectives, Settings, ValidationMode};
    use crate::error::Error;
    use crate::rules::RuleImport;

    fn rule(label: &str, srcs: &[&str], imports: &[(&str, &str)]) -> Rule {
        let mut rule = Rule::new(Label::parse(label).unwrap(), RuleKind::TsProject);
        rule.srcs = srcs.iter().map(|s| s.to_string()).collect();
        rule.imports = imports
            .iter()
            .map(|(source, path)| RuleImport {
                path: path.to_string(),
                source: source.to_string(),
                optional: false,
                types_only: false,
            })
            .collect();
        rule
    }

    fn settings(dir: &str, mode: ValidationMode) -> Settings {
        let mut settings = Settings::default();
        settings.packages.insert(
            dir.to_string(),
            PackageDirectives {
                validate_import_statements: Some(mode),
                ..Default::default()
            },
        );
        settings
    }

    #[test]
    fn test_resolve_rules_in_manifest_order() {
        let mut ws = JsWorkspace::new("/nonexistent", "", JsConfigTree::default());
        let rules = vec![
            rule("//app", &["main.ts"], &[("app/main.ts", "../lib"), ("app/main.ts", "../util/strings")]),
            rule("//lib", &["index.ts"], &[("lib/index.ts", "../util/strings")]),
            rule("//util", &["strings.ts"], &[]),
        ];
        ws.index_rules(&rules).unwrap();

        let results = ws.resolve_rules(&rules, &mut Vec::new()).unwrap();
        let deps: Vec<(String, Vec<String>)> = results
            .iter()
            .map(|r| (r.label.to_string(), r.deps.clone()))
            .collect();

        assert_eq!(
            deps,
            vec![
                ("//app".to_string(), vec!["//lib".to_string(), "//util".to_string()]),
                ("//lib".to_string(), vec!["//util".to_string()]),
                ("//util".to_string(), vec![]),
            ]
        );
        assert!(results.iter().all(|r| r.attr == "deps"));
    }

    #[test]
    fn test_validation_error_stops_resolution() {
        let configs = JsConfigTree::from_settings(&settings("", ValidationMode::Error)).unwrap();
        let mut ws = JsWorkspace::new("/nonexistent", "", configs);
        let rules = vec![
            rule("//a", &["a.ts"], &[("a/a.ts", "./missing")]),
            rule("//b", &["b.ts"], &[("b/b.ts", "./missing")]),
        ];
        ws.index_rules(&rules).unwrap();

        match ws.resolve_rules(&rules, &mut Vec::new()) {
            Err(Error::Validation { target, .. }) => assert_eq!(target, "//a"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_validation_warn_per_package() {
        let mut settings = settings("", ValidationMode::Error);
        settings.packages.insert(
            "legacy".to_string(),
            PackageDirectives {
                validate_import_statements: Some(ValidationMode::Warn),
                ..Default::default()
            },
        );
        let configs = JsConfigTree::from_settings(&settings).unwrap();
        let mut ws = JsWorkspace::new("/nonexistent", "", configs);
        let rules = vec![rule("//legacy/old", &["x.ts"], &[("legacy/old/x.ts", "left-pad")])];
        ws.index_rules(&rules).unwrap();

        let mut warnings = Vec::new();
        let results = ws.resolve_rules(&rules, &mut warnings).unwrap();

        assert_eq!(results[0].unresolved.len(), 1);
        let warnings = String::from_utf8(warnings).unwrap();
        assert!(warnings.starts_with("Warning: Failed to validate dependencies for target \"//legacy/old\""));
    }

    #[test]
    fn test_index_rejects_malformed_module_declarations() {
        let mut ws = JsWorkspace::new("/nonexistent", "", JsConfigTree::default());
        let mut bad = rule("//types", &["env.d.ts"], &[]);
        bad.modules = vec!["./relative".to_string()];

        assert!(matches!(
            ws.index_rules(&[bad]),
            Err(Error::MalformedModuleDeclaration { .. })
        ));
    }

    #[test]
    fn test_resolve_rule_rejects_absolute_sources() {
        let mut ws = JsWorkspace::new("/nonexistent", "", JsConfigTree::default());
        let rules = vec![rule("//app", &["main.ts", "util.ts"], &[("/app/main.ts", "./util")])];
        ws.index_rules(&rules).unwrap();

        assert!(matches!(ws.resolve_rule(&rules[0]), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_lookups_from_absolute_dirs_terminate() {
        let ws = JsWorkspace::new("/nonexistent", "", JsConfigTree::default());

        assert!(ws.tsconfig().find_config("/app").is_none());
        assert_eq!(ws.tsconfig().expand_paths("/app/main.ts", "util"), vec!["util"]);
        assert!(ws.pnpm().get_project("/app").is_none());
        assert_eq!(ws.configs().for_dir("/app").rel(), "");
    }
}
