//! Cross-target indices consulted during resolution
//!
//! All three are filled while indexing rules and are read-only afterwards.

use crate::error::{Error, Result};
use crate::imports;
use crate::label::Label;
use crate::paths;
use crate::rules::{Rule, RuleKind};
use std::collections::HashMap;

/// The language every import spec of this crate is indexed under.
pub const LANGUAGE_NAME: &str = "js";

/// A `(language, import key)` pair a rule provides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportSpec {
    pub lang: String,
    pub imp: String,
}

impl ImportSpec {
    pub fn new(imp: impl Into<String>) -> Self {
        Self {
            lang: LANGUAGE_NAME.to_string(),
            imp: imp.into(),
        }
    }
}

/// Maps import specs to the distinct labels of every rule providing them.
#[derive(Debug, Default)]
pub struct RuleIndex {
    specs: HashMap<ImportSpec, Vec<Label>>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index everything a rule provides. Package rules provide nothing.
    pub fn add_rule(&mut self, rule: &Rule) {
        if rule.kind == RuleKind::NpmPackage {
            return;
        }

        for imp in rule.provides() {
            self.add(ImportSpec::new(imp), rule.label.clone());
        }
    }

    pub fn add(&mut self, spec: ImportSpec, label: Label) {
        let labels = self.specs.entry(spec).or_default();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    /// The labels providing `spec`, in indexing order.
    pub fn find(&self, spec: &ImportSpec) -> &[Label] {
        self.specs.get(spec).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Labels of individual (generated) files, keyed by every path they can be
/// imported as.
#[derive(Debug, Default)]
pub struct FileLabels {
    labels: HashMap<String, Label>,
}

impl FileLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the generated outputs of a rule's package.
    pub fn add_outputs(&mut self, rule: &Rule) -> Result<()> {
        for out in &rule.outs {
            let file_label = Label::new(rule.label.repo.clone(), rule.pkg(), out.clone());
            for import_path in imports::to_import_paths(&paths::join(&[rule.pkg(), out.as_str()])) {
                self.add(import_path, file_label.clone())?;
            }
        }
        Ok(())
    }

    /// Non-declaration files take precedence over declaration files. Two
    /// different declaration files for the same import are an error.
    pub fn add(&mut self, import_path: String, label: Label) -> Result<()> {
        if let Some(existing) = self.labels.get(&import_path) {
            let existing_dts = imports::is_declaration_file_type(&existing.name);
            let label_dts = imports::is_declaration_file_type(&label.name);

            if existing_dts && label_dts && *existing != label {
                return Err(Error::DuplicateFileLabel {
                    import_path,
                    existing: existing.to_string(),
                    label: label.to_string(),
                });
            }
            if label_dts {
                return Ok(());
            }
        }

        self.labels.insert(import_path, label);
        Ok(())
    }

    pub fn get(&self, import_path: &str) -> Option<&Label> {
        self.labels.get(import_path)
    }
}

/// Ambient `declare module "name"` registrations.
#[derive(Debug, Default)]
pub struct ModuleDeclarations {
    modules: HashMap<String, Vec<Label>>,
}

impl ModuleDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: &str, label: Label) -> Result<()> {
        let module = module.trim();
        if module.is_empty() || paths::is_relative(module) {
            return Err(Error::MalformedModuleDeclaration {
                module: module.to_string(),
                label: label.to_string(),
            });
        }

        let labels = self.modules.entry(module.to_string()).or_default();
        if !labels.contains(&label) {
            labels.push(label);
        }
        Ok(())
    }

    pub fn get(&self, module: &str) -> &[Label] {
        self.modules.get(module).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pkg: &str, name: &str, srcs: &[&str]) -> Rule {
        let mut r = Rule::new(Label::new("", pkg, name), RuleKind::TsProject);
        r.srcs = srcs.iter().map(|s| s.to_string()).collect();
        r
    }

    #[test]
    fn test_index_distinct_labels() {
        let mut index = RuleIndex::new();
        index.add_rule(&rule("lib", "a", &["index.ts", "index.d.ts"]));
        index.add_rule(&rule("lib", "b", &["index.js"]));

        let found = index.find(&ImportSpec::new("lib"));
        assert_eq!(found, &[Label::new("", "lib", "a"), Label::new("", "lib", "b")]);
        assert!(index.find(&ImportSpec::new("other")).is_empty());
    }

    #[test]
    fn test_package_rules_not_indexed() {
        let mut index = RuleIndex::new();
        let mut pkg = rule("lib", "pkg", &["index.js"]);
        pkg.kind = RuleKind::NpmPackage;
        index.add_rule(&pkg);
        assert!(index.is_empty());
    }

    #[test]
    fn test_file_labels_prefer_source_over_declaration() {
        let mut files = FileLabels::new();
        files.add("gen/x".into(), Label::new("", "gen", "x.d.ts")).unwrap();
        files.add("gen/x".into(), Label::new("", "gen", "x.js")).unwrap();
        assert_eq!(files.get("gen/x").unwrap().name, "x.js");

        // A later declaration does not replace the existing file
        files.add("gen/x".into(), Label::new("", "gen", "x.d.ts")).unwrap();
        assert_eq!(files.get("gen/x").unwrap().name, "x.js");
    }

    #[test]
    fn test_file_labels_duplicate_declarations() {
        let mut files = FileLabels::new();
        files.add("gen/x".into(), Label::new("", "gen", "x.d.ts")).unwrap();
        files.add("gen/x".into(), Label::new("", "gen", "x.d.ts")).unwrap();

        let err = files
            .add("gen/x".into(), Label::new("", "other", "x.d.ts"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFileLabel { .. }));
    }

    #[test]
    fn test_file_labels_from_outputs() {
        let mut generated = rule("gen", "codegen", &[]);
        generated.outs = vec!["schema.ts".into()];

        let mut files = FileLabels::new();
        files.add_outputs(&generated).unwrap();
        assert_eq!(files.get("gen/schema").unwrap().to_string(), "//gen:schema.ts");
        assert_eq!(files.get("gen/schema.js").unwrap().to_string(), "//gen:schema.ts");
    }

    #[test]
    fn test_module_declarations() {
        let mut modules = ModuleDeclarations::new();
        modules.add("virtual:env", Label::new("", "types", "types")).unwrap();
        modules.add("virtual:env", Label::new("", "types", "types")).unwrap();
        assert_eq!(modules.get("virtual:env").len(), 1);

        assert!(matches!(
            modules.add("", Label::new("", "types", "types")),
            Err(Error::MalformedModuleDeclaration { .. })
        ));
        assert!(modules.add("./local", Label::new("", "types", "types")).is_err());
    }
}
