//! Import resolution: which target provides an import
//!
//! Strategies are tried in a fixed order and the first one that succeeds wins:
//! explicit overrides, the rule index, generated files, tsconfig path
//! mappings, pnpm packages and finally Node.js built-ins.

use crate::config::JsConfig;
use crate::error::{Error, Result};
use crate::imports::ImportStatement;
use crate::index::{FileLabels, ImportSpec, ModuleDeclarations, RuleIndex};
use crate::label::{Label, LabelSet};
use crate::node;
use crate::pnpm::PnpmProjectMap;
use crate::validation::UnresolvedImport;
use tracing::trace;

/// How an import was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionType {
    /// Resolved to the importing target itself, no dependency needed
    None,
    NotFound,
    /// A target or file label
    Label,
    /// An npm package of the pnpm workspace
    Package,
    /// A Node.js built-in module
    NativeNode,
    /// An exact `resolve` override
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ResolutionType,
    pub label: Option<Label>,
}

impl Resolution {
    fn of(kind: ResolutionType) -> Self {
        Self { kind, label: None }
    }

    fn with_label(kind: ResolutionType, label: Label) -> Self {
        Self {
            kind,
            label: Some(label),
        }
    }
}

/// The dependencies of one target
#[derive(Debug, Clone)]
pub struct ResolvedDeps {
    pub deps: LabelSet,
    pub unresolved: Vec<UnresolvedImport>,
}

/// Resolves imports against the frozen workspace indices. Holds no state of
/// its own so one resolver can serve any number of targets concurrently.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    pub index: &'a RuleIndex,
    pub file_labels: &'a FileLabels,
    pub modules: &'a ModuleDeclarations,
    pub pnpm: &'a PnpmProjectMap,
}

impl<'a> Resolver<'a> {
    pub fn new(
        index: &'a RuleIndex,
        file_labels: &'a FileLabels,
        modules: &'a ModuleDeclarations,
        pnpm: &'a PnpmProjectMap,
    ) -> Self {
        Self {
            index,
            file_labels,
            modules,
            pnpm,
        }
    }

    /// Resolve every import of a target into its dependency labels. Imports
    /// that could not be resolved are returned for validation.
    pub fn resolve_module_deps(
        &self,
        config: &JsConfig,
        imports: &[ImportStatement],
        from: &Label,
    ) -> Result<ResolvedDeps> {
        let mut deps = LabelSet::new(from.clone());
        let mut unresolved = Vec::new();

        for stmt in imports {
            if config.is_import_ignored(&stmt.import_path) {
                trace!("import {:?} of {} ignored", stmt.import_path, from);
                continue;
            }

            let resolution = self.resolve_module_dep(config, stmt, from)?;
            if resolution.kind == ResolutionType::None {
                continue;
            }

            let types = self.resolve_import_types(stmt, resolution.kind, from)?;

            if resolution.kind == ResolutionType::NotFound {
                // The import itself was not found, but type definitions may exist
                if let Some(types) = types {
                    deps.add(types);
                    continue;
                }

                let ambient = self.modules.get(&stmt.imp);
                if !ambient.is_empty() {
                    deps.extend(ambient.iter().cloned());
                } else if !stmt.optional {
                    trace!("import {:?} of {} not found", stmt.import_path, from);
                    unresolved.push(UnresolvedImport {
                        import_path: stmt.import_path.clone(),
                        source_path: stmt.source_path.clone(),
                    });
                }
                continue;
            }

            // Type-only imports need nothing but the typings when there are any
            if !(stmt.types_only && types.is_some()) {
                deps.extend(resolution.label);
            }
            deps.extend(types);
        }

        Ok(ResolvedDeps { deps, unresolved })
    }

    /// Resolve a single import.
    pub fn resolve_module_dep(
        &self,
        config: &JsConfig,
        stmt: &ImportStatement,
        from: &Label,
    ) -> Result<Resolution> {
        if stmt.leaves_workspace() {
            trace!("import {:?} of {} leaves the workspace", stmt.import_path, from);
            return Ok(Resolution::of(ResolutionType::NotFound));
        }

        // Overrides
        if let Some(label) = config.get_override(&stmt.imp) {
            trace!("resolve {:?} to override {}", stmt.imp, label);
            return Ok(Resolution::with_label(ResolutionType::Override, label.clone()));
        }

        // js_resolve globs
        if let Some(label) = config.get_resolution(&stmt.imp) {
            trace!("resolve {:?} to js_resolve {}", stmt.imp, label);
            return Ok(Resolution::with_label(ResolutionType::Label, label.clone()));
        }

        // The rule index
        if let Some(resolution) = self.find_in_index(stmt, &stmt.imp, from)? {
            return Ok(resolution);
        }

        // Files such as generated files
        if let Some(label) = self.file_labels.get(&stmt.imp) {
            trace!("resolve {:?} to file {}", stmt.imp, label);
            return Ok(Resolution::with_label(ResolutionType::Label, label.clone()));
        }

        // tsconfig path mappings
        for alt in &stmt.alt {
            if let Some(resolution) = self.find_in_index(stmt, alt, from)? {
                return Ok(resolution);
            }
        }

        // npm packages, pnpm workspace projects etc.
        if let Some(label) = self.resolve_package(from, &stmt.import_path) {
            return Ok(Resolution::with_label(ResolutionType::Package, label.clone()));
        }

        if node::is_node_import(&stmt.import_path) {
            return Ok(Resolution::of(ResolutionType::NativeNode));
        }

        Ok(Resolution::of(ResolutionType::NotFound))
    }

    fn find_in_index(&self, stmt: &ImportStatement, imp: &str, from: &Label) -> Result<Option<Resolution>> {
        let matches = self.index.find(&ImportSpec::new(imp));
        if matches.is_empty() {
            return Ok(None);
        }

        // Never depend on itself
        let others: Vec<&Label> = matches.iter().filter(|l| *l != from).collect();

        match others.as_slice() {
            [] => Ok(Some(Resolution::of(ResolutionType::None))),
            [label] => {
                trace!("resolve {:?} to indexed {}", imp, label);
                Ok(Some(Resolution::with_label(ResolutionType::Label, (*label).clone())))
            }
            _ => {
                let mut candidates: Vec<String> = matches.iter().map(Label::to_string).collect();
                candidates.sort();
                Err(Error::AmbiguousResolution {
                    import_path: stmt.import_path.clone(),
                    source_path: stmt.source_path.clone(),
                    candidates,
                })
            }
        }
    }

    /// The pnpm package label of a package import as seen from `from`.
    fn resolve_package(&self, from: &Label, import_path: &str) -> Option<&'a Label> {
        let (pkg, _) = node::parse_import_path(import_path);
        if pkg.is_empty() {
            return None;
        }

        let label = self.pnpm.get(&from.pkg, pkg);
        match label {
            Some(label) => trace!("resolve {} import {:?} to {}", from, pkg, label),
            None => trace!("resolve {} import {:?} not found in pnpm projects", from, pkg),
        }
        label
    }

    /// The `@types` package of an import: `@types/node` for built-ins, else
    /// derived from the package name. A rule of the workspace providing it
    /// wins over an installed package.
    fn resolve_import_types(
        &self,
        stmt: &ImportStatement,
        kind: ResolutionType,
        from: &Label,
    ) -> Result<Option<Label>> {
        let types_pkg = match kind {
            ResolutionType::NativeNode => node::NODE_TYPES_PACKAGE.to_string(),
            _ => match node::to_at_types_package(&stmt.import_path) {
                Some(types_pkg) => types_pkg,
                None => return Ok(None),
            },
        };

        if let Some(resolution) = self.find_in_index(stmt, &types_pkg, from)? {
            return Ok(resolution.label);
        }

        Ok(self.pnpm.get(&from.pkg, &types_pkg).cloned())
    }
}
