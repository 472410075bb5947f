//! gazelle-js - Import resolution for generating Bazel BUILD files from
//! JavaScript and TypeScript sources
//!
//! This crate provides functionality to:
//! - Discover `tsconfig.json` files and expand imports through their `paths`, `baseUrl` and `rootDirs`
//! - Parse pnpm lockfiles into a graph of workspace projects and their packages
//! - Resolve each import of a rule to the Bazel target providing it
//! - Report imports that could not be resolved according to the package's validation policy
pub mod cache;
pub mod config;
pub mod configure;
pub mod error;
pub mod imports;
pub mod index;
pub mod label;
pub mod node;
pub mod paths;
pub mod pnpm;
pub mod registry;
pub mod resolve;
pub mod rules;
pub mod typescript;
pub mod validation;
pub mod workspace;

// Re-export commonly used types
pub use error::{Error, Result};
pub use imports::ImportStatement;
pub use label::{Label, LabelSet};

// Re-export main API components
pub use config::{JsConfig, JsConfigTree, Settings, ValidationMode};
pub use pnpm::PnpmProjectMap;
pub use resolve::{Resolution, ResolutionType, Resolver};
pub use rules::{Rule, RuleKind, RulesManifest};
pub use typescript::TsWorkspace;
pub use validation::{UnresolvedImport, ValidationReporter};
pub use workspace::{JsWorkspace, RuleResult};
