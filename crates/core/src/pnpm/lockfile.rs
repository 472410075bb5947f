//! `pnpm-lock.yaml` dependency parsing
//!
//! Each lockfile schema is deserialized into its own shape and then adapted to
//! one `{project: {package: version}}` map.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::trace;

/// Package name to version (or `link:`/`file:` reference)
pub type PackageVersionMap = BTreeMap<String, String>;

/// Lockfile project path (`.` for the root) to its packages
pub type WorkspacePackageVersionMap = BTreeMap<String, PackageVersionMap>;

/// The project key of non-workspace lockfiles.
pub const ROOT_PROJECT: &str = ".";

static LOCKFILE_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*lockfileVersion:\s*['"]?(?P<version>\d+(?:\.\d+)*)['"]?\s*$"#)
        .expect("lockfile version regex is valid")
});

/// Supported lockfile schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockfileSchema {
    /// Dependencies are bare version strings
    V5,
    /// Dependencies are `{specifier, version}` objects
    V6,
    /// Same dependency shape as v6, always using `importers`
    V9,
}

/// A dependency entry of any schema that can be reduced to its version.
trait DependencyVersion {
    fn into_version(self) -> String;
}

impl DependencyVersion for serde_yaml::Value {
    fn into_version(self) -> String {
        match self {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionedDependency {
    #[serde(default)]
    #[allow(dead_code)]
    specifier: Option<String>,
    version: serde_yaml::Value,
}

impl DependencyVersion for VersionedDependency {
    fn into_version(self) -> String {
        self.version.into_version()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dependencies<D> {
    dependencies: Option<BTreeMap<String, D>>,
    dev_dependencies: Option<BTreeMap<String, D>>,
    peer_dependencies: Option<BTreeMap<String, D>>,
    optional_dependencies: Option<BTreeMap<String, D>>,
}

impl<D: DependencyVersion> Dependencies<D> {
    fn merge(self) -> PackageVersionMap {
        [
            self.dependencies,
            self.dev_dependencies,
            self.peer_dependencies,
            self.optional_dependencies,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .map(|(pkg, dep)| (pkg, dep.into_version()))
        .collect()
    }
}

#[derive(Debug, Deserialize)]
struct Lockfile<D> {
    #[serde(flatten)]
    root: Dependencies<D>,
    importers: Option<BTreeMap<String, Option<Dependencies<D>>>>,
}

impl<D: DependencyVersion> Lockfile<D> {
    fn into_workspace(self) -> WorkspacePackageVersionMap {
        match self.importers {
            // Workspace lockfiles list every project, including the root as "."
            Some(importers) => importers
                .into_iter()
                .map(|(project, deps)| (project, deps.map(Dependencies::merge).unwrap_or_default()))
                .collect(),
            // Non-workspace lockfiles have one set of dependencies at the root
            None => BTreeMap::from([(ROOT_PROJECT.to_string(), self.root.merge())]),
        }
    }
}

/// Find the lockfile version on the first meaningful line. `None` for empty content.
pub fn parse_lockfile_version(path: &str, content: &str) -> Result<Option<String>> {
    let Some(first) = content
        .lines()
        .map(str::trim_end)
        .find(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
    else {
        return Ok(None);
    };

    LOCKFILE_VERSION_REGEX
        .captures(first)
        .map(|c| Some(c["version"].to_string()))
        .ok_or_else(|| Error::ConfigParse {
            path: path.to_string(),
            message: format!("failed to find lockfile version in: {first:?}"),
        })
}

pub fn lockfile_schema(path: &str, version: &str) -> Result<LockfileSchema> {
    let major = version.split('.').next().unwrap_or_default();
    match major {
        "5" => Ok(LockfileSchema::V5),
        "6" => Ok(LockfileSchema::V6),
        "9" => Ok(LockfileSchema::V9),
        _ => Err(Error::UnsupportedLockfileVersion {
            path: path.to_string(),
            version: version.to_string(),
        }),
    }
}

/// Parse the per-project dependencies of a lockfile. `path` is only used for
/// error reporting.
pub fn parse_lockfile(path: &str, content: &str) -> Result<WorkspacePackageVersionMap> {
    let Some(version) = parse_lockfile_version(path, content)? else {
        return Ok(WorkspacePackageVersionMap::new());
    };

    let schema = lockfile_schema(path, &version)?;
    trace!("Parsing {} as lockfile schema {:?}", path, schema);

    let invalid = |e: serde_yaml::Error| Error::ConfigParse {
        path: path.to_string(),
        message: e.to_string(),
    };

    let workspace = match schema {
        LockfileSchema::V5 => serde_yaml::from_str::<Lockfile<serde_yaml::Value>>(content)
            .map_err(invalid)?
            .into_workspace(),
        LockfileSchema::V6 | LockfileSchema::V9 => {
            serde_yaml::from_str::<Lockfile<VersionedDependency>>(content)
                .map_err(invalid)?
                .into_workspace()
        }
    };

    Ok(workspace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> WorkspacePackageVersionMap {
        parse_lockfile("pnpm-lock.yaml", content).unwrap()
    }

    #[test]
    fn test_empty_lockfile() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }

    #[test]
    fn test_v5_basic_deps() {
        let basic = parse(
            r#"
lockfileVersion: 5.4

specifiers:
  '@aspect-test/a': 5.0.2
  '@aspect-test/c': 2.0.2
  jquery: 3.6.1

dependencies:
  '@aspect-test/a': 5.0.2

devDependencies:
  '@aspect-test/c': 2.0.2

peerDependencies:
  jquery: 3.6.1
"#,
        );

        assert_eq!(basic.len(), 1);
        assert_eq!(basic["."].len(), 3);
        assert_eq!(basic["."]["jquery"], "3.6.1");
    }

    #[test]
    fn test_v5_single_project_workspace() {
        let basic = parse(
            r#"
lockfileVersion: 5.4

importers:
  .:
    specifiers:
      '@aspect-test/a': 5.0.2
      '@aspect-test/c': 2.0.2
      jquery: 3.6.1

    dependencies:
      '@aspect-test/a': 5.0.2
      '@aspect-test/c': 2.0.2
      jquery: 3.6.1
"#,
        );

        assert_eq!(basic.len(), 1);
        assert_eq!(basic["."].len(), 3);
    }

    #[test]
    fn test_v5_no_deps() {
        let empty = parse("lockfileVersion: 5.4\n");
        assert_eq!(empty.len(), 1);
        assert!(empty["."].is_empty());
    }

    #[test]
    fn test_v5_workspace_deps() {
        let workspaces = parse(
            r#"
lockfileVersion: 5.4
importers:
  .:
    specifiers:
      '@aspect-test/a': ^2.0.2
    dependencies:
      '@aspect-test/a': ^2.0.2
  gazelle/ts/tests/simple_json_import:
    specifiers: {}
  infrastructure/cdn:
    specifiers:
      '@aspect-test/c': ^2.0.2
    dependencies:
      '@aspect-test/c': link:../../libs/c
packages:
  /@aspect-test/c/2.0.2:
    resolution: {integrity: sha512-abc}
"#,
        );

        assert_eq!(workspaces.len(), 3);
        assert_eq!(workspaces["."]["@aspect-test/a"], "^2.0.2");
        assert!(workspaces["gazelle/ts/tests/simple_json_import"].is_empty());
        assert_eq!(workspaces["infrastructure/cdn"]["@aspect-test/c"], "link:../../libs/c");
    }

    #[test]
    fn test_v5_and_v6_shapes_parse_identically() {
        let v5_flat = parse(
            r#"
lockfileVersion: 5.4
dependencies:
  '@x/a': 1.0.0
"#,
        );
        let v5 = parse(
            r#"
lockfileVersion: 5.4
importers:
  .:
    dependencies:
      '@x/a': 1.0.0
"#,
        );
        let v6 = parse(
            r#"
lockfileVersion: '6.0'

importers:

  .:
    dependencies:
      '@x/a':
        specifier: ^1.0.0
        version: 1.0.0
"#,
        );

        assert_eq!(v5_flat, v5);
        assert_eq!(v5, v6);
        assert_eq!(v6["."]["@x/a"], "1.0.0");
    }

    #[test]
    fn test_v6_flat_lockfile() {
        let flat = parse(
            r#"
lockfileVersion: '6.0'

dependencies:
  '@aspect-test/c':
    specifier: ^2.0.2
    version: 2.0.2

devDependencies:
  jquery:
    specifier: 3.6.1
    version: 3.6.1

packages:

  /@aspect-test/c@2.0.2:
    resolution: {integrity: sha512-abc}
"#,
        );

        assert_eq!(flat.len(), 1);
        assert_eq!(flat["."]["@aspect-test/c"], "2.0.2");
        assert_eq!(flat["."]["jquery"], "3.6.1");
    }

    #[test]
    fn test_v9_importers() {
        let v9 = parse(
            r#"
lockfileVersion: '9.0'

settings:
  autoInstallPeers: true

importers:

  .:
    devDependencies:
      typescript:
        specifier: 5.4.5
        version: 5.4.5

  packages/app:
    dependencies:
      '@lib/b':
        specifier: workspace:*
        version: link:../lib-b
    optionalDependencies:
      fsevents:
        specifier: ^2.3.3
        version: 2.3.3

  packages/empty: {}
"#,
        );

        assert_eq!(v9.len(), 3);
        assert_eq!(v9["packages/app"]["@lib/b"], "link:../lib-b");
        assert_eq!(v9["packages/app"]["fsevents"], "2.3.3");
        assert!(v9["packages/empty"].is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let err = parse_lockfile("pnpm-lock.yaml", "lockfileVersion: '7.0'\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedLockfileVersion { ref version, .. } if version == "7.0"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_version_and_malformed_yaml() {
        let err = parse_lockfile("pnpm-lock.yaml", "dependencies:\n  a: 1\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));

        let err = parse_lockfile("pnpm-lock.yaml", "lockfileVersion: '6.0'\nimporters: [: oops\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_version_detection() {
        assert_eq!(parse_lockfile_version("x", "# comment\nlockfileVersion: 5.4").unwrap().as_deref(), Some("5.4"));
        assert_eq!(parse_lockfile_version("x", "lockfileVersion: \"9.0\"").unwrap().as_deref(), Some("9.0"));
        assert_eq!(lockfile_schema("x", "6.1").unwrap(), LockfileSchema::V6);
    }
}
