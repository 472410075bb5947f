use super::lockfile::WorkspacePackageVersionMap;
use crate::error::{Error, Result};
use crate::label::Label;
use crate::paths;
use crate::registry::DirRegistry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, trace};

/// Handle to a workspace registered in a [`PnpmProjectMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkspaceId(usize);

/// A pnpm workspace: one lockfile and the projects it links to each other
#[derive(Debug)]
pub struct PnpmWorkspace {
    lockfile: String,
    /// Projects referenced by a `link:` or `file:` dependency
    referenced: BTreeSet<String>,
}

impl PnpmWorkspace {
    pub fn lockfile(&self) -> &str {
        &self.lockfile
    }

    /// The directory of the lockfile, `""` for the workspace root.
    pub fn root(&self) -> String {
        paths::normalize_dir(&paths::dir(&self.lockfile))
    }

    pub fn is_referenced(&self, project: &str) -> bool {
        self.referenced.contains(&paths::normalize_dir(project))
    }
}

/// A pnpm project and the packages it depends on
#[derive(Debug)]
pub struct PnpmProject {
    workspace: WorkspaceId,
    project: String,
    /// Packages resolved to directories within the workspace
    references: BTreeMap<String, String>,
    packages: HashMap<String, Label>,
}

impl PnpmProject {
    /// The workspace-relative project directory, `""` for the root.
    pub fn pkg(&self) -> &str {
        &self.project
    }

    pub fn workspace(&self) -> WorkspaceId {
        self.workspace
    }

    pub fn local_reference(&self, pkg: &str) -> Option<&str> {
        self.references.get(pkg).map(String::as_str)
    }
}

/// Summary of a project for display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectInfo {
    pub project: String,
    pub lockfile: String,
    pub referenced: bool,
    pub packages: usize,
}

/// All pnpm projects across the workspace, possibly from several lockfiles.
///
/// Projects are keyed by directory; a file belongs to the project of its
/// nearest registered ancestor directory.
#[derive(Debug, Default)]
pub struct PnpmProjectMap {
    workspaces: Vec<PnpmWorkspace>,
    projects: DirRegistry<PnpmProject>,
}

impl PnpmProjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_workspace(&mut self, lockfile: &str) -> WorkspaceId {
        self.workspaces.push(PnpmWorkspace {
            lockfile: paths::clean(lockfile),
            referenced: BTreeSet::new(),
        });
        WorkspaceId(self.workspaces.len() - 1)
    }

    pub fn workspace(&self, id: WorkspaceId) -> &PnpmWorkspace {
        &self.workspaces[id.0]
    }

    /// Register a lockfile project path (relative to the lockfile directory).
    /// Returns the workspace-relative project directory.
    pub fn add_project(&mut self, id: WorkspaceId, project: &str) -> Result<String> {
        let dir = paths::normalize_dir(&paths::join(&[self.workspace(id).root().as_str(), project]));

        let new_project = PnpmProject {
            workspace: id,
            project: dir.clone(),
            references: BTreeMap::new(),
            packages: HashMap::new(),
        };

        if let Err(rejected) = self.projects.insert(&dir, new_project) {
            let existing = self
                .projects
                .get(&dir)
                .map(|p| self.workspace(p.workspace).lockfile.clone())
                .unwrap_or_default();
            return Err(Error::DuplicateProject {
                project: dir,
                lockfile: self.workspace(rejected.workspace).lockfile.clone(),
                existing,
            });
        }

        debug!("pnpm add project {:?} from {:?}", dir, self.workspace(id).lockfile);
        Ok(dir)
    }

    /// Record the label of a package dependency of `project`. Local `link:`
    /// and `file:` versions also record a reference to the linked directory.
    pub fn add_package(&mut self, project: &str, pkg: &str, version: &str, label: Label) -> Result<()> {
        let p = self.project_mut(project)?;
        p.packages.insert(pkg.to_string(), label);
        let workspace = p.workspace;

        if let Some(link) = version.strip_prefix("link:") {
            // Relative to the project defining the link
            self.add_reference(project, pkg, &paths::join(&[project, link]))?;
        } else if let Some(file) = version.strip_prefix("file:") {
            // Relative to the pnpm workspace root
            let root = self.workspace(workspace).root();
            self.add_reference(project, pkg, &paths::join(&[root.as_str(), file]))?;
        }

        Ok(())
    }

    /// Record that `pkg` of `project` is provided by the workspace directory `dir`.
    pub fn add_reference(&mut self, project: &str, pkg: &str, dir: &str) -> Result<()> {
        let dir = paths::normalize_dir(dir);
        let p = self.project_mut(project)?;
        p.references.insert(pkg.to_string(), dir.clone());
        let workspace = p.workspace;

        trace!("pnpm project {:?} package {:?} references {:?}", project, pkg, dir);
        self.workspaces[workspace.0].referenced.insert(dir);
        Ok(())
    }

    fn project_mut(&mut self, project: &str) -> Result<&mut PnpmProject> {
        self.projects
            .get_mut(project)
            .ok_or_else(|| Error::ConfigError(format!("Unknown pnpm project {project:?}")))
    }

    /// Register every project and package of a parsed lockfile. Package labels
    /// point at `//<project>:<link_all_name>/<pkg>`.
    pub fn add_lockfile(
        &mut self,
        lockfile: &str,
        parsed: &WorkspacePackageVersionMap,
        repo: &str,
        link_all_name: &str,
    ) -> Result<WorkspaceId> {
        info!("pnpm add {:?}", lockfile);
        let id = self.new_workspace(lockfile);

        for (project, packages) in parsed {
            let dir = self.add_project(id, project)?;

            for (pkg, version) in packages {
                trace!("pnpm add {:?}: project {:?}: package {:?}", lockfile, dir, pkg);
                let label = Label::new(repo, dir.clone(), paths::join(&[link_all_name, pkg.as_str()]));
                self.add_package(&dir, pkg, version, label)?;
            }
        }

        Ok(id)
    }

    /// The project owning a directory: the nearest registered ancestor.
    pub fn get_project(&self, dir: &str) -> Option<&PnpmProject> {
        self.projects.find(dir).map(|(_, p)| p)
    }

    pub fn is_project(&self, dir: &str) -> bool {
        self.projects.contains(dir)
    }

    /// Whether the project at `dir` is linked from another project of its workspace.
    pub fn is_referenced(&self, dir: &str) -> bool {
        self.projects
            .get(dir)
            .is_some_and(|p| self.workspace(p.workspace).is_referenced(&p.project))
    }

    fn parent(&self, project: &PnpmProject) -> Option<&PnpmProject> {
        self.projects.find_parent(&project.project).map(|(_, p)| p)
    }

    /// Look up a package from `dir`, walking from its project up through the
    /// projects of ancestor directories.
    pub fn get(&self, dir: &str, pkg: &str) -> Option<&Label> {
        let mut current = self.get_project(dir);
        while let Some(project) = current {
            if let Some(label) = project.packages.get(pkg) {
                return Some(label);
            }
            current = self.parent(project);
        }
        None
    }

    pub fn projects(&self) -> Vec<ProjectInfo> {
        self.projects
            .dirs()
            .into_iter()
            .filter_map(|dir| self.projects.get(dir))
            .map(|p| ProjectInfo {
                project: p.project.clone(),
                lockfile: self.workspace(p.workspace).lockfile.clone(),
                referenced: self.workspace(p.workspace).is_referenced(&p.project),
                packages: p.packages.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pnpm::parse_lockfile;

    fn pkg_label(project: &str, pkg: &str) -> Label {
        Label::new("", project, format!("node_modules/{pkg}"))
    }

    #[test]
    fn test_projects_relative_to_lockfile() {
        let mut pm = PnpmProjectMap::new();
        let ws = pm.new_workspace("frontend/pnpm-lock.yaml");

        assert_eq!(pm.add_project(ws, ".").unwrap(), "frontend");
        assert_eq!(pm.add_project(ws, "apps/web").unwrap(), "frontend/apps/web");
        assert!(pm.is_project("frontend/apps/web"));
        assert_eq!(pm.get_project("frontend/apps/web/src").unwrap().pkg(), "frontend/apps/web");
        assert!(pm.get_project("backend").is_none());
    }

    #[test]
    fn test_duplicate_project_across_lockfiles() {
        let mut pm = PnpmProjectMap::new();
        let a = pm.new_workspace("pnpm-lock.yaml");
        pm.add_project(a, "libs/x").unwrap();

        let b = pm.new_workspace("libs/x/pnpm-lock.yaml");
        let err = pm.add_project(b, ".").unwrap_err();
        match err {
            Error::DuplicateProject {
                project,
                lockfile,
                existing,
            } => {
                assert_eq!(project, "libs/x");
                assert_eq!(lockfile, "libs/x/pnpm-lock.yaml");
                assert_eq!(existing, "pnpm-lock.yaml");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_get_walks_ancestor_projects() {
        let mut pm = PnpmProjectMap::new();
        let ws = pm.new_workspace("pnpm-lock.yaml");
        pm.add_project(ws, ".").unwrap();
        pm.add_project(ws, "apps/web").unwrap();
        pm.add_package("", "typescript", "5.4.5", pkg_label("", "typescript")).unwrap();
        pm.add_package("apps/web", "react", "18.2.0", pkg_label("apps/web", "react")).unwrap();

        assert_eq!(pm.get("apps/web/src", "react"), Some(&pkg_label("apps/web", "react")));
        assert_eq!(pm.get("apps/web/src", "typescript"), Some(&pkg_label("", "typescript")));
        assert_eq!(pm.get("tools", "react"), None);
        assert_eq!(pm.get("tools", "typescript"), Some(&pkg_label("", "typescript")));
    }

    #[test]
    fn test_link_and_file_references() {
        let mut pm = PnpmProjectMap::new();
        let ws = pm.new_workspace("js/pnpm-lock.yaml");
        let app = pm.add_project(ws, "apps/web").unwrap();
        pm.add_project(ws, "libs/a").unwrap();
        pm.add_project(ws, "libs/b").unwrap();
        pm.add_project(ws, "libs/c").unwrap();

        pm.add_package(&app, "@x/a", "link:../../libs/a", pkg_label(&app, "@x/a")).unwrap();
        pm.add_package(&app, "@x/b", "file:libs/b", pkg_label(&app, "@x/b")).unwrap();

        assert!(pm.is_referenced("js/libs/a"));
        assert!(pm.is_referenced("js/libs/b"));
        assert!(!pm.is_referenced("js/libs/c"));
        assert!(!pm.is_referenced("js/apps/web"));
        assert_eq!(pm.get_project(&app).unwrap().local_reference("@x/a"), Some("js/libs/a"));
    }

    #[test]
    fn test_add_lockfile() {
        let parsed = parse_lockfile(
            "pnpm-lock.yaml",
            r#"
lockfileVersion: '6.0'
importers:
  .:
    dependencies:
      '@x/a':
        specifier: workspace:*
        version: link:packages/a
  packages/a:
    dependencies:
      lodash:
        specifier: ^4.17.21
        version: 4.17.21
"#,
        )
        .unwrap();

        let mut pm = PnpmProjectMap::new();
        pm.add_lockfile("pnpm-lock.yaml", &parsed, "", "node_modules").unwrap();

        assert_eq!(pm.get("app", "@x/a").unwrap().to_string(), "//:node_modules/@x/a");
        assert_eq!(
            pm.get("packages/a/src", "lodash").unwrap().to_string(),
            "//packages/a:node_modules/lodash"
        );
        assert!(pm.is_referenced("packages/a"));

        let projects = pm.projects();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].project, "");
        assert!(projects[1].referenced);
    }
}
