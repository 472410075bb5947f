//! pnpm lockfiles and the workspace project graph built from them

pub mod lockfile;
pub mod workspace;

pub use lockfile::{
    LockfileSchema, PackageVersionMap, WorkspacePackageVersionMap, parse_lockfile,
};
pub use workspace::{PnpmProject, PnpmProjectMap, PnpmWorkspace, ProjectInfo, WorkspaceId};
