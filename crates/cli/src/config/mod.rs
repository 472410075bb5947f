pub mod workspace;

pub use workspace::{load_settings, load_workspace, workspace_root};
