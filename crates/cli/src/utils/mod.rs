pub mod file;

pub use file::to_workspace_path;
