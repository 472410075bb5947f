pub mod expand;
pub mod lockfile;
pub mod projects;
pub mod resolve;

pub use expand::expand_command;
pub use lockfile::lockfile_command;
pub use projects::projects_command;
pub use resolve::resolve_command;
