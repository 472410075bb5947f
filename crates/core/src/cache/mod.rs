//! Caching of parsed lockfiles

pub mod lockfile_cache;

// Re-export the main cache type
pub use lockfile_cache::LockfileCache;
