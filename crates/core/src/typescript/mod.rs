//! TypeScript configuration: tsconfig parsing and import path mapping

pub mod tsconfig;
pub mod workspace;

pub use tsconfig::{TsConfig, TsConfigPaths};
pub use workspace::TsWorkspace;
