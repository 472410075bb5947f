//! Configuration management for gazelle-js

mod js_config;
mod settings;

// Re-export main types
pub use js_config::{
    DEFAULT_NPM_LINK_ALL_TARGET_NAME, DEFAULT_PNPM_LOCKFILE, DEFAULT_TSCONFIG_FILE, JsConfig,
    JsConfigTree, ValidationMode,
};
pub use settings::{PackageDirectives, SETTINGS_FILE_NAMES, Settings};
