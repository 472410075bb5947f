use std::io;

/// Errors that can occur while configuring or resolving a workspace
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tsconfig or lockfile could not be parsed. Recoverable: the file is skipped.
    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error(
        "Import {import_path:?} from {source_path:?} resolved to multiple targets ({}) - this must be fixed using the \"gazelle:resolve\" directive",
        .candidates.join(", ")
    )]
    AmbiguousResolution {
        import_path: String,
        source_path: String,
        candidates: Vec<String>,
    },

    #[error("Unsupported pnpm lockfile version {version:?} in {path}")]
    UnsupportedLockfileVersion { path: String, version: String },

    #[error("Project '{project}' (workspace: '{lockfile}') already exists from '{existing}'")]
    DuplicateProject {
        project: String,
        lockfile: String,
        existing: String,
    },

    #[error("Duplicate file label {import_path} from {existing} and {label}")]
    DuplicateFileLabel {
        import_path: String,
        existing: String,
        label: String,
    },

    #[error("Invalid ambient module declaration {module:?} in {label}")]
    MalformedModuleDeclaration { module: String, label: String },

    #[error("Failed to validate dependencies for target {target:?}:{details}")]
    Validation { target: String, details: String },

    #[error("Invalid label {0:?}")]
    InvalidLabel(String),

    #[error("Invalid glob {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error must abort the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::ConfigParse { .. })
    }
}

/// Result type alias for gazelle-js operations
pub type Result<T> = std::result::Result<T, Error>;
