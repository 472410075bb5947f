//! Import statements and the paths a source file can be imported as

use crate::paths;
use serde::{Deserialize, Serialize};

/// The filename imported when importing a directory.
pub const INDEX_FILE_NAME: &str = "index";
const SLASH_INDEX_FILE_NAME: &str = "/index";

/// An import found in a source file.
///
/// Imports can be of any form (es6, cjs, amd, ...) and may be relative to the
/// source, workspace-absolute, named packages etc.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportStatement {
    /// The normalized workspace-relative import key, never starting with `./` or `../`.
    /// Empty for relative imports leaving the workspace.
    pub imp: String,

    /// Alternate keys produced by tsconfig path mapping, in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt: Vec<String>,

    /// The workspace-relative path of the file containing the import
    pub source_path: String,

    /// The path as written in the import statement
    pub import_path: String,

    /// If the import is optional and failure to resolve should not be an error
    #[serde(default)]
    pub optional: bool,

    /// If only types are imported (`import type`)
    #[serde(default)]
    pub types_only: bool,
}

impl ImportStatement {
    pub fn new(source_path: &str, import_path: &str) -> Self {
        Self {
            imp: to_import_spec_path(source_path, import_path).unwrap_or_default(),
            alt: Vec::new(),
            source_path: source_path.to_string(),
            import_path: import_path.to_string(),
            optional: false,
            types_only: false,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn types_only(mut self, types_only: bool) -> Self {
        self.types_only = types_only;
        self
    }

    pub fn with_alternates(mut self, alt: Vec<String>) -> Self {
        self.alt = alt.into_iter().filter(|a| *a != self.imp).collect();
        self
    }

    /// A relative import climbing above the workspace root, which nothing
    /// in the workspace can provide.
    pub fn leaves_workspace(&self) -> bool {
        self.imp.is_empty() && to_import_spec_path(&self.source_path, &self.import_path).is_none()
    }
}

/// Normalize an import written in `import_from` into a workspace-relative key.
///
/// `None` for relative imports climbing above the workspace root.
pub fn to_import_spec_path(import_from: &str, import_path: &str) -> Option<String> {
    // Relative paths
    if import_path.starts_with('.') {
        let joined = paths::join(&[import_from, "..", import_path]);
        if paths::escapes_root(&joined) {
            return None;
        }
        return Some(if joined == "." { String::new() } else { joined });
    }

    // URLs of any protocol
    if import_path.contains("://") {
        return Some(import_path.to_string());
    }

    // Packages, paths depending on `rootDirs` etc.
    Some(paths::clean(import_path))
}

/// Find the names/paths a workspace file can be imported as.
///
/// This runs for every indexed source file so it avoids splitting and
/// intermediate allocations.
pub fn to_import_paths(p: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(3);

    let ext = paths::ext(p);
    let no_ext = &p[..p.len() - ext.len()];

    if is_declaration_file_type(p) {
        // Strip the remaining ".d"
        let no_ext = &no_ext[..no_ext.len() - 2];

        // Assume the js file also exists
        out.push(format!("{no_ext}{}", to_js_ext(ext)));

        if is_implicit_source_file_ext(ext) {
            out.push(no_ext.to_string());
        }

        push_index_dir(&mut out, no_ext);
    } else if is_transpiled_source_file_ext(ext) {
        out.push(format!("{no_ext}{}", to_js_ext(ext)));

        if is_implicit_source_file_ext(ext) {
            out.push(no_ext.to_string());
        }

        push_index_dir(&mut out, no_ext);
    } else if is_source_file_ext(ext) {
        out.push(p.to_string());

        if is_implicit_source_file_ext(ext) {
            out.push(no_ext.to_string());
        }

        push_index_dir(&mut out, no_ext);
    } else if is_data_file_ext(ext) {
        out.push(p.to_string());
    }

    out
}

fn push_index_dir(out: &mut Vec<String>, no_ext: &str) {
    if let Some(dir) = no_ext.strip_suffix(SLASH_INDEX_FILE_NAME) {
        out.push(dir.to_string());
    }
}

/// Extensions which must be transpiled. A `.ts` extension may also belong to
/// an already transpiled `.d.ts` file.
pub fn is_transpiled_source_file_ext(ext: &str) -> bool {
    matches!(ext, ".ts" | ".cts" | ".mts" | ".tsx" | ".jsx")
}

/// ts-compatible source code that may contain imports
pub fn is_source_file_ext(ext: &str) -> bool {
    matches!(
        ext,
        ".ts" | ".cts" | ".mts" | ".tsx" | ".jsx" | ".js" | ".cjs" | ".mjs"
    )
}

/// Extensions not declaring themselves as cjs or mjs, which may be imported
/// without the extension.
pub fn is_implicit_source_file_ext(ext: &str) -> bool {
    matches!(ext, ".ts" | ".tsx" | ".js" | ".jsx")
}

pub fn is_declaration_file_type(f: &str) -> bool {
    f.ends_with(".d.ts") || f.ends_with(".d.mts") || f.ends_with(".d.cts")
}

pub fn is_data_file_ext(ext: &str) -> bool {
    ext == ".json"
}

pub fn to_js_ext(ext: &str) -> &'static str {
    match ext {
        ".ts" | ".tsx" | ".jsx" | ".js" => ".js",
        ".cts" | ".cjs" => ".cjs",
        ".mts" | ".mjs" => ".mjs",
        ".json" => ".json",
        other => {
            tracing::warn!("Unknown extension {:?}", other);
            ".js"
        }
    }
}
