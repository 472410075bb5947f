//! Reporting of imports that could not be resolved

use crate::config::ValidationMode;
use crate::error::{Error, Result};
use crate::label::Label;
use serde::Serialize;
use std::io::Write;

pub const DIRECTIVE_RESOLVE: &str = "js_resolve";
pub const DIRECTIVE_IGNORE_IMPORTS: &str = "js_ignore_imports";
pub const DIRECTIVE_VALIDATE_IMPORT_STATEMENTS: &str = "js_validate_import_statements";

/// An import no strategy could resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedImport {
    pub import_path: String,
    pub source_path: String,
}

impl UnresolvedImport {
    /// The diagnostic for this import with possible fixes.
    pub fn describe(&self) -> String {
        format!(
            "Import {imp:?} from {src:?} is an unknown dependency. Possible solutions:\n\
             \t1. Instruct Gazelle to resolve to a known dependency using a directive:\n\
             \t\t# gazelle:resolve [src-lang] js import-string label\n\
             \t\t   or\n\
             \t\t# gazelle:{DIRECTIVE_RESOLVE} import-string-glob label\n\
             \t2. Ignore the dependency using the '# gazelle:{DIRECTIVE_IGNORE_IMPORTS} {imp}' directive.\n\
             \t3. Disable Gazelle resolution validation using '# gazelle:{DIRECTIVE_VALIDATE_IMPORT_STATEMENTS} off'",
            imp = self.import_path,
            src = self.source_path,
        )
    }
}

/// Turns the unresolved imports of one target into a single diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct ValidationReporter {
    mode: ValidationMode,
}

impl ValidationReporter {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// The details listing every unresolved import, each preceded by a blank line.
    pub fn details(unresolved: &[UnresolvedImport]) -> String {
        unresolved
            .iter()
            .map(|u| format!("\n\n{}", u.describe()))
            .collect()
    }

    /// Apply the validation policy. `Error` fails, `Warn` writes a warning to
    /// `out` and `Off` stays silent.
    pub fn report<W: Write>(&self, target: &Label, unresolved: &[UnresolvedImport], out: &mut W) -> Result<()> {
        if unresolved.is_empty() {
            return Ok(());
        }

        match self.mode {
            ValidationMode::Off => Ok(()),
            ValidationMode::Warn => {
                writeln!(
                    out,
                    "Warning: Failed to validate dependencies for target {:?}:{}",
                    target.to_string(),
                    Self::details(unresolved)
                )?;
                Ok(())
            }
            ValidationMode::Error => Err(Error::Validation {
                target: target.to_string(),
                details: Self::details(unresolved),
            }),
        }
    }
}
