//! Error types for each pipeline stage.
//!
//! Every variant names the file, operation, definition or module at fault:
//! the reader of these errors is a maintainer reconciling a new upstream
//! Swagger document with the override tables.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The Swagger document could not be read or decoded. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("unable to open {path}: {source}")]
    Open {
        /// Path handed to the loader
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// The content is not a document of the expected shape.
    #[error("unable to parse {path}: {message}")]
    Parse {
        /// Path handed to the loader
        path: PathBuf,
        /// Decoder message (includes line/column when available)
        message: String,
    },
}

/// An override table file could not be read or decoded.
#[derive(Debug, thiserror::Error)]
pub enum OverridesError {
    /// The override file could not be read.
    #[error("failed to read override tables {path}: {source}")]
    Read {
        /// Override file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// The override file is not valid TOML for the expected tables.
    #[error("failed to parse override tables {origin}: {source}")]
    Parse {
        /// File path, or `builtin` for the embedded table
        origin: String,
        /// TOML decoder failure
        #[source]
        source: toml::de::Error,
    },
}

/// A reference in the Swagger document or override tables that does not line up.
///
/// These are never defaulted away: each one is a mismatch between the
/// upstream document and the hand-maintained corrections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// A `$ref` (or a tab source id) points at no known definition.
    #[error("{owner}: unknown reference {reference}")]
    UnknownReference {
        /// `operation <id>`, `definition <name>.<field>` or `tab <name>`
        owner: String,
        /// The reference as written
        reference: String,
    },
    /// A path template placeholder has no declared path parameter.
    #[error("operation {operation}: placeholder {{{placeholder}}} in {path} has no path parameter")]
    MissingPathParameter {
        /// Operation identifier
        operation: String,
        /// Path template
        path: String,
        /// Placeholder name without braces
        placeholder: String,
    },
    /// A path template cannot be parsed into placeholders.
    #[error("operation {operation}: malformed path template {path}: {reason}")]
    MalformedPath {
        /// Operation identifier
        operation: String,
        /// Path template
        path: String,
        /// What is wrong with it
        reason: String,
    },
    /// A canonical tab field is not present on any of the tab's sources.
    #[error("tab {tab}: field {field} not found on any source definition")]
    MissingTabField {
        /// Tab definition name
        tab: String,
        /// Canonical field name
        field: String,
    },
    /// A service maps onto a package name the generator reserves.
    #[error("service {service}: package name {package:?} is reserved")]
    ReservedPackage {
        /// Final service name
        service: String,
        /// Derived package name
        package: String,
    },
    /// Two services derive the same package name.
    #[error("service {service}: package {package:?} is already used by service {existing}")]
    PackageCollision {
        /// Service that was assigned the package first
        existing: String,
        /// Service that collides with it
        service: String,
        /// Shared package name
        package: String,
    },
    /// A tab definition shares its name with another definition.
    #[error("tab {tab}: name collides with {existing}")]
    TabNameCollision {
        /// Tab definition name
        tab: String,
        /// `definition <id>` or `tab <name>`
        existing: String,
    },
}

/// All resolution errors found in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Errors in discovery order
    pub errors: Vec<ResolutionError>,
}

impl ResolutionReport {
    /// Record one error.
    pub fn push(&mut self, err: ResolutionError) {
        self.errors.push(err);
    }

    /// True when nothing went wrong.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(value)` when empty, otherwise the report itself.
    pub fn into_result<T>(self, value: T) -> Result<T, ResolutionReport> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unresolved reference(s) between the Swagger document and the override tables:",
            self.errors.len()
        )?;
        for err in &self.errors {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionReport {}

impl From<ResolutionError> for ResolutionReport {
    fn from(err: ResolutionError) -> Self {
        ResolutionReport { errors: vec![err] }
    }
}

/// Why a single module could not be emitted.
#[derive(Debug, thiserror::Error)]
pub enum EmissionErrorKind {
    /// Template lookup or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    /// Compile-time template rendering failed.
    #[error("template error: {0}")]
    Askama(#[from] askama::Error),
    /// Writing the module file failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
    /// The computed destination is not inside the output root.
    #[error("destination {0} escapes the output root")]
    OutsideRoot(PathBuf),
}

/// A module failed to render or write. Other modules are still attempted.
#[derive(Debug, thiserror::Error)]
#[error("module {module}: {kind}")]
pub struct EmissionError {
    /// Module (package) name
    pub module: String,
    /// Failure detail
    #[source]
    pub kind: EmissionErrorKind,
}

impl EmissionError {
    /// Attach a module name to a failure.
    pub fn new(module: impl Into<String>, kind: impl Into<EmissionErrorKind>) -> Self {
        EmissionError {
            module: module.into(),
            kind: kind.into(),
        }
    }
}

/// Top-level failure of a generator run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// See [`LoadError`]
    #[error(transparent)]
    Load(#[from] LoadError),
    /// See [`OverridesError`]
    #[error(transparent)]
    Overrides(#[from] OverridesError),
    /// See [`ResolutionReport`]
    #[error(transparent)]
    Resolution(#[from] ResolutionReport),
    /// One or more modules failed; the rest were written.
    #[error("{} module(s) failed to emit: {}", .0.len(), join_emission(.0))]
    Emission(Vec<EmissionError>),
    /// A template in the template directory could not be read.
    #[error("unable to read template {path}: {source}")]
    Templates {
        /// Template file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
    /// The output root could not be prepared.
    #[error("unable to prepare output root {path}: {source}")]
    OutputRoot {
        /// Output root
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

fn join_emission(errors: &[EmissionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_every_error() {
        let mut report = ResolutionReport::default();
        report.push(ResolutionError::UnknownReference {
            owner: "operation Invoices_GetInvoice".into(),
            reference: "#/definitions/missing".into(),
        });
        report.push(ResolutionError::MissingTabField {
            tab: "TabBase".into(),
            field: "anchorString".into(),
        });
        let text = report.to_string();
        assert!(text.starts_with("2 unresolved"));
        assert!(text.contains("operation Invoices_GetInvoice: unknown reference #/definitions/missing"));
        assert!(text.contains("tab TabBase: field anchorString"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ResolutionReport::default().into_result(7), Ok(7));
        let report = ResolutionReport::from(ResolutionError::ReservedPackage {
            service: "Model".into(),
            package: "model".into(),
        });
        assert!(report.into_result(()).is_err());
    }

    #[test]
    fn test_missing_path_parameter_message() {
        let err = ResolutionError::MissingPathParameter {
            operation: "op1".into(),
            path: "/invoices/{id}".into(),
            placeholder: "id".into(),
        };
        assert_eq!(
            err.to_string(),
            "operation op1: placeholder {id} in /invoices/{id} has no path parameter"
        );
    }
}
