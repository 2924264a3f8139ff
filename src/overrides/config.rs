use super::Overrides;
use crate::error::OverridesError;
use std::path::Path;

/// Built-in DocuSign corrections, compiled into the binary.
const BUILTIN: &str = include_str!("../../overrides/docusign.toml");

impl Overrides {
    /// Parse override tables from TOML text. `origin` names the source in
    /// error messages.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, OverridesError> {
        toml::from_str(content).map_err(|source| OverridesError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// The tables shipped with the generator.
    pub fn builtin() -> Result<Self, OverridesError> {
        Self::from_toml_str(BUILTIN, "builtin")
    }

    /// Load tables from a file. The result replaces the built-in tables
    /// entirely.
    pub fn load(path: &Path) -> Result<Self, OverridesError> {
        let contents = std::fs::read_to_string(path).map_err(|source| OverridesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// `load(path)` when a path is given, otherwise [`Overrides::builtin`].
    pub fn resolve(path: Option<&Path>) -> Result<Self, OverridesError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }
}
