//! Hand-maintained corrections to the published Swagger document.
//!
//! The tables are read once at startup ([`Overrides::builtin`] or
//! [`Overrides::load`]) and passed by reference into every stage that
//! consults them. A missing entry always means "no correction".

mod config;

use crate::spec::resolve::QueryKind;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Correction for one definition field, keyed by definition display name and
/// JSON field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldOverride {
    /// Rust type written verbatim into the definitions module
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub optional: Option<bool>,
    pub doc: Option<String>,
}

/// Correction for one query parameter of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverride {
    #[serde(rename = "type")]
    pub kind: Option<QueryKind>,
    /// Value sent by a flag setter instead of `"true"`
    pub default: Option<String>,
    pub doc: Option<String>,
}

/// How an upload operation sends its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// The request body is the raw file
    Media,
    /// JSON payload plus attached files
    Multipart,
}

/// Extra setter on a download call that selects a variant of the content
/// through a request header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadAddition {
    /// Setter name on the call builder
    pub setter: String,
    /// Header it sets
    pub header: String,
    /// Value it sends
    pub value: String,
    #[serde(default)]
    pub doc: String,
}

/// A synthetic shape shared by many raw tab definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TabSpec {
    /// Definition name to emit
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw definition ids that embed this shape
    pub sources: Vec<String>,
    /// Canonical JSON field names
    pub fields: Vec<String>,
}

/// All override tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    /// Operation ids never emitted
    pub skip: BTreeSet<String>,
    /// Operation id -> replacement service
    pub services: BTreeMap<String, String>,
    /// Service -> prefixes stripped from method names
    pub service_prefixes: BTreeMap<String, Vec<String>>,
    /// Definition name -> JSON field name -> correction
    pub fields: BTreeMap<String, BTreeMap<String, FieldOverride>>,
    /// Operation id -> parameter name -> correction
    pub parameters: BTreeMap<String, BTreeMap<String, ParameterOverride>>,
    pub uploads: BTreeMap<String, UploadKind>,
    pub downloads: BTreeMap<String, Vec<DownloadAddition>>,
    pub tabs: Vec<TabSpec>,
    /// Path prefixes supplied by the runtime's account base URL
    pub account_path_prefixes: Vec<String>,
    /// Verbatim code appended to the definitions module
    pub custom_code: String,
}

impl Overrides {
    pub fn is_skipped(&self, operation_id: &str) -> bool {
        self.skip.contains(operation_id)
    }

    pub fn service_for(&self, operation_id: &str) -> Option<&str> {
        self.services.get(operation_id).map(String::as_str)
    }

    /// Prefixes to strip for `service`; the service name itself when none are
    /// configured.
    pub fn service_prefixes<'a>(&'a self, service: &'a str) -> Vec<&'a str> {
        match self.service_prefixes.get(service) {
            Some(prefixes) => prefixes.iter().map(String::as_str).collect(),
            None => vec![service],
        }
    }

    pub fn field(&self, definition: &str, json_name: &str) -> Option<&FieldOverride> {
        self.fields.get(definition)?.get(json_name)
    }

    pub fn parameter(&self, operation_id: &str, name: &str) -> Option<&ParameterOverride> {
        self.parameters.get(operation_id)?.get(name)
    }

    pub fn upload(&self, operation_id: &str) -> Option<UploadKind> {
        self.uploads.get(operation_id).copied()
    }

    pub fn download_additions(&self, operation_id: &str) -> &[DownloadAddition] {
        self.downloads
            .get(operation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Remove the first matching account prefix from a path template.
    pub fn strip_account_prefix<'a>(&self, path: &'a str) -> &'a str {
        for prefix in &self.account_path_prefixes {
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                return rest;
            }
            if prefix.strip_suffix('/') == Some(path) {
                return "";
            }
        }
        path
    }
}
