//! Raw, permissive shape of the Swagger document.
//!
//! These types mirror the JSON as DocuSign publishes it and are only used by
//! the loader and the model builder. Nothing past [`crate::spec::build_model`]
//! sees them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Swagger document as decoded from disk.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDocument {
    #[serde(default)]
    pub definitions: BTreeMap<String, RawSchema>,
    #[serde(default)]
    pub paths: BTreeMap<String, RawPathItem>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
}

/// Top-level tag; DocuSign uses one per service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTag {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Operations available on one path.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPathItem {
    pub get: Option<RawOperation>,
    pub put: Option<RawOperation>,
    pub post: Option<RawOperation>,
    pub delete: Option<RawOperation>,
    pub patch: Option<RawOperation>,
    pub head: Option<RawOperation>,
    pub options: Option<RawOperation>,
    /// Parameters shared by every operation on the path
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

impl RawPathItem {
    /// Operations paired with their upper-case HTTP method, in a fixed order.
    pub fn into_operations(self) -> Vec<(&'static str, RawOperation)> {
        [
            ("GET", self.get),
            ("PUT", self.put),
            ("POST", self.post),
            ("DELETE", self.delete),
            ("PATCH", self.patch),
            ("HEAD", self.head),
            ("OPTIONS", self.options),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
        .collect()
    }
}

/// One operation as written in the document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    #[serde(default)]
    pub operation_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    #[serde(default)]
    pub responses: BTreeMap<String, RawResponse>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(rename = "x-ds-service", default)]
    pub service: String,
    #[serde(rename = "x-ds-category", default)]
    pub category: String,
    #[serde(rename = "x-ds-methodname", default)]
    pub method_name: String,
    #[serde(rename = "x-ds-method", default)]
    pub doc_method: String,
    #[serde(rename = "x-ds-api-status", default)]
    pub status: String,

    /// Filled in by the loader from the path item
    #[serde(skip)]
    pub http_method: String,
    /// Filled in by the loader from the path item
    #[serde(skip)]
    pub path: String,
}

/// Parameter in Swagger 2.0 form (`type` inline, `schema` for bodies).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub format: Option<String>,
    pub items: Option<Box<RawSchema>>,
    pub schema: Option<RawSchema>,
    pub collection_format: Option<String>,
}

/// One response entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawResponse {
    #[serde(default)]
    pub description: String,
    pub schema: Option<RawSchema>,
}

/// JSON schema subset used by the document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub format: Option<String>,
    pub items: Option<Box<RawSchema>>,
    #[serde(default)]
    pub properties: BTreeMap<String, RawSchema>,
    /// `true`, `false` or a schema; only the schema form is meaningful here
    pub additional_properties: Option<serde_json::Value>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "x-ds-definition-name")]
    pub definition_name: Option<String>,
}

/// Loaded document: definitions by id, operations flattened out of `paths`.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub definitions: BTreeMap<String, RawSchema>,
    pub operations: Vec<RawOperation>,
    pub tags: Vec<RawTag>,
}
