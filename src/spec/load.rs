use super::types::{Document, RawDocument, RawOperation, RawResponse, RawSchema};
use crate::error::LoadError;
use std::path::Path;
use tracing::debug;

/// Marker DocuSign puts in the description of retired operations.
pub const DEPRECATION_MARKER: &str = "**Deprecated**";

/// Load the Swagger document at `path` and apply the document-level fixups.
///
/// YAML is selected by a `.yaml`/`.yml` extension, anything else is read as
/// JSON.
///
/// # Errors
///
/// [`LoadError::Open`] when the file cannot be read, [`LoadError::Parse`]
/// when it does not decode into the expected document shape.
pub fn load_document(path: &Path) -> Result<Document, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false);
    let raw: RawDocument = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };
    Ok(document_from_raw(raw))
}

/// Flatten `paths` into operations and apply [`apply_fixups`].
pub fn document_from_raw(raw: RawDocument) -> Document {
    let mut operations = Vec::new();
    for (path, item) in raw.paths {
        let shared = item.parameters.clone();
        for (method, mut op) in item.into_operations() {
            op.http_method = method.to_string();
            op.path = path.clone();
            // Operation-level parameters win over path-level ones of the same name.
            for param in &shared {
                let overridden = op
                    .parameters
                    .iter()
                    .any(|p| p.name == param.name && p.location == param.location);
                if !overridden {
                    op.parameters.push(param.clone());
                }
            }
            operations.push(op);
        }
    }
    let mut doc = Document {
        definitions: raw.definitions,
        operations,
        tags: raw.tags,
    };
    apply_fixups(&mut doc.operations);
    doc
}

/// Document-level corrections that depend only on the document's own content.
///
/// 1. An operation whose description carries [`DEPRECATION_MARKER`] is
///    flagged deprecated.
/// 2. A GET whose `200` response declares no schema gets a `file` schema:
///    DocuSign publishes binary downloads without one.
///
/// Applying this twice is the same as applying it once.
pub fn apply_fixups(operations: &mut [RawOperation]) {
    for op in operations.iter_mut() {
        if op.description.contains(DEPRECATION_MARKER) {
            op.deprecated = true;
        }
        if op.http_method == "GET" {
            let response = op.responses.entry("200".to_string()).or_insert_with(|| RawResponse {
                description: String::new(),
                schema: None,
            });
            if response.schema.is_none() {
                debug!(operation = %op.operation_id, "Synthesizing file response for schemaless GET");
                response.schema = Some(RawSchema {
                    ty: Some("file".to_string()),
                    ..RawSchema::default()
                });
            }
        }
    }
}
