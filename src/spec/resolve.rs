//! Reference resolution for operations.
//!
//! Turns an [`Operation`] into everything a call builder needs: typed path
//! arguments, payload, query setters and result type. Every reference is
//! checked against the definition map; failures are collected, never
//! defaulted.

use super::model::{Model, Operation, ParameterLocation, Schema, TypeContext, TypeRef};
use crate::error::{ResolutionError, ResolutionReport};
use crate::generator::naming::{snake_ident, unique_name};
use crate::overrides::{DownloadAddition, Overrides, UploadKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[allow(clippy::expect_used)]
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex should be valid"));

/// Names a call builder already uses for its own methods.
const BUILDER_METHODS: &[&str] = &["execute", "with_files"];

/// How a query option is passed and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Setter takes no argument
    Flag,
    String,
    Int,
    Number,
    /// RFC 3339 timestamp
    #[serde(rename = "datetime")]
    DateTime,
    /// Comma-joined values
    List,
}

impl QueryKind {
    fn from_schema(schema: &Schema) -> Self {
        match schema {
            Schema::Array(_) => QueryKind::List,
            Schema::Primitive { ty, format } => match (ty.as_str(), format.as_deref()) {
                ("boolean", _) => QueryKind::Flag,
                ("integer", _) => QueryKind::Int,
                ("number", _) => QueryKind::Number,
                ("string", Some("date-time")) => QueryKind::DateTime,
                _ => QueryKind::String,
            },
            _ => QueryKind::String,
        }
    }
}

/// One `{placeholder}` of the path template and the argument that fills it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    /// Placeholder name, without braces
    pub placeholder: String,
    /// Argument identifier
    pub arg: String,
    pub ty: TypeRef,
}

/// The request body argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Argument identifier
    pub name: String,
    pub ty: TypeRef,
}

impl Payload {
    pub fn is_upload(&self) -> bool {
        self.ty == TypeRef::UploadFile
    }
}

/// Optional query parameter exposed as a chainable setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOpt {
    /// Name on the wire
    pub name: String,
    pub setter: String,
    pub kind: QueryKind,
    /// Value a flag sends
    pub flag_value: String,
    pub doc: String,
}

/// An operation with every reference resolved.
#[derive(Debug, Clone)]
pub struct ResolvedOperation {
    pub operation: Operation,
    /// Final (possibly overridden) service
    pub service: String,
    pub path_params: Vec<PathParam>,
    pub payload: Option<Payload>,
    pub query: Vec<QueryOpt>,
    pub result: TypeRef,
    pub upload: Option<UploadKind>,
    pub downloads: Vec<DownloadAddition>,
}

impl ResolvedOperation {
    /// Multipart upload: JSON payload plus a `with_files` setter.
    pub fn has_file_uploads(&self) -> bool {
        self.upload == Some(UploadKind::Multipart)
    }

    /// Every type appearing in the call signature and result.
    pub fn signature_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.path_params
            .iter()
            .map(|p| &p.ty)
            .chain(self.payload.iter().map(|p| &p.ty))
            .chain(std::iter::once(&self.result))
    }
}

/// Placeholder names of a path template, in order of appearance.
///
/// # Errors
///
/// [`ResolutionError::MalformedPath`] for unbalanced or nested braces, empty
/// placeholders and repeated placeholders.
pub fn path_placeholders(operation: &str, path: &str) -> Result<Vec<String>, ResolutionError> {
    let malformed = |reason: String| ResolutionError::MalformedPath {
        operation: operation.to_string(),
        path: path.to_string(),
        reason,
    };

    let mut open = false;
    for (idx, c) in path.char_indices() {
        match (c, open) {
            ('{', true) => return Err(malformed(format!("nested '{{' at byte {idx}"))),
            ('}', false) => return Err(malformed(format!("unmatched '}}' at byte {idx}"))),
            ('{', false) => open = true,
            ('}', true) => open = false,
            _ => {}
        }
    }
    if open {
        return Err(malformed("unclosed '{'".to_string()));
    }

    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for cap in PLACEHOLDER.captures_iter(path) {
        let name = cap.get(1).map_or("", |m| m.as_str());
        if name.trim().is_empty() {
            return Err(malformed("empty placeholder".to_string()));
        }
        if !seen.insert(name) {
            return Err(malformed(format!("duplicate placeholder {{{name}}}")));
        }
        names.push(name.to_string());
    }
    Ok(names)
}

fn lookup_in(model: &Model) -> impl Fn(&str) -> Option<String> + '_ {
    move |reference: &str| model.definition_map.get(reference).map(|d| d.name.clone())
}

/// Resolve one operation under its final service name.
pub fn resolve_operation(
    op: &Operation,
    service: &str,
    model: &Model,
    overrides: &Overrides,
) -> Result<ResolvedOperation, Vec<ResolutionError>> {
    let lookup = lookup_in(model);
    let owner = format!("operation {}", op.id);
    let mut errors = Vec::new();
    let unknown = |reference: String, errors: &mut Vec<ResolutionError>| {
        errors.push(ResolutionError::UnknownReference {
            owner: owner.clone(),
            reference,
        });
    };

    // Path parameters
    let mut args = BTreeSet::new();
    let mut path_params = Vec::new();
    match path_placeholders(&op.id, &op.path) {
        Ok(placeholders) => {
            for placeholder in placeholders {
                let Some(param) = op
                    .parameters_in(ParameterLocation::Path)
                    .find(|p| p.name == placeholder)
                else {
                    errors.push(ResolutionError::MissingPathParameter {
                        operation: op.id.clone(),
                        path: op.path.clone(),
                        placeholder,
                    });
                    continue;
                };
                let ty = match param.schema.type_ref(&lookup) {
                    Ok(ty) => ty,
                    Err(reference) => {
                        unknown(reference, &mut errors);
                        continue;
                    }
                };
                path_params.push(PathParam {
                    arg: unique_name(&mut args, &snake_ident(&placeholder)),
                    placeholder,
                    ty,
                });
            }
        }
        Err(err) => errors.push(err),
    }

    // Payload
    let upload = overrides.upload(&op.id);
    let payload = match (upload, op.body()) {
        (Some(UploadKind::Media), _) => Some(Payload {
            name: unique_name(&mut args, "media"),
            ty: TypeRef::UploadFile,
        }),
        (_, None) => None,
        (_, Some(body)) => match body.schema.type_ref(&lookup) {
            Ok(TypeRef::Download) => Some(Payload {
                name: unique_name(&mut args, "media"),
                ty: TypeRef::UploadFile,
            }),
            Ok(ty) => {
                let base = match &ty {
                    TypeRef::Named(name) => snake_ident(name),
                    _ => snake_ident(&body.name),
                };
                Some(Payload {
                    name: unique_name(&mut args, &base),
                    ty,
                })
            }
            Err(reference) => {
                unknown(reference, &mut errors);
                None
            }
        },
    };

    // Result
    let downloads = overrides.download_additions(&op.id).to_vec();
    let result = if downloads.is_empty() {
        match success_schema(op) {
            None | Some(Schema::Empty) => TypeRef::Unit,
            Some(schema) => schema.type_ref(&lookup).unwrap_or_else(|reference| {
                unknown(reference, &mut errors);
                TypeRef::Unit
            }),
        }
    } else {
        TypeRef::Download
    };

    // Query options
    let mut setters: BTreeSet<String> = BUILDER_METHODS.iter().map(ToString::to_string).collect();
    setters.extend(downloads.iter().map(|d| d.setter.clone()));
    let query = op
        .parameters_in(ParameterLocation::Query)
        .map(|param| {
            let ovr = overrides.parameter(&op.id, &param.name);
            QueryOpt {
                name: param.name.clone(),
                setter: unique_name(&mut setters, &snake_ident(&param.name)),
                kind: ovr
                    .and_then(|o| o.kind)
                    .unwrap_or_else(|| QueryKind::from_schema(&param.schema)),
                flag_value: ovr
                    .and_then(|o| o.default.clone())
                    .unwrap_or_else(|| "true".to_string()),
                doc: ovr
                    .and_then(|o| o.doc.clone())
                    .unwrap_or_else(|| param.doc.clone()),
            }
        })
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ResolvedOperation {
        operation: op.clone(),
        service: service.to_string(),
        path_params,
        payload,
        query,
        result,
        upload,
        downloads,
    })
}

/// Response schema that determines the result: `200`, then `201`, then the
/// lowest other 2xx code.
fn success_schema(op: &Operation) -> Option<&Schema> {
    op.responses
        .get("200")
        .or_else(|| op.responses.get("201"))
        .or_else(|| {
            op.responses
                .iter()
                .find(|(code, _)| code.len() == 3 && code.starts_with('2'))
                .map(|(_, schema)| schema)
        })
}

/// Resolve a batch of `(operation, final service)` pairs, collecting every
/// error into one report.
pub fn resolve_operations<'a, I>(
    ops: I,
    model: &Model,
    overrides: &Overrides,
) -> Result<Vec<ResolvedOperation>, ResolutionReport>
where
    I: IntoIterator<Item = (&'a Operation, &'a str)>,
{
    let mut report = ResolutionReport::default();
    let mut resolved = Vec::new();
    for (op, service) in ops {
        match resolve_operation(op, service, model, overrides) {
            Ok(r) => resolved.push(r),
            Err(errors) => errors.into_iter().for_each(|e| report.push(e)),
        }
    }
    report.into_result(resolved)
}

/// Rust type of a path argument.
pub fn path_arg_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Int | TypeRef::Number | TypeRef::Bool => ty.rust_type(TypeContext::Service),
        _ => "&str".to_string(),
    }
}

/// Rust type of a payload argument.
pub fn payload_arg_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::UploadFile => "UploadFile".to_string(),
        TypeRef::List(inner) => format!("&[{}]", inner.rust_type(TypeContext::Service)),
        other => format!("&{}", other.rust_type(TypeContext::Service)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::model::{Definition, OperationStatus, Parameter};
    use http::Method;
    use std::collections::BTreeMap;

    fn invoice_model() -> Model {
        let invoice = Definition {
            id: "invoice".into(),
            name: "Invoice".into(),
            doc: String::new(),
            fields: Vec::new(),
            is_tab: false,
        };
        let mut model = Model::default();
        model
            .definition_map
            .insert("#/definitions/invoice".into(), invoice.clone());
        model.definitions.push(invoice);
        model
    }

    fn path_param(name: &str) -> Parameter {
        Parameter {
            name: name.into(),
            location: ParameterLocation::Path,
            required: true,
            schema: Schema::Primitive {
                ty: "string".into(),
                format: None,
            },
            doc: String::new(),
        }
    }

    fn operation(id: &str, path: &str) -> Operation {
        Operation {
            id: id.into(),
            service: "Billing".into(),
            category: "Invoices".into(),
            sdk_method: id.into(),
            doc_method: "get".into(),
            method: Method::GET,
            path: path.into(),
            status: OperationStatus::Normal,
            deprecated: false,
            summary: String::new(),
            description: String::new(),
            parameters: Vec::new(),
            responses: BTreeMap::new(),
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            path_placeholders("op", "envelopes/{envelopeId}/documents/{documentId}").unwrap(),
            vec!["envelopeId", "documentId"]
        );
        assert!(path_placeholders("op", "plain/path").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_placeholders() {
        for path in ["a/{b", "a/b}", "a/{{b}}", "a/{}", "a/{x}/b/{x}"] {
            let err = path_placeholders("op", path).unwrap_err();
            assert!(
                matches!(err, ResolutionError::MalformedPath { .. }),
                "{path}: {err}"
            );
        }
    }

    #[test]
    fn test_resolves_named_result_and_path_param() {
        let mut op = operation("op1", "/invoices/{id}");
        op.parameters.push(path_param("id"));
        op.responses
            .insert("200".into(), Schema::Ref("#/definitions/invoice".into()));
        let r = resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap();
        assert_eq!(r.path_params.len(), 1);
        assert_eq!(r.path_params[0].arg, "id");
        assert_eq!(r.path_params[0].ty, TypeRef::String);
        assert_eq!(r.result, TypeRef::Named("Invoice".into()));
        assert!(r.payload.is_none());
    }

    #[test]
    fn test_missing_path_parameter() {
        let op = operation("op1", "/invoices/{id}");
        let errors =
            resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![ResolutionError::MissingPathParameter {
                operation: "op1".into(),
                path: "/invoices/{id}".into(),
                placeholder: "id".into(),
            }]
        );
    }

    #[test]
    fn test_unknown_result_reference() {
        let mut op = operation("op1", "/invoices");
        op.responses
            .insert("200".into(), Schema::Ref("#/definitions/ghost".into()));
        let errors =
            resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![ResolutionError::UnknownReference {
                owner: "operation op1".into(),
                reference: "#/definitions/ghost".into(),
            }]
        );
    }

    #[test]
    fn test_result_code_preference() {
        let mut op = operation("op", "/x");
        op.method = Method::POST;
        op.responses.insert("204".into(), Schema::Empty);
        op.responses
            .insert("202".into(), Schema::Ref("#/definitions/invoice".into()));
        let r = resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap();
        assert_eq!(r.result, TypeRef::Named("Invoice".into()));

        op.responses.insert("201".into(), Schema::Empty);
        let r = resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap();
        assert_eq!(r.result, TypeRef::Unit);
    }

    #[test]
    fn test_body_payloads() {
        let mut op = operation("op", "/invoices");
        op.method = Method::POST;
        op.parameters.push(Parameter {
            name: "invoiceBody".into(),
            location: ParameterLocation::Body,
            required: true,
            schema: Schema::Ref("#/definitions/invoice".into()),
            doc: String::new(),
        });
        let r = resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap();
        assert_eq!(
            r.payload,
            Some(Payload {
                name: "invoice".into(),
                ty: TypeRef::Named("Invoice".into()),
            })
        );

        op.parameters[0].schema = Schema::File;
        let r = resolve_operation(&op, "Billing", &invoice_model(), &Overrides::default()).unwrap();
        assert!(r.payload.unwrap().is_upload());
    }

    #[test]
    fn test_upload_and_download_overrides() {
        let overrides = Overrides::from_toml_str(
            r#"
            [uploads]
            op_media = "media"
            op_multi = "multipart"

            [[downloads.op_media]]
            setter = "as_pdf"
            header = "Accept"
            value = "application/pdf"
            "#,
            "test",
        )
        .unwrap();
        let mut media = operation("op_media", "/docs");
        media.responses.insert(
            "200".into(),
            Schema::Ref("#/definitions/invoice".into()),
        );
        let r = resolve_operation(&media, "Billing", &invoice_model(), &overrides).unwrap();
        assert_eq!(r.payload.as_ref().map(|p| &p.ty), Some(&TypeRef::UploadFile));
        assert_eq!(r.result, TypeRef::Download);
        assert_eq!(r.downloads.len(), 1);

        let mut multi = operation("op_multi", "/docs");
        multi.parameters.push(Parameter {
            name: "body".into(),
            location: ParameterLocation::Body,
            required: true,
            schema: Schema::Ref("#/definitions/invoice".into()),
            doc: String::new(),
        });
        let r = resolve_operation(&multi, "Billing", &invoice_model(), &overrides).unwrap();
        assert!(r.has_file_uploads());
        assert_eq!(r.payload.unwrap().ty, TypeRef::Named("Invoice".into()));
    }

    #[test]
    fn test_query_options_and_overrides() {
        let mut op = operation("op", "/invoices");
        let query = |name: &str, ty: &str, format: Option<&str>| Parameter {
            name: name.into(),
            location: ParameterLocation::Query,
            required: false,
            schema: Schema::Primitive {
                ty: ty.into(),
                format: format.map(Into::into),
            },
            doc: "raw doc".into(),
        };
        op.parameters.push(query("from_date", "string", None));
        op.parameters.push(query("count", "integer", None));
        op.parameters.push(query("include_docs", "boolean", None));
        op.parameters.push(query("execute", "string", None));
        let overrides = Overrides::from_toml_str(
            r#"
            [parameters.op.from_date]
            type = "datetime"
            doc = "earliest date"

            [parameters.op.include_docs]
            default = "all"
            "#,
            "test",
        )
        .unwrap();
        let r = resolve_operation(&op, "Billing", &invoice_model(), &overrides).unwrap();
        assert_eq!(r.query[0].kind, QueryKind::DateTime);
        assert_eq!(r.query[0].doc, "earliest date");
        assert_eq!(r.query[1].kind, QueryKind::Int);
        assert_eq!(r.query[1].doc, "raw doc");
        assert_eq!(r.query[2].kind, QueryKind::Flag);
        assert_eq!(r.query[2].flag_value, "all");
        assert_eq!(r.query[3].setter, "execute_1");
        assert_eq!(r.query[3].name, "execute");
    }

    #[test]
    fn test_resolve_operations_collects_all_errors() {
        let a = operation("a", "/a/{x}");
        let b = operation("b", "/b/{");
        let model = invoice_model();
        let report = resolve_operations(
            [(&a, "Billing"), (&b, "Billing")],
            &model,
            &Overrides::default(),
        )
        .unwrap_err();
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_arg_types() {
        assert_eq!(path_arg_type(&TypeRef::String), "&str");
        assert_eq!(path_arg_type(&TypeRef::Int), "i64");
        assert_eq!(payload_arg_type(&TypeRef::UploadFile), "UploadFile");
        assert_eq!(
            payload_arg_type(&TypeRef::Named("Invoice".into())),
            "&model::Invoice"
        );
    }
}
