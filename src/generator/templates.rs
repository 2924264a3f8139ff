//! Template data and rendering.
//!
//! Service and model modules are rendered with minijinja so maintainers can
//! point `--template-dir` at their own copies; the root `mod.rs` index is a
//! compile-time askama template.

use askama::Template;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::group::{NamedOperation, ServiceGroup};
use crate::error::EmissionErrorKind;
use crate::spec::resolve::{path_arg_type, payload_arg_type};
use crate::spec::{Definition, QueryKind, TypeContext, TypeRef};

/// File name of the service module template.
pub const SERVICE_TEMPLATE: &str = "service.rs.j2";
/// File name of the definitions module template.
pub const MODEL_TEMPLATE: &str = "model.rs.j2";

const BUILTIN_SERVICE: &str = include_str!("../../templates/service.rs.j2");
const BUILTIN_MODEL: &str = include_str!("../../templates/model.rs.j2");

/// Template data for the output root `mod.rs`.
#[derive(Template)]
#[template(path = "mod.rs.txt")]
pub struct ModRsTemplateData {
    /// Module names to declare
    pub modules: Vec<String>,
}

/// Sources of the runtime templates.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    service: String,
    model: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        TemplateSet {
            service: BUILTIN_SERVICE.to_string(),
            model: BUILTIN_MODEL.to_string(),
        }
    }
}

impl TemplateSet {
    /// Read both templates from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, (PathBuf, std::io::Error)> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|e| (path, e))
        };
        Ok(TemplateSet {
            service: read(SERVICE_TEMPLATE)?,
            model: read(MODEL_TEMPLATE)?,
        })
    }

    fn render<S: Serialize>(name: &str, source: &str, ctx: &S) -> Result<String, minijinja::Error> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template(name, source)?;
        env.get_template(name)?.render(ctx)
    }

    pub fn render_service(&self, data: &ServiceTemplateData) -> Result<String, minijinja::Error> {
        Self::render(SERVICE_TEMPLATE, &self.service, data)
    }

    pub fn render_model(&self, data: &ModelTemplateData) -> Result<String, minijinja::Error> {
        Self::render(MODEL_TEMPLATE, &self.model, data)
    }
}

/// Render the output root index.
pub fn render_mod_rs(modules: &[String]) -> Result<String, EmissionErrorKind> {
    Ok(ModRsTemplateData {
        modules: modules.to_vec(),
    }
    .render()?)
}

fn doc_lines(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Service module
// ---------------------------------------------------------------------------

/// Argument of a `Service` constructor method.
#[derive(Debug, Clone, Serialize)]
pub struct ArgView {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathParamView {
    pub placeholder: String,
    pub arg: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadView {
    pub name: String,
    pub is_upload: bool,
}

/// One chainable query setter.
#[derive(Debug, Clone, Serialize)]
pub struct QueryView {
    pub setter: String,
    /// Wire name as a Rust string literal
    pub name: String,
    /// `flag`, `string`, `int`, `number`, `datetime` or `list`
    pub kind: &'static str,
    pub arg_ty: String,
    /// Expression turning `value` into the sent string
    pub value_expr: String,
    pub doc_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadView {
    pub setter: String,
    pub header: String,
    pub value: String,
    pub doc_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub fn_name: String,
    pub call_name: String,
    pub sdk_method: String,
    pub doc_lines: Vec<String>,
    pub deprecated: bool,
    /// `http::Method` associated constant, e.g. `GET`
    pub method: String,
    /// Path template as a Rust string literal
    pub path: String,
    pub args: Vec<ArgView>,
    pub path_params: Vec<PathParamView>,
    pub payload: Option<PayloadView>,
    /// Builder calls applied after `Call::new`, in order
    pub chain: Vec<String>,
    pub query: Vec<QueryView>,
    pub has_file_uploads: bool,
    pub downloads: Vec<DownloadView>,
    pub result_type: String,
    /// Terminal call on the runtime `Call`
    pub execute: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceTemplateData {
    pub service: String,
    pub package: String,
    pub comments: Vec<String>,
    /// `use` targets, already ordered
    pub imports: Vec<String>,
    pub operations: Vec<OperationView>,
}

fn query_view(q: &crate::spec::QueryOpt) -> QueryView {
    let (kind, arg_ty, value_expr) = match q.kind {
        QueryKind::Flag => ("flag", String::new(), format!("{:?}", q.flag_value)),
        QueryKind::String => ("string", "&str".to_string(), "value".to_string()),
        QueryKind::Int => ("int", "i64".to_string(), "value.to_string()".to_string()),
        QueryKind::Number => ("number", "f64".to_string(), "value.to_string()".to_string()),
        QueryKind::DateTime => (
            "datetime",
            "DateTime<Utc>".to_string(),
            "value.to_rfc3339()".to_string(),
        ),
        QueryKind::List => ("list", "&[&str]".to_string(), "value.join(\",\")".to_string()),
    };
    let mut docs = doc_lines(&q.doc);
    if docs.is_empty() {
        docs.push(format!("sets the `{}` query parameter.", q.name));
    }
    QueryView {
        setter: q.setter.clone(),
        name: format!("{:?}", q.name),
        kind,
        arg_ty,
        value_expr,
        doc_lines: docs,
    }
}

fn operation_view(named: &NamedOperation) -> OperationView {
    let r = &named.resolved;
    let op = &r.operation;

    let mut args: Vec<ArgView> = r
        .path_params
        .iter()
        .map(|p| ArgView {
            name: p.arg.clone(),
            ty: path_arg_type(&p.ty),
        })
        .collect();
    if let Some(payload) = &r.payload {
        args.push(ArgView {
            name: payload.name.clone(),
            ty: payload_arg_type(&payload.ty),
        });
    }

    let mut chain: Vec<String> = r
        .path_params
        .iter()
        .map(|p| format!(".path_parameter({:?}, {})", format!("{{{}}}", p.placeholder), p.arg))
        .collect();
    if let Some(payload) = &r.payload {
        let method = if payload.is_upload() { "upload" } else { "payload" };
        chain.push(format!(".{method}({})", payload.name));
    }

    let result_type = r.result.rust_type(TypeContext::Service);
    let execute = match &r.result {
        TypeRef::Unit => "execute_empty()".to_string(),
        TypeRef::Download => "download()".to_string(),
        other => format!("execute::<{}>()", other.rust_type(TypeContext::Service)),
    };

    OperationView {
        fn_name: named.fn_name.clone(),
        call_name: named.call_name.clone(),
        sdk_method: op.sdk_method.clone(),
        doc_lines: named.doc_lines(),
        deprecated: op.is_deprecated(),
        method: op.method.as_str().to_string(),
        path: format!("{:?}", op.path),
        args,
        path_params: r
            .path_params
            .iter()
            .map(|p| PathParamView {
                placeholder: format!("{:?}", format!("{{{}}}", p.placeholder)),
                arg: p.arg.clone(),
            })
            .collect(),
        payload: r.payload.as_ref().map(|p| PayloadView {
            name: p.name.clone(),
            is_upload: p.is_upload(),
        }),
        chain,
        query: r.query.iter().map(query_view).collect(),
        has_file_uploads: r.has_file_uploads(),
        downloads: r
            .downloads
            .iter()
            .map(|d| DownloadView {
                setter: d.setter.clone(),
                header: format!("{:?}", d.header),
                value: format!("{:?}", d.value),
                doc_lines: doc_lines(&d.doc),
            })
            .collect(),
        result_type,
        execute,
    }
}

/// Smallest import list that covers every operation of the group.
///
/// Order: `std`, then third-party crates alphabetically, then `super`.
pub fn service_imports(group: &ServiceGroup, runtime_crate: &str) -> Vec<String> {
    let mut runtime: BTreeSet<&str> = ["Call", "Credential", "Error", "Method"].into();
    let mut external: BTreeSet<String> = BTreeSet::new();
    let mut uses_model = false;

    for named in &group.operations {
        let r = &named.resolved;
        if r.payload.as_ref().is_some_and(|p| p.is_upload()) || r.has_file_uploads() {
            runtime.insert("UploadFile");
        }
        if r.result == TypeRef::Download {
            runtime.insert("Download");
        }
        let datetime_body = r.payload.as_ref().is_some_and(|p| uses_datetime(&p.ty));
        if datetime_body
            || uses_datetime(&r.result)
            || r.query.iter().any(|q| q.kind == QueryKind::DateTime)
        {
            external.insert("chrono::{DateTime, Utc}".to_string());
        }
        uses_model |= r.signature_types().any(TypeRef::references_model);
    }

    let runtime_items: Vec<&str> = runtime.into_iter().collect();
    external.insert(format!("{runtime_crate}::{{{}}}", runtime_items.join(", ")));

    let mut imports = vec!["std::sync::Arc".to_string()];
    imports.extend(external);
    if uses_model {
        imports.push("super::model".to_string());
    }
    imports
}

/// Template data for one service module.
pub fn service_template_data(group: &ServiceGroup, runtime_crate: &str) -> ServiceTemplateData {
    ServiceTemplateData {
        service: group.service.clone(),
        package: group.package.clone(),
        comments: group.comments.clone(),
        imports: service_imports(group, runtime_crate),
        operations: group.operations.iter().map(operation_view).collect(),
    }
}

// ---------------------------------------------------------------------------
// Definitions module
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: String,
    /// JSON name as a Rust string literal; empty for flattened fields
    pub json_name: String,
    /// Full field type including `Option<..>`
    pub ty: String,
    pub optional: bool,
    pub flatten: bool,
    pub doc_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefinitionView {
    pub name: String,
    pub doc_lines: Vec<String>,
    pub is_tab: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelTemplateData {
    pub imports: Vec<String>,
    pub definitions: Vec<DefinitionView>,
    pub custom_code: String,
}

/// Imports the definitions module needs.
pub fn model_imports(definitions: &[Definition]) -> Vec<String> {
    let types = || definitions.iter().flat_map(|d| d.fields.iter().map(|f| &f.ty));
    let mut imports = Vec::new();
    if types().any(TypeRef::uses_map) {
        imports.push("std::collections::BTreeMap".to_string());
    }
    if types().any(uses_datetime) {
        imports.push("chrono::{DateTime, Utc}".to_string());
    }
    imports.push("serde::{Deserialize, Serialize}".to_string());
    imports
}

fn uses_datetime(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::DateTime => true,
        TypeRef::List(inner) | TypeRef::Map(inner) => uses_datetime(inner),
        _ => false,
    }
}

/// Template data for the definitions module.
pub fn model_template_data(definitions: &[Definition], custom_code: &str) -> ModelTemplateData {
    let definitions_view = definitions
        .iter()
        .map(|def| DefinitionView {
            name: def.name.clone(),
            doc_lines: doc_lines(&def.doc),
            is_tab: def.is_tab,
            fields: def
                .fields
                .iter()
                .map(|f| {
                    let ty = f.ty.rust_type(TypeContext::Model);
                    FieldView {
                        name: f.name.clone(),
                        json_name: if f.flatten {
                            String::new()
                        } else {
                            format!("{:?}", f.json_name)
                        },
                        ty: if f.optional && !f.flatten {
                            format!("Option<{ty}>")
                        } else {
                            ty
                        },
                        optional: f.optional && !f.flatten,
                        flatten: f.flatten,
                        doc_lines: doc_lines(&f.doc),
                    }
                })
                .collect(),
        })
        .collect();
    ModelTemplateData {
        imports: model_imports(definitions),
        definitions: definitions_view,
        custom_code: custom_code.trim().to_string(),
    }
}
