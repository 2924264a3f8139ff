//! Strict internal model produced by the model builder.

use http::Method;
use std::collections::BTreeMap;
use std::fmt;

/// Resolved type of a field, parameter, payload or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    /// No content
    Unit,
    String,
    Bool,
    Int,
    Number,
    /// RFC 3339 timestamp
    DateTime,
    /// Untyped JSON
    Json,
    /// A definition, by display name
    Named(String),
    List(Box<TypeRef>),
    /// String-keyed map
    Map(Box<TypeRef>),
    /// Raw byte stream sent as the request body
    UploadFile,
    /// Raw byte stream returned with filename/content-type metadata
    Download,
    /// Verbatim Rust type supplied by a field override
    Custom(String),
}

/// Where a rendered type is used; decides how definitions are qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeContext {
    /// Inside the definitions module itself
    Model,
    /// Inside a service module (definitions live in `model::`)
    Service,
}

impl TypeRef {
    /// Rust spelling of the type in the given context.
    pub fn rust_type(&self, ctx: TypeContext) -> String {
        match self {
            TypeRef::Unit => "()".to_string(),
            TypeRef::String => "String".to_string(),
            TypeRef::Bool => "bool".to_string(),
            TypeRef::Int => "i64".to_string(),
            TypeRef::Number => "f64".to_string(),
            TypeRef::DateTime => "DateTime<Utc>".to_string(),
            TypeRef::Json => "serde_json::Value".to_string(),
            TypeRef::Named(name) => match ctx {
                TypeContext::Model => name.clone(),
                TypeContext::Service => format!("model::{name}"),
            },
            TypeRef::List(inner) => format!("Vec<{}>", inner.rust_type(ctx)),
            TypeRef::Map(inner) => match ctx {
                TypeContext::Model => format!("BTreeMap<String, {}>", inner.rust_type(ctx)),
                TypeContext::Service => {
                    format!("std::collections::BTreeMap<String, {}>", inner.rust_type(ctx))
                }
            },
            TypeRef::UploadFile => "UploadFile".to_string(),
            TypeRef::Download => "Download".to_string(),
            TypeRef::Custom(ty) => ty.clone(),
        }
    }

    /// True if any part of the type names a definition.
    pub fn references_model(&self) -> bool {
        match self {
            TypeRef::Named(_) => true,
            TypeRef::List(inner) | TypeRef::Map(inner) => inner.references_model(),
            TypeRef::Custom(ty) => ty.contains("model::"),
            _ => false,
        }
    }

    /// True if any part of the type is a map.
    pub fn uses_map(&self) -> bool {
        match self {
            TypeRef::Map(_) => true,
            TypeRef::List(inner) => inner.uses_map(),
            TypeRef::Custom(ty) => ty.contains("BTreeMap<"),
            _ => false,
        }
    }
}

/// Strict schema tree, the only schema form that leaves the model builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// `$ref` string as written
    Ref(String),
    Array(Box<Schema>),
    /// Object with typed values (`additionalProperties: {...}`)
    Map(Box<Schema>),
    /// Free-form object
    Object,
    File,
    Primitive {
        ty: String,
        format: Option<String>,
    },
    /// No usable schema information
    Empty,
}

impl Schema {
    /// Resolve to a [`TypeRef`]. `lookup` maps a `$ref` to a definition name;
    /// the first reference it cannot resolve is returned as the error.
    pub fn type_ref<F>(&self, lookup: &F) -> Result<TypeRef, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(match self {
            Schema::Ref(reference) => match lookup(reference) {
                Some(name) => TypeRef::Named(name),
                None => return Err(reference.clone()),
            },
            Schema::Array(items) => TypeRef::List(Box::new(items.type_ref(lookup)?)),
            Schema::Map(values) => TypeRef::Map(Box::new(values.type_ref(lookup)?)),
            Schema::Object | Schema::Empty => TypeRef::Json,
            Schema::File => TypeRef::Download,
            Schema::Primitive { ty, format } => match (ty.as_str(), format.as_deref()) {
                ("string", Some("date-time")) => TypeRef::DateTime,
                ("boolean", _) => TypeRef::Bool,
                ("integer", _) => TypeRef::Int,
                ("number", _) => TypeRef::Number,
                _ => TypeRef::String,
            },
        })
    }
}

/// One field of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Name on the wire; empty for flattened fields
    pub json_name: String,
    /// Rust field identifier
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
    /// Embeds another definition's fields (`#[serde(flatten)]`)
    pub flatten: bool,
    pub doc: String,
}

/// Named data shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Specification key (`definitions/<id>`), or `tab:<Name>` for tabs
    pub id: String,
    /// Rust type name, unique in the emitted definitions module
    pub name: String,
    pub doc: String,
    pub fields: Vec<Field>,
    /// Synthetic shape shared by many raw tab definitions
    pub is_tab: bool,
}

impl Definition {
    /// Wire names and types, used to spot same-named definitions that differ.
    pub fn shape(&self) -> Vec<(&str, &TypeRef)> {
        self.fields.iter().map(|f| (f.json_name.as_str(), &f.ty)).collect()
    }
}

/// Definitions keyed by `#/definitions/<id>`, each mapped to the retained
/// definition of its display name.
pub type DefinitionMap = BTreeMap<String, Definition>;

/// Location of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParameterLocation {
    /// Parse the Swagger `in` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "body" => Some(ParameterLocation::Body),
            "formData" => Some(ParameterLocation::FormData),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Schema,
    pub doc: String,
}

/// Status marker carried by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Normal,
    /// Never emitted
    Restricted,
    Deprecated,
    Other(String),
}

impl OperationStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "normal" | "active" => OperationStatus::Normal,
            "restricted" => OperationStatus::Restricted,
            "deprecated" => OperationStatus::Deprecated,
            other => OperationStatus::Other(other.to_string()),
        }
    }
}

/// A single callable API action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: String,
    /// Owning service as published; grouping may replace it
    pub service: String,
    pub category: String,
    /// SDK method name (`x-ds-methodname`), falls back to the id
    pub sdk_method: String,
    /// Documentation URL method segment (`x-ds-method`)
    pub doc_method: String,
    pub method: Method,
    /// Path template, account prefix removed
    pub path: String,
    pub status: OperationStatus,
    pub deprecated: bool,
    pub summary: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    /// Response schema by status code
    pub responses: BTreeMap<String, Schema>,
}

impl Operation {
    /// Deprecated either by status or by the description marker.
    pub fn is_deprecated(&self) -> bool {
        self.deprecated || self.status == OperationStatus::Deprecated
    }

    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// The body parameter, if the operation declares one.
    pub fn body(&self) -> Option<&Parameter> {
        self.parameters_in(ParameterLocation::Body).next()
    }
}

/// Output of the model builder.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Tab definitions first, then one definition per display name
    pub definitions: Vec<Definition>,
    pub definition_map: DefinitionMap,
    /// Sorted by `(service, id)`
    pub operations: Vec<Operation>,
    /// Tag description by tag (service) name
    pub tag_descriptions: BTreeMap<String, String>,
}
