//! Specification loading and modelling.
//!
//! [`load_document`] decodes the Swagger file into raw types,
//! [`build_model`] turns those into the strict [`Model`], and
//! [`resolve_operations`] resolves every operation against it.

mod build;
mod load;
pub mod model;
pub mod resolve;
mod types;

pub use build::{build_model, definition_name, definition_ref, schema_from_raw, DEFINITION_REF_PREFIX};
pub use load::{apply_fixups, document_from_raw, load_document, DEPRECATION_MARKER};
pub use model::{
    Definition, DefinitionMap, Field, Model, Operation, OperationStatus, Parameter,
    ParameterLocation, Schema, TypeContext, TypeRef,
};
pub use resolve::{
    path_placeholders, resolve_operation, resolve_operations, Payload, PathParam, QueryKind,
    QueryOpt, ResolvedOperation,
};
pub use types::{
    Document, RawDocument, RawOperation, RawParameter, RawPathItem, RawResponse, RawSchema,
    RawTag,
};
