//! Raw document -> strict [`Model`].
//!
//! Definitions get display names, typed fields and field overrides; tab
//! shapes are synthesized from their source definitions; duplicates are
//! collapsed; operations are converted and sorted.

use super::model::{
    Definition, DefinitionMap, Field, Model, Operation, OperationStatus, Parameter,
    ParameterLocation, Schema, TypeRef,
};
use super::types::{Document, RawOperation, RawParameter, RawSchema};
use crate::error::{ResolutionError, ResolutionReport};
use crate::generator::naming::{snake_ident, type_ident, unique_name};
use crate::overrides::{Overrides, TabSpec};
use http::Method;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Prefix of every definition reference in the document.
pub const DEFINITION_REF_PREFIX: &str = "#/definitions/";

/// Lookup key of the definition with id `id`.
pub fn definition_ref(id: &str) -> String {
    format!("{DEFINITION_REF_PREFIX}{id}")
}

/// Display name of a raw definition.
pub fn definition_name(id: &str, raw: &RawSchema) -> String {
    type_ident(raw.definition_name.as_deref().unwrap_or(id))
}

/// Convert a raw schema into the strict schema tree.
pub fn schema_from_raw(raw: &RawSchema) -> Schema {
    if let Some(reference) = &raw.reference {
        return Schema::Ref(reference.clone());
    }
    match raw.ty.as_deref() {
        Some("array") => Schema::Array(Box::new(
            raw.items
                .as_deref()
                .map(schema_from_raw)
                .unwrap_or(Schema::Empty),
        )),
        Some("object") => match additional_properties(raw) {
            Some(values) => Schema::Map(Box::new(schema_from_raw(&values))),
            None => Schema::Object,
        },
        Some("file") => Schema::File,
        Some(ty) => Schema::Primitive {
            ty: ty.to_string(),
            format: raw.format.clone(),
        },
        None if !raw.properties.is_empty() => Schema::Object,
        None => Schema::Empty,
    }
}

fn additional_properties(raw: &RawSchema) -> Option<RawSchema> {
    match &raw.additional_properties {
        Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

fn parameter_schema(raw: &RawParameter) -> Schema {
    if let Some(schema) = &raw.schema {
        return schema_from_raw(schema);
    }
    schema_from_raw(&RawSchema {
        ty: raw.ty.clone(),
        format: raw.format.clone(),
        items: raw.items.clone(),
        ..RawSchema::default()
    })
}

/// Build the strict model. Every unresolved reference found while doing so
/// is collected into the returned report.
pub fn build_model(doc: &Document, overrides: &Overrides) -> Result<Model, ResolutionReport> {
    let mut report = ResolutionReport::default();

    let names: BTreeMap<String, String> = doc
        .definitions
        .iter()
        .map(|(id, raw)| (definition_ref(id), definition_name(id, raw)))
        .collect();

    let mut by_id: BTreeMap<String, Definition> = doc
        .definitions
        .iter()
        .map(|(id, raw)| (id.clone(), build_definition(id, raw, &names, overrides, &mut report)))
        .collect();

    let tabs: Vec<Definition> = overrides
        .tabs
        .iter()
        .filter_map(|spec| synthesize_tab(spec, &mut by_id, overrides, &mut report))
        .collect();

    let (retained, mut definition_map) = collapse_duplicates(by_id.into_values().collect());
    check_tab_names(&tabs, &retained, &mut report);

    let mut definitions = tabs;
    definitions.extend(retained);
    box_recursive_fields(&mut definitions);
    for def in definition_map.values_mut() {
        if let Some(kept) = definitions.iter().find(|d| d.name == def.name) {
            def.clone_from(kept);
        }
    }

    let operations = build_operations(&doc.operations, overrides);
    let tag_descriptions = doc
        .tags
        .iter()
        .map(|tag| (tag.name.clone(), tag.description.clone()))
        .collect();

    report.into_result(Model {
        definitions,
        definition_map,
        operations,
        tag_descriptions,
    })
}

fn build_definition(
    id: &str,
    raw: &RawSchema,
    names: &BTreeMap<String, String>,
    overrides: &Overrides,
    report: &mut ResolutionReport,
) -> Definition {
    let name = definition_name(id, raw);
    let required: BTreeSet<&str> = raw.required.iter().map(String::as_str).collect();
    let lookup = |r: &str| names.get(r).cloned();
    let mut seen = BTreeSet::new();

    let fields = raw
        .properties
        .iter()
        .map(|(json_name, prop)| {
            let ty = match schema_from_raw(prop).type_ref(&lookup) {
                // A file inside a JSON body is its base64 text.
                Ok(TypeRef::Download) => TypeRef::String,
                Ok(ty) => ty,
                Err(reference) => {
                    report.push(ResolutionError::UnknownReference {
                        owner: format!("definition {name}.{json_name}"),
                        reference,
                    });
                    TypeRef::Json
                }
            };
            let mut field = Field {
                json_name: json_name.clone(),
                name: unique_name(&mut seen, &snake_ident(json_name)),
                ty,
                optional: !required.contains(json_name.as_str()),
                flatten: false,
                doc: prop.description.clone(),
            };
            apply_field_override(&name, &mut field, overrides);
            field
        })
        .collect();

    Definition {
        id: id.to_string(),
        name,
        doc: raw.description.clone(),
        fields,
        is_tab: false,
    }
}

fn apply_field_override(definition: &str, field: &mut Field, overrides: &Overrides) {
    let Some(ovr) = overrides.field(definition, &field.json_name) else {
        return;
    };
    if let Some(ty) = &ovr.ty {
        field.ty = TypeRef::Custom(ty.clone());
    }
    if let Some(optional) = ovr.optional {
        field.optional = optional;
    }
    if let Some(doc) = &ovr.doc {
        field.doc = doc.clone();
    }
}

/// Build one tab definition and rewrite its sources to embed it.
///
/// Canonical fields are taken from the first source (in id order) that has
/// them, then patched with the field overrides keyed by the tab name.
fn synthesize_tab(
    spec: &TabSpec,
    by_id: &mut BTreeMap<String, Definition>,
    overrides: &Overrides,
    report: &mut ResolutionReport,
) -> Option<Definition> {
    let owner = format!("tab {}", spec.name);
    let mut sources: Vec<&String> = spec.sources.iter().collect();
    sources.sort();
    sources.dedup();

    let mut missing_source = false;
    for id in &sources {
        if !by_id.contains_key(id.as_str()) {
            report.push(ResolutionError::UnknownReference {
                owner: owner.clone(),
                reference: definition_ref(id),
            });
            missing_source = true;
        }
    }
    if missing_source {
        return None;
    }

    let canonical: BTreeSet<&str> = spec.fields.iter().map(String::as_str).collect();
    let mut fields = Vec::with_capacity(canonical.len());
    for json_name in &canonical {
        let found = sources.iter().find_map(|id| {
            by_id
                .get(id.as_str())?
                .fields
                .iter()
                .find(|f| f.json_name == *json_name)
                .cloned()
        });
        match found {
            Some(mut field) => {
                apply_field_override(&spec.name, &mut field, overrides);
                fields.push(field);
            }
            None => report.push(ResolutionError::MissingTabField {
                tab: spec.name.clone(),
                field: json_name.to_string(),
            }),
        }
    }

    for id in &sources {
        if let Some(def) = by_id.get_mut(id.as_str()) {
            def.fields.retain(|f| !canonical.contains(f.json_name.as_str()));
            let mut seen: BTreeSet<String> = def.fields.iter().map(|f| f.name.clone()).collect();
            def.fields.push(Field {
                json_name: String::new(),
                name: unique_name(&mut seen, &snake_ident(&spec.name)),
                ty: TypeRef::Named(spec.name.clone()),
                optional: false,
                flatten: true,
                doc: String::new(),
            });
        }
    }
    debug!(tab = %spec.name, sources = sources.len(), fields = fields.len(), "Synthesized tab definition");

    Some(Definition {
        id: format!("tab:{}", spec.name),
        name: spec.name.clone(),
        doc: spec.description.clone(),
        fields,
        is_tab: true,
    })
}

/// Tab names must not shadow a retained definition or another tab.
fn check_tab_names(tabs: &[Definition], retained: &[Definition], report: &mut ResolutionReport) {
    let mut taken: BTreeMap<&str, String> = retained
        .iter()
        .map(|d| (d.name.as_str(), format!("definition {}", d.id)))
        .collect();
    for tab in tabs {
        if let Some(existing) = taken.get(tab.name.as_str()) {
            report.push(ResolutionError::TabNameCollision {
                tab: tab.name.clone(),
                existing: existing.clone(),
            });
            continue;
        }
        taken.insert(&tab.name, format!("tab {}", tab.name));
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Done,
}

/// Box every field that closes a cycle of by-value definition references.
///
/// Lists and maps already allocate, so only direct `Named` fields are edges.
/// Edges are walked depth first in definition then field order, and each
/// back edge found is boxed, which leaves the remaining graph acyclic.
fn box_recursive_fields(definitions: &mut [Definition]) {
    let index: BTreeMap<String, usize> = definitions
        .iter()
        .enumerate()
        .map(|(i, d)| (d.name.clone(), i))
        .collect();
    let edges: Vec<Vec<(usize, usize)>> = definitions
        .iter()
        .map(|d| {
            d.fields
                .iter()
                .enumerate()
                .filter_map(|(f, field)| match &field.ty {
                    TypeRef::Named(target) => index.get(target).map(|&t| (f, t)),
                    _ => None,
                })
                .collect()
        })
        .collect();

    let mut state: Vec<Option<Visit>> = vec![None; definitions.len()];
    let mut back_edges = Vec::new();
    for start in 0..definitions.len() {
        if state[start].is_none() {
            visit(start, &edges, &mut state, &mut back_edges);
        }
    }

    for (def, field) in back_edges {
        let field = &mut definitions[def].fields[field];
        if let TypeRef::Named(target) = &field.ty {
            debug!(field = %field.name, %target, "Boxing recursive field");
            field.ty = TypeRef::Custom(format!("Box<{target}>"));
        }
    }
}

fn visit(
    node: usize,
    edges: &[Vec<(usize, usize)>],
    state: &mut [Option<Visit>],
    back_edges: &mut Vec<(usize, usize)>,
) {
    state[node] = Some(Visit::Open);
    for &(field, target) in &edges[node] {
        match state[target] {
            Some(Visit::Open) => back_edges.push((node, field)),
            Some(Visit::Done) => {}
            None => visit(target, edges, state, back_edges),
        }
    }
    state[node] = Some(Visit::Done);
}

/// Keep the first definition of each display name (ordered by `(name, id)`)
/// and map every id onto the retained one.
fn collapse_duplicates(mut all: Vec<Definition>) -> (Vec<Definition>, DefinitionMap) {
    all.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));

    let mut retained: Vec<Definition> = Vec::with_capacity(all.len());
    let mut aliases: Vec<(String, usize)> = Vec::with_capacity(all.len());
    for def in all {
        match retained.last() {
            Some(kept) if kept.name == def.name => {
                if kept.shape() != def.shape() {
                    warn!(
                        name = %def.name,
                        retained = %kept.id,
                        dropped = %def.id,
                        "Definitions share a name but differ in shape; keeping the first"
                    );
                }
                aliases.push((def.id, retained.len() - 1));
            }
            _ => {
                aliases.push((def.id.clone(), retained.len()));
                retained.push(def);
            }
        }
    }

    let map = aliases
        .into_iter()
        .map(|(id, idx)| (definition_ref(&id), retained[idx].clone()))
        .collect();
    (retained, map)
}

fn build_operations(raw: &[RawOperation], overrides: &Overrides) -> Vec<Operation> {
    let mut seen = BTreeSet::new();
    let mut operations = Vec::with_capacity(raw.len());
    for op in raw {
        if !seen.insert(op.operation_id.as_str()) {
            warn!(operation = %op.operation_id, path = %op.path, "Duplicate operation id; keeping the first");
            continue;
        }
        if let Some(op) = build_operation(op, overrides) {
            operations.push(op);
        }
    }
    operations.sort_by(|a, b| (&a.service, &a.id).cmp(&(&b.service, &b.id)));
    operations
}

fn build_operation(raw: &RawOperation, overrides: &Overrides) -> Option<Operation> {
    let method = match Method::from_bytes(raw.http_method.as_bytes()) {
        Ok(method) => method,
        Err(err) => {
            warn!(operation = %raw.operation_id, method = %raw.http_method, error = %err, "Unsupported HTTP method");
            return None;
        }
    };

    let parameters = raw
        .parameters
        .iter()
        .filter_map(|p| {
            let Some(location) = ParameterLocation::parse(&p.location) else {
                warn!(operation = %raw.operation_id, parameter = %p.name, location = %p.location, "Unknown parameter location");
                return None;
            };
            Some(Parameter {
                name: p.name.clone(),
                location,
                required: p.required || location == ParameterLocation::Path,
                schema: parameter_schema(p),
                doc: p.description.clone(),
            })
        })
        .collect();

    let responses = raw
        .responses
        .iter()
        .map(|(code, resp)| {
            let schema = resp.schema.as_ref().map(schema_from_raw).unwrap_or(Schema::Empty);
            (code.clone(), schema)
        })
        .collect();

    let sdk_method = if raw.method_name.is_empty() {
        raw.operation_id.clone()
    } else {
        raw.method_name.clone()
    };

    Some(Operation {
        id: raw.operation_id.clone(),
        service: raw.service.clone(),
        category: raw.category.clone(),
        sdk_method,
        doc_method: raw.doc_method.clone(),
        method,
        path: overrides.strip_account_prefix(&raw.path).to_string(),
        status: OperationStatus::parse(&raw.status),
        deprecated: raw.deprecated,
        summary: raw.summary.clone(),
        description: raw.description.clone(),
        parameters,
        responses,
    })
}
