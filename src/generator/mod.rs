//! # Generator Module
//!
//! Turns a DocuSign Swagger document into typed call-builder modules.
//!
//! ## Architecture
//!
//! ```text
//! Swagger → Loader → Model Builder → Reference Resolver → Grouping & Naming → Emitter
//!                          ↑                  ↑                   ↑
//!                          └──────── Override Engine ─────────────┘
//! ```
//!
//! 1. **Loader** - [`crate::spec::load_document`] decodes JSON or YAML
//! 2. **Model Builder** - [`crate::spec::build_model`] collapses duplicate
//!    definitions and synthesizes tab types
//! 3. **Exclusion** - [`plan_operations`] drops restricted, service-less and
//!    skipped operations
//! 4. **Reference Resolver** - [`crate::spec::resolve_operations`] turns
//!    parameters and responses into typed arguments and results
//! 5. **Grouping & Naming** - [`group_operations`] builds one
//!    [`ServiceGroup`] per service
//! 6. **Emitter** - [`emit_modules`] renders and atomically writes each module
//!
//! Resolution errors are collected across the whole document and returned
//! together; nothing is written when any are found.
//!
//! ## Generated Structure
//!
//! ```text
//! <output>/
//! ├── mod.rs          # declares every module below
//! ├── model/mod.rs    # all definitions
//! └── <package>/mod.rs  # one per service
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use esign_gen::generator::{generate, GenerateOptions};
//!
//! let options = GenerateOptions::new("esignature.json".into(), "src/gen".into());
//! let summary = generate(&options)?;
//! println!("{} module(s) written", summary.written.len());
//! ```

mod group;
pub mod naming;
mod project;
mod templates;


pub use group::{
    group_operations, plan_operations, Exclusion, ExclusionReason, NamedOperation, Plan,
    ServiceGroup, DOC_BASE_URL, FUTURE_NOTE,
};
pub use project::{emit_modules, format_source, EmitReport, OutputRoot, MODULE_FILE, RUSTFMT_ENV};
pub use templates::{
    model_template_data, render_mod_rs, service_imports, service_template_data, ModelTemplateData,
    ServiceTemplateData, TemplateSet, MODEL_TEMPLATE, SERVICE_TEMPLATE,
};

use std::path::PathBuf;

use tracing::{error, info};

use crate::error::{GenerateError, ResolutionReport};
use crate::overrides::Overrides;
use crate::spec::{build_model, load_document, resolve_operations, Document, Model};

/// Crate the generated modules import `Call`, `Credential` and friends from.
pub const DEFAULT_RUNTIME_CRATE: &str = "esign";

/// Inputs of one generator run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Swagger document (JSON or YAML)
    pub swagger_file: PathBuf,
    /// Output root; created if missing
    pub output: PathBuf,
    /// Directory holding replacement `service.rs.j2` and `model.rs.j2`
    pub template_dir: Option<PathBuf>,
    /// Override tables replacing the built-in ones
    pub overrides: Option<PathBuf>,
    pub runtime_crate: String,
    /// Leave the emitted files unformatted
    pub skip_format: bool,
}

impl GenerateOptions {
    pub fn new(swagger_file: PathBuf, output: PathBuf) -> Self {
        GenerateOptions {
            swagger_file,
            output,
            template_dir: None,
            overrides: None,
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            skip_format: false,
        }
    }
}

/// Everything the emitter needs, fully resolved.
#[derive(Debug)]
pub struct Prepared {
    pub model: Model,
    /// Sorted by service
    pub groups: Vec<ServiceGroup>,
    pub excluded: Vec<Exclusion>,
}

/// Run every stage up to emission.
///
/// Errors from model building stop the run before operations are resolved,
/// since operation types would only repeat them.
pub fn prepare(doc: &Document, overrides: &Overrides) -> Result<Prepared, ResolutionReport> {
    let model = build_model(doc, overrides)?;
    let plan = plan_operations(&model, overrides);
    let resolved = resolve_operations(
        plan.included.iter().map(|(op, service)| (*op, service.as_str())),
        &model,
        overrides,
    )?;
    let groups = group_operations(resolved, &model, overrides)?;
    let excluded = plan.excluded;
    Ok(Prepared {
        model,
        groups,
        excluded,
    })
}

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Files whose content changed
    pub written: Vec<PathBuf>,
    /// Files left untouched because they were already current
    pub unchanged: Vec<PathBuf>,
    /// Emitted service names, sorted
    pub services: Vec<String>,
    pub definitions: usize,
    pub excluded: Vec<Exclusion>,
}

fn log_report(report: &ResolutionReport) {
    for err in &report.errors {
        error!(%err, "Resolution error");
    }
}

/// Generate every module for `options`.
///
/// Load and override failures are fatal. Resolution errors are reported
/// together and nothing is written. A module that fails to emit does not
/// stop the others; the failures are returned once all are attempted.
pub fn generate(options: &GenerateOptions) -> Result<GenerationSummary, GenerateError> {
    let overrides = Overrides::resolve(options.overrides.as_deref())?;
    let doc = load_document(&options.swagger_file)?;
    info!(
        swagger = %options.swagger_file.display(),
        operations = doc.operations.len(),
        definitions = doc.definitions.len(),
        "Loaded Swagger document"
    );

    let prepared = prepare(&doc, &overrides).inspect_err(log_report)?;
    info!(
        services = prepared.groups.len(),
        excluded = prepared.excluded.len(),
        "Grouped operations"
    );

    let templates = match &options.template_dir {
        Some(dir) => TemplateSet::from_dir(dir)
            .map_err(|(path, source)| GenerateError::Templates { path, source })?,
        None => TemplateSet::default(),
    };
    let root = OutputRoot::prepare(&options.output)?;
    let report = emit_modules(
        &prepared,
        &overrides.custom_code,
        &templates,
        &root,
        &options.runtime_crate,
        !options.skip_format,
    );
    if !report.errors.is_empty() {
        for err in &report.errors {
            error!(%err, "Emission failed");
        }
        return Err(GenerateError::Emission(report.errors));
    }

    info!(
        output = %root.path().display(),
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        "Generation complete"
    );
    Ok(GenerationSummary {
        written: report.written,
        unchanged: report.unchanged,
        services: prepared.groups.iter().map(|g| g.service.clone()).collect(),
        definitions: prepared.model.definitions.len(),
        excluded: prepared.excluded,
    })
}
