//! # esign-gen
//!
//! **esign-gen** reads the DocuSign eSignature REST API Swagger document and
//! writes typed Rust call-builder modules: one module per API service plus a
//! shared module of data definitions.
//!
//! ## Overview
//!
//! The published document is not directly usable for code generation. It
//! repeats definitions under different identifiers, describes dozens of tab
//! types that share most of their fields, publishes uploads and downloads
//! without usable schemas and leaves some operations without a service. A
//! hand-maintained override table corrects all of that, and every mismatch
//! between the table and the document is reported rather than defaulted.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Swagger loading, the definition model and reference resolution
//! - **[`overrides`]** - Override tables (built-in DocuSign table or a user file)
//! - **[`generator`]** - Grouping, naming, template rendering and atomic output
//! - **[`cli`]** - The `esign-gen` command line
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`error`]** - Error types for every stage
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(esign-gen)
//!     participant Load as spec::load_document
//!     participant Build as spec::build_model
//!     participant Resolve as spec::resolve_operations
//!     participant Group as generator::group_operations
//!     participant Emit as generator::emit_modules
//!     participant FS as File System
//!
//!     CLI->>Load: load_document("esignature.json")
//!     Load-->>CLI: Document (fixups applied)
//!     CLI->>Build: build_model(&doc, &overrides)
//!     Build-->>CLI: Model (duplicates collapsed, tabs synthesized)
//!     CLI->>Resolve: resolve_operations(included, &model, &overrides)
//!     Resolve-->>CLI: Vec<ResolvedOperation> or ResolutionReport
//!     CLI->>Group: group_operations(resolved, &model, &overrides)
//!     Group-->>CLI: Vec<ServiceGroup>
//!     CLI->>Emit: emit_modules(&prepared, .., &root)
//!     Emit->>FS: model/mod.rs, <package>/mod.rs, mod.rs
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! esign-gen generate --swagger-file esignature.json --output src/gen
//! ```
//!
//! The generated code targets a runtime crate (default `esign`) providing
//! `Call`, `Credential`, `Error`, `Method`, `UploadFile` and `Download`:
//!
//! ```rust,ignore
//! let envelopes = envelopes::Service::new(credential);
//! let envelope = envelopes
//!     .get(&envelope_id)
//!     .include("recipients")
//!     .execute()
//!     .await?;
//! ```

pub mod cli;
pub mod error;
pub mod generator;
pub mod logging;
pub mod overrides;
pub mod spec;

pub use error::{EmissionError, GenerateError, LoadError, OverridesError, ResolutionError, ResolutionReport};
pub use generator::{generate, GenerateOptions, GenerationSummary};
pub use overrides::Overrides;
