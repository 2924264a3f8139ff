//! # CLI Module
//!
//! Command-line front end of the `esign-gen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate every call-builder module from a Swagger document:
//!
//! ```bash
//! esign-gen generate --swagger-file esignature.json --output src/gen
//! ```
//!
//! Options:
//! - `--swagger-file/-s <FILE>` - Swagger document, JSON or YAML (`ESIGN_GEN_SWAGGER_FILE`)
//! - `--output/-o <DIR>` - Output root (`ESIGN_GEN_OUTPUT`)
//! - `--template-dir <DIR>` - Replacement `service.rs.j2`/`model.rs.j2` (`ESIGN_GEN_TEMPLATES`)
//! - `--overrides <FILE>` - Override tables replacing the built-in ones (`ESIGN_GEN_OVERRIDES`)
//! - `--runtime-crate <NAME>` - Crate the generated code imports (default: `esign`)
//! - `--skip-format` - Do not run `rustfmt` on the output
//!
//! ### `inspect`
//!
//! Print the service groups and excluded operations without writing anything:
//!
//! ```bash
//! esign-gen inspect --swagger-file esignature.json
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use esign_gen::cli::{run, Cli};
//! use clap::Parser;
//!
//! run(Cli::parse())?;
//! ```

mod commands;


pub use commands::{print_inspection, run, run_cli, Cli, Commands, GenerateArgs};
