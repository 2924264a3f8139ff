use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::generator::{generate, prepare, GenerateOptions, Prepared, DEFAULT_RUNTIME_CRATE};
use crate::overrides::Overrides;
use crate::spec::load_document;

/// Command-line interface for esign-gen
#[derive(Debug, Parser)]
#[command(name = "esign-gen")]
#[command(version, about = "Generate typed DocuSign eSignature call builders", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the service and model modules from a Swagger document
    Generate(GenerateArgs),
    /// Show service groups and exclusions without writing anything
    Inspect {
        /// Path to the Swagger document (JSON or YAML)
        #[arg(short, long, env = "ESIGN_GEN_SWAGGER_FILE")]
        swagger_file: PathBuf,

        /// Override tables (TOML) used instead of the built-in ones
        #[arg(long, env = "ESIGN_GEN_OVERRIDES")]
        overrides: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Path to the Swagger document (JSON or YAML)
    #[arg(short, long, env = "ESIGN_GEN_SWAGGER_FILE")]
    pub swagger_file: PathBuf,

    /// Output root for the generated modules
    #[arg(short, long, env = "ESIGN_GEN_OUTPUT")]
    pub output: PathBuf,

    /// Directory holding replacement service.rs.j2 and model.rs.j2 templates
    #[arg(long, env = "ESIGN_GEN_TEMPLATES")]
    pub template_dir: Option<PathBuf>,

    /// Override tables (TOML) used instead of the built-in ones
    #[arg(long, env = "ESIGN_GEN_OVERRIDES")]
    pub overrides: Option<PathBuf>,

    /// Crate the generated code imports Call, Credential and Error from
    #[arg(long, default_value = DEFAULT_RUNTIME_CRATE)]
    pub runtime_crate: String,

    /// Leave the generated files unformatted
    #[arg(long, default_value_t = false)]
    pub skip_format: bool,
}

impl From<GenerateArgs> for GenerateOptions {
    fn from(args: GenerateArgs) -> Self {
        GenerateOptions {
            swagger_file: args.swagger_file,
            output: args.output,
            template_dir: args.template_dir,
            overrides: args.overrides,
            runtime_crate: args.runtime_crate,
            skip_format: args.skip_format,
        }
    }
}

/// Write a plain-text summary of `prepared` to `out`.
pub fn print_inspection<W: Write>(prepared: &Prepared, out: &mut W) -> io::Result<()> {
    for group in &prepared.groups {
        writeln!(
            out,
            "{} ({}): {} operation(s)",
            group.service,
            group.package,
            group.operations.len()
        )?;
        for named in &group.operations {
            let op = &named.resolved.operation;
            writeln!(
                out,
                "  {} -> {} {} [{}]",
                named.fn_name, op.method, op.path, op.id
            )?;
        }
    }
    if !prepared.excluded.is_empty() {
        writeln!(out, "excluded:")?;
        for exclusion in &prepared.excluded {
            writeln!(out, "  {} ({})", exclusion.operation, exclusion.reason)?;
        }
    }
    Ok(())
}

/// Execute a parsed command line
///
/// # Errors
///
/// Returns an error if:
/// - The Swagger document or override tables cannot be read or parsed
/// - References between the document and the override tables do not resolve
/// - One or more modules fail to render or write
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => {
            let options = GenerateOptions::from(args);
            let summary = generate(&options).with_context(|| {
                format!(
                    "failed to generate modules from {}",
                    options.swagger_file.display()
                )
            })?;
            println!(
                "{} service module(s), {} definition(s): {} written, {} unchanged, {} operation(s) excluded",
                summary.services.len(),
                summary.definitions,
                summary.written.len(),
                summary.unchanged.len(),
                summary.excluded.len()
            );
            Ok(())
        }
        Commands::Inspect {
            swagger_file,
            overrides,
        } => {
            let overrides = Overrides::resolve(overrides.as_deref())
                .context("failed to load override tables")?;
            let doc = load_document(&swagger_file)?;
            let prepared = prepare(&doc, &overrides)
                .with_context(|| format!("failed to resolve {}", swagger_file.display()))?;
            print_inspection(&prepared, &mut io::stdout().lock())?;
            Ok(())
        }
    }
}

/// Parse the process arguments and execute them.
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}
