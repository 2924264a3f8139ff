pub(crate) mod format;
mod generate;

pub use format::{format_source, RUSTFMT_ENV};
pub use generate::{emit_modules, EmitReport, OutputRoot, MODULE_FILE};
