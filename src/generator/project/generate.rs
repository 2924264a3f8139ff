use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{EmissionError, EmissionErrorKind, GenerateError};
use crate::generator::naming::MODEL_PACKAGE;
use crate::generator::project::format::format_source;
use crate::generator::templates::{
    model_template_data, render_mod_rs, service_template_data, TemplateSet,
};
use crate::generator::Prepared;

/// File every generated module is written to, inside its own directory.
pub const MODULE_FILE: &str = "mod.rs";

/// Directory all generated files are confined to.
#[derive(Debug, Clone)]
pub struct OutputRoot {
    root: PathBuf,
}

impl OutputRoot {
    /// Create the directory if needed and pin its canonical location.
    pub fn prepare(path: &Path) -> Result<Self, GenerateError> {
        let prepare_err = |source| GenerateError::OutputRoot {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(path).map_err(prepare_err)?;
        let root = fs::canonicalize(path).map_err(prepare_err)?;
        Ok(OutputRoot { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Map a relative path under the root. Anything but plain components
    /// (`..`, absolute paths, prefixes) is rejected.
    pub fn map_path(&self, relative: &Path) -> Result<PathBuf, EmissionErrorKind> {
        let mut pb = self.root.clone();
        for comp in relative.components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return Err(EmissionErrorKind::OutsideRoot(relative.to_path_buf())),
            }
        }
        if pb == self.root {
            return Err(EmissionErrorKind::OutsideRoot(relative.to_path_buf()));
        }
        Ok(pb)
    }

    /// Path of the file for module `module`.
    pub fn module_path(&self, module: &str) -> Result<PathBuf, EmissionErrorKind> {
        self.map_path(&Path::new(module).join(MODULE_FILE))
    }

    /// Replace `relative` with `content` atomically.
    ///
    /// The content goes to a temporary file in the destination directory
    /// which is then persisted over the destination, so a reader sees either
    /// the old or the new file. Unchanged files are left alone. Returns the
    /// destination and whether it was written.
    pub fn write(&self, relative: &Path, content: &str) -> Result<(PathBuf, bool), EmissionErrorKind> {
        let dest = self.map_path(relative)?;
        if fs::read_to_string(&dest).is_ok_and(|existing| existing == content) {
            debug!(path = %dest.display(), "Unchanged, not rewriting");
            return Ok((dest, false));
        }
        let dir = dest
            .parent()
            .ok_or_else(|| EmissionErrorKind::OutsideRoot(relative.to_path_buf()))?;
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| e.error)?;
        Ok((dest, true))
    }
}

/// Outcome of writing every module.
#[derive(Debug, Default)]
pub struct EmitReport {
    /// Files whose content changed
    pub written: Vec<PathBuf>,
    /// Files already up to date
    pub unchanged: Vec<PathBuf>,
    pub errors: Vec<EmissionError>,
}

impl EmitReport {
    fn record(&mut self, module: &str, result: Result<(PathBuf, bool), EmissionErrorKind>) {
        match result {
            Ok((path, true)) => {
                info!(module, path = %path.display(), "Generated module");
                self.written.push(path);
            }
            Ok((path, false)) => self.unchanged.push(path),
            Err(kind) => self.errors.push(EmissionError::new(module, kind)),
        }
    }

    /// Every file the run produced, changed or not.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.written.iter().chain(self.unchanged.iter())
    }
}

/// Run the formatter over rendered source when enabled. A formatter failure
/// leaves the source as rendered.
fn formatted(module: &str, content: String, format: bool) -> String {
    if !format {
        return content;
    }
    match format_source(&content) {
        Ok(out) => out,
        Err(e) => {
            warn!(module, error = %e, "Formatting generated module failed");
            content
        }
    }
}

fn render_and_write<F>(
    root: &OutputRoot,
    module: &str,
    format: bool,
    render: F,
) -> Result<(PathBuf, bool), EmissionErrorKind>
where
    F: FnOnce() -> Result<String, EmissionErrorKind>,
{
    let content = formatted(module, render()?, format);
    root.write(&Path::new(module).join(MODULE_FILE), &content)
}

/// Render and write the definitions module, every service module and the
/// root index. A failing module is recorded and the rest are still written.
///
/// With `format` set each module is formatted before it is compared with
/// the file on disk, so an identical rerun leaves every file unchanged.
pub fn emit_modules(
    prepared: &Prepared,
    custom_code: &str,
    templates: &TemplateSet,
    root: &OutputRoot,
    runtime_crate: &str,
    format: bool,
) -> EmitReport {
    let mut report = EmitReport::default();

    let result = render_and_write(root, MODEL_PACKAGE, format, || {
        let data = model_template_data(&prepared.model.definitions, custom_code);
        Ok(templates.render_model(&data)?)
    });
    report.record(MODEL_PACKAGE, result);

    for group in &prepared.groups {
        let result = render_and_write(root, &group.package, format, || {
            let data = service_template_data(group, runtime_crate);
            Ok(templates.render_service(&data)?)
        });
        report.record(&group.package, result);
    }

    let mut modules: Vec<String> = prepared.groups.iter().map(|g| g.package.clone()).collect();
    modules.push(MODEL_PACKAGE.to_string());
    modules.sort();
    let result = render_mod_rs(&modules)
        .and_then(|content| root.write(Path::new(MODULE_FILE), &formatted("mod", content, format)));
    report.record("mod", result);

    report
}
