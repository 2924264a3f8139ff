#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use esign_gen::generator::GenerateOptions;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A scratch directory holding one Swagger document.
pub struct TempSpec {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempSpec {
    pub fn json(value: &serde_json::Value) -> Self {
        Self::write("esignature.json", &serde_json::to_string_pretty(value).unwrap())
    }

    pub fn yaml(content: &str) -> Self {
        Self::write("esignature.yaml", content)
    }

    pub fn write(name: &str, content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        TempSpec { dir, path }
    }

    /// Write an override table next to the document.
    pub fn overrides(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("overrides.toml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Options generating into `<dir>/<output>` without formatting.
    pub fn options(&self, output: &str) -> GenerateOptions {
        let mut options = GenerateOptions::new(self.path.clone(), self.dir.path().join(output));
        options.skip_format = true;
        options
    }
}

/// Options for the mini eSignature fixture with the built-in tables.
pub fn mini_options(out: &Path) -> GenerateOptions {
    let mut options = GenerateOptions::new(fixture("esignature_mini.json"), out.to_path_buf());
    options.skip_format = true;
    options
}

/// Read `<root>/<module>/mod.rs`, or the root index for `""`.
pub fn read_module(root: &Path, module: &str) -> String {
    let path = if module.is_empty() {
        root.join("mod.rs")
    } else {
        root.join(module).join("mod.rs")
    };
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}
