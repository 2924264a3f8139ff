use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Environment variable naming the formatter binary.
pub const RUSTFMT_ENV: &str = "ESIGN_GEN_RUSTFMT";

/// Format one rendered module through `rustfmt`, reading stdin and emitting
/// to stdout, so the result can be compared with the file on disk before
/// anything is written.
pub fn format_source(source: &str) -> io::Result<String> {
    // Allow tests to override the rustfmt binary without mutating PATH
    let rustfmt = std::env::var(RUSTFMT_ENV).unwrap_or_else(|_| "rustfmt".to_string());

    let mut child = Command::new(rustfmt)
        .args(["--edition", "2021", "--emit", "stdout"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes())?;
    }
    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "rustfmt failed: {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    String::from_utf8(output.stdout).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
