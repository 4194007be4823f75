//! Common test utilities shared across integration tests.

use std::path::Path;
use std::process::{Command, Output};

/// Run the dodel binary in the specified directory with colors disabled.
pub fn run_dodel_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dodel"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute dodel binary")
}

/// Run a command that must succeed and return its stdout.
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_dodel_in_dir(dir, args);
    assert!(
        output.status.success(),
        "dodel {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run a command with `--json` and parse its output.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let stdout = run_ok(dir, &full);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

/// Submit a post and return its ID.
pub fn create_post(dir: &Path, author: &str, text: &str, parent: Option<&str>) -> String {
    let mut args = vec!["post", "--author", author, "--text", text];
    if let Some(parent) = parent {
        args.extend_from_slice(&["--parent", parent]);
    }
    let json = run_json(dir, &args);
    json["id"]
        .as_str()
        .expect("post output should carry an id")
        .to_string()
}
