//! Rust validator: `cargo check`, then `cargo clippy` (§4.4).
//!
//! Named `rust_lang` (not `rust`) to avoid shadowing the `rust` language
//! variant when imported alongside `types::Language`.

use std::path::Path;
use std::time::Instant;

use super::runner::{crashed_result, run_with_timeout, timeout_result, tool_on_path, RunError};
use super::types::{Language, ValidatorResult};

pub fn detect(files: &[std::path::PathBuf]) -> bool {
    let has_rs = files.iter().any(|p| p.extension().and_then(|e| e.to_str()) == Some("rs"));
    let has_cargo_toml = files.iter().any(|p| p.file_name().map(|n| n == "Cargo.toml").unwrap_or(false));
    has_rs && has_cargo_toml
}

pub async fn run(workspace_path: &Path) -> ValidatorResult {
    let language = Language::Rust;
    let start = Instant::now();

    if !tool_on_path("cargo") {
        tracing::warn!("cargo not found on PATH, skipping Rust validation");
        return ValidatorResult::skipped("rust", language, "cargo not found on PATH");
    }

    let check = match run_with_timeout("cargo", &["check", "--message-format=short"], workspace_path, language.timeout()).await {
        Ok(outcome) => outcome,
        Err(RunError::Timeout) => return timeout_result("rust", language, start),
        Err(RunError::Spawn(message)) => return crashed_result("rust", language, message, start),
    };

    let mut error_count = check.stderr.lines().filter(|l| l.contains("error")).count() as u32;
    let mut stdout = check.stdout;
    let mut stderr = check.stderr;
    let mut exit_code = check.exit_code;

    if exit_code == Some(0) {
        match run_with_timeout("cargo", &["clippy", "--message-format=short"], workspace_path, language.timeout()).await {
            Ok(clippy) => {
                error_count += clippy.stderr.lines().filter(|l| l.contains("error")).count() as u32;
                stdout.push_str(&clippy.stdout);
                stderr.push_str(&clippy.stderr);
                exit_code = clippy.exit_code;
            }
            Err(RunError::Timeout) => return timeout_result("rust", language, start),
            Err(RunError::Spawn(message)) => return crashed_result("rust", language, message, start),
        }
    }

    ValidatorResult {
        validator_name: "rust".into(),
        language,
        ran: true,
        exit_code,
        stdout,
        stderr,
        error_count,
        duration_ms: start.elapsed().as_millis() as u64,
        threshold_applied: language.threshold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_requires_rs_files_and_cargo_toml() {
        let with_manifest = vec![std::path::PathBuf::from("src/main.rs"), std::path::PathBuf::from("Cargo.toml")];
        assert!(detect(&with_manifest));
        assert!(!detect(&[std::path::PathBuf::from("src/main.rs")]));
    }
}
