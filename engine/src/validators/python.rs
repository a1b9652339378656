//! Python validator: `mypy --ignore-missing-imports --no-strict-optional`
//! (§4.4); degrades with a warning when mypy is absent.

use std::path::Path;
use std::time::Instant;

use super::runner::{crashed_result, run_with_timeout, timeout_result, tool_on_path, RunError};
use super::types::{Language, ValidatorResult};

pub fn detect(files: &[std::path::PathBuf]) -> bool {
    files.iter().any(|p| p.extension().and_then(|e| e.to_str()) == Some("py"))
}

pub async fn run(workspace_path: &Path) -> ValidatorResult {
    let language = Language::Python;
    let start = Instant::now();

    if !tool_on_path("mypy") {
        tracing::warn!("mypy not found on PATH, skipping Python validation");
        return ValidatorResult::skipped("python", language, "mypy not found on PATH");
    }

    match run_with_timeout("mypy", &["--ignore-missing-imports", "--no-strict-optional", "."], workspace_path, language.timeout()).await {
        Ok(outcome) => {
            let error_count = outcome.stdout.lines().filter(|l| l.contains(": error:")).count() as u32;
            ValidatorResult {
                validator_name: "python".into(),
                language,
                ran: true,
                exit_code: outcome.exit_code,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
                error_count,
                duration_ms: outcome.duration_ms,
                threshold_applied: language.threshold(),
            }
        }
        Err(RunError::Timeout) => timeout_result("python", language, start),
        Err(RunError::Spawn(message)) => crashed_result("python", language, message, start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_py_files() {
        assert!(detect(&[std::path::PathBuf::from("main.py")]));
        assert!(!detect(&[std::path::PathBuf::from("main.rs")]));
    }
}
