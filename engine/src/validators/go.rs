//! Go validator: `go vet` then `go build -n` (§4.4).

use std::path::Path;
use std::time::Instant;

use super::runner::{crashed_result, run_with_timeout, timeout_result, tool_on_path, RunError};
use super::types::{Language, ValidatorResult};

pub fn detect(files: &[std::path::PathBuf]) -> bool {
    files.iter().any(|p| p.extension().and_then(|e| e.to_str()) == Some("go"))
}

pub async fn run(workspace_path: &Path) -> ValidatorResult {
    let language = Language::Go;
    let start = Instant::now();

    if !tool_on_path("go") {
        tracing::warn!("go not found on PATH, skipping Go validation");
        return ValidatorResult::skipped("go", language, "go not found on PATH");
    }

    let vet = match run_with_timeout("go", &["vet", "./..."], workspace_path, language.timeout()).await {
        Ok(outcome) => outcome,
        Err(RunError::Timeout) => return timeout_result("go", language, start),
        Err(RunError::Spawn(message)) => return crashed_result("go", language, message, start),
    };

    let mut error_count = vet.stderr.lines().filter(|l| !l.trim().is_empty()).count() as u32;
    let mut combined_stdout = vet.stdout.clone();
    let mut combined_stderr = vet.stderr.clone();
    let mut exit_code = vet.exit_code;

    if vet.exit_code == Some(0) {
        match run_with_timeout("go", &["build", "-n", "./..."], workspace_path, language.timeout()).await {
            Ok(build) => {
                if build.exit_code != Some(0) {
                    error_count += build.stderr.lines().filter(|l| !l.trim().is_empty()).count() as u32;
                }
                combined_stdout.push_str(&build.stdout);
                combined_stderr.push_str(&build.stderr);
                exit_code = build.exit_code;
            }
            Err(RunError::Timeout) => return timeout_result("go", language, start),
            Err(RunError::Spawn(message)) => return crashed_result("go", language, message, start),
        }
    }

    ValidatorResult {
        validator_name: "go".into(),
        language,
        ran: true,
        exit_code,
        stdout: combined_stdout,
        stderr: combined_stderr,
        error_count,
        duration_ms: start.elapsed().as_millis() as u64,
        threshold_applied: language.threshold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_go_files() {
        assert!(detect(&[std::path::PathBuf::from("main.go")]));
        assert!(!detect(&[std::path::PathBuf::from("main.py")]));
    }
}
