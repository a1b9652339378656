//! TypeScript validator: `tsc --noEmit` (§4.4).

use std::path::Path;
use std::time::Instant;

use super::runner::{crashed_result, run_with_timeout, timeout_result, tool_on_path, RunError};
use super::types::{Language, ValidatorResult};

pub fn detect(files: &[std::path::PathBuf]) -> bool {
    let has_ts = files.iter().any(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("ts") | Some("tsx")));
    let has_tsconfig = files.iter().any(|p| p.file_name().map(|n| n == "tsconfig.json").unwrap_or(false));
    let has_package_json = files.iter().any(|p| p.file_name().map(|n| n == "package.json").unwrap_or(false));
    has_ts && has_tsconfig && has_package_json
}

pub async fn run(workspace_path: &Path) -> ValidatorResult {
    let language = Language::TypeScript;
    let start = Instant::now();

    if !tool_on_path("tsc") {
        tracing::warn!("tsc not found on PATH, skipping TypeScript validation");
        return ValidatorResult::skipped("typescript", language, "tsc not found on PATH");
    }

    match run_with_timeout("tsc", &["--noEmit"], workspace_path, language.timeout()).await {
        Ok(outcome) => {
            let error_count = count_tsc_errors(&outcome.stdout);
            ValidatorResult {
                validator_name: "typescript".into(),
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
        Err(RunError::Timeout) => timeout_result("typescript", language, start),
        Err(RunError::Spawn(message)) => crashed_result("typescript", language, message, start),
    }
}

fn count_tsc_errors(stdout: &str) -> u32 {
    stdout.lines().filter(|l| l.contains("error TS")).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_requires_ts_files_and_project_config() {
        let with_all = vec![std::path::PathBuf::from("src/index.ts"), std::path::PathBuf::from("tsconfig.json"), std::path::PathBuf::from("package.json")];
        assert!(detect(&with_all));

        let missing_tsconfig = vec![std::path::PathBuf::from("src/index.ts"), std::path::PathBuf::from("package.json")];
        assert!(!detect(&missing_tsconfig));
    }

    #[test]
    fn count_tsc_errors_counts_error_lines() {
        let stdout = "src/a.ts(1,1): error TS2304: Cannot find name 'x'.\nsrc/b.ts(2,2): error TS2345: bad arg.\n";
        assert_eq!(count_tsc_errors(stdout), 2);
    }
}
