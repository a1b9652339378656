//! JavaScript validator: `eslint` (§4.4). Exit 0 success, 1 lint errors, 2
//! fatal (config/parse error) — only exit 2 is treated as a crash.

use std::path::Path;
use std::time::Instant;

use super::runner::{crashed_result, run_with_timeout, timeout_result, tool_on_path, RunError};
use super::types::{Language, ValidatorResult};

pub fn detect(files: &[std::path::PathBuf]) -> bool {
    files.iter().any(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("js") | Some("jsx"))) && !super::typescript::detect(files)
}

pub async fn run(workspace_path: &Path) -> ValidatorResult {
    let language = Language::JavaScript;
    let start = Instant::now();

    if !tool_on_path("eslint") {
        tracing::warn!("eslint not found on PATH, skipping JavaScript validation");
        return ValidatorResult::skipped("javascript", language, "eslint not found on PATH");
    }

    match run_with_timeout("eslint", &["."], workspace_path, language.timeout()).await {
        Ok(outcome) => {
            if outcome.exit_code == Some(2) {
                return crashed_result("javascript", language, format!("eslint fatal error:\n{}", outcome.stderr), start);
            }
            let error_count = outcome.stdout.lines().filter(|l| l.contains("error")).count() as u32;
            ValidatorResult {
                validator_name: "javascript".into(),
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
        Err(RunError::Timeout) => timeout_result("javascript", language, start),
        Err(RunError::Spawn(message)) => crashed_result("javascript", language, message, start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_excludes_typescript_projects() {
        let js_only = vec![std::path::PathBuf::from("index.js")];
        assert!(detect(&js_only));

        let ts_project = vec![std::path::PathBuf::from("index.js"), std::path::PathBuf::from("app.ts"), std::path::PathBuf::from("tsconfig.json"), std::path::PathBuf::from("package.json")];
        assert!(!detect(&ts_project));
    }
}
