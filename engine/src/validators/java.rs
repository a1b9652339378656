//! Java validator: Maven / Gradle / `javac`, in that priority (§4.4).

use std::path::Path;
use std::time::Instant;

use super::runner::{crashed_result, run_with_timeout, timeout_result, tool_on_path, RunError};
use super::types::{Language, ValidatorResult};

pub fn detect(files: &[std::path::PathBuf]) -> bool {
    files.iter().any(|p| p.extension().and_then(|e| e.to_str()) == Some("java"))
}

enum Driver {
    Maven,
    Gradle,
    Javac,
}

fn pick_driver(files: &[std::path::PathBuf]) -> Option<Driver> {
    let has = |name: &str| files.iter().any(|p| p.file_name().map(|n| n == name).unwrap_or(false));
    if has("pom.xml") && tool_on_path("mvn") {
        Some(Driver::Maven)
    } else if (has("build.gradle") || has("build.gradle.kts")) && tool_on_path("gradle") {
        Some(Driver::Gradle)
    } else if tool_on_path("javac") {
        Some(Driver::Javac)
    } else {
        None
    }
}

pub async fn run(workspace_path: &Path, files: &[std::path::PathBuf]) -> ValidatorResult {
    let language = Language::Java;
    let start = Instant::now();

    let driver = match pick_driver(files) {
        Some(d) => d,
        None => {
            tracing::warn!("no Maven/Gradle/javac available, skipping Java validation");
            return ValidatorResult::skipped("java", language, "no Maven, Gradle, or javac found on PATH");
        }
    };

    let outcome = match driver {
        Driver::Maven => run_with_timeout("mvn", &["-q", "compile"], workspace_path, language.timeout()).await,
        Driver::Gradle => run_with_timeout("gradle", &["compileJava"], workspace_path, language.timeout()).await,
        Driver::Javac => {
            let java_files: Vec<String> = files
                .iter()
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("java"))
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let args: Vec<&str> = java_files.iter().map(String::as_str).collect();
            run_with_timeout("javac", &args, workspace_path, language.timeout()).await
        }
    };

    match outcome {
        Ok(outcome) => {
            let error_count = outcome.stderr.lines().filter(|l| l.contains("error")).count() as u32;
            ValidatorResult {
                validator_name: "java".into(),
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
        Err(RunError::Timeout) => timeout_result("java", language, start),
        Err(RunError::Spawn(message)) => crashed_result("java", language, message, start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_java_files() {
        assert!(detect(&[std::path::PathBuf::from("Main.java")]));
        assert!(!detect(&[std::path::PathBuf::from("main.go")]));
    }
}
