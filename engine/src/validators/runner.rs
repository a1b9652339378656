//! Shared subprocess-with-timeout helper, grounded on the coordination
//! pipeline's gate runner: new process group on Unix so the whole tree dies
//! on timeout, not just the direct child.

use std::path::Path;
use std::time::{Duration, Instant};

use tokio::process::Command;

pub struct RunOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

pub enum RunError {
    Timeout,
    Spawn(String),
}

pub async fn run_with_timeout(command: &str, args: &[&str], cwd: &Path, timeout: Duration) -> Result<RunOutcome, RunError> {
    let mut cmd = Command::new(command);
    cmd.args(args).current_dir(cwd).kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(RunOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: start.elapsed().as_millis() as u64,
        }),
        Ok(Err(e)) => Err(RunError::Spawn(e.to_string())),
        Err(_) => Err(RunError::Timeout),
    }
}

pub fn tool_on_path(tool: &str) -> bool {
    which::which(tool).is_ok()
}

use super::types::{Language, ValidatorResult};

/// A validator that started but hung past its timeout counts against
/// `build_validation_passed` (§4.6: "Timeout in a validator: record
/// failure") — unlike a missing tool, which is a degrade, not a failure, so
/// `ran` is `true` here even though the process never produced output.
pub fn timeout_result(validator_name: &str, language: Language, start: Instant) -> ValidatorResult {
    ValidatorResult {
        validator_name: validator_name.into(),
        language,
        ran: true,
        exit_code: None,
        stdout: String::new(),
        stderr: format!("timed out after {:?}", language.timeout()),
        error_count: 1,
        duration_ms: start.elapsed().as_millis() as u64,
        threshold_applied: language.threshold(),
    }
}

/// A tool crash (spawn failure once already confirmed present on PATH) is a
/// reportable failure, not a degrade (§7: "tool crash (report failure)").
pub fn crashed_result(validator_name: &str, language: Language, message: String, start: Instant) -> ValidatorResult {
    ValidatorResult {
        validator_name: validator_name.into(),
        language,
        ran: true,
        exit_code: None,
        stdout: String::new(),
        stderr: message,
        error_count: 1,
        duration_ms: start.elapsed().as_millis() as u64,
        threshold_applied: language.threshold(),
    }
}
