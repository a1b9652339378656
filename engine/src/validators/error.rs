//! Validator error taxonomy (§7): tool missing degrades, timeout/crash
//! report failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("{tool} not found on PATH")]
    ToolMissing { tool: String },

    #[error("{validator_name} timed out after {timeout_secs}s")]
    Timeout { validator_name: String, timeout_secs: u64 },

    #[error("{validator_name} crashed: {message}")]
    Crashed { validator_name: String, message: String },
}
