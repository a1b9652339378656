//! `ValidatorResult` (§3.1) and the language enum validators are keyed by.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    TypeScript,
    Python,
    JavaScript,
    Go,
    Rust,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
        }
    }

    /// Quality threshold for this language (§4.4 table).
    pub fn threshold(&self) -> f64 {
        match self {
            Language::TypeScript => 0.90,
            Language::Python => 0.85,
            Language::JavaScript => 0.75,
            Language::Go => 0.85,
            Language::Rust => 0.85,
            Language::Java => 0.80,
        }
    }

    /// Fixed per-language timeout (§4.4 table).
    pub fn timeout(&self) -> std::time::Duration {
        let secs = match self {
            Language::TypeScript => 60,
            Language::Python => 60,
            Language::JavaScript => 60,
            Language::Go => 90,
            Language::Rust => 120,
            Language::Java => 180,
        };
        std::time::Duration::from_secs(secs)
    }
}

/// `{validator_name, language, ran, exit_code, stdout, stderr, error_count,
/// duration_ms, threshold_applied}` (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorResult {
    pub validator_name: String,
    pub language: Language,
    pub ran: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub error_count: u32,
    pub duration_ms: u64,
    pub threshold_applied: f64,
}

impl ValidatorResult {
    /// A validator passes when it ran, reported zero errors, and did not
    /// crash — zero errors with a non-zero exit is a pass-with-warning
    /// (§4.4 edge case), not a failure.
    pub fn passed(&self) -> bool {
        self.ran && self.error_count == 0
    }

    pub fn skipped(validator_name: impl Into<String>, language: Language, reason: &str) -> Self {
        Self {
            validator_name: validator_name.into(),
            language,
            ran: false,
            exit_code: None,
            stdout: String::new(),
            stderr: reason.to_string(),
            error_count: 0,
            duration_ms: 0,
            threshold_applied: language.threshold(),
        }
    }
}
