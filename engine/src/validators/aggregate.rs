//! Polyglot aggregation (§4.4): run every detected language's validator,
//! require conjunction of passes, apply the max of matched thresholds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::ValidatorResult;
use super::{go, java, javascript, python, rust_lang, typescript};

/// Fallback threshold when no supported language is detected (§4.4, §8 S3).
pub const NO_LANGUAGE_THRESHOLD: f64 = 0.75;

pub struct AggregateResult {
    pub results: Vec<ValidatorResult>,
    pub build_validation_passed: bool,
    pub threshold_applied: f64,
}

/// Runs every validator whose language is detected among `files`, in
/// parallel. Missing tools degrade (`ran=false`) and are excluded from the
/// pass conjunction, not treated as failures.
pub async fn run_all(workspace_path: &Path, files: &[PathBuf]) -> AggregateResult {
    let mut futures: Vec<std::pin::Pin<Box<dyn std::future::Future<Output = ValidatorResult> + Send>>> = Vec::new();

    if typescript::detect(files) {
        futures.push(Box::pin(typescript::run(workspace_path)));
    }
    if python::detect(files) {
        futures.push(Box::pin(python::run(workspace_path)));
    }
    if javascript::detect(files) {
        futures.push(Box::pin(javascript::run(workspace_path)));
    }
    if go::detect(files) {
        futures.push(Box::pin(go::run(workspace_path)));
    }
    if rust_lang::detect(files) {
        futures.push(Box::pin(rust_lang::run(workspace_path)));
    }
    if java::detect(files) {
        let files = files.to_vec();
        futures.push(Box::pin(async move { java::run(workspace_path, &files).await }));
    }

    if futures.is_empty() {
        return AggregateResult { results: Vec::new(), build_validation_passed: true, threshold_applied: NO_LANGUAGE_THRESHOLD };
    }

    let results = futures::future::join_all(futures).await;
    let threshold_applied = results.iter().map(|r| r.threshold_applied).fold(0.0_f64, f64::max);
    let build_validation_passed = results.iter().filter(|r| r.ran).all(|r| r.passed());

    AggregateResult { results, build_validation_passed, threshold_applied }
}

/// Merges validator results into `WorkflowState.build_errors` shape
/// (validator_name → error text), per §3.1.
pub fn to_build_errors(results: &[ValidatorResult]) -> HashMap<String, String> {
    results
        .iter()
        .filter(|r| r.ran && !r.passed())
        .map(|r| (r.validator_name.clone(), r.stderr.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a workspace with no recognizable source files runs no
    /// validators and falls back to the 0.75 threshold (§8 S3).
    #[tokio::test]
    async fn run_all_with_no_files_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        let aggregate = run_all(dir.path(), &[]).await;
        assert!(aggregate.results.is_empty());
        assert!(aggregate.build_validation_passed);
        assert_eq!(aggregate.threshold_applied, NO_LANGUAGE_THRESHOLD);
    }
}
