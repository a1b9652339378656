//! **Scenario S1** (§8): a clean run through Research → Architect →
//! Codesmith → ReviewFix → Responder, with no failures and a single
//! reviewer pass, ends with a response and a file written to the
//! workspace.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use common::build_test_engine;
use kiagent_engine::workflow::{HitlOutcome, ProgressEvent, RunOutcome};

#[tokio::test]
async fn full_pipeline_completes_without_hitl_or_retries() {
    let workspace = tempfile::tempdir().unwrap();
    let engine = build_test_engine(workspace.path(), "fake-research", Arc::new(AtomicBool::new(false)));

    let progress = Arc::new(|_event: ProgressEvent| {});
    let hitl = Arc::new(|_req: &kiagent_engine::state::HitlRequest| HitlOutcome::Deferred);

    let outcome = engine.run("s1", "build a hello-world HTTP handler", workspace.path().to_str().unwrap(), progress, hitl).await.unwrap();

    let RunOutcome::Completed(state) = outcome else {
        panic!("expected the pipeline to complete without suspending");
    };

    assert!(state.response_ready);
    assert!(state.errors.is_empty());
    assert_eq!(state.agent_history, vec!["research", "architect", "codesmith", "reviewfix", "responder"]);
    assert!(state.build_validation_passed);
    assert!(state.last_quality_score >= state.quality_threshold);

    let written = workspace.path().join("src/greeting.rs");
    assert!(written.exists(), "codesmith's file should have been written via the fake MCP server");
    assert!(std::fs::read_to_string(written).unwrap().contains("pub fn greeting"));

    engine.cleanup().await.unwrap();
}
