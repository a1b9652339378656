//! **Scenario S4** (§8): a run accumulates enough retriable research
//! failures to escalate to HITL and suspend; resuming with an operator
//! response clears the escalation and the pipeline completes normally.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use common::build_test_engine;
use kiagent_engine::workflow::{HitlOutcome, ProgressEvent, RunOutcome};

#[tokio::test]
async fn escalates_to_hitl_then_resumes_to_completion() {
    let workspace = tempfile::tempdir().unwrap();
    let failing = Arc::new(AtomicBool::new(true));
    let engine = build_test_engine(workspace.path(), "fake-research", failing.clone());

    let progress = Arc::new(|_event: ProgressEvent| {});
    let hitl = Arc::new(|_req: &kiagent_engine::state::HitlRequest| HitlOutcome::Deferred);

    let outcome = engine.run("s4", "build a hello-world HTTP handler", workspace.path().to_str().unwrap(), progress.clone(), hitl.clone()).await.unwrap();

    let RunOutcome::Suspended { session_id } = outcome else {
        panic!("expected the run to suspend for HITL after repeated research failures");
    };
    assert_eq!(session_id, "s4");

    // The operator investigates and tells the workflow to continue; the
    // upstream condition (here, our scripted failure) has since cleared.
    failing.store(false, std::sync::atomic::Ordering::SeqCst);

    let outcome = engine.resume("s4", Some("continue".to_string()), progress, hitl).await.unwrap();
    let RunOutcome::Completed(state) = outcome else {
        panic!("expected the resumed run to complete");
    };

    assert!(state.response_ready);
    assert!(!state.hitl_pending);
    assert_eq!(state.errors.len(), 3, "exactly the 3 failures that triggered escalation should be recorded");
    assert!(state.errors.iter().all(|e| e.kind == "provider_error" && e.retriable));
    assert_eq!(state.agent_history, vec!["research", "architect", "codesmith", "reviewfix", "responder"]);

    engine.cleanup().await.unwrap();
}
