//! Workflow Engine (C7, §4.8): compiles the graph, runs nodes to
//! completion, persists checkpoints, streams progress, handles HITL
//! suspend/resume.
//!
//! A single `Engine` owns the config, the MCP client, the memory store
//! handle, and the provider registry (§9 design note: no global singletons).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;

use crate::agents::{ArchitectNode, CodesmithNode, ResearchNode, ResponderNode, ReviewFixNode};
use crate::checkpoint::{Checkpointer, RunnableConfig};
use crate::error::AgentError;
use crate::graph::{CompiledStateGraph, StateGraph, START};
use crate::llm::ProviderRegistry;
use crate::mcp::McpClient;
use crate::memory::Store;
use crate::state::{HitlRequest, WorkflowState};
use crate::supervisor::{resolve_route, SupervisorConfig, SupervisorNode, SUPERVISOR_NODE_ID};

use super::events::ProgressEvent;

/// Synchronous response, or "come back later" (§4.8 HITL contract).
pub enum HitlOutcome {
    Respond(String),
    Deferred,
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
pub type HitlCallback = Arc<dyn Fn(&HitlRequest) -> HitlOutcome + Send + Sync>;

#[derive(Debug)]
pub enum RunOutcome {
    Completed(WorkflowState),
    Suspended { session_id: String },
}

pub struct Engine {
    graph: CompiledStateGraph<WorkflowState>,
    checkpointer: Arc<dyn Checkpointer<WorkflowState>>,
    mcp: Arc<McpClient>,
    cancellation_flags: std::sync::Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl Engine {
    pub fn new(
        provider_registry: Arc<ProviderRegistry>,
        mcp: Arc<McpClient>,
        memory: Arc<dyn Store>,
        checkpointer: Arc<dyn Checkpointer<WorkflowState>>,
        supervisor_config: SupervisorConfig,
        file_server: impl Into<String>,
    ) -> Result<Self, AgentError> {
        let file_server = file_server.into();
        let research = Arc::new(ResearchNode { provider_registry: provider_registry.clone(), memory: memory.clone() });
        let architect = Arc::new(ArchitectNode { provider_registry: provider_registry.clone(), memory: memory.clone() });
        let codesmith = Arc::new(CodesmithNode { provider_registry: provider_registry.clone(), mcp: mcp.clone(), file_server: file_server.clone() });
        let review_fix = Arc::new(ReviewFixNode { provider_registry: provider_registry.clone(), mcp: mcp.clone(), file_server: file_server.clone() });
        let responder = Arc::new(ResponderNode { provider_registry: provider_registry.clone() });
        let supervisor = Arc::new(SupervisorNode { config: supervisor_config.clone() });

        let route_config = Arc::new(supervisor_config);
        let router_fn: crate::graph::ConditionalRouterFn<WorkflowState> = Arc::new(move |state: &WorkflowState| resolve_route(state, &route_config));

        let mut graph = StateGraph::new();
        graph.add_node("research", research);
        graph.add_node("architect", architect);
        graph.add_node("codesmith", codesmith);
        graph.add_node("reviewfix", review_fix);
        graph.add_node("responder", responder);
        graph.add_node(SUPERVISOR_NODE_ID, supervisor);

        graph.add_edge(START, SUPERVISOR_NODE_ID);
        graph.add_edge("research", SUPERVISOR_NODE_ID);
        graph.add_edge("architect", SUPERVISOR_NODE_ID);
        graph.add_edge("codesmith", SUPERVISOR_NODE_ID);
        graph.add_edge("reviewfix", SUPERVISOR_NODE_ID);
        graph.add_edge("responder", SUPERVISOR_NODE_ID);
        graph.add_conditional_edges(SUPERVISOR_NODE_ID, router_fn, None);

        let compiled = graph.compile_with_checkpointer(checkpointer.clone()).map_err(|e| AgentError::Invariant(e.to_string()))?;

        Ok(Self { graph: compiled, checkpointer, mcp, cancellation_flags: std::sync::Mutex::new(HashMap::new()) })
    }

    /// `run(session_id, user_query, workspace_path, progress_callback,
    /// hitl_callback) → final_state` (§4.8).
    pub async fn run(
        &self,
        session_id: &str,
        user_query: &str,
        workspace_path: &str,
        progress: ProgressCallback,
        hitl: HitlCallback,
    ) -> Result<RunOutcome, AgentError> {
        let initial_state = WorkflowState::new(session_id, workspace_path, user_query);
        let config = RunnableConfig::for_thread(session_id);
        self.drive(initial_state, config, progress, hitl).await
    }

    /// `resume(session_id, hitl_response?) → final_state` (§4.8). Requires a
    /// checkpoint to already exist for `session_id`.
    pub async fn resume(
        &self,
        session_id: &str,
        hitl_response: Option<String>,
        progress: ProgressCallback,
        hitl: HitlCallback,
    ) -> Result<RunOutcome, AgentError> {
        let mut config = RunnableConfig::for_thread(session_id);
        let tuple = self
            .checkpointer
            .get_tuple(&config)
            .await?
            .ok_or_else(|| AgentError::Invariant(format!("no checkpoint found for session {session_id}")))?;

        let mut state = tuple.checkpoint.channel_values;
        if let Some(response) = hitl_response {
            state.hitl_response = Some(response);
        }
        config.resume_from_node_id = Some(SUPERVISOR_NODE_ID.to_string());

        self.drive(state, config, progress, hitl).await
    }

    /// Sets the cancellation flag for `session_id`; in-flight suspension
    /// points observe it and surface `AgentError::Cancelled` (§4.8, §5).
    pub fn cancel(&self, session_id: &str) {
        if let Some(flag) = self.cancellation_flags.lock().unwrap().get(session_id) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Terminates MCP subprocesses and closes handles (§4.8).
    pub async fn cleanup(&self) -> Result<(), AgentError> {
        self.mcp.close().await?;
        Ok(())
    }

    fn drive(
        &self,
        initial_state: WorkflowState,
        config: RunnableConfig,
        progress: ProgressCallback,
        hitl: HitlCallback,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<RunOutcome, AgentError>> + Send + '_>> {
        Box::pin(async move {
            let session_id = initial_state.session_id.clone();
            let cancel_flag = self
                .cancellation_flags
                .lock()
                .unwrap()
                .entry(session_id.clone())
                .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                .clone();

            let step_progress = progress.clone();
            let observer: crate::graph::StepObserver<WorkflowState> = Arc::new(move |node_id, state: &WorkflowState| {
                step_progress(ProgressEvent::AgentComplete {
                    session_id: state.session_id.clone(),
                    node_id: node_id.to_string(),
                    state_snapshot: json!({ "last_quality_score": state.last_quality_score, "response_ready": state.response_ready }),
                });
            });

            let final_state = match self.graph.invoke(initial_state, &config, Some(observer), Some(cancel_flag.clone())).await {
                Ok(state) => state,
                Err(AgentError::Cancelled) => {
                    self.cancellation_flags.lock().unwrap().remove(&session_id);
                    return Ok(RunOutcome::Suspended { session_id });
                }
                Err(e) => return Err(e),
            };
            self.cancellation_flags.lock().unwrap().remove(&session_id);

            if final_state.hitl_pending && final_state.hitl_response.is_none() {
                if let Some(request) = final_state.hitl_request.clone() {
                    progress(ProgressEvent::HitlRequest {
                        session_id: session_id.clone(),
                        prompt: request.prompt.clone(),
                        options: request.options.clone(),
                    });
                    return match hitl(&request) {
                        HitlOutcome::Respond(response) => {
                            let mut resumed_config = config;
                            resumed_config.resume_from_node_id = Some(SUPERVISOR_NODE_ID.to_string());
                            let mut resumed_state = final_state;
                            resumed_state.hitl_response = Some(response);
                            self.drive(resumed_state, resumed_config, progress, hitl).await
                        }
                        HitlOutcome::Deferred => Ok(RunOutcome::Suspended { session_id }),
                    };
                }
                return Ok(RunOutcome::Suspended { session_id });
            }

            progress(ProgressEvent::WorkflowComplete { session_id, response_ready: final_state.response_ready });
            Ok(RunOutcome::Completed(final_state))
        })
    }
}
