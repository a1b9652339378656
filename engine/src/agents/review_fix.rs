//! ReviewFix loop (§4.6): Reviewing → Validating → Scoring → Decide →
//! [Fixing → Reviewing] | Done. Runs entirely within one node invocation —
//! the Supervisor routes into "reviewfix" once and sees the loop's outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{catch, file_tools::{write_file_via_mcp, GeneratedFile}};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::ProviderRegistry;
use crate::mcp::McpClient;
use crate::state::{AgentName, WorkflowState};
use crate::validators;

const REVIEW_SYSTEM_PROMPT: &str = "You are a code reviewer. Given a design and the generated files, respond with ONLY a JSON \
object shaped {\"score\": number between 0 and 1, \"feedback\": string}. No markdown fences, no commentary.";

const FIX_SYSTEM_PROMPT: &str = "You are a code-fixing agent. Given reviewer feedback and build errors, respond with ONLY a \
JSON array of objects shaped {\"path\": string, \"content\": string} for every file that needs to change, paths relative \
to the workspace root. No markdown fences, no commentary.";

#[derive(Debug, Deserialize)]
struct ReviewVerdict {
    score: f64,
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct FileSpec {
    path: String,
    content: String,
}

pub struct ReviewFixNode {
    pub provider_registry: Arc<ProviderRegistry>,
    pub mcp: Arc<McpClient>,
    pub file_server: String,
}

#[async_trait]
impl Node<WorkflowState> for ReviewFixNode {
    fn id(&self) -> &str {
        "reviewfix"
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        let generated_files = extract_generated_files(&state)?;
        let design = state.agent_outputs.get("architect").and_then(|v| v.get("design")).and_then(|v| v.as_str()).unwrap_or_default().to_string();

        loop {
            // Reviewing
            let review_prompt = build_review_prompt(&design, &generated_files, &state);
            let review = match self.provider_registry.generate("reviewer", &review_prompt, Some(REVIEW_SYSTEM_PROMPT), None, None).await {
                Ok(r) => r,
                Err(e) => return Ok(catch(state, "reviewfix", e.into())),
            };
            let verdict = parse_review_verdict(&review.content);
            let reviewer_score = clamp_score(verdict.score);

            // Validating
            let file_paths: Vec<PathBuf> = generated_files.iter().map(|f| PathBuf::from(&f.path)).collect();
            let aggregate = validators::run_all(Path::new(&state.workspace_path), &file_paths).await;
            state.build_errors = validators::to_build_errors(&aggregate.results);
            state.build_validation_passed = aggregate.build_validation_passed;
            state.quality_threshold = aggregate.threshold_applied;

            // Scoring (§4.6: capped at 0.50 when any validator failed)
            let quality_score = if aggregate.build_validation_passed { reviewer_score } else { reviewer_score.min(0.50) };
            state.last_quality_score = quality_score;

            // Decide. `review_iteration` counts completed Reviewing passes,
            // not just Fixing cycles, so a pass that clears the threshold on
            // its first attempt still advances the counter (§8 S2: one
            // failing pass + one fix + one passing pass ends at 2, not 1).
            if quality_score >= state.quality_threshold {
                state.review_iteration += 1;
                break;
            }
            if state.review_iteration < state.max_review_iterations {
                let fix_prompt = build_fix_prompt(&verdict.feedback, &state.build_errors);
                let fix = match self.provider_registry.generate("fixer", &fix_prompt, Some(FIX_SYSTEM_PROMPT), None, None).await {
                    Ok(r) => r,
                    Err(e) => return Ok(catch(state, "reviewfix", e.into())),
                };
                let patches = parse_file_specs(&fix.content).unwrap_or_default();
                let workspace_path = Path::new(&state.workspace_path).to_path_buf();
                for patch in &patches {
                    if let Err(e) = write_file_via_mcp(&self.mcp, &self.file_server, &workspace_path, &patch.path, &patch.content).await {
                        match e {
                            e @ AgentError::Mcp(_) => return Ok(catch(state, "reviewfix", e)),
                            e => return Err(e),
                        }
                    }
                }
                state.review_iteration += 1;
                continue;
            }

            // Surrender: bounded iterations exhausted without meeting threshold.
            state.push_error(
                Some("reviewfix"),
                "quality_threshold_not_met",
                format!("quality_score {quality_score:.2} below threshold {:.2} after {} iterations", state.quality_threshold, state.review_iteration),
                false,
            );
            break;
        }

        state.agent_outputs.insert(
            "reviewfix".into(),
            json!({
                "quality_score": state.last_quality_score,
                "build_validation_passed": state.build_validation_passed,
                "review_iteration": state.review_iteration,
            }),
        );
        state.record_agent(AgentName::ReviewFix);
        Ok((state, Next::Continue))
    }
}

fn extract_generated_files(state: &WorkflowState) -> Result<Vec<GeneratedFile>, AgentError> {
    let value = state
        .agent_outputs
        .get("codesmith")
        .and_then(|v| v.get("generated_files"))
        .ok_or_else(|| AgentError::Invariant("reviewfix invoked with no codesmith.generated_files".into()))?;
    serde_json::from_value(value.clone()).map_err(|e| AgentError::Invariant(format!("malformed generated_files: {e}")))
}

fn build_review_prompt(design: &str, files: &[GeneratedFile], state: &WorkflowState) -> String {
    let file_list: Vec<String> = files.iter().map(|f| format!("- {} ({} bytes)", f.path, f.bytes_written)).collect();
    format!(
        "Design:\n{design}\n\nGenerated files:\n{}\n\nThis is review iteration {} of {}.",
        file_list.join("\n"),
        state.review_iteration + 1,
        state.max_review_iterations
    )
}

fn build_fix_prompt(feedback: &str, build_errors: &std::collections::HashMap<String, String>) -> String {
    let errors: Vec<String> = build_errors.iter().map(|(name, text)| format!("[{name}]\n{text}")).collect();
    format!("Reviewer feedback:\n{feedback}\n\nBuild errors:\n{}", errors.join("\n\n"))
}

/// Reviewer scores outside [0,1] are clamped and logged (§4.6 edge case).
fn clamp_score(score: f64) -> f64 {
    if !(0.0..=1.0).contains(&score) {
        tracing::warn!(score, "reviewer returned an out-of-range score, clamping");
    }
    score.clamp(0.0, 1.0)
}

fn parse_review_verdict(content: &str) -> ReviewVerdict {
    let trimmed = strip_fence(content);
    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unparseable reviewer output, defaulting to score 0.0");
        ReviewVerdict { score: 0.0, feedback: content.to_string() }
    })
}

fn parse_file_specs(content: &str) -> Result<Vec<FileSpec>, serde_json::Error> {
    serde_json::from_str(strip_fence(content))
}

fn strip_fence(content: &str) -> &str {
    content.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: an out-of-range reviewer score is clamped, not rejected.
    #[test]
    fn clamp_score_bounds_to_unit_interval() {
        assert_eq!(clamp_score(1.4), 1.0);
        assert_eq!(clamp_score(-0.2), 0.0);
        assert_eq!(clamp_score(0.6), 0.6);
    }

    #[test]
    fn parse_review_verdict_falls_back_on_malformed_json() {
        let verdict = parse_review_verdict("not json");
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn extract_generated_files_requires_codesmith_output() {
        let state = WorkflowState::new("s1", "/tmp/ws", "q");
        let err = extract_generated_files(&state).unwrap_err();
        assert!(matches!(err, AgentError::Invariant(_)));
    }
}
