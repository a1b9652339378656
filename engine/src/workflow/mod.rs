//! Workflow Engine (C7, §4.8): ties the compiled graph, checkpointer, MCP
//! client, and provider registry into a single `run`/`resume`/`cancel`/
//! `cleanup` surface for the serve crate to drive.

mod engine;
mod events;

pub use engine::{Engine, HitlCallback, HitlOutcome, ProgressCallback, RunOutcome};
pub use events::ProgressEvent;
