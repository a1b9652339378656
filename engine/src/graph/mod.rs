//! The state-graph runtime the Workflow Engine (C7) compiles and the
//! Supervisor (C6) routes over. `WorkflowState` is the only state type
//! this graph is ever instantiated with.

mod compile_error;
mod compiled;
mod conditional;
mod interrupt;
mod next;
mod node;
mod retry;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, StepObserver};
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use interrupt::{DefaultInterruptHandler, GraphInterrupt, Interrupt, InterruptHandler};
pub use next::Next;
pub use node::Node;
pub use retry::{provider_retry_policy, RetryPolicy};
pub use run_context::{RunContext, StreamEvent};
pub use state_graph::{StateGraph, END, START};
