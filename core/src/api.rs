//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskpilot_core::api` instead of reaching into internal modules.

use std::sync::Arc;

pub use crate::capability::{
    extract_citations, CompletionBackend, ExecutionEvent, ExecutionStream, ModelCapabilities,
    Planner, Summarizer, TaskExecutor, TaskOutput, TaskRequest, TextStream,
};
pub use crate::config::{
    load_default, load_from_path, AppConfig, BackendConfig, LoggingConfig, PlannerConfig,
    ReviewConfig, SchedulerConfig,
};
pub use crate::error::{CapabilityError, ErrorCode, PlanError, PlanningError, SchedulerError};
pub use crate::graph::{
    blocking_dependencies, compute_depths, display_status, is_task_blocked, layers,
    simulate_failure, FailureSimulation, TaskGraph, ValidationReport,
};
pub use crate::plan::{Citation, NewTask, Plan, PlanStore, Priority, Task, TaskStatus};
pub use crate::planning::{generate_plan_with_retry, parse_plan_response};
pub use crate::review::{Agent, AgentRole, AgentUi, ReviewLoop, ReviewOutcome, ReviewPlanner};
pub use crate::scheduler::{
    snapshots, Alert, EventRenderer, EventStream, ExecutionHandle, ExecutionReport,
    ExecutionScheduler, RunOutcome, SchedulerEvent,
};

/// Run `plan` with default scheduler settings, returning the run handle and
/// the stream of plan snapshots it publishes.
pub fn start_execution(
    executor: Arc<dyn TaskExecutor>,
    summarizer: Arc<dyn Summarizer>,
    plan: Plan,
) -> (ExecutionHandle, futures::stream::BoxStream<'static, Arc<Plan>>) {
    let (handle, events) = ExecutionScheduler::new(executor, summarizer).start_execution(plan);
    (handle, snapshots(events))
}
