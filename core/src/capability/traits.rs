use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::{CapabilityError, PlanningError};
use crate::plan::{Citation, Plan};

/// What the scheduler hands to an executor for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub task_id: String,
    pub description: String,
    /// Goal, grounding data and the running history of prior outputs.
    pub context: String,
}

/// Final output of a task execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// One item of an executor's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// Partial text, appended to the task's result as it arrives.
    Chunk(String),
    /// A source gathered mid-execution.
    Citation(Citation),
    /// Final text and citations. Optional: a stream that simply ends is
    /// completed with the accumulated chunks.
    Done(TaskOutput),
}

/// Finite, non-restartable sequence of execution events. Re-issue the call to
/// run the task again.
pub type ExecutionStream = BoxStream<'static, Result<ExecutionEvent, CapabilityError>>;

/// Streamed model text.
pub type TextStream = BoxStream<'static, Result<String, CapabilityError>>;

/// Performs the work of a single task.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// Start executing `request`. Implementations should stop producing output
    /// once `cancel` is triggered.
    async fn execute_task(
        &self,
        request: TaskRequest,
        cancel: CancellationToken,
    ) -> Result<ExecutionStream, CapabilityError>;
}

/// Decomposes a goal into a plan.
#[async_trait]
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_plan(&self, goal: &str) -> Result<Plan, PlanningError>;
}

/// Produces the mission summary once every task has finished.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, plan: &Plan, history: &str) -> Result<String, CapabilityError>;
}

/// A text-in/text-out model: the shared contract behind every model-driven
/// capability and review role.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, context: &str) -> Result<String, CapabilityError>;

    /// Streamed variant. The default yields the whole completion as one chunk.
    async fn stream(
        &self,
        prompt: &str,
        context: &str,
        cancel: CancellationToken,
    ) -> Result<TextStream, CapabilityError> {
        let text = tokio::select! {
            _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
            res = self.complete(prompt, context) => res?,
        };
        Ok(futures::stream::once(async move { Ok(text) }).boxed())
    }
}
