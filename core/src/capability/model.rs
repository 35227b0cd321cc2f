use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::citations::extract_citations;
use super::prompts;
use super::traits::{
    CompletionBackend, ExecutionEvent, ExecutionStream, Planner, Summarizer, TaskExecutor,
    TaskOutput, TaskRequest,
};
use crate::error::{CapabilityError, PlanningError};
use crate::plan::Plan;
use crate::planning::parse_plan_response;

/// Serves planner, executor and summarizer from one completion backend.
#[derive(Clone)]
pub struct ModelCapabilities {
    backend: Arc<dyn CompletionBackend>,
}

impl ModelCapabilities {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CompletionBackend> {
        &self.backend
    }
}

#[async_trait]
impl Planner for ModelCapabilities {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn generate_plan(&self, goal: &str) -> Result<Plan, PlanningError> {
        let text = self
            .backend
            .complete(&prompts::plan_prompt(goal), "")
            .await?;
        parse_plan_response(goal, &text)
    }
}

#[async_trait]
impl TaskExecutor for ModelCapabilities {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn execute_task(
        &self,
        request: TaskRequest,
        cancel: CancellationToken,
    ) -> Result<ExecutionStream, CapabilityError> {
        let mut chunks = self
            .backend
            .stream(
                &prompts::task_prompt(&request.description),
                &request.context,
                cancel,
            )
            .await?;

        let events = async_stream::try_stream! {
            let mut full = String::new();
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                full.push_str(&chunk);
                yield ExecutionEvent::Chunk(chunk);
            }
            let citations = extract_citations(&full);
            yield ExecutionEvent::Done(TaskOutput { text: full, citations });
        };

        Ok(events.boxed())
    }
}

#[async_trait]
impl Summarizer for ModelCapabilities {
    async fn summarize(&self, plan: &Plan, history: &str) -> Result<String, CapabilityError> {
        self.backend
            .complete(&prompts::summary_prompt(plan, history), "")
            .await
    }
}
