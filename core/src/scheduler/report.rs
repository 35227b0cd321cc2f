use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;

use super::engine::ExecutionHandle;
use super::events::{Alert, EventStream, RunOutcome, SchedulerEvent};
use super::render::EventRenderer;
use crate::error::SchedulerError;
use crate::plan::Plan;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub run_id: String,
    pub plan: Arc<Plan>,
    pub outcome: RunOutcome,
    pub summary: Option<String>,
    pub alerts: Vec<Alert>,
    /// Task ids in the order they were dispatched.
    pub executed: Vec<String>,
    pub duration: Duration,
}

impl ExecutionReport {
    /// Drain `events` to the end, optionally rendering each one.
    pub async fn collect(
        handle: &ExecutionHandle,
        mut events: EventStream,
        renderer: Option<&dyn EventRenderer>,
    ) -> Self {
        let start = Instant::now();
        let mut outcome = None;
        let mut summary = None;
        let mut alerts = Vec::new();
        let mut executed = Vec::new();

        while let Some(event) = events.next().await {
            if let Some(renderer) = renderer {
                renderer.render(&event);
            }
            match event {
                SchedulerEvent::TaskStarted { task_id, .. } => executed.push(task_id),
                SchedulerEvent::Alert(alert) => alerts.push(alert),
                SchedulerEvent::Summary(text) => summary = Some(text),
                SchedulerEvent::Finished(end) => outcome = Some(end),
                _ => {}
            }
        }

        Self {
            run_id: handle.run_id().to_string(),
            plan: handle.snapshot(),
            // A stream that ends without Finished was abandoned mid-run.
            outcome: outcome.unwrap_or(RunOutcome::Cancelled { task_id: None }),
            summary,
            alerts,
            executed,
            duration: start.elapsed(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome.is_completed()
    }

    pub fn into_result(self) -> Result<Self, SchedulerError> {
        match self.outcome.clone().into_result() {
            Ok(_) => Ok(self),
            Err(err) => Err(err),
        }
    }
}
