use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::{CapabilityError, PlanError, SchedulerError};
use crate::plan::Plan;

/// Everything a run reports to its observers, in emission order.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    RunStarted {
        run_id: String,
        total_tasks: usize,
    },
    /// A complete plan snapshot, published after every mutation.
    Snapshot(Arc<Plan>),
    TaskStarted {
        task_id: String,
        description: String,
    },
    TaskChunk {
        task_id: String,
        text: String,
    },
    TaskCompleted {
        task_id: String,
    },
    TaskFailed {
        task_id: String,
        error: CapabilityError,
    },
    Alert(Alert),
    /// No task was eligible; the scheduler is waiting before re-polling.
    Idle {
        attempt: u32,
        pending: Vec<String>,
    },
    Summary(String),
    Finished(RunOutcome),
}

/// Short human-readable notice for the conversational log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub task_id: Option<String>,
    pub message: String,
}

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            task_id: None,
            message: message.into(),
        }
    }

    pub fn for_task(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            message: message.into(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every task reached a terminal state. `summary` is `None` when the
    /// summarizer failed.
    Completed { summary: Option<String> },
    /// A task failed and the run halted.
    Failed {
        task_id: String,
        error: CapabilityError,
    },
    /// No task became eligible within the idle budget.
    Stalled { pending: Vec<String> },
    Cancelled { task_id: Option<String> },
    /// The plan failed validation before any task ran.
    Rejected { error: PlanError },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Stalled { .. } => "stalled",
            Self::Cancelled { .. } => "cancelled",
            Self::Rejected { .. } => "rejected",
        }
    }

    pub fn into_result(self) -> Result<Option<String>, SchedulerError> {
        match self {
            Self::Completed { summary } => Ok(summary),
            Self::Failed { task_id, error } => Err(SchedulerError::TaskFailed {
                task_id,
                source: error,
            }),
            Self::Stalled { pending } => Err(SchedulerError::Stalled { pending }),
            Self::Cancelled { task_id } => Err(SchedulerError::Cancelled { task_id }),
            Self::Rejected { error } => Err(SchedulerError::InvalidPlan(error)),
        }
    }
}

pub type EventStream = BoxStream<'static, SchedulerEvent>;

/// Narrow an event stream to the plan snapshots it publishes.
pub fn snapshots(events: EventStream) -> BoxStream<'static, Arc<Plan>> {
    events
        .filter_map(|event| async move {
            match event {
                SchedulerEvent::Snapshot(plan) => Some(plan),
                _ => None,
            }
        })
        .boxed()
}
