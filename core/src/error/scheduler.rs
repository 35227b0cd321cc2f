use thiserror::Error;

use super::capability::CapabilityError;
use super::codes::ErrorCode;
use super::plan::PlanError;

/// Why a run did not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("plan rejected: {0}")]
    InvalidPlan(#[from] PlanError),

    #[error("task '{task_id}' failed: {source}")]
    TaskFailed {
        task_id: String,
        #[source]
        source: CapabilityError,
    },

    #[error("execution stalled with {} unfinished task(s): {}", pending.len(), pending.join(", "))]
    Stalled { pending: Vec<String> },

    #[error("execution cancelled")]
    Cancelled { task_id: Option<String> },
}

impl SchedulerError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidPlan(e) => e.error_code(),
            Self::TaskFailed { source, .. } => match source {
                CapabilityError::Timeout(_) => ErrorCode::Timeout,
                _ => ErrorCode::GeneralError,
            },
            Self::Stalled { .. } => ErrorCode::Stalled,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
        }
    }
}
