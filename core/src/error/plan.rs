use thiserror::Error;

use super::codes::ErrorCode;
use crate::plan::{TaskStatus, TransitionError};

/// Errors raised by the task graph model and its analyzers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("result of task '{task_id}' is sealed (status: {status})")]
    ResultSealed { task_id: String, status: TaskStatus },

    #[error("task '{task_id}': {source}")]
    Transition {
        task_id: String,
        #[source]
        source: TransitionError,
    },
}

impl PlanError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateTaskId(_) => ErrorCode::ValidationError,
            Self::TaskNotFound(_) => ErrorCode::TaskNotFound,
            Self::SelfDependency(_) => ErrorCode::DependencyError,
            Self::CircularDependency(_) => ErrorCode::CircularDependency,
            Self::ResultSealed { .. } => ErrorCode::ResultSealed,
            Self::Transition { .. } => ErrorCode::InvalidTransition,
        }
    }
}
