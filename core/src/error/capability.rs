use thiserror::Error;

use super::codes::ErrorCode;
use super::plan::PlanError;

/// Failures of the external capabilities (executor, planner, summarizer, model backend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("executor failed: {0}")]
    Executor(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout after {0} seconds")]
    Timeout(u64),

    #[error("cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(String),
}

impl CapabilityError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Executor(_) => ErrorCode::GeneralError,
            Self::Backend(_) => ErrorCode::BackendError,
            Self::InvalidResponse(_) => ErrorCode::InvalidResponse,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Io(_) => ErrorCode::IoError,
        }
    }
}

impl From<std::io::Error> for CapabilityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors raised while turning a goal into a plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("planner output is missing a goal")]
    MissingGoal,

    #[error("planner returned {found} task(s), expected at least {min}")]
    TooFewTasks { found: usize, min: usize },

    #[error("malformed planner output: {0}")]
    Malformed(String),

    #[error("planner produced an invalid plan: {0}")]
    Plan(#[from] PlanError),

    #[error("planner capability failed: {0}")]
    Capability(#[from] CapabilityError),

    #[error("plan generation gave up after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<PlanningError>,
    },
}

impl PlanningError {
    /// Cancellation is the only failure that is never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Capability(CapabilityError::Cancelled) | Self::RetriesExhausted { .. }
        )
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingGoal | Self::TooFewTasks { .. } => ErrorCode::ValidationError,
            Self::Malformed(_) => ErrorCode::ParseError,
            Self::Plan(e) => e.error_code(),
            Self::Capability(e) => e.error_code(),
            Self::RetriesExhausted { last, .. } => last.error_code(),
        }
    }
}
