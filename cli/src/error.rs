use taskpilot_core::api::{PlanError, PlanningError, SchedulerError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid plan: {0}")]
    Plan(String),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Run(#[from] SchedulerError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<PlanError> for CliError {
    fn from(err: PlanError) -> Self {
        Self::Plan(err.to_string())
    }
}

// 0: success
// 11: config error
// 12: plan / validation error
// 30: task failure
// 31: stalled
// 32: cancelled
// 50: internal/uncategorized
pub fn exit_code_for_error(e: &CliError) -> i32 {
    match e {
        CliError::Config(_) => 11,
        CliError::Plan(_) | CliError::Planning(_) => 12,
        CliError::Run(re) => match re {
            SchedulerError::InvalidPlan(_) => 12,
            SchedulerError::TaskFailed { .. } => 30,
            SchedulerError::Stalled { .. } => 31,
            SchedulerError::Cancelled { .. } => 32,
        },
        CliError::Io(_) | CliError::Anyhow(_) => 50,
    }
}
