//! Task status transition rules.

use thiserror::Error;

use super::types::TaskStatus;

/// Status transition error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("cannot transition from terminal state {state}")]
    FromTerminalState { state: TaskStatus },
}

/// Task status state machine: `Pending -> InProgress -> {Completed | Failed}`.
pub struct StatusTransition;

impl StatusTransition {
    /// Validate a status transition.
    pub fn validate(from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        if from.is_terminal() {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = match (from, to) {
            // A task never re-enters Pending.
            (_, TaskStatus::Pending) => false,

            (f, TaskStatus::InProgress) => f.is_not_started(),

            (TaskStatus::InProgress, TaskStatus::Completed | TaskStatus::Failed) => true,

            // Display states may be stamped on a task that has not started.
            (f, TaskStatus::Blocked | TaskStatus::Waiting) => f.is_not_started() && f != to,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(StatusTransition::validate(TaskStatus::Pending, TaskStatus::InProgress).is_ok());
        assert!(StatusTransition::validate(TaskStatus::InProgress, TaskStatus::Completed).is_ok());
        assert!(StatusTransition::validate(TaskStatus::InProgress, TaskStatus::Failed).is_ok());
        assert!(StatusTransition::validate(TaskStatus::Blocked, TaskStatus::InProgress).is_ok());
        assert!(StatusTransition::validate(TaskStatus::Pending, TaskStatus::Blocked).is_ok());
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(StatusTransition::validate(TaskStatus::Pending, TaskStatus::Completed).is_err());
        assert!(StatusTransition::validate(TaskStatus::InProgress, TaskStatus::Pending).is_err());
        assert!(StatusTransition::validate(TaskStatus::Blocked, TaskStatus::Pending).is_err());
        assert!(StatusTransition::validate(TaskStatus::InProgress, TaskStatus::Blocked).is_err());
        assert!(StatusTransition::validate(TaskStatus::Pending, TaskStatus::Pending).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert_eq!(
            StatusTransition::validate(TaskStatus::Completed, TaskStatus::InProgress),
            Err(TransitionError::FromTerminalState {
                state: TaskStatus::Completed
            })
        );
        assert!(StatusTransition::validate(TaskStatus::Failed, TaskStatus::Completed).is_err());
    }
}
