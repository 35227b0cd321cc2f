use std::time::Duration;

use crate::capability::Planner;
use crate::config::{PlannerConfig, RetryConfig};
use crate::error::PlanningError;
use crate::graph::TaskGraph;
use crate::plan::Plan;

/// Exponential backoff between planner attempts.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    config: RetryConfig,
}

impl BackoffPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Delay after the failed attempt `attempt` (0-based), or `None` when no
    /// attempt is left.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts() {
            return None;
        }
        let exp = 1u64 << attempt.min(30);
        let delay = self.config.base_delay_ms.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }
}

/// Reject planner output a scheduler should never see.
pub fn check_generated_plan(plan: &Plan, min_tasks: usize) -> Result<(), PlanningError> {
    if plan.goal().trim().is_empty() {
        return Err(PlanningError::MissingGoal);
    }
    let min = min_tasks.max(1);
    if plan.len() < min {
        return Err(PlanningError::TooFewTasks {
            found: plan.len(),
            min,
        });
    }
    TaskGraph::from_plan(plan)?.validate()?;
    Ok(())
}

/// Ask `planner` for a plan, retrying malformed output with backoff.
pub async fn generate_plan_with_retry(
    planner: &dyn Planner,
    goal: &str,
    config: &PlannerConfig,
) -> Result<Plan, PlanningError> {
    let policy = BackoffPolicy::new(config.retry.clone());
    let mut attempt = 0u32;

    loop {
        let result = match planner.generate_plan(goal).await {
            Ok(plan) => check_generated_plan(&plan, config.min_tasks).map(|()| plan),
            Err(err) => Err(err),
        };

        let err = match result {
            Ok(plan) => {
                tracing::info!(
                    planner = planner.name(),
                    tasks = plan.len(),
                    attempt = attempt + 1,
                    "plan generated"
                );
                return Ok(plan);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        match policy.next_delay(attempt) {
            Some(delay) => {
                tracing::warn!(
                    planner = planner.name(),
                    attempt = attempt + 1,
                    "plan generation failed, retrying in {:?}: {}",
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None => {
                return Err(PlanningError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Task;

    fn policy(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy::new(RetryConfig {
            max_attempts,
            base_delay_ms: 100,
            max_delay_ms: 250,
        })
    }

    #[test]
    fn test_exponential_backoff_capped() {
        let p = policy(4);
        assert_eq!(p.next_delay(0), Some(Duration::from_millis(100)));
        assert_eq!(p.next_delay(1), Some(Duration::from_millis(200)));
        assert_eq!(p.next_delay(2), Some(Duration::from_millis(250)));
        assert_eq!(p.next_delay(3), None);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let p = policy(0);
        assert_eq!(p.max_attempts(), 1);
        assert_eq!(p.next_delay(0), None);
    }

    #[test]
    fn test_check_generated_plan() {
        let empty = Plan::new("g", vec![]).unwrap();
        assert_eq!(
            check_generated_plan(&empty, 1).unwrap_err(),
            PlanningError::TooFewTasks { found: 0, min: 1 }
        );

        let no_goal = Plan::new("", vec![Task::new("1", "a")]).unwrap();
        assert_eq!(
            check_generated_plan(&no_goal, 1).unwrap_err(),
            PlanningError::MissingGoal
        );

        let cyclic = Plan::new(
            "g",
            vec![
                Task::new("1", "a").with_dependencies(["2"]),
                Task::new("2", "b").with_dependencies(["1"]),
            ],
        )
        .unwrap();
        assert!(matches!(
            check_generated_plan(&cyclic, 1),
            Err(PlanningError::Plan(_))
        ));
    }
}
