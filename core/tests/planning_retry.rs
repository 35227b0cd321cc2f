mod common;

use pretty_assertions::assert_eq;
use taskpilot_core::api::{
    generate_plan_with_retry, CapabilityError, Plan, PlannerConfig, PlanningError,
};
use taskpilot_core::config::RetryConfig;

use common::{task, ScriptedPlanner};

fn config(max_attempts: u32) -> PlannerConfig {
    PlannerConfig {
        min_tasks: 1,
        retry: RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

fn good_plan() -> Plan {
    Plan::new("g", vec![task("1", &[]), task("2", &["1"])]).unwrap()
}

#[tokio::test]
async fn retries_malformed_output_until_a_valid_plan_arrives() {
    let planner = ScriptedPlanner::new(vec![
        Err(PlanningError::Malformed("not json".into())),
        Ok(Plan::new("g", vec![]).unwrap()),
        Ok(good_plan()),
    ]);

    let plan = generate_plan_with_retry(&planner, "g", &config(3)).await.unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(planner.attempts(), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let planner = ScriptedPlanner::new(vec![
        Ok(Plan::new("g", vec![]).unwrap()),
        Ok(Plan::new("", vec![task("1", &[])]).unwrap()),
        Ok(good_plan()),
    ]);

    let err = generate_plan_with_retry(&planner, "g", &config(2))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PlanningError::RetriesExhausted {
            attempts: 2,
            last: Box::new(PlanningError::MissingGoal),
        }
    );
    assert_eq!(planner.attempts(), 2);
}

#[tokio::test]
async fn cyclic_output_is_retried() {
    let cyclic = Plan::new("g", vec![task("1", &["2"]), task("2", &["1"])]).unwrap();
    let planner = ScriptedPlanner::new(vec![Ok(cyclic), Ok(good_plan())]);
    assert!(generate_plan_with_retry(&planner, "g", &config(3)).await.is_ok());
    assert_eq!(planner.attempts(), 2);
}

#[tokio::test]
async fn cancellation_is_not_retried() {
    let planner = ScriptedPlanner::new(vec![
        Err(PlanningError::Capability(CapabilityError::Cancelled)),
        Ok(good_plan()),
    ]);
    let err = generate_plan_with_retry(&planner, "g", &config(3))
        .await
        .unwrap_err();
    assert_eq!(err, PlanningError::Capability(CapabilityError::Cancelled));
    assert_eq!(planner.attempts(), 1);
}
