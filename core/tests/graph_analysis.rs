mod common;

use pretty_assertions::assert_eq;
use taskpilot_core::api::{
    compute_depths, is_task_blocked, layers, simulate_failure, Plan, TaskGraph, TaskStatus,
};

use common::{chain_plan, task};

fn complete(plan: &Plan, id: &str) -> Plan {
    plan.update_task_status(id, TaskStatus::InProgress)
        .and_then(|p| p.complete_task(id, "ok", &[]))
        .unwrap()
}

#[test]
fn chain_unblocks_one_step_at_a_time() {
    let plan = chain_plan();
    let blocked = |p: &Plan, id: &str| is_task_blocked(p.task(id).unwrap(), p.tasks());

    assert!(!blocked(&plan, "1"));
    assert!(blocked(&plan, "2"));
    assert!(blocked(&plan, "3"));

    let plan = complete(&plan, "1");
    assert!(!blocked(&plan, "2"));
    assert!(blocked(&plan, "3"));

    let plan = complete(&plan, "2");
    assert!(!blocked(&plan, "3"));
}

#[test]
fn chain_cascade_covers_everything() {
    let sim = simulate_failure(&chain_plan(), "1");
    assert_eq!(sim.cascade, vec!["1", "2", "3"]);
    assert_eq!(sim.risk_score, 100.0);
}

#[test]
fn empty_plan_cascade() {
    let sim = simulate_failure(&Plan::new("g", vec![]).unwrap(), "x");
    assert_eq!(sim.cascade, vec!["x"]);
    assert_eq!(sim.risk_score, 100.0);
}

#[test]
fn cascade_is_closed_under_members() {
    let plan = Plan::new(
        "g",
        vec![
            task("1", &[]),
            task("2", &["1"]),
            task("3", &["1"]),
            task("4", &["2", "3"]),
            task("5", &[]),
        ],
    )
    .unwrap();
    let seed = simulate_failure(&plan, "2");
    for member in &seed.cascade {
        let again = simulate_failure(&plan, member);
        assert!(again.cascade.contains(member));
        assert!(again.cascade.iter().all(|id| seed.cascade.contains(id)));
    }
}

#[test]
fn depths_follow_longest_chain() {
    let plan = Plan::new(
        "g",
        vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["a", "b"]),
            task("d", &[]),
        ],
    )
    .unwrap();
    let depths = compute_depths(plan.tasks());
    assert_eq!(depths["a"], 0);
    assert_eq!(depths["b"], 1);
    assert_eq!(depths["c"], 2);
    assert_eq!(depths["d"], 0);
    assert_eq!(
        layers(plan.tasks()),
        vec![
            vec!["a".to_string(), "d".to_string()],
            vec!["b".to_string()],
            vec!["c".to_string()],
        ]
    );
}

#[test]
fn validation_reports_stages_and_dangling_ids() {
    let plan = Plan::new("g", vec![task("1", &["ghost"]), task("2", &["1"])]).unwrap();
    let report = TaskGraph::from_plan(&plan).unwrap().validate().unwrap();
    assert_eq!(
        report.stages,
        vec![vec!["1".to_string()], vec!["2".to_string()]]
    );
    assert_eq!(report.dangling, vec![("1".to_string(), "ghost".to_string())]);
}
