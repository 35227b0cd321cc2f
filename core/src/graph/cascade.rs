use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::plan::{Plan, Task};

/// Hypothetical downstream impact of one task failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSimulation {
    /// The seed followed by every transitive dependent, in BFS order.
    pub cascade: Vec<String>,
    /// Share of the plan inside the cascade, in percent with one decimal.
    pub risk_score: f64,
}

/// Simulate `failed_task_id` failing. The plan is not modified.
pub fn simulate_failure(plan: &Plan, failed_task_id: &str) -> FailureSimulation {
    simulate_failure_in(plan.tasks(), failed_task_id)
}

/// Same as [`simulate_failure`] over a bare task list.
///
/// An empty list yields `cascade = [failed_task_id]` and a risk score of 100.
/// The score is capped at 100 (a seed that is not itself a task can otherwise
/// push the ratio above 1).
pub fn simulate_failure_in(tasks: &[Task], failed_task_id: &str) -> FailureSimulation {
    if tasks.is_empty() {
        return FailureSimulation {
            cascade: vec![failed_task_id.to_string()],
            risk_score: 100.0,
        };
    }

    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for dep in &task.dependencies {
            let entry = dependents.entry(dep.as_str()).or_default();
            if !entry.contains(&task.id.as_str()) {
                entry.push(task.id.as_str());
            }
        }
    }

    let mut cascade = vec![failed_task_id.to_string()];
    let mut visited: HashSet<&str> = HashSet::from([failed_task_id]);
    let mut queue: VecDeque<&str> = VecDeque::from([failed_task_id]);

    while let Some(current) = queue.pop_front() {
        let Some(next) = dependents.get(current) else {
            continue;
        };
        for &id in next {
            if visited.insert(id) {
                cascade.push(id.to_string());
                queue.push_back(id);
            }
        }
    }

    let ratio = cascade.len() as f64 / tasks.len() as f64;
    let risk_score = ((ratio * 1000.0).round() / 10.0).min(100.0);

    tracing::debug!(
        "failure of '{}' cascades to {} task(s), risk {}",
        failed_task_id,
        cascade.len(),
        risk_score
    );

    FailureSimulation {
        cascade,
        risk_score,
    }
}
