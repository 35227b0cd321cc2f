use crate::graph::is_task_blocked;
use crate::plan::{Plan, Task};

/// First not-started, unblocked task in declaration order.
///
/// Priority is not consulted. `Blocked` and `Waiting` are display aliases of
/// a task that has not started, so they are eligible like `Pending`.
pub fn select_next_task(plan: &Plan) -> Option<&Task> {
    let tasks = plan.tasks();
    tasks
        .iter()
        .find(|task| task.status.is_not_started() && !is_task_blocked(task, tasks))
}
