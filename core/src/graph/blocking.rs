use crate::plan::{Task, TaskStatus};

/// A task is blocked iff at least one of its dependencies names a task in
/// `all_tasks` that has not completed.
///
/// Unknown dependency ids never block. The task's own status is irrelevant.
pub fn is_task_blocked(task: &Task, all_tasks: &[Task]) -> bool {
    task.dependencies.iter().any(|dep| {
        all_tasks
            .iter()
            .find(|t| t.id == *dep)
            .is_some_and(|t| t.status != TaskStatus::Completed)
    })
}

/// The dependency ids currently holding `task` back, in declaration order.
pub fn blocking_dependencies<'a>(task: &'a Task, all_tasks: &[Task]) -> Vec<&'a str> {
    task.dependencies
        .iter()
        .filter(|dep| {
            all_tasks
                .iter()
                .find(|t| t.id == **dep)
                .is_some_and(|t| t.status != TaskStatus::Completed)
        })
        .map(String::as_str)
        .collect()
}

/// Status to show for `task`.
///
/// Not-started tasks are shown as `Blocked` while a dependency is unfinished
/// and as `Waiting` while another task occupies the executor. Everything else
/// shows its stored status.
pub fn display_status(task: &Task, all_tasks: &[Task]) -> TaskStatus {
    if !task.status.is_not_started() {
        return task.status;
    }
    if is_task_blocked(task, all_tasks) {
        return TaskStatus::Blocked;
    }
    if all_tasks
        .iter()
        .any(|t| t.status == TaskStatus::InProgress && t.id != task.id)
    {
        return TaskStatus::Waiting;
    }
    TaskStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Task> {
        vec![
            Task::new("1", "a"),
            Task::new("2", "b").with_dependencies(["1"]),
            Task::new("3", "c").with_dependencies(["2"]),
        ]
    }

    fn set(tasks: &mut [Task], id: &str, status: TaskStatus) {
        if let Some(t) = tasks.iter_mut().find(|t| t.id == id) {
            t.status = status;
        }
    }

    #[test]
    fn test_no_dependencies_never_blocked() {
        let tasks = chain();
        for status in [TaskStatus::Pending, TaskStatus::Failed, TaskStatus::InProgress] {
            let task = Task::new("x", "x").with_status(status);
            assert!(!is_task_blocked(&task, &tasks));
        }
        assert!(!is_task_blocked(&tasks[0], &[]));
    }

    #[test]
    fn test_chain_unblocks_step_by_step() {
        let mut tasks = chain();
        assert!(is_task_blocked(&tasks[1], &tasks));
        assert!(is_task_blocked(&tasks[2], &tasks));

        set(&mut tasks, "1", TaskStatus::Completed);
        assert!(!is_task_blocked(&tasks[1], &tasks));
        assert!(is_task_blocked(&tasks[2], &tasks));

        set(&mut tasks, "2", TaskStatus::Completed);
        assert!(!is_task_blocked(&tasks[2], &tasks));
    }

    #[test]
    fn test_failed_or_running_dependency_blocks() {
        let mut tasks = chain();
        set(&mut tasks, "1", TaskStatus::Failed);
        assert!(is_task_blocked(&tasks[1], &tasks));
        set(&mut tasks, "1", TaskStatus::InProgress);
        assert!(is_task_blocked(&tasks[1], &tasks));
    }

    #[test]
    fn test_unknown_dependency_does_not_block() {
        let tasks = chain();
        let task = Task::new("9", "orphan").with_dependencies(["missing"]);
        assert!(!is_task_blocked(&task, &tasks));
        assert!(blocking_dependencies(&task, &tasks).is_empty());
    }

    #[test]
    fn test_blocking_dependencies_lists_unfinished() {
        let mut tasks = chain();
        tasks.push(Task::new("4", "d").with_dependencies(["1", "2", "ghost"]));
        set(&mut tasks, "1", TaskStatus::Completed);
        assert_eq!(blocking_dependencies(&tasks[3], &tasks), vec!["2"]);
    }

    #[test]
    fn test_display_status() {
        let mut tasks = chain();
        assert_eq!(display_status(&tasks[0], &tasks), TaskStatus::Pending);
        assert_eq!(display_status(&tasks[1], &tasks), TaskStatus::Blocked);

        tasks.push(Task::new("4", "free"));
        set(&mut tasks, "1", TaskStatus::InProgress);
        assert_eq!(display_status(&tasks[3], &tasks), TaskStatus::Waiting);
        assert_eq!(display_status(&tasks[0], &tasks), TaskStatus::InProgress);
    }
}
