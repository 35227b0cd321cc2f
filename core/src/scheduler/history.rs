use crate::capability::prompts::task_context;
use crate::plan::Plan;

/// Running textual log of completed task outputs.
#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    lines: Vec<String>,
    max_chars: usize,
}

impl RunHistory {
    /// `max_chars` truncates each recorded output; 0 keeps everything.
    pub fn new(max_chars: usize) -> Self {
        Self {
            lines: Vec::new(),
            max_chars,
        }
    }

    pub fn record(&mut self, task_id: &str, output: &str) {
        let output = if self.max_chars > 0 && output.chars().count() > self.max_chars {
            let mut cut: String = output.chars().take(self.max_chars).collect();
            cut.push_str("...");
            cut
        } else {
            output.to_string()
        };
        self.lines.push(format!("Task {task_id} output: {output}"));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn as_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Context handed to the executor: goal, grounding data, then history.
    pub fn context_for(&self, plan: &Plan) -> String {
        task_context(plan, &self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_one_line_per_task() {
        let mut history = RunHistory::new(0);
        history.record("1", "alpha");
        history.record("2", "beta");
        assert_eq!(history.as_text(), "Task 1 output: alpha\nTask 2 output: beta");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_truncates_long_outputs() {
        let mut history = RunHistory::new(3);
        history.record("1", "abcdef");
        assert_eq!(history.as_text(), "Task 1 output: abc...");
    }

    #[test]
    fn test_context_includes_goal_and_history() {
        let plan = Plan::new("ship it", vec![]).unwrap();
        let mut history = RunHistory::new(0);
        history.record("1", "done");
        let ctx = history.context_for(&plan);
        assert!(ctx.starts_with("Mission goal: ship it\n"));
        assert!(ctx.contains("Task 1 output: done"));
    }
}
