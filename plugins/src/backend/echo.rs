use async_trait::async_trait;
use serde_json::json;
use taskpilot_core::api::{CapabilityError, CompletionBackend};

/// Deterministic offline backend for dry runs.
///
/// Recognises the engine's prompt shapes: planning prompts get a three-step
/// plan for the goal, critiques get a passing score, everything else is
/// acknowledged line by line.
#[derive(Debug, Clone, Default)]
pub struct EchoBackend;

impl EchoBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str, context: &str) -> Result<String, CapabilityError> {
        if prompt.starts_with("You are the Critic") {
            return Ok(json!({ "score": 90, "feedback": [] }).to_string());
        }
        if prompt.starts_with("You are the Analyst") {
            return Ok(json!({ "score": 80, "feedback": ["dry run: not assessed"] }).to_string());
        }
        if prompt.contains("Revise the plan") && !context.trim().is_empty() {
            return Ok(context.to_string());
        }
        if let Some(goal) = line_value(prompt, "Goal:") {
            return Ok(sample_plan(goal));
        }
        if prompt.contains("mission summary") {
            let done = prompt.lines().filter(|l| l.starts_with("- [")).count();
            return Ok(format!("Dry run finished {done} task(s)."));
        }
        let task = line_value(prompt, "Task:").unwrap_or("task");
        Ok(format!("[dry-run] {task}"))
    }
}

fn line_value<'a>(prompt: &'a str, key: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn sample_plan(goal: &str) -> String {
    json!([
        { "id": "1", "description": format!("Research: {goal}"), "priority": "high", "dependencies": [] },
        { "id": "2", "description": format!("Draft: {goal}"), "priority": "medium", "dependencies": ["1"] },
        { "id": "3", "description": format!("Review: {goal}"), "priority": "low", "dependencies": ["2"] }
    ])
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taskpilot_core::api::{
        ExecutionScheduler, ModelCapabilities, Planner, ReviewLoop, TaskStatus,
    };

    #[tokio::test]
    async fn test_dry_run_plans_and_executes() {
        let caps = Arc::new(ModelCapabilities::new(Arc::new(EchoBackend)));
        let plan = caps.generate_plan("launch the site").await.unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.tasks()[2].dependencies, vec!["2"]);

        let report = ExecutionScheduler::new(caps.clone(), caps)
            .run_to_completion(plan)
            .await;
        assert!(report.is_completed());
        assert_eq!(report.plan.count_with_status(TaskStatus::Completed), 3);
        assert_eq!(
            report.plan.task("1").unwrap().result,
            "[dry-run] Research: launch the site"
        );
        assert_eq!(report.summary.as_deref(), Some("Dry run finished 3 task(s)."));
    }

    #[tokio::test]
    async fn test_dry_run_review_accepts() {
        let outcome = ReviewLoop::new(Arc::new(EchoBackend))
            .run("launch the site")
            .await
            .unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.score, 90);
    }
}
