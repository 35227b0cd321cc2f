#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use taskpilot_core::api::{
    CapabilityError, Citation, ExecutionEvent, ExecutionStream, Plan, PlanningError, Planner,
    SchedulerConfig, Summarizer, Task, TaskExecutor, TaskOutput, TaskRequest,
};

/// Executor whose behaviour per task id is fixed up front.
#[derive(Default)]
pub struct ScriptedExecutor {
    fail_on: HashSet<String>,
    hang_on: HashSet<String>,
    chunks: HashMap<String, Vec<String>>,
    calls: Mutex<Vec<TaskRequest>>,
}

impl ScriptedExecutor {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail_on.insert(id.to_string());
        self
    }

    /// The stream for `id` never produces anything.
    pub fn hanging_on(mut self, id: &str) -> Self {
        self.hang_on.insert(id.to_string());
        self
    }

    /// Stream `parts` for `id` and end without a `Done` event.
    pub fn chunked(mut self, id: &str, parts: &[&str]) -> Self {
        self.chunks
            .insert(id.to_string(), parts.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn calls(&self) -> Vec<TaskRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.task_id).collect()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute_task(
        &self,
        request: TaskRequest,
        _cancel: CancellationToken,
    ) -> Result<ExecutionStream, CapabilityError> {
        self.calls.lock().unwrap().push(request.clone());
        let id = request.task_id;

        if self.fail_on.contains(&id) {
            return Err(CapabilityError::Executor(format!("task {id} exploded")));
        }
        if self.hang_on.contains(&id) {
            return Ok(futures::stream::pending().boxed());
        }
        if let Some(parts) = self.chunks.get(&id) {
            let events: Vec<_> = parts
                .iter()
                .map(|p| Ok(ExecutionEvent::Chunk(p.clone())))
                .collect();
            return Ok(futures::stream::iter(events).boxed());
        }

        let text = format!("output {id}");
        let events = vec![
            Ok(ExecutionEvent::Chunk(text.clone())),
            Ok(ExecutionEvent::Done(TaskOutput {
                text,
                citations: vec![Citation::new(format!("https://example.com/{id}"))],
            })),
        ];
        Ok(futures::stream::iter(events).boxed())
    }
}

/// Summarizer that counts its calls.
#[derive(Default)]
pub struct CountingSummarizer {
    pub fail: bool,
    calls: Mutex<Vec<String>>,
}

impl CountingSummarizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn histories(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, plan: &Plan, history: &str) -> Result<String, CapabilityError> {
        self.calls.lock().unwrap().push(history.to_string());
        if self.fail {
            return Err(CapabilityError::Backend("summary model offline".into()));
        }
        Ok(format!("{} task(s) done for {}", plan.len(), plan.goal()))
    }
}

/// Planner replaying a fixed sequence of answers.
pub struct ScriptedPlanner {
    answers: Mutex<Vec<Result<Plan, PlanningError>>>,
    attempts: Mutex<u32>,
}

impl ScriptedPlanner {
    pub fn new(answers: Vec<Result<Plan, PlanningError>>) -> Self {
        Self {
            answers: Mutex::new(answers),
            attempts: Mutex::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_plan(&self, _goal: &str) -> Result<Plan, PlanningError> {
        *self.attempts.lock().unwrap() += 1;
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            return Err(PlanningError::Malformed("no scripted answer left".into()));
        }
        answers.remove(0)
    }
}

pub fn task(id: &str, deps: &[&str]) -> Task {
    Task::new(id, format!("do {id}")).with_dependencies(deps.iter().copied())
}

pub fn chain_plan() -> Plan {
    Plan::new(
        "write a report",
        vec![task("1", &[]), task("2", &["1"]), task("3", &["2"])],
    )
    .unwrap()
}

/// Fast polling so stall tests finish quickly.
pub fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        idle_poll_interval_ms: 1,
        max_idle_polls: 3,
        ..SchedulerConfig::default()
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
