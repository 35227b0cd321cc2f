use std::sync::Mutex;

use chrono::Local;
use serde_json::{json, Value};
use taskpilot_core::api::{EventRenderer, RunOutcome, SchedulerEvent};

/// One JSON object per event on stdout.
pub struct JsonlRenderer {
    pretty_print: bool,
    include_snapshots: bool,
    run_id: Mutex<String>,
}

impl JsonlRenderer {
    pub fn new(pretty_print: bool) -> Self {
        Self {
            pretty_print,
            include_snapshots: false,
            run_id: Mutex::new(String::new()),
        }
    }

    /// Also emit a `plan.snapshot` record for every published snapshot.
    pub fn with_snapshots(mut self, include: bool) -> Self {
        self.include_snapshots = include;
        self
    }

    fn current_run_id(&self) -> String {
        self.run_id.lock().map(|id| id.clone()).unwrap_or_default()
    }

    fn event_to_json(&self, event: &SchedulerEvent) -> Option<Value> {
        let ts = Local::now().to_rfc3339();
        if let SchedulerEvent::RunStarted { run_id, .. } = event {
            if let Ok(mut current) = self.run_id.lock() {
                *current = run_id.clone();
            }
        }
        let run_id = self.current_run_id();

        let value = match event {
            SchedulerEvent::RunStarted { total_tasks, .. } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": { "total_tasks": total_tasks }
            }),
            SchedulerEvent::Snapshot(plan) => {
                if !self.include_snapshots {
                    return None;
                }
                json!({
                    "v": 1,
                    "event_type": "plan.snapshot",
                    "ts": ts,
                    "run_id": run_id,
                    "plan": serde_json::to_value(plan.as_ref()).unwrap_or(Value::Null),
                })
            }
            SchedulerEvent::TaskStarted {
                task_id,
                description,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": { "description": description }
            }),
            SchedulerEvent::TaskChunk { task_id, text } => json!({
                "v": 1,
                "event_type": "task.chunk",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "text": text,
            }),
            SchedulerEvent::TaskCompleted { task_id } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": { "success": true }
            }),
            SchedulerEvent::TaskFailed { task_id, error } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "code": error.error_code().as_u16(),
                "metadata": { "success": false, "error": error.to_string() }
            }),
            SchedulerEvent::Alert(alert) => json!({
                "v": 1,
                "event_type": "alert",
                "ts": ts,
                "run_id": run_id,
                "task_id": alert.task_id,
                "message": alert.message,
            }),
            SchedulerEvent::Idle { attempt, pending } => json!({
                "v": 1,
                "event_type": "scheduler.idle",
                "ts": ts,
                "run_id": run_id,
                "metadata": { "attempt": attempt, "pending": pending }
            }),
            SchedulerEvent::Summary(text) => json!({
                "v": 1,
                "event_type": "run.summary",
                "ts": ts,
                "run_id": run_id,
                "text": text,
            }),
            SchedulerEvent::Finished(outcome) => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "outcome": outcome.as_str(),
                "metadata": outcome_metadata(outcome),
            }),
        };
        Some(value)
    }
}

fn outcome_metadata(outcome: &RunOutcome) -> Value {
    match outcome {
        RunOutcome::Completed { summary } => json!({ "has_summary": summary.is_some() }),
        RunOutcome::Failed { task_id, error } => {
            json!({ "task_id": task_id, "error": error.to_string() })
        }
        RunOutcome::Stalled { pending } => json!({ "pending": pending }),
        RunOutcome::Cancelled { task_id } => json!({ "task_id": task_id }),
        RunOutcome::Rejected { error } => json!({ "error": error.to_string() }),
    }
}

impl EventRenderer for JsonlRenderer {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &SchedulerEvent) {
        let Some(value) = self.event_to_json(event) else {
            return;
        };
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taskpilot_core::api::{CapabilityError, Plan};

    #[test]
    fn test_run_id_carried_to_later_events() {
        let renderer = JsonlRenderer::new(false);
        let start = renderer
            .event_to_json(&SchedulerEvent::RunStarted {
                run_id: "run-1".into(),
                total_tasks: 2,
            })
            .unwrap();
        assert_eq!(start["event_type"], "run.start");

        let done = renderer
            .event_to_json(&SchedulerEvent::TaskCompleted {
                task_id: "1".into(),
            })
            .unwrap();
        assert_eq!(done["run_id"], "run-1");
        assert_eq!(done["metadata"]["success"], true);
    }

    #[test]
    fn test_failure_carries_error_code() {
        let renderer = JsonlRenderer::new(false);
        let value = renderer
            .event_to_json(&SchedulerEvent::TaskFailed {
                task_id: "2".into(),
                error: CapabilityError::Timeout(3),
            })
            .unwrap();
        assert_eq!(value["code"], 30);
        assert_eq!(value["metadata"]["error"], "timeout after 3 seconds");
    }

    #[test]
    fn test_snapshots_opt_in() {
        let plan = Arc::new(Plan::new("g", vec![]).unwrap());
        let quiet = JsonlRenderer::new(false);
        assert!(quiet
            .event_to_json(&SchedulerEvent::Snapshot(plan.clone()))
            .is_none());

        let verbose = JsonlRenderer::new(false).with_snapshots(true);
        let value = verbose
            .event_to_json(&SchedulerEvent::Snapshot(plan))
            .unwrap();
        assert_eq!(value["plan"]["goal"], "g");
    }

    #[test]
    fn test_run_end_outcome() {
        let value = JsonlRenderer::new(false)
            .event_to_json(&SchedulerEvent::Finished(RunOutcome::Stalled {
                pending: vec!["3".into()],
            }))
            .unwrap();
        assert_eq!(value["outcome"], "stalled");
        assert_eq!(value["metadata"]["pending"][0], "3");
    }
}
