use taskpilot_core::api::{EventRenderer, RunOutcome, SchedulerEvent};

/// Human-readable progress lines on stdout.
pub struct TextRenderer {
    ascii_only: bool,
    show_chunks: bool,
}

impl TextRenderer {
    pub fn new(ascii_only: bool) -> Self {
        Self {
            ascii_only,
            show_chunks: false,
        }
    }

    /// Echo streamed task output as it arrives.
    pub fn with_chunks(mut self, show: bool) -> Self {
        self.show_chunks = show;
        self
    }

    fn format_event(&self, event: &SchedulerEvent) -> Option<String> {
        let line = match event {
            SchedulerEvent::RunStarted {
                run_id,
                total_tasks,
            } => format!("RUN START {} (tasks: {})", run_id, total_tasks),
            SchedulerEvent::Snapshot(_) => return None,
            SchedulerEvent::TaskStarted {
                task_id,
                description,
            } => format!("TASK START {}: {}", task_id, description),
            SchedulerEvent::TaskChunk { text, .. } => {
                if !self.show_chunks {
                    return None;
                }
                format!("  | {}", text.trim_end())
            }
            SchedulerEvent::TaskCompleted { task_id } => {
                let status = if self.ascii_only { "OK" } else { "✔ completed" };
                format!("TASK END {} ({})", task_id, status)
            }
            SchedulerEvent::TaskFailed { task_id, error } => {
                let status = if self.ascii_only { "FAIL" } else { "✘ failed" };
                format!("TASK END {} ({}: {})", task_id, status, error)
            }
            SchedulerEvent::Alert(alert) => {
                let marker = if self.ascii_only { "!" } else { "⚠" };
                format!("{} {}", marker, alert.message)
            }
            SchedulerEvent::Idle { attempt, pending } => format!(
                "WAITING (attempt {}, pending: {})",
                attempt,
                pending.join(", ")
            ),
            SchedulerEvent::Summary(text) => format!("SUMMARY\n{}", text),
            SchedulerEvent::Finished(outcome) => format!("RUN END ({})", describe(outcome)),
        };
        Some(line)
    }
}

fn describe(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed { summary: Some(_) } => "completed".into(),
        RunOutcome::Completed { summary: None } => "completed, no summary".into(),
        RunOutcome::Failed { task_id, .. } => format!("failed at task {task_id}"),
        RunOutcome::Stalled { pending } => format!("stalled, {} task(s) pending", pending.len()),
        RunOutcome::Cancelled { task_id: Some(id) } => format!("cancelled during task {id}"),
        RunOutcome::Cancelled { task_id: None } => "cancelled".into(),
        RunOutcome::Rejected { error } => format!("rejected: {error}"),
    }
}

impl EventRenderer for TextRenderer {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &SchedulerEvent) {
        if let Some(line) = self.format_event(event) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpilot_core::api::{Alert, CapabilityError};

    #[test]
    fn test_task_failure_line() {
        let renderer = TextRenderer::new(true);
        let line = renderer
            .format_event(&SchedulerEvent::TaskFailed {
                task_id: "2".into(),
                error: CapabilityError::Executor("boom".into()),
            })
            .unwrap();
        assert_eq!(line, "TASK END 2 (FAIL: executor failed: boom)");
    }

    #[test]
    fn test_chunks_hidden_by_default() {
        let event = SchedulerEvent::TaskChunk {
            task_id: "1".into(),
            text: "partial\n".into(),
        };
        assert!(TextRenderer::new(true).format_event(&event).is_none());
        assert_eq!(
            TextRenderer::new(true)
                .with_chunks(true)
                .format_event(&event)
                .as_deref(),
            Some("  | partial")
        );
    }

    #[test]
    fn test_alert_and_outcome() {
        let renderer = TextRenderer::new(true);
        assert_eq!(
            renderer
                .format_event(&SchedulerEvent::Alert(Alert::new("stalled")))
                .as_deref(),
            Some("! stalled")
        );
        assert_eq!(
            renderer
                .format_event(&SchedulerEvent::Finished(RunOutcome::Cancelled {
                    task_id: Some("3".into())
                }))
                .as_deref(),
            Some("RUN END (cancelled during task 3)")
        );
    }
}
