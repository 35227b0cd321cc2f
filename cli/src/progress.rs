use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use taskpilot_core::api::{EventRenderer, SchedulerEvent};

/// Progress bars for a run: one overall bar plus a spinner per running task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Mutex<HashMap<String, (ProgressBar, Instant)>>,
    ascii_only: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, ascii_only: bool) -> Self {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: Mutex::new(HashMap::new()),
            ascii_only,
        }
    }

    fn add_task(&self, task_id: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(format!("task {}", task_id));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bars) = self.task_bars.lock() {
            bars.insert(task_id.to_string(), (bar, Instant::now()));
        }
    }

    fn complete_task(&self, task_id: &str, success: bool) {
        let entry = self.task_bars.lock().ok().and_then(|mut bars| bars.remove(task_id));
        if let Some((bar, started)) = entry {
            let icon = match (success, self.ascii_only) {
                (true, true) => "OK",
                (false, true) => "FAIL",
                (true, false) => "✅",
                (false, false) => "❌",
            };
            bar.finish_with_message(format!(
                "{} task {} ({}ms)",
                icon,
                task_id,
                started.elapsed().as_millis()
            ));
        }
        if success {
            self.overall.inc(1);
        }
    }

    fn finish(&self, success: bool) {
        let msg = if success {
            "All tasks completed"
        } else {
            "Execution stopped"
        };
        self.overall.finish_with_message(msg.to_string());
    }
}

impl EventRenderer for ProgressMonitor {
    fn name(&self) -> &str {
        "progress"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &SchedulerEvent) {
        match event {
            SchedulerEvent::Snapshot(plan) => self.overall.set_length(plan.len() as u64),
            SchedulerEvent::TaskStarted { task_id, .. } => {
                self.overall.set_message(format!("running {}", task_id));
                self.add_task(task_id);
            }
            SchedulerEvent::TaskCompleted { task_id } => self.complete_task(task_id, true),
            SchedulerEvent::TaskFailed { task_id, .. } => self.complete_task(task_id, false),
            SchedulerEvent::Idle { attempt, .. } => {
                self.overall.set_message(format!("waiting ({})", attempt));
            }
            SchedulerEvent::Finished(outcome) => self.finish(outcome.is_completed()),
            _ => {}
        }
    }
}

/// Fans each event out to several renderers in order.
pub struct FanoutRenderer {
    renderers: Vec<Box<dyn EventRenderer>>,
}

impl FanoutRenderer {
    pub fn new(renderers: Vec<Box<dyn EventRenderer>>) -> Self {
        Self { renderers }
    }
}

impl EventRenderer for FanoutRenderer {
    fn name(&self) -> &str {
        "fanout"
    }

    fn format(&self) -> &str {
        self.renderers.first().map(|r| r.format()).unwrap_or("text")
    }

    fn render(&self, event: &SchedulerEvent) {
        for renderer in &self.renderers {
            renderer.render(event);
        }
    }
}
