use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::events::{Alert, EventStream, RunOutcome, SchedulerEvent};
use super::history::RunHistory;
use super::render::EventRenderer;
use super::report::ExecutionReport;
use super::selector::select_next_task;
use crate::capability::{ExecutionEvent, Summarizer, TaskExecutor, TaskOutput, TaskRequest};
use crate::config::SchedulerConfig;
use crate::error::CapabilityError;
use crate::graph::TaskGraph;
use crate::plan::{generate_run_id, Plan, PlanStore, TaskStatus};

/// Cooperative, single-lane plan executor.
///
/// At most one task is `InProgress` at a time. Every mutation goes through a
/// [`PlanStore`] and is published as a [`SchedulerEvent::Snapshot`].
#[derive(Clone)]
pub struct ExecutionScheduler {
    executor: Arc<dyn TaskExecutor>,
    summarizer: Arc<dyn Summarizer>,
    config: SchedulerConfig,
}

/// Control surface of a started run.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    run_id: String,
    store: PlanStore,
    cancel: CancellationToken,
}

impl ExecutionHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Shared store; collaborators may append tasks while the run is live.
    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<Plan> {
        self.store.snapshot()
    }

    /// Stop the run. The in-flight task, if any, is marked `Failed`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl ExecutionScheduler {
    pub fn new(executor: Arc<dyn TaskExecutor>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            executor,
            summarizer,
            config: SchedulerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn start_execution(&self, plan: Plan) -> (ExecutionHandle, EventStream) {
        self.start_with_store(PlanStore::new(plan))
    }

    /// Start a run over an existing store. Nothing happens until the returned
    /// stream is polled; dropping it abandons the run.
    pub fn start_with_store(&self, store: PlanStore) -> (ExecutionHandle, EventStream) {
        let handle = ExecutionHandle {
            run_id: generate_run_id(),
            store,
            cancel: CancellationToken::new(),
        };
        let events = run_loop(self.clone(), handle.clone());
        (handle, events)
    }

    /// Run `plan` to its end and collect the outcome.
    pub async fn run_to_completion(&self, plan: Plan) -> ExecutionReport {
        let (handle, events) = self.start_execution(plan);
        ExecutionReport::collect(&handle, events, None).await
    }

    /// Like [`run_to_completion`](Self::run_to_completion), forwarding every
    /// event to `renderer` as it happens.
    pub async fn run_with_renderer(
        &self,
        plan: Plan,
        renderer: &dyn EventRenderer,
    ) -> ExecutionReport {
        let (handle, events) = self.start_execution(plan);
        ExecutionReport::collect(&handle, events, Some(renderer)).await
    }
}

enum TaskEnd {
    Done(TaskOutput),
    Failed(CapabilityError),
}

fn run_loop(scheduler: ExecutionScheduler, handle: ExecutionHandle) -> EventStream {
    let ExecutionScheduler {
        executor,
        summarizer,
        config,
    } = scheduler;
    let ExecutionHandle {
        run_id,
        store,
        cancel,
    } = handle;

    let stream = async_stream::stream! {
        let started = Instant::now();
        let initial = store.snapshot();
        tracing::info!(run_id = %run_id, tasks = initial.len(), executor = executor.name(), "run started");
        yield SchedulerEvent::RunStarted { run_id: run_id.clone(), total_tasks: initial.len() };

        if config.reject_cyclic_plans {
            let checked = TaskGraph::from_plan(&initial).and_then(|graph| graph.validate());
            if let Err(error) = checked {
                tracing::error!(run_id = %run_id, "plan rejected: {}", error);
                yield SchedulerEvent::Alert(Alert::new(format!("Plan rejected: {error}")));
                yield SchedulerEvent::Finished(RunOutcome::Rejected { error });
                return;
            }
        }
        yield SchedulerEvent::Snapshot(initial);

        let poll_interval = Duration::from_millis(config.idle_poll_interval_ms);
        let timeout_secs = config.effective_task_timeout_secs();
        let mut history = RunHistory::new(config.history_entry_max_chars);
        let mut idle_polls: u32 = 0;

        let outcome = loop {
            if cancel.is_cancelled() {
                break RunOutcome::Cancelled { task_id: None };
            }

            let plan = store.snapshot();
            if plan.is_finished() {
                let log = history.as_text();
                let summary = tokio::select! {
                    _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
                    res = summarizer.summarize(&plan, &log) => res,
                };
                match summary {
                    Ok(text) => {
                        yield SchedulerEvent::Summary(text.clone());
                        break RunOutcome::Completed { summary: Some(text) };
                    }
                    Err(CapabilityError::Cancelled) => {
                        break RunOutcome::Cancelled { task_id: None };
                    }
                    Err(err) => {
                        tracing::warn!(run_id = %run_id, "summary failed: {}", err);
                        yield SchedulerEvent::Alert(Alert::new(format!("Mission summary unavailable: {err}")));
                        break RunOutcome::Completed { summary: None };
                    }
                }
            }

            let Some(task) = select_next_task(&plan) else {
                idle_polls += 1;
                let pending: Vec<String> = plan.unfinished().map(|t| t.id.clone()).collect();
                if idle_polls > config.max_idle_polls {
                    tracing::warn!(run_id = %run_id, pending = ?pending, "no eligible task after {} polls", config.max_idle_polls);
                    yield SchedulerEvent::Alert(Alert::new(format!(
                        "Execution stalled: no runnable task among {}",
                        pending.join(", ")
                    )));
                    break RunOutcome::Stalled { pending };
                }
                tracing::debug!(run_id = %run_id, attempt = idle_polls, "no eligible task, waiting");
                yield SchedulerEvent::Idle { attempt: idle_polls, pending };
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(poll_interval) => {}
                }
                continue;
            };
            idle_polls = 0;

            let task_id = task.id.clone();
            let request = TaskRequest {
                task_id: task_id.clone(),
                description: task.description.clone(),
                context: history.context_for(&plan),
            };

            match store.update(|p| p.update_task_status(&task_id, TaskStatus::InProgress)) {
                Ok(snapshot) => yield SchedulerEvent::Snapshot(snapshot),
                Err(err) => {
                    // status changed under us; re-evaluate on the next pass
                    tracing::warn!(run_id = %run_id, task_id = %task_id, "cannot start task: {}", err);
                    continue;
                }
            }
            tracing::info!(run_id = %run_id, task_id = %task_id, "task started");
            yield SchedulerEvent::TaskStarted { task_id: task_id.clone(), description: request.description.clone() };

            let task_cancel = cancel.child_token();
            let deadline = tokio::time::sleep(Duration::from_secs(timeout_secs));
            tokio::pin!(deadline);

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
                _ = &mut deadline => Err(CapabilityError::Timeout(timeout_secs)),
                res = executor.execute_task(request, task_cancel.clone()) => res,
            };

            let end = match opened {
                Err(err) => TaskEnd::Failed(err),
                Ok(mut chunks) => {
                    let mut chunk_count = 0usize;
                    let end = loop {
                        let next = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
                            _ = &mut deadline => Err(CapabilityError::Timeout(timeout_secs)),
                            item = chunks.next() => Ok(item),
                        };
                        match next {
                            Err(err) | Ok(Some(Err(err))) => break TaskEnd::Failed(err),
                            Ok(None) => break TaskEnd::Done(TaskOutput::default()),
                            Ok(Some(Ok(ExecutionEvent::Done(output)))) => break TaskEnd::Done(output),
                            Ok(Some(Ok(ExecutionEvent::Chunk(text)))) => {
                                chunk_count += 1;
                                match store.update(|p| p.append_result(&task_id, &text)) {
                                    Ok(snapshot) => {
                                        yield SchedulerEvent::TaskChunk { task_id: task_id.clone(), text };
                                        yield SchedulerEvent::Snapshot(snapshot);
                                    }
                                    Err(err) => tracing::warn!(task_id = %task_id, "dropping chunk: {}", err),
                                }
                            }
                            Ok(Some(Ok(ExecutionEvent::Citation(citation)))) => {
                                match store.update(|p| p.add_citations(&task_id, std::slice::from_ref(&citation))) {
                                    Ok(snapshot) => yield SchedulerEvent::Snapshot(snapshot),
                                    Err(err) => tracing::warn!(task_id = %task_id, "dropping citation: {}", err),
                                }
                            }
                        }
                    };
                    tracing::debug!(task_id = %task_id, chunks = chunk_count, "executor stream closed");
                    end
                }
            };
            task_cancel.cancel();

            let end = match end {
                TaskEnd::Done(output) => {
                    match store.update(|p| p.complete_task(&task_id, &output.text, &output.citations)) {
                        Ok(snapshot) => {
                            let result = snapshot.task(&task_id).map(|t| t.result.clone()).unwrap_or_default();
                            history.record(&task_id, &result);
                            tracing::info!(run_id = %run_id, task_id = %task_id, "task completed");
                            yield SchedulerEvent::Snapshot(snapshot);
                            yield SchedulerEvent::TaskCompleted { task_id: task_id.clone() };
                            None
                        }
                        Err(err) => Some(CapabilityError::Executor(err.to_string())),
                    }
                }
                TaskEnd::Failed(err) => Some(err),
            };

            if let Some(error) = end {
                match store.update(|p| p.fail_task(&task_id)) {
                    Ok(snapshot) => yield SchedulerEvent::Snapshot(snapshot),
                    Err(err) => tracing::warn!(task_id = %task_id, "cannot mark task failed: {}", err),
                }
                tracing::error!(run_id = %run_id, task_id = %task_id, "task failed: {}", error);
                yield SchedulerEvent::TaskFailed { task_id: task_id.clone(), error: error.clone() };
                yield SchedulerEvent::Alert(Alert::for_task(
                    task_id.clone(),
                    format!("Task {task_id} failed: {error}. Execution halted."),
                ));
                if error == CapabilityError::Cancelled {
                    break RunOutcome::Cancelled { task_id: Some(task_id) };
                }
                break RunOutcome::Failed { task_id, error };
            }
        };

        tracing::info!(
            run_id = %run_id,
            outcome = outcome.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        yield SchedulerEvent::Finished(outcome);
    };

    stream.boxed()
}
