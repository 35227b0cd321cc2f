//! The plan: goal, grounding context and an ordered task list.
//!
//! Every mutation takes `&self` and returns a fresh `Plan`, so a snapshot handed
//! to a reader never changes underneath it.

use serde::{Deserialize, Serialize};

use super::id_gen::next_task_id;
use super::transitions::StatusTransition;
use super::types::{Citation, NewTask, Task, TaskStatus};
use crate::error::PlanError;
use crate::graph::TaskGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    goal: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    grounding_data: Vec<String>,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl Plan {
    /// Build a plan, rejecting duplicate ids and self-dependencies.
    pub fn new(goal: impl Into<String>, tasks: Vec<Task>) -> Result<Self, PlanError> {
        let plan = Self {
            goal: goal.into(),
            grounding_data: Vec::new(),
            tasks,
        };
        plan.check_integrity()?;
        Ok(plan)
    }

    pub fn with_grounding_data<I, S>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grounding_data = data.into_iter().map(Into::into).collect();
        self
    }

    /// Re-check the invariants `new` enforces; used for plans that arrive
    /// through deserialization.
    pub fn check_integrity(&self) -> Result<(), PlanError> {
        TaskGraph::from_tasks(&self.tasks)?;
        if let Some(task) = self.tasks.iter().find(|t| t.depends_on(&t.id)) {
            return Err(PlanError::SelfDependency(task.id.clone()));
        }
        Ok(())
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn grounding_data(&self) -> &[String] {
        &self.grounding_data
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks whose status is not terminal, in plan order.
    pub fn unfinished(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.status.is_terminal())
    }

    pub fn is_finished(&self) -> bool {
        self.unfinished().next().is_none()
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// An id not used by any task in this plan.
    pub fn next_task_id(&self) -> String {
        next_task_id(self.tasks.iter().map(|t| t.id.as_str()))
    }

    /// Append a task carrying its own id.
    pub fn add_task(&self, task: Task) -> Result<Plan, PlanError> {
        if self.task(&task.id).is_some() {
            return Err(PlanError::DuplicateTaskId(task.id));
        }
        if task.depends_on(&task.id) {
            return Err(PlanError::SelfDependency(task.id));
        }

        let mut next = self.clone();
        next.tasks.push(task);
        Ok(next)
    }

    /// Append a draft under a freshly allocated id.
    ///
    /// Fails when the draft lists the id it would receive.
    pub fn append_task(&self, draft: NewTask) -> Result<(Plan, String), PlanError> {
        let id = self.next_task_id();
        if draft.dependencies.contains(&id) {
            return Err(PlanError::SelfDependency(id));
        }
        let mut next = self.clone();
        next.tasks.push(draft.into_task(id.clone()));
        Ok((next, id))
    }

    /// Append sub-tasks produced by decomposing `parent_id`.
    ///
    /// Each draft gets a fresh id and `parent_id` metadata. Drafts without
    /// dependencies inherit the parent's dependencies.
    pub fn add_subtasks(
        &self,
        parent_id: &str,
        drafts: Vec<NewTask>,
    ) -> Result<(Plan, Vec<String>), PlanError> {
        let parent = self
            .task(parent_id)
            .ok_or_else(|| PlanError::TaskNotFound(parent_id.to_string()))?;
        let inherited = parent.dependencies.clone();

        let mut next = self.clone();
        let mut ids = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            if draft.dependencies.is_empty() {
                draft.dependencies = inherited.clone();
            }
            draft.metadata.parent_id = Some(parent_id.to_string());
            let id = next.next_task_id();
            if draft.dependencies.contains(&id) {
                return Err(PlanError::SelfDependency(id));
            }
            next.tasks.push(draft.into_task(id.clone()));
            ids.push(id);
        }

        Ok((next, ids))
    }

    /// Record that `target` depends on `source`.
    ///
    /// Rejects self-edges and edges that would close a cycle. Adding an edge
    /// that already exists is a no-op.
    pub fn add_dependency(&self, source: &str, target: &str) -> Result<Plan, PlanError> {
        if source == target {
            return Err(PlanError::SelfDependency(target.to_string()));
        }
        for id in [source, target] {
            if self.task(id).is_none() {
                return Err(PlanError::TaskNotFound(id.to_string()));
            }
        }
        if self.task(target).is_some_and(|t| t.depends_on(source)) {
            return Ok(self.clone());
        }

        let graph = TaskGraph::from_tasks(&self.tasks)?;
        if graph.depends_transitively(source, target) {
            return Err(PlanError::CircularDependency(format!(
                "{target} -> {source} closes a cycle ({source} already depends on {target})"
            )));
        }

        self.map_task(target, |task| {
            task.dependencies.push(source.to_string());
            Ok(())
        })
    }

    /// Move a task to `status`, validated against the state machine.
    ///
    /// Entering `InProgress` resets the result accumulator and citations.
    pub fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Plan, PlanError> {
        self.map_task(id, |task| {
            StatusTransition::validate(task.status, status).map_err(|source| {
                PlanError::Transition {
                    task_id: task.id.clone(),
                    source,
                }
            })?;
            if status == TaskStatus::InProgress {
                task.result.clear();
                task.citations.clear();
            }
            task.status = status;
            Ok(())
        })
    }

    /// Append streamed output to an executing task.
    pub fn append_result(&self, id: &str, chunk: &str) -> Result<Plan, PlanError> {
        self.map_task(id, |task| {
            ensure_in_progress(task)?;
            task.result.push_str(chunk);
            Ok(())
        })
    }

    /// Append citations to an executing task, skipping URIs it already has.
    pub fn add_citations(&self, id: &str, citations: &[Citation]) -> Result<Plan, PlanError> {
        self.map_task(id, |task| {
            ensure_in_progress(task)?;
            push_unique_citations(&mut task.citations, citations);
            Ok(())
        })
    }

    /// Seal an executing task as `Completed`.
    ///
    /// A non-empty `final_text` replaces the streamed accumulator.
    pub fn complete_task(
        &self,
        id: &str,
        final_text: &str,
        citations: &[Citation],
    ) -> Result<Plan, PlanError> {
        self.map_task(id, |task| {
            ensure_in_progress(task)?;
            if !final_text.is_empty() {
                task.result = final_text.to_string();
            }
            push_unique_citations(&mut task.citations, citations);
            task.status = TaskStatus::Completed;
            Ok(())
        })
    }

    /// Seal an executing task as `Failed`. Partial output is kept.
    pub fn fail_task(&self, id: &str) -> Result<Plan, PlanError> {
        self.update_task_status(id, TaskStatus::Failed)
    }

    fn map_task<F>(&self, id: &str, f: F) -> Result<Plan, PlanError>
    where
        F: FnOnce(&mut Task) -> Result<(), PlanError>,
    {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PlanError::TaskNotFound(id.to_string()))?;

        let mut next = self.clone();
        f(&mut next.tasks[idx])?;
        Ok(next)
    }
}

fn ensure_in_progress(task: &Task) -> Result<(), PlanError> {
    if task.status == TaskStatus::InProgress {
        Ok(())
    } else {
        Err(PlanError::ResultSealed {
            task_id: task.id.clone(),
            status: task.status,
        })
    }
}

fn push_unique_citations(target: &mut Vec<Citation>, incoming: &[Citation]) {
    for citation in incoming {
        if !target.iter().any(|c| c.uri == citation.uri) {
            target.push(citation.clone());
        }
    }
}
