use std::sync::Arc;

use tokio::sync::watch;

use super::model::Plan;
use crate::error::PlanError;

/// Shared holder of the current plan snapshot.
///
/// Writers replace the whole snapshot atomically; readers only ever see a
/// complete `Arc<Plan>`. Cloning the store shares the same snapshot.
#[derive(Clone)]
pub struct PlanStore {
    tx: Arc<watch::Sender<Arc<Plan>>>,
}

impl PlanStore {
    pub fn new(plan: Plan) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(plan));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Plan> {
        self.tx.borrow().clone()
    }

    /// Receive a notification whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Plan>> {
        self.tx.subscribe()
    }

    /// Apply a copy-on-write mutation and publish the result.
    ///
    /// The read-modify-publish sequence holds the channel's write lock, so two
    /// concurrent writers cannot lose each other's update. On error nothing is
    /// published.
    pub fn update<F>(&self, f: F) -> Result<Arc<Plan>, PlanError>
    where
        F: FnOnce(&Plan) -> Result<Plan, PlanError>,
    {
        let mut outcome = None;
        self.tx.send_if_modified(|current| match f(current) {
            Ok(next) => {
                let next = Arc::new(next);
                *current = next.clone();
                outcome = Some(Ok(next));
                true
            }
            Err(err) => {
                outcome = Some(Err(err));
                false
            }
        });

        // send_if_modified always runs the closure exactly once
        outcome.unwrap_or_else(|| Ok(self.snapshot()))
    }

    /// Replace the snapshot wholesale (e.g. when a new mission starts).
    pub fn replace(&self, plan: Plan) -> Arc<Plan> {
        let next = Arc::new(plan);
        self.tx.send_replace(next.clone());
        next
    }
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore")
            .field("tasks", &self.snapshot().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{NewTask, Task, TaskStatus};

    fn store() -> PlanStore {
        PlanStore::new(Plan::new("g", vec![Task::new("1", "a")]).unwrap())
    }

    #[test]
    fn test_update_publishes_new_snapshot() {
        let store = store();
        let before = store.snapshot();
        let after = store
            .update(|p| p.update_task_status("1", TaskStatus::InProgress))
            .unwrap();

        assert_eq!(before.task("1").unwrap().status, TaskStatus::Pending);
        assert_eq!(after.task("1").unwrap().status, TaskStatus::InProgress);
        assert_eq!(store.snapshot(), after);
    }

    #[test]
    fn test_failed_update_publishes_nothing() {
        let store = store();
        let before = store.snapshot();
        assert!(store.update(|p| p.append_result("1", "x")).is_err());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let store = store();
        let mut rx = store.subscribe();
        let writer = store.clone();
        writer
            .update(|p| Ok(p.append_task(NewTask::new("b"))?.0))
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 2);
    }
}
