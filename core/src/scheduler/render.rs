use super::events::SchedulerEvent;

/// Presents scheduler events to a user or another process.
pub trait EventRenderer: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &SchedulerEvent);
}
