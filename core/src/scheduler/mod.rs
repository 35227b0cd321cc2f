//! Execution scheduler: walks a plan one eligible task at a time.
//!
//! ```text
//! PlanStore ──snapshot──▶ select_next_task ──▶ TaskExecutor::execute_task
//!     ▲                                              │ chunks
//!     └──────── append_result / complete / fail ◀────┘
//! ```
//!
//! The loop ends when every task is terminal (then the summarizer runs once),
//! on the first task failure, on cancellation, or when no task becomes
//! eligible within `max_idle_polls`.

mod engine;
mod events;
mod history;
mod render;
mod report;
mod selector;

pub use engine::{ExecutionHandle, ExecutionScheduler};
pub use events::{snapshots, Alert, EventStream, RunOutcome, SchedulerEvent};
pub use history::RunHistory;
pub use render::EventRenderer;
pub use report::ExecutionReport;
pub use selector::select_next_task;
