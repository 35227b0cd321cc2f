//! Read-only analyses over a task list: blocking, depth layering, failure
//! cascades and DAG validation.

pub mod blocking;
pub mod cascade;
pub mod dag;
pub mod depth;

pub use blocking::{blocking_dependencies, display_status, is_task_blocked};
pub use cascade::{simulate_failure, simulate_failure_in, FailureSimulation};
pub use dag::{TaskGraph, ValidationReport};
pub use depth::{compute_depths, layers};
