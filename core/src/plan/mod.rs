//! Task graph model: tasks, the plan that orders them, and the primitives
//! that mutate it.

pub mod id_gen;
pub mod model;
pub mod store;
pub mod transitions;
pub mod types;

pub use id_gen::{generate_run_id, next_task_id};
pub use model::Plan;
pub use store::PlanStore;
pub use transitions::{StatusTransition, TransitionError};
pub use types::{Citation, NewTask, Priority, Task, TaskMetadata, TaskStatus};
