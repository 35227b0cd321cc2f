pub mod capability;
pub mod codes;
pub mod plan;
pub mod scheduler;

pub use capability::{CapabilityError, PlanningError};
pub use codes::ErrorCode;
pub use plan::PlanError;
pub use scheduler::SchedulerError;
