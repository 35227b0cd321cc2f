//! Turning a goal into a validated plan.

mod parse;
mod retry;

pub use parse::parse_plan_response;
pub use retry::{check_generated_plan, generate_plan_with_retry, BackoffPolicy};
