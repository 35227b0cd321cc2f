//! Multi-agent plan review: a strategist proposes, a critic scores, an
//! analyst gives a final feasibility read.

mod critique;
mod orchestrator;
mod roles;

pub use critique::{parse_critique, Critique};
pub use orchestrator::{ReviewLoop, ReviewOutcome, ReviewPlanner, ReviewRound};
pub use roles::{Agent, AgentRole, AgentUi};
