use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::CompletionBackend;
use crate::error::CapabilityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Proposes and refines plans.
    Strategist,
    /// Scores feasibility of the accepted proposal.
    Analyst,
    /// Scores proposals and lists concrete improvements.
    Critic,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [Self::Strategist, Self::Analyst, Self::Critic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategist => "strategist",
            Self::Analyst => "analyst",
            Self::Critic => "critic",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            Self::Strategist => {
                "You are the Strategist. Produce clear, actionable plans as a JSON task list."
            }
            Self::Analyst => {
                "You are the Analyst. Judge how feasible the plan is with the stated resources. \
                 Reply with JSON: {\"score\": 0-100, \"feedback\": [\"...\"]}."
            }
            Self::Critic => {
                "You are the Critic. Score the plan for completeness, ordering and risk. \
                 Reply with JSON: {\"score\": 0-100, \"feedback\": [\"...\"]}."
            }
        }
    }

    pub fn ui(self) -> AgentUi {
        match self {
            Self::Strategist => AgentUi {
                title: "Strategist".into(),
                badge: "PLAN".into(),
                placeholder: "Drafting a plan...".into(),
            },
            Self::Analyst => AgentUi {
                title: "Analyst".into(),
                badge: "FEAS".into(),
                placeholder: "Checking feasibility...".into(),
            },
            Self::Critic => AgentUi {
                title: "Critic".into(),
                badge: "REVIEW".into(),
                placeholder: "Reviewing the proposal...".into(),
            },
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a front end shows for an agent before it has produced anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentUi {
    pub title: String,
    pub badge: String,
    pub placeholder: String,
}

/// A role bound to a completion backend.
#[derive(Clone)]
pub struct Agent {
    role: AgentRole,
    backend: Arc<dyn CompletionBackend>,
}

impl Agent {
    pub fn new(role: AgentRole, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { role, backend }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub async fn execute(&self, prompt: &str, context: &str) -> Result<String, CapabilityError> {
        tracing::debug!(role = %self.role, backend = self.backend.name(), "agent call");
        let prompt = format!("{}\n\n{}", self.role.instructions(), prompt);
        self.backend.complete(&prompt, context).await
    }

    pub fn initial_ui(&self) -> AgentUi {
        self.role.ui()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("backend", &self.backend.name())
            .finish()
    }
}
