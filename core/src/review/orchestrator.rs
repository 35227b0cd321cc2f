use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use super::critique::{parse_critique, Critique};
use super::roles::{Agent, AgentRole};
use crate::capability::prompts::plan_prompt;
use crate::capability::{CompletionBackend, Planner};
use crate::config::{PlannerConfig, ReviewConfig};
use crate::error::{CapabilityError, PlanningError};
use crate::plan::Plan;
use crate::planning::{check_generated_plan, generate_plan_with_retry, parse_plan_response};

/// One critique round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRound {
    pub iteration: u32,
    pub critique: Critique,
    /// The critic call failed or its answer had no score.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    pub proposal: String,
    pub score: u8,
    pub accepted: bool,
    pub rounds: Vec<ReviewRound>,
    /// Analyst's read-only feasibility pass; `None` when it failed.
    pub feasibility: Option<Critique>,
}

impl ReviewOutcome {
    pub fn iterations(&self) -> u32 {
        self.rounds.len() as u32
    }
}

/// Generate, critique and refine a proposal until it clears the acceptance
/// threshold or the iteration cap is reached.
///
/// Holds no state between runs; build one per planning session.
#[derive(Debug, Clone)]
pub struct ReviewLoop {
    strategist: Agent,
    critic: Agent,
    analyst: Option<Agent>,
    config: ReviewConfig,
}

impl ReviewLoop {
    /// All three roles on one backend.
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            strategist: Agent::new(AgentRole::Strategist, backend.clone()),
            critic: Agent::new(AgentRole::Critic, backend.clone()),
            analyst: Some(Agent::new(AgentRole::Analyst, backend)),
            config: ReviewConfig::default(),
        }
    }

    pub fn with_agents(strategist: Agent, critic: Agent, analyst: Option<Agent>) -> Self {
        Self {
            strategist,
            critic,
            analyst,
            config: ReviewConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReviewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn agents(&self) -> Vec<&Agent> {
        let mut agents = vec![&self.strategist, &self.critic];
        agents.extend(self.analyst.as_ref());
        agents
    }

    /// Only a failed initial proposal is an error. Critic failures degrade to
    /// a neutral score; a failed refinement keeps the previous proposal.
    pub async fn run(&self, goal: &str) -> Result<ReviewOutcome, CapabilityError> {
        let max_iterations = self.config.max_iterations.max(1);
        let mut proposal = self.strategist.execute(&plan_prompt(goal), "").await?;
        let mut rounds: Vec<ReviewRound> = Vec::new();
        let mut accepted = false;

        for iteration in 1..=max_iterations {
            let (critique, degraded) = self.evaluate(goal, &proposal).await;
            tracing::info!(
                iteration,
                score = critique.score,
                degraded,
                "proposal reviewed"
            );
            let score = critique.score;
            let feedback = critique.top_feedback(self.config.feedback_items).to_vec();
            rounds.push(ReviewRound {
                iteration,
                critique,
                degraded,
            });

            if score >= self.config.acceptance_threshold {
                accepted = true;
                break;
            }
            if iteration == max_iterations {
                break;
            }

            match self
                .strategist
                .execute(&refinement_prompt(goal, &feedback), &proposal)
                .await
            {
                Ok(refined) => proposal = refined,
                Err(err) => {
                    tracing::warn!(iteration, "refinement failed, keeping last proposal: {}", err);
                    break;
                }
            }
        }

        let feasibility = match &self.analyst {
            Some(analyst) => self.feasibility(analyst, goal, &proposal).await,
            None => None,
        };

        Ok(ReviewOutcome {
            score: rounds.last().map(|r| r.critique.score).unwrap_or(0),
            proposal,
            accepted,
            rounds,
            feasibility,
        })
    }

    async fn evaluate(&self, goal: &str, proposal: &str) -> (Critique, bool) {
        let neutral = self.config.neutral_score;
        match self.critic.execute(&critique_prompt(goal), proposal).await {
            Ok(text) => match parse_critique(&text) {
                Some(critique) => (critique, false),
                None => {
                    tracing::warn!("critic answer has no score, using neutral score");
                    (Critique::neutral(neutral, "unparseable critique"), true)
                }
            },
            Err(err) => {
                tracing::warn!("critic call failed, using neutral score: {}", err);
                (Critique::neutral(neutral, &err.to_string()), true)
            }
        }
    }

    async fn feasibility(&self, analyst: &Agent, goal: &str, proposal: &str) -> Option<Critique> {
        match analyst.execute(&feasibility_prompt(goal), proposal).await {
            Ok(text) => parse_critique(&text),
            Err(err) => {
                tracing::warn!("feasibility pass failed: {}", err);
                None
            }
        }
    }
}

fn critique_prompt(goal: &str) -> String {
    format!("Evaluate the plan in the context against the goal: {goal}")
}

fn feasibility_prompt(goal: &str) -> String {
    format!("Assess whether the plan in the context can realistically achieve: {goal}")
}

fn refinement_prompt(goal: &str, feedback: &[String]) -> String {
    let mut out = format!(
        "Revise the plan in the context for the goal: {goal}\n\
         Address this feedback and answer with the full revised JSON task list:\n"
    );
    for item in feedback {
        out.push_str("- ");
        out.push_str(item);
        out.push('\n');
    }
    out
}

/// Planner that runs a [`ReviewLoop`] and parses the final proposal.
///
/// The review trail of the last successful attempt is kept for callers that
/// drive it through [`generate_plan_with_retry`].
#[derive(Debug)]
pub struct ReviewPlanner {
    review: ReviewLoop,
    min_tasks: usize,
    last_outcome: Mutex<Option<ReviewOutcome>>,
}

impl ReviewPlanner {
    pub fn new(review: ReviewLoop) -> Self {
        Self {
            review,
            min_tasks: PlannerConfig::default().min_tasks,
            last_outcome: Mutex::new(None),
        }
    }

    pub fn with_min_tasks(mut self, min_tasks: usize) -> Self {
        self.min_tasks = min_tasks;
        self
    }

    /// The plan together with the review trail that produced it.
    pub async fn plan_with_review(&self, goal: &str) -> Result<(Plan, ReviewOutcome), PlanningError> {
        let outcome = self.review.run(goal).await?;
        let plan = parse_plan_response(goal, &outcome.proposal)?;
        check_generated_plan(&plan, self.min_tasks)?;
        Ok((plan, outcome))
    }

    /// Like [`plan_with_review`](Self::plan_with_review), but a malformed or
    /// too short final proposal reruns the whole review under `config.retry`.
    pub async fn plan_with_review_retrying(
        &self,
        goal: &str,
        config: &PlannerConfig,
    ) -> Result<(Plan, ReviewOutcome), PlanningError> {
        let plan = generate_plan_with_retry(self, goal, config).await?;
        let outcome = self
            .last_outcome
            .lock()
            .ok()
            .and_then(|mut last| last.take())
            .ok_or_else(|| PlanningError::Malformed("review trail missing".into()))?;
        Ok((plan, outcome))
    }
}

#[async_trait]
impl Planner for ReviewPlanner {
    fn name(&self) -> &str {
        "review"
    }

    async fn generate_plan(&self, goal: &str) -> Result<Plan, PlanningError> {
        let (plan, outcome) = self.plan_with_review(goal).await?;
        if let Ok(mut last) = self.last_outcome.lock() {
            *last = Some(outcome);
        }
        Ok(plan)
    }
}
