use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub review: ReviewConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "taskpilot_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 300;
pub const MAX_TASK_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Sleep between selection attempts while no task is eligible.
    #[serde(default = "default_idle_poll_interval_ms")]
    pub idle_poll_interval_ms: u64,

    /// Consecutive idle polls tolerated before the run is declared stalled.
    #[serde(default = "default_max_idle_polls")]
    pub max_idle_polls: u32,

    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Refuse to start a plan whose dependency graph has a cycle.
    #[serde(default = "default_true")]
    pub reject_cyclic_plans: bool,

    /// Truncate each history record to this many characters (0 = keep all).
    #[serde(default)]
    pub history_entry_max_chars: usize,
}

impl SchedulerConfig {
    pub fn effective_task_timeout_secs(&self) -> u64 {
        self.task_timeout_secs.clamp(1, MAX_TASK_TIMEOUT_SECS)
    }
}

fn default_idle_poll_interval_ms() -> u64 {
    500
}

fn default_max_idle_polls() -> u32 {
    20
}

fn default_task_timeout_secs() -> u64 {
    DEFAULT_TASK_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval_ms: default_idle_poll_interval_ms(),
            max_idle_polls: default_max_idle_polls(),
            task_timeout_secs: default_task_timeout_secs(),
            reject_cyclic_plans: true,
            history_entry_max_chars: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: u8,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How many critic feedback items are fed into a refinement prompt.
    #[serde(default = "default_feedback_items")]
    pub feedback_items: usize,

    /// Score assigned when an evaluation fails or cannot be parsed.
    #[serde(default = "default_neutral_score")]
    pub neutral_score: u8,
}

fn default_acceptance_threshold() -> u8 {
    85
}

fn default_max_iterations() -> u32 {
    3
}

fn default_feedback_items() -> usize {
    3
}

fn default_neutral_score() -> u8 {
    50
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            max_iterations: default_max_iterations(),
            feedback_items: default_feedback_items(),
            neutral_score: default_neutral_score(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_min_tasks")]
    pub min_tasks: usize,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_min_tasks() -> usize {
    1
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_tasks: default_min_tasks(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Subprocess model backend: a CLI that reads a prompt on stdin and writes
/// the answer to stdout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Per-call timeout for planner/summarizer/review calls.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
