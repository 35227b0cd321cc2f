use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "taskpilot", version, about = "Plan and execute dependency-graphed task plans")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Load configuration from this file instead of the default locations.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Plain ASCII output (no symbols).
    #[arg(long, global = true, default_value_t = false)]
    pub ascii: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub goal: String,

    /// Run the strategist/critic review loop instead of single-pass planning.
    #[arg(long, default_value_t = false)]
    pub review: bool,

    /// Write the plan JSON here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Context strings handed to every task (repeatable).
    #[arg(long = "ground", action = clap::ArgAction::Append)]
    pub grounding: Vec<String>,

    /// Use the offline echo backend.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Plan JSON file.
    #[arg(long)]
    pub plan: PathBuf,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show progress bars on stderr (text format only).
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Echo task output as it streams (text format only).
    #[arg(long, default_value_t = false)]
    pub show_output: bool,

    /// Emit a record per plan snapshot (jsonl format only).
    #[arg(long, default_value_t = false)]
    pub snapshots: bool,

    /// Write the final plan snapshot here.
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Plan JSON file.
    #[arg(long)]
    pub plan: PathBuf,

    /// Simulate the failure of this task.
    #[arg(long)]
    pub fail: Option<String>,

    #[arg(long, value_enum, default_value_t = AnalyzeFormat::Text)]
    pub format: AnalyzeFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decompose a goal into a plan.
    Plan(PlanArgs),
    /// Execute a plan.
    Run(RunArgs),
    /// Blocking, depth layers, stages and failure cascade of a plan.
    Analyze(AnalyzeArgs),
}
