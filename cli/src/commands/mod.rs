pub mod analyze;
pub mod cli;
pub mod plan;
pub mod run;

use std::path::Path;

use taskpilot_core::api::Plan;

use crate::error::CliError;

/// Read a plan JSON file and re-check its invariants.
pub fn read_plan(path: &Path) -> Result<Plan, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Plan(format!("read {} failed: {e}", path.display())))?;
    let plan: Plan = serde_json::from_str(&raw)
        .map_err(|e| CliError::Plan(format!("parse {} failed: {e}", path.display())))?;
    plan.check_integrity()?;
    Ok(plan)
}

pub fn write_plan(path: &Path, plan: &Plan) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(plan).map_err(anyhow::Error::from)?;
    std::fs::write(path, json)?;
    Ok(())
}
