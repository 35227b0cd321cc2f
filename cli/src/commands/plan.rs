use std::sync::Arc;

use taskpilot_core::api::{
    generate_plan_with_retry, AppConfig, ModelCapabilities, ReviewLoop, ReviewPlanner, TaskGraph,
};

use super::cli::PlanArgs;
use super::write_plan;
use crate::error::CliError;

pub async fn plan_cmd(args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let backend = taskpilot_plugins::factory::build_backend(cfg, args.dry_run)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let plan = if args.review {
        let review = ReviewLoop::new(backend).with_config(cfg.review.clone());
        let planner = ReviewPlanner::new(review).with_min_tasks(cfg.planner.min_tasks);
        let (plan, outcome) = planner
            .plan_with_review_retrying(&args.goal, &cfg.planner)
            .await?;
        eprintln!(
            "review: score {} after {} round(s){}",
            outcome.score,
            outcome.iterations(),
            if outcome.accepted { "" } else { " (below threshold)" }
        );
        if let Some(feasibility) = &outcome.feasibility {
            eprintln!("feasibility: {}", feasibility.score);
        }
        plan
    } else {
        let planner = ModelCapabilities::new(Arc::clone(&backend));
        generate_plan_with_retry(&planner, &args.goal, &cfg.planner).await?
    };

    let plan = if args.grounding.is_empty() {
        plan
    } else {
        plan.with_grounding_data(args.grounding)
    };

    let report = TaskGraph::from_plan(&plan)?.validate()?;
    eprintln!(
        "plan: {} task(s) in {} stage(s)",
        plan.len(),
        report.stages.len()
    );

    match &args.out {
        Some(path) => {
            write_plan(path, &plan)?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&plan).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
    }
    Ok(0)
}
