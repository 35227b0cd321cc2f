use std::sync::Arc;

use taskpilot_core::api::{
    AppConfig, EventRenderer, ExecutionReport, ExecutionScheduler, ModelCapabilities,
};
use taskpilot_plugins::factory::{build_renderer, RenderOptions};

use super::cli::{OutputFormat, RunArgs};
use super::{read_plan, write_plan};
use crate::error::CliError;
use crate::progress::{FanoutRenderer, ProgressMonitor};

pub async fn run_cmd(args: RunArgs, cfg: &AppConfig, ascii: bool) -> Result<i32, CliError> {
    let plan = read_plan(&args.plan)?;
    let backend = taskpilot_plugins::factory::build_backend(cfg, args.dry_run)
        .map_err(|e| CliError::Config(e.to_string()))?;
    let caps = Arc::new(ModelCapabilities::new(backend));

    let scheduler =
        ExecutionScheduler::new(caps.clone(), caps).with_config(cfg.scheduler.clone());

    let opts = RenderOptions {
        ascii_only: ascii,
        show_output: args.show_output,
        snapshots: args.snapshots,
    };
    let mut renderers: Vec<Box<dyn EventRenderer>> =
        vec![build_renderer(args.format.as_str(), opts)];
    if args.progress && args.format == OutputFormat::Text {
        renderers.push(Box::new(ProgressMonitor::new(plan.len(), ascii)));
    }
    let renderer: Box<dyn EventRenderer> = Box::new(FanoutRenderer::new(renderers));

    let (handle, events) = scheduler.start_execution(plan);

    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            ctrl_c.cancel();
        }
    });

    let report = ExecutionReport::collect(&handle, events, Some(renderer.as_ref())).await;
    tracing::info!(
        run_id = %report.run_id,
        outcome = report.outcome.as_str(),
        executed = report.executed.len(),
        duration_ms = report.duration.as_millis() as u64,
        "run report"
    );

    if let Some(path) = &args.save {
        write_plan(path, &report.plan)?;
    }

    report.into_result()?;
    Ok(0)
}
