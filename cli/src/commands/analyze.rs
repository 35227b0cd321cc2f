use serde::Serialize;
use taskpilot_core::api::{
    blocking_dependencies, compute_depths, display_status, layers, simulate_failure,
    FailureSimulation, Plan, TaskGraph,
};

use super::cli::{AnalyzeArgs, AnalyzeFormat};
use super::read_plan;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct TaskRow {
    id: String,
    description: String,
    status: &'static str,
    depth: usize,
    blocked_by: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Analysis {
    goal: String,
    tasks: Vec<TaskRow>,
    layers: Vec<Vec<String>>,
    /// Execution stages; `None` when the graph has a cycle.
    stages: Option<Vec<Vec<String>>>,
    cycle: Option<String>,
    dangling: Vec<(String, String)>,
    failure: Option<FailureSimulation>,
}

pub fn analyze_cmd(args: AnalyzeArgs, ascii: bool) -> Result<i32, CliError> {
    let plan = read_plan(&args.plan)?;
    let analysis = analyze(&plan, args.fail.as_deref())?;

    match args.format {
        AnalyzeFormat::Json => {
            let json = serde_json::to_string_pretty(&analysis).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
        AnalyzeFormat::Text => print!("{}", format_text(&analysis, ascii)),
    }

    // a cyclic plan can never finish; report it as a plan error
    if let Some(cycle) = analysis.cycle {
        return Err(CliError::Plan(format!("circular dependency: {cycle}")));
    }
    Ok(0)
}

fn analyze(plan: &Plan, fail: Option<&str>) -> Result<Analysis, CliError> {
    let tasks = plan.tasks();
    let depths = compute_depths(tasks);

    let rows = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            description: task.description.clone(),
            status: display_status(task, tasks).as_str(),
            depth: depths.get(&task.id).copied().unwrap_or(0),
            blocked_by: blocking_dependencies(task, tasks)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();

    let graph = TaskGraph::from_plan(plan)?;
    let (stages, cycle) = match graph.validate() {
        Ok(report) => (Some(report.stages), None),
        Err(_) => (None, graph.detect_cycle()),
    };

    Ok(Analysis {
        goal: plan.goal().to_string(),
        tasks: rows,
        layers: layers(tasks),
        stages,
        cycle,
        dangling: graph.dangling_dependencies().to_vec(),
        failure: fail.map(|id| simulate_failure(plan, id)),
    })
}

fn format_text(a: &Analysis, ascii: bool) -> String {
    let arrow = if ascii { "->" } else { "→" };
    let mut out = String::new();

    out.push_str(&format!("Goal: {}\n\nTasks:\n", a.goal));
    for row in &a.tasks {
        out.push_str(&format!(
            "  [{}] {} ({}, depth {})",
            row.id, row.description, row.status, row.depth
        ));
        if !row.blocked_by.is_empty() {
            out.push_str(&format!(" blocked by {}", row.blocked_by.join(", ")));
        }
        out.push('\n');
    }

    out.push_str("\nLayers:\n");
    for (depth, ids) in a.layers.iter().enumerate() {
        out.push_str(&format!("  {}: {}\n", depth, ids.join(", ")));
    }

    match (&a.stages, &a.cycle) {
        (Some(stages), _) => {
            let rendered: Vec<String> = stages.iter().map(|s| s.join(" + ")).collect();
            out.push_str(&format!("\nStages: {}\n", rendered.join(&format!(" {arrow} "))));
        }
        (None, Some(cycle)) => out.push_str(&format!("\nCycle: {}\n", cycle)),
        (None, None) => {}
    }

    for (task_id, dep) in &a.dangling {
        out.push_str(&format!("Unknown dependency: {} {} {}\n", task_id, arrow, dep));
    }

    if let Some(sim) = &a.failure {
        out.push_str(&format!(
            "\nFailure cascade: {} (risk {:.1}%)\n",
            sim.cascade.join(&format!(" {arrow} ")),
            sim.risk_score
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskpilot_core::api::{Task, TaskStatus};

    fn plan() -> Plan {
        let tasks = vec![
            Task::new("1", "gather"),
            Task::new("2", "draft").with_dependencies(["1"]),
            Task::new("3", "review").with_dependencies(["2", "ghost"]),
        ];
        Plan::new("ship it", tasks).unwrap()
    }

    #[test]
    fn test_analysis_rows() {
        let a = analyze(&plan(), Some("2")).unwrap();
        assert_eq!(a.tasks[0].status, TaskStatus::Pending.as_str());
        assert_eq!(a.tasks[1].status, "blocked");
        assert_eq!(a.tasks[1].blocked_by, vec!["1".to_string()]);
        assert_eq!(a.tasks[2].depth, 2);
        assert_eq!(a.dangling, vec![("3".to_string(), "ghost".to_string())]);
        assert_eq!(a.failure.unwrap().cascade, vec!["2".to_string(), "3".to_string()]);
        assert!(a.cycle.is_none());
    }

    #[test]
    fn test_text_output_ascii() {
        let a = analyze(&plan(), None).unwrap();
        let text = format_text(&a, true);
        assert!(text.contains("Goal: ship it"));
        assert!(text.contains("[2] draft (blocked, depth 1) blocked by 1"));
        assert!(text.contains("Stages: 1 -> 2 -> 3"));
        assert!(text.contains("Unknown dependency: 3 -> ghost"));
        assert!(!text.contains("Failure cascade"));
    }

    #[test]
    fn test_cycle_reported_without_stages() {
        let tasks = vec![
            Task::new("1", "a").with_dependencies(["2"]),
            Task::new("2", "b").with_dependencies(["1"]),
        ];
        let a = analyze(&Plan::new("g", tasks).unwrap(), None).unwrap();
        assert!(a.stages.is_none());
        assert_eq!(a.cycle.as_deref(), Some("1 -> 2 -> 1"));
        assert!(format_text(&a, true).contains("Cycle: 1 -> 2 -> 1"));
    }
}
