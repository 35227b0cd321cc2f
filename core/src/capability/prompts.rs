//! Prompt templates for the model-backed capabilities.

use crate::plan::Plan;

pub fn plan_prompt(goal: &str) -> String {
    format!(
        "You are a mission planner. Break the goal below into a small set of concrete tasks.\n\
         Respond with JSON only: an array of objects with the fields\n\
         \"id\" (string), \"description\" (string), \"priority\" (\"high\" | \"medium\" | \"low\"),\n\
         \"dependencies\" (array of task ids that must finish first) and optionally \"category\".\n\
         Do not create circular dependencies.\n\n\
         Goal: {goal}"
    )
}

pub fn task_prompt(description: &str) -> String {
    format!(
        "Carry out the following task as part of the mission described in the context.\n\
         Cite any sources you rely on as markdown links.\n\n\
         Task: {description}"
    )
}

pub fn summary_prompt(plan: &Plan, history: &str) -> String {
    let mut tasks = String::new();
    for task in plan.tasks() {
        tasks.push_str(&format!(
            "- [{}] {} ({})\n",
            task.id, task.description, task.status
        ));
    }
    format!(
        "Write a concise mission summary for the goal \"{}\".\n\
         Highlight what was achieved and any open risks.\n\n\
         Tasks:\n{}\n\
         Execution log:\n{}",
        plan.goal(),
        tasks,
        history
    )
}

/// Context string for one task: goal, grounding data, then prior outputs.
pub fn task_context(plan: &Plan, history: &str) -> String {
    let mut out = format!("Mission goal: {}\n", plan.goal());
    if !plan.grounding_data().is_empty() {
        out.push_str("Grounding data:\n");
        for item in plan.grounding_data() {
            out.push_str("- ");
            out.push_str(item);
            out.push('\n');
        }
    }
    if !history.is_empty() {
        out.push_str("Previous results:\n");
        out.push_str(history);
        if !history.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}
