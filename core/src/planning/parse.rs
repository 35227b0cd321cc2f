use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PlanningError;
use crate::plan::{next_task_id, Plan, Priority, Task, TaskMetadata};

#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "title", alias = "task")]
    description: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default, alias = "deps", alias = "depends_on")]
    dependencies: Vec<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

fn fenced_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*\n(.*?)```").expect("valid fenced block regex")
    })
}

/// Build a plan from a model's answer to a planning prompt.
///
/// Accepts a bare JSON array of tasks, an object with a `tasks` array, or
/// either of those inside a fenced code block, optionally surrounded by
/// prose. Tasks without an id get a fresh one.
pub fn parse_plan_response(goal: &str, text: &str) -> Result<Plan, PlanningError> {
    if goal.trim().is_empty() {
        return Err(PlanningError::MissingGoal);
    }

    let value = extract_json(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("tasks") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PlanningError::Malformed(
                    "expected a task array or an object with a `tasks` array".into(),
                ))
            }
        },
        _ => return Err(PlanningError::Malformed("expected a JSON task list".into())),
    };

    let mut raw = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let task: RawTask = serde_json::from_value(item)
            .map_err(|e| PlanningError::Malformed(format!("task #{}: {e}", idx + 1)))?;
        if task.description.trim().is_empty() {
            return Err(PlanningError::Malformed(format!(
                "task #{} has no description",
                idx + 1
            )));
        }
        raw.push(task);
    }

    let mut ids: Vec<Option<String>> = raw.iter().map(|t| t.id.as_ref().and_then(id_string)).collect();
    for slot in 0..ids.len() {
        if ids[slot].is_none() {
            let fresh = next_task_id(ids.iter().flatten().map(String::as_str));
            ids[slot] = Some(fresh);
        }
    }

    let tasks = raw
        .into_iter()
        .zip(ids)
        .map(|(raw, id)| {
            let mut task = Task::new(id.unwrap_or_default(), raw.description.trim())
                .with_priority(parse_priority(raw.priority.as_deref()))
                .with_dependencies(raw.dependencies.iter().filter_map(id_string));
            task.metadata = TaskMetadata {
                category: raw.category,
                duration: raw.duration,
                ..TaskMetadata::default()
            };
            task
        })
        .collect();

    Ok(Plan::new(goal.trim(), tasks)?)
}

fn extract_json(text: &str) -> Result<Value, PlanningError> {
    if let Some(caps) = fenced_block_regex().captures(text) {
        if let Some(body) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(body.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    // Prose around the payload: take the outermost bracketed span.
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Ok(value);
                }
            }
        }
    }

    Err(PlanningError::Malformed(
        "no JSON task list found in planner output".into(),
    ))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_priority(raw: Option<&str>) -> Priority {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("high") => Priority::High,
        Some("low") => Priority::Low,
        _ => Priority::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_array() {
        let plan = parse_plan_response(
            "goal",
            r#"[{"id":"1","description":"a","priority":"HIGH"},{"id":"2","description":"b","dependencies":["1"]}]"#,
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.tasks()[0].priority, Priority::High);
        assert_eq!(plan.tasks()[1].dependencies, vec!["1"]);
    }

    #[test]
    fn test_fenced_object_with_aliases_and_numeric_ids() {
        let text = "Here is the plan:\n```json\n{\"tasks\": [{\"id\": 1, \"title\": \"a\"}, {\"id\": 2, \"task\": \"b\", \"deps\": [1]}]}\n```\nGood luck!";
        let plan = parse_plan_response("goal", text).unwrap();
        assert_eq!(plan.tasks()[0].id, "1");
        assert_eq!(plan.tasks()[1].description, "b");
        assert_eq!(plan.tasks()[1].dependencies, vec!["1"]);
    }

    #[test]
    fn test_prose_around_array() {
        let plan = parse_plan_response(
            "goal",
            "Sure! [{\"description\":\"only\"}] Let me know.",
        )
        .unwrap();
        assert_eq!(plan.tasks()[0].id, "1");
    }

    #[test]
    fn test_missing_ids_do_not_collide() {
        let plan = parse_plan_response(
            "goal",
            r#"[{"description":"a"},{"id":"1","description":"b"}]"#,
        )
        .unwrap();
        let ids: Vec<_> = plan.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_missing_goal() {
        assert_eq!(
            parse_plan_response("  ", "[]").unwrap_err(),
            PlanningError::MissingGoal
        );
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            parse_plan_response("goal", "I cannot help with that."),
            Err(PlanningError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(matches!(
            parse_plan_response("goal", r#"[{"id":"1","description":" "}]"#),
            Err(PlanningError::Malformed(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        assert_eq!(
            parse_plan_response(
                "goal",
                r#"[{"id":"1","description":"a"},{"id":"1","description":"b"}]"#
            )
            .unwrap_err(),
            PlanningError::Plan(PlanError::DuplicateTaskId("1".into()))
        );
    }
}
