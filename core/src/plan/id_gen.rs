use std::collections::HashSet;

use chrono::Local;
use uuid::Uuid;

/// Pick a task id not present in `existing`.
///
/// Ids are numeric strings continuing after the largest numeric id in use, so a
/// planner-produced `1..n` plan keeps growing as `n+1, n+2, ...`.
pub fn next_task_id<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    let max_numeric = taken
        .iter()
        .filter_map(|id| id.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    let mut candidate = max_numeric.max(taken.len() as u64).saturating_add(1);
    while taken.contains(candidate.to_string().as_str()) {
        candidate = candidate.saturating_add(1);
    }
    candidate.to_string()
}

/// Format: run-{YYYYMMDDHHmmss}-{random8}
pub fn generate_run_id() -> String {
    let ts = Local::now().format("%Y%m%d%H%M%S");
    let uuid = Uuid::new_v4().simple().to_string();
    let suffix = &uuid[..8];
    format!("run-{}-{}", ts, suffix)
}
