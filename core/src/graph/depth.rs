use std::collections::{HashMap, HashSet};

use crate::plan::Task;

/// Topological depth per task id.
///
/// Depth is 0 for a task without (known) dependencies and
/// `max(depth(dep)) + 1` otherwise. Unknown dependency ids are ignored.
/// When a traversal runs into a cycle, the back edge to the node closing the
/// cycle counts as depth 0 and the other members are computed from there.
/// Depths are memoised across traversals, so the values cycle members get
/// depend on which of them is reached first in plan order.
pub fn compute_depths(tasks: &[Task]) -> HashMap<String, usize> {
    let index: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut depths: HashMap<String, usize> = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let mut visiting = HashSet::new();
        depth_of(&task.id, &index, &mut depths, &mut visiting);
    }

    depths
}

fn depth_of<'a>(
    id: &'a str,
    index: &HashMap<&'a str, &'a Task>,
    depths: &mut HashMap<String, usize>,
    visiting: &mut HashSet<&'a str>,
) -> usize {
    if let Some(depth) = depths.get(id) {
        return *depth;
    }
    if !visiting.insert(id) {
        tracing::debug!("dependency cycle reached at task '{}'; using depth 0", id);
        return 0;
    }

    let Some(task) = index.get(id).copied() else {
        visiting.remove(id);
        return 0;
    };

    let depth = task
        .dependencies
        .iter()
        .filter(|dep| index.contains_key(dep.as_str()))
        .map(|dep| depth_of(dep, index, depths, visiting) + 1)
        .max()
        .unwrap_or(0);

    visiting.remove(id);
    depths.insert(id.to_string(), depth);
    depth
}

/// Tasks grouped by depth; each layer keeps plan order.
pub fn layers(tasks: &[Task]) -> Vec<Vec<String>> {
    let depths = compute_depths(tasks);
    let max_depth = depths.values().copied().max();

    let Some(max_depth) = max_depth else {
        return Vec::new();
    };

    let mut layers = vec![Vec::new(); max_depth + 1];
    for task in tasks {
        if let Some(depth) = depths.get(&task.id) {
            layers[*depth].push(task.id.clone());
        }
    }
    layers
}
