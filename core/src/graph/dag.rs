use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::error::PlanError;
use crate::plan::{Plan, Task};

/// Dependency graph view over a task list.
///
/// Edges point from a task to the tasks it depends on. Dependency ids that do
/// not name a task in the list are kept as dangling references: they never
/// block, never count towards in-degree, and never take part in cycles.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// Dependency edges: task_id -> known dependencies (deduplicated)
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: id -> tasks that list it as a dependency (declaration order).
    /// Keys may be dangling ids.
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Dependencies that reference no task: (task_id, missing dependency)
    dangling: Vec<(String, String)>,

    /// Original insertion order (for stable sorting)
    insertion_order: Vec<String>,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Execution layers in declaration order.
    pub stages: Vec<Vec<String>>,
    /// Dependency ids that reference no task, as (task_id, missing dependency).
    pub dangling: Vec<(String, String)>,
}

impl TaskGraph {
    /// Construct the graph from a task list, rejecting duplicate ids.
    pub fn from_tasks(tasks: &[Task]) -> Result<Self, PlanError> {
        let mut known: HashSet<&str> = HashSet::with_capacity(tasks.len());
        for task in tasks {
            if !known.insert(task.id.as_str()) {
                return Err(PlanError::DuplicateTaskId(task.id.clone()));
            }
        }

        let mut edges = HashMap::with_capacity(tasks.len());
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut dangling = Vec::new();
        let mut insertion_order = Vec::with_capacity(tasks.len());

        for task in tasks {
            let mut seen = HashSet::new();
            let mut deps = Vec::new();
            for dep in &task.dependencies {
                if !seen.insert(dep.as_str()) {
                    continue;
                }
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
                if known.contains(dep.as_str()) {
                    deps.push(dep.clone());
                } else {
                    dangling.push((task.id.clone(), dep.clone()));
                }
            }
            edges.insert(task.id.clone(), deps);
            insertion_order.push(task.id.clone());
        }

        Ok(Self {
            edges,
            reverse_edges,
            dangling,
            insertion_order,
        })
    }

    pub fn from_plan(plan: &Plan) -> Result<Self, PlanError> {
        Self::from_tasks(plan.tasks())
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Tasks that directly depend on `id`.
    pub fn dependents(&self, id: &str) -> &[String] {
        self.reverse_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dangling_dependencies(&self) -> &[(String, String)] {
        &self.dangling
    }

    /// Validate the graph: no cycles among known tasks.
    pub fn validate(&self) -> Result<ValidationReport, PlanError> {
        if let Some(cycle) = self.detect_cycle() {
            return Err(PlanError::CircularDependency(cycle));
        }

        for (task_id, dep) in &self.dangling {
            tracing::warn!(
                "task '{}' depends on unknown task '{}'; treated as satisfied",
                task_id,
                dep
            );
        }

        Ok(ValidationReport {
            stages: self.topological_stages()?,
            dangling: self.dangling.clone(),
        })
    }

    /// Topological layering using Kahn's algorithm.
    ///
    /// Tasks in the same stage have no dependency on each other. Within a
    /// stage, declaration order is preserved.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn topological_stages(&self) -> Result<Vec<Vec<String>>, PlanError> {
        let position: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        // edges[A] = [B, C] means A depends on B and C, so A's in-degree = 2
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut current_stage: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree.get(id.as_str()).copied() == Some(0))
            .cloned()
            .collect();

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut processed = 0;

        while !current_stage.is_empty() {
            processed += current_stage.len();

            let mut next_stage = Vec::new();
            for task_id in &current_stage {
                for dependent in self.dependents(task_id) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            next_stage.push(dependent.clone());
                        }
                    }
                }
            }

            next_stage.sort_by_key(|id| position.get(id.as_str()).copied().unwrap_or(usize::MAX));
            stages.push(std::mem::replace(&mut current_stage, next_stage));
        }

        if processed != self.len() {
            let cycle = self
                .detect_cycle()
                .unwrap_or_else(|| "unable to complete topological sort".to_string());
            return Err(PlanError::CircularDependency(cycle));
        }

        Ok(stages)
    }

    /// Detect circular dependencies using DFS, returning the cycle path.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id.as_str())
                && self.dfs_cycle(task_id, &mut visited, &mut stack)
            {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> bool {
        visited.insert(node);
        stack.push(node);

        if let Some(dependencies) = self.edges.get(node) {
            for dep in dependencies {
                if let Some(pos) = stack.iter().position(|x| *x == dep.as_str()) {
                    stack.push(dep.as_str());
                    stack.drain(..pos);
                    return true;
                }

                if !visited.contains(dep.as_str()) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }

    /// True when `to` is reachable from `from` by following dependency edges,
    /// i.e. `from` (transitively) depends on `to`.
    pub fn depends_transitively(&self, from: &str, to: &str) -> bool {
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);

        while let Some(current) = queue.pop_front() {
            let Some(deps) = self.edges.get(current) else {
                continue;
            };
            for dep in deps {
                if dep == to {
                    return true;
                }
                if seen.insert(dep.as_str()) {
                    queue.push_back(dep.as_str());
                }
            }
        }

        false
    }
}

fn format_cycle_path(stack: &[&str]) -> String {
    stack.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, format!("task {id}")).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = TaskGraph::from_tasks(&[task("1", &[]), task("1", &[])]).unwrap_err();
        assert_eq!(err, PlanError::DuplicateTaskId("1".into()));
    }

    #[test]
    fn test_stages_preserve_declaration_order() {
        let tasks = vec![
            task("b", &[]),
            task("a", &[]),
            task("c", &["a", "b"]),
            task("d", &["b"]),
        ];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        let stages = graph.topological_stages().unwrap();
        assert_eq!(
            stages,
            vec![
                vec!["b".to_string(), "a".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn test_cycle_detected_with_path() {
        let tasks = vec![task("1", &["3"]), task("2", &["1"]), task("3", &["2"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        let cycle = graph.detect_cycle().unwrap();
        assert_eq!(cycle, "1 -> 3 -> 2 -> 1");
        assert!(matches!(
            graph.validate(),
            Err(PlanError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_dangling_dependencies_reported_not_rejected() {
        let tasks = vec![task("1", &["ghost"]), task("2", &["1"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        let report = graph.validate().unwrap();
        assert_eq!(report.dangling, vec![("1".to_string(), "ghost".to_string())]);
        assert_eq!(report.stages.len(), 2);
        assert_eq!(graph.dependents("ghost"), &["1".to_string()]);
    }

    #[test]
    fn test_duplicate_dependency_entries_counted_once() {
        let tasks = vec![task("1", &[]), task("2", &["1", "1"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        assert_eq!(graph.topological_stages().unwrap().len(), 2);
    }

    #[test]
    fn test_depends_transitively() {
        let tasks = vec![task("1", &[]), task("2", &["1"]), task("3", &["2"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        assert!(graph.depends_transitively("3", "1"));
        assert!(!graph.depends_transitively("1", "3"));
    }
}
