use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;
use crate::executor::types::{Plan, Step, StepId};

/// Indexed, read-only view of a plan's dependency graph
#[derive(Debug, Clone)]
pub struct PlanGraph {
    /// Step nodes: step_id -> Step
    pub nodes: HashMap<StepId, Step>,

    /// Dependency edges: step_id -> list of dependencies (declaration order)
    pub edges: HashMap<StepId, Vec<StepId>>,

    /// Original declaration order
    insertion_order: Vec<StepId>,
}

/// Structural problem found by [`PlanGraph::diagnose`].
///
/// None of these stop a run; they explain why steps would be left unreached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanIssue {
    DanglingDependency { step_id: StepId, missing_dep: StepId },
    SelfDependency { step_id: StepId },
    Cycle { path: Vec<StepId> },
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingDependency {
                step_id,
                missing_dep,
            } => write!(f, "step {step_id} depends on missing step {missing_dep}"),
            Self::SelfDependency { step_id } => write!(f, "step {step_id} depends on itself"),
            Self::Cycle { path } => write!(f, "dependency cycle: {}", format_cycle_path(path)),
        }
    }
}

impl PlanGraph {
    /// Construct the graph from a plan.
    ///
    /// Rejects only faults that would make step identity ambiguous: duplicate
    /// ids and id 0.
    pub fn from_plan(plan: &Plan) -> Result<Self, ExecutorError> {
        let mut nodes = HashMap::with_capacity(plan.len());
        let mut edges = HashMap::with_capacity(plan.len());
        let mut insertion_order = Vec::with_capacity(plan.len());

        for step in &plan.steps {
            if step.id == 0 {
                return Err(ExecutorError::InvalidStepId(step.id));
            }
            if nodes.contains_key(&step.id) {
                return Err(ExecutorError::DuplicateStepId(step.id));
            }

            nodes.insert(step.id, step.clone());
            edges.insert(step.id, step.depends_on.clone());
            insertion_order.push(step.id);
        }

        Ok(Self {
            nodes,
            edges,
            insertion_order,
        })
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.nodes.get(&id)
    }

    /// Step ids in declaration order
    pub fn step_ids(&self) -> &[StepId] {
        &self.insertion_order
    }

    pub fn dependencies(&self, id: StepId) -> &[StepId] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Report dangling references, self-dependencies and the first cycle found.
    pub fn diagnose(&self) -> Vec<PlanIssue> {
        let mut issues = Vec::new();

        for id in &self.insertion_order {
            for dep in self.dependencies(*id) {
                if dep == id {
                    issues.push(PlanIssue::SelfDependency { step_id: *id });
                } else if !self.nodes.contains_key(dep) {
                    issues.push(PlanIssue::DanglingDependency {
                        step_id: *id,
                        missing_dep: *dep,
                    });
                }
            }
        }

        if let Some(path) = self.detect_cycle() {
            issues.push(PlanIssue::Cycle { path });
        }

        issues
    }

    /// Detect circular dependencies using DFS
    ///
    /// Self-edges and edges to missing steps are ignored; `diagnose` reports
    /// them separately.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of steps, E = number of dependencies
    fn detect_cycle(&self) -> Option<Vec<StepId>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for id in &self.insertion_order {
            if !visited.contains(id) && self.dfs_cycle(*id, &mut visited, &mut stack) {
                return Some(stack);
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: StepId,
        visited: &mut HashSet<StepId>,
        stack: &mut Vec<StepId>,
    ) -> bool {
        visited.insert(node);
        stack.push(node);

        for dep in self.dependencies(node) {
            if *dep == node || !self.nodes.contains_key(dep) {
                continue;
            }

            // Dependency already on the current path: cycle
            if let Some(pos) = stack.iter().position(|x| x == dep) {
                stack.push(*dep);
                *stack = stack[pos..].to_vec();
                return true;
            }

            if !visited.contains(dep) && self.dfs_cycle(*dep, visited, stack) {
                return true;
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(path: &[StepId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::ToolKind;

    fn plan(steps: Vec<Step>) -> Plan {
        Plan::new("topic", steps)
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let p = plan(vec![
            Step::new(1, ToolKind::Search),
            Step::new(1, ToolKind::Edit),
        ]);
        assert!(matches!(
            PlanGraph::from_plan(&p),
            Err(ExecutorError::DuplicateStepId(1))
        ));
    }

    #[test]
    fn test_zero_id_rejected() {
        let p = plan(vec![Step::new(0, ToolKind::Search)]);
        assert!(matches!(
            PlanGraph::from_plan(&p),
            Err(ExecutorError::InvalidStepId(0))
        ));
    }

    #[test]
    fn test_lookup_and_declaration_order() {
        let p = plan(vec![
            Step::new(3, ToolKind::Search),
            Step::new(1, ToolKind::Generate).depends_on([3]),
        ]);
        let g = PlanGraph::from_plan(&p).unwrap();
        assert_eq!(g.step_ids(), &[3, 1]);
        assert_eq!(g.step(1).unwrap().tool_kind, ToolKind::Generate);
        assert_eq!(g.dependencies(1), &[3]);
        assert!(g.dependencies(42).is_empty());
    }

    #[test]
    fn test_valid_plan_has_no_issues() {
        let p = plan(vec![
            Step::new(1, ToolKind::Search),
            Step::new(2, ToolKind::Search),
            Step::new(3, ToolKind::Generate).depends_on([1, 2]),
            Step::new(4, ToolKind::Edit).depends_on([3]),
        ]);
        assert!(PlanGraph::from_plan(&p).unwrap().diagnose().is_empty());
    }

    #[test]
    fn test_diagnose_reports_each_fault() {
        let p = plan(vec![
            Step::new(1, ToolKind::Search).depends_on([2]),
            Step::new(2, ToolKind::Summarize).depends_on([1]),
            Step::new(3, ToolKind::Generate).depends_on([3]),
            Step::new(4, ToolKind::Edit).depends_on([9]),
        ]);
        let issues = PlanGraph::from_plan(&p).unwrap().diagnose();

        assert!(issues.contains(&PlanIssue::SelfDependency { step_id: 3 }));
        assert!(issues.contains(&PlanIssue::DanglingDependency {
            step_id: 4,
            missing_dep: 9
        }));
        assert!(issues.contains(&PlanIssue::Cycle {
            path: vec![1, 2, 1]
        }));
    }

    #[test]
    fn test_issue_display() {
        let issue = PlanIssue::Cycle {
            path: vec![1, 2, 1],
        };
        assert_eq!(issue.to_string(), "dependency cycle: 1 -> 2 -> 1");
    }
}
