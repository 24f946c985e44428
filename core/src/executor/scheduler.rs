use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::graph::PlanGraph;
use super::types::{StepId, StepResult, ToolKind};

/// What the scheduler can do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveStep {
    /// Steps whose dependencies are all completed, sorted ascending.
    Ready(Vec<StepId>),
    /// Nothing left to run.
    Finished,
    /// Steps remain but none of them can ever become ready.
    Deadlock(Vec<StepId>),
}

/// Greedy wave layering over a plan graph.
///
/// Wave k+1 is computed only after [`WaveScheduler::complete`] has been called
/// for every id of wave k.
#[derive(Debug, Clone)]
pub struct WaveScheduler<'g> {
    graph: &'g PlanGraph,
    completed: HashSet<StepId>,
    remaining: BTreeSet<StepId>,
}

impl<'g> WaveScheduler<'g> {
    pub fn new(graph: &'g PlanGraph) -> Self {
        Self {
            graph,
            completed: HashSet::with_capacity(graph.len()),
            remaining: graph.step_ids().iter().copied().collect(),
        }
    }

    pub fn next_wave(&self) -> WaveStep {
        if self.remaining.is_empty() {
            return WaveStep::Finished;
        }

        // `remaining` is ordered, so the wave comes out sorted.
        let ready: Vec<StepId> = self
            .remaining
            .iter()
            .copied()
            .filter(|id| {
                self.graph
                    .dependencies(*id)
                    .iter()
                    .all(|dep| self.completed.contains(dep))
            })
            .collect();

        if ready.is_empty() {
            WaveStep::Deadlock(self.remaining.iter().copied().collect())
        } else {
            WaveStep::Ready(ready)
        }
    }

    /// Move finished ids from `remaining` to `completed`.
    pub fn complete(&mut self, ids: &[StepId]) {
        for id in ids {
            if self.remaining.remove(id) {
                self.completed.insert(*id);
            }
        }
    }

    pub fn remaining(&self) -> impl Iterator<Item = StepId> + '_ {
        self.remaining.iter().copied()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

/// Waves a plan would run in, assuming every step completes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WavePreview {
    pub waves: Vec<Vec<StepId>>,
    pub unreachable: Vec<StepId>,
}

/// Dry-run the scheduler without dispatching anything.
pub fn preview_waves(graph: &PlanGraph) -> WavePreview {
    let mut scheduler = WaveScheduler::new(graph);
    let mut preview = WavePreview::default();

    loop {
        match scheduler.next_wave() {
            WaveStep::Finished => break,
            WaveStep::Deadlock(stuck) => {
                preview.unreachable = stuck;
                break;
            }
            WaveStep::Ready(wave) => {
                scheduler.complete(&wave);
                preview.waves.push(wave);
            }
        }
    }

    preview
}

/// Execute a single wave of steps concurrently
///
/// Every id gets its own spawned task that calls `executor_fn` once. Returns
/// after all of them have finished, one `StepResult` per id sorted by id. A
/// task that panics yields an error result instead of aborting its siblings.
///
/// # Arguments
///
/// * `wave` - Step ids in this wave
/// * `graph` - Plan graph (used for tool kinds of failed tasks)
/// * `max_parallel` - Optional bound on tasks running at once
/// * `executor_fn` - Async function running a single step
pub async fn execute_wave_parallel<F, Fut>(
    wave: &[StepId],
    graph: &PlanGraph,
    max_parallel: Option<usize>,
    executor_fn: F,
) -> Vec<StepResult>
where
    F: Fn(StepId) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    let sem = max_parallel.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut joins = FuturesUnordered::new();

    for &step_id in wave {
        let tool_kind = graph
            .step(step_id)
            .map(|s| s.tool_kind.clone())
            .unwrap_or_else(|| ToolKind::Other("missing".to_string()));
        let sem = sem.clone();
        let executor = executor_fn.clone();

        let handle = tokio::spawn(async move {
            let _permit = match sem {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            executor(step_id).await
        });

        joins.push(async move { (step_id, tool_kind, handle.await) });
    }

    let mut results = Vec::with_capacity(wave.len());

    while let Some((step_id, tool_kind, joined)) = joins.next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::error!(step_id, error = %e, "step task did not complete");
                results.push(StepResult::error(
                    step_id,
                    tool_kind,
                    format!("step task panicked: {e}"),
                    0,
                ));
            }
        }
    }

    results.sort_by_key(|r| r.step_id);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::{Plan, Step};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn graph(steps: Vec<Step>) -> PlanGraph {
        PlanGraph::from_plan(&Plan::new("topic", steps)).unwrap()
    }

    #[test]
    fn test_preview_diamond() {
        let g = graph(vec![
            Step::new(1, ToolKind::Search),
            Step::new(2, ToolKind::Search),
            Step::new(3, ToolKind::Generate).depends_on([1, 2]),
            Step::new(4, ToolKind::Edit).depends_on([3]),
        ]);
        let preview = preview_waves(&g);
        assert_eq!(preview.waves, vec![vec![1, 2], vec![3], vec![4]]);
        assert!(preview.unreachable.is_empty());
    }

    #[test]
    fn test_preview_sorts_within_wave() {
        let g = graph(vec![
            Step::new(9, ToolKind::Image),
            Step::new(4, ToolKind::Search),
            Step::new(6, ToolKind::Summarize).depends_on([4]),
        ]);
        assert_eq!(preview_waves(&g).waves, vec![vec![4, 9], vec![6]]);
    }

    #[test]
    fn test_cycle_deadlocks_immediately() {
        let g = graph(vec![
            Step::new(1, ToolKind::Search).depends_on([2]),
            Step::new(2, ToolKind::Search).depends_on([1]),
        ]);
        let scheduler = WaveScheduler::new(&g);
        assert_eq!(scheduler.next_wave(), WaveStep::Deadlock(vec![1, 2]));

        let preview = preview_waves(&g);
        assert!(preview.waves.is_empty());
        assert_eq!(preview.unreachable, vec![1, 2]);
    }

    #[test]
    fn test_dangling_dependency_stops_after_reachable_waves() {
        let g = graph(vec![
            Step::new(1, ToolKind::Search),
            Step::new(2, ToolKind::Generate).depends_on([1]),
            Step::new(3, ToolKind::Edit).depends_on([2, 42]),
        ]);
        let preview = preview_waves(&g);
        assert_eq!(preview.waves, vec![vec![1], vec![2]]);
        assert_eq!(preview.unreachable, vec![3]);
    }

    #[test]
    fn test_empty_plan_is_finished() {
        let g = graph(vec![]);
        assert_eq!(WaveScheduler::new(&g).next_wave(), WaveStep::Finished);
        assert_eq!(preview_waves(&g), WavePreview::default());
    }

    #[test]
    fn test_complete_ignores_unknown_ids() {
        let g = graph(vec![Step::new(1, ToolKind::Search)]);
        let mut scheduler = WaveScheduler::new(&g);
        scheduler.complete(&[7]);
        assert_eq!(scheduler.completed_count(), 0);
        scheduler.complete(&[1]);
        assert_eq!(scheduler.completed_count(), 1);
        assert_eq!(scheduler.remaining().count(), 0);
    }

    #[tokio::test]
    async fn test_wave_runs_every_step_once() {
        let g = graph(vec![
            Step::new(1, ToolKind::Search),
            Step::new(2, ToolKind::Search),
            Step::new(3, ToolKind::Search),
        ]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let results = execute_wave_parallel(&[3, 1, 2], &g, None, move |id| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StepResult::success(id, ToolKind::Search, format!("out-{id}"), 0)
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let ids: Vec<_> = results.iter().map(|r| r.step_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_panicking_step_becomes_error_result() {
        let g = graph(vec![
            Step::new(1, ToolKind::Search),
            Step::new(2, ToolKind::Summarize),
        ]);

        let results = execute_wave_parallel(&[1, 2], &g, None, |id| async move {
            if id == 2 {
                panic!("collaborator exploded");
            }
            StepResult::success(id, ToolKind::Search, "ok", 0)
        })
        .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(results[1].tool_kind, ToolKind::Summarize);
        assert!(results[1]
            .error_detail
            .as_deref()
            .unwrap()
            .contains("panicked"));
    }

    #[tokio::test]
    async fn test_max_parallel_bounds_concurrency() {
        let g = graph((1..=6).map(|id| Step::new(id, ToolKind::Search)).collect());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (active.clone(), peak.clone());

        let results = execute_wave_parallel(&[1, 2, 3, 4, 5, 6], &g, Some(2), move |id| {
            let (a, p) = (a.clone(), p.clone());
            async move {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                StepResult::success(id, ToolKind::Search, "", 0)
            }
        })
        .await;

        assert_eq!(results.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
