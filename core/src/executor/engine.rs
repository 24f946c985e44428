use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use uuid::Uuid;

use crate::error::ExecutorError;

use super::dispatcher::StepDispatcher;
use super::graph::PlanGraph;
use super::output::emit_event;
use super::progress::ProgressMonitor;
use super::scheduler::{execute_wave_parallel, WaveScheduler, WaveStep};
use super::store::OutputStore;
use super::synthesizer::{select_final_binary, select_final_text};
use super::traits::{OutputRendererPlugin, RenderEvent, Toolbox};
use super::types::{
    ExecutionOpts, ExecutionResult, Plan, StepId, StepResult, ToolKind, UnknownToolPolicy,
};

/// Execution engine for step plans
///
/// Each call to [`ExecutionEngine::execute`] owns its own scheduler state and
/// output store, so one engine can serve concurrent runs.
pub struct ExecutionEngine {
    dispatcher: Arc<StepDispatcher>,
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

pub struct ExecutionEngineBuilder {
    toolbox: Toolbox,
    unknown_tool: UnknownToolPolicy,
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl ExecutionEngine {
    pub fn new(dispatcher: StepDispatcher, opts: ExecutionOpts) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            opts,
            renderer: None,
        }
    }

    pub fn builder(toolbox: Toolbox) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(toolbox)
    }

    pub fn dispatcher(&self) -> &StepDispatcher {
        &self.dispatcher
    }

    /// Execute a plan with a fresh run id.
    pub async fn execute(&self, plan: Plan) -> Result<ExecutionResult, ExecutorError> {
        self.execute_with_run_id(plan, Uuid::new_v4().to_string())
            .await
    }

    /// Execute a plan wave by wave.
    ///
    /// Only structurally ambiguous plans (duplicate or zero ids) are rejected.
    /// A cycle or dangling dependency ends the loop early and is reported
    /// through `ExecutionResult::unreached`.
    pub async fn execute_with_run_id(
        &self,
        plan: Plan,
        run_id: String,
    ) -> Result<ExecutionResult, ExecutorError> {
        let start = Instant::now();
        let graph = Arc::new(PlanGraph::from_plan(&plan)?);

        for issue in graph.diagnose() {
            tracing::warn!(run_id = %run_id, issue = %issue, "plan issue");
        }

        self.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            topic: plan.topic.clone(),
            total_steps: graph.len(),
        });

        let topic: Arc<str> = Arc::from(plan.topic.as_str());
        let progress = Arc::new(Mutex::new(ProgressMonitor::new(
            graph.len(),
            self.opts.progress_bar,
        )));

        let mut scheduler = WaveScheduler::new(&graph);
        let mut outputs = OutputStore::new();
        let mut results: Vec<StepResult> = Vec::with_capacity(graph.len());
        let mut waves: Vec<Vec<StepId>> = Vec::new();
        let mut unreached: Vec<StepId> = Vec::new();

        loop {
            let wave = match scheduler.next_wave() {
                WaveStep::Finished => break,
                WaveStep::Deadlock(stuck) => {
                    self.emit(RenderEvent::Deadlock {
                        run_id: run_id.clone(),
                        unreached: stuck.clone(),
                    });
                    unreached = stuck;
                    break;
                }
                WaveStep::Ready(wave) => wave,
            };

            let wave_idx = waves.len();
            self.emit(RenderEvent::WaveStart {
                run_id: run_id.clone(),
                wave: wave_idx,
                step_ids: wave.clone(),
            });
            if let Ok(mut monitor) = progress.lock() {
                monitor.start_wave(wave_idx, &wave);
            }

            let wave_results = self
                .execute_wave(
                    wave_idx,
                    &wave,
                    &graph,
                    &topic,
                    &outputs,
                    &run_id,
                    progress.clone(),
                )
                .await;

            // Barrier passed: publish outputs before the next wave is computed.
            for result in &wave_results {
                outputs.record(result.step_id, &result.output);
            }
            scheduler.complete(&wave);

            let failed = wave_results.iter().filter(|r| !r.is_success()).count();
            self.emit(RenderEvent::WaveEnd {
                run_id: run_id.clone(),
                wave: wave_idx,
                failed,
            });

            results.extend(wave_results);
            waves.push(wave);
        }

        let final_text_artifact = select_final_text(&plan, &outputs);
        let final_binary_artifact = select_final_binary(&plan, &results);

        let result = ExecutionResult {
            run_id: run_id.clone(),
            plan,
            results,
            waves,
            unreached,
            final_text_artifact,
            final_binary_artifact,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if let Ok(mut monitor) = progress.lock() {
            monitor.finish(result.deadlocked(), result.failed());
        }

        self.emit(RenderEvent::RunEnd {
            run_id,
            result: result.clone(),
        });

        Ok(result)
    }

    /// Execute one wave; every step sees the same output snapshot.
    async fn execute_wave(
        &self,
        wave_idx: usize,
        wave: &[StepId],
        graph: &Arc<PlanGraph>,
        topic: &Arc<str>,
        outputs: &OutputStore,
        run_id: &str,
        progress: Arc<Mutex<ProgressMonitor>>,
    ) -> Vec<StepResult> {
        let snapshot = Arc::new(outputs.clone());
        let dispatcher = self.dispatcher.clone();
        let renderer = self.renderer.clone();
        let graph_for_steps = graph.clone();
        let topic = topic.clone();
        let run_id = run_id.to_string();

        let executor_fn = move |step_id: StepId| {
            let dispatcher = dispatcher.clone();
            let renderer = renderer.clone();
            let graph = graph_for_steps.clone();
            let topic = topic.clone();
            let snapshot = snapshot.clone();
            let run_id = run_id.clone();
            let progress = progress.clone();

            async move {
                let Some(step) = graph.step(step_id) else {
                    return StepResult::error(
                        step_id,
                        ToolKind::Other("missing".to_string()),
                        "step not found in plan",
                        0,
                    );
                };

                emit_to(
                    &renderer,
                    RenderEvent::StepStart {
                        run_id: run_id.clone(),
                        wave: wave_idx,
                        step_id,
                        tool_kind: step.tool_kind.clone(),
                    },
                );

                let started = Instant::now();
                let result = match AssertUnwindSafe(dispatcher.dispatch(step, &topic, &snapshot))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(run_id = %run_id, step_id, panic = %message, "step panicked");
                        StepResult::error(
                            step_id,
                            step.tool_kind.clone(),
                            format!("step panicked: {message}"),
                            started.elapsed().as_millis() as u64,
                        )
                    }
                };

                if let Ok(mut monitor) = progress.lock() {
                    monitor.step_done(step_id, result.is_success(), result.duration_ms);
                }

                emit_to(
                    &renderer,
                    RenderEvent::StepComplete {
                        run_id,
                        wave: wave_idx,
                        result: result.clone(),
                    },
                );

                result
            }
        };

        execute_wave_parallel(wave, graph, self.opts.max_parallel, executor_fn).await
    }

    fn emit(&self, event: RenderEvent) {
        emit_to(&self.renderer, event);
    }
}

impl ExecutionEngineBuilder {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            unknown_tool: UnknownToolPolicy::default(),
            opts: ExecutionOpts::default(),
            renderer: None,
        }
    }

    pub fn unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tool = policy;
        self
    }

    pub fn opts(mut self, opts: ExecutionOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.opts.max_parallel = Some(max_parallel.max(1));
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        let dispatcher =
            StepDispatcher::new(self.toolbox).with_unknown_tool_policy(self.unknown_tool);
        ExecutionEngine {
            dispatcher: Arc::new(dispatcher),
            opts: self.opts,
            renderer: self.renderer,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn emit_to(renderer: &Option<Arc<dyn OutputRendererPlugin>>, event: RenderEvent) {
    match renderer {
        Some(renderer) => renderer.render(&event),
        None => emit_event(&event),
    }
}

/// Execute a plan with default options
///
/// This is the main entry point for the executor module.
pub async fn execute_plan(plan: Plan, toolbox: Toolbox) -> Result<ExecutionResult, ExecutorError> {
    ExecutionEngine::builder(toolbox).build().execute(plan).await
}
