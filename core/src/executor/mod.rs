//! Dependency-aware step executor
//!
//! Runs a plan of heterogeneous steps wave by wave:
//! - Plan graph construction and structural diagnostics
//! - Wave scheduling with deadlock detection for cycles and dangling deps
//! - One concurrent unit per step, joined at a barrier before the next wave
//! - Per-step failure isolation (errors and panics become error results)
//! - Final text / binary artifact synthesis
//!
//! # Architecture
//!
//! ```text
//! Plan
//!   ↓
//! PlanGraph::from_plan()  (rejects duplicate / zero ids)
//!   ↓
//! WaveScheduler::next_wave() ──▶ Deadlock(unreached) ──┐
//!   ↓ Ready(wave)                                      │
//! execute_wave_parallel() → StepDispatcher::dispatch() │
//!   ↓ barrier, then OutputStore::record()              │
//!   ↺                                                  │
//! Finished ◀───────────────────────────────────────────┘
//!   ↓
//! select_final_text() / select_final_binary() → ExecutionResult
//! ```

mod dispatcher;
mod engine;
mod graph;
mod output;
mod progress;
mod scheduler;
mod store;
mod synthesizer;
pub mod traits;
pub mod types;

pub use dispatcher::{resolve_input, StepDispatcher};
pub use engine::{execute_plan, ExecutionEngine, ExecutionEngineBuilder};
pub use graph::{PlanGraph, PlanIssue};
pub use output::emit_event;
pub use progress::ProgressMonitor;
pub use scheduler::{execute_wave_parallel, preview_waves, WavePreview, WaveScheduler, WaveStep};
pub use store::OutputStore;
pub use synthesizer::{select_final_binary, select_final_text};
pub use traits::{
    BlockingTextTool, ImageTool, OutputRendererPlugin, RenderEvent, TextTool, ToolRequest, Toolbox,
};
pub use types::{
    ExecutionOpts, ExecutionResult, ExecutorConfig, Plan, Step, StepId, StepResult, StepStatus,
    ToolKind, UnknownToolPolicy,
};
