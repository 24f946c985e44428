use crate::executor::types::{ExecutionResult, StepId, StepResult, ToolKind};

/// Output renderer plugin (controls how run events are presented)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Events emitted by the engine during one run
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        topic: String,
        total_steps: usize,
    },
    WaveStart {
        run_id: String,
        wave: usize,
        step_ids: Vec<StepId>,
    },
    StepStart {
        run_id: String,
        wave: usize,
        step_id: StepId,
        tool_kind: ToolKind,
    },
    StepComplete {
        run_id: String,
        wave: usize,
        result: StepResult,
    },
    WaveEnd {
        run_id: String,
        wave: usize,
        failed: usize,
    },
    Deadlock {
        run_id: String,
        unreached: Vec<StepId>,
    },
    RunEnd {
        run_id: String,
        result: ExecutionResult,
    },
}

impl RenderEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStart { run_id, .. }
            | Self::WaveStart { run_id, .. }
            | Self::StepStart { run_id, .. }
            | Self::StepComplete { run_id, .. }
            | Self::WaveEnd { run_id, .. }
            | Self::Deadlock { run_id, .. }
            | Self::RunEnd { run_id, .. } => run_id,
        }
    }
}
