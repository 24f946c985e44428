#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stepflow_core::error::ToolError;
use stepflow_core::executor::{
    ImageTool, OutputRendererPlugin, Plan, RenderEvent, StepId, TextTool, ToolRequest, Toolbox,
};

/// Returns `"<kind>(<input>)"` for every request and records what it saw.
#[derive(Default)]
pub struct RecordingTool {
    pub seen: Mutex<Vec<ToolRequest>>,
}

#[async_trait]
impl TextTool for RecordingTool {
    fn name(&self) -> &str {
        "recording"
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(format!("{}({})", request.kind, request.input))
    }
}

/// Fails whenever the input contains one of the trigger words, echoes otherwise.
pub struct ScriptedTool {
    pub fail_on: Vec<String>,
}

impl ScriptedTool {
    pub fn failing_on(words: &[&str]) -> Self {
        Self {
            fail_on: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[async_trait]
impl TextTool for ScriptedTool {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        if self.fail_on.iter().any(|w| request.input.contains(w.as_str())) {
            return Err(ToolError::Other(format!("scripted failure for '{}'", request.input)));
        }
        Ok(format!("{}({})", request.kind, request.input))
    }
}

/// Panics on inputs containing the trigger word, echoes otherwise.
pub struct PanickyTool {
    pub trigger: &'static str,
}

#[async_trait]
impl TextTool for PanickyTool {
    fn name(&self) -> &str {
        "panicky"
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        if request.input.contains(self.trigger) {
            panic!("collaborator blew up on '{}'", request.input);
        }
        Ok(format!("{}({})", request.kind, request.input))
    }
}

/// Sleeps before answering and tracks how many calls overlap.
pub struct SlowTool {
    pub delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl SlowTool {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextTool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("{}({})", request.kind, request.input))
    }
}

pub struct FixedImage(pub Result<Vec<u8>, String>);

#[async_trait]
impl ImageTool for FixedImage {
    fn name(&self) -> &str {
        "fixed-image"
    }

    async fn generate(&self, _topic: &str) -> Result<Vec<u8>, ToolError> {
        self.0.clone().map_err(ToolError::Other)
    }
}

/// Captures every event the engine emits, in emission order.
#[derive(Default)]
pub struct RecordingRenderer {
    pub events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Position of each step's start and completion in the event stream.
    pub fn step_positions(&self) -> HashMap<StepId, (usize, usize)> {
        let mut starts = HashMap::new();
        let mut ends = HashMap::new();
        for (i, ev) in self.events().iter().enumerate() {
            match ev {
                RenderEvent::StepStart { step_id, .. } => {
                    starts.insert(*step_id, i);
                }
                RenderEvent::StepComplete { result, .. } => {
                    ends.insert(result.step_id, i);
                }
                _ => {}
            }
        }
        starts
            .into_iter()
            .filter_map(|(id, s)| ends.get(&id).map(|e| (id, (s, *e))))
            .collect()
    }
}

impl OutputRendererPlugin for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "memory"
    }

    fn render(&self, event: &RenderEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// All four text kinds backed by the same tool.
pub fn text_toolbox(tool: Arc<dyn TextTool>) -> Toolbox {
    Toolbox::new()
        .with_search(tool.clone())
        .with_summarize(tool.clone())
        .with_generate(tool.clone())
        .with_edit(tool)
}

pub fn plan(json: &str) -> Plan {
    Plan::from_json_str(json).expect("test plan must parse")
}

/// search(1), search(2) -> summarize(3) -> generate(4)
pub fn diamond_plan() -> Plan {
    plan(
        r#"{
            "topic": "rust async",
            "steps": [
                {"id": 1, "tool_kind": "search", "description": "tokio", "depends_on": []},
                {"id": 2, "tool_kind": "search", "description": "futures", "depends_on": []},
                {"id": 3, "tool_kind": "summarize", "depends_on": [1, 2]},
                {"id": 4, "tool_kind": "generate", "depends_on": [3]}
            ]
        }"#,
    )
}
