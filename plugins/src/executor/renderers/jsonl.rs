use chrono::Local;
use serde_json::{json, Value};
use stepflow_core::executor::traits::{OutputRendererPlugin, RenderEvent};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                topic,
                total_steps,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "topic": topic,
                    "total_steps": total_steps,
                }
            }),
            RenderEvent::WaveStart {
                run_id,
                wave,
                step_ids,
            } => json!({
                "v": 1,
                "event_type": "wave.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "wave": wave,
                    "steps": step_ids,
                }
            }),
            RenderEvent::StepStart {
                run_id,
                wave,
                step_id,
                tool_kind,
            } => json!({
                "v": 1,
                "event_type": "step.start",
                "ts": ts,
                "run_id": run_id,
                "step_id": step_id,
                "metadata": {
                    "wave": wave,
                    "tool_kind": tool_kind.as_str(),
                }
            }),
            RenderEvent::StepComplete {
                run_id,
                wave,
                result,
            } => json!({
                "v": 1,
                "event_type": "step.end",
                "ts": ts,
                "run_id": run_id,
                "step_id": result.step_id,
                "metadata": {
                    "wave": wave,
                    "tool_kind": result.tool_kind.as_str(),
                    "status": result.status,
                    "duration_ms": result.duration_ms,
                    "output_len": result.output.len(),
                    "error": result.error_detail,
                }
            }),
            RenderEvent::WaveEnd {
                run_id,
                wave,
                failed,
            } => json!({
                "v": 1,
                "event_type": "wave.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "wave": wave,
                    "failed": failed,
                }
            }),
            RenderEvent::Deadlock { run_id, unreached } => json!({
                "v": 1,
                "event_type": "run.deadlock",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "unreached": unreached,
                }
            }),
            RenderEvent::RunEnd { run_id, result } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "executed": result.results.len(),
                    "failed": result.failed(),
                    "waves": result.waves,
                    "unreached": result.unreached,
                    "has_text": result.final_text_artifact.is_some(),
                    "has_binary": result.final_binary_artifact.is_some(),
                    "duration_ms": result.duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}
