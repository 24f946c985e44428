use stepflow_core::executor::traits::{OutputRendererPlugin, RenderEvent};

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn status_label(&self, success: bool) -> &'static str {
        match (success, self.ascii_only) {
            (true, true) => "OK",
            (true, false) => "SUCCESS",
            (false, true) => "FAIL",
            (false, false) => "FAILED",
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                topic,
                total_steps,
            } => format!(
                "RUN START {} (topic: {:?}, steps: {})",
                run_id, topic, total_steps
            ),
            RenderEvent::WaveStart {
                run_id,
                wave,
                step_ids,
            } => {
                let ids: Vec<String> = step_ids.iter().map(|id| id.to_string()).collect();
                format!(
                    "WAVE START {} (wave {}, steps: {})",
                    run_id,
                    wave,
                    ids.join(", ")
                )
            }
            RenderEvent::StepStart {
                run_id,
                wave,
                step_id,
                tool_kind,
            } => format!(
                "STEP START {} (wave {}, step {}, tool {})",
                run_id, wave, step_id, tool_kind
            ),
            RenderEvent::StepComplete {
                run_id,
                wave,
                result,
            } => {
                let mut line = format!(
                    "STEP END {} (wave {}, step {}, tool {}, status {}, duration {}ms)",
                    run_id,
                    wave,
                    result.step_id,
                    result.tool_kind,
                    self.status_label(result.is_success()),
                    result.duration_ms
                );
                if let Some(err) = &result.error_detail {
                    line.push_str(&format!(": {}", err));
                }
                line
            }
            RenderEvent::WaveEnd {
                run_id,
                wave,
                failed,
            } => format!("WAVE END {} (wave {}, failed {})", run_id, wave, failed),
            RenderEvent::Deadlock { run_id, unreached } => {
                let ids: Vec<String> = unreached.iter().map(|id| id.to_string()).collect();
                format!("DEADLOCK {} (unreached: {})", run_id, ids.join(", "))
            }
            RenderEvent::RunEnd { run_id, result } => format!(
                "RUN END {} (executed {}, failed {}, waves {}, text {}, image {}, duration {}ms)",
                run_id,
                result.results.len(),
                result.failed(),
                result.waves.len(),
                if result.final_text_artifact.is_some() { "yes" } else { "no" },
                if result.final_binary_artifact.is_some() { "yes" } else { "no" },
                result.duration_ms
            ),
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    // Progress goes to stderr so stdout stays reserved for the final artifact.
    fn render(&self, event: &RenderEvent) {
        eprintln!("{}", self.format_event(event));
    }
}
