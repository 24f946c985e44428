//! Fallback event sink used when no renderer plugin is installed: every run
//! event becomes a structured `tracing` record.

use super::traits::RenderEvent;

pub fn emit_event(event: &RenderEvent) {
    match event {
        RenderEvent::RunStart {
            run_id,
            topic,
            total_steps,
        } => {
            tracing::info!(run_id = %run_id, topic = %topic, total_steps, "run started");
        }
        RenderEvent::WaveStart {
            run_id,
            wave,
            step_ids,
        } => {
            tracing::info!(run_id = %run_id, wave, steps = ?step_ids, "wave started");
        }
        RenderEvent::StepStart {
            run_id,
            wave,
            step_id,
            tool_kind,
        } => {
            tracing::debug!(run_id = %run_id, wave, step_id, tool_kind = %tool_kind, "step started");
        }
        RenderEvent::StepComplete {
            run_id,
            wave,
            result,
        } => {
            if result.is_success() {
                tracing::info!(
                    run_id = %run_id,
                    wave,
                    step_id = result.step_id,
                    tool_kind = %result.tool_kind,
                    duration_ms = result.duration_ms,
                    output_len = result.output.len(),
                    "step succeeded"
                );
            } else {
                tracing::warn!(
                    run_id = %run_id,
                    wave,
                    step_id = result.step_id,
                    tool_kind = %result.tool_kind,
                    duration_ms = result.duration_ms,
                    error = result.error_detail.as_deref().unwrap_or(""),
                    "step failed"
                );
            }
        }
        RenderEvent::WaveEnd {
            run_id,
            wave,
            failed,
        } => {
            tracing::info!(run_id = %run_id, wave, failed, "wave finished");
        }
        RenderEvent::Deadlock { run_id, unreached } => {
            tracing::warn!(run_id = %run_id, unreached = ?unreached, "no runnable steps left; stopping early");
        }
        RenderEvent::RunEnd { run_id, result } => {
            tracing::info!(
                run_id = %run_id,
                executed = result.results.len(),
                failed = result.failed(),
                waves = result.waves.len(),
                has_text = result.final_text_artifact.is_some(),
                has_binary = result.final_binary_artifact.is_some(),
                duration_ms = result.duration_ms,
                "run finished"
            );
        }
    }
}
