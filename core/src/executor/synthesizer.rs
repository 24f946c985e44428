use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::store::OutputStore;
use super::types::{Plan, StepId, StepResult, ToolKind};

/// Pick the final text artifact.
///
/// Scans steps last-declared first. The first edit step with a recorded
/// output wins outright. A generate step found along the way is only a
/// candidate, used once the whole scan has seen no edit winner.
pub fn select_final_text(plan: &Plan, outputs: &OutputStore) -> Option<String> {
    let mut generate_candidate: Option<&str> = None;

    for step in plan.steps.iter().rev() {
        let Some(output) = outputs.get(step.id) else {
            continue;
        };
        match step.tool_kind {
            ToolKind::Edit => return Some(output.to_string()),
            ToolKind::Generate if generate_candidate.is_none() => {
                generate_candidate = Some(output)
            }
            _ => {}
        }
    }

    generate_candidate.map(str::to_string)
}

/// Pick the final binary artifact.
///
/// The first declared image step that actually ran decides: success yields
/// its decoded payload, error yields nothing.
pub fn select_final_binary(plan: &Plan, results: &[StepResult]) -> Option<Vec<u8>> {
    let by_id: HashMap<StepId, &StepResult> = results.iter().map(|r| (r.step_id, r)).collect();

    let result = plan
        .steps
        .iter()
        .filter(|s| s.tool_kind == ToolKind::Image)
        .find_map(|s| by_id.get(&s.id))?;

    if !result.is_success() {
        return None;
    }

    match STANDARD.decode(result.output.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(step_id = result.step_id, error = %e, "image payload is not valid base64");
            None
        }
    }
}
