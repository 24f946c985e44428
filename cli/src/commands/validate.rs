use serde::Serialize;

use stepflow_core::error::{CliError, ExecutorError};
use stepflow_core::executor::{preview_waves, Plan, PlanGraph, PlanIssue, StepId};

use super::cli::ValidateArgs;
use super::run::read_plan;

/// Dry-run view of a plan: waves it would run in, steps it would never reach,
/// and structural issues explaining why.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub waves: Vec<Vec<StepId>>,
    pub unreachable: Vec<StepId>,
    pub issues: Vec<PlanIssue>,
}

impl ValidationReport {
    pub fn is_runnable(&self) -> bool {
        self.unreachable.is_empty()
    }
}

pub fn build_report(plan: &Plan) -> Result<ValidationReport, ExecutorError> {
    let graph = PlanGraph::from_plan(plan)?;
    let preview = preview_waves(&graph);
    Ok(ValidationReport {
        waves: preview.waves,
        unreachable: preview.unreachable,
        issues: graph.diagnose(),
    })
}

pub async fn handle_validate(args: ValidateArgs) -> Result<i32, CliError> {
    let plan = read_plan(&args.plan).await?;
    let report = build_report(&plan)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&plan, &report));
    }

    Ok(if report.is_runnable() { 0 } else { 3 })
}

fn format_report(plan: &Plan, report: &ValidationReport) -> String {
    let mut out = format!("Plan: {} ({} steps)\n", plan.topic, plan.len());

    for (idx, wave) in report.waves.iter().enumerate() {
        let steps: Vec<String> = wave
            .iter()
            .map(|id| match plan.step(*id) {
                Some(step) => format!("{}:{}", id, step.tool_kind),
                None => id.to_string(),
            })
            .collect();
        out.push_str(&format!("  wave {}: {}\n", idx, steps.join(", ")));
    }

    if !report.unreachable.is_empty() {
        let ids: Vec<String> = report.unreachable.iter().map(|id| id.to_string()).collect();
        out.push_str(&format!("  unreachable: {}\n", ids.join(", ")));
    }

    for issue in &report.issues {
        out.push_str(&format!("  issue: {}\n", issue));
    }

    out
}
