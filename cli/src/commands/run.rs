use std::path::Path;

use stepflow_core::config::AppConfig;
use stepflow_core::error::{CliError, ExecutorError};
use stepflow_core::executor::{ExecutionEngine, ExecutionOpts, ExecutionResult, Plan};
use stepflow_plugins::factory::{build_renderer, build_toolbox};

use super::cli::RunArgs;

pub async fn read_plan(path: &Path) -> Result<Plan, CliError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Command(format!("failed to read plan {}: {e}", path.display())))?;
    let plan = Plan::from_json_str(&raw).map_err(ExecutorError::from)?;
    Ok(plan)
}

/// Fold CLI flags over the loaded config; flags win.
pub fn apply_run_overrides(cfg: &mut AppConfig, args: &RunArgs) {
    if let Some(n) = args.max_parallel {
        cfg.executor.max_parallel = (n > 0).then_some(n);
    }
    if args.progress {
        cfg.executor.progress_bar = true;
    }
    if let Some(format) = args.format {
        cfg.executor.stream_format = format.as_str().to_string();
    }
}

/// Execute a plan. Exit code 0 when every step was reached, 3 when the run
/// stopped early on a cycle or dangling dependency.
pub async fn handle_run(args: RunArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    apply_run_overrides(&mut cfg, &args);

    let plan = read_plan(&args.plan).await?;
    let toolbox = build_toolbox(&cfg.tools)?;
    let renderer = build_renderer(&cfg.executor.stream_format);

    tracing::info!(
        plan = %args.plan.display(),
        steps = plan.len(),
        format = %cfg.executor.stream_format,
        max_parallel = ?cfg.executor.max_parallel,
        "starting run"
    );

    let engine = ExecutionEngine::builder(toolbox)
        .unknown_tool_policy(cfg.executor.unknown_tool)
        .opts(ExecutionOpts::from_config(&cfg.executor))
        .renderer(renderer)
        .build();

    let result = engine.execute(plan).await?;

    write_outputs(&args, &result).await?;

    if cfg.executor.stream_format != "jsonl" {
        match &result.final_text_artifact {
            Some(text) => println!("{text}"),
            None => eprintln!("(no final text artifact)"),
        }
    }

    Ok(exit_code_for_result(&result))
}

async fn write_outputs(args: &RunArgs, result: &ExecutionResult) -> Result<(), CliError> {
    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(result)?;
        tokio::fs::write(path, json).await?;
        tracing::info!(path = %path.display(), "wrote execution result");
    }

    if let Some(path) = &args.image_out {
        match &result.final_binary_artifact {
            Some(bytes) => {
                tokio::fs::write(path, bytes).await?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote image artifact");
            }
            None => tracing::warn!(path = %path.display(), "no binary artifact to write"),
        }
    }

    Ok(())
}

pub fn exit_code_for_result(result: &ExecutionResult) -> i32 {
    if result.deadlocked() {
        3
    } else {
        0
    }
}
