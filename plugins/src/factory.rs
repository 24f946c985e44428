use std::sync::Arc;

use anyhow::Result;

use stepflow_core::config::{AppConfig, ToolBackendConfig, ToolsConfig};
use stepflow_core::executor::{
    ExecutionEngine, ExecutionOpts, ImageTool, OutputRendererPlugin, TextTool, ToolKind, Toolbox,
};

use crate::executor::{JsonlRendererPlugin, TextRendererPlugin};
use crate::tools::{ChatTool, CommandImageTool, CommandTool, ImageApiTool, WebSearchTool};

/// Build the collaborator set from the `[tools]` section.
///
/// Kinds without a configured backend stay empty; their steps fail at
/// dispatch time instead of aborting the whole run.
pub fn build_toolbox(tools: &ToolsConfig) -> Result<Toolbox> {
    let mut toolbox = Toolbox::new();

    for kind in [
        ToolKind::Search,
        ToolKind::Summarize,
        ToolKind::Generate,
        ToolKind::Edit,
    ] {
        let Some(backend) = tools.for_kind(&kind) else {
            continue;
        };
        let tool = build_text_tool(&kind, backend)?;
        tracing::debug!(tool_kind = %kind, backend = backend.kind_name(), "configured text tool");
        toolbox = match kind {
            ToolKind::Search => toolbox.with_search(tool),
            ToolKind::Summarize => toolbox.with_summarize(tool),
            ToolKind::Generate => toolbox.with_generate(tool),
            _ => toolbox.with_edit(tool),
        };
    }

    if let Some(backend) = tools.for_kind(&ToolKind::Image) {
        tracing::debug!(backend = backend.kind_name(), "configured image tool");
        toolbox = toolbox.with_image(build_image_tool(backend)?);
    }

    Ok(toolbox)
}

pub fn build_text_tool(kind: &ToolKind, backend: &ToolBackendConfig) -> Result<Arc<dyn TextTool>> {
    match backend {
        ToolBackendConfig::Command(c) => Ok(Arc::new(CommandTool::new(c))),
        ToolBackendConfig::SearchApi(c) if *kind == ToolKind::Search => {
            Ok(Arc::new(WebSearchTool::new(c)?))
        }
        ToolBackendConfig::Chat(c) if *kind != ToolKind::Search => {
            Ok(Arc::new(ChatTool::new(kind.clone(), c)?))
        }
        other => anyhow::bail!(
            "backend '{}' cannot serve tool kind '{}'",
            other.kind_name(),
            kind
        ),
    }
}

pub fn build_image_tool(backend: &ToolBackendConfig) -> Result<Arc<dyn ImageTool>> {
    match backend {
        ToolBackendConfig::Command(c) => Ok(Arc::new(CommandImageTool::new(c))),
        ToolBackendConfig::ImageApi(c) => Ok(Arc::new(ImageApiTool::new(c)?)),
        other => anyhow::bail!(
            "backend '{}' cannot serve tool kind 'image'",
            other.kind_name()
        ),
    }
}

pub fn build_renderer(stream_format: &str) -> Arc<dyn OutputRendererPlugin> {
    match stream_format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        // Anything other than jsonl behaves like text.
        _ => Arc::new(TextRendererPlugin::new(false)),
    }
}

/// Engine wired from config, without a renderer (events go to tracing).
pub fn build_engine(cfg: &AppConfig) -> Result<ExecutionEngine> {
    let toolbox = build_toolbox(&cfg.tools)?;
    Ok(ExecutionEngine::builder(toolbox)
        .unknown_tool_policy(cfg.executor.unknown_tool)
        .opts(ExecutionOpts::from_config(&cfg.executor))
        .build())
}
