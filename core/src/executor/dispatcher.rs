use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ToolError;

use super::store::OutputStore;
use super::traits::{ToolRequest, Toolbox};
use super::types::{Step, StepResult, ToolKind, UnknownToolPolicy};

/// Turns one step plus the current output store into a `StepResult`.
///
/// This is the single place where tool kinds are mapped to collaborators.
/// Collaborator failures are converted into error results here and never
/// reach the scheduler.
#[derive(Debug, Clone, Default)]
pub struct StepDispatcher {
    toolbox: Toolbox,
    unknown_tool: UnknownToolPolicy,
}

impl StepDispatcher {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            unknown_tool: UnknownToolPolicy::default(),
        }
    }

    pub fn with_unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tool = policy;
        self
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub async fn dispatch(&self, step: &Step, topic: &str, outputs: &OutputStore) -> StepResult {
        let start = Instant::now();
        let outcome = self.run(step, topic, outputs).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => StepResult::success(step.id, step.tool_kind.clone(), output, duration_ms),
            Err(e) => {
                tracing::warn!(
                    step_id = step.id,
                    tool_kind = %step.tool_kind,
                    error = %e,
                    "step failed"
                );
                StepResult::error(step.id, step.tool_kind.clone(), e.to_string(), duration_ms)
            }
        }
    }

    async fn run(&self, step: &Step, topic: &str, outputs: &OutputStore) -> Result<String, ToolError> {
        match &step.tool_kind {
            ToolKind::Search => {
                let query = if step.description.is_empty() {
                    topic
                } else {
                    step.description.as_str()
                };
                self.invoke_text(&step.tool_kind, topic, query.to_string())
                    .await
            }
            ToolKind::Summarize | ToolKind::Edit => {
                let input = resolve_input(step, topic, outputs);
                self.invoke_text(&step.tool_kind, topic, input).await
            }
            ToolKind::Generate => {
                // Topic travels separately; research may legitimately be empty.
                let research = outputs.aggregate(&step.depends_on);
                self.invoke_text(&step.tool_kind, topic, research).await
            }
            ToolKind::Image => {
                let tool = self
                    .toolbox
                    .image
                    .as_ref()
                    .ok_or_else(|| ToolError::NotConfigured(ToolKind::Image))?;
                let bytes = tool.generate(topic).await?;
                Ok(STANDARD.encode(bytes))
            }
            ToolKind::Other(name) => match self.unknown_tool {
                UnknownToolPolicy::Error => Err(ToolError::UnsupportedKind(name.clone())),
                UnknownToolPolicy::Placeholder => {
                    tracing::warn!(
                        step_id = step.id,
                        tool_kind = %name,
                        "unknown tool kind; recording placeholder output"
                    );
                    Ok(format!("Unknown tool: {name}"))
                }
            },
        }
    }

    async fn invoke_text(
        &self,
        kind: &ToolKind,
        topic: &str,
        input: String,
    ) -> Result<String, ToolError> {
        let tool = self
            .toolbox
            .text_tool(kind)
            .ok_or_else(|| ToolError::NotConfigured(kind.clone()))?;

        tracing::debug!(tool = tool.name(), tool_kind = %kind, input_len = input.len(), "invoking tool");

        tool.invoke(&ToolRequest {
            kind: kind.clone(),
            topic: topic.to_string(),
            input,
        })
        .await
    }
}

/// Dependency outputs joined in `depends_on` order, or the topic when that
/// aggregation carries no text.
pub fn resolve_input(step: &Step, topic: &str, outputs: &OutputStore) -> String {
    let combined = outputs.aggregate(&step.depends_on);
    if combined.trim().is_empty() {
        topic.to_string()
    } else {
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::traits::{ImageTool, TextTool};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Echoes `kind|topic|input` and remembers every request.
    #[derive(Default)]
    struct Echo {
        seen: Mutex<Vec<ToolRequest>>,
    }

    #[async_trait]
    impl TextTool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(format!("{}|{}|{}", request.kind, request.topic, request.input))
        }
    }

    struct Failing;

    #[async_trait]
    impl TextTool for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn invoke(&self, _request: &ToolRequest) -> Result<String, ToolError> {
            Err(ToolError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    struct Pixels(Result<Vec<u8>, String>);

    #[async_trait]
    impl ImageTool for Pixels {
        fn name(&self) -> &str {
            "pixels"
        }

        async fn generate(&self, _topic: &str) -> Result<Vec<u8>, ToolError> {
            self.0.clone().map_err(ToolError::Request)
        }
    }

    fn echo_dispatcher() -> (StepDispatcher, Arc<Echo>) {
        let echo = Arc::new(Echo::default());
        let toolbox = Toolbox::new()
            .with_search(echo.clone())
            .with_summarize(echo.clone())
            .with_generate(echo.clone())
            .with_edit(echo.clone());
        (StepDispatcher::new(toolbox), echo)
    }

    fn store(entries: &[(u32, &str)]) -> OutputStore {
        let mut s = OutputStore::new();
        for (id, out) in entries {
            s.record(*id, out);
        }
        s
    }

    #[tokio::test]
    async fn test_search_uses_description_then_topic() {
        let (d, _) = echo_dispatcher();
        let outputs = OutputStore::new();

        let with_desc = Step::new(1, ToolKind::Search).with_description("rust 2024 news");
        let r = d.dispatch(&with_desc, "rust", &outputs).await;
        assert_eq!(r.output, "search|rust|rust 2024 news");

        let empty = Step::new(2, ToolKind::Search);
        let r = d.dispatch(&empty, "rust", &outputs).await;
        assert_eq!(r.output, "search|rust|rust");

        // Only a truly empty description falls back; whitespace is a query.
        let blank = Step::new(3, ToolKind::Search).with_description("  ");
        let r = d.dispatch(&blank, "rust", &outputs).await;
        assert_eq!(r.output, "search|rust|  ");
    }

    #[tokio::test]
    async fn test_summarize_aggregates_in_dependency_order() {
        let (d, _) = echo_dispatcher();
        let outputs = store(&[(1, "alpha"), (2, "beta")]);
        let step = Step::new(3, ToolKind::Summarize).depends_on([2, 1]);
        let r = d.dispatch(&step, "t", &outputs).await;
        assert!(r.is_success());
        assert_eq!(r.output, "summarize|t|beta\n\nalpha");
    }

    #[tokio::test]
    async fn test_empty_aggregation_falls_back_to_topic() {
        let (d, _) = echo_dispatcher();
        // Failed dependencies record empty output.
        let outputs = store(&[(1, ""), (2, "")]);
        let step = Step::new(3, ToolKind::Edit).depends_on([1, 2]);
        let r = d.dispatch(&step, "topic", &outputs).await;
        assert_eq!(r.output, "edit|topic|topic");

        let no_deps = Step::new(4, ToolKind::Summarize);
        let r = d.dispatch(&no_deps, "topic", &outputs).await;
        assert_eq!(r.output, "summarize|topic|topic");
    }

    #[tokio::test]
    async fn test_generate_gets_topic_and_raw_research() {
        let (d, echo) = echo_dispatcher();
        let outputs = store(&[(1, "facts")]);
        let step = Step::new(2, ToolKind::Generate).depends_on([1]);
        d.dispatch(&step, "topic", &outputs).await;

        let orphan = Step::new(3, ToolKind::Generate);
        d.dispatch(&orphan, "topic", &outputs).await;

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen[0].topic, "topic");
        assert_eq!(seen[0].input, "facts");
        assert_eq!(seen[1].input, "");
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_error_result() {
        let d = StepDispatcher::new(Toolbox::new().with_search(Arc::new(Failing)));
        let r = d
            .dispatch(&Step::new(1, ToolKind::Search), "t", &OutputStore::new())
            .await;
        assert!(!r.is_success());
        assert!(r.output.is_empty());
        assert_eq!(r.error_detail.as_deref(), Some("HTTP 503: unavailable"));
    }

    #[tokio::test]
    async fn test_missing_collaborator_is_error() {
        let d = StepDispatcher::new(Toolbox::new());
        let r = d
            .dispatch(&Step::new(1, ToolKind::Summarize), "t", &OutputStore::new())
            .await;
        assert!(!r.is_success());
        assert!(r
            .error_detail
            .unwrap()
            .contains("no collaborator configured for tool kind 'summarize'"));
    }

    #[tokio::test]
    async fn test_image_success_is_base64_payload() {
        let d = StepDispatcher::new(
            Toolbox::new().with_image(Arc::new(Pixels(Ok(vec![0xde, 0xad, 0xbe, 0xef])))),
        );
        let r = d
            .dispatch(&Step::new(5, ToolKind::Image), "t", &OutputStore::new())
            .await;
        assert!(r.is_success());
        assert_eq!(r.output, "3q2+7w==");
    }

    #[tokio::test]
    async fn test_image_failure_has_no_output() {
        let d = StepDispatcher::new(
            Toolbox::new().with_image(Arc::new(Pixels(Err("quota".to_string())))),
        );
        let r = d
            .dispatch(&Step::new(5, ToolKind::Image), "t", &OutputStore::new())
            .await;
        assert!(!r.is_success());
        assert!(r.output.is_empty());
        assert_eq!(r.error_detail.as_deref(), Some("request failed: quota"));
    }

    #[tokio::test]
    async fn test_unknown_kind_policies() {
        let step = Step::new(9, "translate");
        let outputs = OutputStore::new();

        let strict = StepDispatcher::new(Toolbox::new());
        let r = strict.dispatch(&step, "t", &outputs).await;
        assert!(!r.is_success());
        assert_eq!(
            r.error_detail.as_deref(),
            Some("unsupported tool kind: translate")
        );

        let lenient = StepDispatcher::new(Toolbox::new())
            .with_unknown_tool_policy(UnknownToolPolicy::Placeholder);
        let r = lenient.dispatch(&step, "t", &outputs).await;
        assert!(r.is_success());
        assert_eq!(r.output, "Unknown tool: translate");
    }
}
