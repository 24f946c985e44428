use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::executor::types::ToolKind;

/// Resolved input handed to a text collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub kind: ToolKind,
    pub topic: String,
    /// Query for search, aggregated upstream output for the other kinds.
    pub input: String,
}

/// External collaborator producing text (search, summarize, generate, edit).
#[async_trait]
pub trait TextTool: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError>;
}

/// External collaborator producing an image for a topic.
#[async_trait]
pub trait ImageTool: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, topic: &str) -> Result<Vec<u8>, ToolError>;
}

/// Collaborator handles injected into the dispatcher, one slot per tool kind.
#[derive(Clone, Default)]
pub struct Toolbox {
    pub search: Option<Arc<dyn TextTool>>,
    pub summarize: Option<Arc<dyn TextTool>>,
    pub generate: Option<Arc<dyn TextTool>>,
    pub edit: Option<Arc<dyn TextTool>>,
    pub image: Option<Arc<dyn ImageTool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, tool: Arc<dyn TextTool>) -> Self {
        self.search = Some(tool);
        self
    }

    pub fn with_summarize(mut self, tool: Arc<dyn TextTool>) -> Self {
        self.summarize = Some(tool);
        self
    }

    pub fn with_generate(mut self, tool: Arc<dyn TextTool>) -> Self {
        self.generate = Some(tool);
        self
    }

    pub fn with_edit(mut self, tool: Arc<dyn TextTool>) -> Self {
        self.edit = Some(tool);
        self
    }

    pub fn with_image(mut self, tool: Arc<dyn ImageTool>) -> Self {
        self.image = Some(tool);
        self
    }

    /// Text collaborator for `kind`; `None` for image and unknown kinds.
    pub fn text_tool(&self, kind: &ToolKind) -> Option<&Arc<dyn TextTool>> {
        match kind {
            ToolKind::Search => self.search.as_ref(),
            ToolKind::Summarize => self.summarize.as_ref(),
            ToolKind::Generate => self.generate.as_ref(),
            ToolKind::Edit => self.edit.as_ref(),
            ToolKind::Image | ToolKind::Other(_) => None,
        }
    }
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolbox")
            .field("search", &self.search.as_ref().map(|t| t.name().to_string()))
            .field(
                "summarize",
                &self.summarize.as_ref().map(|t| t.name().to_string()),
            )
            .field(
                "generate",
                &self.generate.as_ref().map(|t| t.name().to_string()),
            )
            .field("edit", &self.edit.as_ref().map(|t| t.name().to_string()))
            .field("image", &self.image.as_ref().map(|t| t.name().to_string()))
            .finish()
    }
}

type BlockingFn = dyn Fn(&ToolRequest) -> Result<String, ToolError> + Send + Sync;

/// Adapts a synchronous collaborator call so it runs on the blocking pool
/// instead of stalling the async workers.
pub struct BlockingTextTool {
    name: String,
    call: Arc<BlockingFn>,
}

impl BlockingTextTool {
    pub fn new<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&ToolRequest) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }
}

#[async_trait]
impl TextTool for BlockingTextTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        let call = self.call.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || call(&request))
            .await
            .map_err(|e| ToolError::Other(format!("blocking call did not complete: {e}")))?
    }
}
