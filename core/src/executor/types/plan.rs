use std::fmt;

use serde::{Deserialize, Serialize};

/// Step identifier, unique within a plan.
pub type StepId = u32;

/// Closed set of step behaviors.
///
/// Names outside the known vocabulary are kept as [`ToolKind::Other`] so a plan
/// can still be loaded; the dispatcher decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolKind {
    Search,
    Summarize,
    Generate,
    Edit,
    Image,
    Other(String),
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Search => "search",
            Self::Summarize => "summarize",
            Self::Generate => "generate",
            Self::Edit => "edit",
            Self::Image => "image",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ToolKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "search" | "search_web" | "web_search" => Self::Search,
            "summarize" | "summarizer" => Self::Summarize,
            "generate" | "content_generator" | "generator" => Self::Generate,
            "edit" | "content_editor" | "editor" => Self::Edit,
            "image" | "image_generator" => Self::Image,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ToolKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ToolKind> for String {
    fn from(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(alias = "step")]
    pub id: StepId,

    #[serde(alias = "tool")]
    pub tool_kind: ToolKind,

    #[serde(default)]
    pub description: String,

    /// Dependencies in declaration order; this order drives input aggregation.
    #[serde(default)]
    pub depends_on: Vec<StepId>,
}

impl Step {
    pub fn new(id: StepId, tool_kind: impl Into<ToolKind>) -> Self {
        Self {
            id,
            tool_kind: tool_kind.into(),
            description: String::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, deps: impl IntoIterator<Item = StepId>) -> Self {
        self.depends_on = deps.into_iter().collect();
        self
    }
}

/// Declared DAG of steps plus the topic they work on.
///
/// Consumed read-only by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub topic: String,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(topic: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            topic: topic.into(),
            steps,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
