use serde::{Deserialize, Serialize};

/// What the dispatcher does with a step whose tool kind it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownToolPolicy {
    /// Produce an error `StepResult`.
    #[default]
    Error,
    /// Produce a success `StepResult` carrying a placeholder string.
    Placeholder,
}

impl std::str::FromStr for UnknownToolPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(format!("unknown tool policy '{other}' (expected error|placeholder)")),
        }
    }
}

/// `[executor]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Upper bound on steps running at once inside a wave. Unset = no bound.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    #[serde(default)]
    pub unknown_tool: UnknownToolPolicy,

    /// Renderer used by the CLI: "text" or "jsonl".
    #[serde(default = "default_stream_format")]
    pub stream_format: String,

    #[serde(default)]
    pub progress_bar: bool,
}

fn default_stream_format() -> String {
    "text".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel: None,
            unknown_tool: UnknownToolPolicy::default(),
            stream_format: default_stream_format(),
            progress_bar: false,
        }
    }
}

/// Execution options for one engine instance.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOpts {
    /// Maximum parallel steps per wave (None = one unit per step)
    pub max_parallel: Option<usize>,

    /// Enable visual progress bar
    pub progress_bar: bool,
}

impl ExecutionOpts {
    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self {
            max_parallel: cfg.max_parallel.filter(|n| *n > 0),
            progress_bar: cfg.progress_bar,
        }
    }
}
