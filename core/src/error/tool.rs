use thiserror::Error;

use crate::executor::types::ToolKind;

/// Errors raised by tool collaborators.
///
/// The dispatcher turns every one of these into an error `StepResult`; none
/// of them reaches the scheduler.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("no collaborator configured for tool kind '{0}'")]
    NotConfigured(ToolKind),

    #[error("unsupported tool kind: {0}")]
    UnsupportedKind(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::Process(err.to_string())
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
