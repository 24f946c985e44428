use thiserror::Error;

use super::{ErrorCode, ExecutorError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Command(_) => ErrorCode::GeneralError,
            Self::Executor(e) => e.error_code(),
            Self::Io(_) => ErrorCode::GeneralError,
            Self::Json(_) => ErrorCode::ParseError,
            Self::Anyhow(_) => ErrorCode::GeneralError,
        }
    }
}
