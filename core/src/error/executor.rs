use thiserror::Error;

use super::ErrorCode;
use crate::executor::types::StepId;

/// Executor-specific errors for plan graph construction and execution.
///
/// Cycles and dangling dependencies are not errors: they end the run through
/// the deadlock path instead.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Duplicate step ID: {0}")]
    DuplicateStepId(StepId),

    #[error("Invalid step ID {0}: step ids must be positive")]
    InvalidStepId(StepId),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

impl ExecutorError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateStepId(_) => ErrorCode::ValidationError,
            Self::InvalidStepId(_) => ErrorCode::ValidationError,
            Self::InvalidPlan(_) => ErrorCode::ParseError,
        }
    }
}

impl From<serde_json::Error> for ExecutorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPlan(err.to_string())
    }
}
