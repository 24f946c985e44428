#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod tool;

pub use error::CliError;
pub use executor::ExecutorError;
pub use tool::ToolError;

/// Stable machine-readable error codes shared by the CLI and the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    ConfigError = 60,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneralError => "GENERAL_ERROR",
            Self::ParseError => "PARSE_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}
