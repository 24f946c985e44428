//! stepflow-core: plan model, wave scheduler, step dispatcher and artifact
//! synthesis, plus the config and error types shared by the plugins and CLI.

pub mod config;
pub mod error;
pub mod executor;
