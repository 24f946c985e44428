//! stepflow-cli library - exposes modules for the binary and unit tests

pub mod commands;
pub mod http;
