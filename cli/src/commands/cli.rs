use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    Text,
    Jsonl,
}

impl StreamFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "stepflow", version, about = "Run dependency-aware step plans")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; overrides ~/.stepflow/config.toml and ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Plan JSON file (`{"topic": ..., "steps": [...]}`).
    pub plan: PathBuf,

    /// Event output format; defaults to `executor.stream_format`.
    #[arg(long, value_enum)]
    pub format: Option<StreamFormat>,

    /// Upper bound on steps running at once inside a wave.
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Write the full execution result as JSON.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the final binary artifact (image bytes), if any.
    #[arg(long)]
    pub image_out: Option<PathBuf>,

    /// Show per-step progress spinners.
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    pub plan: PathBuf,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address; defaults to `http_server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port; defaults to `http_server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a plan.
    Run(RunArgs),
    /// Check a plan and preview its waves without running anything.
    Validate(ValidateArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}
