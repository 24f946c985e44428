use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use stepflow_core::config::CommandToolConfig;
use stepflow_core::error::ToolError;
use stepflow_core::executor::{ImageTool, TextTool, ToolRequest};

/// Runs a local program: input on stdin, output from stdout.
#[derive(Debug, Clone)]
struct CommandSpec {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSpec {
    fn from_config(cfg: &CommandToolConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }

    async fn run(&self, stdin_data: &[u8], envs: &[(&str, &str)]) -> Result<Vec<u8>, ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(envs.iter().copied())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ToolError::Process(format!("failed to spawn '{}': {e}", self.program)))?;

        // Feed stdin from its own task so a program that streams output while
        // still reading cannot fill both pipes and stall.
        let stdin = child.stdin.take();
        let input = stdin_data.to_vec();
        let writer = tokio::spawn(async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&input).await {
                // Programs that ignore stdin may exit before we finish writing.
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
            // stdin dropped here: the program sees EOF.
        });
        let abort_writer = writer.abort_handle();

        let finished = tokio::time::timeout(self.timeout, async {
            let output = child.wait_with_output().await?;
            writer
                .await
                .map_err(|e| ToolError::Process(format!("stdin writer failed: {e}")))??;
            Ok::<_, ToolError>(output)
        })
        .await;

        let output = match finished {
            Ok(output) => output?,
            Err(_) => {
                abort_writer.abort();
                return Err(ToolError::Process(format!(
                    "'{}' timed out after {}ms",
                    self.program,
                    self.timeout.as_millis()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::Process(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(program = %self.program, stdout_len = output.stdout.len(), "command finished");
        Ok(output.stdout)
    }
}

/// Text collaborator backed by a local program.
///
/// The resolved input is written to stdin; `STEPFLOW_TOOL_KIND` and
/// `STEPFLOW_TOPIC` are set in the child's environment.
pub struct CommandTool {
    spec: CommandSpec,
}

impl CommandTool {
    pub fn new(cfg: &CommandToolConfig) -> Self {
        Self {
            spec: CommandSpec::from_config(cfg),
        }
    }
}

#[async_trait]
impl TextTool for CommandTool {
    fn name(&self) -> &str {
        &self.spec.program
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        let kind = request.kind.to_string();
        let stdout = self
            .spec
            .run(
                request.input.as_bytes(),
                &[("STEPFLOW_TOOL_KIND", &kind), ("STEPFLOW_TOPIC", &request.topic)],
            )
            .await?;
        String::from_utf8(stdout)
            .map_err(|e| ToolError::Decode(format!("command output is not UTF-8: {e}")))
    }
}

/// Image collaborator backed by a local program; the topic goes to stdin and
/// the raw stdout bytes are the image.
pub struct CommandImageTool {
    spec: CommandSpec,
}

impl CommandImageTool {
    pub fn new(cfg: &CommandToolConfig) -> Self {
        Self {
            spec: CommandSpec::from_config(cfg),
        }
    }
}

#[async_trait]
impl ImageTool for CommandImageTool {
    fn name(&self) -> &str {
        &self.spec.program
    }

    async fn generate(&self, topic: &str) -> Result<Vec<u8>, ToolError> {
        let bytes = self
            .spec
            .run(topic.as_bytes(), &[("STEPFLOW_TOPIC", topic)])
            .await?;
        if bytes.is_empty() {
            return Err(ToolError::Process(format!(
                "'{}' produced no image bytes",
                self.spec.program
            )));
        }
        Ok(bytes)
    }
}
