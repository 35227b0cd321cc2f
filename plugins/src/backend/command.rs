use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use taskpilot_core::api::{BackendConfig, CapabilityError, CompletionBackend, TextStream};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const STDERR_TAIL_CHARS: usize = 400;

/// Model backend that shells out to a CLI: the prompt goes to stdin and the
/// answer is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    cmd: String,
    args: Vec<String>,
    envs: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl CommandBackend {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args: Vec::new(),
            envs: HashMap::new(),
            timeout: None,
        }
    }

    /// `None` when no command is configured.
    pub fn from_config(cfg: &BackendConfig) -> Option<Self> {
        let cmd = cfg.command.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        Some(
            Self::new(cmd)
                .with_args(cfg.args.clone())
                .with_envs(cfg.env.clone())
                .with_timeout(cfg.timeout_secs.map(Duration::from_secs)),
        )
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_envs(mut self, envs: HashMap<String, String>) -> Self {
        self.envs = envs;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self, prompt: &str, context: &str) -> Result<Child, CapabilityError> {
        let mut child = Command::new(&self.cmd)
            .args(&self.args)
            .envs(&self.envs)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CapabilityError::Backend(format!("failed to spawn '{}': {e}", self.cmd)))?;

        tracing::debug!(cmd = %self.cmd, prompt_len = prompt.len(), "backend process spawned");

        // stdin is fed in the background while stdout is read
        if let Some(mut stdin) = child.stdin.take() {
            let input = render_input(prompt, context);
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::debug!("backend closed stdin early: {}", e);
                }
                let _ = stdin.shutdown().await;
            });
        }
        Ok(child)
    }

    async fn run_to_end(&self, child: Child) -> Result<String, CapabilityError> {
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(exit_error(&self.cmd, output.status.code(), &stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[async_trait]
impl CompletionBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.cmd
    }

    async fn complete(&self, prompt: &str, context: &str) -> Result<String, CapabilityError> {
        let child = self.spawn(prompt, context)?;
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_to_end(child))
                .await
                .map_err(|_| CapabilityError::Timeout(limit.as_secs()))?,
            None => self.run_to_end(child).await,
        }
    }

    async fn stream(
        &self,
        prompt: &str,
        context: &str,
        cancel: CancellationToken,
    ) -> Result<TextStream, CapabilityError> {
        let mut child = self.spawn(prompt, context)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CapabilityError::Backend("backend stdout unavailable".into()))?;
        let stderr_task = drain_stderr(&mut child);
        let cmd = self.cmd.clone();

        let lines = async_stream::try_stream! {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let line = tokio::select! {
                    _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
                    line = lines.next_line() => line.map_err(CapabilityError::from),
                }?;
                let Some(line) = line else { break };
                yield format!("{line}\n");
            }

            let status = child.wait().await?;
            if !status.success() {
                let stderr = match stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                Err(exit_error(&cmd, status.code(), &stderr))?;
            }
        };

        Ok(lines.boxed())
    }
}

fn render_input(prompt: &str, context: &str) -> String {
    if context.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n## Context\n{context}")
    }
}

fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(tokio::spawn(async move {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf).await;
        buf
    }))
}

fn exit_error(cmd: &str, code: Option<i32>, stderr: &str) -> CapabilityError {
    let stderr = stderr.trim();
    let tail: String = stderr
        .chars()
        .rev()
        .take(STDERR_TAIL_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    CapabilityError::Backend(format!(
        "'{cmd}' exited with code {}: {tail}",
        code.map(|c| c.to_string()).unwrap_or_else(|| "?".into())
    ))
}
