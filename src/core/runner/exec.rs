use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::core::error::{BootstrapError, BootstrapResult};
use crate::core::runner::command::ExecutableCommand;

/// Seam between command assembly and the operating system. Production code
/// uses [`TokioCommandExecutor`]; tests substitute fakes.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the command to completion and return its exit code.
    async fn exit_code(&self, command: &ExecutableCommand) -> BootstrapResult<i32>;

    /// Start the command without waiting for it to finish. Its output is
    /// drained to the log in the background.
    async fn spawn_detached(&self, command: &ExecutableCommand) -> BootstrapResult<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandExecutor;

impl TokioCommandExecutor {
    fn build(command: &ExecutableCommand) -> tokio::process::Command {
        let mut process = tokio::process::Command::new(command.program());
        process.args(command.arguments());
        process
    }

    fn spawn_error(command: &ExecutableCommand, source: std::io::Error) -> BootstrapError {
        BootstrapError::ProcessSpawn {
            command: command.readable(),
            source,
        }
    }
}

#[async_trait]
impl CommandExecutor for TokioCommandExecutor {
    async fn exit_code(&self, command: &ExecutableCommand) -> BootstrapResult<i32> {
        debug!("Running to completion: {}", command);
        let output = Self::build(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Self::spawn_error(command, source))?;
        let code = output.status.code().unwrap_or(-1);
        debug!(
            "Command exited with {}: {}",
            code,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(code)
    }

    async fn spawn_detached(&self, command: &ExecutableCommand) -> BootstrapResult<()> {
        info!("Spawning: {}", command);
        let mut child = Self::build(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Self::spawn_error(command, source))?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!("[child stdout] {}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!("[child stderr] {}", line);
                }
            });
        }

        // Reap the child when it eventually exits; the bootstrap itself
        // does not wait on it.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("Spawned process exited: {}", status),
                Err(err) => warn!("Failed to await spawned process: {}", err),
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_code_reports_process_status() {
        let executor = TokioCommandExecutor;

        let ok = ExecutableCommand::new(vec!["true".into()]);
        assert_eq!(executor.exit_code(&ok).await.unwrap(), 0);

        let fail = ExecutableCommand::new(vec!["false".into()]);
        assert_ne!(executor.exit_code(&fail).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let executor = TokioCommandExecutor;
        let command = ExecutableCommand::new(vec!["/definitely/not/a/binary".into()]);

        let err = executor.exit_code(&command).await.unwrap_err();
        assert!(matches!(err, BootstrapError::ProcessSpawn { .. }));
    }

    #[tokio::test]
    async fn spawn_detached_returns_before_the_process_ends() {
        let executor = TokioCommandExecutor;
        let command = ExecutableCommand::new(vec!["sleep".into(), "5".into()]);

        let started = std::time::Instant::now();
        executor.spawn_detached(&command).await.unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }
}
