use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::domain::ports::{CommandOutcome, CommandRunner, CommandSpec};

/// Runs commands on the host, forwarding their stdout/stderr line by line
/// into the tracing sink under the `cert_agent::process` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &CommandSpec) -> CommandOutcome {
        let program = command.program_name();
        tracing::info!(command = %command, "running command");

        let mut child = match Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(error) => {
                tracing::warn!(command = %command, error = %error, "command failed");
                return CommandOutcome::failed(format!("failed to spawn {program}: {error}"));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (_, _, status) = tokio::join!(
            forward_lines(&program, "stdout", stdout),
            forward_lines(&program, "stderr", stderr),
            child.wait(),
        );

        match status {
            Ok(status) if status.success() => {
                tracing::debug!(command = %command, "command succeeded");
                CommandOutcome::succeeded()
            }
            Ok(status) => {
                tracing::warn!(command = %command, status = %status, "command failed");
                CommandOutcome::failed(format!("{program} {status}"))
            }
            Err(error) => {
                tracing::warn!(command = %command, error = %error, "command failed");
                CommandOutcome::failed(format!("failed to wait for {program}: {error}"))
            }
        }
    }
}

async fn forward_lines<R>(program: &str, stream: &'static str, reader: Option<R>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !line.trim().is_empty() {
                    tracing::info!(target: "cert_agent::process", program, stream, "{line}");
                }
            }
            Ok(None) => break,
            Err(error) => {
                tracing::debug!(program, stream, error = %error, "stopped reading command output");
                break;
            }
        }
    }
}
