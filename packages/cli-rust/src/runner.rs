//! Run assembled SSH command lines locally

use std::process::Stdio;

use anyhow::{Context, Result};
use deltacli_core::RemoteCommand;

/// Run `command` with inherited stdio and return its exit code
///
/// A process killed by a signal reports 255, like ssh does for its own failures.
pub async fn run_inherited(command: &RemoteCommand) -> Result<i32> {
    tracing::debug!("Running {:?}", command);
    let mut cmd = tokio::process::Command::from(command.to_command());
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let status = cmd
        .status()
        .await
        .context("Failed to run ssh through sh")?;
    Ok(status.code().unwrap_or(255))
}

/// Run `command` with captured output, returning exit code and stderr
pub async fn run_captured(command: &RemoteCommand) -> Result<(i32, String)> {
    tracing::debug!("Running {:?}", command);
    let mut cmd = tokio::process::Command::from(command.to_command());
    cmd.stdin(Stdio::null());

    let output = cmd
        .output()
        .await
        .context("Failed to run ssh through sh")?;
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Ok((output.status.code().unwrap_or(255), stderr))
}
