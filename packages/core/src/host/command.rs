//! Remote command assembly
//!
//! Builds shell-invocable `ssh` command lines and wraps them for hosts that
//! authenticate with a password.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Environment variable sshpass reads the password from
pub const SSHPASS_ENV: &str = "SSHPASS";

/// Quote a single token for a POSIX shell
///
/// Tokens made only of safe characters are returned unchanged; everything
/// else is wrapped in single quotes.
pub fn shell_escape(s: &str) -> String {
    ::shell_escape::unix::escape(Cow::Borrowed(s)).into_owned()
}

/// How a password reaches the SSH client
///
/// `ssh` itself cannot take a password non-interactively, so password hosts
/// need a helper in front of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PasswordRelay {
    /// `sshpass -e`, password passed through the SSHPASS environment variable
    #[default]
    Sshpass,
    /// Expect script called as `<script> <password> <command>`
    ///
    /// The password shows up in the process list while it runs.
    Expect { script: String },
}

impl PasswordRelay {
    /// Wrap an assembled ssh line so it can log in with `password`
    pub fn wrap(&self, ssh_line: String, password: &str) -> RemoteCommand {
        match self {
            PasswordRelay::Sshpass => RemoteCommand {
                line: format!("sshpass -e {ssh_line}"),
                env: vec![(SSHPASS_ENV.to_string(), password.to_string())],
            },
            PasswordRelay::Expect { script } => RemoteCommand::new(format!(
                "{} {} {} > /dev/null 2>&1",
                shell_escape(script),
                shell_escape(password),
                shell_escape(&ssh_line)
            )),
        }
    }
}

/// A fully assembled command line plus the secrets it needs in its environment
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    line: String,
    env: Vec<(String, String)>,
}

impl RemoteCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            env: Vec::new(),
        }
    }

    /// The shell command line
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Environment variables the line expects to be set
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// `sh -c <line>` with the environment applied
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.line);
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

impl fmt::Debug for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env: Vec<String> = self.env.iter().map(|(k, _)| format!("{k}=***")).collect();
        f.debug_struct("RemoteCommand")
            .field("line", &self.line)
            .field("env", &env)
            .finish()
    }
}

/// Resolved pieces of one `ssh` invocation
#[derive(Debug, Clone)]
pub(crate) struct SshInvocation<'a> {
    pub options: String,
    pub port: u16,
    pub extra_flags: &'a str,
    pub identity_file: Option<String>,
    pub username: &'a str,
    pub hostname: &'a str,
    pub remote_command: Option<String>,
    pub stdin: Option<&'a Path>,
}

impl SshInvocation<'_> {
    /// `ssh <options> -p <port> <flags> [-i <key>] <user>@<host> [<command>] [< <stdin>]`
    pub fn render(&self) -> String {
        let mut parts = vec!["ssh".to_string()];
        if !self.options.is_empty() {
            parts.push(self.options.clone());
        }
        parts.push(format!("-p {}", self.port));
        if !self.extra_flags.trim().is_empty() {
            parts.push(self.extra_flags.trim().to_string());
        }
        if let Some(key) = &self.identity_file {
            parts.push(format!("-i {}", shell_escape(key)));
        }
        parts.push(format!(
            "{}@{}",
            shell_escape(self.username),
            shell_escape(self.hostname)
        ));
        if let Some(command) = &self.remote_command {
            parts.push(shell_escape(command));
        }
        if let Some(stdin) = self.stdin {
            parts.push(format!("< {}", shell_escape(&stdin.to_string_lossy())));
        }
        parts.join(" ")
    }
}

/// Prefix a remote command with the APPLICATION_ENV export and working directory
pub(crate) fn prepare_remote_command(
    command: &str,
    application_env: Option<&str>,
    home_folder: Option<&str>,
) -> String {
    let mut prepared = match application_env {
        Some(env) => format!("export APPLICATION_ENV={}; {command}", shell_escape(env)),
        None => command.to_string(),
    };
    if let Some(dir) = home_folder.filter(|d| !d.is_empty()) {
        prepared = format!("cd {}; {prepared}", shell_escape(dir));
    }
    prepared
}
