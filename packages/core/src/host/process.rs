//! Background forwarder processes
//!
//! A forwarder is an `ssh -L ... -N` child that binds a local port and relays
//! it to a remote target. We keep the native child handle so liveness checks
//! and teardown never depend on scraping pids out of shell output.

use std::io;
use std::process::{Child, Command, Stdio};

use super::command::shell_escape;

/// Everything needed to start one forwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    /// Client binary (normally `ssh`)
    pub program: String,
    /// Full argument list, already including `-L` and `-N`
    pub args: Vec<String>,
    /// Local port the forwarder is expected to bind
    pub local_port: u16,
    /// Host the traffic is relayed to, as seen from the tunnel host
    pub target_host: String,
    /// Port on the target
    pub remote_port: u16,
}

impl ForwardRequest {
    /// Printable, shell-escaped form of the command for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_escape)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Starts forwarder processes
pub trait ForwarderLauncher: Send + Sync {
    fn launch(&self, request: &ForwardRequest) -> io::Result<Child>;
}

/// Launches the real SSH client, detached from the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct SshLauncher;

impl ForwarderLauncher for SshLauncher {
    fn launch(&self, request: &ForwardRequest) -> io::Result<Child> {
        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group so Ctrl-C in the terminal does not reach it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd.spawn()
    }
}

/// Live state of one forwarder
#[derive(Debug)]
pub struct TunnelProcess {
    child: Child,
    local_port: u16,
}

impl TunnelProcess {
    pub fn new(child: Child, local_port: u16) -> Self {
        Self { child, local_port }
    }

    /// OS process id of the forwarder
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Local port the forwarder serves
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Check if the forwarder has not exited yet
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Forcibly kill the forwarder and reap it
    pub fn kill(mut self) -> io::Result<()> {
        let result = self.child.kill();
        // Reap the zombie even when kill reports the process already exited
        let _ = self.child.wait();
        result
    }
}
