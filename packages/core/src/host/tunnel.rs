//! SSH tunnel management
//!
//! An [`SshTunnel`] wraps one host of an environment. Hosts reached through a
//! tunnel host own the tunnel of that host as their parent, so a chain
//! `app -> bastion -> gateway` becomes nested tunnels built from the
//! validated chain in [`EnvironmentConfig::tunnel_chain`].
//!
//! A tunnel asked to forward for another host (see
//! [`SshTunnel::tunnel_connections_for_host`]) runs a background
//! `ssh -L <local>:<target>:<remote_port> -N` and, once open, makes every
//! connection resolve to `localhost:<local>`.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::Span;

use super::command::{PasswordRelay, RemoteCommand, SshInvocation, prepare_remote_command};
use super::error::HostError;
use super::options::SshOptionSet;
use super::probe::PortProbe;
use super::process::{ForwardRequest, ForwarderLauncher, SshLauncher, TunnelProcess};
use super::schema::{DEFAULT_SSH_PORT, EnvironmentConfig, HostConfig};

/// Lowest port drawn when allocating a local forwarder port
pub const MIN_LOCAL_PORT: u16 = 1025;

/// Timing and client knobs shared by every hop of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSettings {
    /// SSH client binary
    pub ssh_binary: String,
    /// How long to wait for a forwarder to accept connections
    pub readiness_timeout: Duration,
    /// Delay between readiness probes
    pub poll_interval: Duration,
    /// Connect timeout of a single probe
    pub probe_timeout: Duration,
    /// Random ports tried before giving up on allocation
    pub port_allocation_attempts: u32,
    /// How password hosts get their password
    pub password_relay: PasswordRelay,
}

impl Default for TunnelSettings {
    fn default() -> Self {
        Self {
            ssh_binary: "ssh".to_string(),
            readiness_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
            probe_timeout: Duration::from_millis(250),
            port_allocation_attempts: 100,
            password_relay: PasswordRelay::default(),
        }
    }
}

/// Where a tunnel is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    Idle,
    SettingUpParent,
    AllocatingPort,
    SpawningProcess,
    PollingReady,
    Open,
    Failed,
}

/// Host this tunnel forwards traffic to
#[derive(Debug, Clone, PartialEq, Eq)]
struct ForwardTarget {
    hostname: String,
}

/// SSH access to one host, optionally forwarding a local port for another
pub struct SshTunnel {
    host_name: String,
    host: HostConfig,
    application_env: String,
    parent: Option<Box<SshTunnel>>,
    remote_port: u16,
    local_port: Option<u16>,
    target: Option<ForwardTarget>,
    tunnel_username: Option<String>,
    batch_mode: bool,
    process: Option<TunnelProcess>,
    state: TunnelState,
    settings: TunnelSettings,
    launcher: Arc<dyn ForwarderLauncher>,
    span: Span,
}

impl SshTunnel {
    /// Build the tunnel for `host_name` in an environment, including its chain
    pub fn new(env_name: &str, env: &EnvironmentConfig, host_name: &str) -> Result<Self, HostError> {
        let chain = env.tunnel_chain(host_name)?;
        let application_env = env.application_env_for(env_name);

        let mut tunnel: Option<SshTunnel> = None;
        for (name, host) in chain.into_iter().rev() {
            let mut hop = SshTunnel::direct(name, host.clone(), application_env);
            hop.parent = tunnel.map(Box::new);
            tunnel = Some(hop);
        }

        tunnel.ok_or_else(|| HostError::NotFound(host_name.to_string()))
    }

    /// Tunnel for a single host with no tunnel host of its own
    pub fn direct(host_name: &str, host: HostConfig, application_env: &str) -> Self {
        Self {
            span: tracing::debug_span!("ssh_tunnel", host = %host_name),
            host_name: host_name.to_string(),
            host,
            application_env: application_env.to_string(),
            parent: None,
            remote_port: DEFAULT_SSH_PORT,
            local_port: None,
            target: None,
            tunnel_username: None,
            batch_mode: true,
            process: None,
            state: TunnelState::Idle,
            settings: TunnelSettings::default(),
            launcher: Arc::new(SshLauncher),
        }
    }

    /// Port on the far side to forward to (default 22)
    pub fn with_remote_port(mut self, port: u16) -> Self {
        self.remote_port = port;
        self
    }

    /// Bind this exact local port instead of a random one
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    /// Force (or stop forcing) non-interactive key-only auth
    pub fn with_batch_mode(mut self, batch_mode: bool) -> Self {
        self.batch_mode = batch_mode;
        self
    }

    /// Apply settings to this tunnel and every parent
    pub fn with_settings(mut self, settings: TunnelSettings) -> Self {
        self.apply_to_chain(&mut |hop: &mut SshTunnel| hop.settings = settings.clone());
        self
    }

    /// Use a different process launcher for this tunnel and every parent
    pub fn with_launcher(mut self, launcher: Arc<dyn ForwarderLauncher>) -> Self {
        self.apply_to_chain(&mut |hop: &mut SshTunnel| hop.launcher = Arc::clone(&launcher));
        self
    }

    /// Attach log events of the whole chain to `span`
    pub fn with_span(mut self, span: Span) -> Self {
        self.apply_to_chain(&mut |hop: &mut SshTunnel| {
            hop.span = tracing::debug_span!(parent: &span, "ssh_tunnel", host = %hop.host_name)
        });
        self
    }

    fn apply_to_chain(&mut self, f: &mut dyn FnMut(&mut SshTunnel)) {
        f(self);
        if let Some(parent) = self.parent.as_mut() {
            parent.apply_to_chain(f);
        }
    }

    /// Make this tunnel forward a local port to `hostname`
    ///
    /// `username` is used for connections through the forwarder; `None`
    /// keeps this host's own user.
    pub fn tunnel_connections_for_host(&mut self, hostname: &str, username: Option<&str>) -> &mut Self {
        self.target = Some(ForwardTarget {
            hostname: hostname.to_string(),
        });
        self.tunnel_username = username.map(str::to_string);
        self
    }

    /// Name of the host this tunnel connects as
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    pub fn state(&self) -> TunnelState {
        self.state
    }

    /// Tunnel of this host's tunnel host, if any
    pub fn parent(&self) -> Option<&SshTunnel> {
        self.parent.as_deref()
    }

    /// Process id of the running forwarder
    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().map(TunnelProcess::pid)
    }

    /// Local port of the running forwarder
    pub fn bound_port(&self) -> Option<u16> {
        self.process.as_ref().map(TunnelProcess::local_port)
    }

    /// Port a connection to this host must target
    pub fn port(&self) -> u16 {
        match &self.parent {
            Some(parent) => parent.port(),
            None => self.bound_port().unwrap_or_else(|| self.host.ssh_port()),
        }
    }

    /// Username a connection to this host must use
    pub fn username(&self) -> &str {
        match &self.parent {
            Some(parent) => parent.username(),
            None => self.tunnel_username.as_deref().unwrap_or(&self.host.user),
        }
    }

    /// Hostname a connection to this host must dial
    pub fn hostname(&self) -> &str {
        match &self.parent {
            Some(parent) => parent.hostname(),
            None if self.bound_port().is_some() => "localhost",
            None => &self.host.hostname,
        }
    }

    /// Client options for connecting to this host
    pub fn ssh_options(&self) -> SshOptionSet {
        SshOptionSet::for_connection(
            self.batch_mode,
            self.hostname(),
            &self.host.additional_ssh_options,
        )
    }

    /// Open the parent chain, then this tunnel's own forwarder
    ///
    /// Returns the local port when this tunnel forwards for another host and
    /// `None` when it is only a command wrapper. Blocks until the forwarder
    /// accepts connections or the readiness timeout passes.
    pub fn set_up(&mut self) -> Result<Option<u16>, HostError> {
        if self.state == TunnelState::Open {
            if let Some(process) = self.process.as_mut() {
                if process.is_alive() {
                    return Ok(Some(process.local_port()));
                }
            }
        }

        // A forwarder that died since the last set_up is reaped before reopening
        if let Some(stale) = self.process.take() {
            tracing::debug!(
                parent: &self.span,
                "SSH tunnel process {} exited, reopening",
                stale.pid()
            );
            discard(stale, &self.span);
            self.state = TunnelState::Idle;
        }

        if let Some(parent) = self.parent.as_mut() {
            self.state = TunnelState::SettingUpParent;
            let username = self.tunnel_username.as_deref().unwrap_or(&self.host.user);
            parent.tunnel_connections_for_host(&self.host.hostname, Some(username));
            parent.remote_port = self.host.ssh_port();
            if let Err(e) = parent.set_up() {
                self.state = TunnelState::Failed;
                return Err(e);
            }
        }

        let Some(target) = self.target.clone() else {
            self.state = TunnelState::Idle;
            return Ok(None);
        };

        match self.open_forwarder(&target) {
            Ok(port) => {
                self.state = TunnelState::Open;
                Ok(Some(port))
            }
            Err(e) => {
                self.state = TunnelState::Failed;
                tracing::warn!(parent: &self.span, "SSH tunnel setup failed: {}", e);
                // Do not leave hops opened earlier in the chain running
                if let Some(parent) = self.parent.as_mut() {
                    parent.tear_down();
                }
                Err(e)
            }
        }
    }

    fn open_forwarder(&mut self, target: &ForwardTarget) -> Result<u16, HostError> {
        let probe = PortProbe::new(self.settings.probe_timeout);

        self.state = TunnelState::AllocatingPort;
        let local_port = self.allocate_local_port(&probe)?;

        self.state = TunnelState::SpawningProcess;
        let request = self.forward_request(local_port, target);
        tracing::debug!(parent: &self.span, "Opening SSH tunnel with `{}`...", request.display());

        let child = self.launcher.launch(&request).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HostError::SshSpawn(format!(
                    "{} not found. Install OpenSSH client.",
                    request.program
                ))
            } else {
                HostError::SshSpawn(e.to_string())
            }
        })?;
        let mut process = TunnelProcess::new(child, local_port);
        tracing::debug!(
            parent: &self.span,
            "SSH tunnel process {} forwarding port {} to {}:{}",
            process.pid(),
            local_port,
            target.hostname,
            self.remote_port
        );

        self.state = TunnelState::PollingReady;
        if let Err(e) = self.wait_until_open(&probe, local_port) {
            discard(process, &self.span);
            return Err(e);
        }

        // Something answered, make sure it was our forwarder and not a stray listener
        if !process.is_alive() {
            discard(process, &self.span);
            return Err(HostError::tunnel_failure(
                &self.host_name,
                "Failed to connect to SSH tunnel environment: forwarder process exited",
            ));
        }

        tracing::info!(
            parent: &self.span,
            "SSH tunnel open on localhost:{} (pid {})",
            local_port,
            process.pid()
        );
        self.process = Some(process);
        Ok(local_port)
    }

    fn allocate_local_port(&self, probe: &PortProbe) -> Result<u16, HostError> {
        if let Some(port) = self.local_port {
            return Ok(port);
        }

        let mut rng = rand::rng();
        for _ in 0..self.settings.port_allocation_attempts {
            let candidate = rng.random_range(MIN_LOCAL_PORT..=u16::MAX);
            if !probe.is_listening(candidate) {
                return Ok(candidate);
            }
        }

        Err(HostError::PortAllocation(format!(
            "no free local port after {} attempts",
            self.settings.port_allocation_attempts
        )))
    }

    fn forward_request(&self, local_port: u16, target: &ForwardTarget) -> ForwardRequest {
        // Behind a tunnel host, dial the parent's forwarder instead of the raw host
        let (dial_host, dial_port) = match self.parent.as_ref().and_then(|p| p.bound_port()) {
            Some(port) => ("localhost", port),
            None => (self.host.hostname.as_str(), self.host.ssh_port()),
        };

        let mut args =
            SshOptionSet::for_connection(true, dial_host, &self.host.additional_ssh_options)
                .to_args();

        args.push("-p".to_string());
        args.push(dial_port.to_string());

        if let Some(key) = self.host.identity_path() {
            args.push("-i".to_string());
            args.push(key);
        }

        args.push(format!("{}@{}", self.host.user, dial_host));
        args.push("-L".to_string());
        args.push(format!(
            "{}:{}:{}",
            local_port, target.hostname, self.remote_port
        ));
        args.push("-N".to_string());

        ForwardRequest {
            program: self.settings.ssh_binary.clone(),
            args,
            local_port,
            target_host: target.hostname.clone(),
            remote_port: self.remote_port,
        }
    }

    /// Poll the local port until the forwarder answers
    fn wait_until_open(&self, probe: &PortProbe, port: u16) -> Result<(), HostError> {
        let start = Instant::now();

        while !probe.is_listening(port) {
            if start.elapsed() >= self.settings.readiness_timeout {
                return Err(HostError::tunnel_failure(
                    &self.host_name,
                    format!(
                        "Timed out waiting for SSH tunnel to open on port {} after {:?}",
                        port, self.settings.readiness_timeout
                    ),
                ));
            }
            thread::sleep(self.settings.poll_interval);
        }

        tracing::debug!(
            parent: &self.span,
            "SSH tunnel ready on port {} after {:?}",
            port,
            start.elapsed()
        );
        Ok(())
    }

    /// Close the parent chain, then kill this tunnel's forwarder
    ///
    /// Parents go first, so intermediate hops are already gone while the
    /// local forwarder is killed. Safe to call more than once.
    pub fn tear_down(&mut self) {
        if let Some(parent) = self.parent.as_mut() {
            parent.tear_down();
        }

        if let Some(process) = self.process.take() {
            let pid = process.pid();
            let target = self
                .target
                .as_ref()
                .map(|t| t.hostname.as_str())
                .unwrap_or("?");
            tracing::debug!(
                parent: &self.span,
                "Tearing down SSH tunnel for {} with PID {}.",
                target,
                pid
            );
            match process.kill() {
                Ok(()) => {
                    tracing::debug!(parent: &self.span, "Successfully killed SSH tunnel process {}.", pid)
                }
                Err(e) => tracing::debug!(
                    parent: &self.span,
                    "Failed to kill SSH tunnel process {}: {}",
                    pid,
                    e
                ),
            }
        }

        if self.state == TunnelState::Open {
            self.state = TunnelState::Idle;
        }
    }

    /// Assemble an `ssh` command line for this host
    ///
    /// `command` runs remotely, prefixed with `export APPLICATION_ENV=...;`
    /// when `include_env` is set and with `cd <ssh_home_folder>;` when the
    /// host has one. `extra_flags` is inserted verbatim after the port.
    pub fn assemble_ssh_command(
        &self,
        command: Option<&str>,
        extra_flags: &str,
        include_env: bool,
        stdin: Option<&Path>,
    ) -> RemoteCommand {
        let remote_command = command.filter(|c| !c.is_empty()).map(|c| {
            prepare_remote_command(
                c,
                include_env.then_some(self.application_env.as_str()),
                self.host.ssh_home_folder.as_deref(),
            )
        });

        let line = SshInvocation {
            options: self.ssh_options().render(),
            port: self.port(),
            extra_flags,
            identity_file: self.host.identity_path(),
            username: self.username(),
            hostname: self.hostname(),
            remote_command,
            stdin,
        }
        .render();

        match self.host.password() {
            Some(password) => self.settings.password_relay.wrap(line, password),
            None => RemoteCommand::new(line),
        }
    }

    /// Bare `ssh` invocation with no remote command, for validity checks
    pub fn bare_command(&self) -> RemoteCommand {
        self.assemble_ssh_command(None, "", false, None)
    }
}

impl Drop for SshTunnel {
    fn drop(&mut self) {
        self.tear_down();
    }
}

impl std::fmt::Debug for SshTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTunnel")
            .field("host_name", &self.host_name)
            .field("state", &self.state)
            .field("remote_port", &self.remote_port)
            .field("bound_port", &self.bound_port())
            .field("process_id", &self.process_id())
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

fn discard(process: TunnelProcess, span: &Span) {
    let pid = process.pid();
    if let Err(e) = process.kill() {
        tracing::debug!(parent: span, "Cleanup of SSH tunnel process {} failed: {}", pid, e);
    }
}
