//! Host management module
//!
//! Provides functionality for reaching remote hosts over SSH:
//! - Environment and host configuration schema and storage
//! - Tunnel chain resolution through intermediate hosts
//! - Background SSH forwarders with readiness polling
//! - Remote command assembly with credential and environment injection

mod chain;
mod command;
mod error;
mod options;
mod probe;
mod process;
mod schema;
mod storage;
mod tunnel;

// Public exports
pub use chain::{MAX_CHAIN_DEPTH, resolve_chain};
pub use command::{PasswordRelay, RemoteCommand, SSHPASS_ENV, shell_escape};
pub use error::HostError;
pub use options::SshOptionSet;
pub use probe::PortProbe;
pub use process::{ForwardRequest, ForwarderLauncher, SshLauncher, TunnelProcess};
pub use schema::{DEFAULT_SSH_PORT, EnvironmentConfig, EnvironmentsFile, HostConfig};
pub use storage::{load_environments_from, save_environments_to};
pub use tunnel::{MIN_LOCAL_PORT, SshTunnel, TunnelSettings, TunnelState};
