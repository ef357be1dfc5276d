//! CLI command implementations
//!
//! Environment inspection, remote shells and commands, and port tunnels.

mod check;
mod config;
mod env;
mod exec;
mod ssh;
mod tunnel;

pub use check::{CheckArgs, cmd_check};
pub use config::{ConfigArgs, cmd_config};
pub use env::{EnvArgs, cmd_env};
pub use exec::{ExecArgs, cmd_exec};
pub use ssh::{SshArgs, cmd_ssh};
pub use tunnel::{TunnelArgs, cmd_tunnel};

/// Leave with the remote exit code once every tunnel is closed
fn exit_with(code: i32) -> anyhow::Result<()> {
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
