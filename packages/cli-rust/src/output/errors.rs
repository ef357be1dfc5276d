//! Host error formatting with actionable guidance

use console::style;
use deltacli_core::HostError;

/// Format host errors with a short hint on what to try next
pub fn format_host_error(e: &HostError) -> String {
    match e {
        HostError::SshSpawn(msg) => format!(
            "{}\n\n  {}\n  {}",
            style("Could not start ssh").red().bold(),
            msg,
            style("  Check ssh_binary with: delta config show").cyan(),
        ),
        HostError::TunnelConnectionFailure { host, reason } => format!(
            "{}\n\n  {}\n  {}\n  {}",
            style(format!("SSH tunnel through '{host}' did not open")).red().bold(),
            reason,
            "Make sure key-based login to that host works on its own:",
            style(format!("  delta check --host {host}")).cyan(),
        ),
        HostError::PortAllocation(msg) => format!(
            "{}\n\n  {}\n  {}",
            style("No free local port for the tunnel").red().bold(),
            msg,
            style("  Try: delta tunnel ... --local-port <port>").cyan(),
        ),
        HostError::TunnelCycle(_) | HostError::UnknownTunnelHost { .. } | HostError::ChainTooDeep { .. } => {
            format!(
                "{}\n\n  {}\n  {}",
                style("Broken tunnel_host configuration").red().bold(),
                e,
                style("  Inspect routes with: delta env show").cyan(),
            )
        }
        HostError::EnvironmentNotFound(name) => format!(
            "{}\n\n  {}",
            style(format!("Environment '{name}' not found")).red().bold(),
            style("  List environments with: delta env list").cyan(),
        ),
        _ => e.to_string(),
    }
}
