//! delta tunnel - Forward a local port through a host

use anyhow::{Context as _, Result};
use clap::Args;
use console::style;

use crate::context::{Context, TargetArgs, set_up};

/// Arguments for tunnel command
#[derive(Args)]
pub struct TunnelArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Host to reach from the far side (e.g. a database only the host can see)
    #[arg(long, value_name = "HOST")]
    pub to: String,

    /// Port on the target host
    #[arg(long, value_name = "PORT")]
    pub remote_port: u16,

    /// Local port to bind (default: a random free port)
    #[arg(long, value_name = "PORT")]
    pub local_port: Option<u16>,

    /// Username for connections through the tunnel (default: the host's user)
    #[arg(long)]
    pub user: Option<String>,
}

pub async fn cmd_tunnel(args: &TunnelArgs, ctx: &Context, quiet: bool) -> Result<()> {
    let target = ctx.target(&args.target)?;
    let mut tunnel = ctx.tunnel(&target)?.with_remote_port(args.remote_port);
    if let Some(port) = args.local_port {
        tunnel = tunnel.with_local_port(port);
    }
    tunnel.tunnel_connections_for_host(&args.to, args.user.as_deref());

    let label = format!(
        "Opening tunnel to {}:{} through {}...",
        args.to, args.remote_port, target.host_name
    );
    let (tunnel, port) = set_up(tunnel, Some(label), quiet).await?;
    let port = port.context("Tunnel did not report a local port")?;

    if quiet {
        println!("{port}");
    } else {
        println!(
            "{} Forwarding {} -> {}:{} via {}",
            style("✓").green(),
            style(format!("localhost:{port}")).cyan().bold(),
            args.to,
            args.remote_port,
            target.host_name
        );
        if let Some(pid) = tunnel.process_id() {
            println!("  {:<15} {}", style("PID:").dim(), pid);
        }
        println!();
        println!("Press {} to close the tunnel.", style("Ctrl-C").yellow());
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    drop(tunnel);
    if !quiet {
        println!();
        println!("Tunnel closed.");
    }
    Ok(())
}
