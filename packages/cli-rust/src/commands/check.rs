//! delta check - Verify a host accepts SSH connections

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use deltacli_core::SshTunnel;

use crate::context::{Context, TargetArgs, chain_label, set_up};
use crate::output::CommandSpinner;
use crate::runner::run_captured;

/// Arguments for check command
#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

pub async fn cmd_check(args: &CheckArgs, ctx: &Context, quiet: bool) -> Result<()> {
    let target = ctx.target(&args.target)?;
    let tunnel = ctx.tunnel(&target)?;
    let label = chain_label(&tunnel);

    let tunnel = match set_up(tunnel, label, quiet).await {
        Ok((tunnel, _)) => tunnel,
        Err(e) if quiet => {
            tracing::debug!("{e:#}");
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    let spinner = CommandSpinner::new_maybe(
        &format!(
            "Checking {} ({}@{})...",
            style(target.host_name).cyan(),
            tunnel.host().user,
            tunnel.host().hostname
        ),
        quiet,
    );

    let command = tunnel.assemble_ssh_command(Some("true"), "", false, None);
    let (code, stderr) = run_captured(&command).await?;

    if code == 0 {
        spinner.success("Connection successful");
        if !quiet {
            println!();
            println!("  {:<15} {}", style("Host:").dim(), target.host_name);
            println!(
                "  {:<15} {}@{}:{}",
                style("Connects to:").dim(),
                tunnel.username(),
                tunnel.hostname(),
                tunnel.port()
            );
        }
        return Ok(());
    }

    spinner.fail("Connection failed");
    if quiet {
        drop(tunnel);
        std::process::exit(1);
    }

    println!();
    if !stderr.is_empty() {
        println!("  {stderr}");
        println!();
    }
    print_hints(&tunnel);
    bail!("SSH check failed with exit code {code}");
}

fn print_hints(tunnel: &SshTunnel) {
    let host = tunnel.host();
    println!("{}", style("Troubleshooting:").yellow());
    println!(
        "  1. Verify SSH access: ssh -p {} {}@{}",
        host.ssh_port(),
        host.user,
        host.hostname
    );
    match host.identity_file.as_deref() {
        Some(key) => println!("  2. Ensure key is loaded: ssh-add {key}"),
        None if host.password().is_some() => {
            println!("  2. Password hosts need sshpass installed, or batch_mode off")
        }
        None => println!("  2. Ensure key is loaded: ssh-add"),
    }
    if let Some(parent) = tunnel.parent() {
        println!(
            "  3. Check the tunnel host first: delta check --host {}",
            parent.host_name()
        );
    }
}
