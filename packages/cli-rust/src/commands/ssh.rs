//! delta ssh - Open an interactive shell on a host

use anyhow::Result;
use clap::Args;

use super::exit_with;
use crate::context::{Context, TargetArgs, chain_label, set_up};
use crate::runner::run_inherited;

/// Arguments for ssh command
#[derive(Args)]
pub struct SshArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

pub async fn cmd_ssh(args: &SshArgs, ctx: &Context, quiet: bool) -> Result<()> {
    let target = ctx.target(&args.target)?;
    let tunnel = ctx.tunnel(&target)?;
    let label = chain_label(&tunnel);
    let (tunnel, _) = set_up(tunnel, label, quiet).await?;

    let command = tunnel.assemble_ssh_command(None, "-t", false, None);
    let code = run_inherited(&command).await;

    // Close forwarders before leaving the process
    drop(tunnel);
    exit_with(code?)
}
