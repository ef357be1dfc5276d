//! delta exec - Run a command on a host

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use deltacli_core::host::shell_escape;

use super::exit_with;
use crate::context::{Context, TargetArgs, chain_label, set_up};
use crate::runner::run_inherited;

/// Arguments for exec command
#[derive(Args)]
pub struct ExecArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Do not export APPLICATION_ENV before the command
    #[arg(long)]
    pub no_env: bool,

    /// Feed this local file to the command's stdin
    #[arg(long, value_name = "FILE")]
    pub stdin: Option<PathBuf>,

    /// Allocate a pseudo-terminal (ssh -t)
    #[arg(long, short = 't')]
    pub tty: bool,

    /// Command to run; a single argument is passed to the remote shell as-is
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

pub async fn cmd_exec(args: &ExecArgs, ctx: &Context, quiet: bool) -> Result<()> {
    if let Some(path) = &args.stdin {
        if !path.is_file() {
            bail!("stdin file not found: {}", path.display());
        }
    }

    let target = ctx.target(&args.target)?;
    let tunnel = ctx.tunnel(&target)?;
    let label = chain_label(&tunnel);
    let (tunnel, _) = set_up(tunnel, label, quiet).await?;

    let remote = join_command(&args.command);
    let command = tunnel.assemble_ssh_command(
        Some(&remote),
        if args.tty { "-t" } else { "" },
        !args.no_env,
        args.stdin.as_deref(),
    );
    let code = run_inherited(&command).await;

    drop(tunnel);
    exit_with(code?)
}

/// One argument is a shell snippet; several are words to quote
fn join_command(words: &[String]) -> String {
    match words {
        [single] => single.clone(),
        _ => words
            .iter()
            .map(|w| shell_escape(w))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_argument_is_raw() {
        let words = vec!["cd /var/www && ls".to_string()];
        assert_eq!(join_command(&words), "cd /var/www && ls");
    }

    #[test]
    fn several_arguments_are_quoted() {
        let words = vec!["ls".to_string(), "-la".to_string(), "my dir".to_string()];
        assert_eq!(join_command(&words), "ls -la 'my dir'");
    }
}
