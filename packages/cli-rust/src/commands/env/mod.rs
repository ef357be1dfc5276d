//! Env subcommand implementations
//!
//! Provides `delta env` subcommands for inspecting environments and
//! choosing the default one.

mod default;
mod list;
mod show;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::Context;

pub use default::{EnvDefaultArgs, cmd_env_default};
pub use list::{EnvListArgs, cmd_env_list};
pub use show::{EnvShowArgs, cmd_env_show};

/// Environment command arguments
#[derive(Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    command: Option<EnvSubcommands>,
}

#[derive(Subcommand)]
pub enum EnvSubcommands {
    /// List configured environments
    List(EnvListArgs),
    /// Show hosts and tunnel chains of an environment
    Show(EnvShowArgs),
    /// Show or set the default environment
    Default(EnvDefaultArgs),
}

/// Handle env command, defaulting to list
pub fn cmd_env(args: &EnvArgs, ctx: &Context, quiet: bool) -> Result<()> {
    match &args.command {
        Some(EnvSubcommands::List(list)) => cmd_env_list(list, ctx, quiet),
        Some(EnvSubcommands::Show(show)) => cmd_env_show(show, ctx, quiet),
        Some(EnvSubcommands::Default(default)) => cmd_env_default(default, ctx, quiet),
        None => cmd_env_list(&EnvListArgs::default(), ctx, quiet),
    }
}
