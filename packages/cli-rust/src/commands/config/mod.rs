//! Config subcommand implementations
//!
//! Provides `delta config` subcommands for viewing configuration.

mod show;

use anyhow::Result;
use clap::{Args, Subcommand};
use deltacli_core::Config;

pub use show::cmd_config_show;

/// Configuration command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Output as JSON instead of table format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show current configuration
    Show {
        /// Output as JSON instead of table format
        #[arg(long)]
        json: bool,
    },
}

/// Handle config command
///
/// If no subcommand is given, defaults to Show.
pub fn cmd_config(args: &ConfigArgs, config: &Config, quiet: bool) -> Result<()> {
    match args.command {
        Some(ConfigSubcommands::Show { json }) => cmd_config_show(config, json, quiet),
        None => cmd_config_show(config, args.json, quiet),
    }
}
