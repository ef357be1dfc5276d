//! deltacli - Drive deployment environments over SSH
//!
//! This module contains the shared CLI implementation used by the binary.

mod commands;
mod context;
mod output;
mod runner;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use deltacli_core::{config, get_version, get_version_long, load_config};
use tracing_subscriber::EnvFilter;

use crate::context::Context;

/// Drive deployment environments over SSH
#[derive(Parser)]
#[command(name = "delta")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drive deployment environments over SSH", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Environments file (default: ~/.config/deltacli/environments.json)
    #[arg(long, global = true, env = "DELTA_ENVIRONMENTS")]
    environments: Option<PathBuf>,

    /// Increase verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List and inspect environments
    Env(commands::EnvArgs),
    /// Open an interactive shell on a host
    Ssh(commands::SshArgs),
    /// Run a command on a host
    Exec(commands::ExecArgs),
    /// Forward a local port to a service reachable from a host
    Tunnel(commands::TunnelArgs),
    /// Check that a host accepts SSH connections
    Check(commands::CheckArgs),
    /// Show configuration
    Config(commands::ConfigArgs),
}

/// Route log output to stderr, filtered by RUST_LOG or -v/-q
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Configure color output
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Load config (creates default if missing)
    let config_path = config::paths::get_config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            // Display rich error for invalid config
            eprintln!("{} Configuration error", style("Error:").red().bold());
            eprintln!();
            eprintln!("  {e:#}");
            eprintln!();
            eprintln!("  Config file: {}", style(config_path.display()).yellow());
            eprintln!();
            eprintln!(
                "  {} Check the config file for syntax errors or unknown fields.",
                style("Tip:").cyan()
            );
            std::process::exit(1);
        }
    };

    if cli.verbose > 0 {
        eprintln!("{} delta {}", style("[info]").cyan(), get_version_long());
        eprintln!(
            "{} Config: {}",
            style("[info]").cyan(),
            config_path.display()
        );
    }

    let Some(command) = cli.command else {
        // No command - show a welcome message and hint to use --help
        if !cli.quiet {
            println!(
                "{} {}",
                style("delta").cyan().bold(),
                style(get_version()).dim()
            );
            println!();
            println!("Run {} for available commands.", style("--help").green());
        }
        return Ok(());
    };

    if let Commands::Config(args) = &command {
        return commands::cmd_config(args, &config, cli.quiet);
    }

    let ctx = Context::load(config, cli.environments.as_deref())?;

    match command {
        Commands::Env(args) => commands::cmd_env(&args, &ctx, cli.quiet),
        Commands::Ssh(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_ssh(&args, &ctx, cli.quiet))
        }
        Commands::Exec(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_exec(&args, &ctx, cli.quiet))
        }
        Commands::Tunnel(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_tunnel(&args, &ctx, cli.quiet))
        }
        Commands::Check(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_check(&args, &ctx, cli.quiet))
        }
        Commands::Config(_) => unreachable!("handled before loading environments"),
    }
}
