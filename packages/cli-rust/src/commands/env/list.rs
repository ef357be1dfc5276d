//! delta env list - List configured environments

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table};
use console::style;

use crate::context::Context;

/// Arguments for env list command
#[derive(Args, Default)]
pub struct EnvListArgs {
    /// Show only environment names (for scripting)
    #[arg(long)]
    pub names_only: bool,
}

pub fn cmd_env_list(args: &EnvListArgs, ctx: &Context, quiet: bool) -> Result<()> {
    let environments = &ctx.environments;

    if environments.environments.is_empty() {
        if !quiet && !args.names_only {
            println!("No environments configured.");
            println!();
            println!(
                "  {} {}",
                style("Add them to:").dim(),
                style(ctx.environments_path.display()).yellow()
            );
        }
        return Ok(());
    }

    if args.names_only || quiet {
        for name in environments.environment_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let default_env = ctx.environment_name(None).ok();

    let mut table = Table::new();
    table.set_header(vec!["Name", "APPLICATION_ENV", "Hosts", "Default host", "Default"]);

    for (name, env) in &environments.environments {
        let is_default = default_env == Some(name.as_str());
        let name_cell = if is_default {
            Cell::new(name).fg(Color::Cyan)
        } else {
            Cell::new(name)
        };

        table.add_row(vec![
            name_cell,
            Cell::new(env.application_env_for(name)),
            Cell::new(env.hosts.len().to_string()),
            Cell::new(env.default_host.as_deref().unwrap_or("-")),
            Cell::new(if is_default { "*" } else { "" }).fg(Color::Green),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "{} {}",
        style("Environments file:").dim(),
        ctx.environments_path.display()
    );

    Ok(())
}
