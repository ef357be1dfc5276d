//! delta env show - Show hosts of an environment

use anyhow::Result;
use clap::Args;
use console::style;
use deltacli_core::{EnvironmentConfig, HostConfig};

use crate::context::Context;

/// Arguments for env show command
#[derive(Args)]
pub struct EnvShowArgs {
    /// Environment to show (default: the configured default environment)
    pub environment: Option<String>,

    /// Output as JSON (passwords masked)
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_env_show(args: &EnvShowArgs, ctx: &Context, quiet: bool) -> Result<()> {
    let name = ctx.environment_name(args.environment.as_deref())?;
    let env = ctx.environments.get_environment(name)?;

    if args.json || quiet {
        let json = serde_json::to_string_pretty(&masked(env))?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", style(name).cyan().bold());
    println!(
        "  {:<18} {}",
        style("APPLICATION_ENV:").dim(),
        env.application_env_for(name)
    );
    println!();

    for (host_name, host) in &env.hosts {
        let is_default = env.default_host.as_deref() == Some(host_name.as_str());
        print!("  {}", style(host_name).bold());
        if is_default {
            print!(" {}", style("(default)").green());
        }
        println!();

        println!(
            "    {:<15} {}@{}:{}",
            style("SSH:").dim(),
            host.user,
            host.hostname,
            host.ssh_port()
        );
        println!("    {:<15} {}", style("Auth:").dim(), auth_label(host));

        let chain = env.tunnel_chain(host_name)?;
        if chain.len() > 1 {
            let route: Vec<&str> = chain.iter().map(|(n, _)| *n).collect();
            println!("    {:<15} {}", style("Route:").dim(), route.join(" via "));
        }

        if let Some(dir) = &host.ssh_home_folder {
            println!("    {:<15} {}", style("Home:").dim(), dir);
        }
        for (key, value) in &host.additional_ssh_options {
            println!("    {:<15} {}={}", style("Option:").dim(), key, value);
        }
        if let Some(desc) = &host.description {
            println!("    {:<15} {}", style("Description:").dim(), desc);
        }
        println!();
    }

    Ok(())
}

fn auth_label(host: &HostConfig) -> String {
    match (host.identity_file.as_deref(), host.password()) {
        (Some(key), _) => format!("key {key}"),
        (None, Some(_)) => "password".to_string(),
        (None, None) => "ssh agent / default keys".to_string(),
    }
}

/// Copy of an environment with every password replaced
fn masked(env: &EnvironmentConfig) -> EnvironmentConfig {
    let mut env = env.clone();
    for host in env.hosts.values_mut() {
        if host.password().is_some() {
            host.password = Some("********".to_string());
        }
    }
    env
}
