//! delta env default - Show or set the default environment

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use deltacli_core::{EnvironmentsFile, save_environments_to};

use crate::context::Context;

/// Arguments for env default command
#[derive(Args)]
pub struct EnvDefaultArgs {
    /// Environment to make the default (omit to show, "none" to clear)
    pub name: Option<String>,
}

pub fn cmd_env_default(args: &EnvDefaultArgs, ctx: &Context, quiet: bool) -> Result<()> {
    let Some(name) = args.name.as_deref() else {
        match ctx.environments.default_environment.as_deref() {
            Some(name) if quiet => println!("{name}"),
            Some(name) => println!("Default environment: {}", style(name).cyan()),
            None if quiet => {}
            None => println!("No default environment set."),
        }
        if let Some(config_default) = ctx.config.default_environment.as_deref().filter(|_| !quiet) {
            println!(
                "  {} config.json overrides it with '{}'.",
                style("Note:").dim(),
                config_default
            );
        }
        return Ok(());
    };

    let mut environments = ctx.environments.clone();
    let requested = (name != "none").then_some(name);
    set_default(&mut environments, requested)?;
    save_environments_to(&environments, &ctx.environments_path)?;

    if !quiet {
        match requested {
            Some(name) => println!(
                "{} Default environment set to '{}'.",
                style("Updated:").green(),
                style(name).cyan()
            ),
            None => println!("{} Default environment cleared.", style("Updated:").green()),
        }
    }
    Ok(())
}

fn set_default(environments: &mut EnvironmentsFile, name: Option<&str>) -> Result<()> {
    if let Some(name) = name {
        if !environments.environments.contains_key(name) {
            bail!(
                "Environment '{}' not found. Available: {}",
                name,
                environments.environment_names().join(", ")
            );
        }
    }
    environments.default_environment = name.map(str::to_string);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltacli_core::{Config, EnvironmentConfig, HostConfig, load_environments_from};

    fn context(dir: &tempfile::TempDir) -> Context {
        let mut environments = EnvironmentsFile::new();
        environments.add_environment(
            "production",
            EnvironmentConfig::default().with_host("web", HostConfig::new("web.example.com")),
        );
        Context {
            config: Config::default(),
            environments,
            environments_path: dir.path().join("environments.json"),
        }
    }

    #[test]
    fn setting_default_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let args = EnvDefaultArgs {
            name: Some("production".to_string()),
        };
        cmd_env_default(&args, &ctx, true).unwrap();

        let saved = load_environments_from(&ctx.environments_path).unwrap();
        assert_eq!(saved.default_environment.as_deref(), Some("production"));
        assert!(saved.environments.contains_key("production"));
    }

    #[test]
    fn unknown_environment_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let args = EnvDefaultArgs {
            name: Some("staging".to_string()),
        };
        let err = cmd_env_default(&args, &ctx, true).unwrap_err().to_string();
        assert!(err.contains("production"));
        assert!(!ctx.environments_path.exists());
    }

    #[test]
    fn none_clears_default() {
        let mut environments = EnvironmentsFile::new();
        environments.default_environment = Some("production".to_string());
        set_default(&mut environments, None).unwrap();
        assert!(environments.default_environment.is_none());
    }
}
