//! Shared state for commands that talk to hosts
//!
//! Loads the environments file once and resolves which environment and
//! host a command targets.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use deltacli_core::config::get_environments_path;
use deltacli_core::{
    Config, EnvironmentConfig, EnvironmentsFile, SshTunnel, load_environments_from,
};

use crate::output::{CommandSpinner, format_host_error};

/// Environment and host a command runs against
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Environment name (default: the configured default environment)
    pub environment: Option<String>,

    /// Host within the environment (default: the environment's default host)
    #[arg(long = "host", short = 'H')]
    pub host: Option<String>,
}

/// Loaded configuration plus environments
pub struct Context {
    pub config: Config,
    pub environments: EnvironmentsFile,
    pub environments_path: PathBuf,
}

/// A resolved environment/host pair
pub struct Target<'a> {
    pub env_name: &'a str,
    pub env: &'a EnvironmentConfig,
    pub host_name: &'a str,
}

impl Context {
    /// Load environments from `path` or the default location
    pub fn load(config: Config, path: Option<&Path>) -> Result<Self> {
        let environments_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_environments_path()
                .ok_or_else(|| anyhow::anyhow!("Could not determine environments file path"))?,
        };

        let environments = load_environments_from(&environments_path)
            .with_context(|| format!("Loading {}", environments_path.display()))?;

        Ok(Self {
            config,
            environments,
            environments_path,
        })
    }

    /// Environment named on the command line, else config default, else file default
    pub fn environment_name<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        requested
            .or(self.config.default_environment.as_deref())
            .or(self.environments.default_environment.as_deref())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No environment given and no default_environment configured.\n\
                     Available: {}",
                    self.available_environments()
                )
            })
    }

    fn available_environments(&self) -> String {
        let names = self.environments.environment_names();
        if names.is_empty() {
            format!("none (add some to {})", self.environments_path.display())
        } else {
            names.join(", ")
        }
    }

    /// Resolve environment and host for a command
    pub fn target<'a>(&'a self, args: &'a TargetArgs) -> Result<Target<'a>> {
        let env_name = self.environment_name(args.environment.as_deref())?;
        let env = self.environments.get_environment(env_name)?;
        let host_name = env.select_host(args.host.as_deref())?;
        Ok(Target {
            env_name,
            env,
            host_name,
        })
    }

    /// Build the tunnel chain for a target with the configured settings
    pub fn tunnel(&self, target: &Target<'_>) -> Result<SshTunnel> {
        let span = tracing::info_span!("delta", env = %target.env_name);
        let tunnel = SshTunnel::new(target.env_name, target.env, target.host_name)?
            .with_settings(self.config.tunnel_settings())
            .with_batch_mode(self.config.batch_mode)
            .with_span(span);
        Ok(tunnel)
    }
}

/// Open a tunnel chain without blocking the async runtime
///
/// Shows a spinner labelled `label` while hops come up; pass `None` for
/// hosts that need no forwarder.
pub async fn set_up(
    mut tunnel: SshTunnel,
    label: Option<String>,
    quiet: bool,
) -> Result<(SshTunnel, Option<u16>)> {
    let spinner = label.map(|l| CommandSpinner::new_maybe(&l, quiet));

    let (tunnel, result) = tokio::task::spawn_blocking(move || {
        let result = tunnel.set_up();
        (tunnel, result)
    })
    .await
    .context("Tunnel setup task panicked")?;

    match result {
        Ok(port) => {
            if let Some(spinner) = spinner {
                spinner.clear();
            }
            Ok((tunnel, port))
        }
        Err(e) => {
            if let Some(spinner) = spinner {
                spinner.fail("Tunnel setup failed");
            }
            Err(anyhow::anyhow!("{}", format_host_error(&e)))
        }
    }
}

/// Spinner label for hosts reached through a tunnel host
pub fn chain_label(tunnel: &SshTunnel) -> Option<String> {
    let mut hops = Vec::new();
    let mut hop = tunnel.parent();
    while let Some(t) = hop {
        hops.push(t.host_name());
        hop = t.parent();
    }
    if hops.is_empty() {
        None
    } else {
        Some(format!("Opening tunnel through {}...", hops.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltacli_core::HostConfig;

    fn context(config: Config) -> Context {
        let mut environments = EnvironmentsFile::new();
        environments.add_environment(
            "production",
            EnvironmentConfig::default()
                .with_host("bastion", HostConfig::new("bastion.example.com"))
                .with_host(
                    "web",
                    HostConfig::new("10.0.0.5").with_tunnel_host("bastion"),
                ),
        );
        environments.add_environment(
            "staging",
            EnvironmentConfig::default().with_host("web", HostConfig::new("staging.example.com")),
        );
        environments.default_environment = Some("staging".to_string());
        Context {
            config,
            environments,
            environments_path: PathBuf::from("/tmp/environments.json"),
        }
    }

    #[test]
    fn explicit_environment_wins() {
        let ctx = context(Config::default());
        assert_eq!(ctx.environment_name(Some("production")).unwrap(), "production");
    }

    #[test]
    fn config_default_beats_file_default() {
        let ctx = context(Config {
            default_environment: Some("production".to_string()),
            ..Default::default()
        });
        assert_eq!(ctx.environment_name(None).unwrap(), "production");

        let ctx = context(Config::default());
        assert_eq!(ctx.environment_name(None).unwrap(), "staging");
    }

    #[test]
    fn missing_environment_lists_available() {
        let mut ctx = context(Config::default());
        ctx.environments.default_environment = None;
        let err = ctx.environment_name(None).unwrap_err().to_string();
        assert!(err.contains("production, staging"));
    }

    #[test]
    fn target_needs_host_when_ambiguous() {
        let ctx = context(Config::default());
        let args = TargetArgs {
            environment: Some("production".to_string()),
            host: None,
        };
        assert!(ctx.target(&args).is_err());

        let args = TargetArgs {
            environment: Some("production".to_string()),
            host: Some("web".to_string()),
        };
        let target = ctx.target(&args).unwrap();
        assert_eq!(target.host_name, "web");

        let tunnel = ctx.tunnel(&target).unwrap();
        assert_eq!(tunnel.parent().map(SshTunnel::host_name), Some("bastion"));
        assert_eq!(
            chain_label(&tunnel).as_deref(),
            Some("Opening tunnel through bastion...")
        );
        assert!(chain_label(tunnel.parent().unwrap()).is_none());
    }
}
