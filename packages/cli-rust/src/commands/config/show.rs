//! Config show subcommand
//!
//! Displays current configuration in table or JSON format.

use anyhow::Result;
use comfy_table::{Cell, Color, Table};
use deltacli_core::{Config, PasswordRelay, config};

/// Show current configuration
pub fn cmd_config_show(config: &Config, json: bool, _quiet: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(config)?;
        println!("{output}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Key", "Value"]);

    table.add_row(vec![
        Cell::new("version"),
        Cell::new(config.version.to_string()),
    ]);
    table.add_row(vec![Cell::new("ssh_binary"), Cell::new(&config.ssh_binary)]);
    table.add_row(vec![
        Cell::new("batch_mode"),
        Cell::new(config.batch_mode.to_string()).fg(if config.batch_mode {
            Color::Reset
        } else {
            Color::Yellow
        }),
    ]);
    table.add_row(vec![
        Cell::new("readiness_timeout_secs"),
        Cell::new(config.readiness_timeout_secs.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("poll_interval_ms"),
        Cell::new(config.poll_interval_ms.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("probe_timeout_ms"),
        Cell::new(config.probe_timeout_ms.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("port_allocation_attempts"),
        Cell::new(config.port_allocation_attempts.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("password_relay"),
        format_relay(&config.password_relay),
    ]);
    table.add_row(vec![
        Cell::new("default_environment"),
        Cell::new(format_optional(&config.default_environment)),
    ]);

    println!("{table}");

    if let Some(path) = config::paths::get_config_path() {
        println!();
        println!("Config file: {}", path.display());
    }

    Ok(())
}

/// Format an optional string for display
fn format_optional(value: &Option<String>) -> String {
    match value {
        Some(s) if !s.is_empty() => s.clone(),
        _ => "(not set)".to_string(),
    }
}

/// Expect scripts put the password on their command line, so flag them
fn format_relay(relay: &PasswordRelay) -> Cell {
    match relay {
        PasswordRelay::Sshpass => Cell::new("sshpass"),
        PasswordRelay::Expect { script } => {
            Cell::new(format!("expect ({script})")).fg(Color::Yellow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_optional_with_value() {
        assert_eq!(format_optional(&Some("production".to_string())), "production");
    }

    #[test]
    fn test_format_optional_with_empty() {
        assert_eq!(format_optional(&Some(String::new())), "(not set)");
    }

    #[test]
    fn test_format_optional_with_none() {
        assert_eq!(format_optional(&None), "(not set)");
    }

    #[test]
    fn test_format_relay_names_script() {
        let cell = format_relay(&PasswordRelay::Expect {
            script: "/opt/login.exp".to_string(),
        });
        assert_eq!(cell.content(), "expect (/opt/login.exp)");
        assert_eq!(format_relay(&PasswordRelay::Sshpass).content(), "sshpass");
    }
}
