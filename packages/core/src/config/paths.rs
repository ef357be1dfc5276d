//! XDG-compliant path resolution for deltacli
//!
//! Provides consistent path resolution across platforms:
//! - Linux/macOS: ~/.config/deltacli/
//! - Windows: %APPDATA%\deltacli\

use std::path::PathBuf;

/// Get the configuration directory path
///
/// Returns the directory where config.json and environments.json live:
/// - Linux: `~/.config/deltacli/`
/// - macOS: `~/.config/deltacli/` (XDG-style, not ~/Library)
/// - Windows: `%APPDATA%\deltacli\`
pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config").join("deltacli"))
    }
    #[cfg(target_os = "windows")]
    {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .map(|d| d.join("deltacli"))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// Get the full path to the config file
///
/// Returns: `{config_dir}/config.json`
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("config.json"))
}

/// Get the full path to the environments file
///
/// Returns: `{config_dir}/environments.json`
pub fn get_environments_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("environments.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_exists() {
        let dir = get_config_dir();
        assert!(dir.is_some());
        let path = dir.unwrap();
        assert!(path.ends_with("deltacli"));
    }

    #[test]
    fn test_config_path_ends_with_config_json() {
        let path = get_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("config.json"));
    }

    #[test]
    fn test_environments_path_ends_with_environments_json() {
        let path = get_environments_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("environments.json"));
    }
}
