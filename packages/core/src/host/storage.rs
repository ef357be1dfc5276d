//! Environments file storage
//!
//! Load and save environments.json. A missing file reads as empty.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use super::error::HostError;
use super::schema::EnvironmentsFile;

/// Load environments from a specific file and validate every tunnel chain
pub fn load_environments_from(path: &Path) -> Result<EnvironmentsFile, HostError> {
    if !path.exists() {
        tracing::debug!(
            "Environments file not found, returning empty: {}",
            path.display()
        );
        return Ok(EnvironmentsFile::new());
    }

    let mut file = File::open(path)
        .map_err(|e| HostError::LoadFailed(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| HostError::LoadFailed(format!("Failed to read {}: {}", path.display(), e)))?;

    let environments: EnvironmentsFile = serde_json::from_str(&contents).map_err(|e| {
        HostError::LoadFailed(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    environments.validate()?;

    tracing::debug!(
        "Loaded {} environments from {}",
        environments.environments.len(),
        path.display()
    );
    Ok(environments)
}

/// Save environments to a specific file
///
/// Creates the parent directory if it doesn't exist.
/// Creates a backup (.bak) if the file already exists.
pub fn save_environments_to(environments: &EnvironmentsFile, path: &Path) -> Result<(), HostError> {
    environments.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| HostError::SaveFailed(format!("Failed to create directory: {e}")))?;
        }
    }

    if path.exists() {
        let backup_path = path.with_extension("json.bak");
        fs::copy(path, &backup_path)
            .map_err(|e| HostError::SaveFailed(format!("Failed to create backup: {e}")))?;
        tracing::debug!("Created environments backup: {}", backup_path.display());
    }

    let json = serde_json::to_string_pretty(environments)
        .map_err(|e| HostError::SaveFailed(format!("Failed to serialize: {e}")))?;

    let mut file = File::create(path).map_err(|e| {
        HostError::SaveFailed(format!("Failed to create {}: {}", path.display(), e))
    })?;

    file.write_all(json.as_bytes()).map_err(|e| {
        HostError::SaveFailed(format!("Failed to write {}: {}", path.display(), e))
    })?;

    tracing::debug!(
        "Saved {} environments to {}",
        environments.environments.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::schema::{EnvironmentConfig, HostConfig};

    fn sample() -> EnvironmentsFile {
        let mut file = EnvironmentsFile::new();
        file.add_environment(
            "production",
            EnvironmentConfig::default()
                .with_host("bastion", HostConfig::new("bastion.example.com").with_user("jump"))
                .with_host(
                    "web",
                    HostConfig::new("10.0.0.5")
                        .with_user("deploy")
                        .with_tunnel_host("bastion"),
                ),
        );
        file
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_environments_from(&dir.path().join("environments.json")).unwrap();
        assert!(loaded.environments.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("environments.json");

        save_environments_to(&sample(), &path).unwrap();
        let loaded = load_environments_from(&path).unwrap();
        assert_eq!(loaded, sample());

        // Second save keeps a backup of the first
        save_environments_to(&sample(), &path).unwrap();
        assert!(path.with_extension("json.bak").exists());
    }

    #[test]
    fn test_load_rejects_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("environments.json");
        fs::write(
            &path,
            r#"{"environments": {"prod": {"hosts": {
                "a": {"hostname": "a", "tunnel_host": "b"},
                "b": {"hostname": "b", "tunnel_host": "a"}
            }}}}"#,
        )
        .unwrap();

        assert!(matches!(
            load_environments_from(&path),
            Err(HostError::TunnelCycle(_))
        ));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("environments.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_environments_from(&path),
            Err(HostError::LoadFailed(_))
        ));
    }
}
