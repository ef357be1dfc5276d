//! Version information for deltacli

/// Crate version, e.g. `0.4.0`
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Version plus the commit and build date CI stamps in, when present
///
/// Release builds set `DELTA_GIT_HASH` and `DELTA_BUILD_DATE` at compile time.
pub fn get_version_long() -> String {
    let git_hash = option_env!("DELTA_GIT_HASH").unwrap_or("unknown");
    let build_date = option_env!("DELTA_BUILD_DATE").unwrap_or("unknown");
    format!("{} (git: {git_hash}, built: {build_date})", get_version())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_semver_like() {
        let version = get_version();
        assert_eq!(version.split('.').count(), 3, "expected major.minor.patch, got {version}");
    }

    #[test]
    fn test_long_version_starts_with_version() {
        assert!(get_version_long().starts_with(&get_version()));
        assert!(get_version_long().contains("git: "));
    }
}
