//! SSH client option rendering
//!
//! Turns a host's connection policy into `-o Key=Value` options.

use std::collections::BTreeMap;

use super::command::shell_escape;

/// Ordered set of SSH client options
///
/// Setting an existing key replaces its value in place; new keys append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptionSet {
    options: Vec<(String, String)>,
}

impl SshOptionSet {
    /// Build the option set for a connection
    ///
    /// `hostname` is the hostname the client will actually dial, after tunnel
    /// resolution; dialing `localhost` means going through a local forwarder,
    /// whose host key changes with every port.
    pub fn for_connection(
        batch_mode: bool,
        hostname: &str,
        additional: &BTreeMap<String, String>,
    ) -> Self {
        let mut set = Self::defaults();

        if batch_mode {
            set.set("BatchMode", "yes");
            set.set("PreferredAuthentications", "publickey");
        }

        if hostname == "localhost" {
            set.set("UserKnownHostsFile", "/dev/null");
            set.set("LogLevel", "error");
        }

        for (key, value) in additional {
            set.set(key, value);
        }

        set
    }

    fn defaults() -> Self {
        let mut set = Self {
            options: Vec::new(),
        };
        set.set("Compression", "yes");
        set.set("StrictHostKeyChecking", "no");
        set.set("ConnectTimeout", "8");
        set.set("ConnectionAttempts", "3");
        set.set("ExitOnForwardFailure", "yes");
        set.set("IdentitiesOnly", "yes");
        set
    }

    /// Set an option, overriding any earlier value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.options.push((key, value)),
        }
    }

    /// Current value of an option
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Options as argv tokens: `["-o", "Key=Value", ...]`
    pub fn to_args(&self) -> Vec<String> {
        self.options
            .iter()
            .flat_map(|(k, v)| ["-o".to_string(), format!("{k}={v}")])
            .collect()
    }

    /// Options as a space-joined shell string: `-o Key=Value -o ...`
    ///
    /// Each `Key=Value` token is quoted on its own.
    pub fn render(&self) -> String {
        self.options
            .iter()
            .map(|(k, v)| format!("-o {}", shell_escape(&format!("{k}={v}"))))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_render_in_order() {
        let set = SshOptionSet::for_connection(false, "web.example.com", &BTreeMap::new());
        assert_eq!(
            set.render(),
            "-o Compression=yes -o StrictHostKeyChecking=no -o ConnectTimeout=8 \
             -o ConnectionAttempts=3 -o ExitOnForwardFailure=yes -o IdentitiesOnly=yes"
        );
    }

    #[test]
    fn batch_mode_forces_publickey() {
        let set = SshOptionSet::for_connection(true, "web.example.com", &BTreeMap::new());
        assert_eq!(set.get("BatchMode"), Some("yes"));
        assert_eq!(set.get("PreferredAuthentications"), Some("publickey"));
        assert!(set.get("UserKnownHostsFile").is_none());
    }

    #[test]
    fn localhost_skips_known_hosts() {
        let set = SshOptionSet::for_connection(false, "localhost", &BTreeMap::new());
        assert_eq!(set.get("UserKnownHostsFile"), Some("/dev/null"));
        assert_eq!(set.get("LogLevel"), Some("error"));
    }

    #[test]
    fn additional_options_take_precedence() {
        let mut extra = BTreeMap::new();
        extra.insert("StrictHostKeyChecking".to_string(), "yes".to_string());
        extra.insert("ServerAliveInterval".to_string(), "30".to_string());

        let set = SshOptionSet::for_connection(true, "web.example.com", &extra);
        let rendered = set.render();
        assert!(rendered.contains("-o StrictHostKeyChecking=yes"));
        assert!(!rendered.contains("StrictHostKeyChecking=no"));
        // Overrides keep their slot, new keys go last
        assert!(rendered.starts_with("-o Compression=yes -o StrictHostKeyChecking=yes"));
        assert!(rendered.ends_with("-o ServerAliveInterval=30"));
    }

    #[test]
    fn render_quotes_values_with_shell_syntax() {
        let mut extra = BTreeMap::new();
        extra.insert(
            "ProxyCommand".to_string(),
            "ssh -W %h:%p jump; touch /tmp/owned".to_string(),
        );
        let set = SshOptionSet::for_connection(false, "web", &extra);
        assert!(
            set.render()
                .ends_with(" -o 'ProxyCommand=ssh -W %h:%p jump; touch /tmp/owned'")
        );
        // argv form needs no quoting
        assert_eq!(
            set.to_args().last().map(String::as_str),
            Some("ProxyCommand=ssh -W %h:%p jump; touch /tmp/owned")
        );
    }

    #[test]
    fn args_pair_each_option_with_flag() {
        let set = SshOptionSet::for_connection(false, "h", &BTreeMap::new());
        let args = set.to_args();
        assert_eq!(args.len(), 12);
        assert_eq!(args[0], "-o");
        assert_eq!(args[1], "Compression=yes");
    }
}
