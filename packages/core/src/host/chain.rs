//! Tunnel host chain resolution
//!
//! Turns the `tunnel_host` references between hosts into an explicit,
//! ordered list so tunnels never have to chase references at runtime.

use std::collections::BTreeMap;

use super::error::HostError;
use super::schema::HostConfig;

/// Longest chain of tunnel hosts we follow
pub const MAX_CHAIN_DEPTH: usize = 8;

/// Resolve `[host, parent, ..., root]` for the named host
///
/// The root is the first host without a `tunnel_host`.
pub fn resolve_chain<'a>(
    hosts: &'a BTreeMap<String, HostConfig>,
    name: &str,
) -> Result<Vec<(&'a str, &'a HostConfig)>, HostError> {
    let (first_name, first) = hosts
        .get_key_value(name)
        .ok_or_else(|| HostError::NotFound(name.to_string()))?;

    let mut chain = vec![(first_name.as_str(), first)];

    while let Some(next) = chain[chain.len() - 1].1.tunnel_host.as_deref() {
        let current = chain[chain.len() - 1].0;

        if chain.iter().any(|(seen, _)| *seen == next) {
            let mut path: Vec<String> = chain.iter().map(|(n, _)| n.to_string()).collect();
            path.push(next.to_string());
            return Err(HostError::TunnelCycle(path));
        }

        let (next_name, next_host) =
            hosts
                .get_key_value(next)
                .ok_or_else(|| HostError::UnknownTunnelHost {
                    host: current.to_string(),
                    tunnel_host: next.to_string(),
                })?;

        chain.push((next_name.as_str(), next_host));

        if chain.len() > MAX_CHAIN_DEPTH {
            return Err(HostError::ChainTooDeep {
                host: name.to_string(),
                max: MAX_CHAIN_DEPTH,
            });
        }
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(entries: &[(&str, Option<&str>)]) -> BTreeMap<String, HostConfig> {
        entries
            .iter()
            .map(|(name, parent)| {
                let mut host = HostConfig::new(format!("{name}.example.com"));
                host.tunnel_host = parent.map(str::to_string);
                (name.to_string(), host)
            })
            .collect()
    }

    fn names(chain: &[(&str, &HostConfig)]) -> Vec<String> {
        chain.iter().map(|(n, _)| n.to_string()).collect()
    }

    #[test]
    fn direct_host_is_its_own_chain() {
        let map = hosts(&[("web", None)]);
        let chain = resolve_chain(&map, "web").unwrap();
        assert_eq!(names(&chain), vec!["web"]);
    }

    #[test]
    fn chain_is_ordered_host_to_root() {
        let map = hosts(&[("app", Some("bastion")), ("bastion", Some("gateway")), ("gateway", None)]);
        let chain = resolve_chain(&map, "app").unwrap();
        assert_eq!(names(&chain), vec!["app", "bastion", "gateway"]);
        assert_eq!(chain[2].1.hostname, "gateway.example.com");
    }

    #[test]
    fn missing_host() {
        let map = hosts(&[("web", None)]);
        assert!(matches!(
            resolve_chain(&map, "db"),
            Err(HostError::NotFound(name)) if name == "db"
        ));
    }

    #[test]
    fn unknown_tunnel_host_names_referrer() {
        let map = hosts(&[("app", Some("bastion")), ("bastion", Some("nowhere"))]);
        match resolve_chain(&map, "app") {
            Err(HostError::UnknownTunnelHost { host, tunnel_host }) => {
                assert_eq!(host, "bastion");
                assert_eq!(tunnel_host, "nowhere");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn cycle_is_rejected() {
        let map = hosts(&[("a", Some("b")), ("b", Some("c")), ("c", Some("a"))]);
        match resolve_chain(&map, "a") {
            Err(HostError::TunnelCycle(path)) => assert_eq!(path, vec!["a", "b", "c", "a"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let map = hosts(&[("a", Some("a"))]);
        assert!(matches!(resolve_chain(&map, "a"), Err(HostError::TunnelCycle(_))));
    }

    #[test]
    fn overly_long_chain_is_rejected() {
        let names: Vec<String> = (0..=MAX_CHAIN_DEPTH).map(|i| format!("h{i}")).collect();
        let entries: Vec<(&str, Option<&str>)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), names.get(i + 1).map(String::as_str)))
            .collect();
        let map = hosts(&entries);
        assert!(matches!(
            resolve_chain(&map, "h0"),
            Err(HostError::ChainTooDeep { .. })
        ));
    }
}
