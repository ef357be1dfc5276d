//! Local port probing

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

/// Checks whether something accepts TCP connections on a local port
#[derive(Debug, Clone, Copy)]
pub struct PortProbe {
    timeout: Duration,
}

impl PortProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// True when a connection to 127.0.0.1:`port` succeeds within the timeout
    ///
    /// Any connect error (refused, timed out, unreachable) counts as "free".
    pub fn is_listening(&self, port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!("Nothing listening on port {}: {}", port, e);
                false
            }
        }
    }
}

impl Default for PortProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
