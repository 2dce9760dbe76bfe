//! Connectivity probe.
//!
//! A bounded-timeout TCP connect decides online/offline before any sync
//! cycle touches the queue. Offline is an expected condition, reported as
//! `false` rather than an error.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Reachability check against a fixed probe address.
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    addr: String,
    timeout: Duration,
}

impl ConnectivityProbe {
    pub fn new(addr: &str, probe_timeout: Duration) -> Self {
        Self {
            addr: addr.to_string(),
            timeout: probe_timeout,
        }
    }

    /// True when the probe address accepts a TCP connection within the
    /// configured timeout.
    pub async fn is_online(&self) -> bool {
        match timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!("no network connectivity available: {e}");
                false
            }
            Err(_) => {
                tracing::warn!("connectivity probe to {} timed out", self.addr);
                false
            }
        }
    }
}
