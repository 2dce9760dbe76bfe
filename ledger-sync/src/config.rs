//! Sync engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote API; a trailing slash is normalized away.
    pub api_base_url: String,
    /// Address probed to decide online/offline, `host:port`.
    pub probe_addr: String,
    /// Bound for the connectivity probe; also seeds the HTTP client's
    /// connect and request timeouts.
    pub timeout: Duration,
    /// Maximum outbox items delivered per push cycle. Bounds worst-case
    /// cycle latency; the remainder waits for the next cycle.
    pub push_batch_size: u32,
    /// Dead-letter threshold: an item failing this many attempts stops
    /// being retried.
    pub max_attempts: u32,
    /// Managed document storage root.
    pub document_root: PathBuf,
}

impl SyncConfig {
    /// Configuration for a given API base URL, everything else defaulted.
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.ledger.example".to_string(),
            probe_addr: "8.8.8.8:53".to_string(),
            timeout: Duration::from_secs(10),
            push_batch_size: 25,
            max_attempts: 10,
            document_root: PathBuf::from("documents"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let config = SyncConfig::new("https://api.example.com/");
        assert_eq!(config.api_base_url, "https://api.example.com");

        let config = SyncConfig::new("https://api.example.com");
        assert_eq!(config.api_base_url, "https://api.example.com");
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.push_batch_size, 25);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
