//! Transport layer abstraction for sync operations.
//!
//! The trait abstracts the network layer so the delivery worker and pull
//! reconciler can run against HTTP in production and a mock in tests.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::probe::ConnectivityProbe;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Network operations the sync engine depends on.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Whether the remote side is reachable at all. Checked once per cycle
    /// before any queue access.
    async fn is_online(&self) -> bool;

    /// Deliver one outbox payload. `Ok(())` means the remote confirmed the
    /// change (HTTP 2xx); any failure leaves the item for a retry.
    async fn push_change(&self, entity: &str, payload: &str) -> SyncResult<()>;

    /// Fetch the remote snapshot for an entity kind; returns the raw JSON
    /// array body.
    async fn fetch_snapshot(&self, kind: &str) -> SyncResult<String>;
}

/// HTTP transport against `{api_base}/sync/{entity}` endpoints.
pub struct HttpTransport {
    base_url: String,
    probe: ConnectivityProbe,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            probe: ConnectivityProbe::new(&config.probe_addr, config.timeout),
            http,
        })
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn is_online(&self) -> bool {
        self.probe.is_online().await
    }

    async fn push_change(&self, entity: &str, payload: &str) -> SyncResult<()> {
        let url = format!("{}/sync/{}", self.base_url, entity);
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SyncError::Status(resp.status().as_u16()))
        }
    }

    async fn fetch_snapshot(&self, kind: &str) -> SyncResult<String> {
        let url = format!("{}/sync/{}", self.base_url, kind);
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SyncError::Status(resp.status().as_u16()));
        }
        Ok(resp.text().await?)
    }
}

/// A mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    online: AtomicBool,
    snapshots: Mutex<HashMap<String, Result<String, u16>>>,
    failing_payloads: Mutex<Vec<String>>,
    push_log: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    /// Creates a new mock transport, online by default.
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Sets the snapshot body returned for an entity kind.
    pub fn set_snapshot(&self, kind: &str, body: &str) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(kind.to_string(), Ok(body.to_string()));
    }

    /// Makes fetches for an entity kind fail with an HTTP status.
    pub fn set_snapshot_error(&self, kind: &str, status: u16) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(kind.to_string(), Err(status));
    }

    /// Makes pushes fail for any payload containing `fragment`.
    pub fn fail_payloads_containing(&self, fragment: &str) {
        self.failing_payloads
            .lock()
            .unwrap()
            .push(fragment.to_string());
    }

    pub fn clear_push_failures(&self) {
        self.failing_payloads.lock().unwrap().clear();
    }

    /// Every `(entity, payload)` pair delivered so far.
    pub fn pushed(&self) -> Vec<(String, String)> {
        self.push_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTransport for MockTransport {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn push_change(&self, entity: &str, payload: &str) -> SyncResult<()> {
        self.push_log
            .lock()
            .unwrap()
            .push((entity.to_string(), payload.to_string()));
        let failing = self.failing_payloads.lock().unwrap();
        if failing.iter().any(|f| payload.contains(f.as_str())) {
            return Err(SyncError::Status(500));
        }
        Ok(())
    }

    async fn fetch_snapshot(&self, kind: &str) -> SyncResult<String> {
        match self.snapshots.lock().unwrap().get(kind) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(SyncError::Status(*status)),
            None => Err(SyncError::Status(404)),
        }
    }
}
