//! Pull reconciler: fetch remote snapshots and merge them locally.
//!
//! Conflict policy is last-write-wins: a pulled record unconditionally
//! overwrites the local row with the same code, with no version or
//! timestamp comparison. Divergent local edits that have not been pushed
//! yet are clobbered; that is the source system's documented behavior and
//! is kept deliberately.

use crate::records::{OrderRecord, ProductRecord, ProviderRecord, decode_array};
use crate::transport::SyncTransport;
use ledger_core::{OrderRepository, ProductRepository, ProviderRepository, Store};
use std::sync::Arc;

const PULL_KINDS: [&str; 3] = ["products", "providers", "orders"];

/// Outcome of one pull cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Cycle skipped entirely because the probe reported offline.
    pub offline: bool,
    /// Records upserted into local repositories.
    pub applied: u64,
    /// Records skipped because they failed to decode or to save.
    pub skipped: u64,
    /// Entity kinds whose fetch failed outright. Failures are isolated:
    /// the other kinds still reconcile.
    pub failed_kinds: Vec<String>,
}

/// Fetch-and-merge cycle over the fixed set of entity kinds.
pub struct PullReconciler {
    products: ProductRepository,
    providers: ProviderRepository,
    orders: OrderRepository,
    transport: Arc<dyn SyncTransport>,
}

impl PullReconciler {
    pub fn new(store: Arc<Store>, transport: Arc<dyn SyncTransport>) -> Self {
        Self {
            products: ProductRepository::new(store.clone()),
            providers: ProviderRepository::new(store.clone()),
            orders: OrderRepository::new(store),
            transport,
        }
    }

    pub async fn pull_updates(&self) -> PullReport {
        let mut report = PullReport::default();
        if !self.transport.is_online().await {
            tracing::warn!("offline, skipping remote pull");
            report.offline = true;
            return report;
        }

        for kind in PULL_KINDS {
            match self.pull_kind(kind).await {
                Ok((applied, skipped)) => {
                    report.applied += applied;
                    report.skipped += skipped;
                }
                Err(e) => {
                    tracing::warn!("pull of {kind} failed: {e}");
                    report.failed_kinds.push(kind.to_string());
                }
            }
        }
        report
    }

    async fn pull_kind(&self, kind: &str) -> crate::error::SyncResult<(u64, u64)> {
        let body = self.transport.fetch_snapshot(kind).await?;
        let (applied, skipped) = match kind {
            "products" => {
                let (records, errors) = decode_array::<ProductRecord>(&body)?;
                let mut applied = 0;
                let mut skipped = errors.len() as u64;
                report_decode_errors(kind, &errors);
                for record in records {
                    match self.products.save(&record.into_product()) {
                        Ok(()) => applied += 1,
                        Err(e) => {
                            tracing::warn!("failed to save pulled product: {e}");
                            skipped += 1;
                        }
                    }
                }
                (applied, skipped)
            }
            "providers" => {
                let (records, errors) = decode_array::<ProviderRecord>(&body)?;
                let mut applied = 0;
                let mut skipped = errors.len() as u64;
                report_decode_errors(kind, &errors);
                for record in records {
                    match self.providers.save(&record.into_provider()) {
                        Ok(()) => applied += 1,
                        Err(e) => {
                            tracing::warn!("failed to save pulled provider: {e}");
                            skipped += 1;
                        }
                    }
                }
                (applied, skipped)
            }
            "orders" => {
                let (records, errors) = decode_array::<OrderRecord>(&body)?;
                let mut applied = 0;
                let mut skipped = errors.len() as u64;
                report_decode_errors(kind, &errors);
                for record in records {
                    match record.try_into_order() {
                        Ok(order) => match self.orders.save(&order) {
                            Ok(()) => applied += 1,
                            Err(e) => {
                                tracing::warn!("failed to save pulled order: {e}");
                                skipped += 1;
                            }
                        },
                        Err(e) => {
                            tracing::warn!("skipping pulled order: {e}");
                            skipped += 1;
                        }
                    }
                }
                (applied, skipped)
            }
            other => unreachable!("unknown pull kind {other}"),
        };
        Ok((applied, skipped))
    }
}

fn report_decode_errors(kind: &str, errors: &[String]) {
    for error in errors {
        tracing::warn!("skipping pulled {kind} {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use ledger_core::OrderStatus;
    use tempfile::TempDir;

    fn setup(tmp: &TempDir) -> (Arc<Store>, Arc<MockTransport>, PullReconciler) {
        let store = Arc::new(Store::open(&tmp.path().join("ledger.db")).unwrap());
        let transport = Arc::new(MockTransport::new());
        let reconciler = PullReconciler::new(store.clone(), transport.clone());
        (store, transport, reconciler)
    }

    fn seed_snapshots(transport: &MockTransport) {
        transport.set_snapshot(
            "products",
            r#"[{"codigo":"P-1","nombre":"Widget","proveedorCodigo":"PV-1","stock":3}]"#,
        );
        transport.set_snapshot(
            "providers",
            r#"[{"codigo":"PV-1","nombre":"Acme","email":"sales@acme.example"}]"#,
        );
        transport.set_snapshot(
            "orders",
            r#"[{"codigo":"ORD-1","fecha":"2024-03-01","proveedorCodigo":"PV-1",
                 "total":99.5,"estado":"ENVIADA"}]"#,
        );
    }

    #[tokio::test]
    async fn test_offline_pull_is_noop() {
        let tmp = TempDir::new().unwrap();
        let (store, transport, reconciler) = setup(&tmp);
        transport.set_online(false);

        let report = reconciler.pull_updates().await;
        assert!(report.offline);
        assert_eq!(report.applied, 0);
        assert!(ProductRepository::new(store).list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pull_merges_all_kinds() {
        let tmp = TempDir::new().unwrap();
        let (store, transport, reconciler) = setup(&tmp);
        seed_snapshots(&transport);

        let report = reconciler.pull_updates().await;
        assert!(!report.offline);
        assert_eq!(report.applied, 3);
        assert_eq!(report.skipped, 0);
        assert!(report.failed_kinds.is_empty());

        let product = ProductRepository::new(store.clone())
            .find_by_code("P-1")
            .unwrap()
            .unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 3);

        let order = OrderRepository::new(store)
            .find_by_code("ORD-1")
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Sent);
    }

    #[tokio::test]
    async fn test_pull_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let (store, transport, reconciler) = setup(&tmp);
        seed_snapshots(&transport);

        reconciler.pull_updates().await;
        reconciler.pull_updates().await;

        assert_eq!(ProductRepository::new(store.clone()).list().unwrap().len(), 1);
        assert_eq!(ProviderRepository::new(store.clone()).list().unwrap().len(), 1);
        assert_eq!(OrderRepository::new(store).list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_overwrites_local() {
        let tmp = TempDir::new().unwrap();
        let (store, transport, reconciler) = setup(&tmp);
        seed_snapshots(&transport);

        // A divergent local edit is clobbered by the pulled snapshot.
        let products = ProductRepository::new(store.clone());
        products
            .save(&ledger_core::Product {
                code: "P-1".to_string(),
                name: "Local name".to_string(),
                category: None,
                provider_code: None,
                stock: 99,
                cost: 0.0,
                price: 0.0,
            })
            .unwrap();

        reconciler.pull_updates().await;
        let product = products.find_by_code("P-1").unwrap().unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_failed_kind_does_not_block_others() {
        let tmp = TempDir::new().unwrap();
        let (store, transport, reconciler) = setup(&tmp);
        seed_snapshots(&transport);
        transport.set_snapshot_error("providers", 503);

        let report = reconciler.pull_updates().await;
        assert_eq!(report.failed_kinds, vec!["providers".to_string()]);
        assert_eq!(report.applied, 2);

        assert!(
            ProductRepository::new(store.clone())
                .find_by_code("P-1")
                .unwrap()
                .is_some()
        );
        assert!(
            ProviderRepository::new(store)
                .find_by_code("PV-1")
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let (store, transport, reconciler) = setup(&tmp);
        transport.set_snapshot(
            "products",
            r#"[{"codigo":"P-1","nombre":"Widget"},{"nombre":"no code"}]"#,
        );
        transport.set_snapshot("providers", "[]");
        transport.set_snapshot("orders", "[]");

        let report = reconciler.pull_updates().await;
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.failed_kinds.is_empty());
        assert!(
            ProductRepository::new(store)
                .find_by_code("P-1")
                .unwrap()
                .is_some()
        );
    }
}
