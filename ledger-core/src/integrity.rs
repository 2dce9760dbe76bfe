//! Referential integrity checking over the local store.
//!
//! Read-only audit: reports products and orders whose `provider_code` does
//! not resolve to an existing provider. Reconciliation applies remote rows
//! one entity kind at a time, so dangling references are an expected
//! transient and the check is how they surface.

use crate::error::Result;
use crate::store::Store;
use std::sync::Arc;

/// Read-only auditor plus the `compact` administrative passthrough.
pub struct IntegrityChecker {
    store: Arc<Store>,
}

impl IntegrityChecker {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// One human-readable issue per dangling provider reference. Empty when
    /// every reference resolves. Never mutates the store.
    pub fn check_references(&self) -> Result<Vec<String>> {
        let mut issues = self.scan(
            "SELECT code, provider_code FROM products \
             WHERE provider_code IS NOT NULL \
               AND provider_code NOT IN (SELECT code FROM providers)",
            "product",
        )?;
        issues.extend(self.scan(
            "SELECT code, provider_code FROM orders \
             WHERE provider_code IS NOT NULL \
               AND provider_code NOT IN (SELECT code FROM providers)",
            "order",
        )?);
        Ok(issues)
    }

    /// Space reclamation (VACUUM). No business logic.
    pub fn compact(&self) -> Result<()> {
        self.store.vacuum()
    }

    fn scan(&self, sql: &str, kind: &str) -> Result<Vec<String>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = stmt.query([])?;
        let mut issues = Vec::new();
        while let Some(row) = rows.next()? {
            let code: String = row.get(0)?;
            let provider: String = row.get(1)?;
            issues.push(format!("{kind} {code} references missing provider {provider}"));
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderStatus, Product, Provider, PurchaseOrder};
    use crate::repository::{OrderRepository, ProductRepository, ProviderRepository};
    use tempfile::TempDir;

    fn open_store(tmp: &TempDir) -> Arc<Store> {
        Arc::new(Store::open(&tmp.path().join("ledger.db")).unwrap())
    }

    fn provider(code: &str) -> Provider {
        Provider {
            code: code.to_string(),
            name: format!("Provider {code}"),
            email: None,
            phone: None,
            address: None,
        }
    }

    fn product(code: &str, provider: Option<&str>) -> Product {
        Product {
            code: code.to_string(),
            name: format!("Product {code}"),
            category: None,
            provider_code: provider.map(|p| p.to_string()),
            stock: 0,
            cost: 0.0,
            price: 0.0,
        }
    }

    fn order(code: &str, provider: Option<&str>) -> PurchaseOrder {
        PurchaseOrder {
            code: code.to_string(),
            date: None,
            provider_code: provider.map(|p| p.to_string()),
            total: 0.0,
            status: OrderStatus::Draft,
        }
    }

    #[test]
    fn test_fully_linked_store_has_no_issues() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        ProviderRepository::new(store.clone())
            .save(&provider("PV-1"))
            .unwrap();
        ProductRepository::new(store.clone())
            .save(&product("P-1", Some("PV-1")))
            .unwrap();
        OrderRepository::new(store.clone())
            .save(&order("ORD-1", Some("PV-1")))
            .unwrap();
        // NULL references are not dangling.
        ProductRepository::new(store.clone())
            .save(&product("P-2", None))
            .unwrap();

        let issues = IntegrityChecker::new(store).check_references().unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_one_issue_per_dangling_reference() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        ProductRepository::new(store.clone())
            .save(&product("P-1", Some("PV-X")))
            .unwrap();
        OrderRepository::new(store.clone())
            .save(&order("ORD-7", Some("PV-X")))
            .unwrap();

        let issues = IntegrityChecker::new(store.clone()).check_references().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0], "product P-1 references missing provider PV-X");
        assert_eq!(issues[1], "order ORD-7 references missing provider PV-X");

        // Read-only: a second pass sees the same state.
        let again = IntegrityChecker::new(store).check_references().unwrap();
        assert_eq!(again, issues);
    }

    #[test]
    fn test_compact_runs() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        IntegrityChecker::new(store).compact().unwrap();
    }
}
