//! Entity repositories over the local store.
//!
//! All writes are upserts keyed by the entity's natural `code`: the code is
//! the conflict-resolution key for both local saves and remote
//! reconciliation (last-write-wins, no version comparison).

use crate::error::{Result, StoreError};
use crate::model::{OrderStatus, Product, Provider, PurchaseOrder};
use crate::store::Store;
use rusqlite::{Row, params};
use std::sync::Arc;

/// Products, keyed by `code`.
pub struct ProductRepository {
    store: Arc<Store>,
}

impl ProductRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn save(&self, product: &Product) -> Result<()> {
        self.store.conn().execute(
            "INSERT INTO products (code, name, category, provider_code, stock, cost, price, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, CURRENT_TIMESTAMP) \
             ON CONFLICT(code) DO UPDATE SET \
                 name = excluded.name, \
                 category = excluded.category, \
                 provider_code = excluded.provider_code, \
                 stock = excluded.stock, \
                 cost = excluded.cost, \
                 price = excluded.price, \
                 updated_at = CURRENT_TIMESTAMP",
            params![
                product.code,
                product.name,
                product.category,
                product.provider_code,
                product.stock,
                product.cost,
                product.price
            ],
        )?;
        Ok(())
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<Product>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT code, name, category, provider_code, stock, cost, price \
             FROM products WHERE code = ?1",
        )?;
        let mut rows = stmt.query(params![code])?;
        match rows.next()? {
            Some(row) => Ok(Some(map_product(row)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Product>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT code, name, category, provider_code, stock, cost, price \
             FROM products ORDER BY code",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map_product(row)?);
        }
        Ok(out)
    }

    pub fn delete_by_code(&self, code: &str) -> Result<()> {
        self.store
            .conn()
            .execute("DELETE FROM products WHERE code = ?1", params![code])?;
        Ok(())
    }
}

fn map_product(row: &Row<'_>) -> Result<Product> {
    Ok(Product {
        code: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        provider_code: row.get(3)?,
        stock: row.get(4)?,
        cost: row.get(5)?,
        price: row.get(6)?,
    })
}

/// Providers, keyed by `code`.
pub struct ProviderRepository {
    store: Arc<Store>,
}

impl ProviderRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn save(&self, provider: &Provider) -> Result<()> {
        self.store.conn().execute(
            "INSERT INTO providers (code, name, email, phone, address, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP) \
             ON CONFLICT(code) DO UPDATE SET \
                 name = excluded.name, \
                 email = excluded.email, \
                 phone = excluded.phone, \
                 address = excluded.address, \
                 updated_at = CURRENT_TIMESTAMP",
            params![
                provider.code,
                provider.name,
                provider.email,
                provider.phone,
                provider.address
            ],
        )?;
        Ok(())
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<Provider>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT code, name, email, phone, address FROM providers WHERE code = ?1",
        )?;
        let mut rows = stmt.query(params![code])?;
        match rows.next()? {
            Some(row) => Ok(Some(map_provider(row)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Provider>> {
        let conn = self.store.conn();
        let mut stmt = conn
            .prepare_cached("SELECT code, name, email, phone, address FROM providers ORDER BY code")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map_provider(row)?);
        }
        Ok(out)
    }

    pub fn delete_by_code(&self, code: &str) -> Result<()> {
        self.store
            .conn()
            .execute("DELETE FROM providers WHERE code = ?1", params![code])?;
        Ok(())
    }
}

fn map_provider(row: &Row<'_>) -> Result<Provider> {
    Ok(Provider {
        code: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
    })
}

/// Purchase orders, keyed by `code`.
pub struct OrderRepository {
    store: Arc<Store>,
}

impl OrderRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn save(&self, order: &PurchaseOrder) -> Result<()> {
        self.store.conn().execute(
            "INSERT INTO orders (code, date, provider_code, total, status, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP) \
             ON CONFLICT(code) DO UPDATE SET \
                 date = excluded.date, \
                 provider_code = excluded.provider_code, \
                 total = excluded.total, \
                 status = excluded.status, \
                 updated_at = CURRENT_TIMESTAMP",
            params![
                order.code,
                order.date.map(|d| d.to_string()),
                order.provider_code,
                order.total,
                order.status.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<PurchaseOrder>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, code, date, provider_code, total, status FROM orders WHERE code = ?1",
        )?;
        let mut rows = stmt.query(params![code])?;
        match rows.next()? {
            Some(row) => Ok(Some(map_order(row)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<PurchaseOrder>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, code, date, provider_code, total, status FROM orders ORDER BY code",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map_order(row)?);
        }
        Ok(out)
    }

    pub fn delete_by_code(&self, code: &str) -> Result<()> {
        self.store
            .conn()
            .execute("DELETE FROM orders WHERE code = ?1", params![code])?;
        Ok(())
    }
}

fn map_order(row: &Row<'_>) -> Result<PurchaseOrder> {
    let id: i64 = row.get(0)?;
    let date: Option<String> = row.get(2)?;
    let status: String = row.get(5)?;
    Ok(PurchaseOrder {
        code: row.get(1)?,
        date: date.and_then(|d| d.parse().ok()),
        provider_code: row.get(3)?,
        total: row.get(4)?,
        status: OrderStatus::parse(&status).ok_or(StoreError::InvalidColumn {
            column: "status",
            id,
            value: status.clone(),
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(tmp: &TempDir) -> Arc<Store> {
        Arc::new(Store::open(&tmp.path().join("ledger.db")).unwrap())
    }

    fn product(code: &str, provider: Option<&str>) -> Product {
        Product {
            code: code.to_string(),
            name: format!("Product {code}"),
            category: Some("general".to_string()),
            provider_code: provider.map(|p| p.to_string()),
            stock: 5,
            cost: 2.5,
            price: 4.0,
        }
    }

    #[test]
    fn test_product_upsert_by_code() {
        let tmp = TempDir::new().unwrap();
        let repo = ProductRepository::new(open_store(&tmp));

        repo.save(&product("P-1", Some("PV-1"))).unwrap();
        let mut updated = product("P-1", Some("PV-2"));
        updated.stock = 9;
        repo.save(&updated).unwrap();

        let all = repo.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].stock, 9);
        assert_eq!(all[0].provider_code.as_deref(), Some("PV-2"));
    }

    #[test]
    fn test_product_find_and_delete() {
        let tmp = TempDir::new().unwrap();
        let repo = ProductRepository::new(open_store(&tmp));

        repo.save(&product("P-1", None)).unwrap();
        assert!(repo.find_by_code("P-1").unwrap().is_some());
        assert!(repo.find_by_code("P-2").unwrap().is_none());

        repo.delete_by_code("P-1").unwrap();
        assert!(repo.find_by_code("P-1").unwrap().is_none());
    }

    #[test]
    fn test_order_status_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let repo = OrderRepository::new(open_store(&tmp));

        let order = PurchaseOrder {
            code: "ORD-1".to_string(),
            date: Some("2024-03-01".parse().unwrap()),
            provider_code: Some("PV-1".to_string()),
            total: 120.50,
            status: OrderStatus::Approved,
        };
        repo.save(&order).unwrap();

        let loaded = repo.find_by_code("ORD-1").unwrap().unwrap();
        assert_eq!(loaded, order);
    }

    #[test]
    fn test_provider_upsert_idempotent() {
        let tmp = TempDir::new().unwrap();
        let repo = ProviderRepository::new(open_store(&tmp));

        let provider = Provider {
            code: "PV-1".to_string(),
            name: "Acme".to_string(),
            email: Some("sales@acme.example".to_string()),
            phone: None,
            address: None,
        };
        repo.save(&provider).unwrap();
        repo.save(&provider).unwrap();

        assert_eq!(repo.list().unwrap().len(), 1);
    }
}
