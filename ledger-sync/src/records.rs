//! Typed decoders for pulled entity snapshots.
//!
//! The remote collaborator serves flat JSON objects with its own field
//! names (`codigo`, `nombre`, `proveedorCodigo`, ...); these records map
//! them onto the domain structs. Decoding is per-record: one malformed
//! element is reported and skipped without discarding the rest of the
//! array, and malformed values are errors rather than silent zero/empty
//! defaults.

use crate::error::SyncResult;
use ledger_core::{OrderStatus, Product, Provider, PurchaseOrder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Wire record for a product snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub codigo: String,
    pub nombre: String,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default, rename = "proveedorCodigo")]
    pub proveedor_codigo: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub coste: f64,
    #[serde(default)]
    pub precio: f64,
}

impl ProductRecord {
    pub fn into_product(self) -> Product {
        Product {
            code: self.codigo,
            name: self.nombre,
            category: self.categoria,
            provider_code: self.proveedor_codigo,
            stock: self.stock,
            cost: self.coste,
            price: self.precio,
        }
    }
}

/// Wire record for a provider snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRecord {
    pub codigo: String,
    pub nombre: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
}

impl ProviderRecord {
    pub fn into_provider(self) -> Provider {
        Provider {
            code: self.codigo,
            name: self.nombre,
            email: self.email,
            phone: self.telefono,
            address: self.direccion,
        }
    }
}

/// Wire record for a purchase order snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub codigo: String,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default, rename = "proveedorCodigo")]
    pub proveedor_codigo: Option<String>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub estado: Option<String>,
}

impl OrderRecord {
    /// Fallible: a malformed date or an unknown status is a decode error
    /// for this record, not a defaulted value.
    pub fn try_into_order(self) -> Result<PurchaseOrder, String> {
        let date = match &self.fecha {
            Some(f) if !f.is_empty() => Some(
                f.parse::<chrono::NaiveDate>()
                    .map_err(|e| format!("order {}: invalid fecha {f:?}: {e}", self.codigo))?,
            ),
            _ => None,
        };
        let status = match self.estado.as_deref() {
            Some(s) if !s.is_empty() => order_status_from_wire(s)
                .ok_or_else(|| format!("order {}: unknown estado {s:?}", self.codigo))?,
            _ => OrderStatus::Draft,
        };
        Ok(PurchaseOrder {
            code: self.codigo,
            date,
            provider_code: self.proveedor_codigo,
            total: self.total,
            status,
        })
    }
}

/// The remote side uses Spanish status values; canonical names are
/// accepted too.
fn order_status_from_wire(s: &str) -> Option<OrderStatus> {
    match s {
        "BORRADOR" => Some(OrderStatus::Draft),
        "APROBADA" => Some(OrderStatus::Approved),
        "ENVIADA" => Some(OrderStatus::Sent),
        "RECIBIDA" => Some(OrderStatus::Received),
        "CANCELADA" => Some(OrderStatus::Cancelled),
        _ => OrderStatus::parse(s),
    }
}

/// Decode a JSON array body element by element. A body that is not a JSON
/// array fails outright; a bad element is reported in the second slot and
/// the rest of the array survives.
pub fn decode_array<T: DeserializeOwned>(body: &str) -> SyncResult<(Vec<T>, Vec<String>)> {
    let values: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut records = Vec::with_capacity(values.len());
    let mut errors = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(format!("record {index}: {e}")),
        }
    }
    Ok((records, errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_product_record() {
        let body = r#"[
            {"codigo":"P-1","nombre":"Widget","categoria":"general",
             "proveedorCodigo":"PV-1","stock":5,"coste":2.5,"precio":4.0},
            {"codigo":"P-2","nombre":"Gadget"}
        ]"#;
        let (records, errors) = decode_array::<ProductRecord>(body).unwrap();
        assert!(errors.is_empty());
        assert_eq!(records.len(), 2);

        let product = records[0].clone().into_product();
        assert_eq!(product.code, "P-1");
        assert_eq!(product.provider_code.as_deref(), Some("PV-1"));
        assert_eq!(product.stock, 5);

        // Absent optional fields default, required ones do not.
        let sparse = records[1].clone().into_product();
        assert_eq!(sparse.stock, 0);
        assert!(sparse.provider_code.is_none());
    }

    #[test]
    fn test_malformed_record_is_isolated() {
        let body = r#"[
            {"codigo":"P-1","nombre":"Widget"},
            {"nombre":"missing code"},
            {"codigo":"P-3","nombre":"Gizmo","stock":"not a number"}
        ]"#;
        let (records, errors) = decode_array::<ProductRecord>(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].codigo, "P-1");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("record 1:"));
        assert!(errors[1].starts_with("record 2:"));
    }

    #[test]
    fn test_non_array_body_fails() {
        assert!(decode_array::<ProductRecord>(r#"{"error":"nope"}"#).is_err());
    }

    #[test]
    fn test_order_record_wire_statuses() {
        let record = OrderRecord {
            codigo: "ORD-1".to_string(),
            fecha: Some("2024-03-01".to_string()),
            proveedor_codigo: Some("PV-1".to_string()),
            total: 99.5,
            estado: Some("APROBADA".to_string()),
        };
        let order = record.try_into_order().unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.date, Some("2024-03-01".parse().unwrap()));

        let record = OrderRecord {
            codigo: "ORD-2".to_string(),
            fecha: None,
            proveedor_codigo: None,
            total: 0.0,
            estado: None,
        };
        assert_eq!(record.try_into_order().unwrap().status, OrderStatus::Draft);
    }

    #[test]
    fn test_order_record_bad_values_are_errors() {
        let record = OrderRecord {
            codigo: "ORD-1".to_string(),
            fecha: Some("03/01/2024".to_string()),
            proveedor_codigo: None,
            total: 0.0,
            estado: None,
        };
        assert!(record.try_into_order().is_err());

        let record = OrderRecord {
            codigo: "ORD-2".to_string(),
            fecha: None,
            proveedor_codigo: None,
            total: 0.0,
            estado: Some("LOST".to_string()),
        };
        assert!(record.try_into_order().is_err());
    }
}
