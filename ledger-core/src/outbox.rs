//! Durable outbox queue for outgoing mutations.
//!
//! Every local mutation is recorded here before any network activity; the
//! delivery worker drains the queue oldest-first in bounded batches. This is
//! the at-least-once half of the engine: a row leaves PENDING only on a
//! confirmed delivery (DONE) or after exhausting the dead-letter threshold
//! (DEAD). Rows are never deleted.

use crate::error::{Result, StoreError};
use crate::model::{ChangeOp, ChangeStatus, QueuedChange};
use crate::store::Store;
use rusqlite::{Row, params};
use std::sync::Arc;

/// Per-status row totals, used for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u64,
    pub done: u64,
    pub dead: u64,
}

/// DAO over the `sync_queue` table.
pub struct OutboxQueue {
    store: Arc<Store>,
}

impl OutboxQueue {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Record a local mutation. Durable and synchronous; never touches the
    /// network. Returns the id of the new PENDING row.
    pub fn enqueue(
        &self,
        entity: &str,
        reference: &str,
        payload: &str,
        operation: ChangeOp,
    ) -> Result<i64> {
        let conn = self.store.conn();
        conn.execute(
            "INSERT INTO sync_queue (entity, reference, payload, operation) \
             VALUES (?1, ?2, ?3, ?4)",
            params![entity, reference, payload, operation.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Up to `limit` oldest PENDING rows. The `created_at, id` ordering is
    /// the delivery-order guarantee: a retried row keeps its original
    /// position and goes out before anything enqueued after it.
    pub fn fetch_pending(&self, limit: u32) -> Result<Vec<QueuedChange>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, entity, reference, payload, operation, status, attempts, \
                    last_attempt, created_at \
             FROM sync_queue \
             WHERE status = 'PENDING' \
             ORDER BY created_at ASC, id ASC \
             LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![limit])?;
        let mut changes = Vec::new();
        while let Some(row) = rows.next()? {
            changes.push(map_change(row)?);
        }
        Ok(changes)
    }

    /// Confirmed delivery: PENDING -> DONE, attempts + 1.
    pub fn mark_done(&self, id: i64) -> Result<()> {
        self.store.conn().execute(
            "UPDATE sync_queue \
             SET status = 'DONE', attempts = attempts + 1, last_attempt = ?1 \
             WHERE id = ?2",
            params![now(), id],
        )?;
        Ok(())
    }

    /// Failed delivery: attempts + 1, row stays PENDING for the next cycle.
    pub fn mark_retry(&self, id: i64) -> Result<()> {
        self.store.conn().execute(
            "UPDATE sync_queue \
             SET attempts = attempts + 1, last_attempt = ?1 \
             WHERE id = ?2",
            params![now(), id],
        )?;
        Ok(())
    }

    /// Dead-letter: PENDING -> DEAD, attempts + 1. The row keeps its audit
    /// trail but is no longer retried.
    pub fn mark_dead(&self, id: i64) -> Result<()> {
        self.store.conn().execute(
            "UPDATE sync_queue \
             SET status = 'DEAD', attempts = attempts + 1, last_attempt = ?1 \
             WHERE id = ?2",
            params![now(), id],
        )?;
        Ok(())
    }

    pub fn counts(&self) -> Result<QueueCounts> {
        let conn = self.store.conn();
        let mut stmt =
            conn.prepare_cached("SELECT status, COUNT(*) FROM sync_queue GROUP BY status")?;
        let mut rows = stmt.query([])?;
        let mut counts = QueueCounts::default();
        while let Some(row) = rows.next()? {
            let status: String = row.get(0)?;
            let n: u64 = row.get(1)?;
            match ChangeStatus::parse(&status) {
                Some(ChangeStatus::Pending) => counts.pending = n,
                Some(ChangeStatus::Done) => counts.done = n,
                Some(ChangeStatus::Dead) => counts.dead = n,
                None => {}
            }
        }
        Ok(counts)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn map_change(row: &Row<'_>) -> Result<QueuedChange> {
    let id: i64 = row.get(0)?;
    let operation: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(QueuedChange {
        id,
        entity: row.get(1)?,
        reference: row.get(2)?,
        payload: row.get(3)?,
        operation: ChangeOp::parse(&operation).ok_or_else(|| StoreError::InvalidColumn {
            column: "operation",
            id,
            value: operation.clone(),
        })?,
        status: ChangeStatus::parse(&status).ok_or_else(|| StoreError::InvalidColumn {
            column: "status",
            id,
            value: status.clone(),
        })?,
        attempts: row.get(6)?,
        last_attempt: row.get(7)?,
        created_at: row.get(8)?,
    })
}
