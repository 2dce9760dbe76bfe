//! Delivery worker: drains the outbox in bounded batches.

use crate::transport::SyncTransport;
use ledger_core::OutboxQueue;
use std::sync::Arc;

/// One push cycle over the outbox.
///
/// The returned boolean means "the worker ran", not "everything was
/// delivered": per-item failures stay PENDING (or go DEAD past the
/// threshold) and are only observable through queue inspection. `false` is
/// returned when the cycle did not run at all, either because the probe
/// reported offline or because the outbox could not be read.
pub struct DeliveryWorker {
    outbox: OutboxQueue,
    transport: Arc<dyn SyncTransport>,
    batch_size: u32,
    max_attempts: u32,
}

impl DeliveryWorker {
    pub fn new(
        outbox: OutboxQueue,
        transport: Arc<dyn SyncTransport>,
        batch_size: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            outbox,
            transport,
            batch_size,
            max_attempts,
        }
    }

    /// Deliver up to `batch_size` oldest pending changes, oldest first.
    pub async fn push_pending(&self) -> bool {
        if !self.transport.is_online().await {
            tracing::warn!("offline, skipping push cycle");
            return false;
        }

        let pending = match self.outbox.fetch_pending(self.batch_size) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!("failed to read sync queue: {e}");
                return false;
            }
        };

        for change in pending {
            match self
                .transport
                .push_change(&change.entity, &change.payload)
                .await
            {
                Ok(()) => {
                    if let Err(e) = self.outbox.mark_done(change.id) {
                        tracing::error!("failed to mark change {} done: {e}", change.id);
                    }
                }
                Err(e) => {
                    let attempt = change.attempts + 1;
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            "dead-lettering {} {} after {attempt} attempts: {e}",
                            change.entity,
                            change.reference
                        );
                        if let Err(e) = self.outbox.mark_dead(change.id) {
                            tracing::error!("failed to mark change {} dead: {e}", change.id);
                        }
                    } else {
                        tracing::warn!(
                            "delivery failed for {} {} (attempt {attempt}): {e}",
                            change.entity,
                            change.reference
                        );
                        if let Err(e) = self.outbox.mark_retry(change.id) {
                            tracing::error!("failed to record retry for change {}: {e}", change.id);
                        }
                    }
                }
            }
        }
        true
    }
}
