//! Sync façade: the single entry point the surrounding CRUD code uses.
//!
//! `enqueue*` calls are synchronous and touch only the local store. All
//! network work (push, pull, document upload) is submitted to one dedicated
//! background task and handed back as a [`SyncHandle`], a channel-delivered
//! completion result. The worker is strictly serial: jobs drain one at a
//! time in submission order, so no two sync operations overlap and the
//! queue tables need no locking beyond the store's own connection guard.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::pull::{PullReconciler, PullReport};
use crate::push::DeliveryWorker;
use crate::transport::{HttpTransport, SyncTransport};
use crate::upload::{DocumentUploadService, DocumentUploader, UploadReport};
use ledger_core::{
    ChangeOp, DocumentQueue, DocumentStore, DocumentTask, IntegrityChecker, OutboxQueue,
    QueueCounts, QueuedChange, Store,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Completion result of a scheduled sync operation.
///
/// Resolves once the background worker has finished the job; resolves to
/// [`SyncError::WorkerGone`] if the service was closed first.
pub struct SyncHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> SyncHandle<T> {
    pub async fn wait(self) -> SyncResult<T> {
        self.rx.await.map_err(|_| SyncError::WorkerGone)
    }
}

enum Job {
    Push(oneshot::Sender<bool>),
    Pull(oneshot::Sender<PullReport>),
    Upload(Box<dyn DocumentUploader>, oneshot::Sender<UploadReport>),
}

/// The sync engine façade. Owns the background worker; dropping or closing
/// it cancels current and queued work. This is a hard shutdown: interrupted
/// items simply stay PENDING for a future run.
pub struct SyncService {
    outbox: OutboxQueue,
    documents: DocumentQueue,
    document_store: DocumentStore,
    integrity: IntegrityChecker,
    jobs: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
}

impl SyncService {
    /// Build the engine over an explicit store handle with the HTTP
    /// transport. Must be called within a tokio runtime.
    pub fn new(config: SyncConfig, store: Arc<Store>) -> SyncResult<Self> {
        let transport: Arc<dyn SyncTransport> = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, store, transport)
    }

    /// Same as [`SyncService::new`] with a caller-supplied transport
    /// (used by tests to run against a mock).
    pub fn with_transport(
        config: SyncConfig,
        store: Arc<Store>,
        transport: Arc<dyn SyncTransport>,
    ) -> SyncResult<Self> {
        let delivery = DeliveryWorker::new(
            OutboxQueue::new(store.clone()),
            transport.clone(),
            config.push_batch_size,
            config.max_attempts,
        );
        let reconciler = PullReconciler::new(store.clone(), transport);
        let uploads = DocumentUploadService::new(DocumentQueue::new(store.clone()));

        let (jobs, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(delivery, reconciler, uploads, rx));

        Ok(Self {
            outbox: OutboxQueue::new(store.clone()),
            documents: DocumentQueue::new(store.clone()),
            document_store: DocumentStore::new(config.document_root, store.clone())?,
            integrity: IntegrityChecker::new(store),
            jobs,
            worker,
        })
    }

    /// Record a local mutation in the durable outbox. Synchronous, local
    /// store only, never blocks on the network.
    pub fn enqueue_change(
        &self,
        entity: &str,
        reference: &str,
        payload: &str,
        operation: ChangeOp,
    ) -> SyncResult<i64> {
        Ok(self.outbox.enqueue(entity, reference, payload, operation)?)
    }

    /// Schedule a push cycle. The result is the worker-ran boolean: `true`
    /// once the batch was processed (regardless of per-item outcomes),
    /// `false` when offline or the queue could not be read.
    pub fn push_pending(&self) -> SyncHandle<bool> {
        let (tx, rx) = oneshot::channel();
        self.submit(Job::Push(tx));
        SyncHandle { rx }
    }

    /// Schedule a pull-and-merge cycle over the fixed entity kinds.
    pub fn pull_updates(&self) -> SyncHandle<PullReport> {
        let (tx, rx) = oneshot::channel();
        self.submit(Job::Pull(tx));
        SyncHandle { rx }
    }

    /// Schedule an upload cycle over every pending document task.
    pub fn upload_pending<U>(&self, uploader: U) -> SyncHandle<UploadReport>
    where
        U: DocumentUploader + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Job::Upload(Box::new(uploader), tx));
        SyncHandle { rx }
    }

    /// Queue an existing file for upload without copying it.
    pub fn enqueue_upload(
        &self,
        file_name: &str,
        local_path: &Path,
        metadata: Option<&str>,
    ) -> SyncResult<i64> {
        Ok(self.documents.enqueue(file_name, local_path, metadata)?)
    }

    /// Copy a file into managed document storage and queue the copy.
    pub fn store_local_copy(&self, source: &Path) -> SyncResult<PathBuf> {
        Ok(self.document_store.store_local_copy(source)?)
    }

    pub fn pending_changes(&self) -> SyncResult<Vec<QueuedChange>> {
        Ok(self.outbox.fetch_pending(u32::MAX)?)
    }

    pub fn pending_documents(&self) -> SyncResult<Vec<DocumentTask>> {
        Ok(self.documents.pending()?)
    }

    pub fn queue_counts(&self) -> SyncResult<QueueCounts> {
        Ok(self.outbox.counts()?)
    }

    pub fn check_references(&self) -> SyncResult<Vec<String>> {
        Ok(self.integrity.check_references()?)
    }

    pub fn compact(&self) -> SyncResult<()> {
        Ok(self.integrity.compact()?)
    }

    /// Hard shutdown: abort the worker, cancelling the current job and
    /// discarding queued ones. In-flight HTTP calls are abandoned; their
    /// outbox rows stay PENDING. Outstanding handles resolve to
    /// [`SyncError::WorkerGone`].
    pub fn close(&self) {
        self.worker.abort();
    }

    fn submit(&self, job: Job) {
        // A failed send means the worker is gone; the job's oneshot sender
        // is dropped with it and the handle resolves to WorkerGone.
        let _ = self.jobs.send(job);
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    delivery: DeliveryWorker,
    reconciler: PullReconciler,
    uploads: DocumentUploadService,
    mut rx: mpsc::UnboundedReceiver<Job>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::Push(tx) => {
                let ran = delivery.push_pending().await;
                let _ = tx.send(ran);
            }
            Job::Pull(tx) => {
                let report = reconciler.pull_updates().await;
                let _ = tx.send(report);
            }
            Job::Upload(uploader, tx) => {
                let report = uploads.upload_pending(uploader.as_ref());
                let _ = tx.send(report);
            }
        }
    }
}
