//! Document upload cycle over the document queue.
//!
//! The actual transport is abstracted behind a caller-supplied uploader:
//! the cycle only decides per-task state. Unlike the outbox there is no
//! batch cap and no retry counter; every pending task is visited once per
//! cycle.

use ledger_core::{DocumentQueue, DocumentStatus, DocumentTask};
use std::path::Path;

/// Performs the transfer of one document. Closures `Fn(&Path) -> bool`
/// are accepted directly.
pub trait DocumentUploader: Send + Sync {
    /// True when the document was delivered.
    fn upload(&self, task: &DocumentTask, path: &Path) -> bool;
}

impl<F> DocumentUploader for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn upload(&self, _task: &DocumentTask, path: &Path) -> bool {
        self(path)
    }
}

/// Outcome of one upload cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: u64,
    pub failed: u64,
    pub missing: u64,
}

/// Drains the pending document tasks through an uploader.
pub struct DocumentUploadService {
    queue: DocumentQueue,
}

impl DocumentUploadService {
    pub fn new(queue: DocumentQueue) -> Self {
        Self { queue }
    }

    /// Visit every pending task: a vanished local file goes to MISSING
    /// without invoking the uploader, otherwise the uploader's boolean
    /// decides DONE or ERROR.
    pub fn upload_pending(&self, uploader: &dyn DocumentUploader) -> UploadReport {
        let mut report = UploadReport::default();
        let pending = match self.queue.pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!("failed to read document queue: {e}");
                return report;
            }
        };

        for task in pending {
            let path = Path::new(&task.local_path);
            if !path.exists() {
                tracing::warn!("document {} vanished from {}", task.file_name, task.local_path);
                self.mark(task.id, DocumentStatus::Missing);
                report.missing += 1;
                continue;
            }
            if uploader.upload(&task, path) {
                self.mark(task.id, DocumentStatus::Done);
                report.uploaded += 1;
            } else {
                tracing::warn!("upload failed for document {}", task.file_name);
                self.mark(task.id, DocumentStatus::Error);
                report.failed += 1;
            }
        }
        report
    }

    fn mark(&self, id: i64, status: DocumentStatus) {
        if let Err(e) = self.queue.mark(id, status) {
            tracing::error!("failed to mark document {id} {}: {e}", status.as_str());
        }
    }
}
