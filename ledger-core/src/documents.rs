//! Document upload queue and managed document storage.
//!
//! Same durable-queue pattern as the outbox, specialized for file artifacts:
//! the queue stores a path reference, never the bytes. Unlike the outbox
//! there is no retry bookkeeping and no batch cap; a failed upload goes to
//! ERROR and stays there until re-enqueued.

use crate::error::Result;
use crate::model::{DocumentStatus, DocumentTask};
use crate::store::Store;
use rusqlite::{Row, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// DAO over the `document_queue` table.
pub struct DocumentQueue {
    store: Arc<Store>,
}

impl DocumentQueue {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Queue a file for upload. Returns the id of the new PENDING task.
    pub fn enqueue(
        &self,
        file_name: &str,
        local_path: &Path,
        metadata: Option<&str>,
    ) -> Result<i64> {
        let path_text = local_path.to_string_lossy();
        let conn = self.store.conn();
        conn.execute(
            "INSERT INTO document_queue (file_name, local_path, metadata) \
             VALUES (?1, ?2, ?3)",
            params![file_name, path_text.as_ref(), metadata],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All PENDING tasks, oldest first. No cap: the upload cycle processes
    /// everything that is pending.
    pub fn pending(&self) -> Result<Vec<DocumentTask>> {
        let conn = self.store.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, file_name, local_path, status, uploaded_at, metadata \
             FROM document_queue \
             WHERE status = 'PENDING' \
             ORDER BY id ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(map_task(row)?);
        }
        Ok(tasks)
    }

    /// Transition a task; DONE additionally stamps `uploaded_at`.
    pub fn mark(&self, id: i64, status: DocumentStatus) -> Result<()> {
        self.store.conn().execute(
            "UPDATE document_queue \
             SET status = ?1, \
                 uploaded_at = CASE WHEN ?1 = 'DONE' THEN CURRENT_TIMESTAMP ELSE uploaded_at END \
             WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(())
    }
}

fn map_task(row: &Row<'_>) -> Result<DocumentTask> {
    let status: String = row.get(3)?;
    Ok(DocumentTask {
        id: row.get(0)?,
        file_name: row.get(1)?,
        local_path: row.get(2)?,
        // Unknown status text cannot round-trip through `mark`; treat it as
        // a pending row so it at least surfaces in queue inspection.
        status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Pending),
        uploaded_at: row.get(4)?,
        metadata: row.get(5)?,
    })
}

/// Managed document storage root. Files copied here are immediately queued
/// for upload.
pub struct DocumentStore {
    root: PathBuf,
    queue: DocumentQueue,
}

impl DocumentStore {
    pub fn new(root: PathBuf, store: Arc<Store>) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            queue: DocumentQueue::new(store),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into the managed root and queue the copy for upload.
    /// An existing file with the same name is never overwritten; the copy
    /// gets a `_1`, `_2`... suffix instead. Returns the managed path.
    pub fn store_local_copy(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name")
            })?
            .to_string_lossy()
            .into_owned();

        let (base, extension) = match file_name.rfind('.') {
            Some(dot) if dot > 0 => (&file_name[..dot], &file_name[dot..]),
            _ => (file_name.as_str(), ""),
        };

        let mut target = self.root.join(&file_name);
        let mut counter = 1;
        while target.exists() {
            target = self.root.join(format!("{base}_{counter}{extension}"));
            counter += 1;
        }

        fs::copy(source, &target)?;
        let stored_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        self.queue.enqueue(&stored_name, &target, None)?;
        tracing::debug!("stored document copy at {:?}", target);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(tmp: &TempDir) -> Arc<Store> {
        Arc::new(Store::open(&tmp.path().join("ledger.db")).unwrap())
    }

    #[test]
    fn test_enqueue_and_pending() {
        let tmp = TempDir::new().unwrap();
        let queue = DocumentQueue::new(open_store(&tmp));

        queue
            .enqueue("invoice.pdf", Path::new("/tmp/invoice.pdf"), Some("inv"))
            .unwrap();
        queue
            .enqueue("receipt.pdf", Path::new("/tmp/receipt.pdf"), None)
            .unwrap();

        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].file_name, "invoice.pdf");
        assert_eq!(pending[0].status, DocumentStatus::Pending);
        assert_eq!(pending[0].metadata.as_deref(), Some("inv"));
        assert!(pending[0].uploaded_at.is_none());
    }

    #[test]
    fn test_mark_done_stamps_uploaded_at() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let queue = DocumentQueue::new(store.clone());

        let id = queue
            .enqueue("invoice.pdf", Path::new("/tmp/invoice.pdf"), None)
            .unwrap();
        queue.mark(id, DocumentStatus::Done).unwrap();

        assert!(queue.pending().unwrap().is_empty());
        let uploaded_at: Option<String> = store
            .conn()
            .query_row(
                "SELECT uploaded_at FROM document_queue WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .unwrap();
        assert!(uploaded_at.is_some());
    }

    #[test]
    fn test_mark_error_leaves_uploaded_at_null() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let queue = DocumentQueue::new(store.clone());

        let id = queue
            .enqueue("invoice.pdf", Path::new("/tmp/invoice.pdf"), None)
            .unwrap();
        queue.mark(id, DocumentStatus::Error).unwrap();

        // ERROR tasks are out of the pending set and keep no upload stamp.
        assert!(queue.pending().unwrap().is_empty());
        let uploaded_at: Option<String> = store
            .conn()
            .query_row(
                "SELECT uploaded_at FROM document_queue WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .unwrap();
        assert!(uploaded_at.is_none());
    }

    #[test]
    fn test_store_local_copy_dedup_names() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let docs =
            DocumentStore::new(tmp.path().join("docs"), store.clone()).unwrap();

        let source = tmp.path().join("scan.pdf");
        fs::write(&source, b"first").unwrap();
        let first = docs.store_local_copy(&source).unwrap();

        fs::write(&source, b"second").unwrap();
        let second = docs.store_local_copy(&source).unwrap();

        assert_eq!(first.file_name().unwrap(), "scan.pdf");
        assert_eq!(second.file_name().unwrap(), "scan_1.pdf");
        assert_eq!(fs::read(&first).unwrap(), b"first");
        assert_eq!(fs::read(&second).unwrap(), b"second");

        let pending = DocumentQueue::new(store).pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1].file_name, "scan_1.pdf");
    }
}
