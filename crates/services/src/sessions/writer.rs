use std::sync::Arc;

use exam_core::model::{LedgerSnapshot, TestId};
use storage::repository::LocalSessionStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Write-through cache for in-progress answers.
///
/// Publishing only replaces the latest value in a watch channel; a background
/// task persists whatever is newest, so bursts of edits coalesce into a few
/// writes. Write failures are logged and never reach the caller.
pub(crate) struct SnapshotWriter {
    tx: watch::Sender<LedgerSnapshot>,
    handle: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Start the writer. `initial` is treated as already persisted.
    pub(crate) fn spawn(
        store: Arc<dyn LocalSessionStore>,
        test_id: TestId,
        initial: LedgerSnapshot,
    ) -> Self {
        let (tx, mut rx) = watch::channel(initial);
        let handle = tokio::spawn(async move {
            // Still yields an unseen value after the sender is dropped.
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                match store.save(&test_id, &snapshot).await {
                    Ok(()) => debug!(test_id = %test_id, entries = snapshot.len(), "saved answers"),
                    Err(err) => warn!(test_id = %test_id, error = %err, "saving answers failed"),
                }
            }
        });
        Self { tx, handle }
    }

    pub(crate) fn publish(&self, snapshot: LedgerSnapshot) {
        if self.tx.send(snapshot).is_err() {
            debug!("snapshot writer already stopped");
        }
    }

    /// Stop accepting snapshots and wait until the newest one is written.
    pub(crate) async fn close(self) {
        let Self { tx, handle } = self;
        drop(tx);
        if let Err(err) = handle.await {
            warn!(error = %err, "snapshot writer task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use exam_core::model::AnswerLedger;
    use std::sync::Mutex;
    use storage::repository::{InMemoryRepository, StorageError};

    #[tokio::test]
    async fn close_flushes_latest_snapshot() {
        let repo = InMemoryRepository::new();
        let id = TestId::new("t");
        let writer = SnapshotWriter::spawn(Arc::new(repo.clone()), id.clone(), LedgerSnapshot::new());

        let mut ledger = AnswerLedger::new(3);
        for i in 0..3 {
            ledger.record_answer(i, i).unwrap();
            writer.publish(ledger.snapshot());
        }
        writer.close().await;

        assert_eq!(repo.load(&id).await.unwrap(), Some(ledger.snapshot()));
    }

    #[tokio::test]
    async fn nothing_is_written_without_changes() {
        let repo = InMemoryRepository::new();
        let id = TestId::new("t");
        let writer = SnapshotWriter::spawn(Arc::new(repo.clone()), id.clone(), LedgerSnapshot::new());
        writer.close().await;
        assert_eq!(repo.load(&id).await.unwrap(), None);
    }

    #[derive(Default)]
    struct FlakyStore {
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl LocalSessionStore for FlakyStore {
        async fn save(&self, _id: &TestId, _s: &LedgerSnapshot) -> Result<(), StorageError> {
            *self.attempts.lock().unwrap() += 1;
            Err(StorageError::Connection("disk full".into()))
        }
        async fn load(&self, _id: &TestId) -> Result<Option<LedgerSnapshot>, StorageError> {
            Ok(None)
        }
        async fn clear(&self, _id: &TestId) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_failures_are_swallowed() {
        let store = Arc::new(FlakyStore::default());
        let writer = SnapshotWriter::spawn(store.clone(), TestId::new("t"), LedgerSnapshot::new());
        let mut ledger = AnswerLedger::new(1);
        ledger.toggle_bookmark(0).unwrap();
        writer.publish(ledger.snapshot());
        writer.close().await;
        assert!(*store.attempts.lock().unwrap() >= 1);
    }
}
