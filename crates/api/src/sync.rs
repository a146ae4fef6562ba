//! Keeps the published employee snapshot in step with the record store.
//!
//! `StoreSync` owns the only `SnapshotWriter`. Every successful write is
//! followed by a full reload and publish; a failed write publishes nothing.

use std::sync::Arc;

use directory_core::{
    snapshot::{self, Snapshot, SnapshotReader, SnapshotWriter},
    EmployeeId, EmployeeRecord, Submission,
};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::store::{RecordStore, StoreError};

pub struct StoreSync {
    store: Arc<dyn RecordStore>,
    writer: Mutex<SnapshotWriter>,
    reader: SnapshotReader,
}

impl StoreSync {
    /// Loads the initial snapshot from `store`.
    pub async fn connect(store: Arc<dyn RecordStore>) -> Result<Self, StoreError> {
        let (writer, reader) = snapshot::channel();
        let sync = Self {
            store,
            writer: Mutex::new(writer),
            reader,
        };
        sync.refresh().await?;
        Ok(sync)
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.reader.current()
    }

    /// Reloads the full collection and publishes it.
    pub async fn refresh(&self) -> Result<u64, StoreError> {
        let writer = self.writer.lock().await;
        self.reload(&writer).await
    }

    pub async fn create(&self, record: &EmployeeRecord) -> Result<EmployeeId, StoreError> {
        let writer = self.writer.lock().await;
        let id = self.store.create(record.to_body()).await.map_err(|err| {
            error!(error = %err, "employee create failed");
            err
        })?;
        self.reload_after_write(&writer).await;
        Ok(id)
    }

    pub async fn replace(&self, id: &EmployeeId, record: &EmployeeRecord) -> Result<(), StoreError> {
        let writer = self.writer.lock().await;
        self.store
            .replace(id, record.to_body())
            .await
            .map_err(|err| {
                error!(error = %err, employee_id = %id, "employee replace failed");
                err
            })?;
        self.reload_after_write(&writer).await;
        Ok(())
    }

    pub async fn delete(&self, id: &EmployeeId) -> Result<(), StoreError> {
        let writer = self.writer.lock().await;
        self.store.delete(id).await.map_err(|err| {
            error!(error = %err, employee_id = %id, "employee delete failed");
            err
        })?;
        self.reload_after_write(&writer).await;
        Ok(())
    }

    /// Writes a validated form submission and returns the affected id.
    pub async fn apply(&self, submission: Submission) -> Result<EmployeeId, StoreError> {
        match submission {
            Submission::Create(record) => self.create(&record).await,
            Submission::Replace { id, record } => {
                self.replace(&id, &record).await?;
                Ok(id)
            }
        }
    }

    async fn reload(&self, writer: &SnapshotWriter) -> Result<u64, StoreError> {
        let records = self.store.load_all().await.map_err(|err| {
            error!(error = %err, "employee snapshot reload failed");
            err
        })?;
        let count = records.len();
        let version = writer.publish(records);
        debug!(version, count, "published employee snapshot");
        Ok(version)
    }

    // The write itself already happened, so a failed reload only leaves the
    // snapshot stale until the next successful publish.
    async fn reload_after_write(&self, writer: &SnapshotWriter) {
        if self.reload(writer).await.is_err() {
            warn!("snapshot left at previous version after successful write");
        }
    }
}
