//! Latest full copy of the employee collection, shared between one writer
//! and any number of readers.
//!
//! The writer replaces the whole snapshot on every publish; readers never
//! see partial updates. `SnapshotWriter` is deliberately not `Clone`.

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream};

use crate::employee::{Employee, EmployeeBody, EmployeeId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    version: u64,
    records: BTreeMap<EmployeeId, EmployeeBody>,
}

impl Snapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &EmployeeId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &EmployeeId) -> Option<Employee> {
        self.records
            .get(id)
            .map(|body| Employee::new(id.clone(), body.clone()))
    }

    /// Records in identifier order.
    pub fn employees(&self) -> Vec<Employee> {
        self.records
            .iter()
            .map(|(id, body)| Employee::new(id.clone(), body.clone()))
            .collect()
    }
}

pub fn channel() -> (SnapshotWriter, SnapshotReader) {
    let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
    (SnapshotWriter { tx }, SnapshotReader { rx })
}

#[derive(Debug)]
pub struct SnapshotWriter {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotWriter {
    /// Replaces the current snapshot and returns the new version.
    pub fn publish(&self, records: impl IntoIterator<Item = Employee>) -> u64 {
        let records: BTreeMap<_, _> = records
            .into_iter()
            .map(|employee| (employee.id, employee.body))
            .collect();
        let mut version = 0;
        self.tx.send_modify(|current| {
            version = current.version + 1;
            *current = Arc::new(Snapshot { version, records });
        });
        version
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<Snapshot>>,
}

impl SnapshotReader {
    pub fn current(&self) -> Arc<Snapshot> {
        self.rx.borrow().clone()
    }

    /// Waits for the next publish. Returns `None` once the writer is gone.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Current snapshot first, then every later one. Intermediate snapshots
    /// may be skipped when publishes outpace the consumer.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Snapshot>> + Send + 'static {
        WatchStream::new(self.rx)
    }
}
