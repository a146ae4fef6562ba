//! The record store: where employee bodies live under store-generated ids.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use directory_core::{Employee, EmployeeBody, EmployeeId};
use entity::employee;
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr,
    EntityTrait, QueryOrder,
};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("employee {0} does not exist")]
    NotFound(EmployeeId),
    #[error("record store unavailable: {0}")]
    Backend(String),
}

impl From<DbErr> for StoreError {
    fn from(value: DbErr) -> Self {
        StoreError::Backend(value.to_string())
    }
}

/// Narrow async interface to wherever employee records are persisted.
///
/// Writes either complete or fail once; there is no retry at this layer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full collection, used to build a snapshot.
    async fn load_all(&self) -> Result<Vec<Employee>, StoreError>;

    /// Stores a new record under a fresh id. The store stamps `submitted_at`.
    async fn create(&self, body: EmployeeBody) -> Result<EmployeeId, StoreError>;

    /// Replaces the business fields at `id`. The original `submitted_at` is kept.
    async fn replace(&self, id: &EmployeeId, body: EmployeeBody) -> Result<(), StoreError>;

    async fn delete(&self, id: &EmployeeId) -> Result<(), StoreError>;
}

fn new_id() -> EmployeeId {
    EmployeeId::new(Uuid::new_v4().simple().to_string())
}

pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn employee_from_model(model: employee::Model) -> Employee {
    Employee::new(
        model.id,
        EmployeeBody {
            name: model.name,
            email: model.email,
            position: model.position,
            department: model.department,
            start_date: model.start_date,
            submitted_at: model.submitted_at.map(|ts| ts.with_timezone(&Utc)),
        },
    )
}

#[async_trait]
impl RecordStore for SeaOrmStore {
    async fn load_all(&self) -> Result<Vec<Employee>, StoreError> {
        let rows = employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(employee_from_model).collect())
    }

    async fn create(&self, body: EmployeeBody) -> Result<EmployeeId, StoreError> {
        let id = new_id();
        let now: DateTimeWithTimeZone = Utc::now().into();
        employee::ActiveModel {
            id: Set(id.to_string()),
            name: Set(body.name),
            email: Set(body.email),
            position: Set(body.position),
            department: Set(body.department),
            start_date: Set(body.start_date),
            submitted_at: Set(Some(now)),
        }
        .insert(&self.db)
        .await?;
        Ok(id)
    }

    async fn replace(&self, id: &EmployeeId, body: EmployeeBody) -> Result<(), StoreError> {
        let existing = employee::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut active: employee::ActiveModel = existing.into();
        active.name = Set(body.name);
        active.email = Set(body.email);
        active.position = Set(body.position);
        active.department = Set(body.department);
        active.start_date = Set(body.start_date);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn delete(&self, id: &EmployeeId) -> Result<(), StoreError> {
        let res = employee::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

/// In-process store for tests and database-less serving.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<EmployeeId, EmployeeBody>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Employee>) -> Self {
        Self {
            records: Mutex::new(
                records
                    .into_iter()
                    .map(|employee| (employee.id, employee.body))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<Employee>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .map(|(id, body)| Employee::new(id.clone(), body.clone()))
            .collect())
    }

    async fn create(&self, mut body: EmployeeBody) -> Result<EmployeeId, StoreError> {
        let id = new_id();
        body.submitted_at = Some(Utc::now());
        self.records.lock().await.insert(id.clone(), body);
        Ok(id)
    }

    async fn replace(&self, id: &EmployeeId, mut body: EmployeeBody) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let slot = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        body.submitted_at = slot.submitted_at;
        *slot = body;
        Ok(())
    }

    async fn delete(&self, id: &EmployeeId) -> Result<(), StoreError> {
        self.records
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
