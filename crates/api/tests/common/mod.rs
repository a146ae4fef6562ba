#![allow(dead_code)]

use std::sync::Arc;

use api::{
    auth::{AuthConfig, CurrentUser},
    schema::{build_schema, AppSchema, DirectorySchema},
    store::{MemoryStore, RecordStore, SeaOrmStore},
    sync::StoreSync,
};
use async_graphql::{Request, Variables};
use directory_core::{Employee, EmployeeBody};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use serde_json::Value;
use uuid::Uuid;

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthConfig>,
    pub sync: Arc<StoreSync>,
    pub schema: DirectorySchema,
}

impl TestContext {
    /// Accounts in SQLite, employees in memory.
    pub async fn with_employees(records: Vec<Employee>) -> Self {
        let db = sqlite().await;
        Self::build(db, Arc::new(MemoryStore::with_records(records))).await
    }

    /// Accounts and employees both in SQLite.
    pub async fn on_sqlite() -> Self {
        let db = sqlite().await;
        let store = Arc::new(SeaOrmStore::new(db.as_ref().clone()));
        Self::build(db, store).await
    }

    async fn build(db: Arc<DatabaseConnection>, store: Arc<dyn RecordStore>) -> Self {
        let auth = Arc::new(test_auth_config());
        let sync = Arc::new(StoreSync::connect(store).await.unwrap());
        let AppSchema(schema) = build_schema(db.clone(), auth.clone(), sync.clone());
        Self {
            db,
            auth,
            sync,
            schema,
        }
    }

    pub async fn exec(&self, query: &str, vars: Value) -> async_graphql::Response {
        self.schema
            .execute(Request::new(query).variables(Variables::from_json(vars)))
            .await
    }

    pub async fn exec_as(
        &self,
        user: &CurrentUser,
        query: &str,
        vars: Value,
    ) -> async_graphql::Response {
        self.schema
            .execute(
                Request::new(query)
                    .variables(Variables::from_json(vars))
                    .data(user.clone()),
            )
            .await
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "directory-test-secret".into(),
        session_ttl_minutes: 30,
        registration_enabled: true,
    }
}

/// A signed-in user that is never looked up in the database.
pub fn viewer() -> CurrentUser {
    CurrentUser {
        user_id: Uuid::new_v4(),
        email: "viewer@directory.test".into(),
        display_name: "Viewer".into(),
    }
}

pub fn employee(id: &str, name: &str, department: &str, start_date: &str) -> Employee {
    let email = format!(
        "{}@x.com",
        name.split_whitespace().next().unwrap_or(id).to_lowercase()
    );
    Employee::new(
        id,
        EmployeeBody {
            name: name.into(),
            email,
            position: "Engineer".into(),
            department: department.into(),
            start_date: start_date.into(),
            submitted_at: None,
        },
    )
}

pub fn error_code(response: &async_graphql::Response) -> Option<String> {
    let error = response.errors.first()?;
    match error.extensions.as_ref()?.get("code")? {
        async_graphql::Value::String(code) => Some(code.clone()),
        _ => None,
    }
}

pub async fn sqlite() -> Arc<DatabaseConnection> {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    bootstrap_sqlite(&conn).await;
    Arc::new(conn)
}

async fn bootstrap_sqlite(db: &DatabaseConnection) {
    for sql in [
        r#"
        CREATE TABLE user (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
        r#"
        CREATE TABLE user_identity (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            provider TEXT NOT NULL,
            subject TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (provider, subject)
        );
        "#,
        r#"
        CREATE TABLE user_secret (
            user_id TEXT PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
            password_hash TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
        r#"
        CREATE TABLE employee (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            position TEXT NOT NULL,
            department TEXT NOT NULL,
            start_date TEXT NOT NULL,
            submitted_at TEXT
        );
        "#,
    ] {
        db.execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await
            .unwrap();
    }
}
