//! Demo data for local development.

use directory_core::{today_utc, EmployeeField, EmployeeForm, EmployeeId};
use entity::user;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::{
    auth::{register_local_user, AuthConfig, AuthError},
    error::ApiError,
    sync::StoreSync,
};

pub const DEMO_EMAIL: &str = "demo@directory.test";
pub const DEMO_PASSWORD: &str = "directory-demo";

const DEMO_EMPLOYEES: &[[&str; 5]] = &[
    ["Ann Lee", "ann.lee@directory.test", "Backend Engineer", "backend", "2023-01-01"],
    ["Bo Kim", "bo.kim@directory.test", "Frontend Engineer", "frontend", "2022-03-14"],
    ["Chidi Okafor", "chidi@directory.test", "ML Engineer", "aiml", "2021-09-01"],
    ["Dana Cruz", "dana.cruz@directory.test", "Engineering Manager", "backend", "2019-05-20"],
    ["Eli Novak", "eli@directory.test", "Designer", "frontend", "2024-02-05"],
];

#[derive(Debug, Default)]
pub struct SeededDirectory {
    /// `None` when the demo account already existed.
    pub user: Option<user::Model>,
    pub employees: Vec<EmployeeId>,
}

/// Creates the demo account and, when the directory is empty, the demo
/// employees. Safe to run more than once.
pub async fn seed_demo(
    db: &DatabaseConnection,
    auth: &AuthConfig,
    sync: &StoreSync,
) -> Result<SeededDirectory, ApiError> {
    let mut seeded = SeededDirectory::default();
    let open = AuthConfig {
        registration_enabled: true,
        ..auth.clone()
    };
    match register_local_user(db, &open, DEMO_EMAIL, DEMO_PASSWORD, Some("Demo User")).await {
        Ok(model) => seeded.user = Some(model),
        Err(AuthError::EmailTaken) => info!(email = DEMO_EMAIL, "demo account already present"),
        Err(err) => return Err(err.into()),
    }

    if !sync.snapshot().is_empty() {
        info!("directory not empty; skipping demo employees");
        return Ok(seeded);
    }
    let today = today_utc();
    for row in DEMO_EMPLOYEES {
        let mut form = EmployeeForm::new();
        for (field, value) in EmployeeField::ALL.into_iter().zip(row.iter()) {
            form.set_field(field, *value, today);
        }
        let submission = form
            .submit(today)
            .map_err(|errors| ApiError::Validation(errors.to_string()))?;
        seeded.employees.push(sync.apply(submission).await?);
    }
    info!(count = seeded.employees.len(), "seeded demo employees");
    Ok(seeded)
}
