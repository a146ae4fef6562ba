//! Pure employee-directory logic shared by the API and server crates.
//!
//! Nothing in here performs I/O. Validation and filtering take the current
//! date as an argument so callers decide which clock applies.

pub mod employee;
pub mod filter;
pub mod form;
pub mod snapshot;
pub mod validation;

pub use employee::{Department, Employee, EmployeeBody, EmployeeDraft, EmployeeId, EmployeeRecord};
pub use filter::{DirectoryStats, DirectoryView, EmployeeFilter};
pub use form::{EmployeeForm, Submission};
pub use snapshot::{Snapshot, SnapshotReader, SnapshotWriter};
pub use validation::{EmployeeField, FieldError, FieldErrorKind, ValidationErrors};

use chrono::{NaiveDate, Utc};

/// Calendar date used for "today" comparisons. Always UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
