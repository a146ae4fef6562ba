use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned identifier of a persisted employee.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EmployeeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Frontend,
    Backend,
    Aiml,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::Frontend, Department::Backend, Department::Aiml];

    pub fn as_str(self) -> &'static str {
        match self {
            Department::Frontend => "frontend",
            Department::Backend => "backend",
            Department::Aiml => "aiml",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown department {0:?}")]
pub struct UnknownDepartment(pub String);

impl FromStr for Department {
    type Err = UnknownDepartment;

    /// Exact match only; `"Backend"` or `" backend"` are rejected.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "frontend" => Ok(Department::Frontend),
            "backend" => Ok(Department::Backend),
            "aiml" => Ok(Department::Aiml),
            other => Err(UnknownDepartment(other.to_string())),
        }
    }
}

/// Raw form input. Every field is free text until validated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub start_date: String,
}

/// A record that passed whole-record validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: Department,
    pub start_date: NaiveDate,
}

impl EmployeeRecord {
    /// Body to hand to the store. `submitted_at` is left for the store to set.
    pub fn to_body(&self) -> EmployeeBody {
        EmployeeBody {
            name: self.name.clone(),
            email: self.email.clone(),
            position: self.position.clone(),
            department: self.department.as_str().to_string(),
            start_date: self.start_date.format("%Y-%m-%d").to_string(),
            submitted_at: None,
        }
    }
}

/// What the record store holds under an identifier.
///
/// Department and start date stay as strings: the store never enforces the
/// enumeration or the date format, so snapshots may carry values the
/// validator would reject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBody {
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub start_date: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl EmployeeBody {
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").ok()
    }

    pub fn to_draft(&self) -> EmployeeDraft {
        EmployeeDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            position: self.position.clone(),
            department: self.department.clone(),
            start_date: self.start_date.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(flatten)]
    pub body: EmployeeBody,
}

impl Employee {
    pub fn new(id: impl Into<EmployeeId>, body: EmployeeBody) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}
