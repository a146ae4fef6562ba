//! Employee record validation.
//!
//! Every field owns exactly one rule chain. Rules run in a fixed order and
//! the first failure is the one reported, so live-typing feedback and
//! whole-record submission always agree on the message for a field.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::employee::{Department, EmployeeDraft, EmployeeRecord};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const EMAIL_MIN: usize = 5;
const EMAIL_MAX: usize = 50;
const POSITION_MIN: usize = 2;
const POSITION_MAX: usize = 50;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s]*$").expect("valid name pattern"));

// The address must also not start with '.' nor contain "..", which the regex
// crate cannot express without lookaround; see `is_email`.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+\-]@([A-Z0-9][A-Z0-9\-]*\.)+[A-Z]{2,}$")
        .expect("valid email pattern")
});

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

/// The five business fields of an employee record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EmployeeField {
    Name,
    Email,
    Position,
    Department,
    StartDate,
}

impl EmployeeField {
    pub const ALL: [EmployeeField; 5] = [
        EmployeeField::Name,
        EmployeeField::Email,
        EmployeeField::Position,
        EmployeeField::Department,
        EmployeeField::StartDate,
    ];

    /// Wire name used by forms and the GraphQL surface.
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeField::Name => "name",
            EmployeeField::Email => "email",
            EmployeeField::Position => "position",
            EmployeeField::Department => "department",
            EmployeeField::StartDate => "startDate",
        }
    }

    pub fn value_of(self, draft: &EmployeeDraft) -> &str {
        match self {
            EmployeeField::Name => &draft.name,
            EmployeeField::Email => &draft.email,
            EmployeeField::Position => &draft.position,
            EmployeeField::Department => &draft.department,
            EmployeeField::StartDate => &draft.start_date,
        }
    }

    pub fn value_of_mut(self, draft: &mut EmployeeDraft) -> &mut String {
        match self {
            EmployeeField::Name => &mut draft.name,
            EmployeeField::Email => &mut draft.email,
            EmployeeField::Position => &mut draft.position,
            EmployeeField::Department => &mut draft.department,
            EmployeeField::StartDate => &mut draft.start_date,
        }
    }

    /// Runs this field's rule chain against `value`.
    pub fn validate(self, value: &str, today: NaiveDate) -> Result<(), FieldError> {
        let fail = |kind, message| Err(FieldError::new(self, kind, message));
        match self {
            EmployeeField::Name => {
                let len = value.chars().count();
                if len < NAME_MIN {
                    return fail(FieldErrorKind::TooShort, "Name must be at least 2 characters");
                }
                if len > NAME_MAX {
                    return fail(FieldErrorKind::TooLong, "Name must not exceed 50 characters");
                }
                if !NAME_PATTERN.is_match(value) {
                    return fail(
                        FieldErrorKind::InvalidFormat,
                        "Name can only contain letters and spaces",
                    );
                }
                Ok(())
            }
            EmployeeField::Email => {
                if !is_email(value) {
                    return fail(FieldErrorKind::InvalidFormat, "Invalid email address");
                }
                let len = value.chars().count();
                if len < EMAIL_MIN {
                    return fail(FieldErrorKind::TooShort, "Email must be at least 5 characters");
                }
                if len > EMAIL_MAX {
                    return fail(FieldErrorKind::TooLong, "Email must not exceed 50 characters");
                }
                Ok(())
            }
            EmployeeField::Position => {
                let len = value.chars().count();
                if len < POSITION_MIN {
                    return fail(
                        FieldErrorKind::TooShort,
                        "Position must be at least 2 characters",
                    );
                }
                if len > POSITION_MAX {
                    return fail(
                        FieldErrorKind::TooLong,
                        "Position must not exceed 50 characters",
                    );
                }
                Ok(())
            }
            EmployeeField::Department => check_department(value).map(|_| ()),
            EmployeeField::StartDate => check_start_date(value, today).map(|_| ()),
        }
    }
}

impl fmt::Display for EmployeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown employee field {0:?}")]
pub struct UnknownField(pub String);

impl FromStr for EmployeeField {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EmployeeField::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| UnknownField(value.to_string()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldErrorKind {
    TooShort,
    TooLong,
    InvalidFormat,
    InvalidChoice,
    FutureDate,
}

impl FieldErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldErrorKind::TooShort => "TOO_SHORT",
            FieldErrorKind::TooLong => "TOO_LONG",
            FieldErrorKind::InvalidFormat => "INVALID_FORMAT",
            FieldErrorKind::InvalidChoice => "INVALID_CHOICE",
            FieldErrorKind::FutureDate => "FUTURE_DATE",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: EmployeeField,
    pub kind: FieldErrorKind,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: EmployeeField, kind: FieldErrorKind, message: &'static str) -> Self {
        Self {
            field,
            kind,
            message,
        }
    }
}

/// First error of every failing field, keyed by field.
#[derive(Debug, Error, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<EmployeeField, FieldError>,
}

impl ValidationErrors {
    pub fn get(&self, field: EmployeeField) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.values()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<EmployeeField, FieldError> {
        self.errors
    }

    fn insert(&mut self, error: FieldError) {
        self.errors.entry(error.field).or_insert(error);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in self.errors.values() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<FieldError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        let mut errors = ValidationErrors::default();
        for error in iter {
            errors.insert(error);
        }
        errors
    }
}

/// Live-typing check for one field. Reports at most one error.
pub fn validate_field(field: EmployeeField, value: &str, today: NaiveDate) -> Result<(), FieldError> {
    field.validate(value, today)
}

pub fn validate_field_now(field: EmployeeField, value: &str) -> Result<(), FieldError> {
    validate_field(field, value, crate::today_utc())
}

/// Submission check. Runs every field and returns the typed record only when
/// all of them pass.
pub fn validate_employee(
    draft: &EmployeeDraft,
    today: NaiveDate,
) -> Result<EmployeeRecord, ValidationErrors> {
    let mut errors: ValidationErrors = [
        EmployeeField::Name,
        EmployeeField::Email,
        EmployeeField::Position,
    ]
    .into_iter()
    .filter_map(|field| field.validate(field.value_of(draft), today).err())
    .collect();
    let department = check_department(&draft.department)
        .map_err(|error| errors.insert(error))
        .ok();
    let start_date = check_start_date(&draft.start_date, today)
        .map_err(|error| errors.insert(error))
        .ok();

    // A missing value always left its error behind.
    match (department, start_date) {
        (Some(department), Some(start_date)) if errors.is_empty() => Ok(EmployeeRecord {
            name: draft.name.clone(),
            email: draft.email.clone(),
            position: draft.position.clone(),
            department,
            start_date,
        }),
        _ => Err(errors),
    }
}

pub fn validate_employee_now(draft: &EmployeeDraft) -> Result<EmployeeRecord, ValidationErrors> {
    validate_employee(draft, crate::today_utc())
}

fn is_email(value: &str) -> bool {
    !value.starts_with('.') && !value.contains("..") && EMAIL_PATTERN.is_match(value)
}

fn check_department(value: &str) -> Result<Department, FieldError> {
    value.parse::<Department>().map_err(|_| {
        FieldError::new(
            EmployeeField::Department,
            FieldErrorKind::InvalidChoice,
            "Please select a valid department",
        )
    })
}

fn check_start_date(value: &str, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    let fail = |kind, message| FieldError::new(EmployeeField::StartDate, kind, message);
    let date = parse_start_date(value)
        .ok_or_else(|| fail(FieldErrorKind::InvalidFormat, "Invalid date format"))?;
    if date > today {
        return Err(fail(
            FieldErrorKind::FutureDate,
            "Start date cannot be in the future",
        ));
    }
    Ok(date)
}

fn parse_start_date(value: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
