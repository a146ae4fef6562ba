//! Add/edit form state for a single employee.
//!
//! The form never talks to the store. `submit` hands back what should be
//! written; the owner performs the write and calls `reset` only once it
//! succeeded, so a failed write leaves the user's input in place.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    employee::{Employee, EmployeeDraft, EmployeeId, EmployeeRecord},
    validation::{validate_employee, EmployeeField, FieldError, ValidationErrors},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Create(EmployeeRecord),
    Replace { id: EmployeeId, record: EmployeeRecord },
}

#[derive(Clone, Debug, Default)]
pub struct EmployeeForm {
    draft: EmployeeDraft,
    editing: Option<EmployeeId>,
    errors: BTreeMap<EmployeeField, FieldError>,
}

impl EmployeeForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefills the form from a persisted record and targets it for replacement.
    pub fn edit(employee: &Employee) -> Self {
        Self {
            draft: employee.body.to_draft(),
            editing: Some(employee.id.clone()),
            errors: BTreeMap::new(),
        }
    }

    pub fn draft(&self) -> &EmployeeDraft {
        &self.draft
    }

    pub fn editing(&self) -> Option<&EmployeeId> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn error(&self, field: EmployeeField) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    pub fn errors(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.values()
    }

    /// Stores `value` and re-checks only that field.
    pub fn set_field(&mut self, field: EmployeeField, value: impl Into<String>, today: NaiveDate) {
        let slot = field.value_of_mut(&mut self.draft);
        *slot = value.into();
        match field.validate(slot, today) {
            Ok(()) => {
                self.errors.remove(&field);
            }
            Err(error) => {
                self.errors.insert(field, error);
            }
        }
    }

    pub fn submit(&mut self, today: NaiveDate) -> Result<Submission, ValidationErrors> {
        match validate_employee(&self.draft, today) {
            Ok(record) => {
                self.errors.clear();
                Ok(match &self.editing {
                    Some(id) => Submission::Replace {
                        id: id.clone(),
                        record,
                    },
                    None => Submission::Create(record),
                })
            }
            Err(errors) => {
                self.errors = errors.clone().into_map();
                Err(errors)
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
