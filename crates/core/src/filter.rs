//! Derived views over the full employee list: department choices, the
//! search/department filtered subset and the dashboard counters.
//!
//! Everything is recomputed from scratch on each call. None of it can fail;
//! records with unparseable dates simply don't count as new hires.

use std::collections::HashSet;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::employee::Employee;

/// Search text and department selection. Empty strings match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFilter {
    pub search: String,
    pub department: String,
}

impl EmployeeFilter {
    pub fn new(search: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            department: department.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || !self.department.is_empty()
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        self.matches_search(employee) && self.matches_department(employee)
    }

    fn matches_search(&self, employee: &Employee) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        let body = &employee.body;
        [&body.name, &body.email, &body.position]
            .into_iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle))
    }

    fn matches_department(&self, employee: &Employee) -> bool {
        self.department.is_empty() || employee.body.department == self.department
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub total: usize,
    pub departments: usize,
    pub filtered: usize,
    pub new_this_year: usize,
}

/// Distinct non-blank departments in first-seen order.
pub fn distinct_departments(employees: &[Employee]) -> Vec<String> {
    let mut seen = HashSet::new();
    employees
        .iter()
        .map(|employee| employee.body.department.as_str())
        .filter(|department| !department.trim().is_empty())
        .filter(|department| seen.insert(*department))
        .map(str::to_string)
        .collect()
}

/// Records matching `filter`, in input order.
pub fn filter_employees<'a>(employees: &'a [Employee], filter: &EmployeeFilter) -> Vec<&'a Employee> {
    employees
        .iter()
        .filter(|employee| filter.matches(employee))
        .collect()
}

/// Records whose start date is strictly after `today` minus one year.
pub fn count_new_this_year(employees: &[Employee], today: NaiveDate) -> usize {
    let Some(cutoff) = one_year_before(today) else {
        return 0;
    };
    employees
        .iter()
        .filter_map(|employee| employee.body.start_date())
        .filter(|start| *start > cutoff)
        .count()
}

pub fn directory_stats(employees: &[Employee], filter: &EmployeeFilter, today: NaiveDate) -> DirectoryStats {
    DirectoryStats {
        total: employees.len(),
        departments: distinct_departments(employees).len(),
        filtered: employees.iter().filter(|e| filter.matches(e)).count(),
        new_this_year: count_new_this_year(employees, today),
    }
}

/// Everything the listing screen needs, computed from one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryView {
    pub departments: Vec<String>,
    pub employees: Vec<Employee>,
    pub stats: DirectoryStats,
}

impl DirectoryView {
    pub fn compute(all: &[Employee], filter: &EmployeeFilter, today: NaiveDate) -> Self {
        let departments = distinct_departments(all);
        let employees: Vec<Employee> = filter_employees(all, filter).into_iter().cloned().collect();
        let stats = DirectoryStats {
            total: all.len(),
            departments: departments.len(),
            filtered: employees.len(),
            new_this_year: count_new_this_year(all, today),
        };
        Self {
            departments,
            employees,
            stats,
        }
    }
}

fn one_year_before(today: NaiveDate) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(12))
}
