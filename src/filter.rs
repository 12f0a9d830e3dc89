use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CoercionWarning;
use crate::models::{PlacementStatus, StudentRecord, StudentTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusFilter {
    #[default]
    Any,
    Placed,
    NotPlaced,
}

/// Operator-chosen eligibility constraints. `None` selections, `Any` status
/// and zero thresholds impose nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub department: Option<String>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub status: StatusFilter,
    pub min_communication: u8,
    pub min_package: f64,
}

/// A single row-level test. Predicates are independent of one another, so
/// any application order yields the same rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Department(String),
    Gender(String),
    City(String),
    Status(PlacementStatus),
    MinCommunication(u8),
    MinPackage(f64),
}

impl FilterCriteria {
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(department) = &self.department {
            predicates.push(Predicate::Department(department.clone()));
        }
        if let Some(gender) = &self.gender {
            predicates.push(Predicate::Gender(gender.clone()));
        }
        if let Some(city) = &self.city {
            predicates.push(Predicate::City(city.clone()));
        }
        match self.status {
            StatusFilter::Any => {}
            StatusFilter::Placed => predicates.push(Predicate::Status(PlacementStatus::Placed)),
            StatusFilter::NotPlaced => {
                predicates.push(Predicate::Status(PlacementStatus::NotPlaced))
            }
        }
        if self.min_communication > 0 {
            predicates.push(Predicate::MinCommunication(self.min_communication));
        }
        if self.min_package > 0.0 {
            predicates.push(Predicate::MinPackage(self.min_package));
        }
        predicates
    }
}

impl Predicate {
    pub fn matches(&self, record: &StudentRecord) -> bool {
        match self {
            Predicate::Department(department) => record.course_batch == *department,
            Predicate::Gender(gender) => record.gender == *gender,
            Predicate::City(city) => record.city == *city,
            Predicate::Status(status) => record.status() == *status,
            Predicate::MinCommunication(threshold) => record
                .communication
                .map(|score| score >= f64::from(*threshold))
                .unwrap_or(false),
            Predicate::MinPackage(threshold) => coerced_package(record) >= *threshold,
        }
    }
}

/// Treats "any"/"all" (any case) and blank input as no selection; other
/// values are trimmed.
pub fn selection(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("any") || value.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Rows of `table` satisfying every active criterion.
pub fn apply(table: &StudentTable, criteria: &FilterCriteria) -> StudentTable {
    apply_predicates(table, &criteria.predicates())
}

pub fn apply_predicates(table: &StudentTable, predicates: &[Predicate]) -> StudentTable {
    let mut current: Vec<&StudentRecord> = table.iter().collect();
    for predicate in predicates {
        current.retain(|record| predicate.matches(record));
        debug!(?predicate, remaining = current.len(), "applied filter predicate");
    }
    current.into_iter().cloned().collect()
}

/// Package for threshold comparison: missing is 0, non-numeric text is 0
/// with a logged warning.
pub fn coerced_package(record: &StudentRecord) -> f64 {
    match record.placement_package.as_deref() {
        None => 0.0,
        Some(raw) => match record.package_lpa() {
            Some(value) => value,
            None => {
                if !raw.trim().is_empty() {
                    let warning = CoercionWarning {
                        student_id: record.student_id,
                        raw: raw.to_string(),
                    };
                    warn!("{warning}");
                }
                0.0
            }
        },
    }
}

/// Distinct values offered for each categorical selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub departments: Vec<String>,
    pub genders: Vec<String>,
    pub cities: Vec<String>,
}

impl FilterOptions {
    /// Non-empty values in first-seen order.
    pub fn from_table(table: &StudentTable) -> Self {
        let mut options = FilterOptions::default();
        for record in table.iter() {
            push_distinct(&mut options.departments, &record.course_batch);
            push_distinct(&mut options.genders, &record.gender);
            push_distinct(&mut options.cities, &record.city);
        }
        options
    }
}

fn push_distinct(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}
