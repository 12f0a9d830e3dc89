use std::fmt;

use serde::Serialize;

/// Column order of the joined student view, used for display and export.
pub const COLUMNS: [&str; 13] = [
    "student_id",
    "name",
    "gender",
    "city",
    "course_batch",
    "company_name",
    "placement_package",
    "communication",
    "teamwork",
    "presentation",
    "leadership",
    "critical_thinking",
    "interpersonal_skills",
];

/// One row of students LEFT JOIN placements LEFT JOIN soft_skills.
///
/// `placement_package` keeps the text the store returned; numeric coercion
/// happens only where a comparison needs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub student_id: i64,
    pub name: String,
    pub gender: String,
    pub city: String,
    pub course_batch: String,
    pub company_name: Option<String>,
    pub placement_package: Option<String>,
    pub communication: Option<f64>,
    pub teamwork: Option<f64>,
    pub presentation: Option<f64>,
    pub leadership: Option<f64>,
    pub critical_thinking: Option<f64>,
    pub interpersonal_skills: Option<f64>,
}

impl StudentRecord {
    pub fn status(&self) -> PlacementStatus {
        match self.company_name.as_deref() {
            Some(company) if !company.is_empty() => PlacementStatus::Placed,
            _ => PlacementStatus::NotPlaced,
        }
    }

    /// Package as LPA, or `None` when missing or not a number.
    pub fn package_lpa(&self) -> Option<f64> {
        self.placement_package
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }

    /// Cell values in [`COLUMNS`] order; absent values render empty.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.student_id.to_string(),
            self.name.clone(),
            self.gender.clone(),
            self.city.clone(),
            self.course_batch.clone(),
            self.company_name.clone().unwrap_or_default(),
            self.placement_package.clone().unwrap_or_default(),
            score_cell(self.communication),
            score_cell(self.teamwork),
            score_cell(self.presentation),
            score_cell(self.leadership),
            score_cell(self.critical_thinking),
            score_cell(self.interpersonal_skills),
        ]
    }
}

fn score_cell(score: Option<f64>) -> String {
    score.map(|value| value.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PlacementStatus {
    #[serde(rename = "Not Placed")]
    NotPlaced,
    Placed,
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementStatus::Placed => write!(f, "Placed"),
            PlacementStatus::NotPlaced => write!(f, "Not Placed"),
        }
    }
}

/// An immutable, loaded set of student rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StudentTable {
    records: Vec<StudentRecord>,
}

impl StudentTable {
    pub fn new(records: Vec<StudentRecord>) -> Self {
        Self { records }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StudentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn distinct_students(&self) -> usize {
        let ids: std::collections::HashSet<i64> =
            self.records.iter().map(|record| record.student_id).collect();
        ids.len()
    }
}

impl FromIterator<StudentRecord> for StudentTable {
    fn from_iter<I: IntoIterator<Item = StudentRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    #[serde(rename = "Placed")]
    pub placed: usize,
    #[serde(rename = "Not Placed")]
    pub not_placed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.placed + self.not_placed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStatusCount {
    pub batch: String,
    pub status: PlacementStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillPackagePoint {
    pub name: String,
    pub company_name: Option<String>,
    pub communication: f64,
    pub placement_package: f64,
    pub presentation: Option<f64>,
    pub teamwork: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}
