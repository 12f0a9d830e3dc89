use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{
    BatchStatusCount, CityCount, PlacementStatus, SkillPackagePoint, StatusCounts, StudentTable,
};

/// All four chart summaries computed over one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visualisation {
    pub status_counts: StatusCounts,
    pub batch_counts: Vec<BatchStatusCount>,
    pub skill_vs_package: Vec<SkillPackagePoint>,
    pub city_counts: Vec<CityCount>,
}

impl Visualisation {
    pub fn from_table(table: &StudentTable) -> Self {
        Self {
            status_counts: placement_status_counts(table),
            batch_counts: batch_placement_counts(table),
            skill_vs_package: skill_vs_package(table),
            city_counts: city_counts(table),
        }
    }
}

pub fn placement_status_counts(table: &StudentTable) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for record in table.iter() {
        match record.status() {
            PlacementStatus::Placed => counts.placed += 1,
            PlacementStatus::NotPlaced => counts.not_placed += 1,
        }
    }
    counts
}

/// Counts per (batch, status), ordered by batch then status. Rows without a
/// batch are not grouped and empty groups are never emitted.
pub fn batch_placement_counts(table: &StudentTable) -> Vec<BatchStatusCount> {
    let mut groups: BTreeMap<(String, PlacementStatus), usize> = BTreeMap::new();
    for record in table.iter() {
        if record.course_batch.is_empty() {
            continue;
        }
        *groups
            .entry((record.course_batch.clone(), record.status()))
            .or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((batch, status), count)| BatchStatusCount {
            batch,
            status,
            count,
        })
        .collect()
}

/// Rows with both a communication score and a numeric package.
pub fn skill_vs_package(table: &StudentTable) -> Vec<SkillPackagePoint> {
    table
        .iter()
        .filter_map(|record| {
            let communication = record.communication?;
            let placement_package = record.package_lpa()?;
            Some(SkillPackagePoint {
                name: record.name.clone(),
                company_name: record.company_name.clone(),
                communication,
                placement_package,
                presentation: record.presentation,
                teamwork: record.teamwork,
            })
        })
        .collect()
}

/// Rows per city, most frequent first; ties are ordered by city name.
pub fn city_counts(table: &StudentTable) -> Vec<CityCount> {
    let mut map: HashMap<&str, usize> = HashMap::new();
    for record in table.iter() {
        if record.city.is_empty() {
            continue;
        }
        *map.entry(record.city.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<CityCount> = map
        .into_iter()
        .map(|(city, count)| CityCount {
            city: city.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    counts
}
