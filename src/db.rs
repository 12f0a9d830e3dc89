use std::time::Instant;

use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{StudentRecord, StudentTable};

/// Every student appears at least once; placement and skill columns are NULL
/// when the right-hand tables have no match. Scores are cast to DOUBLE and
/// the package to text so loosely typed source columns decode uniformly.
const JOINED_STUDENTS_QUERY: &str = r#"
    SELECT CAST(s.student_id AS SIGNED) AS student_id,
           s.name, s.gender, s.city, s.course_batch,
           p.company_name,
           CAST(p.placement_package AS CHAR) AS placement_package,
           CAST(sk.communication AS DOUBLE) AS communication,
           CAST(sk.teamwork AS DOUBLE) AS teamwork,
           CAST(sk.presentation AS DOUBLE) AS presentation,
           CAST(sk.leadership AS DOUBLE) AS leadership,
           CAST(sk.critical_thinking AS DOUBLE) AS critical_thinking,
           CAST(sk.interpersonal_skills AS DOUBLE) AS interpersonal_skills
    FROM students s
    LEFT JOIN placements p ON s.student_id = p.student_id
    LEFT JOIN soft_skills sk ON s.student_id = sk.student_id
"#;

pub async fn load_records(pool: &MySqlPool) -> Result<StudentTable> {
    let started = Instant::now();
    let rows = sqlx::query(JOINED_STUDENTS_QUERY)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::data_source("joined student query failed", err))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        let record = record_from_row(row)
            .map_err(|err| Error::data_source("unexpected column in joined student view", err))?;
        records.push(record);
    }

    let table = StudentTable::new(records);
    info!(
        rows = table.len(),
        students = table.distinct_students(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded student records"
    );
    Ok(table)
}

fn record_from_row(row: &MySqlRow) -> std::result::Result<StudentRecord, sqlx::Error> {
    Ok(StudentRecord {
        student_id: row.try_get("student_id")?,
        name: text_or_empty(row.try_get("name")?),
        gender: text_or_empty(row.try_get("gender")?),
        city: text_or_empty(row.try_get("city")?),
        course_batch: text_or_empty(row.try_get("course_batch")?),
        company_name: company_or_none(row.try_get("company_name")?),
        placement_package: row.try_get("placement_package")?,
        communication: row.try_get("communication")?,
        teamwork: row.try_get("teamwork")?,
        presentation: row.try_get("presentation")?,
        leadership: row.try_get("leadership")?,
        critical_thinking: row.try_get("critical_thinking")?,
        interpersonal_skills: row.try_get("interpersonal_skills")?,
    })
}

/// NULL categorical text becomes an empty string.
fn text_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// An empty company name means the student is not placed, same as NULL.
fn company_or_none(value: Option<String>) -> Option<String> {
    value.filter(|company| !company.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlacementStatus;
    use crate::models::fixtures::student;

    #[test]
    fn null_text_becomes_empty() {
        assert_eq!(text_or_empty(None), "");
        assert_eq!(text_or_empty(Some("Pune".to_string())), "Pune");
    }

    #[test]
    fn blank_company_is_not_placed() {
        assert_eq!(company_or_none(None), None);
        assert_eq!(company_or_none(Some(String::new())), None);
        assert_eq!(company_or_none(Some("  ".to_string())), None);
        assert_eq!(company_or_none(Some("Acme".to_string())).as_deref(), Some("Acme"));

        let mut record = student(1, "CS", "F", "Pune");
        record.company_name = company_or_none(Some(String::new()));
        assert_eq!(record.status(), PlacementStatus::NotPlaced);
    }
}
