use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::error::Result;
use crate::models::{StudentTable, COLUMNS};

pub const SHORTLIST_FILE_NAME: &str = "shortlisted_students.csv";

/// Comma-delimited UTF-8 with a header row in [`COLUMNS`] order. Fields
/// containing delimiters, quotes or newlines are quoted.
pub fn to_delimited_text(table: &StudentTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(COLUMNS)?;
    for record in table.iter() {
        writer.write_record(record.cells())?;
    }
    let data = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(data)
}

/// `placement_data_YYYYMMDD_HHMMSS.csv` for a full export captured at `captured_at`.
pub fn timestamped_file_name(captured_at: NaiveDateTime) -> String {
    format!("placement_data_{}.csv", captured_at.format("%Y%m%d_%H%M%S"))
}

pub fn write_table(table: &StudentTable, path: &Path) -> Result<PathBuf> {
    let data = to_delimited_text(table)?;
    std::fs::write(path, data)?;
    info!(rows = table.len(), path = %path.display(), "exported student table");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::fixtures::*;

    fn parse(data: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(data);
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(|value| value.to_string())
            .collect();
        let rows = reader
            .records()
            .map(|row| row.unwrap().iter().map(|value| value.to_string()).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn header_comes_first_in_column_order() {
        let data = to_delimited_text(&StudentTable::default()).unwrap();
        let text = String::from_utf8(data).unwrap();
        assert_eq!(text.trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn parsing_output_reproduces_every_cell() {
        let mut tricky = placed(student(2, "CS, 2024", "F", "Pune"), "Acme \"Labs\"", "N/A");
        tricky.name = "Rao, Priya\nJr.".to_string();
        let table = StudentTable::new(vec![
            with_communication(placed(student(1, "CS", "F", "Pune"), "Acme", "12"), 8.5),
            tricky,
            student(3, "ECE", "M", "Chennai"),
        ]);

        let (headers, rows) = parse(&to_delimited_text(&table).unwrap());
        assert_eq!(headers, COLUMNS.to_vec());
        let expected: Vec<Vec<String>> = table.iter().map(|record| record.cells()).collect();
        assert_eq!(rows, expected);
        assert_eq!(rows[1][1], "Rao, Priya\nJr.");
        assert_eq!(rows[2][5], "");
    }

    #[test]
    fn timestamped_name_uses_capture_time() {
        let captured_at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        assert_eq!(
            timestamped_file_name(captured_at),
            "placement_data_20261019_090507.csv"
        );
    }
}
