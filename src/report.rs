use std::fmt::Write;

use crate::aggregate::Visualisation;
use crate::filter::{FilterCriteria, StatusFilter};
use crate::models::{StudentTable, COLUMNS};

pub fn build_overview(table: &StudentTable) -> String {
    let status = crate::aggregate::placement_status_counts(table);
    let mut output = String::new();

    let _ = writeln!(output, "# Placement Eligibility Dashboard");
    let _ = writeln!(output);
    if table.is_empty() {
        let _ = writeln!(output, "No student records loaded.");
        return output;
    }
    let _ = writeln!(
        output,
        "{} rows covering {} students.",
        table.len(),
        table.distinct_students()
    );
    let _ = writeln!(output, "- Placed: {}", status.placed);
    let _ = writeln!(output, "- Not Placed: {}", status.not_placed);
    output
}

pub fn build_visualisation_report(visualisation: &Visualisation) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Placement Visualisation");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Placement Status Distribution");
    let status = &visualisation.status_counts;
    if status.total() == 0 {
        let _ = writeln!(output, "No students loaded.");
    } else {
        for (label, count) in [("Placed", status.placed), ("Not Placed", status.not_placed)] {
            let share = count as f64 * 100.0 / status.total() as f64;
            let _ = writeln!(output, "- {label}: {count} ({share:.1}%)");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Placed vs Not Placed Students by Batch");
    if visualisation.batch_counts.is_empty() {
        let _ = writeln!(output, "No course_batch data available.");
    } else {
        let _ = writeln!(output, "| Batch | Status | Count |");
        let _ = writeln!(output, "|---|---|---|");
        for row in &visualisation.batch_counts {
            let _ = writeln!(output, "| {} | {} | {} |", row.batch, row.status, row.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Communication Skill vs Placement Package");
    if visualisation.skill_vs_package.is_empty() {
        let _ = writeln!(output, "Insufficient data for scatter plot.");
    } else {
        let _ = writeln!(
            output,
            "| Name | Company | Communication | Package (LPA) | Presentation | Teamwork |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for point in &visualisation.skill_vs_package {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                point.name,
                point.company_name.as_deref().unwrap_or(""),
                point.communication,
                point.placement_package,
                optional(point.presentation),
                optional(point.teamwork)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Distribution by City");
    if visualisation.city_counts.is_empty() {
        let _ = writeln!(output, "City data not available.");
    } else {
        for entry in &visualisation.city_counts {
            let _ = writeln!(output, "- {}: {}", entry.city, entry.count);
        }
    }

    output
}

pub fn describe_criteria(criteria: &FilterCriteria) -> String {
    let status = match criteria.status {
        StatusFilter::Any => "All",
        StatusFilter::Placed => "Placed",
        StatusFilter::NotPlaced => "Not Placed",
    };
    format!(
        "department={} gender={} city={} status={} min_communication={} min_package={}",
        criteria.department.as_deref().unwrap_or("All"),
        criteria.gender.as_deref().unwrap_or("All"),
        criteria.city.as_deref().unwrap_or("All"),
        status,
        criteria.min_communication,
        criteria.min_package
    )
}

/// Fixed-width text rendering of a table for terminal output.
pub fn render_table(table: &StudentTable) -> String {
    let rows: Vec<Vec<String>> = table.iter().map(|record| record.cells()).collect();
    let mut widths: Vec<usize> = COLUMNS.iter().map(|column| column.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header: Vec<String> = COLUMNS.iter().map(|column| column.to_string()).collect();
    write_row(&mut output, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    write_row(&mut output, &rule, &widths);
    for row in &rows {
        write_row(&mut output, row, &widths);
    }
    output
}

fn write_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(output, "{}", line.join("  ").trim_end());
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;

    fn sample_table() -> StudentTable {
        StudentTable::new(vec![
            with_communication(placed(student(1, "CS", "F", "Pune"), "Acme", "12"), 8.0),
            with_communication(student(2, "CS", "M", "Pune"), 5.0),
        ])
    }

    #[test]
    fn overview_reports_status_split() {
        let overview = build_overview(&sample_table());
        assert!(overview.contains("2 rows covering 2 students."));
        assert!(overview.contains("- Placed: 1"));
        assert!(overview.contains("- Not Placed: 1"));
    }

    #[test]
    fn overview_of_empty_table_says_so() {
        let overview = build_overview(&StudentTable::default());
        assert!(overview.contains("No student records loaded."));
        assert!(!overview.contains("- Placed"));
    }

    #[test]
    fn visualisation_report_lists_every_section() {
        let report = build_visualisation_report(&Visualisation::from_table(&sample_table()));
        assert!(report.contains("- Placed: 1 (50.0%)"));
        assert!(report.contains("| CS | Not Placed | 1 |"));
        assert!(report.contains("| CS | Placed | 1 |"));
        assert!(report.contains("| Student 1 | Acme | 8 | 12 |  |  |"));
        assert!(report.contains("- Pune: 2"));
    }

    #[test]
    fn empty_table_renders_placeholders() {
        let report = build_visualisation_report(&Visualisation::from_table(&StudentTable::default()));
        assert!(report.contains("No students loaded."));
        assert!(report.contains("No course_batch data available."));
        assert!(report.contains("Insufficient data for scatter plot."));
        assert!(report.contains("City data not available."));
    }

    #[test]
    fn criteria_description_names_defaults() {
        let criteria = FilterCriteria {
            city: Some("Pune".to_string()),
            status: StatusFilter::NotPlaced,
            min_communication: 4,
            ..Default::default()
        };
        assert_eq!(
            describe_criteria(&criteria),
            "department=All gender=All city=Pune status=Not Placed min_communication=4 min_package=0"
        );
    }

    #[test]
    fn rendered_table_aligns_columns() {
        let rendered = render_table(&sample_table());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("student_id  name"));
        assert!(lines[2].starts_with("1           Student 1"));
    }
}
