use console::measure_text_width;

use crate::core::StudentRecord;

const HEADERS: [&str; 12] = [
    "Roll_Number",
    "name",
    "attendance",
    "hours_studied",
    "weekly_study_hours",
    "previous_score",
    "assignments_completed",
    "stress_level",
    "learning_style",
    "extracurriculars_involved",
    "goal_score",
    "score",
];

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row_cells(record: &StudentRecord) -> Vec<String> {
    let f = &record.features;
    vec![
        record.roll_number.to_string(),
        record.name.clone(),
        cell(f.attendance),
        cell(f.hours_studied),
        cell(f.weekly_study_hours),
        cell(f.previous_score),
        cell(f.assignments_completed),
        cell(f.stress_level),
        cell(f.learning_style.as_deref()),
        cell(f.extracurriculars_involved),
        cell(f.goal_score),
        cell(record.score),
    ]
}

fn border(widths: &[usize], left: char, mid: char, right: char, fill: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, width) in widths.iter().enumerate() {
        line.extend(std::iter::repeat(fill).take(width + 2));
        line.push(if i + 1 == widths.len() { right } else { mid });
    }
    line
}

fn content_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("│");
    for (text, width) in cells.iter().zip(widths) {
        let pad = width - measure_text_width(text);
        line.push(' ');
        line.push_str(text);
        line.extend(std::iter::repeat(' ').take(pad + 1));
        line.push('│');
    }
    line
}

/// Render records as a box-drawn grid with a header row.
pub fn render_table(records: &[StudentRecord]) -> String {
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = records.iter().map(row_cells).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| measure_text_width(h)).collect();
    for row in &rows {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(text));
        }
    }

    let mut lines = vec![
        border(&widths, '╒', '╤', '╕', '═'),
        content_line(&header, &widths),
        border(&widths, '╞', '╪', '╡', '═'),
    ];
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            lines.push(border(&widths, '├', '┼', '┤', '─'));
        }
        lines.push(content_line(row, &widths));
    }
    lines.push(border(&widths, '╘', '╧', '╛', '═'));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RollNumber, StudentFeatures};

    fn record(id: i64, name: &str) -> StudentRecord {
        StudentRecord {
            roll_number: RollNumber(id),
            name: name.to_string(),
            features: StudentFeatures {
                attendance: Some(91),
                learning_style: Some("Visual".to_string()),
                ..Default::default()
            },
            score: Some(412.5),
        }
    }

    #[test]
    fn test_table_contains_header_and_rows() {
        let table = render_table(&[record(1, "Ada"), record(2, "Grace Hopper")]);

        assert!(table.contains("Roll_Number"));
        assert!(table.contains("extracurriculars_involved"));
        assert!(table.contains("Grace Hopper"));
        assert!(table.contains("412.5"));
        // top, header, separator, row, divider, row, bottom
        assert_eq!(table.lines().count(), 7);
    }

    #[test]
    fn test_lines_have_equal_width() {
        let table = render_table(&[record(1, "Ada"), record(22, "Émilie du Châtelet")]);
        let widths: Vec<usize> = table.lines().map(measure_text_width).collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]), "{:?}", widths);
    }

    #[test]
    fn test_missing_values_render_empty() {
        let table = render_table(&[record(3, "Alan")]);
        assert!(!table.contains("None"));
    }
}
