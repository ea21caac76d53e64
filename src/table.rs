//! Plain-text table rendering for terminal output.

use std::{borrow::Cow, fmt::Write as _, str::FromStr};

use rust_decimal::Decimal;

/// Shown in place of a null field.
pub const NULL_MARKER: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders rows under a header line and a dashed separator. Columns whose
/// non-null cells are all numbers are right-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<Option<String>>]) -> String {
    let column_count = headers.len();
    let cells = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(column_count)
                .map(|cell| match cell {
                    Some(value) => sanitize_cell(value),
                    None => Cow::Borrowed(NULL_MARKER),
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| display_width(h).max(3)).collect::<Vec<_>>();
    for row in &cells {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    let aligns = (0..column_count)
        .map(|idx| column_alignment(rows, idx))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| sanitize_cell(h)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths, &aligns));
    let separator = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat(*w)))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &aligns));
    for row in &cells {
        let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<Option<String>>]) {
    print!("{}", render_table(headers, rows));
}

/// Two-column key/value rendering used for run summaries.
pub fn render_summary(entries: &[(&str, String)]) -> String {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = entries
        .iter()
        .map(|(label, value)| vec![Some(label.to_string()), Some(value.clone())])
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

fn column_alignment(rows: &[Vec<Option<String>>], idx: usize) -> Align {
    let mut values = rows
        .iter()
        .filter_map(|row| row.get(idx).and_then(|c| c.as_deref()))
        .peekable();
    if values.peek().is_none() {
        return Align::Left;
    }
    if values.all(|v| Decimal::from_str(v.trim()).is_ok()) {
        Align::Right
    } else {
        Align::Left
    }
}

fn format_row(values: &[Cow<'_, str>], widths: &[usize], aligns: &[Align]) -> String {
    let mut line = String::new();
    for (idx, value) in values.iter().enumerate().take(widths.len()) {
        if idx > 0 {
            line.push_str("  ");
        }
        let padding = widths[idx].saturating_sub(display_width(value));
        match aligns.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => {
                line.push_str(value);
                line.push_str(&" ".repeat(padding));
            }
            Align::Right => {
                line.push_str(&" ".repeat(padding));
                line.push_str(value);
            }
        }
    }
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_columns_align_right_and_nulls_use_marker() {
        let headers = vec!["name".to_string(), "total".to_string()];
        let rows = vec![
            vec![Some("Ana".to_string()), Some("5.5".to_string())],
            vec![Some("Bartolomeo".to_string()), None],
            vec![None, Some("120.00".to_string())],
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "name         total");
        assert_eq!(lines[1], "----------  ------");
        assert_eq!(lines[2], "Ana            5.5");
        assert_eq!(lines[3], "Bartolomeo    null");
        assert_eq!(lines[4], "null        120.00");
    }

    #[test]
    fn embedded_newlines_are_flattened() {
        let headers = vec!["note".to_string()];
        let rows = vec![vec![Some("a\nb".to_string())]];
        assert!(render_table(&headers, &rows).contains("a b"));
    }
}
