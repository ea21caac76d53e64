use sales_etl::table::{NULL_MARKER, render_summary, render_table};

fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

#[test]
fn render_table_aligns_columns() {
    let headers = vec!["id".to_string(), "name".to_string()];
    let rows = vec![cells(&[Some("1"), Some("Alice")]), cells(&[Some("2"), Some("Bob")])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec![" id  name", "---  -----", "  1  Alice", "  2  Bob"]);
}

#[test]
fn render_table_normalizes_control_characters() {
    let headers = vec!["note".to_string()];
    let rows = vec![cells(&[Some("line1\nline2\tvalue")])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "line1 line2 value");
}

#[test]
fn null_cells_do_not_make_a_column_textual() {
    let headers = vec!["monto_total".to_string()];
    let rows = vec![cells(&[None]), cells(&[Some("8.00")])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[2], format!("{:>11}", NULL_MARKER));
    assert_eq!(lines[3], "       8.00");
}

#[test]
fn summary_renders_label_value_pairs() {
    let rendered = render_summary(&[("master rows", "3".to_string()), ("revenue", "218.00".to_string())]);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "metric        value");
    assert_eq!(lines[2], "master rows       3");
    assert_eq!(lines[3], "revenue      218.00");
}
