//! Master view column catalogue.

use crate::{join::MASTER_COLUMNS, table};

pub fn catalogue_rows() -> Vec<Vec<Option<String>>> {
    MASTER_COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                Some((idx + 1).to_string()),
                Some(column.name.to_string()),
                Some(column.origin.logical_name().to_string()),
                Some(column.source.to_string()),
            ]
        })
        .collect()
}

pub fn execute() {
    let headers = ["#", "name", "origin", "source"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    table::print_table(&headers, &catalogue_rows());
}
