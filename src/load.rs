use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::Timelike;
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    error::PipelineError,
    io_utils,
    locate::SourcePaths,
    model::{RawRow, RawTable, SourceTables},
    schema::Entity,
};

/// How delimited text files are read; spreadsheets ignore both fields.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: encoding_rs::UTF_8,
        }
    }
}

pub fn load_sources(paths: &SourcePaths, options: &LoadOptions) -> Result<SourceTables, PipelineError> {
    let customers = load_table(paths.get(Entity::Customer), options)?;
    let products = load_table(paths.get(Entity::Product), options)?;
    let sales = load_table(paths.get(Entity::Sale), options)?;
    let line_items = load_table(paths.get(Entity::LineItem), options)?;
    info!(
        "Loaded {} customer(s), {} product(s), {} sale(s), {} line item(s)",
        customers.row_count(),
        products.row_count(),
        sales.row_count(),
        line_items.row_count()
    );
    Ok(SourceTables {
        customers,
        products,
        sales,
        line_items,
    })
}

/// Reads one file into a [`RawTable`], dispatching on its extension.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<RawTable, PipelineError> {
    let loaded = if io_utils::is_spreadsheet(path) {
        read_spreadsheet(path)
    } else {
        read_delimited(path, options)
    };
    let (headers, rows) = loaded.map_err(|err| PipelineError::source_read(path, format!("{err:#}")))?;
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::source_read(path, "no header row"));
    }
    debug!(
        "Read {} row(s) with header [{}] from {:?}",
        rows.len(),
        headers.join(", "),
        path
    );
    Ok(RawTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

fn read_delimited(path: &Path, options: &LoadOptions) -> Result<(Vec<String>, Vec<RawRow>)> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)
        .context("Reading header row")?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let line = row_idx + 2;
        let record = record.with_context(|| format!("Reading row {line}"))?;
        let cells = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {line}"))?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(RawRow { line, cells });
    }
    Ok((headers, rows))
}

fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<RawRow>)> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| anyhow!("Opening workbook failed: {e}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no worksheets"))?
        .map_err(|e| anyhow!("Reading first worksheet failed: {e}"))?;

    let mut sheet_rows = range.rows();
    let headers = sheet_rows
        .next()
        .ok_or_else(|| anyhow!("Worksheet is empty"))?
        .iter()
        .map(cell_to_string)
        .collect::<Vec<_>>();

    // Ranges start at the first used cell, so shift the line numbers to match
    // what the sheet shows.
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = Vec::new();
    for (offset, sheet_row) in sheet_rows.enumerate() {
        let mut cells = sheet_row.iter().map(cell_to_string).collect::<Vec<_>>();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        cells.resize(headers.len().max(cells.len()), String::new());
        rows.push(RawRow {
            line: first_line + offset + 1,
            cells,
        });
    }
    Ok((headers, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                format!("{f:.0}")
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => String::new(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(err) => err.to_string(),
    }
}
