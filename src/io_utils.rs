//! I/O helpers shared by the locator and the loader.
//!
//! - **Extension classes**: which file extensions count as tabular data, and
//!   which of those are spreadsheets read through `calamine`.
//! - **Delimiter resolution**: extension-based auto-detection (`.tsv` → tab,
//!   anything else → comma) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader construction**: strict (non-flexible) CSV readers over files.

use std::{fs::File, io::BufReader, io::Read, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv"];

fn extension_in(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| set.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

pub fn is_spreadsheet(path: &Path) -> bool {
    extension_in(path, SPREADSHEET_EXTENSIONS)
}

/// Whether the file name carries an extension the loader can read.
pub fn has_tabular_extension(path: &Path) -> bool {
    is_spreadsheet(path) || extension_in(path, DELIMITED_EXTENSIONS)
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}
