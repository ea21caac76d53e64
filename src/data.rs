use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Identifier cell decoded from a source table.
///
/// Integral text becomes [`Key::Integer`] so that `7` and `007` match, every
/// other non-empty value is kept verbatim as [`Key::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    Integer(i64),
    Text(String),
}

impl Key {
    pub fn parse(raw: &str) -> Option<Key> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(value) => Some(Key::Integer(value)),
            Err(_) => Some(Key::Text(trimmed.to_string())),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Key::Integer(_) => KeyType::Integer,
            Key::Text(_) => KeyType::Text,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(value) => write!(f, "{value}"),
            Key::Text(value) => f.write_str(value),
        }
    }
}

/// Observed type of a key column across all of its non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Integer,
    Text,
    Mixed,
}

impl KeyType {
    /// Folds the keys of one column into a single type. `None` when the
    /// column holds no keys at all.
    pub fn of_column<'a, I>(keys: I) -> Option<KeyType>
    where
        I: IntoIterator<Item = &'a Key>,
    {
        keys.into_iter()
            .map(Key::key_type)
            .reduce(|acc, next| if acc == next { acc } else { KeyType::Mixed })
    }

    /// Integer-only against text-only is the one pairing that can never match.
    pub fn compatible_with(self, other: KeyType) -> bool {
        !matches!(
            (self, other),
            (KeyType::Integer, KeyType::Text) | (KeyType::Text, KeyType::Integer)
        )
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            KeyType::Integer => "integer",
            KeyType::Text => "text",
            KeyType::Mixed => "mixed",
        };
        f.write_str(label)
    }
}

/// Per-row outcome of parsing a date column. Invalid values are kept with
/// the reason so they can be counted instead of silently disappearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    Parsed(NaiveDate),
    Missing,
    Invalid { raw: String, reason: String },
}

impl DateCell {
    pub fn parse(raw: &str) -> DateCell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return DateCell::Missing;
        }
        match parse_naive_date(trimmed) {
            Ok(date) => DateCell::Parsed(date),
            Err(err) => DateCell::Invalid {
                raw: trimmed.to_string(),
                reason: err.to_string(),
            },
        }
    }

    pub fn value(&self) -> Option<NaiveDate> {
        match self {
            DateCell::Parsed(date) => Some(*date),
            _ => None,
        }
    }
}

/// Parses a calendar date, accepting date-time text by dropping the time part.
pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed.date());
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

/// Parses a monetary or quantity cell into an exact decimal.
///
/// Accepts an optional sign, a leading `$`, `,` thousands separators and
/// scientific notation.
pub fn parse_decimal(value: &str) -> Result<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("Value is empty");
    }
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let unsigned = unsigned.strip_prefix('$').unwrap_or(unsigned).trim_start();
    let cleaned = unsigned.replace(',', "");
    let parsed = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| anyhow!("Failed to parse '{value}' as number"))?;
    Ok(if negative { -parsed } else { parsed })
}

/// Canonical header form: surrounding whitespace removed, lowercased.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Maps an empty or whitespace-only cell to `None`.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
