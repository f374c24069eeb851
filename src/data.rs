use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single cell value in its native storage representation. Missing cells
/// are modelled as `None` at the column level, so every `Value` is a present,
/// typed datum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Text(String),
}

/// Runtime tag of a [`Value`] variant, used for type-drift detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    Boolean,
    Timestamp,
    Text,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                // Whole floats keep a decimal point so a re-parse stays float.
                if f.is_finite() && f.fract() == 0.0 {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Integer parse that also accepts fractional literals such as `"3.0"`,
/// truncating toward zero.
pub fn parse_integer_lenient(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    let as_float: f64 = trimmed.parse().ok()?;
    as_float.is_finite().then(|| as_float.trunc() as i64)
}

pub fn parse_float_lenient(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const FALLBACK_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y%m%d", "%d.%m.%Y"];

/// Parses a timestamp by trying the fixed pattern list in declaration order;
/// date-only patterns resolve to midnight. Falls back to a permissive battery
/// of common layouts before giving up.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(midnight(parsed));
        }
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
        return Ok(parsed);
    }
    parse_timestamp_permissive(trimmed)
}

fn parse_timestamp_permissive(value: &str) -> Result<NaiveDateTime> {
    for fmt in FALLBACK_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(midnight(parsed));
        }
    }
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_supports_fixed_formats_in_order() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let expected = date.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-02-01").unwrap(), expected);
        assert_eq!(parse_timestamp("2024/02/01").unwrap(), expected);
        // Day-first layouts win over month-first for ambiguous input.
        assert_eq!(parse_timestamp("01-02-2024").unwrap(), expected);
        assert_eq!(parse_timestamp("01/02/2024").unwrap(), expected);

        let with_time = date.and_hms_opt(9, 30, 15).unwrap();
        assert_eq!(parse_timestamp("2024-02-01 09:30:15").unwrap(), with_time);
    }

    #[test]
    fn parse_timestamp_falls_back_to_permissive_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(9, 30, 15)
            .unwrap();
        assert_eq!(parse_timestamp("2024-02-01T09:30:15").unwrap(), expected);
        assert_eq!(
            parse_timestamp("20240201").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert!(parse_timestamp("not a date").is_err());
    }

    #[test]
    fn integer_parse_accepts_fractional_literals() {
        assert_eq!(parse_integer_lenient("13"), Some(13));
        assert_eq!(parse_integer_lenient("3.0"), Some(3));
        assert_eq!(parse_integer_lenient("3.9"), Some(3));
        assert_eq!(parse_integer_lenient("-2.5"), Some(-2));
        assert_eq!(parse_integer_lenient("abc"), None);
    }

    #[test]
    fn whole_floats_keep_their_decimal_point() {
        assert_eq!(Value::Float(3.0).as_display(), "3.0");
        assert_eq!(Value::Float(3.25).as_display(), "3.25");
        assert_eq!(Value::Integer(3).as_display(), "3");
    }

    #[test]
    fn value_kinds_match_variants() {
        assert_eq!(Value::Integer(1).kind(), ValueKind::Integer);
        assert_eq!(Value::Text("a".into()).kind(), ValueKind::Text);
        assert_eq!(ValueKind::Timestamp.as_str(), "timestamp");
    }
}
