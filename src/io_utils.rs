//! CSV I/O for whole tables.
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs` labels, defaulting to
//!   UTF-8. Output is always UTF-8.
//! - **Type inference**: per-column candidate elimination over the raw fields
//!   (integer, float, boolean, timestamp; text as the fallback).
//! - **Quoting**: CSV output uses `QuoteStyle::Always` for round-trip safety.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::info;

use crate::data::{Value, parse_timestamp};
use crate::table::{Column, Dtype, Table};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

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

pub fn open_csv_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
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

/// Elimination-style column profile: a candidate survives only if every
/// non-blank field parses as it. Fallback is text.
#[derive(Debug, Clone, Default)]
struct TypeCandidate {
    non_empty: usize,
    integer_matches: usize,
    float_matches: usize,
    boolean_matches: usize,
    timestamp_matches: usize,
}

const BOOLEAN_TOKENS_TRUE: &[&str] = &["true", "t", "yes", "y"];
const BOOLEAN_TOKENS_FALSE: &[&str] = &["false", "f", "no", "n"];

impl TypeCandidate {
    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;
        if trimmed.parse::<i64>().is_ok() {
            self.integer_matches += 1;
        }
        if trimmed.parse::<f64>().is_ok() {
            self.float_matches += 1;
        }
        let lowered = trimmed.to_ascii_lowercase();
        if BOOLEAN_TOKENS_TRUE.contains(&lowered.as_str())
            || BOOLEAN_TOKENS_FALSE.contains(&lowered.as_str())
        {
            self.boolean_matches += 1;
        }
        if parse_timestamp(trimmed).is_ok() {
            self.timestamp_matches += 1;
        }
    }

    fn decide(&self) -> Dtype {
        if self.non_empty == 0 {
            return Dtype::Text;
        }
        if self.integer_matches == self.non_empty {
            Dtype::Integer
        } else if self.float_matches == self.non_empty {
            Dtype::Float
        } else if self.boolean_matches == self.non_empty {
            Dtype::Boolean
        } else if self.timestamp_matches == self.non_empty {
            Dtype::Timestamp
        } else {
            Dtype::Text
        }
    }
}

/// Parses one raw field for a column of the given storage type. Blank fields
/// (after trimming) are missing.
pub fn parse_cell(raw: &str, dtype: Dtype) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = match dtype {
        Dtype::Integer => {
            let value: i64 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as integer"))?;
            Value::Integer(value)
        }
        Dtype::Float => {
            let value: f64 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as float"))?;
            Value::Float(value)
        }
        Dtype::Boolean => {
            let lowered = trimmed.to_ascii_lowercase();
            if BOOLEAN_TOKENS_TRUE.contains(&lowered.as_str()) {
                Value::Boolean(true)
            } else if BOOLEAN_TOKENS_FALSE.contains(&lowered.as_str()) {
                Value::Boolean(false)
            } else {
                bail!("Failed to parse '{trimmed}' as boolean");
            }
        }
        Dtype::Timestamp => Value::Timestamp(parse_timestamp(trimmed)?),
        Dtype::Text | Dtype::Categorical | Dtype::Mixed => Value::Text(raw.to_string()),
    };
    Ok(Some(parsed))
}

pub fn read_table(path: &Path, encoding_label: Option<&str>) -> Result<Table> {
    let delimiter = resolve_input_delimiter(path, None);
    let encoding = resolve_encoding(encoding_label)?;
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let table = read_table_from_reader(BufReader::new(file), delimiter, encoding)?;
    info!(
        "Read table from {:?}: {} column(s), {} row(s)",
        path,
        table.column_count(),
        table.row_count()
    );
    Ok(table)
}

pub fn read_table_from_reader<R: Read>(
    input: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Table> {
    let mut reader = open_csv_reader(input, delimiter, true);
    let headers = reader_headers(&mut reader, encoding)?;

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let values = decode_record(&record, encoding)?;
        for (col, value) in values.into_iter().enumerate() {
            raw_columns[col].push(value);
        }
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (name, raw) in headers.into_iter().zip(raw_columns) {
        let mut candidate = TypeCandidate::default();
        for value in &raw {
            candidate.update(value);
        }
        let dtype = candidate.decide();
        let mut cells = Vec::with_capacity(raw.len());
        for (row, value) in raw.iter().enumerate() {
            let cell = parse_cell(value, dtype)
                .with_context(|| format!("Column '{name}', row {}", row + 2))?;
            cells.push(cell);
        }
        columns.push(Column::new(name, dtype, cells));
    }
    Table::from_columns(columns)
}

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    write_table_to_writer(table, BufWriter::new(file))?;
    info!("Wrote table: {} row(s) -> {:?}", table.row_count(), path);
    Ok(())
}

/// Writes UTF-8, comma-separated, header row first, no index column. Missing
/// cells become empty fields.
pub fn write_table_to_writer<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    let mut csv_writer = builder.from_writer(writer);

    csv_writer
        .write_record(table.column_names())
        .context("Writing header row")?;
    for row in 0..table.row_count() {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                column.cells[row]
                    .as_ref()
                    .map(Value::as_display)
                    .unwrap_or_default()
            })
            .collect();
        csv_writer
            .write_record(&record)
            .with_context(|| format!("Writing output row {}", row + 2))?;
    }
    csv_writer.flush().context("Flushing output writer")?;
    Ok(())
}
