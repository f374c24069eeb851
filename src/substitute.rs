use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::{Value, parse_float_lenient, parse_integer_lenient};
use crate::error::RemapError;
use crate::rules::{ColumnRename, ValueChangeRule};
use crate::table::{Dtype, Table};

/// One applied replacement: which cells of `column` equal to `old_value`
/// became `new_value`, and how many matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionLogEntry {
    pub column: String,
    pub old_value: String,
    pub new_value: Value,
    pub matched_count: usize,
}

/// How a rule's old-value key compares against stored cells. Numeric columns
/// re-parse the key to the column's native numeric type; everything else,
/// and keys that fail the re-parse, compare display strings.
enum OldValueKey<'a> {
    Integer(i64),
    Float(f64),
    Display(&'a str),
}

impl<'a> OldValueKey<'a> {
    fn resolve(dtype: Dtype, old_value: &'a str) -> Self {
        match dtype {
            Dtype::Integer => match parse_integer_lenient(old_value) {
                Some(key) => OldValueKey::Integer(key),
                None => OldValueKey::Display(old_value),
            },
            Dtype::Float => match parse_float_lenient(old_value) {
                Some(key) => OldValueKey::Float(key),
                None => OldValueKey::Display(old_value),
            },
            _ => OldValueKey::Display(old_value),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            OldValueKey::Integer(key) => matches!(value, Value::Integer(i) if i == key),
            OldValueKey::Float(key) => matches!(value, Value::Float(f) if f == key),
            OldValueKey::Display(key) => value.as_display() == *key,
        }
    }
}

/// Finds the storage column a rule addresses. A rule may name a column by its
/// current name or by its pending rename target, since mapping tables key
/// rules off the new name while renames only apply at the end of the run.
pub(crate) fn resolve_column(table: &Table, renames: &[ColumnRename], name: &str) -> Option<usize> {
    if let Some(idx) = table.column_index(name) {
        return Some(idx);
    }
    renames
        .iter()
        .find(|rename| rename.to == name)
        .and_then(|rename| table.column_index(&rename.from))
}

/// Applies the value rules in declaration order; later rules see earlier
/// rules' effects. Each application produces a log entry; a disagreement
/// between the plain-equality census and the type-aware application count is
/// reported as a mismatch error. Rules naming absent columns are skipped
/// without a log entry. Missing cells never match.
pub fn substitute(
    table: &mut Table,
    rules: &[ValueChangeRule],
    renames: &[ColumnRename],
) -> (Vec<ConversionLogEntry>, Vec<RemapError>) {
    let mut log = Vec::new();
    let mut errors = Vec::new();
    let mut replaced_total = 0usize;

    for rule in rules {
        let Some(idx) = resolve_column(table, renames, &rule.column) else {
            debug!("Rule for absent column '{}' skipped", rule.column);
            continue;
        };
        let column = &mut table.columns[idx];

        let expected = column
            .cells
            .iter()
            .flatten()
            .filter(|value| value.as_display() == rule.old_value)
            .count();

        let key = OldValueKey::resolve(column.dtype, &rule.old_value);
        let mut applied = 0usize;
        for cell in &mut column.cells {
            if let Some(value) = cell
                && key.matches(value)
            {
                *cell = Some(rule.new_value.clone());
                applied += 1;
            }
        }
        // Later rules compare against what is stored now, not the load-time type.
        column.recompute_dtype();

        debug!(
            "Rule '{}' ('{}' -> '{}'): {} match(es)",
            rule.column, rule.old_value, rule.new_value, applied
        );
        if expected != applied {
            errors.push(RemapError::SubstitutionMismatch {
                column: rule.column.clone(),
                old_value: rule.old_value.clone(),
                expected,
                actual: applied,
            });
        }
        replaced_total += applied;
        log.push(ConversionLogEntry {
            column: rule.column.clone(),
            old_value: rule.old_value.clone(),
            new_value: rule.new_value.clone(),
            matched_count: applied,
        });
    }

    info!(
        "Applied {} value rule(s): {} cell(s) replaced across {} row(s)",
        rules.len(),
        replaced_total,
        table.row_count()
    );
    (log, errors)
}
