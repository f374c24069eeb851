use std::collections::BTreeSet;

use log::{debug, warn};

use crate::coerce::is_truthy;
use crate::data::{Value, parse_float_lenient, parse_integer_lenient, parse_timestamp};
use crate::error::RemapWarning;
use crate::rules::{ColumnRename, ValueChangeRule};
use crate::substitute::resolve_column;
use crate::table::{SemanticType, Table};

/// A whole-column cast request.
#[derive(Debug, Clone, PartialEq)]
pub struct CastTarget {
    pub column: String,
    pub target: SemanticType,
}

/// Collapses the value rules into one cast per storage column. Rules may
/// address the same column by its current name and by its pending rename, so
/// collapsing keys off the resolved column, not the spelling; rules naming
/// absent columns collapse by name and are skipped at cast time. Columns keep
/// the position of their first rule; the last declared rule wins the target.
pub fn derive_cast_targets(
    table: &Table,
    rules: &[ValueChangeRule],
    renames: &[ColumnRename],
) -> Vec<CastTarget> {
    let mut targets: Vec<(Option<usize>, CastTarget)> = Vec::new();
    for rule in rules {
        let resolved = resolve_column(table, renames, &rule.column);
        let found = targets.iter().position(|(idx, entry)| {
            if resolved.is_none() && idx.is_none() {
                entry.column == rule.column
            } else {
                *idx == resolved
            }
        });
        match found {
            Some(at) => targets[at].1.target = rule.target_type,
            None => targets.push((
                resolved,
                CastTarget {
                    column: rule.column.clone(),
                    target: rule.target_type,
                },
            )),
        }
    }
    targets.into_iter().map(|(_, entry)| entry).collect()
}

fn cast_cell(value: &Value, target: SemanticType) -> Option<Value> {
    match target {
        SemanticType::Int => match value {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::Float(f) => f.is_finite().then(|| Value::Integer(f.trunc() as i64)),
            Value::Boolean(b) => Some(Value::Integer(i64::from(*b))),
            Value::Text(s) => parse_integer_lenient(s).map(Value::Integer),
            Value::Timestamp(_) => None,
        },
        SemanticType::Float => match value {
            Value::Integer(i) => Some(Value::Float(*i as f64)),
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Boolean(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::Text(s) => parse_float_lenient(s).map(Value::Float),
            Value::Timestamp(_) => None,
        },
        SemanticType::Bool => Some(Value::Boolean(is_truthy(&value.as_display()))),
        SemanticType::Date => match value {
            Value::Timestamp(ts) => Some(Value::Timestamp(*ts)),
            Value::Text(s) => parse_timestamp(s).ok().map(Value::Timestamp),
            _ => None,
        },
        SemanticType::Factor | SemanticType::String | SemanticType::Object => {
            Some(Value::Text(value.as_display()))
        }
    }
}

/// Casts each targeted column to its declared type. Missing cells stay
/// missing under every target; cells that resist the cast become missing and
/// are counted in a per-column warning. Factor casts additionally record the
/// sorted label set.
pub fn cast_columns(
    table: &mut Table,
    targets: &[CastTarget],
    renames: &[ColumnRename],
) -> Vec<RemapWarning> {
    let mut warnings = Vec::new();

    for request in targets {
        let Some(idx) = resolve_column(table, renames, &request.column) else {
            debug!("Cast for absent column '{}' skipped", request.column);
            continue;
        };
        let column = &mut table.columns[idx];

        let mut failed = 0usize;
        for cell in &mut column.cells {
            let Some(value) = cell.as_ref() else {
                continue;
            };
            match cast_cell(value, request.target) {
                Some(next) => *cell = Some(next),
                None => {
                    *cell = None;
                    failed += 1;
                }
            }
        }

        column.dtype = request.target.storage_dtype();
        column.levels = (request.target == SemanticType::Factor).then(|| {
            column
                .cells
                .iter()
                .flatten()
                .map(Value::as_display)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        });

        debug!(
            "Cast '{}' to {}: {} cell(s) degraded",
            request.column, request.target, failed
        );
        if failed > 0 {
            let warning = RemapWarning::Cast {
                column: request.column.clone(),
                target: request.target,
                failed,
            };
            warn!("{warning}");
            warnings.push(warning);
        }
    }
    warnings
}
