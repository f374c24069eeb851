use log::{debug, info};

use crate::cast::{cast_columns, derive_cast_targets};
use crate::consistency::{self, ConsistencyReport};
use crate::error::{RemapError, RemapWarning};
use crate::rules::SessionState;
use crate::substitute::{self, ConversionLogEntry};
use crate::table::Table;

/// Everything one pipeline run produces. The result table is always present,
/// errors or not; `errors` says what to distrust about it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapOutcome {
    pub result: Table,
    pub log: Vec<ConversionLogEntry>,
    pub errors: Vec<RemapError>,
    pub warnings: Vec<RemapWarning>,
    pub consistency: ConsistencyReport,
}

impl RemapOutcome {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Runs the four stages in order: substitute values, cast declared columns,
/// rename, check consistency. No stage branches back; renames touch column
/// identifiers only and come last, after all cell-level work.
pub fn run(original: &Table, state: &SessionState) -> RemapOutcome {
    info!(
        "Pipeline start: {} column(s), {} row(s), {} value rule(s), {} rename(s)",
        original.column_count(),
        original.row_count(),
        state.value_rules.len(),
        state.renames.len()
    );
    let mut result = original.clone();

    let (log, mut errors) = substitute::substitute(&mut result, &state.value_rules, &state.renames);

    let targets = derive_cast_targets(&result, &state.value_rules, &state.renames);
    let warnings = cast_columns(&mut result, &targets, &state.renames);

    // Rename sources key off pre-rename names: resolve them all before
    // assigning, so a chain never cascades through a just-renamed column.
    let pending: Vec<(usize, &str)> = state
        .renames
        .iter()
        .filter_map(|rename| match result.column_index(&rename.from) {
            Some(idx) => Some((idx, rename.to.as_str())),
            None => {
                debug!("Rename source '{}' not present, skipped", rename.from);
                None
            }
        })
        .collect();
    for (idx, to) in pending {
        result.columns[idx].name = to.to_string();
    }

    let consistency = consistency::check(&result);
    errors.extend(
        consistency
            .columns
            .iter()
            .filter(|column| !column.consistent)
            .map(|column| RemapError::InconsistentColumn {
                column: column.column.clone(),
                message: column.message.clone().unwrap_or_default(),
            }),
    );

    info!(
        "Pipeline complete: {} error(s), {} warning(s)",
        errors.len(),
        warnings.len()
    );
    RemapOutcome {
        result,
        log,
        errors,
        warnings,
        consistency,
    }
}
