use anyhow::{Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::coerce::coerce_or_keep;
use crate::data::Value;
use crate::error::RemapWarning;
use crate::pipeline::{self, RemapOutcome};
use crate::table::{SemanticType, Table};

/// A pending column rename. Renames accumulate in declaration order and are
/// applied together at the end of a pipeline run, each keyed by the column's
/// pre-rename name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

/// A pending cell replacement: in `column`, cells equal to `old_value` under
/// type-aware comparison become `new_value`. The rule also declares the
/// column's target type; within one column the last declared rule wins the
/// column-wide cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChangeRule {
    pub column: String,
    pub old_value: String,
    pub new_value: Value,
    pub target_type: SemanticType,
}

/// One pre-parsed row of a declarative mapping table. Blank fields are empty
/// strings; the spreadsheet parser upstream owns NA handling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub col_original: String,
    pub col_new: String,
    pub data_type: String,
    pub original_value: String,
    pub new_value: String,
}

/// Accumulated per-session state: the loaded table, the declared
/// transformations, and the most recent result. Single-threaded by design;
/// every mutation goes through `&mut self`, so a pipeline run borrowing the
/// state immutably always sees a settled snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub original: Option<Table>,
    pub renames: Vec<ColumnRename>,
    pub value_rules: Vec<ValueChangeRule>,
    pub result: Option<Table>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    /// Replaces the loaded table. Declared renames and value rules survive a
    /// reload; only `reset` clears them.
    pub fn load_table(&mut self, table: Table) {
        info!(
            "Loaded table: {} column(s), {} row(s)",
            table.column_count(),
            table.row_count()
        );
        self.original = Some(table);
    }

    /// Declares a rename. Re-declaring a source column overwrites the pending
    /// target in place, keeping the original declaration position.
    pub fn add_rename(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let rename = ColumnRename {
            from: from.into(),
            to: to.into(),
        };
        match self.renames.iter_mut().find(|r| r.from == rename.from) {
            Some(existing) => {
                debug!(
                    "Rename for '{}' updated: '{}' -> '{}'",
                    rename.from, existing.to, rename.to
                );
                existing.to = rename.to;
            }
            None => self.renames.push(rename),
        }
    }

    /// Declares a value replacement. The new value is interpreted as
    /// `target_type` immediately; a failed interpretation keeps the text and
    /// returns the warning. Re-declaring a `(column, old_value)` pair
    /// overwrites in place, keeping the original declaration position.
    pub fn add_value_rule(
        &mut self,
        column: impl Into<String>,
        old_value: impl Into<String>,
        new_value: &str,
        target_type: SemanticType,
    ) -> Option<RemapWarning> {
        let (value, warning) = coerce_or_keep(new_value, target_type);
        let rule = ValueChangeRule {
            column: column.into(),
            old_value: old_value.into(),
            new_value: value,
            target_type,
        };
        match self
            .value_rules
            .iter_mut()
            .find(|r| r.column == rule.column && r.old_value == rule.old_value)
        {
            Some(existing) => {
                debug!(
                    "Rule for '{}' = '{}' updated in place",
                    rule.column, rule.old_value
                );
                *existing = rule;
            }
            None => self.value_rules.push(rule),
        }
        warning
    }

    /// Clears renames, value rules and the result together. The loaded table
    /// survives.
    pub fn reset(&mut self) {
        info!(
            "Reset session: cleared {} rename(s) and {} value rule(s)",
            self.renames.len(),
            self.value_rules.len()
        );
        self.renames.clear();
        self.value_rules.clear();
        self.result = None;
    }

    /// Translates a declarative mapping table into the same rename and rule
    /// shapes the interactive path accumulates. Returns the soft failures
    /// encountered; rows with exactly one of the two values filled are
    /// skipped.
    pub fn apply_mapping_records(&mut self, records: &[MappingRecord]) -> Vec<RemapWarning> {
        let mut warnings = Vec::new();
        let mut rename_count = 0usize;
        let mut rule_count = 0usize;

        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let col_original = record.col_original.trim();
            let col_new = record.col_new.trim();

            if !col_original.is_empty() && !col_new.is_empty() && col_original != col_new {
                self.add_rename(col_original, col_new);
                rename_count += 1;
            }

            let old_value = record.original_value.trim();
            let new_value = record.new_value.trim();
            match (old_value.is_empty(), new_value.is_empty()) {
                (true, true) => continue,
                (false, false) => {}
                _ => {
                    debug!("Mapping row {row}: only one value present, skipped");
                    continue;
                }
            }

            let rule_column = if !col_new.is_empty() {
                col_new
            } else {
                col_original
            };
            if rule_column.is_empty() {
                debug!("Mapping row {row}: no column name, skipped");
                continue;
            }

            let data_type = record.data_type.trim();
            let target_type = if data_type.is_empty() {
                SemanticType::String
            } else {
                match data_type.parse::<SemanticType>() {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        warnings.push(RemapWarning::UnknownDataType {
                            row,
                            given: data_type.to_string(),
                        });
                        SemanticType::String
                    }
                }
            };

            if let Some(warning) = self.add_value_rule(rule_column, old_value, new_value, target_type)
            {
                warnings.push(warning);
            }
            rule_count += 1;
        }

        info!(
            "Mapping table: {} record(s) -> {} rename(s), {} value rule(s)",
            records.len(),
            rename_count,
            rule_count
        );
        warnings
    }

    /// Runs the pipeline against the loaded table with the current
    /// declarations, stores the fresh result in place of any prior one, and
    /// returns the full outcome.
    pub fn execute(&mut self) -> Result<RemapOutcome> {
        let Some(original) = self.original.as_ref() else {
            bail!("No table loaded");
        };
        let outcome = pipeline::run(original, self);
        self.result = Some(outcome.result.clone());
        Ok(outcome)
    }
}
