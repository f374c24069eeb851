use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::Value;
use crate::table::{Column, SemanticType, Table};

/// Cap used by interactive pickers when listing a column's distinct values.
pub const DEFAULT_UNIQUE_LIMIT: usize = 100;

/// One row of the data-overview panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub semantic_type: SemanticType,
    pub distinct_count: usize,
    pub missing_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Summarizes every column: semantic type, distinct non-missing values,
/// missing cells. Read-only; column order preserved.
pub fn profile(table: &Table) -> TableProfile {
    let columns = table
        .columns
        .iter()
        .map(|column| ColumnProfile {
            name: column.name.clone(),
            semantic_type: column.semantic_type(),
            distinct_count: column
                .cells
                .iter()
                .flatten()
                .map(Value::as_display)
                .unique()
                .count(),
            missing_count: column.missing_count(),
        })
        .collect();
    TableProfile {
        row_count: table.row_count(),
        columns,
    }
}

/// Distinct non-missing display values in first-appearance order. A limit of
/// zero means uncapped.
pub fn unique_values(column: &Column, limit: usize) -> Vec<String> {
    let mut values: Vec<String> = column
        .cells
        .iter()
        .flatten()
        .map(Value::as_display)
        .unique()
        .collect();
    if limit > 0 && values.len() > limit {
        values.truncate(limit);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Dtype;

    fn sample() -> Table {
        Table {
            columns: vec![
                Column::new(
                    "pref",
                    Dtype::Integer,
                    vec![
                        Some(Value::Integer(13)),
                        Some(Value::Integer(14)),
                        Some(Value::Integer(13)),
                        None,
                    ],
                ),
                Column::new(
                    "memo",
                    Dtype::Text,
                    vec![
                        Some(Value::Text("a".into())),
                        None,
                        None,
                        Some(Value::Text("b".into())),
                    ],
                ),
            ],
        }
    }

    #[test]
    fn profile_counts_distinct_and_missing() {
        let summary = profile(&sample());
        assert_eq!(summary.row_count, 4);
        assert_eq!(
            summary.columns[0],
            ColumnProfile {
                name: "pref".into(),
                semantic_type: SemanticType::Int,
                distinct_count: 2,
                missing_count: 1,
            }
        );
        assert_eq!(summary.columns[1].semantic_type, SemanticType::String);
        assert_eq!(summary.columns[1].missing_count, 2);
    }

    #[test]
    fn unique_values_keep_first_appearance_order() {
        let table = sample();
        assert_eq!(unique_values(&table.columns[0], 0), vec!["13", "14"]);
        assert_eq!(unique_values(&table.columns[0], 1), vec!["13"]);
        assert_eq!(
            unique_values(&table.columns[0], DEFAULT_UNIQUE_LIMIT),
            vec!["13", "14"]
        );
    }
}
