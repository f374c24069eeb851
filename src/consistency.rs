use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Verdict for one column: whether its non-missing cells share a single
/// native kind, and if not, which kinds were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConsistency {
    pub column: String,
    pub consistent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub columns: Vec<ColumnConsistency>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.columns.iter().all(|column| column.consistent)
    }
}

/// Counts the native kinds per column over non-missing cells. A column with
/// two or more kinds is flagged; a column with no values at all is trivially
/// consistent. Read-only.
pub fn check(table: &Table) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();
    for column in &table.columns {
        let census = column.kind_census();
        let verdict = if census.len() >= 2 {
            let message = format!(
                "mixed value types: {}",
                census
                    .iter()
                    .map(|(kind, count)| format!("{kind} ({count})"))
                    .join(", ")
            );
            warn!("Column '{}': {}", column.name, message);
            ColumnConsistency {
                column: column.name.clone(),
                consistent: false,
                message: Some(message),
            }
        } else {
            ColumnConsistency {
                column: column.name.clone(),
                consistent: true,
                message: None,
            }
        };
        report.columns.push(verdict);
    }

    let flagged = report.columns.iter().filter(|c| !c.consistent).count();
    info!(
        "Consistency check: {} of {} column(s) flagged",
        flagged,
        report.columns.len()
    );
    report
}
