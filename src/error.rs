use thiserror::Error;

use crate::table::SemanticType;

/// Findings the engine reports without recovering from. The run still
/// produces a result table; these tell the caller what to distrust.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemapError {
    /// The pre-substitution equality census and the applied count disagree.
    #[error(
        "column '{column}': replacement of '{old_value}' applied {actual} time(s), expected {expected}"
    )]
    SubstitutionMismatch {
        column: String,
        old_value: String,
        expected: usize,
        actual: usize,
    },

    /// A column holds two or more native value kinds after transformation.
    #[error("column '{column}': {message}")]
    InconsistentColumn { column: String, message: String },
}

/// Soft failures. The offending value survives in degraded form and the
/// warning says how.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemapWarning {
    /// A declared replacement value did not parse as its target type and was
    /// kept as text.
    #[error("could not coerce '{raw}' to {target}; keeping original text")]
    Coercion { raw: String, target: SemanticType },

    /// Cells that resisted a whole-column cast and became missing.
    #[error("column '{column}': {failed} cell(s) could not be cast to {target} and became missing")]
    Cast {
        column: String,
        target: SemanticType,
        failed: usize,
    },

    /// A mapping record carried an unrecognized data type label.
    #[error("mapping row {row}: unknown data type '{given}', treating as string")]
    UnknownDataType { row: usize, given: String },
}
