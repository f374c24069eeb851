use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::{Value, ValueKind};

/// Declared target type for a column, as written in interactive declarations
/// and mapping tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Int,
    Float,
    Bool,
    Date,
    Factor,
    String,
    Object,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Int => "int",
            SemanticType::Float => "float",
            SemanticType::Bool => "bool",
            SemanticType::Date => "date",
            SemanticType::Factor => "factor",
            SemanticType::String => "string",
            SemanticType::Object => "object",
        }
    }

    pub fn variants() -> &'static [SemanticType] {
        &[
            SemanticType::Int,
            SemanticType::Float,
            SemanticType::Bool,
            SemanticType::Date,
            SemanticType::Factor,
            SemanticType::String,
            SemanticType::Object,
        ]
    }

    /// The storage type a whole-column cast to this target produces.
    pub fn storage_dtype(&self) -> Dtype {
        match self {
            SemanticType::Int => Dtype::Integer,
            SemanticType::Float => Dtype::Float,
            SemanticType::Bool => Dtype::Boolean,
            SemanticType::Date => Dtype::Timestamp,
            SemanticType::Factor => Dtype::Categorical,
            SemanticType::String | SemanticType::Object => Dtype::Text,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let ty = match value.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int64" => SemanticType::Int,
            "float" | "float64" | "double" | "number" => SemanticType::Float,
            "bool" | "boolean" => SemanticType::Bool,
            "date" | "datetime" | "timestamp" => SemanticType::Date,
            "factor" | "category" | "categorical" => SemanticType::Factor,
            "string" | "str" | "text" => SemanticType::String,
            "object" | "obj" => SemanticType::Object,
            _ => bail!("Unknown data type: {value}"),
        };
        Ok(ty)
    }
}

/// Storage type of a column. `Mixed` is the transient state a column degrades
/// to when substitution leaves heterogeneous native kinds behind; the
/// consistency checker exists to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Integer,
    Float,
    Boolean,
    Timestamp,
    Text,
    Categorical,
    Mixed,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Integer => "integer",
            Dtype::Float => "float",
            Dtype::Boolean => "boolean",
            Dtype::Timestamp => "timestamp",
            Dtype::Text => "text",
            Dtype::Categorical => "categorical",
            Dtype::Mixed => "mixed",
        }
    }

    /// Collapses the storage type to the tag set the UI works with.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Dtype::Integer => SemanticType::Int,
            Dtype::Float => SemanticType::Float,
            Dtype::Boolean => SemanticType::Bool,
            Dtype::Timestamp => SemanticType::Date,
            Dtype::Categorical => SemanticType::Factor,
            Dtype::Text => SemanticType::String,
            Dtype::Mixed => SemanticType::Object,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ValueKind> for Dtype {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => Dtype::Integer,
            ValueKind::Float => Dtype::Float,
            ValueKind::Boolean => Dtype::Boolean,
            ValueKind::Timestamp => Dtype::Timestamp,
            ValueKind::Text => Dtype::Text,
        }
    }
}

/// One named column: its storage type and cells in row order. `None` cells
/// are missing. Categorical columns also carry their sorted label set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: Dtype,
    pub cells: Vec<Option<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: Dtype, cells: Vec<Option<Value>>) -> Self {
        Column {
            name: name.into(),
            dtype,
            cells,
            levels: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.dtype.semantic_type()
    }

    /// Counts the native kinds present among non-missing cells, in kind order.
    pub fn kind_census(&self) -> BTreeMap<ValueKind, usize> {
        let mut census = BTreeMap::new();
        for value in self.cells.iter().flatten() {
            *census.entry(value.kind()).or_insert(0usize) += 1;
        }
        census
    }

    /// Re-derives the storage type from the kinds actually stored. An
    /// all-missing column keeps its declared type. Categorical tagging is not
    /// re-derived here; the cast stage owns it.
    pub fn recompute_dtype(&mut self) {
        let kinds: BTreeSet<ValueKind> = self
            .cells
            .iter()
            .flatten()
            .map(|value| value.kind())
            .collect();
        let mut iter = kinds.into_iter();
        let next = match (iter.next(), iter.next()) {
            (None, _) => self.dtype,
            (Some(kind), None) => Dtype::from(kind),
            (Some(_), Some(_)) => Dtype::Mixed,
        };
        self.dtype = next;
        if self.dtype != Dtype::Categorical {
            self.levels = None;
        }
    }
}

/// Ordered collection of equally long columns. Column order and row order are
/// load order and are never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for column in &columns {
                if column.len() != expected {
                    bail!(
                        "Column '{}' has {} row(s), expected {}",
                        column.name,
                        column.len(),
                        expected
                    );
                }
            }
        }
        Ok(Table { columns })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_column(name: &str, values: &[Option<i64>]) -> Column {
        Column::new(
            name,
            Dtype::Integer,
            values.iter().map(|v| v.map(Value::Integer)).collect(),
        )
    }

    #[test]
    fn semantic_type_parses_common_aliases() {
        assert_eq!(
            "integer".parse::<SemanticType>().unwrap(),
            SemanticType::Int
        );
        assert_eq!(
            "category".parse::<SemanticType>().unwrap(),
            SemanticType::Factor
        );
        assert_eq!(
            "datetime".parse::<SemanticType>().unwrap(),
            SemanticType::Date
        );
        assert_eq!("STR".parse::<SemanticType>().unwrap(), SemanticType::String);
        assert!("vector".parse::<SemanticType>().is_err());
    }

    #[test]
    fn every_dtype_collapses_to_exactly_one_semantic_type() {
        let expectations = [
            (Dtype::Integer, SemanticType::Int),
            (Dtype::Float, SemanticType::Float),
            (Dtype::Boolean, SemanticType::Bool),
            (Dtype::Timestamp, SemanticType::Date),
            (Dtype::Text, SemanticType::String),
            (Dtype::Categorical, SemanticType::Factor),
            (Dtype::Mixed, SemanticType::Object),
        ];
        for (dtype, expected) in expectations {
            assert_eq!(dtype.semantic_type(), expected);
        }
    }

    #[test]
    fn recompute_dtype_tracks_stored_kinds() {
        let mut column = int_column("age", &[Some(1), Some(2), None]);
        column.recompute_dtype();
        assert_eq!(column.dtype, Dtype::Integer);

        column.cells[1] = Some(Value::Text("unknown".into()));
        column.recompute_dtype();
        assert_eq!(column.dtype, Dtype::Mixed);

        let mut empty = Column::new("memo", Dtype::Text, vec![None, None]);
        empty.recompute_dtype();
        assert_eq!(empty.dtype, Dtype::Text);
    }

    #[test]
    fn recompute_dtype_drops_stale_factor_levels() {
        let mut column = Column::new(
            "grade",
            Dtype::Categorical,
            vec![Some(Value::Text("a".into())), Some(Value::Integer(2))],
        );
        column.levels = Some(vec!["a".into(), "b".into()]);
        column.recompute_dtype();
        assert_eq!(column.dtype, Dtype::Mixed);
        assert_eq!(column.levels, None);
    }

    #[test]
    fn from_columns_rejects_ragged_input() {
        let ragged = vec![
            int_column("a", &[Some(1), Some(2)]),
            int_column("b", &[Some(3)]),
        ];
        assert!(Table::from_columns(ragged).is_err());

        let table = Table::from_columns(vec![int_column("a", &[Some(1), None])]).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["a"]);
    }
}
