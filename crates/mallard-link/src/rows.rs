//! Row materialization.
//!
//! Turns the structured values extracted from the console output into
//! fixed-arity row sets. Column order comes from the first object observed
//! for a statement and is preserved; every row is coerced to that arity.
//! A per-column type vector is recorded separately from the cells so
//! callers never have to re-infer types row by row.

use crate::error::{LinkError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A single cell decoded from a structured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Nested objects and arrays are kept as raw JSON.
    Nested(JsonValue),
}

impl CellValue {
    fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => CellValue::Text(s),
            nested => CellValue::Nested(nested),
        }
    }

    fn cell_type(&self) -> Option<CellType> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(_) => Some(CellType::Bool),
            CellValue::Int(_) => Some(CellType::Int),
            CellValue::Float(_) => Some(CellType::Float),
            CellValue::Text(_) => Some(CellType::Text),
            CellValue::Nested(_) => Some(CellType::Nested),
        }
    }
}

/// Column type, inferred from the first non-null cell in the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    Bool,
    Int,
    Float,
    Text,
    Nested,
    /// Every cell in the column was null.
    Unknown,
}

/// An ordered, fixed-arity result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names in the order the first row declared them.
    pub columns: Vec<String>,
    /// Per-column types, parallel to `columns`.
    pub types: Vec<CellType>,
    /// Rows, each coerced to `columns.len()` cells.
    pub rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    /// A result set with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            types: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Materialize a row set from one extracted structured value.
    ///
    /// The console emits each statement's result as a JSON array of
    /// objects. Column order is taken from the first object; rows missing
    /// a column get `Null`, keys not present in the first object are
    /// dropped.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let items = match value {
            JsonValue::Array(items) => items,
            other => {
                return Err(LinkError::Serialization(format!(
                    "expected a top-level array of rows, got {other}"
                )))
            },
        };

        let mut rows_iter = items.into_iter();
        let Some(first) = rows_iter.next() else {
            return Ok(Self::empty());
        };

        let first_obj = as_row_object(first)?;
        let columns: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        rows.push(object_to_row(&columns, first_obj));
        for item in rows_iter {
            rows.push(object_to_row(&columns, as_row_object(item)?));
        }

        let types = infer_types(&columns, &rows);
        Ok(Self {
            columns,
            types,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Get a row as a name-to-cell map (for convenience).
    pub fn row_as_map(&self, row_idx: usize) -> Option<HashMap<String, CellValue>> {
        let row = self.rows.get(row_idx)?;
        let mut map = HashMap::with_capacity(self.columns.len());
        for (name, cell) in self.columns.iter().zip(row) {
            map.insert(name.clone(), cell.clone());
        }
        Some(map)
    }
}

fn as_row_object(value: JsonValue) -> Result<serde_json::Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(LinkError::Serialization(format!(
            "expected a row object, got {other}"
        ))),
    }
}

fn object_to_row(columns: &[String], mut obj: serde_json::Map<String, JsonValue>) -> Vec<CellValue> {
    columns
        .iter()
        .map(|name| match obj.remove(name) {
            Some(value) => CellValue::from_json(value),
            None => CellValue::Null,
        })
        .collect()
}

fn infer_types(columns: &[String], rows: &[Vec<CellValue>]) -> Vec<CellType> {
    (0..columns.len())
        .map(|col| {
            rows.iter()
                .find_map(|row| row.get(col).and_then(CellValue::cell_type))
                .unwrap_or(CellType::Unknown)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CellType, CellValue, RowSet};
    use serde_json::json;

    #[test]
    fn materializes_rows_in_column_order() {
        let rs = RowSet::from_value(json!([
            {"z": 1, "a": "x"},
            {"z": 2, "a": "y"},
        ]))
        .unwrap();
        // Column order follows the first object, not lexical order.
        assert_eq!(rs.columns, vec!["z", "a"]);
        assert_eq!(rs.types, vec![CellType::Int, CellType::Text]);
        assert_eq!(rs.rows.len(), 2);
        assert_eq!(rs.rows[1], vec![CellValue::Int(2), CellValue::Text("y".into())]);
    }

    #[test]
    fn missing_keys_become_null() {
        let rs = RowSet::from_value(json!([
            {"a": 1, "b": 2},
            {"a": 3},
        ]))
        .unwrap();
        assert_eq!(rs.rows[1], vec![CellValue::Int(3), CellValue::Null]);
    }

    #[test]
    fn empty_array_is_empty_rowset() {
        let rs = RowSet::from_value(json!([])).unwrap();
        assert!(rs.is_empty());
        assert!(rs.columns.is_empty());
    }

    #[test]
    fn type_inference_skips_leading_nulls() {
        let rs = RowSet::from_value(json!([
            {"a": null},
            {"a": 1.5},
        ]))
        .unwrap();
        assert_eq!(rs.types, vec![CellType::Float]);
    }

    #[test]
    fn all_null_column_is_unknown_type() {
        let rs = RowSet::from_value(json!([{"a": null}])).unwrap();
        assert_eq!(rs.types, vec![CellType::Unknown]);
    }

    #[test]
    fn nested_values_stay_raw_json() {
        let rs = RowSet::from_value(json!([{"a": {"k": [1, 2]}}])).unwrap();
        assert_eq!(rs.types, vec![CellType::Nested]);
        assert_eq!(rs.rows[0][0], CellValue::Nested(json!({"k": [1, 2]})));
    }

    #[test]
    fn non_array_value_is_rejected() {
        assert!(RowSet::from_value(json!({"a": 1})).is_err());
        assert!(RowSet::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn row_as_map_round_trip() {
        let rs = RowSet::from_value(json!([{"a": 1, "b": "x"}])).unwrap();
        let map = rs.row_as_map(0).unwrap();
        assert_eq!(map["a"], CellValue::Int(1));
        assert_eq!(map["b"], CellValue::Text("x".into()));
        assert!(rs.row_as_map(1).is_none());
    }
}
