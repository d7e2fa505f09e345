//! SQL literal encoding for bound parameter values.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// A parameter value with a fixed encoding into SQL literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Encode the value as a SQL literal.
    ///
    /// Text is single-quoted with embedded quotes doubled; date/time values
    /// are ISO-8601 inside single quotes; numerics print verbatim; lists are
    /// bracketed with recursively encoded elements.
    pub fn encode(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            SqlValue::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
            SqlValue::List(items) => {
                let encoded: Vec<String> = items.iter().map(SqlValue::encode).collect();
                format!("[{}]", encoded.join(", "))
            },
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(v: Vec<T>) -> Self {
        SqlValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}

/// The parameter set supplied with a statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlParams {
    /// No parameters; any placeholder in the statement is an error.
    #[default]
    None,
    /// Values for `?` (left-to-right) or `$n` (1-based) placeholders.
    Positional(Vec<SqlValue>),
    /// Values for `:name` placeholders.
    Named(HashMap<String, SqlValue>),
}

impl SqlParams {
    /// Build a positional parameter list.
    pub fn positional<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SqlValue>,
    {
        SqlParams::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Build a named parameter map.
    pub fn named<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<SqlValue>,
    {
        SqlParams::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::SqlValue;
    use chrono::{NaiveDate, NaiveDateTime};

    #[test]
    fn encodes_scalars() {
        assert_eq!(SqlValue::Null.encode(), "NULL");
        assert_eq!(SqlValue::Bool(true).encode(), "TRUE");
        assert_eq!(SqlValue::Int(-7).encode(), "-7");
        assert_eq!(SqlValue::Float(1.5).encode(), "1.5");
    }

    #[test]
    fn text_quotes_are_doubled() {
        assert_eq!(SqlValue::from("it's").encode(), "'it''s'");
    }

    #[test]
    fn dates_are_iso_8601_in_quotes() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(SqlValue::Date(d).encode(), "'2024-03-09'");

        let ts: NaiveDateTime = "2024-03-09T12:30:00".parse().unwrap();
        assert_eq!(SqlValue::Timestamp(ts).encode(), "'2024-03-09T12:30:00'");
    }

    #[test]
    fn lists_encode_recursively() {
        let v = SqlValue::from(vec![SqlValue::Int(1), SqlValue::from("a"), SqlValue::Null]);
        assert_eq!(v.encode(), "[1, 'a', NULL]");
    }
}
