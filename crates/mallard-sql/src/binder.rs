//! Parameter binding.
//!
//! Rewrites `?`, `$n`, and `:name` placeholders into literal SQL text,
//! respecting quoted-literal boundaries so placeholder characters inside
//! strings or quoted identifiers are never substituted. Exactly one
//! placeholder family may appear per statement.

use crate::error::{Result, SqlError};
use crate::lexer::QuoteState;
use crate::values::{SqlParams, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Question,
    Dollar,
    Named,
}

impl Family {
    fn label(self) -> &'static str {
        match self {
            Family::Question => "?",
            Family::Dollar => "$n",
            Family::Named => ":name",
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Rewrite all placeholders in `sql` using the supplied parameter set.
///
/// `?` consumes positional values left-to-right, `$n` indexes the
/// positional list 1-based, `:name` looks up the named map. `::` is the
/// cast operator and passes through untouched.
///
/// # Examples
///
/// ```
/// use mallard_sql::{bind_parameters, SqlParams};
///
/// let params = SqlParams::named([("id", 5i64)]);
/// let sql = bind_parameters("SELECT :id::INTEGER", &params).unwrap();
/// assert_eq!(sql, "SELECT 5::INTEGER");
/// ```
pub fn bind_parameters(sql: &str, params: &SqlParams) -> Result<String> {
    Binder::new(params).rewrite(sql)
}

struct Binder<'a> {
    params: &'a SqlParams,
    family: Option<Family>,
    consumed: usize,
}

impl<'a> Binder<'a> {
    fn new(params: &'a SqlParams) -> Self {
        Self {
            params,
            family: None,
            consumed: 0,
        }
    }

    fn rewrite(mut self, sql: &str) -> Result<String> {
        let chars: Vec<char> = sql.chars().collect();
        let mut quotes = QuoteState::new();
        let mut out = String::with_capacity(sql.len());
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if quotes.step(ch) {
                out.push(ch);
                i += 1;
                continue;
            }

            match ch {
                '?' => {
                    self.enter_family(Family::Question)?;
                    out.push_str(&self.next_positional()?.encode());
                    i += 1;
                },
                '$' if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.enter_family(Family::Dollar)?;
                    let mut j = i + 1;
                    while chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
                        quotes.step(chars[j]);
                        j += 1;
                    }
                    let digits: String = chars[i + 1..j].iter().collect();
                    out.push_str(&self.indexed_positional(&digits)?.encode());
                    i = j;
                },
                ':' if chars.get(i + 1) == Some(&':') => {
                    // Type cast, pass through literally.
                    quotes.step(':');
                    out.push_str("::");
                    i += 2;
                },
                ':' if chars.get(i + 1).is_some_and(|&c| is_ident_start(c)) => {
                    self.enter_family(Family::Named)?;
                    let mut j = i + 1;
                    while chars.get(j).is_some_and(|&c| is_ident_char(c)) {
                        quotes.step(chars[j]);
                        j += 1;
                    }
                    let name: String = chars[i + 1..j].iter().collect();
                    out.push_str(&self.named(&name)?.encode());
                    i = j;
                },
                _ => {
                    out.push(ch);
                    i += 1;
                },
            }
        }

        self.check_leftovers()?;
        Ok(out)
    }

    fn enter_family(&mut self, family: Family) -> Result<()> {
        match self.family {
            None => {
                self.family = Some(family);
                Ok(())
            },
            Some(current) if current == family => Ok(()),
            Some(current) => Err(SqlError::Binding(format!(
                "Cannot mix {} and {} placeholders in one statement",
                current.label(),
                family.label()
            ))),
        }
    }

    fn positional_list(&self) -> Result<&'a [SqlValue]> {
        match self.params {
            SqlParams::Positional(list) => Ok(list),
            SqlParams::None => Err(SqlError::Binding(
                "Statement has positional placeholders but no parameters were supplied".into(),
            )),
            SqlParams::Named(_) => Err(SqlError::Binding(
                "Statement has positional placeholders but named parameters were supplied".into(),
            )),
        }
    }

    fn next_positional(&mut self) -> Result<&'a SqlValue> {
        let list = self.positional_list()?;
        let value = list.get(self.consumed).ok_or_else(|| {
            SqlError::Binding(format!(
                "Too many ? placeholders: only {} parameter(s) supplied",
                list.len()
            ))
        })?;
        self.consumed += 1;
        Ok(value)
    }

    fn indexed_positional(&mut self, digits: &str) -> Result<&'a SqlValue> {
        let list = self.positional_list()?;
        let n: usize = digits
            .parse()
            .map_err(|_| SqlError::Binding(format!("Invalid placeholder index ${digits}")))?;
        if n == 0 || n > list.len() {
            return Err(SqlError::Binding(format!(
                "Placeholder ${n} out of range: {} parameter(s) supplied",
                list.len()
            )));
        }
        Ok(&list[n - 1])
    }

    fn named(&mut self, name: &str) -> Result<&'a SqlValue> {
        match self.params {
            SqlParams::Named(map) => map.get(name).ok_or_else(|| {
                SqlError::Binding(format!("Missing named parameter :{name}"))
            }),
            SqlParams::None => Err(SqlError::Binding(format!(
                "Statement references :{name} but no parameters were supplied"
            ))),
            SqlParams::Positional(_) => Err(SqlError::Binding(format!(
                "Statement references :{name} but positional parameters were supplied"
            ))),
        }
    }

    fn check_leftovers(&self) -> Result<()> {
        // `?` must consume the whole list; `$n` and `:name` may address
        // values more than once, so only `?` gets the exhaustion check.
        if let SqlParams::Positional(list) = self.params {
            let used_question = self.family == Some(Family::Question);
            if used_question && self.consumed < list.len() {
                return Err(SqlError::Binding(format!(
                    "Too few ? placeholders: {} parameter(s) supplied, {} consumed",
                    list.len(),
                    self.consumed
                )));
            }
            if self.family.is_none() && !list.is_empty() {
                return Err(SqlError::Binding(format!(
                    "{} positional parameter(s) supplied but the statement has no placeholders",
                    list.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::bind_parameters;
    use crate::error::SqlError;
    use crate::values::{SqlParams, SqlValue};

    #[test]
    fn question_marks_bind_left_to_right() {
        let params = SqlParams::positional([SqlValue::Int(1), SqlValue::from("a")]);
        let sql = bind_parameters("SELECT * FROM t WHERE x = ? AND y = ?", &params).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE x = 1 AND y = 'a'");
    }

    #[test]
    fn question_mark_count_mismatch_fails() {
        let params = SqlParams::positional([SqlValue::Int(1), SqlValue::Int(2)]);
        let err = bind_parameters("SELECT ?", &params).unwrap_err();
        assert!(matches!(err, SqlError::Binding(_)), "{err}");

        let params = SqlParams::positional([SqlValue::Int(1)]);
        let err = bind_parameters("SELECT ?, ?", &params).unwrap_err();
        assert!(matches!(err, SqlError::Binding(_)), "{err}");
    }

    #[test]
    fn dollar_placeholders_are_one_based() {
        let params = SqlParams::positional([SqlValue::from("a"), SqlValue::from("b")]);
        let sql = bind_parameters("SELECT $2, $1, $2", &params).unwrap();
        assert_eq!(sql, "SELECT 'b', 'a', 'b'");
    }

    #[test]
    fn dollar_out_of_range_fails() {
        let params = SqlParams::positional([SqlValue::Int(1)]);
        assert!(bind_parameters("SELECT $2", &params).is_err());
        assert!(bind_parameters("SELECT $0", &params).is_err());
    }

    #[test]
    fn named_lookup_and_cast_passthrough() {
        let params = SqlParams::named([("id", 5i64)]);
        let sql = bind_parameters("SELECT :id::INTEGER", &params).unwrap();
        assert_eq!(sql, "SELECT 5::INTEGER");
    }

    #[test]
    fn missing_named_parameter_fails() {
        let params = SqlParams::named([("id", 5i64)]);
        let err = bind_parameters("SELECT :missing", &params).unwrap_err();
        assert!(matches!(err, SqlError::Binding(_)));
    }

    #[test]
    fn mixing_families_fails() {
        let params = SqlParams::positional([SqlValue::Int(1), SqlValue::Int(2)]);
        let err = bind_parameters("SELECT ? , $1", &params).unwrap_err();
        assert!(matches!(err, SqlError::Binding(_)));
    }

    #[test]
    fn placeholders_inside_literals_are_untouched() {
        let params = SqlParams::positional([SqlValue::Int(9)]);
        let sql = bind_parameters("SELECT '?' , ? FROM \"t?\"", &params).unwrap();
        assert_eq!(sql, "SELECT '?' , 9 FROM \"t?\"");
    }

    #[test]
    fn no_params_and_no_placeholders_is_identity() {
        let sql = bind_parameters("SELECT 1", &SqlParams::None).unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn unused_positional_list_fails() {
        let params = SqlParams::positional([SqlValue::Int(1)]);
        assert!(bind_parameters("SELECT 1", &params).is_err());
    }

    #[test]
    fn null_and_list_values_encode() {
        let params = SqlParams::positional([
            SqlValue::Null,
            SqlValue::from(vec![SqlValue::Int(1), SqlValue::Int(2)]),
        ]);
        let sql = bind_parameters("SELECT ?, ?", &params).unwrap();
        assert_eq!(sql, "SELECT NULL, [1, 2]");
    }
}
