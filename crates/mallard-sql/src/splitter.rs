//! Batch statement splitting.
//!
//! Splits a multi-statement SQL payload into individual statements on
//! top-level semicolons, ignoring semicolons that appear inside quoted
//! literals or comments, and classifies each statement by its leading
//! keyword.

use crate::error::{Result, SqlError};
use crate::keywords::LeadingKeyword;
use crate::lexer::QuoteState;

/// Closed set of statement kinds, inferred from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Row-producing statements (SELECT, WITH, SHOW, PRAGMA, ...).
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, transaction control, and session statements.
    Other,
}

/// A single statement extracted from a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Statement text, trimmed, without the terminating semicolon.
    pub text: String,
    /// Kind inferred from the leading keyword.
    pub kind: StatementKind,
    /// Declared parameter names: `$n` digits and `:name` identifiers,
    /// deduplicated in order of first appearance, stored without the sigil.
    pub parameters: Vec<String>,
}

impl Statement {
    fn parse(text: String) -> Result<Self> {
        // Classification is over the first whitespace-delimited token after
        // any leading comments.
        let leading = skip_leading_trivia(&text)
            .split_whitespace()
            .next()
            .ok_or_else(|| SqlError::Parse("Empty statement".into()))?;
        let keyword: LeadingKeyword = leading.parse().map_err(|_| {
            SqlError::Parse(format!("Unrecognized statement keyword: {leading}"))
        })?;
        let parameters = scan_parameters(&text);
        Ok(Self {
            text,
            kind: keyword.statement_kind(),
            parameters,
        })
    }
}

/// Split a SQL batch into individual classified statements.
///
/// Preserves statement order while ignoring semicolons that appear within
/// quoted literals or comments. Whitespace-only fragments are discarded.
/// Fails on the first statement whose leading keyword is not recognized,
/// and on unterminated literals or block comments.
///
/// # Examples
///
/// ```
/// use mallard_sql::split_statements;
///
/// let statements = split_statements("CREATE TABLE t(id INT); INSERT INTO t VALUES (1);").unwrap();
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[0].text, "CREATE TABLE t(id INT)");
/// ```
pub fn split_statements(sql: &str) -> Result<Vec<Statement>> {
    split_raw(sql)?
        .into_iter()
        .filter(|text| !skip_leading_trivia(text).is_empty())
        .map(Statement::parse)
        .collect()
}

/// Advance past leading whitespace and comments to the start of the
/// statement proper. Returns an empty slice for comment-only fragments.
fn skip_leading_trivia(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(pos) => after[pos + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(pos) => after[pos + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest;
        }
    }
}

/// Split into raw statement texts without classifying them.
fn split_raw(sql: &str) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    let mut quotes = QuoteState::new();
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
            }
            current.push(ch);
            continue;
        }

        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_block_comment = false;
                continue;
            }
            current.push(ch);
            continue;
        }

        let in_literal = quotes.step(ch);
        if !in_literal {
            if ch == '-' && chars.peek() == Some(&'-') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_line_comment = true;
                continue;
            }
            if ch == '/' && chars.peek() == Some(&'*') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_block_comment = true;
                continue;
            }
            if ch == ';' {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                continue;
            }
        }

        current.push(ch);
    }

    quotes.finish();
    if quotes.in_literal() {
        return Err(SqlError::UnterminatedLiteral);
    }
    if in_block_comment {
        return Err(SqlError::UnterminatedComment);
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    Ok(statements)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Collect declared parameter names from one statement.
///
/// Recognizes `$<digits>` and `:<identifier>` outside quoted literals;
/// `::` is the cast operator and is skipped wholesale. Names are returned
/// without their sigil, deduplicated, in order of first appearance.
pub fn scan_parameters(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut quotes = QuoteState::new();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if quotes.step(ch) {
            i += 1;
            continue;
        }

        if ch == '$' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
            let mut j = i + 1;
            while chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
                quotes.step(chars[j]);
                j += 1;
            }
            let name: String = chars[i + 1..j].iter().collect();
            if !names.contains(&name) {
                names.push(name);
            }
            i = j;
            continue;
        }

        if ch == ':' {
            // '::' is a type cast, never a placeholder.
            if chars.get(i + 1) == Some(&':') {
                quotes.step(':');
                i += 2;
                continue;
            }
            if chars.get(i + 1).is_some_and(|&c| is_ident_start(c)) {
                let mut j = i + 1;
                while chars.get(j).is_some_and(|&c| is_ident_char(c)) {
                    quotes.step(chars[j]);
                    j += 1;
                }
                let name: String = chars[i + 1..j].iter().collect();
                if !names.contains(&name) {
                    names.push(name);
                }
                i = j;
                continue;
            }
        }

        i += 1;
    }

    names
}
