//! Leading-keyword table for statement classification.
//!
//! Provides a strongly-typed representation of the keywords that may begin
//! a statement so the splitter can avoid duplicating string literals.

use crate::splitter::StatementKind;
use std::str::FromStr;

/// Keywords recognized at the start of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadingKeyword {
    // Row-producing queries
    Select,
    With,
    Show,
    Describe,
    Explain,
    Pragma,
    Call,
    From,
    Summarize,
    Values,
    // DML
    Insert,
    Update,
    Delete,
    // DDL and session/transaction control
    Create,
    Drop,
    Alter,
    Begin,
    Commit,
    Rollback,
    Abort,
    Set,
    Reset,
    Copy,
    Export,
    Import,
    Attach,
    Detach,
    Use,
    Install,
    Load,
    Vacuum,
    Analyze,
    Checkpoint,
    Truncate,
    Prepare,
    Execute,
    Deallocate,
    Comment,
    Grant,
    Revoke,
}

impl LeadingKeyword {
    /// The statement kind this keyword introduces.
    pub fn statement_kind(self) -> StatementKind {
        match self {
            LeadingKeyword::Select
            | LeadingKeyword::With
            | LeadingKeyword::Show
            | LeadingKeyword::Describe
            | LeadingKeyword::Explain
            | LeadingKeyword::Pragma
            | LeadingKeyword::Call
            | LeadingKeyword::From
            | LeadingKeyword::Summarize
            | LeadingKeyword::Values => StatementKind::Select,
            LeadingKeyword::Insert => StatementKind::Insert,
            LeadingKeyword::Update => StatementKind::Update,
            LeadingKeyword::Delete => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }
}

impl FromStr for LeadingKeyword {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SELECT" => Ok(LeadingKeyword::Select),
            "WITH" => Ok(LeadingKeyword::With),
            "SHOW" => Ok(LeadingKeyword::Show),
            "DESCRIBE" | "DESC" => Ok(LeadingKeyword::Describe),
            "EXPLAIN" => Ok(LeadingKeyword::Explain),
            "PRAGMA" => Ok(LeadingKeyword::Pragma),
            "CALL" => Ok(LeadingKeyword::Call),
            "FROM" => Ok(LeadingKeyword::From),
            "SUMMARIZE" => Ok(LeadingKeyword::Summarize),
            "VALUES" => Ok(LeadingKeyword::Values),
            "INSERT" => Ok(LeadingKeyword::Insert),
            "UPDATE" => Ok(LeadingKeyword::Update),
            "DELETE" => Ok(LeadingKeyword::Delete),
            "CREATE" => Ok(LeadingKeyword::Create),
            "DROP" => Ok(LeadingKeyword::Drop),
            "ALTER" => Ok(LeadingKeyword::Alter),
            "BEGIN" => Ok(LeadingKeyword::Begin),
            "COMMIT" | "END" => Ok(LeadingKeyword::Commit),
            "ROLLBACK" => Ok(LeadingKeyword::Rollback),
            "ABORT" => Ok(LeadingKeyword::Abort),
            "SET" => Ok(LeadingKeyword::Set),
            "RESET" => Ok(LeadingKeyword::Reset),
            "COPY" => Ok(LeadingKeyword::Copy),
            "EXPORT" => Ok(LeadingKeyword::Export),
            "IMPORT" => Ok(LeadingKeyword::Import),
            "ATTACH" => Ok(LeadingKeyword::Attach),
            "DETACH" => Ok(LeadingKeyword::Detach),
            "USE" => Ok(LeadingKeyword::Use),
            "INSTALL" => Ok(LeadingKeyword::Install),
            "LOAD" => Ok(LeadingKeyword::Load),
            "VACUUM" => Ok(LeadingKeyword::Vacuum),
            "ANALYZE" => Ok(LeadingKeyword::Analyze),
            "CHECKPOINT" => Ok(LeadingKeyword::Checkpoint),
            "TRUNCATE" => Ok(LeadingKeyword::Truncate),
            "PREPARE" => Ok(LeadingKeyword::Prepare),
            "EXECUTE" => Ok(LeadingKeyword::Execute),
            "DEALLOCATE" => Ok(LeadingKeyword::Deallocate),
            "COMMENT" => Ok(LeadingKeyword::Comment),
            "GRANT" => Ok(LeadingKeyword::Grant),
            "REVOKE" => Ok(LeadingKeyword::Revoke),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LeadingKeyword;
    use crate::splitter::StatementKind;

    #[test]
    fn classifies_row_producing_keywords() {
        for kw in ["select", "WITH", "Pragma", "from", "values"] {
            let parsed: LeadingKeyword = kw.parse().unwrap();
            assert_eq!(parsed.statement_kind(), StatementKind::Select, "{kw}");
        }
    }

    #[test]
    fn classifies_dml_keywords() {
        assert_eq!(
            "insert".parse::<LeadingKeyword>().unwrap().statement_kind(),
            StatementKind::Insert
        );
        assert_eq!(
            "UPDATE".parse::<LeadingKeyword>().unwrap().statement_kind(),
            StatementKind::Update
        );
        assert_eq!(
            "Delete".parse::<LeadingKeyword>().unwrap().statement_kind(),
            StatementKind::Delete
        );
    }

    #[test]
    fn ddl_maps_to_other() {
        assert_eq!(
            "CREATE".parse::<LeadingKeyword>().unwrap().statement_kind(),
            StatementKind::Other
        );
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        assert!("FROBNICATE".parse::<LeadingKeyword>().is_err());
    }
}
