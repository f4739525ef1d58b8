use serde::{Deserialize, Serialize};

use crate::errors::QueryError;

/// SQL produced by the completer. Untrusted until it passes [`SafetyGate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSql(String);

impl CandidateSql {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// SQL that passed the read-only policy. Only [`SafetyGate::validate`]
/// produces values of this type, so nothing executes ungated SQL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafeSql(String);

impl SafeSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SafeSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statement kind as seen by the leading keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Read,
    Write,
    Ddl,
    Unknown,
}

/// Classifies one SQL statement by its first keyword. Not a parser; paired
/// with the keyword deny-list below for defense in depth.
pub fn classify(statement: &str) -> StatementKind {
    let first = statement
        .trim()
        .split(|ch: char| ch.is_whitespace() || ch == '(')
        .find(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match first.as_str() {
        "select" => StatementKind::Read,
        "insert" | "update" | "delete" | "merge" | "replace" => StatementKind::Write,
        "create" | "drop" | "alter" | "truncate" => StatementKind::Ddl,
        _ => StatementKind::Unknown,
    }
}

const DENIED_KEYWORDS: [&str; 5] = ["drop", "delete", "truncate", "insert", "alter"];

const MODIFIES_DATABASE: &str = "This query appears to modify the database which is not allowed";
const ONLY_SELECT: &str = "Only SELECT queries are allowed";

/// Read-only policy over completer-generated SQL.
///
/// The keyword scan is a deliberately blunt substring match: a write verb
/// anywhere in the text disqualifies the statement, even inside a subclause
/// or comment. The per-statement classifier catches what the scan cannot,
/// like a second statement smuggled in behind a `;`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SafetyGate;

impl SafetyGate {
    pub fn validate(&self, candidate: CandidateSql) -> Result<SafeSql, QueryError> {
        let lowered = candidate.0.to_lowercase();

        if DENIED_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            return Err(QueryError::UnsafeQuery(MODIFIES_DATABASE));
        }

        if !lowered.trim().starts_with("select") {
            return Err(QueryError::UnsafeQuery(ONLY_SELECT));
        }

        for statement in lowered.split(';') {
            if statement.trim().is_empty() {
                continue;
            }
            match classify(statement) {
                StatementKind::Read => {}
                StatementKind::Write | StatementKind::Ddl => {
                    return Err(QueryError::UnsafeQuery(MODIFIES_DATABASE));
                }
                StatementKind::Unknown => {
                    return Err(QueryError::UnsafeQuery(ONLY_SELECT));
                }
            }
        }

        Ok(SafeSql(candidate.0))
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, CandidateSql, SafetyGate, StatementKind};
    use crate::errors::QueryError;

    fn validate(sql: &str) -> Result<String, QueryError> {
        SafetyGate.validate(CandidateSql::new(sql)).map(|safe| safe.as_str().to_string())
    }

    #[test]
    fn plain_select_passes_unchanged() {
        let sql = "SELECT name, stock_quantity FROM inventory";
        assert_eq!(validate(sql).expect("should pass"), sql);
    }

    #[test]
    fn leading_whitespace_and_case_are_tolerated() {
        assert!(validate("  SELECT * FROM t").is_ok());
        assert!(validate("select 1").is_ok());
    }

    #[test]
    fn denied_keywords_reject_regardless_of_position() {
        for sql in [
            "drop table inventory",
            "select 1; drop table x",
            "SELECT * FROM t WHERE note = 'TRUNCATE'",
            "select * from t -- delete later",
            "INSERT INTO t VALUES (1)",
            "ALTER TABLE t ADD c int",
        ] {
            let error = validate(sql).expect_err("keyword should reject");
            assert_eq!(
                error.to_string(),
                "This query appears to modify the database which is not allowed",
                "expected keyword rejection for {sql:?}"
            );
        }
    }

    #[test]
    fn non_select_prefix_rejects_even_when_benign() {
        for sql in ["update t set x=1", "explain select 1", "with c as (select 1) select * from c"]
        {
            assert!(validate(sql).is_err(), "expected rejection for {sql:?}");
        }
    }

    #[test]
    fn second_statement_with_write_verb_rejects() {
        // "update" is not on the deny list; the classifier catches it.
        let error = validate("select 1; update t set x=1").expect_err("should reject");
        assert_eq!(
            error.to_string(),
            "This query appears to modify the database which is not allowed"
        );
    }

    #[test]
    fn trailing_semicolon_is_not_a_second_statement() {
        assert!(validate("select * from inventory;").is_ok());
    }

    #[test]
    fn empty_input_rejects_with_select_rule() {
        let error = validate("   ").expect_err("should reject");
        assert_eq!(error.to_string(), "Only SELECT queries are allowed");
    }

    #[test]
    fn classifier_labels_statement_kinds() {
        assert_eq!(classify("select 1"), StatementKind::Read);
        assert_eq!(classify("  (SELECT 1)"), StatementKind::Read);
        assert_eq!(classify("update t set x=1"), StatementKind::Write);
        assert_eq!(classify("CREATE TABLE t (x int)"), StatementKind::Ddl);
        assert_eq!(classify("vacuum"), StatementKind::Unknown);
    }
}
