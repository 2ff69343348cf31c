//! Statement construction and validation.
//!
//! A [`Statement`] is the only thing the query executor accepts. Statement
//! text is `'static`, so request data cannot be concatenated into it; values
//! travel as positional [`QueryParam`]s and identifiers as [`TableName`]s.
//! On top of that, the text is tokenized with sqlparser's MySQL dialect and
//! rejected when it:
//! - contains a quoted string literal (values belong in the parameter list)
//! - contains more than one statement
//! - has a different number of `?` placeholders than parameters

use crate::error::{ApiError, DbResult};
use crate::models::QueryParam;
use sqlparser::dialect::MySqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::borrow::Cow;

/// Marker replaced by the quoted table name in [`Statement::for_table`].
pub const TABLE_MARKER: &str = "{table}";

/// MySQL's identifier length limit.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Whether a statement produces rows or mutates data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT, SHOW, DESCRIBE, EXPLAIN, WITH
    Read,
    /// Everything else (DML and DDL)
    Write,
}

/// A validated table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate a bare (unquoted) table name.
    ///
    /// # Examples
    ///
    /// ```
    /// use crm_admin_api::db::TableName;
    ///
    /// assert_eq!(TableName::new("employees").unwrap().quoted(), "`employees`");
    /// assert!(TableName::new("employees; DROP TABLE users").is_err());
    /// ```
    pub fn new(name: &str) -> DbResult<Self> {
        if name.is_empty() {
            return Err(ApiError::invalid_input("Table name cannot be empty"));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(ApiError::invalid_input(format!(
                "Table name exceeds {} characters",
                MAX_IDENTIFIER_LEN
            )));
        }
        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !first_ok || !rest_ok {
            return Err(ApiError::invalid_input(format!(
                "Invalid table name '{}': only letters, digits and underscores are allowed",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Back-quoted form for interpolation into statement text.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statement text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: Cow<'static, str>,
    params: Vec<QueryParam>,
    kind: StatementKind,
}

impl Statement {
    /// Build a statement from fixed text and its parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use crm_admin_api::db::{Statement, StatementKind};
    /// use crm_admin_api::models::QueryParam;
    ///
    /// let stmt = Statement::new("SELECT * FROM employees WHERE id = ?", vec![QueryParam::Int(7)]).unwrap();
    /// assert_eq!(stmt.kind(), StatementKind::Read);
    ///
    /// // Literal values must be bound, not inlined
    /// assert!(Statement::new("SELECT * FROM employees WHERE name = 'bob'", vec![]).is_err());
    /// ```
    pub fn new(sql: &'static str, params: Vec<QueryParam>) -> DbResult<Self> {
        Self::validated(Cow::Borrowed(sql), params)
    }

    /// Build a statement against `table`, substituting [`TABLE_MARKER`].
    pub fn for_table(
        template: &'static str,
        table: &TableName,
        params: Vec<QueryParam>,
    ) -> DbResult<Self> {
        if !template.contains(TABLE_MARKER) {
            return Err(ApiError::invalid_input(format!(
                "Statement template has no {} marker",
                TABLE_MARKER
            )));
        }
        let sql = template.replace(TABLE_MARKER, &table.quoted());
        Self::validated(Cow::Owned(sql), params)
    }

    fn validated(sql: Cow<'static, str>, params: Vec<QueryParam>) -> DbResult<Self> {
        let kind = check_statement_text(&sql, params.len())?;
        Ok(Self { sql, params, kind })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn is_read(&self) -> bool {
        self.kind == StatementKind::Read
    }
}

/// Tokenize `sql` and enforce the statement rules, returning its kind.
pub fn check_statement_text(sql: &str, param_count: usize) -> DbResult<StatementKind> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| ApiError::invalid_input(format!("Failed to tokenize SQL statement: {}", e)))?;

    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect();

    if significant.is_empty() {
        return Err(ApiError::invalid_input("Empty SQL statement"));
    }

    let mut placeholders = 0usize;
    for (idx, token) in significant.iter().enumerate() {
        match token {
            Token::SingleQuotedString(_)
            | Token::DoubleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::EscapedStringLiteral(_)
            | Token::HexStringLiteral(_) => {
                return Err(ApiError::invalid_input(
                    "Literal values are not allowed in statement text; bind them as parameters",
                ));
            }
            Token::Placeholder(p) if p == "?" => placeholders += 1,
            Token::Placeholder(p) => {
                return Err(ApiError::invalid_input(format!(
                    "Unsupported placeholder '{}'; use positional '?'",
                    p
                )));
            }
            // A single trailing semicolon is tolerated
            Token::SemiColon if idx + 1 == significant.len() => {}
            Token::SemiColon => {
                return Err(ApiError::invalid_input(
                    "Multiple statements are not allowed",
                ));
            }
            _ => {}
        }
    }

    if placeholders != param_count {
        return Err(ApiError::invalid_input(format!(
            "Statement has {} placeholder(s) but {} parameter(s) were supplied",
            placeholders, param_count
        )));
    }

    Ok(classify(&significant))
}

fn classify(tokens: &[&Token]) -> StatementKind {
    let first_word = tokens.iter().find_map(|t| match t {
        Token::Word(w) => Some(w.keyword),
        _ => None,
    });
    match first_word {
        Some(
            Keyword::SELECT
            | Keyword::SHOW
            | Keyword::DESCRIBE
            | Keyword::DESC
            | Keyword::EXPLAIN
            | Keyword::WITH,
        ) => StatementKind::Read,
        _ => StatementKind::Write,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_valid() {
        let table = TableName::new("project_tasks").unwrap();
        assert_eq!(table.as_str(), "project_tasks");
        assert_eq!(table.quoted(), "`project_tasks`");
        assert_eq!(table.to_string(), "project_tasks");
        assert!(TableName::new("_staging2").is_ok());
    }

    #[test]
    fn test_table_name_rejects_bad_identifiers() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("1employees").is_err());
        assert!(TableName::new("employees`; DROP TABLE x; --").is_err());
        assert!(TableName::new("emp loyees").is_err());
        assert!(TableName::new("crm.employees").is_err());
        assert!(TableName::new(&"a".repeat(65)).is_err());
        assert!(TableName::new(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_read_statements_classified() {
        for sql in [
            "SELECT 1",
            "select * from employees",
            "SHOW TABLES",
            "DESCRIBE employees",
            "EXPLAIN SELECT * FROM employees",
            "WITH t AS (SELECT 1) SELECT * FROM t",
        ] {
            assert_eq!(
                check_statement_text(sql, 0).unwrap(),
                StatementKind::Read,
                "{sql}"
            );
        }
    }

    #[test]
    fn test_write_statements_classified() {
        for sql in [
            "DELETE FROM employees",
            "ALTER TABLE employees AUTO_INCREMENT = 1",
            "UPDATE employees SET active = 0",
            "INSERT INTO employees (id) VALUES (1)",
        ] {
            assert_eq!(
                check_statement_text(sql, 0).unwrap(),
                StatementKind::Write,
                "{sql}"
            );
        }
    }

    #[test]
    fn test_string_literals_rejected() {
        let err = check_statement_text("SELECT * FROM employees WHERE email = 'a@b.c'", 0)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput { .. }));
        assert!(check_statement_text(r#"SELECT * FROM employees WHERE name = "x""#, 0).is_err());
    }

    #[test]
    fn test_placeholder_count_must_match() {
        assert!(check_statement_text("SELECT * FROM employees WHERE id = ?", 1).is_ok());
        assert!(check_statement_text("SELECT * FROM employees WHERE id = ?", 0).is_err());
        assert!(check_statement_text("SELECT * FROM employees", 1).is_err());
        assert!(check_statement_text("SELECT * FROM t WHERE a = ? AND b = ?", 2).is_ok());
    }

    #[test]
    fn test_question_mark_inside_identifier_is_not_a_placeholder() {
        assert!(check_statement_text("SELECT `why?` FROM employees", 0).is_ok());
    }

    #[test]
    fn test_stacked_statements_rejected() {
        assert!(check_statement_text("DELETE FROM employees; DROP TABLE employees", 0).is_err());
        assert!(check_statement_text("SELECT 1;", 0).is_ok());
    }

    #[test]
    fn test_empty_statement_rejected() {
        assert!(check_statement_text("", 0).is_err());
        assert!(check_statement_text("   \n", 0).is_err());
    }

    #[test]
    fn test_for_table_substitutes_quoted_name() {
        let table = TableName::new("employees").unwrap();
        let stmt = Statement::for_table("DELETE FROM {table}", &table, vec![]).unwrap();
        assert_eq!(stmt.sql(), "DELETE FROM `employees`");
        assert_eq!(stmt.kind(), StatementKind::Write);
        assert!(!stmt.is_read());
    }

    #[test]
    fn test_for_table_requires_marker() {
        let table = TableName::new("employees").unwrap();
        assert!(Statement::for_table("DELETE FROM employees", &table, vec![]).is_err());
    }

    #[test]
    fn test_statement_keeps_params() {
        let stmt = Statement::new(
            "SELECT * FROM employees WHERE id = ? AND active = ?",
            vec![QueryParam::Int(3), QueryParam::Bool(true)],
        )
        .unwrap();
        assert!(stmt.is_read());
        assert_eq!(stmt.params().len(), 2);
    }
}
