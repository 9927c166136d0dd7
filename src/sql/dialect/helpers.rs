//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};
use super::super::types::DataType;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Ansi, Postgres, SQLite, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes, also doubling backslashes.
/// Used by: MySQL, where backslash is an escape character by default
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Quote string with N prefix for Unicode.
/// Used by: T-SQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Ansi, Postgres, DuckDB
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: T-SQL, MySQL, SQLite
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit LIMIT ... OFFSET ... (standard SQL).
/// Used by: Ansi, Postgres, DuckDB
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit).space().push(Token::LitInt(lim as i64));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset).space().push(Token::LitInt(off as i64));
    }

    ts
}

/// Emit LIMIT/OFFSET where OFFSET alone is not accepted.
///
/// `unbounded` is the LIMIT value that means "no limit" on the backend:
/// `-1` for SQLite, `18446744073709551615` for MySQL.
pub fn emit_limit_offset_required_limit(
    limit: Option<u64>,
    offset: Option<u64>,
    unbounded: &str,
) -> TokenStream {
    let mut ts = TokenStream::new();

    match (limit, offset) {
        (Some(lim), _) => {
            ts.push(Token::Limit).space().push(Token::LitInt(lim as i64));
        }
        (None, Some(_)) => {
            ts.push(Token::Limit).space().push(Token::Raw(unbounded.into()));
        }
        (None, None) => return ts,
    }

    if let Some(off) = offset {
        ts.space().push(Token::Offset).space().push(Token::LitInt(off as i64));
    }

    ts
}

/// Emit OFFSET ... ROWS FETCH NEXT ... ROWS ONLY (T-SQL style).
/// Note: Requires ORDER BY clause in T-SQL
pub fn emit_limit_offset_tsql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    let off = offset.unwrap_or(0);
    ts.push(Token::Offset)
        .space()
        .push(Token::LitInt(off as i64))
        .space()
        .push(Token::Rows);

    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .push(Token::LitInt(lim as i64))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    ts
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for Postgres dialect.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" | "DATE_FORMAT" => Some("TO_CHAR"),
        "NVL" | "IFNULL" | "ISNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// Remap functions for DuckDB dialect.
pub fn remap_function_duckdb(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "TO_CHAR" | "DATE_FORMAT" => Some("STRFTIME"),
        "NVL" | "IFNULL" | "ISNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// Remap functions for SQLite dialect.
pub fn remap_function_sqlite(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" | "ISNULL" => Some("IFNULL"),
        "NOW" => Some("CURRENT_TIMESTAMP"),
        _ => None,
    }
}

/// Remap functions for MySQL dialect.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" | "TO_CHAR" => Some("DATE_FORMAT"),
        "NVL" | "ISNULL" => Some("IFNULL"),
        "SUBSTR" => Some("SUBSTRING"),
        _ => None,
    }
}

/// Remap functions for T-SQL dialect.
pub fn remap_function_tsql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "NOW" | "CURRENT_TIMESTAMP" => Some("GETDATE"),
        "STRFTIME" | "TO_CHAR" | "DATE_FORMAT" => Some("FORMAT"),
        "NVL" | "IFNULL" => Some("ISNULL"),
        _ => None,
    }
}

// =============================================================================
// Data Type Emission
// =============================================================================

/// Emit data type for ANSI style.
/// Used by: Ansi, DuckDB
pub fn emit_data_type_ansi(dt: &DataType) -> String {
    match dt {
        DataType::Bool => "BOOLEAN".into(),
        DataType::Int16 => "SMALLINT".into(),
        DataType::Int32 => "INTEGER".into(),
        DataType::Int64 => "BIGINT".into(),
        DataType::Float32 => "REAL".into(),
        DataType::Float64 => "DOUBLE PRECISION".into(),
        DataType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
        DataType::String => "VARCHAR".into(),
        DataType::Char(n) => format!("CHAR({})", n),
        DataType::Varchar(n) => format!("VARCHAR({})", n),
        DataType::Date => "DATE".into(),
        DataType::Time => "TIME".into(),
        DataType::Timestamp => "TIMESTAMP".into(),
        DataType::TimestampTz => "TIMESTAMP WITH TIME ZONE".into(),
        DataType::Binary => "BLOB".into(),
        DataType::Json => "JSON".into(),
        DataType::Uuid => "UUID".into(),
    }
}

/// Emit data type for Postgres.
pub fn emit_data_type_postgres(dt: &DataType) -> String {
    match dt {
        DataType::String => "TEXT".into(),
        DataType::Decimal(p, s) => format!("NUMERIC({}, {})", p, s),
        DataType::TimestampTz => "TIMESTAMPTZ".into(),
        DataType::Binary => "BYTEA".into(),
        DataType::Json => "JSONB".into(),
        other => emit_data_type_ansi(other),
    }
}

/// Emit data type for SQLite, which only knows storage classes.
pub fn emit_data_type_sqlite(dt: &DataType) -> String {
    match dt {
        DataType::Bool | DataType::Int16 | DataType::Int32 | DataType::Int64 => "INTEGER".into(),
        DataType::Float32 | DataType::Float64 => "REAL".into(),
        DataType::Decimal(p, s) => format!("NUMERIC({}, {})", p, s),
        DataType::Binary => "BLOB".into(),
        DataType::Char(n) => format!("CHAR({})", n),
        DataType::Varchar(n) => format!("VARCHAR({})", n),
        _ => "TEXT".into(),
    }
}

/// Emit data type for MySQL.
pub fn emit_data_type_mysql(dt: &DataType) -> String {
    match dt {
        DataType::Bool => "BOOL".into(),
        DataType::Int32 => "INTEGER".into(),
        DataType::Float64 => "DOUBLE".into(),
        DataType::String => "TEXT".into(),
        DataType::Varchar(n) if *n == u16::MAX => "LONGTEXT".into(),
        DataType::Timestamp => "DATETIME".into(),
        DataType::TimestampTz => "TIMESTAMP".into(),
        DataType::Uuid => "CHAR(36)".into(),
        other => emit_data_type_ansi(other),
    }
}

/// Emit data type for T-SQL.
pub fn emit_data_type_tsql(dt: &DataType) -> String {
    match dt {
        DataType::Bool => "BIT".into(),
        DataType::Int32 => "INT".into(),
        DataType::Float64 => "FLOAT".into(),
        DataType::String => "NVARCHAR(MAX)".into(),
        DataType::Varchar(n) if *n == u16::MAX => "NVARCHAR(MAX)".into(),
        DataType::Varchar(n) => format!("NVARCHAR({})", n),
        DataType::Char(n) => format!("NCHAR({})", n),
        DataType::Timestamp => "DATETIME2".into(),
        DataType::TimestampTz => "DATETIMEOFFSET".into(),
        DataType::Binary => "VARBINARY(MAX)".into(),
        DataType::Json => "NVARCHAR(MAX)".into(),
        DataType::Uuid => "UNIQUEIDENTIFIER".into(),
        other => emit_data_type_ansi(other),
    }
}

// =============================================================================
// Identity / Auto-Increment
// =============================================================================

/// Emit identity for ANSI/Postgres (GENERATED BY DEFAULT AS IDENTITY).
pub fn emit_identity_standard() -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw("GENERATED BY DEFAULT AS IDENTITY".into()));
    ts
}

/// Emit identity for T-SQL (IDENTITY(start, increment)).
pub fn emit_identity_tsql(start: i64, increment: i64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw(format!("IDENTITY({}, {})", start, increment)));
    ts
}

/// Emit identity for MySQL (AUTO_INCREMENT).
pub fn emit_identity_mysql() -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Raw("AUTO_INCREMENT".into()));
    ts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Dialect;

    #[test]
    fn test_limit_offset_required_limit() {
        let ts = emit_limit_offset_required_limit(None, Some(10), "-1");
        assert_eq!(ts.serialize(&Dialect::Sqlite), "LIMIT -1 OFFSET 10");

        let ts = emit_limit_offset_required_limit(Some(5), None, "-1");
        assert_eq!(ts.serialize(&Dialect::Sqlite), "LIMIT 5");

        assert!(emit_limit_offset_required_limit(None, None, "-1").is_empty());
    }

    #[test]
    fn test_tsql_pagination() {
        let ts = emit_limit_offset_tsql(Some(10), Some(20));
        assert_eq!(
            ts.serialize(&Dialect::TSql),
            "OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_postgres_types_fall_back_to_ansi() {
        assert_eq!(emit_data_type_postgres(&DataType::Json), "JSONB");
        assert_eq!(emit_data_type_postgres(&DataType::Varchar(30)), "VARCHAR(30)");
        assert_eq!(emit_data_type_tsql(&DataType::Varchar(30)), "NVARCHAR(30)");
    }
}
