//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! The compiler and the naming engine consult `SqlDialect` for:
//!
//! - Identifier quoting: `"` (ANSI/PG/SQLite/DuckDB), `` ` `` (MySQL), `[]` (T-SQL)
//! - Reserved words, case folding and maximum identifier length
//! - Bound parameter placeholder style (`?`, `:name`, `$1`, `%s`...)
//! - Pagination: LIMIT/OFFSET vs OFFSET FETCH
//! - Capabilities: RETURNING, FULL OUTER JOIN, ALTER TABLE ADD CONSTRAINT
//! - DDL type names
//!
//! # Usage
//!
//! ```ignore
//! use sqlweave::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```
//!
//! Custom backends implement `SqlDialect` directly; every method except
//! `name`, `quote_identifier` and `format_bool` has an ANSI default.

mod ansi;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
pub mod reserved;
mod sqlite;
mod tsql;

pub use ansi::Ansi;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::token::TokenStream;
use super::types::DataType;

/// Placeholder syntax for bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamStyle {
    /// `?`
    Qmark,
    /// `:1`, `:2`...
    Numeric,
    /// `$1`, `$2`...
    NumericDollar,
    /// `:name`
    Named,
    /// `%s`
    Format,
    /// `%(name)s`
    Pyformat,
}

impl ParamStyle {
    /// Whether parameters are matched by position rather than by name.
    pub fn is_positional(&self) -> bool {
        matches!(
            self,
            ParamStyle::Qmark | ParamStyle::Numeric | ParamStyle::NumericDollar | ParamStyle::Format
        )
    }

    /// Render the placeholder for a parameter. `position` is 1-based.
    pub fn placeholder(&self, name: &str, position: usize) -> String {
        match self {
            ParamStyle::Qmark => "?".into(),
            ParamStyle::Numeric => format!(":{}", position),
            ParamStyle::NumericDollar => format!("${}", position),
            ParamStyle::Named => format!(":{}", name),
            ParamStyle::Format => "%s".into(),
            ParamStyle::Pyformat => format!("%({})s", name),
        }
    }
}

impl FromStr for ParamStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qmark" => Ok(ParamStyle::Qmark),
            "numeric" => Ok(ParamStyle::Numeric),
            "numeric_dollar" => Ok(ParamStyle::NumericDollar),
            "named" => Ok(ParamStyle::Named),
            "format" => Ok(ParamStyle::Format),
            "pyformat" => Ok(ParamStyle::Pyformat),
            other => Err(format!("unknown parameter style '{}'", other)),
        }
    }
}

/// The case a backend folds unquoted identifiers to.
///
/// A name containing letters of the other case must be quoted to
/// survive folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierCase {
    #[default]
    Lower,
    Upper,
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Quote an identifier unconditionally, doubling any embedded quote.
    ///
    /// - ANSI/PostgreSQL/SQLite/DuckDB: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - T-SQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Words that must be quoted when used as identifiers (lowercase).
    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &reserved::ANSI
    }

    /// Case the backend folds unquoted identifiers to.
    fn identifier_case(&self) -> IdentifierCase {
        IdentifierCase::Lower
    }

    /// Maximum identifier length in characters.
    fn max_identifier_length(&self) -> usize {
        128
    }

    // =========================================================================
    // Literals
    // =========================================================================

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - PostgreSQL/DuckDB: `true`/`false`
    /// - MySQL/T-SQL/SQLite: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Placeholder style for bound parameters.
    fn param_style(&self) -> ParamStyle {
        ParamStyle::Named
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// - ANSI/PostgreSQL/DuckDB: `LIMIT n OFFSET m` (default)
    /// - T-SQL: `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// Whether this dialect requires ORDER BY for OFFSET/LIMIT.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    ///
    /// - ANSI/PostgreSQL/DuckDB/SQLite: `||`
    /// - T-SQL: `+`
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether concatenation may use `concat_operator`; otherwise the
    /// compiler emits `CONCAT(a, b)`.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    /// Whether ILIKE is native. Otherwise `LOWER(x) LIKE LOWER(y)` is emitted.
    fn supports_ilike(&self) -> bool {
        false
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Whether this dialect supports FULL OUTER JOIN.
    fn supports_full_outer_join(&self) -> bool {
        true
    }

    /// Whether this dialect supports NULLS FIRST/LAST in ORDER BY.
    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    /// Whether INSERT/UPDATE/DELETE accept a RETURNING clause.
    fn supports_returning(&self) -> bool {
        true
    }

    /// Whether `WITH RECURSIVE` spells out the keyword.
    ///
    /// T-SQL omits it.
    fn emit_recursive_keyword(&self) -> bool {
        true
    }

    /// Whether `ALTER TABLE ... ADD/DROP CONSTRAINT` is available.
    ///
    /// Without it, foreign keys deferred by the dependency sorter stay
    /// inline in CREATE TABLE.
    fn supports_alter_constraint(&self) -> bool {
        true
    }

    /// Whether INSERT accepts several rows in one VALUES clause.
    fn supports_multivalues_insert(&self) -> bool {
        true
    }

    // =========================================================================
    // Function Remapping
    // =========================================================================

    /// Remap a function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to keep original.
    /// The input is matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// DDL type name for a semantic type.
    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_ansi(dt)
    }

    /// Identity/auto-increment clause for an integer primary key column.
    /// An empty stream means the backend needs nothing extra.
    fn emit_identity(&self) -> TokenStream {
        helpers::emit_identity_standard()
    }

    /// Whether this dialect supports IF NOT EXISTS for CREATE statements.
    fn supports_if_not_exists(&self) -> bool {
        true
    }

    /// Whether this dialect supports IF EXISTS for DROP statements.
    fn supports_if_exists(&self) -> bool {
        true
    }

    /// Whether DROP INDEX names the table (`DROP INDEX ix ON t`).
    fn drop_index_requires_table(&self) -> bool {
        false
    }
}

/// Stock SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ansi,
    #[serde(alias = "postgresql")]
    Postgres,
    MySql,
    Sqlite,
    #[serde(alias = "mssql")]
    TSql,
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Ansi => &Ansi,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
            Dialect::TSql => &TSql,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ansi" | "default" => Ok(Dialect::Ansi),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "tsql" | "mssql" => Ok(Dialect::TSql),
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        self.dialect().reserved_words()
    }

    fn identifier_case(&self) -> IdentifierCase {
        self.dialect().identifier_case()
    }

    fn max_identifier_length(&self) -> usize {
        self.dialect().max_identifier_length()
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn param_style(&self) -> ParamStyle {
        self.dialect().param_style()
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn supports_ilike(&self) -> bool {
        self.dialect().supports_ilike()
    }

    fn supports_full_outer_join(&self) -> bool {
        self.dialect().supports_full_outer_join()
    }

    fn supports_nulls_ordering(&self) -> bool {
        self.dialect().supports_nulls_ordering()
    }

    fn supports_returning(&self) -> bool {
        self.dialect().supports_returning()
    }

    fn emit_recursive_keyword(&self) -> bool {
        self.dialect().emit_recursive_keyword()
    }

    fn supports_alter_constraint(&self) -> bool {
        self.dialect().supports_alter_constraint()
    }

    fn supports_multivalues_insert(&self) -> bool {
        self.dialect().supports_multivalues_insert()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        self.dialect().emit_data_type(dt)
    }

    fn emit_identity(&self) -> TokenStream {
        self.dialect().emit_identity()
    }

    fn supports_if_not_exists(&self) -> bool {
        self.dialect().supports_if_not_exists()
    }

    fn supports_if_exists(&self) -> bool {
        self.dialect().supports_if_exists()
    }

    fn drop_index_requires_table(&self) -> bool {
        self.dialect().drop_index_requires_table()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

/// A stock dialect with configured overrides layered on top.
///
/// Built from [`Settings`](crate::config::Settings); anything not
/// overridden delegates to `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfiguredDialect {
    pub base: Dialect,
    pub param_style: Option<ParamStyle>,
    pub max_identifier_length: Option<usize>,
}

impl ConfiguredDialect {
    pub fn new(base: Dialect) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_param_style(mut self, style: ParamStyle) -> Self {
        self.param_style = Some(style);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_identifier_length(mut self, len: usize) -> Self {
        self.max_identifier_length = Some(len);
        self
    }
}

impl SqlDialect for ConfiguredDialect {
    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.base.quote_identifier(ident)
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        self.base.reserved_words()
    }

    fn identifier_case(&self) -> IdentifierCase {
        self.base.identifier_case()
    }

    fn max_identifier_length(&self) -> usize {
        self.max_identifier_length
            .unwrap_or_else(|| self.base.max_identifier_length())
    }

    fn quote_string(&self, s: &str) -> String {
        self.base.quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.base.format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.base.format_null()
    }

    fn param_style(&self) -> ParamStyle {
        self.param_style.unwrap_or_else(|| self.base.param_style())
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.base.emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.base.requires_order_by_for_offset()
    }

    fn concat_operator(&self) -> &'static str {
        self.base.concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.base.supports_concat_operator()
    }

    fn supports_ilike(&self) -> bool {
        self.base.supports_ilike()
    }

    fn supports_full_outer_join(&self) -> bool {
        self.base.supports_full_outer_join()
    }

    fn supports_nulls_ordering(&self) -> bool {
        self.base.supports_nulls_ordering()
    }

    fn supports_returning(&self) -> bool {
        self.base.supports_returning()
    }

    fn emit_recursive_keyword(&self) -> bool {
        self.base.emit_recursive_keyword()
    }

    fn supports_alter_constraint(&self) -> bool {
        self.base.supports_alter_constraint()
    }

    fn supports_multivalues_insert(&self) -> bool {
        self.base.supports_multivalues_insert()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.base.remap_function(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        self.base.emit_data_type(dt)
    }

    fn emit_identity(&self) -> TokenStream {
        self.base.emit_identity()
    }

    fn supports_if_not_exists(&self) -> bool {
        self.base.supports_if_not_exists()
    }

    fn supports_if_exists(&self) -> bool {
        self.base.supports_if_exists()
    }

    fn drop_index_requires_table(&self) -> bool {
        self.base.drop_index_requires_table()
    }
}
