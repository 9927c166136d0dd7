//! DuckDB SQL dialect.
//!
//! Postgres-flavoured: double-quoted identifiers, `||` concatenation,
//! RETURNING and ILIKE, `?` placeholders.

use super::helpers;
use super::{ParamStyle, SqlDialect};

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Qmark
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_duckdb(name)
    }
}
