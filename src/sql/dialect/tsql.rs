//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - OFFSET FETCH for pagination (requires ORDER BY)
//! - N'...' prefix for Unicode strings
//! - OUTPUT instead of RETURNING, which is not rendered here
//! - String concatenation with `+`
//! - No IF NOT EXISTS on CREATE TABLE

use std::collections::HashSet;

use super::helpers;
use super::reserved;
use super::{ParamStyle, SqlDialect};
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &reserved::TSQL
    }

    fn quote_string(&self, s: &str) -> String {
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Qmark
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn emit_recursive_keyword(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_tsql(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_tsql(dt)
    }

    fn emit_identity(&self) -> TokenStream {
        helpers::emit_identity_tsql(1, 1)
    }

    fn drop_index_requires_table(&self) -> bool {
        true
    }

    fn supports_if_not_exists(&self) -> bool {
        false
    }
}
