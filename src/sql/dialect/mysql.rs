//! MySQL dialect.
//!
//! MySQL differences handled here:
//! - Backtick identifier quoting
//! - 64 character identifier limit
//! - `?` placeholders
//! - `||` is logical OR, so concatenation uses CONCAT()
//! - Backslash escapes in string literals
//! - No RETURNING, no FULL OUTER JOIN
//! - OFFSET requires LIMIT
//! - AUTO_INCREMENT instead of identity columns

use std::collections::HashSet;

use super::super::token::TokenStream;
use super::helpers;
use super::reserved;
use super::{ParamStyle, SqlDialect};
use crate::sql::types::DataType;

/// MySQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &reserved::MYSQL
    }

    fn max_identifier_length(&self) -> usize {
        64
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Qmark
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset, "18446744073709551615")
    }

    fn supports_concat_operator(&self) -> bool {
        false
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_mysql(dt)
    }

    fn emit_identity(&self) -> TokenStream {
        helpers::emit_identity_mysql()
    }

    fn drop_index_requires_table(&self) -> bool {
        true
    }
}
