//! SQLite dialect.
//!
//! - Double-quoted identifiers, `?` placeholders
//! - Booleans are integers
//! - OFFSET requires LIMIT (`LIMIT -1` means unbounded)
//! - No ALTER TABLE ADD/DROP CONSTRAINT: foreign keys always stay inline,
//!   which SQLite accepts because references are checked lazily
//! - Integer primary keys are rowid aliases, so no identity clause

use std::collections::HashSet;

use super::super::token::TokenStream;
use super::helpers;
use super::reserved;
use super::{ParamStyle, SqlDialect};
use crate::sql::types::DataType;

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &reserved::SQLITE
    }

    fn max_identifier_length(&self) -> usize {
        9999
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn param_style(&self) -> ParamStyle {
        ParamStyle::Qmark
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset, "-1")
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn supports_alter_constraint(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_sqlite(dt)
    }

    fn emit_identity(&self) -> TokenStream {
        TokenStream::new()
    }
}
