//! ANSI SQL dialect - the default.
//!
//! Double-quoted identifiers, named `:param` placeholders and the
//! standard `OFFSET n ROWS FETCH FIRST m ROWS ONLY` pagination.

use super::super::token::{Token, TokenStream};

use super::helpers;
use super::SqlDialect;

/// ANSI SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        if b {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(off) = offset {
            ts.push(Token::Offset)
                .space()
                .push(Token::LitInt(off as i64))
                .space()
                .push(Token::Rows);
        }

        if let Some(lim) = limit {
            if offset.is_some() {
                ts.space();
            }
            ts.push(Token::Fetch)
                .space()
                .push(Token::First)
                .space()
                .push(Token::LitInt(lim as i64))
                .space()
                .push(Token::Rows)
                .space()
                .push(Token::Only);
        }

        ts
    }
}
