//! Identifier quoting and constraint naming.
//!
//! Two jobs live here:
//!
//! - [`IdentifierPreparer`] decides whether an identifier survives unquoted
//!   on a dialect and quotes it when it does not.
//! - [`NamingConvention`] turns templates such as
//!   `uq_%(table_name)s_%(column_0_name)s` into constraint and index names,
//!   truncating over-long results deterministically.
//!
//! # Template tokens
//!
//! | Token | Value |
//! |-------|-------|
//! | `table_name` | owning table |
//! | `referred_table_name` | foreign key target table |
//! | `constraint_name` | the constraint's explicit name |
//! | `column_<i>_name` | i-th column |
//! | `column_<i>_label` | `<table>_<column>` for the i-th column |
//! | `column_<i>_key` | same as `name` |
//! | `column_<i>_N_name` | columns from i on, joined with `_` |
//! | `column_<i>N_name` | columns from i on, joined with nothing |
//! | `referred_column_...` | the same forms over the referenced columns |
//!
//! Custom tokens are closures registered with [`NamingConvention::with_token`].

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::dialect::{IdentifierCase, SqlDialect};
use crate::error::{Error, Result};

// =============================================================================
// Identifier quoting
// =============================================================================

/// Formats identifiers for one dialect, quoting only when needed.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierPreparer<'d> {
    dialect: &'d dyn SqlDialect,
}

impl<'d> IdentifierPreparer<'d> {
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self { dialect }
    }

    /// True when `name` is reserved, would be case-folded, or contains
    /// characters outside `[A-Za-z0-9_$]` (or starts with a digit or `$`).
    pub fn requires_quoting(&self, name: &str) -> bool {
        let Some(first) = name.chars().next() else {
            return true;
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return true;
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            return true;
        }
        let folds = match self.dialect.identifier_case() {
            IdentifierCase::Lower => name.chars().any(|c| c.is_ascii_uppercase()),
            IdentifierCase::Upper => name.chars().any(|c| c.is_ascii_lowercase()),
        };
        if folds {
            return true;
        }
        self.dialect
            .reserved_words()
            .contains(name.to_ascii_lowercase().as_str())
    }

    /// Quote unconditionally, doubling embedded quote characters.
    pub fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    /// Quote only if [`requires_quoting`](Self::requires_quoting).
    pub fn format(&self, name: &str) -> String {
        if self.requires_quoting(name) {
            self.quote(name)
        } else {
            name.to_string()
        }
    }

    /// Format `schema.name`, each part independently.
    pub fn format_qualified(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(s) => format!("{}.{}", self.format(s), self.format(name)),
            None => self.format(name),
        }
    }
}

// =============================================================================
// Truncation
// =============================================================================

/// Width of the hash suffix appended to truncated names.
const HASH_SUFFIX_LEN: usize = 4;

/// Shorten `name` to at most `max_len` characters.
///
/// Over-long names keep their first `max_len - 4` characters followed by
/// the first four hex digits of the SHA-256 of the full name, so the same
/// input always truncates to the same output.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let keep = max_len.saturating_sub(HASH_SUFFIX_LEN);
    let prefix: String = name.chars().take(keep).collect();
    let suffix_len = max_len.min(HASH_SUFFIX_LEN);
    format!("{}{}", prefix, &digest[..suffix_len])
}

/// Reject explicit names the dialect cannot hold.
pub fn check_identifier_length(name: &str, max_len: usize) -> Result<()> {
    if name.chars().count() > max_len {
        return Err(Error::IdentifierTooLong {
            name: name.to_string(),
            max: max_len,
        });
    }
    Ok(())
}

// =============================================================================
// Naming conventions
// =============================================================================

/// Kinds of named schema items a convention can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Index,
}

impl ConstraintKind {
    /// Convention key: `pk`, `fk`, `uq`, `ck` or `ix`.
    pub fn key(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "pk",
            ConstraintKind::ForeignKey => "fk",
            ConstraintKind::Unique => "uq",
            ConstraintKind::Check => "ck",
            ConstraintKind::Index => "ix",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "pk" => Some(ConstraintKind::PrimaryKey),
            "fk" => Some(ConstraintKind::ForeignKey),
            "uq" => Some(ConstraintKind::Unique),
            "ck" => Some(ConstraintKind::Check),
            "ix" => Some(ConstraintKind::Index),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Everything a template or custom token can see about a constraint and
/// its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo<'a> {
    pub kind: ConstraintKind,
    pub name: Option<&'a str>,
    pub table_name: &'a str,
    pub column_names: Vec<&'a str>,
    pub referred_table_name: Option<&'a str>,
    pub referred_column_names: Vec<&'a str>,
}

impl<'a> ConstraintInfo<'a> {
    pub fn new(kind: ConstraintKind, table_name: &'a str, column_names: Vec<&'a str>) -> Self {
        Self {
            kind,
            name: None,
            table_name,
            column_names,
            referred_table_name: None,
            referred_column_names: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub fn referring(mut self, table: &'a str, columns: Vec<&'a str>) -> Self {
        self.referred_table_name = Some(table);
        self.referred_column_names = columns;
        self
    }
}

/// A user-supplied token: receives the constraint and returns its text.
pub type TokenFn = Arc<dyn Fn(&ConstraintInfo<'_>) -> String + Send + Sync>;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\((\w+)\)s").expect("token pattern is valid"));

static COLUMN_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(referred_)?column_(\d+)(_?N)?_(name|label|key)$")
        .expect("column token pattern is valid")
});

/// Template-driven constraint and index naming.
///
/// The default convention only names indexes (`ix_%(column_0_label)s`),
/// since indexes cannot be created without a name.
#[derive(Clone)]
pub struct NamingConvention {
    templates: BTreeMap<ConstraintKind, String>,
    tokens: BTreeMap<String, TokenFn>,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::empty().with(ConstraintKind::Index, "ix_%(column_0_label)s")
    }
}

impl fmt::Debug for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingConvention")
            .field("templates", &self.templates)
            .field("tokens", &self.tokens.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NamingConvention {
    /// A convention with no templates at all.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
            tokens: BTreeMap::new(),
        }
    }

    /// Build from `key -> template` pairs, e.g. from a config file.
    pub fn from_map<K: AsRef<str>, V: Into<String>>(
        map: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self> {
        let mut convention = Self::empty();
        for (key, template) in map {
            let kind = ConstraintKind::from_key(key.as_ref()).ok_or_else(|| {
                Error::argument(format!(
                    "unknown naming convention key '{}'; expected one of pk, fk, uq, ck, ix",
                    key.as_ref()
                ))
            })?;
            convention.templates.insert(kind, template.into());
        }
        Ok(convention)
    }

    /// Set the template for a kind.
    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, kind: ConstraintKind, template: impl Into<String>) -> Self {
        self.templates.insert(kind, template.into());
        self
    }

    /// Register a custom `%(name)s` token.
    #[must_use = "builder methods return a new value"]
    pub fn with_token<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ConstraintInfo<'_>) -> String + Send + Sync + 'static,
    {
        self.tokens.insert(name.into(), Arc::new(f));
        self
    }

    pub fn template(&self, kind: ConstraintKind) -> Option<&str> {
        self.templates.get(&kind).map(String::as_str)
    }

    /// Whether a constraint of this kind ends up with a name, given
    /// whether it was named explicitly.
    pub fn produces_name(&self, kind: ConstraintKind, explicit: bool) -> bool {
        explicit || self.templates.contains_key(&kind)
    }

    /// Resolve the final name for a constraint.
    ///
    /// Explicit names win unless the template embellishes them through
    /// `%(constraint_name)s`. Returns `Ok(None)` when the constraint stays
    /// anonymous.
    pub fn resolve(&self, info: &ConstraintInfo<'_>, max_len: usize) -> Result<Option<String>> {
        let template = self.template(info.kind);
        let resolved = match (info.name, template) {
            (Some(_), Some(t)) if t.contains("%(constraint_name)s") => {
                Some(truncate_name(&self.render(t, info)?, max_len))
            }
            (Some(name), _) => {
                check_identifier_length(name, max_len)?;
                Some(name.to_string())
            }
            (None, Some(t)) => Some(truncate_name(&self.render(t, info)?, max_len)),
            (None, None) => None,
        };
        if let Some(name) = &resolved {
            tracing::trace!(kind = %info.kind, table = info.table_name, name = %name, "resolved constraint name");
        }
        Ok(resolved)
    }

    /// Substitute every `%(token)s` in `template`.
    pub fn render(&self, template: &str, info: &ConstraintInfo<'_>) -> Result<String> {
        let mut out = String::with_capacity(template.len() + 16);
        let mut last = 0;
        for caps in TOKEN_RE.captures_iter(template) {
            let whole = caps.get(0).ok_or_else(|| Error::compile("empty token match"))?;
            out.push_str(&template[last..whole.start()]);
            out.push_str(&self.token_value(&caps[1], template, info)?);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }

    fn token_value(&self, token: &str, template: &str, info: &ConstraintInfo<'_>) -> Result<String> {
        if let Some(f) = self.tokens.get(token) {
            return Ok(f(info));
        }
        match token {
            "table_name" => return Ok(info.table_name.to_string()),
            "referred_table_name" => {
                return info.referred_table_name.map(str::to_string).ok_or_else(|| {
                    Error::compile(format!(
                        "naming convention '{}' uses %(referred_table_name)s but the {} constraint on '{}' has no referred table",
                        template, info.kind, info.table_name
                    ))
                })
            }
            "constraint_name" => {
                return info.name.map(str::to_string).ok_or_else(|| {
                    Error::compile(format!(
                        "naming convention '{}' includes %(constraint_name)s, which requires the {} constraint on '{}' to be explicitly named",
                        template, info.kind, info.table_name
                    ))
                })
            }
            _ => {}
        }

        let caps = COLUMN_TOKEN_RE.captures(token).ok_or_else(|| {
            Error::compile(format!(
                "naming convention token '{}' in '{}' is not recognized",
                token, template
            ))
        })?;

        let referred = caps.get(1).is_some();
        let index: usize = caps[2]
            .parse()
            .map_err(|_| Error::compile(format!("bad column index in token '{}'", token)))?;
        let joiner = caps.get(3).map(|m| if m.as_str() == "_N" { "_" } else { "" });
        let attr = &caps[4];

        let (columns, table) = if referred {
            let table = info.referred_table_name.ok_or_else(|| {
                Error::compile(format!(
                    "naming convention token '{}' needs a foreign key, but the constraint on '{}' is a {} constraint",
                    token, info.table_name, info.kind
                ))
            })?;
            (&info.referred_column_names, table)
        } else {
            (&info.column_names, info.table_name)
        };

        if index >= columns.len() {
            return Err(Error::compile(format!(
                "naming convention token '{}' refers to column {} but the {} constraint on '{}' has {} column(s)",
                token,
                index,
                info.kind,
                info.table_name,
                columns.len()
            )));
        }

        let render_one = |col: &str| match attr {
            "label" => format!("{}_{}", table, col),
            _ => col.to_string(),
        };

        Ok(match joiner {
            Some(sep) => columns[index..]
                .iter()
                .map(|c| render_one(c))
                .collect::<Vec<_>>()
                .join(sep),
            None => render_one(columns[index]),
        })
    }
}

impl TryFrom<HashMap<String, String>> for NamingConvention {
    type Error = Error;

    fn try_from(map: HashMap<String, String>) -> Result<Self> {
        NamingConvention::from_map(map)
    }
}
