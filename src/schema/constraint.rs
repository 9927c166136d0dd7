//! Constraints and indexes.
//!
//! Foreign keys name their targets as `table.column` (or
//! `schema.table.column`) strings. The target is looked up in the owning
//! [`MetaData`](super::MetaData) the first time it is needed and the result
//! is cached on the constraint; see [`MetaData::resolve_foreign_key`].
//!
//! [`MetaData::resolve_foreign_key`]: super::MetaData::resolve_foreign_key

use std::fmt;

use once_cell::sync::OnceCell;

use super::TableId;
use crate::sql::expr::Expr;
use crate::sql::naming::ConstraintKind;
use crate::sql::token::Token;

/// ON DELETE / ON UPDATE behavior of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn token(&self) -> Token {
        match self {
            ReferentialAction::Cascade => Token::Cascade,
            ReferentialAction::SetNull => Token::SetNull,
            ReferentialAction::SetDefault => Token::SetDefault,
            ReferentialAction::Restrict => Token::Restrict,
            ReferentialAction::NoAction => Token::NoAction,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        })
    }
}

/// Single-column foreign key declared on a [`Column`](super::Column).
///
/// Becomes a one-column [`ForeignKeyConstraint`] when the table is added to
/// a `MetaData`. Composite keys must be declared as a
/// [`ForeignKeyConstraint`] directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub target: String,
    pub name: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub use_alter: bool,
}

impl ForeignKey {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: None,
            on_delete: None,
            on_update: None,
            use_alter: false,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Create this constraint with ALTER TABLE after all tables exist.
    #[must_use]
    pub fn use_alter(mut self) -> Self {
        self.use_alter = true;
        self
    }

    pub(crate) fn into_constraint(self, column: &str) -> ForeignKeyConstraint {
        ForeignKeyConstraint {
            name: self.name,
            columns: vec![column.to_string()],
            targets: vec![self.target],
            on_delete: self.on_delete,
            on_update: self.on_update,
            use_alter: self.use_alter,
            resolved: OnceCell::new(),
        }
    }
}

/// Where a foreign key points, once looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub table: TableId,
    pub columns: Vec<String>,
}

/// Foreign key over one or more local columns.
#[derive(Debug, Clone)]
pub struct ForeignKeyConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
    /// `table.column` or `schema.table.column`, paired with `columns`.
    pub targets: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub use_alter: bool,
    pub(crate) resolved: OnceCell<ResolvedTarget>,
}

impl ForeignKeyConstraint {
    pub fn new<C, T>(columns: C, targets: T) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            targets: targets.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
            use_alter: false,
            resolved: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    #[must_use]
    pub fn use_alter(mut self) -> Self {
        self.use_alter = true;
        self
    }

    /// The cached resolution, if the target has been looked up.
    pub fn resolved(&self) -> Option<&ResolvedTarget> {
        self.resolved.get()
    }
}

impl PartialEq for ForeignKeyConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.targets == other.targets
            && self.on_delete == other.on_delete
            && self.on_update == other.on_update
            && self.use_alter == other.use_alter
    }
}

/// Predicate of a CHECK constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckCondition {
    /// SQL text, emitted verbatim.
    Text(String),
    /// Expression over the table's columns, rendered with inline values.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    PrimaryKey {
        name: Option<String>,
        columns: Vec<String>,
    },
    ForeignKey(ForeignKeyConstraint),
    Unique {
        name: Option<String>,
        columns: Vec<String>,
    },
    Check {
        name: Option<String>,
        condition: CheckCondition,
    },
}

impl Constraint {
    pub fn primary_key(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Constraint::PrimaryKey {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn unique(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Constraint::Unique {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// CHECK with raw SQL text.
    pub fn check(sql: impl Into<String>) -> Self {
        Constraint::Check {
            name: None,
            condition: CheckCondition::Text(sql.into()),
        }
    }

    /// CHECK with an expression built from the table's columns.
    pub fn check_expr(expr: Expr) -> Self {
        Constraint::Check {
            name: None,
            condition: CheckCondition::Expr(expr),
        }
    }

    /// Give the constraint an explicit name.
    #[must_use]
    pub fn named(mut self, new_name: impl Into<String>) -> Self {
        let new_name = Some(new_name.into());
        match &mut self {
            Constraint::PrimaryKey { name, .. }
            | Constraint::Unique { name, .. }
            | Constraint::Check { name, .. } => *name = new_name,
            Constraint::ForeignKey(fk) => fk.name = new_name,
        }
        self
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::PrimaryKey { .. } => ConstraintKind::PrimaryKey,
            Constraint::ForeignKey(_) => ConstraintKind::ForeignKey,
            Constraint::Unique { .. } => ConstraintKind::Unique,
            Constraint::Check { .. } => ConstraintKind::Check,
        }
    }

    /// The explicitly given name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Constraint::PrimaryKey { name, .. }
            | Constraint::Unique { name, .. }
            | Constraint::Check { name, .. } => name.as_deref(),
            Constraint::ForeignKey(fk) => fk.name.as_deref(),
        }
    }

    /// Local columns the constraint names. CHECK constraints name none.
    pub fn columns(&self) -> &[String] {
        match self {
            Constraint::PrimaryKey { columns, .. } | Constraint::Unique { columns, .. } => columns,
            Constraint::ForeignKey(fk) => &fk.columns,
            Constraint::Check { .. } => &[],
        }
    }

    pub fn as_foreign_key(&self) -> Option<&ForeignKeyConstraint> {
        match self {
            Constraint::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }
}

impl From<ForeignKeyConstraint> for Constraint {
    fn from(fk: ForeignKeyConstraint) -> Self {
        Constraint::ForeignKey(fk)
    }
}

/// Index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Index {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
