//! DML (Data Manipulation Language) support.
//!
//! INSERT, UPDATE and DELETE against a [`TableRef`]. Values are given per
//! column name; plain values become binds named after their column.
//!
//! # Examples
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! // INSERT INTO users (name) VALUES (:name)
//! let ins = insert(&users).values([("name", "jack")]);
//!
//! // UPDATE users SET name=:name WHERE id = :id_1
//! let upd = update(&users)
//!     .values([("name", "ed")])
//!     .filter(users.c("id")?.eq(5));
//!
//! // DELETE FROM users WHERE name = :name_1
//! let del = delete(&users).filter(users.c("name")?.eq("ed"));
//! ```

use std::sync::Arc;

use super::compiler::{CompiledStatement, Compiler, CompileOptions};
use super::dialect::SqlDialect;
use super::expr::{and_, Expr};
use super::query::Select;
use super::selectable::TableRef;
use crate::error::Result;

fn pairs<I, K, V>(values: I) -> Vec<(String, Expr)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Expr>,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn merge(row: &mut Vec<(String, Expr)>, values: Vec<(String, Expr)>) {
    for (key, value) in values {
        match row.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => row.push((key, value)),
        }
    }
}

// ============================================================================
// INSERT
// ============================================================================

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until compiled"]
pub struct Insert {
    pub(crate) table: TableRef,
    pub(crate) rows: Vec<Vec<(String, Expr)>>,
    pub(crate) select: Option<(Vec<String>, Arc<Select>)>,
    pub(crate) returning: Vec<Expr>,
}

/// Start an INSERT into `table`.
pub fn insert(table: &TableRef) -> Insert {
    Insert {
        table: table.clone(),
        rows: Vec::new(),
        select: None,
        returning: Vec::new(),
    }
}

impl Insert {
    /// Set column values for a single-row INSERT. Repeated calls merge.
    pub fn values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Expr>,
    {
        let values = pairs(values);
        match self.rows.first_mut() {
            Some(row) => merge(row, values),
            None => self.rows.push(values),
        }
        self
    }

    /// Rows for a multi-row `VALUES (...), (...)`. Every row must name the
    /// same columns.
    pub fn multi_values<R, I, K, V>(mut self, rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Expr>,
    {
        self.rows.extend(rows.into_iter().map(pairs));
        self
    }

    /// `INSERT INTO table (columns) SELECT ...`
    pub fn from_select<C>(mut self, columns: C, select: Select) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.select = Some((
            columns.into_iter().map(Into::into).collect(),
            Arc::new(select),
        ));
        self
    }

    /// Add RETURNING entries.
    pub fn returning<I>(mut self, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        self.returning
            .extend(exprs.into_iter().map(|e| e.into().into_select_item()));
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn compile(&self, dialect: &dyn SqlDialect) -> Result<CompiledStatement> {
        Compiler::new(dialect, CompileOptions::default()).compile_insert(self)
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until compiled"]
pub struct Update {
    pub(crate) table: TableRef,
    pub(crate) values: Vec<(String, Expr)>,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) returning: Vec<Expr>,
}

/// Start an UPDATE of `table`.
pub fn update(table: &TableRef) -> Update {
    Update {
        table: table.clone(),
        values: Vec::new(),
        where_clause: None,
        returning: Vec::new(),
    }
}

impl Update {
    /// Set column values. Repeated calls merge.
    pub fn values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Expr>,
    {
        merge(&mut self.values, pairs(values));
        self
    }

    /// Add a WHERE condition, ANDed with any existing one.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => and_([existing, condition]),
            None => condition,
        });
        self
    }

    pub fn returning<I>(mut self, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        self.returning
            .extend(exprs.into_iter().map(|e| e.into().into_select_item()));
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn compile(&self, dialect: &dyn SqlDialect) -> Result<CompiledStatement> {
        Compiler::new(dialect, CompileOptions::default()).compile_update(self)
    }
}

// ============================================================================
// DELETE
// ============================================================================

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until compiled"]
pub struct Delete {
    pub(crate) table: TableRef,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) returning: Vec<Expr>,
}

/// Start a DELETE from `table`.
pub fn delete(table: &TableRef) -> Delete {
    Delete {
        table: table.clone(),
        where_clause: None,
        returning: Vec::new(),
    }
}

impl Delete {
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => and_([existing, condition]),
            None => condition,
        });
        self
    }

    pub fn returning<I>(mut self, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        self.returning
            .extend(exprs.into_iter().map(|e| e.into().into_select_item()));
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn compile(&self, dialect: &dyn SqlDialect) -> Result<CompiledStatement> {
        Compiler::new(dialect, CompileOptions::default()).compile_delete(self)
    }
}
