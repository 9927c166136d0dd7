//! SQL generation module.
//!
//! This module provides the expression language and the compiler that turns
//! it into dialect-specific SQL. It includes:
//!
//! - [`expr`] - Expression AST and builder DSL
//! - [`selectable`] - Tables, aliases and joins usable in FROM
//! - [`query`] - SELECT and compound SELECT builders
//! - [`dml`] - INSERT, UPDATE and DELETE builders
//! - [`compiler`] - Statement compilation with bound parameters
//! - [`ddl`] - CREATE / ALTER / DROP for tables, constraints and indexes
//! - [`naming`] - Identifier quoting, truncation and naming conventions
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod compiler;
pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod naming;
pub mod query;
pub mod selectable;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use compiler::{
    compile, compile_with, BoundParameter, CompileOptions, CompiledStatement, Statement,
};
pub use dialect::{ConfiguredDialect, Dialect, ParamStyle, SqlDialect};
pub use expr::{
    and_, avg, bindparam, bindparam_value, case, coalesce, count, count_distinct, count_star,
    exists, false_, func, literal, lower, max, min, not_, null, or_, sum, text, true_,
    BinaryOperator, Expr, ExprExt, NullsOrder, SortDir, UnaryOperator,
};
pub use naming::{ConstraintInfo, ConstraintKind, NamingConvention};
pub use query::{select, CompoundSelect, Select, SetOperator};
pub use selectable::{AliasRef, Cte, Join, JoinKind, TableClause, TableRef};
pub use token::{Token, TokenStream};
pub use types::{DataType, Value};

// Re-export DDL types
pub use ddl::{
    add_constraint, create_all, create_index, create_table, drop_all, drop_constraint, drop_index,
    drop_table, AlterAction, AlterTable, ColumnDef, CreateIndex, CreateTable, DdlStatement,
    DropIndex, DropTable, TableConstraint,
};

// Re-export DML types
pub use dml::{delete, insert, update, Delete, Insert, Update};
