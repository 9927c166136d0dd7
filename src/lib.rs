//! # sqlweave
//!
//! A SQL expression language and statement compiler for several dialects,
//! with a schema model that emits DDL in dependency order.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Schema (MetaData, Table, Constraint)          │
//! │   declarations, FK resolution, naming, dependency sort   │
//! └─────────────────────────────────────────────────────────┘
//!            │ table_ref()                 │ create_all() / drop_all()
//!            ▼                             ▼
//! ┌───────────────────────────┐  ┌──────────────────────────┐
//! │  Expressions & Statements  │  │     DDL statements        │
//! │ (Expr, Select, Insert ...) │  │ (CreateTable, AlterTable) │
//! └───────────────────────────┘  └──────────────────────────┘
//!            │ compile()                   │ to_sql()
//!            ▼                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        Tokens → dialect-specific SQL + parameters        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! let mut metadata = MetaData::new();
//! let users = metadata.add_table(
//!     Table::new("users")
//!         .column(Column::new("id", DataType::Int64).primary_key())
//!         .column(Column::new("name", DataType::Varchar(50))),
//! )?;
//! let users = metadata.table_ref(users)?;
//!
//! let query = select([users.c("name")?]).filter(users.c("id")?.eq(5));
//! let compiled = query.compile(&Dialect::Postgres)?;
//! assert_eq!(compiled.sql, "SELECT name\nFROM users\nWHERE id = $1");
//! ```

pub mod config;
pub mod error;
pub mod schema;
pub mod sql;

pub use error::{Error, Result};

// Re-export SQL submodules at crate level
pub use sql::compiler;
pub use sql::ddl;
pub use sql::dialect;
pub use sql::dml;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::dialect::{ConfiguredDialect, Dialect, ParamStyle, SqlDialect};
    pub use crate::expr::{
        // Constructors
        and_,
        avg,
        bindparam,
        bindparam_value,
        case,
        coalesce,
        count,
        count_star,
        exists,
        func,
        literal,
        max,
        min,
        not_,
        null,
        or_,
        sum,
        text,
        // Types
        Expr,
        ExprExt,
        SortDir,
    };
    pub use crate::compiler::{compile, CompileOptions, CompiledStatement, Statement};
    pub use crate::ddl::{create_all, drop_all, DdlStatement};
    pub use crate::dml::{delete, insert, update};
    pub use crate::query::{select, CompoundSelect, Select};
    pub use crate::schema::{
        Column, Constraint, ForeignKey, ForeignKeyConstraint, Index, MetaData, ReferentialAction,
        Table, TableId,
    };
    pub use crate::sql::naming::NamingConvention;
    pub use crate::sql::selectable::{AliasRef, TableClause, TableRef};
    pub use crate::sql::types::{DataType, Value};
    pub use crate::{Error, Result};
}

// Also export at crate root for convenience
pub use dialect::Dialect;
pub use schema::MetaData;
