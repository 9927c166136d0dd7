//! DDL (Data Definition Language) support.
//!
//! Two layers:
//!
//! - Statement builders ([`CreateTable`], [`AlterTable`], [`DropTable`],
//!   [`CreateIndex`], [`DropIndex`]) that render to SQL for any dialect.
//! - Functions that derive those statements from a [`MetaData`]: single
//!   statements ([`create_table`], [`add_constraint`], ...) and whole-schema
//!   sequences ([`create_all`], [`drop_all`]) ordered by the dependency
//!   sorter.
//!
//! # Examples
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! for statement in create_all(&metadata, &Dialect::Postgres)? {
//!     println!("{}", statement.to_sql(&Dialect::Postgres));
//! }
//! ```
//!
//! Constraint and index names are resolved through the metadata's naming
//! convention when the statement is built, so one statement renders the
//! same way every time.

use super::compiler::{inline_expression, literal_token};
use super::dialect::SqlDialect;
use super::token::{Token, TokenStream};
use crate::error::{Error, Result};
use crate::schema::{
    sort_tables_and_constraints, sort_tables_for_drop, CheckCondition, Constraint, Index,
    MetaData, ReferentialAction, ServerDefault, TableId,
};

pub use super::types::DataType;

/// DDL statement types.
#[derive(Debug, Clone, PartialEq)]
pub enum DdlStatement {
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    DropTable(DropTable),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
}

impl DdlStatement {
    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        match self {
            DdlStatement::CreateTable(ct) => ct.to_tokens(dialect),
            DdlStatement::AlterTable(at) => at.to_tokens(dialect),
            DdlStatement::DropTable(dt) => dt.to_tokens(dialect),
            DdlStatement::CreateIndex(ci) => ci.to_tokens(dialect),
            DdlStatement::DropIndex(di) => di.to_tokens(dialect),
        }
    }
}

impl From<CreateTable> for DdlStatement {
    fn from(s: CreateTable) -> Self {
        DdlStatement::CreateTable(s)
    }
}

impl From<AlterTable> for DdlStatement {
    fn from(s: AlterTable) -> Self {
        DdlStatement::AlterTable(s)
    }
}

impl From<DropTable> for DdlStatement {
    fn from(s: DropTable) -> Self {
        DdlStatement::DropTable(s)
    }
}

impl From<CreateIndex> for DdlStatement {
    fn from(s: CreateIndex) -> Self {
        DdlStatement::CreateIndex(s)
    }
}

impl From<DropIndex> for DdlStatement {
    fn from(s: DropIndex) -> Self {
        DdlStatement::DropIndex(s)
    }
}

fn push_table_name(ts: &mut TokenStream, schema: &Option<String>, name: &str) {
    ts.push(Token::QualifiedIdent {
        schema: schema.clone(),
        name: name.to_string(),
    });
}

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTable {
    pub if_not_exists: bool,
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
}

impl CreateTable {
    /// Create a new CREATE TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_not_exists: false,
            schema: None,
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add IF NOT EXISTS clause.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Add a column definition.
    pub fn column(mut self, col: ColumnDef) -> Self {
        self.columns.push(col);
        self
    }

    /// Add a table constraint.
    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Create).space().push(Token::Table);

        if self.if_not_exists && dialect.supports_if_not_exists() {
            ts.space()
                .push(Token::If)
                .space()
                .push(Token::Not)
                .space()
                .push(Token::Exists);
        }

        ts.space();
        push_table_name(&mut ts, &self.schema, &self.name);
        ts.space().lparen();

        let mut first = true;
        for col in &self.columns {
            if !first {
                ts.comma_space();
            }
            first = false;
            ts.append(&col.to_tokens(dialect));
        }
        for constraint in &self.constraints {
            if !first {
                ts.comma_space();
            }
            first = false;
            ts.append(&constraint.to_tokens());
        }

        ts.rparen();
        ts
    }
}

// ============================================================================
// Column Definition
// ============================================================================

/// Column definition for CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
    /// Rendered `DEFAULT` expression.
    pub default: Option<TokenStream>,
    pub identity: bool,
}

impl ColumnDef {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            not_null: false,
            default: None,
            identity: false,
        }
    }

    /// Mark column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set the DEFAULT clause.
    pub fn default(mut self, tokens: TokenStream) -> Self {
        self.default = Some(tokens);
        self
    }

    /// Add the dialect's identity (auto-increment) clause.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// `name TYPE [identity] [DEFAULT x] [NOT NULL]`
    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.ident(self.name.clone());
        ts.space()
            .push(Token::Raw(dialect.emit_data_type(&self.data_type)));

        if self.identity {
            let identity = dialect.emit_identity();
            if !identity.is_empty() {
                ts.space().append(&identity);
            }
        }

        if let Some(default) = &self.default {
            ts.space().push(Token::Default).space().append(default);
        }

        if self.not_null {
            ts.space().push(Token::Not).space().push(Token::Null);
        }

        ts
    }
}

// ============================================================================
// Table Constraints
// ============================================================================

/// Table-level constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey {
        name: Option<String>,
        columns: Vec<String>,
    },
    Unique {
        name: Option<String>,
        columns: Vec<String>,
    },
    ForeignKey {
        name: Option<String>,
        columns: Vec<String>,
        references_schema: Option<String>,
        references_table: String,
        references_columns: Vec<String>,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    },
    Check {
        name: Option<String>,
        condition: TokenStream,
    },
}

impl TableConstraint {
    /// Create a PRIMARY KEY constraint.
    pub fn primary_key(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        TableConstraint::PrimaryKey {
            name: None,
            columns: columns.into_iter().map(|c| c.into()).collect(),
        }
    }

    /// Create a UNIQUE constraint.
    pub fn unique(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        TableConstraint::Unique {
            name: None,
            columns: columns.into_iter().map(|c| c.into()).collect(),
        }
    }

    /// Create a FOREIGN KEY constraint.
    pub fn foreign_key(
        columns: impl IntoIterator<Item = impl Into<String>>,
        references_table: impl Into<String>,
        references_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        TableConstraint::ForeignKey {
            name: None,
            columns: columns.into_iter().map(|c| c.into()).collect(),
            references_schema: None,
            references_table: references_table.into(),
            references_columns: references_columns.into_iter().map(|c| c.into()).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Create a CHECK constraint from rendered tokens.
    pub fn check(condition: TokenStream) -> Self {
        TableConstraint::Check {
            name: None,
            condition,
        }
    }

    /// Set or clear the constraint name.
    pub fn named(mut self, new_name: Option<String>) -> Self {
        match &mut self {
            TableConstraint::PrimaryKey { name, .. }
            | TableConstraint::Unique { name, .. }
            | TableConstraint::ForeignKey { name, .. }
            | TableConstraint::Check { name, .. } => *name = new_name,
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TableConstraint::PrimaryKey { name, .. }
            | TableConstraint::Unique { name, .. }
            | TableConstraint::ForeignKey { name, .. }
            | TableConstraint::Check { name, .. } => name.as_deref(),
        }
    }

    /// `[CONSTRAINT name] <body>`
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        if let Some(n) = self.name() {
            ts.push(Token::Constraint).space().ident(n).space();
        }

        match self {
            TableConstraint::PrimaryKey { columns, .. } => {
                ts.push(Token::Primary).space().push(Token::Key).space();
                emit_column_list(&mut ts, columns);
            }
            TableConstraint::Unique { columns, .. } => {
                ts.push(Token::Unique).space();
                emit_column_list(&mut ts, columns);
            }
            TableConstraint::ForeignKey {
                columns,
                references_schema,
                references_table,
                references_columns,
                on_delete,
                on_update,
                ..
            } => {
                ts.push(Token::Foreign).space().push(Token::Key).space();
                emit_column_list(&mut ts, columns);
                ts.space().push(Token::References).space();
                push_table_name(&mut ts, references_schema, references_table);
                ts.space();
                emit_column_list(&mut ts, references_columns);
                if let Some(action) = on_delete {
                    ts.space()
                        .push(Token::On)
                        .space()
                        .push(Token::Delete)
                        .space()
                        .push(action.token());
                }
                if let Some(action) = on_update {
                    ts.space()
                        .push(Token::On)
                        .space()
                        .push(Token::Update)
                        .space()
                        .push(action.token());
                }
            }
            TableConstraint::Check { condition, .. } => {
                ts.push(Token::Check).space().lparen().append(condition).rparen();
            }
        }

        ts
    }
}

// ============================================================================
// ALTER TABLE
// ============================================================================

/// ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct AlterTable {
    pub schema: Option<String>,
    pub name: String,
    pub actions: Vec<AlterAction>,
}

impl AlterTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn add_constraint(mut self, constraint: TableConstraint) -> Self {
        self.actions.push(AlterAction::AddConstraint(constraint));
        self
    }

    pub fn drop_constraint(mut self, name: impl Into<String>) -> Self {
        self.actions.push(AlterAction::DropConstraint { name: name.into() });
        self
    }

    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, _dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Alter).space().push(Token::Table).space();
        push_table_name(&mut ts, &self.schema, &self.name);
        ts.space();

        let mut first = true;
        for action in &self.actions {
            if !first {
                ts.comma_space();
            }
            first = false;
            ts.append(&action.to_tokens());
        }
        ts
    }
}

/// One action of an ALTER TABLE.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddConstraint(TableConstraint),
    DropConstraint { name: String },
}

impl AlterAction {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            // The constraint brings its own CONSTRAINT keyword when named.
            AlterAction::AddConstraint(constraint) => {
                ts.push(Token::Add).space().append(&constraint.to_tokens());
            }
            AlterAction::DropConstraint { name } => {
                ts.push(Token::Drop)
                    .space()
                    .push(Token::Constraint)
                    .space()
                    .ident(name.clone());
            }
        }
        ts
    }
}

// ============================================================================
// DROP TABLE
// ============================================================================

/// DROP TABLE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropTable {
    pub if_exists: bool,
    pub schema: Option<String>,
    pub name: String,
}

impl DropTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_exists: false,
            schema: None,
            name: name.into(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space().push(Token::Table);
        if self.if_exists && dialect.supports_if_exists() {
            ts.space().push(Token::If).space().push(Token::Exists);
        }
        ts.space();
        push_table_name(&mut ts, &self.schema, &self.name);
        ts
    }
}

// ============================================================================
// CREATE INDEX / DROP INDEX
// ============================================================================

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateIndex {
    pub unique: bool,
    pub if_not_exists: bool,
    pub name: String,
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
}

impl CreateIndex {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            unique: false,
            if_not_exists: false,
            name: name.into(),
            schema: None,
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Create).space();
        if self.unique {
            ts.push(Token::Unique).space();
        }
        ts.push(Token::Index);
        if self.if_not_exists && dialect.supports_if_not_exists() {
            ts.space()
                .push(Token::If)
                .space()
                .push(Token::Not)
                .space()
                .push(Token::Exists);
        }
        ts.space().ident(self.name.clone()).space().push(Token::On).space();
        push_table_name(&mut ts, &self.schema, &self.table);
        ts.space();
        emit_column_list(&mut ts, &self.columns);
        ts
    }
}

/// DROP INDEX statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropIndex {
    pub if_exists: bool,
    pub name: String,
    pub schema: Option<String>,
    /// Named by `DROP INDEX ... ON table` on dialects that need it.
    pub table: String,
}

impl DropIndex {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            if_exists: false,
            name: name.into(),
            schema: None,
            table: table.into(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space().push(Token::Index);
        if self.if_exists && dialect.supports_if_exists() {
            ts.space().push(Token::If).space().push(Token::Exists);
        }
        ts.space();
        if dialect.drop_index_requires_table() {
            ts.ident(self.name.clone()).space().push(Token::On).space();
            push_table_name(&mut ts, &self.schema, &self.table);
        } else {
            push_table_name(&mut ts, &self.schema, &self.name);
        }
        ts
    }
}

// ============================================================================
// Schema-driven DDL
// ============================================================================

/// CREATE TABLE for a registered table.
///
/// Every foreign key is rendered inline except `use_alter` ones, which are
/// left for [`add_constraint`] on dialects that support it.
pub fn create_table(metadata: &MetaData, table: TableId, dialect: &dyn SqlDialect) -> Result<CreateTable> {
    let alter = dialect.supports_alter_constraint();
    let skip: Vec<usize> = metadata
        .table(table)?
        .foreign_key_constraints()
        .filter(|(_, fk)| alter && fk.use_alter)
        .map(|(i, _)| i)
        .collect();
    build_create_table(metadata, table, dialect, &skip)
}

fn build_create_table(
    metadata: &MetaData,
    id: TableId,
    dialect: &dyn SqlDialect,
    skip: &[usize],
) -> Result<CreateTable> {
    let table = metadata.table(id)?;
    let mut create = CreateTable::new(table.name.clone());
    create.schema = table.schema.clone();

    for column in table.columns() {
        let data_type = metadata.column_type(id, &column.name)?.ok_or_else(|| {
            Error::compile(format!(
                "column '{}' on table '{}' has no type and no foreign key to take one from",
                column.name,
                table.key()
            ))
        })?;
        let identity = column.autoincrement && data_type.is_integer();
        let mut def = ColumnDef::new(column.name.clone(), data_type);
        def.identity = identity;
        def.not_null = !column.nullable;
        def.default = match &column.server_default {
            Some(ServerDefault::Value(value)) => {
                let mut ts = TokenStream::new();
                ts.push(literal_token(value)?);
                Some(ts)
            }
            Some(ServerDefault::Text(sql)) => {
                let mut ts = TokenStream::new();
                ts.push(Token::Raw(sql.clone()));
                Some(ts)
            }
            None => None,
        };
        create.columns.push(def);
    }

    for (position, constraint) in table.constraints().iter().enumerate() {
        if skip.contains(&position) {
            continue;
        }
        create
            .constraints
            .push(table_constraint(metadata, id, constraint, dialect)?);
    }

    Ok(create)
}

/// Lower a schema constraint to its DDL form, resolving its name.
fn table_constraint(
    metadata: &MetaData,
    id: TableId,
    constraint: &Constraint,
    dialect: &dyn SqlDialect,
) -> Result<TableConstraint> {
    let name = metadata.constraint_name(id, constraint, dialect.max_identifier_length())?;
    let lowered = match constraint {
        Constraint::PrimaryKey { columns, .. } => TableConstraint::primary_key(columns.clone()),
        Constraint::Unique { columns, .. } => TableConstraint::unique(columns.clone()),
        Constraint::ForeignKey(fk) => {
            let table = metadata.table(id)?;
            let target = metadata.resolve_foreign_key(table, fk)?;
            let referred = metadata.table(target.table)?;
            TableConstraint::ForeignKey {
                name: None,
                columns: fk.columns.clone(),
                references_schema: referred.schema.clone(),
                references_table: referred.name.clone(),
                references_columns: target.columns.clone(),
                on_delete: fk.on_delete,
                on_update: fk.on_update,
            }
        }
        Constraint::Check { condition, .. } => {
            let tokens = match condition {
                CheckCondition::Text(sql) => {
                    let mut ts = TokenStream::new();
                    ts.push(Token::Raw(sql.clone()));
                    ts
                }
                CheckCondition::Expr(expr) => {
                    inline_expression(dialect, &metadata.table_ref(id)?, expr)?
                }
            };
            TableConstraint::check(tokens)
        }
    };
    Ok(lowered.named(name))
}

/// DROP TABLE for a registered table.
pub fn drop_table(metadata: &MetaData, table: TableId) -> Result<DropTable> {
    let table = metadata.table(table)?;
    let mut drop = DropTable::new(table.name.clone());
    drop.schema = table.schema.clone();
    Ok(drop)
}

/// CREATE INDEX for an index of a registered table.
pub fn create_index(
    metadata: &MetaData,
    table: TableId,
    index: &Index,
    dialect: &dyn SqlDialect,
) -> Result<CreateIndex> {
    let name = metadata.index_name(table, index, dialect.max_identifier_length())?;
    let table = metadata.table(table)?;
    let mut create = CreateIndex::new(name, table.name.clone());
    create.schema = table.schema.clone();
    create.unique = index.unique;
    create.columns = index.columns.clone();
    Ok(create)
}

/// DROP INDEX for an index of a registered table.
pub fn drop_index(
    metadata: &MetaData,
    table: TableId,
    index: &Index,
    dialect: &dyn SqlDialect,
) -> Result<DropIndex> {
    let name = metadata.index_name(table, index, dialect.max_identifier_length())?;
    let table = metadata.table(table)?;
    let mut drop = DropIndex::new(name, table.name.clone());
    drop.schema = table.schema.clone();
    Ok(drop)
}

/// `ALTER TABLE ... ADD <constraint>`.
pub fn add_constraint(
    metadata: &MetaData,
    table: TableId,
    constraint: &Constraint,
    dialect: &dyn SqlDialect,
) -> Result<AlterTable> {
    require_alter(dialect, "ALTER TABLE ADD CONSTRAINT")?;
    let lowered = table_constraint(metadata, table, constraint, dialect)?;
    let table = metadata.table(table)?;
    let mut alter = AlterTable::new(table.name.clone()).add_constraint(lowered);
    alter.schema = table.schema.clone();
    Ok(alter)
}

/// `ALTER TABLE ... DROP CONSTRAINT name`. The constraint needs a name.
pub fn drop_constraint(
    metadata: &MetaData,
    table: TableId,
    constraint: &Constraint,
    dialect: &dyn SqlDialect,
) -> Result<AlterTable> {
    require_alter(dialect, "ALTER TABLE DROP CONSTRAINT")?;
    let name = metadata
        .constraint_name(table, constraint, dialect.max_identifier_length())?
        .ok_or_else(|| {
            Error::compile(format!(
                "can't emit DROP CONSTRAINT for an unnamed {} constraint on '{}'",
                constraint.kind(),
                metadata
                    .table(table)
                    .map(|t| t.key())
                    .unwrap_or_else(|_| table.to_string())
            ))
        })?;
    let table = metadata.table(table)?;
    let mut alter = AlterTable::new(table.name.clone()).drop_constraint(name);
    alter.schema = table.schema.clone();
    Ok(alter)
}

fn require_alter(dialect: &dyn SqlDialect, feature: &str) -> Result<()> {
    if dialect.supports_alter_constraint() {
        Ok(())
    } else {
        Err(Error::unsupported(dialect.name(), feature))
    }
}

/// Every CREATE statement for the schema, in dependency order.
///
/// Each table is followed by its indexes. Foreign keys deferred by the
/// sorter are added at the end with ALTER TABLE, or kept inline on
/// dialects without ALTER constraint support.
pub fn create_all(metadata: &MetaData, dialect: &dyn SqlDialect) -> Result<Vec<DdlStatement>> {
    let sorted = sort_tables_and_constraints(metadata, &metadata.table_ids())?;
    let alter = dialect.supports_alter_constraint();
    let mut statements = Vec::new();

    for &id in &sorted.tables {
        let skip: Vec<usize> = if alter {
            sorted
                .deferred
                .iter()
                .filter(|d| d.table == id)
                .map(|d| d.constraint)
                .collect()
        } else {
            Vec::new()
        };
        statements.push(build_create_table(metadata, id, dialect, &skip)?.into());
        for index in metadata.table(id)?.indexes() {
            statements.push(create_index(metadata, id, index, dialect)?.into());
        }
    }

    if alter {
        for deferred in &sorted.deferred {
            let table = metadata.table(deferred.table)?;
            let constraint = &table.constraints()[deferred.constraint];
            statements.push(add_constraint(metadata, deferred.table, constraint, dialect)?.into());
        }
    }

    tracing::debug!(
        dialect = dialect.name(),
        tables = sorted.tables.len(),
        deferred = sorted.deferred.len(),
        statements = statements.len(),
        "generated CREATE sequence"
    );
    Ok(statements)
}

/// Every DROP statement for the schema, in reverse dependency order.
///
/// Named deferred foreign keys are dropped first with ALTER TABLE. On
/// dialects with ALTER constraint support, a cycle whose deferred key has
/// no name is a [`Error::CircularDependency`].
pub fn drop_all(metadata: &MetaData, dialect: &dyn SqlDialect) -> Result<Vec<DdlStatement>> {
    let ids = metadata.table_ids();
    let alter = dialect.supports_alter_constraint();
    let sorted = if alter {
        sort_tables_for_drop(metadata, &ids)?
    } else {
        let mut sorted = sort_tables_and_constraints(metadata, &ids)?;
        sorted.tables.reverse();
        sorted
    };

    let mut statements = Vec::new();
    if alter {
        for deferred in &sorted.deferred {
            let table = metadata.table(deferred.table)?;
            let constraint = &table.constraints()[deferred.constraint];
            if !metadata.has_resolvable_name(constraint) {
                continue;
            }
            statements.push(drop_constraint(metadata, deferred.table, constraint, dialect)?.into());
        }
    }
    for &id in &sorted.tables {
        statements.push(drop_table(metadata, id)?.into());
    }

    tracing::debug!(
        dialect = dialect.name(),
        tables = sorted.tables.len(),
        statements = statements.len(),
        "generated DROP sequence"
    );
    Ok(statements)
}

// ============================================================================
// Helpers
// ============================================================================

fn emit_column_list(ts: &mut TokenStream, columns: &[String]) {
    ts.lparen();
    let mut first = true;
    for col in columns {
        if !first {
            ts.comma_space();
        }
        first = false;
        ts.ident(col.clone());
    }
    ts.rparen();
}

// ============================================================================
// Tests
// ============================================================================
