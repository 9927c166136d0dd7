//! Schema object model: tables, columns, constraints and the registry
//! that owns them.
//!
//! A [`MetaData`] is an arena of [`Table`]s addressed by [`TableId`].
//! Tables are registered once per name; registering the same name again
//! hands back the original id as long as the columns agree. Foreign keys
//! refer to their targets by name and are resolved against the registry on
//! first use, so tables may be declared in any order.
//!
//! ```ignore
//! let mut metadata = MetaData::new();
//! let users = metadata.add_table(
//!     Table::new("users")
//!         .column(Column::new("id", DataType::Int64).primary_key())
//!         .column(Column::new("name", DataType::Varchar(50))),
//! )?;
//! let addresses = metadata.add_table(
//!     Table::new("addresses")
//!         .column(Column::new("id", DataType::Int64).primary_key())
//!         .column(Column::untyped("user_id").references("users.id")),
//! )?;
//!
//! // users before addresses
//! let order = metadata.sorted_tables()?;
//! ```
//!
//! The registry is meant to be filled during start-up and read afterwards;
//! reads take `&self` and may run concurrently.

pub mod constraint;
pub mod sort;
pub mod table;

pub use constraint::{
    CheckCondition, Constraint, ForeignKey, ForeignKeyConstraint, Index, ReferentialAction,
    ResolvedTarget,
};
pub use sort::{
    sort_tables, sort_tables_and_constraints, sort_tables_for_drop, DeferredConstraint,
    SortedTables,
};
pub use table::{Column, ServerDefault, Table};

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};
use crate::sql::naming::{ConstraintInfo, ConstraintKind, NamingConvention};
use crate::sql::selectable::{split_target, ForeignKeyRef, TableClause, TableColumn, TableRef};
use crate::sql::types::DataType;

/// Handle to a table inside one [`MetaData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

impl TableId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry of tables, unique by `schema.name`.
#[derive(Debug, Clone, Default)]
pub struct MetaData {
    tables: Vec<Table>,
    index: HashMap<String, TableId>,
    naming_convention: NamingConvention,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_naming_convention(mut self, convention: NamingConvention) -> Self {
        self.naming_convention = convention;
        self
    }

    pub fn naming_convention(&self) -> &NamingConvention {
        &self.naming_convention
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a table.
    ///
    /// If the name is already taken, the existing id is returned provided
    /// every supplied column matches an existing column of the same name
    /// and every supplied constraint and index already exists.
    pub fn add_table(&mut self, table: Table) -> Result<TableId> {
        let table = normalize(table)?;
        let key = table.key();

        if let Some(&id) = self.index.get(&key) {
            let existing = &self.tables[id.0];
            for column in &table.columns {
                let Some(current) = existing.get_column(&column.name) else {
                    return Err(Error::SchemaConflict {
                        table: key,
                        detail: format!(
                            "column '{}' is not part of the existing definition",
                            column.name
                        ),
                    });
                };
                if let Some(detail) = current.conflicts_with(column) {
                    return Err(Error::SchemaConflict { table: key, detail });
                }
            }
            // Primary key columns were compared above.
            for constraint in &table.constraints {
                if matches!(constraint, Constraint::PrimaryKey { .. })
                    || existing.constraints.contains(constraint)
                {
                    continue;
                }
                return Err(Error::SchemaConflict {
                    table: key,
                    detail: format!(
                        "{} constraint on ({}) is not part of the existing definition",
                        constraint.kind().key(),
                        constraint.columns().join(", ")
                    ),
                });
            }
            if let Some(index) = table.indexes.iter().find(|i| !existing.indexes.contains(i)) {
                return Err(Error::SchemaConflict {
                    table: key,
                    detail: format!(
                        "index on ({}) is not part of the existing definition",
                        index.columns.join(", ")
                    ),
                });
            }
            tracing::debug!(table = %key, "table already registered; returning existing definition");
            return Ok(id);
        }

        let id = TableId(self.tables.len());
        tracing::debug!(
            table = %key,
            columns = table.columns.len(),
            constraints = table.constraints.len(),
            "registered table"
        );
        self.index.insert(key, id);
        self.tables.push(table);
        Ok(id)
    }

    /// Add a column to a registered table.
    pub fn append_column(&mut self, id: TableId, column: Column) -> Result<()> {
        let table = self.table_mut(id)?;
        if table.get_column(&column.name).is_some() {
            return Err(Error::SchemaConflict {
                table: table.key(),
                detail: format!("column '{}' is already defined", column.name),
            });
        }
        let name = column.name.clone();
        let primary_key = column.primary_key;
        table.columns.push(column);
        if primary_key {
            let pos = table
                .constraints
                .iter()
                .position(|c| matches!(c, Constraint::PrimaryKey { .. }));
            match pos {
                Some(pos) => {
                    if let Constraint::PrimaryKey { columns, .. } = &mut table.constraints[pos] {
                        columns.push(name.clone());
                    }
                }
                None => table
                    .constraints
                    .insert(0, Constraint::primary_key([name.as_str()])),
            }
        }
        let index = table.columns.len() - 1;
        expand_column_shorthand(table, index);
        Ok(())
    }

    /// Add a constraint to a registered table.
    pub fn append_constraint(&mut self, id: TableId, constraint: impl Into<Constraint>) -> Result<()> {
        let constraint = constraint.into();
        let table = self.table_mut(id)?;
        check_columns(table, constraint.columns())?;
        check_foreign_key_shape(table, &constraint)?;
        if let Constraint::PrimaryKey { columns, .. } = &constraint {
            if table
                .constraints
                .iter()
                .any(|c| matches!(c, Constraint::PrimaryKey { .. }))
            {
                return Err(Error::argument(format!(
                    "table '{}' already has a primary key",
                    table.key()
                )));
            }
            mark_primary_key(table, columns);
            table.constraints.insert(0, constraint);
        } else {
            table.constraints.push(constraint);
        }
        Ok(())
    }

    /// Add an index to a registered table.
    pub fn append_index(&mut self, id: TableId, index: Index) -> Result<()> {
        let table = self.table_mut(id)?;
        check_columns(table, &index.columns)?;
        table.indexes.push(index);
        Ok(())
    }

    /// Forget every table. Ids handed out earlier become invalid.
    pub fn clear(&mut self) {
        tracing::debug!(tables = self.tables.len(), "clearing metadata");
        self.tables.clear();
        self.index.clear();
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn table(&self, id: TableId) -> Result<&Table> {
        self.tables
            .get(id.0)
            .ok_or_else(|| Error::NoSuchTable(id.to_string()))
    }

    fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables
            .get_mut(id.0)
            .ok_or_else(|| Error::NoSuchTable(id.to_string()))
    }

    /// Look a table up by `name` or `schema.name`.
    pub fn get(&self, key: &str) -> Option<&Table> {
        self.table_id(key).map(|id| &self.tables[id.0])
    }

    pub fn table_id(&self, key: &str) -> Option<TableId> {
        self.index.get(key).copied()
    }

    /// Tables in registration order.
    pub fn tables(&self) -> impl Iterator<Item = (TableId, &Table)> {
        self.tables.iter().enumerate().map(|(i, t)| (TableId(i), t))
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        (0..self.tables.len()).map(TableId).collect()
    }

    /// Expression view of a table, for building statements.
    pub fn table_ref(&self, id: TableId) -> Result<TableRef> {
        let table = self.table(id)?;
        let mut clause = TableClause::new(table.name.clone());
        clause.schema = table.schema.clone();
        for column in &table.columns {
            clause.columns.push(TableColumn {
                name: column.name.clone(),
                data_type: self.column_type(id, &column.name)?,
                primary_key: column.primary_key,
                nullable: column.nullable,
                default: column.default.clone(),
                autoincrement: column.autoincrement,
            });
        }
        for (_, fk) in table.foreign_key_constraints() {
            clause.foreign_keys.push(ForeignKeyRef {
                name: fk.name.clone(),
                columns: fk.columns.clone(),
                targets: fk.targets.clone(),
            });
        }
        Ok(clause.into_ref())
    }

    /// Expression view of a table looked up by name.
    pub fn table_ref_by_name(&self, key: &str) -> Result<TableRef> {
        let id = self
            .table_id(key)
            .ok_or_else(|| Error::NoSuchTable(key.to_string()))?;
        self.table_ref(id)
    }

    // =========================================================================
    // Foreign keys
    // =========================================================================

    /// Resolve a foreign key of `owner` against this registry.
    ///
    /// Success is cached on the constraint; a failure is not, so the same
    /// constraint resolves once its target has been registered.
    pub fn resolve_foreign_key<'a>(
        &self,
        owner: &Table,
        fk: &'a ForeignKeyConstraint,
    ) -> Result<&'a ResolvedTarget> {
        fk.resolved.get_or_try_init(|| {
            let resolved = self.lookup_target(owner, fk)?;
            tracing::trace!(
                table = %owner.key(),
                targets = ?fk.targets,
                "resolved foreign key"
            );
            Ok(resolved)
        })
    }

    fn lookup_target(&self, owner: &Table, fk: &ForeignKeyConstraint) -> Result<ResolvedTarget> {
        let unresolved = |target: &str, reason: String| Error::UnresolvedReference {
            table: owner.key(),
            target: target.to_string(),
            reason,
        };

        let mut table_id = None;
        let mut columns = Vec::with_capacity(fk.targets.len());
        for target in &fk.targets {
            let (key, column) = split_target(target).ok_or_else(|| {
                unresolved(
                    target,
                    "expected 'table.column' or 'schema.table.column'".to_string(),
                )
            })?;
            let id = self.table_id(&key).ok_or_else(|| {
                unresolved(
                    target,
                    format!("table '{}' is not registered in this MetaData", key),
                )
            })?;
            match table_id {
                None => table_id = Some(id),
                Some(first) if first != id => {
                    return Err(unresolved(
                        target,
                        "all columns of a foreign key must reference the same table".to_string(),
                    ))
                }
                Some(_) => {}
            }
            if self.tables[id.0].get_column(&column).is_none() {
                return Err(unresolved(
                    target,
                    format!("table '{}' has no column '{}'", key, column),
                ));
            }
            columns.push(column);
        }
        let table = table_id.ok_or_else(|| {
            Error::argument(format!(
                "foreign key on table '{}' has no target columns",
                owner.key()
            ))
        })?;
        Ok(ResolvedTarget { table, columns })
    }

    /// Every foreign key of a table with its resolved target.
    pub fn foreign_keys(
        &self,
        id: TableId,
    ) -> Result<Vec<(&ForeignKeyConstraint, &ResolvedTarget)>> {
        let table = self.table(id)?;
        table
            .foreign_key_constraints()
            .map(|(_, fk)| Ok((fk, self.resolve_foreign_key(table, fk)?)))
            .collect()
    }

    /// Declared type of a column, following foreign keys for untyped
    /// columns. `Ok(None)` when no type is declared anywhere along the way.
    pub fn column_type(&self, id: TableId, column: &str) -> Result<Option<DataType>> {
        let mut seen = HashSet::new();
        let mut current = (id, column.to_string());
        loop {
            if !seen.insert(current.clone()) {
                return Ok(None);
            }
            let table = self.table(current.0)?;
            let col = table
                .get_column(&current.1)
                .ok_or_else(|| Error::NoSuchColumn {
                    owner: table.key(),
                    column: current.1.clone(),
                })?;
            if let Some(data_type) = &col.data_type {
                return Ok(Some(data_type.clone()));
            }
            let link = table.foreign_key_constraints().find_map(|(_, fk)| {
                fk.columns
                    .iter()
                    .position(|c| *c == current.1)
                    .map(|pos| (fk, pos))
            });
            let Some((fk, pos)) = link else {
                return Ok(None);
            };
            let target = self.resolve_foreign_key(table, fk)?;
            current = (target.table, target.columns[pos].clone());
        }
    }

    // =========================================================================
    // Naming
    // =========================================================================

    /// Whether the constraint will have a name, explicit or generated.
    pub fn has_resolvable_name(&self, constraint: &Constraint) -> bool {
        self.naming_convention
            .produces_name(constraint.kind(), constraint.name().is_some())
    }

    /// Final name of a constraint under the naming convention.
    pub fn constraint_name(
        &self,
        id: TableId,
        constraint: &Constraint,
        max_len: usize,
    ) -> Result<Option<String>> {
        let table = self.table(id)?;
        let columns: Vec<&str> = constraint.columns().iter().map(String::as_str).collect();
        let mut info = ConstraintInfo::new(constraint.kind(), &table.name, columns)
            .named(constraint.name());
        if let Constraint::ForeignKey(fk) = constraint {
            let target = self.resolve_foreign_key(table, fk)?;
            let referred = &self.tables[target.table.0];
            info = info.referring(
                &referred.name,
                target.columns.iter().map(String::as_str).collect(),
            );
        }
        self.naming_convention.resolve(&info, max_len)
    }

    /// Final name of an index. Unnamed indexes need an `ix` convention.
    pub fn index_name(&self, id: TableId, index: &Index, max_len: usize) -> Result<String> {
        let table = self.table(id)?;
        let columns: Vec<&str> = index.columns.iter().map(String::as_str).collect();
        let info = ConstraintInfo::new(ConstraintKind::Index, &table.name, columns)
            .named(index.name.as_deref());
        self.naming_convention.resolve(&info, max_len)?.ok_or_else(|| {
            Error::compile(format!(
                "index on '{}' ({}) has no name and the naming convention has no 'ix' template",
                table.key(),
                index.columns.join(", ")
            ))
        })
    }

    /// Tables in CREATE order.
    pub fn sorted_tables(&self) -> Result<Vec<TableId>> {
        sort_tables(self, &self.table_ids())
    }
}

// =============================================================================
// Table finalization
// =============================================================================

/// Check a declared table and expand column shorthand into constraints.
fn normalize(mut table: Table) -> Result<Table> {
    let mut seen = HashSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            return Err(Error::argument(format!(
                "table '{}' declares column '{}' more than once",
                table.key(),
                column.name
            )));
        }
    }

    let mut explicit = std::mem::take(&mut table.constraints);
    let pk_positions: Vec<usize> = explicit
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Constraint::PrimaryKey { .. }))
        .map(|(i, _)| i)
        .collect();
    if pk_positions.len() > 1 {
        return Err(Error::argument(format!(
            "table '{}' declares more than one PRIMARY KEY constraint",
            table.key()
        )));
    }
    let primary_key = match pk_positions.first() {
        Some(&pos) => {
            let pk = explicit.remove(pos);
            let columns = pk.columns().to_vec();
            if let Some(stray) = table
                .columns
                .iter()
                .find(|c| c.primary_key && !columns.contains(&c.name))
            {
                return Err(Error::argument(format!(
                    "column '{}' of table '{}' is flagged primary_key but is not part of the table's PRIMARY KEY constraint",
                    stray.name,
                    table.key()
                )));
            }
            check_columns(&table, &columns)?;
            mark_primary_key(&mut table, &columns);
            Some(pk)
        }
        None => {
            let flagged: Vec<String> = table
                .columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name.clone())
                .collect();
            (!flagged.is_empty()).then(|| Constraint::primary_key(flagged))
        }
    };

    // Primary key first, then column shorthand, then the explicit constraints.
    table.constraints.extend(primary_key);
    for i in 0..table.columns.len() {
        expand_column_shorthand(&mut table, i);
    }
    table.constraints.extend(explicit);

    for constraint in &table.constraints {
        check_columns(&table, constraint.columns())?;
        check_foreign_key_shape(&table, constraint)?;
    }
    for index in &table.indexes {
        check_columns(&table, &index.columns)?;
    }
    Ok(table)
}

fn expand_column_shorthand(table: &mut Table, index: usize) {
    let column = &table.columns[index];
    let name = column.name.clone();
    let unique = column.unique;
    let indexed = column.index;
    let foreign_key = column.foreign_key.clone();

    if unique {
        table.constraints.push(Constraint::unique([name.as_str()]));
    }
    if let Some(fk) = foreign_key {
        table
            .constraints
            .push(Constraint::ForeignKey(fk.into_constraint(&name)));
    }
    if indexed {
        table.indexes.push(Index::new([name.as_str()]));
    }
}

fn mark_primary_key(table: &mut Table, columns: &[String]) {
    for column in table.columns.iter_mut() {
        if columns.contains(&column.name) {
            column.primary_key = true;
            column.nullable = false;
        }
    }
}

fn check_columns(table: &Table, columns: &[String]) -> Result<()> {
    for name in columns {
        if table.get_column(name).is_none() {
            return Err(Error::NoSuchColumn {
                owner: table.key(),
                column: name.clone(),
            });
        }
    }
    Ok(())
}

fn check_foreign_key_shape(table: &Table, constraint: &Constraint) -> Result<()> {
    if let Constraint::ForeignKey(fk) = constraint {
        if fk.columns.is_empty() || fk.columns.len() != fk.targets.len() {
            return Err(Error::argument(format!(
                "foreign key on table '{}' pairs {} column(s) with {} target(s)",
                table.key(),
                fk.columns.len(),
                fk.targets.len()
            )));
        }
    }
    Ok(())
}
