//! FROM-clause sources: tables, aliases and joins.
//!
//! A [`TableRef`] is an immutable snapshot of a table's name, columns and
//! foreign keys. It is what expressions point at; it does not hold the
//! [`MetaData`](crate::schema::MetaData) it came from, so foreign keys keep
//! their targets as `table.column` strings and join inference matches them
//! by name.
//!
//! A SELECT is never a FROM source by itself. It must be wrapped in an
//! [`AliasRef`] (see [`Select::subquery`]); converting a bare [`Select`]
//! into a [`FromItem`] does that wrapping and logs a warning.
//!
//! A [`Cte`] is an alias whose body the compiler hoists into a `WITH`
//! prefix. Recursive CTEs are built from the anchor with
//! [`AliasRef::union_all`]; the result shares the anchor's identity, so
//! the recursive member can reference the anchor by its name.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::expr::{and_, AnonName, ColumnRef, Expr, ExprExt, DEFAULT_ANON_BASE};
use super::query::{CompoundElement, CompoundSelect, ExportedColumn, Select, SetOperator};
use super::types::{DataType, Value};
use crate::error::{Error, Result};

// =============================================================================
// Tables
// =============================================================================

/// Column as seen by expressions and DML.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub data_type: Option<DataType>,
    pub primary_key: bool,
    pub nullable: bool,
    /// Client-side default, bound when an INSERT omits the column.
    pub default: Option<Value>,
    pub autoincrement: bool,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, data_type: Option<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            nullable: true,
            default: None,
            autoincrement: false,
        }
    }
}

/// Foreign key with unresolved `[schema.]table.column` targets.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyRef {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub targets: Vec<String>,
}

impl ForeignKeyRef {
    /// Key (`schema.table` or `table`) of the referenced table, if the
    /// targets are well formed and agree on one table.
    pub fn target_table(&self) -> Option<String> {
        let mut tables = self.targets.iter().map(|t| split_target(t).map(|(table, _)| table));
        let first = tables.next()??;
        for t in tables {
            if t.as_deref() != Some(first.as_str()) {
                return None;
            }
        }
        Some(first)
    }

    /// `b.a_id -> a.id`, for error messages.
    pub fn describe(&self, table: &str) -> String {
        format!(
            "{}.{} -> {}",
            table,
            self.columns.join(", "),
            self.targets.join(", ")
        )
    }
}

/// Split a foreign key target into (table key, column).
///
/// Accepts `table.column` and `schema.table.column`.
pub fn split_target(target: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = target.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    match parts.as_slice() {
        [table, column] => Some((table.to_string(), column.to_string())),
        [schema, table, column] => Some((format!("{}.{}", schema, table), column.to_string())),
        _ => None,
    }
}

/// Key a table is registered and matched under.
pub fn table_key(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) => format!("{}.{}", s, name),
        None => name.to_string(),
    }
}

/// A table's name, columns and foreign keys.
///
/// Built from a `MetaData` with `MetaData::table_ref`, or ad hoc:
///
/// ```ignore
/// let users = TableClause::new("users")
///     .column("id", DataType::Int64)
///     .column("name", DataType::String)
///     .into_ref();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableClause {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<TableColumn>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableClause {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(TableColumn::new(name, Some(data_type)));
        self
    }

    #[must_use]
    pub fn primary_key_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        let mut col = TableColumn::new(name, Some(data_type));
        col.primary_key = true;
        col.nullable = false;
        self.columns.push(col);
        self
    }

    /// Add a foreign key: local columns paired with `table.column` targets.
    #[must_use]
    pub fn foreign_key<C, T>(mut self, columns: C, targets: T) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        self.foreign_keys.push(ForeignKeyRef {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            targets: targets.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn key(&self) -> String {
        table_key(self.schema.as_deref(), &self.name)
    }

    pub fn get_column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn into_ref(self) -> TableRef {
        TableRef(Arc::new(self))
    }
}

/// Shared handle to a [`TableClause`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef(Arc<TableClause>);

impl TableRef {
    pub fn new(clause: TableClause) -> Self {
        clause.into_ref()
    }

    pub fn clause(&self) -> &TableClause {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.0.schema.as_deref()
    }

    pub fn key(&self) -> String {
        self.0.key()
    }

    pub fn table_columns(&self) -> &[TableColumn] {
        &self.0.columns
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyRef] {
        &self.0.foreign_keys
    }

    /// Column expression by name.
    pub fn c(&self, name: &str) -> Result<Expr> {
        let col = self.0.get_column(name).ok_or_else(|| Error::NoSuchColumn {
            owner: self.key(),
            column: name.to_string(),
        })?;
        Ok(column_expr(ColumnSource::Table(self.clone()), col))
    }

    /// Every column, in declaration order.
    pub fn columns(&self) -> Vec<Expr> {
        self.0
            .columns
            .iter()
            .map(|col| column_expr(ColumnSource::Table(self.clone()), col))
            .collect()
    }

    /// `table.*`
    pub fn star(&self) -> Expr {
        Expr::Star(Some(ColumnSource::Table(self.clone())))
    }

    /// `table AS name`
    pub fn alias(&self, name: impl Into<String>) -> AliasRef {
        AliasRef::new(AliasTarget::Table(self.clone()), Some(name.into()))
    }
}

fn column_expr(source: ColumnSource, col: &TableColumn) -> Expr {
    Expr::Column(ColumnRef {
        source,
        name: col.name.clone(),
        data_type: col.data_type.clone(),
        anon: None,
    })
}

// =============================================================================
// Aliases
// =============================================================================

/// What an alias renames.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasTarget {
    Table(TableRef),
    Select(Arc<Select>),
    Compound(Arc<CompoundSelect>),
    Cte(Arc<Cte>),
}

/// Body of a common table expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub query: CompoundElement,
    pub recursive: bool,
    /// Identity of the anchor CTE when this one adds recursive members
    /// to it.
    pub restates: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    /// Explicit correlation name; `None` generates `anon_N` per statement.
    pub name: Option<String>,
    pub anon: AnonName,
    pub target: AliasTarget,
}

/// Shared handle to an [`Alias`]. Two handles are the same FROM source
/// when they share an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRef(Arc<Alias>);

impl AliasRef {
    pub fn new(target: AliasTarget, name: Option<String>) -> Self {
        AliasRef(Arc::new(Alias {
            name,
            anon: AnonName::new(DEFAULT_ANON_BASE),
            target,
        }))
    }

    pub(crate) fn new_cte(query: CompoundElement, name: String) -> Self {
        let cte = Cte {
            query,
            recursive: false,
            restates: None,
        };
        AliasRef::new(AliasTarget::Cte(Arc::new(cte)), Some(name))
    }

    pub fn id(&self) -> u64 {
        self.0.anon.id
    }

    /// Identity shared by a CTE and every restatement of it.
    pub fn source_id(&self) -> u64 {
        match &self.0.target {
            AliasTarget::Cte(cte) => cte.restates.unwrap_or(self.0.anon.id),
            _ => self.0.anon.id,
        }
    }

    pub fn cte(&self) -> Option<&Cte> {
        match &self.0.target {
            AliasTarget::Cte(cte) => Some(cte),
            _ => None,
        }
    }

    fn require_cte(&self, operation: &str) -> Result<&Cte> {
        self.cte().ok_or_else(|| {
            Error::argument(format!("{} requires a CTE, not {}", operation, self.description()))
        })
    }

    /// Mark a CTE as `WITH RECURSIVE`.
    pub fn recursive(&self) -> Result<AliasRef> {
        let cte = self.require_cte("recursive()")?;
        let marked = Cte {
            query: cte.query.clone(),
            recursive: true,
            restates: cte.restates,
        };
        Ok(AliasRef(Arc::new(Alias {
            name: self.0.name.clone(),
            anon: self.0.anon.clone(),
            target: AliasTarget::Cte(Arc::new(marked)),
        })))
    }

    /// Add a recursive member with `UNION ALL`. The member may select
    /// from this CTE.
    pub fn union_all(&self, member: impl Into<CompoundElement>) -> Result<AliasRef> {
        self.restate(SetOperator::UnionAll, member.into())
    }

    /// Add a recursive member with `UNION`.
    pub fn union(&self, member: impl Into<CompoundElement>) -> Result<AliasRef> {
        self.restate(SetOperator::Union, member.into())
    }

    fn restate(&self, op: SetOperator, member: CompoundElement) -> Result<AliasRef> {
        let cte = self.require_cte("a recursive member")?;
        let query = CompoundSelect::new(op, cte.query.clone(), member)?;
        let restated = Cte {
            query: CompoundElement::Compound(Arc::new(query)),
            recursive: cte.recursive,
            restates: Some(self.source_id()),
        };
        Ok(AliasRef::new(
            AliasTarget::Cte(Arc::new(restated)),
            self.0.name.clone(),
        ))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn anon(&self) -> &AnonName {
        &self.0.anon
    }

    pub fn target(&self) -> &AliasTarget {
        &self.0.target
    }

    fn exported(&self) -> Vec<ExportedColumn> {
        match &self.0.target {
            AliasTarget::Table(t) => t
                .table_columns()
                .iter()
                .map(|c| ExportedColumn {
                    key: Some(c.name.clone()),
                    anon: None,
                    data_type: c.data_type.clone(),
                })
                .collect(),
            AliasTarget::Select(s) => s.exported_columns(),
            AliasTarget::Compound(c) => c.exported_columns(),
            AliasTarget::Cte(cte) => cte.query.exported_columns(),
        }
    }

    fn exported_expr(&self, exported: &ExportedColumn) -> Expr {
        let name = exported
            .key
            .clone()
            .or_else(|| exported.anon.as_ref().map(|a| a.base.clone()))
            .unwrap_or_else(|| DEFAULT_ANON_BASE.to_string());
        Expr::Column(ColumnRef {
            source: ColumnSource::Alias(self.clone()),
            name,
            data_type: exported.data_type.clone(),
            anon: exported.anon.clone(),
        })
    }

    /// Column expression by exported name.
    pub fn c(&self, name: &str) -> Result<Expr> {
        self.exported()
            .iter()
            .find(|e| e.key.as_deref() == Some(name))
            .map(|e| self.exported_expr(e))
            .ok_or_else(|| Error::NoSuchColumn {
                owner: self.description(),
                column: name.to_string(),
            })
    }

    /// Column expression by 0-based position; reaches unnamed expressions.
    pub fn column_at(&self, index: usize) -> Result<Expr> {
        self.exported()
            .get(index)
            .map(|e| self.exported_expr(e))
            .ok_or_else(|| Error::NoSuchColumn {
                owner: self.description(),
                column: format!("#{}", index),
            })
    }

    pub fn columns(&self) -> Vec<Expr> {
        self.exported()
            .iter()
            .map(|e| self.exported_expr(e))
            .collect()
    }

    pub fn star(&self) -> Expr {
        Expr::Star(Some(ColumnSource::Alias(self.clone())))
    }

    pub fn description(&self) -> String {
        match (&self.0.name, &self.0.target) {
            (Some(n), _) => n.clone(),
            (None, AliasTarget::Table(t)) => format!("anonymous alias of {}", t.key()),
            (None, _) => "anonymous subquery".to_string(),
        }
    }
}

// =============================================================================
// Column Sources
// =============================================================================

/// The table or alias a column belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    Table(TableRef),
    Alias(AliasRef),
}

/// Identity of a FROM source within a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Table(String),
    Alias(u64),
}

impl ColumnSource {
    pub fn key(&self) -> SourceKey {
        match self {
            ColumnSource::Table(t) => SourceKey::Table(t.key()),
            ColumnSource::Alias(a) => SourceKey::Alias(a.source_id()),
        }
    }

    pub fn description(&self) -> String {
        match self {
            ColumnSource::Table(t) => t.key(),
            ColumnSource::Alias(a) => a.description(),
        }
    }
}

impl From<ColumnSource> for FromItem {
    fn from(source: ColumnSource) -> Self {
        match source {
            ColumnSource::Table(t) => FromItem::Table(t),
            ColumnSource::Alias(a) => FromItem::Alias(a),
        }
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

/// `left JOIN right ON on`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: FromItem,
    pub right: FromItem,
    pub on: Expr,
    pub kind: JoinKind,
}

impl Join {
    /// Join with an explicit ON clause.
    pub fn new(
        left: impl Into<FromItem>,
        right: impl Into<FromItem>,
        on: Expr,
        kind: JoinKind,
    ) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            on,
            kind,
        }
    }

    /// Join with the ON clause inferred from the single foreign key that
    /// links the two sides.
    pub fn infer(
        left: impl Into<FromItem>,
        right: impl Into<FromItem>,
        kind: JoinKind,
    ) -> Result<Self> {
        let left = left.into();
        let right = right.into();
        let on = Self::infer_on(&left, &right)?;
        Ok(Self {
            left,
            right,
            on,
            kind,
        })
    }

    /// Equality of the foreign key's column pairs, referenced side first.
    ///
    /// Every table reachable on either side counts, through table aliases
    /// and nested joins. Zero or several linking constraints is an error.
    pub fn infer_on(left: &FromItem, right: &FromItem) -> Result<Expr> {
        let lefts = left.joinable_tables();
        let rights = right.joinable_tables();

        let mut found: Vec<(String, Expr)> = Vec::new();
        let mut seen: HashSet<(String, usize)> = HashSet::new();
        for (r_source, r_table) in &rights {
            for (l_source, l_table) in &lefts {
                collect_links(r_source, r_table, l_source, l_table, &mut seen, &mut found)?;
                collect_links(l_source, l_table, r_source, r_table, &mut seen, &mut found)?;
            }
        }

        match found.len() {
            0 => Err(Error::NoJoinCondition {
                left: left.description(),
                right: right.description(),
            }),
            1 => {
                let (description, on) = found.remove(0);
                tracing::debug!(
                    left = %left.description(),
                    right = %right.description(),
                    constraint = %description,
                    "inferred join condition"
                );
                Ok(on)
            }
            _ => Err(Error::AmbiguousJoin {
                left: left.description(),
                right: right.description(),
                constraints: found.into_iter().map(|(d, _)| d).collect(),
            }),
        }
    }
}

/// Foreign keys of `dependent` that point at `referenced`.
fn collect_links(
    dep_source: &ColumnSource,
    dependent: &TableRef,
    ref_source: &ColumnSource,
    referenced: &TableRef,
    seen: &mut HashSet<(String, usize)>,
    found: &mut Vec<(String, Expr)>,
) -> Result<()> {
    let referenced_key = referenced.key();
    for (idx, fk) in dependent.foreign_keys().iter().enumerate() {
        if fk.target_table().as_deref() != Some(referenced_key.as_str()) {
            continue;
        }
        if !seen.insert((dependent.key(), idx)) {
            continue;
        }
        let mut clauses = Vec::with_capacity(fk.columns.len());
        for (local, target) in fk.columns.iter().zip(&fk.targets) {
            let (_, target_column) = split_target(target).ok_or_else(|| Error::UnresolvedReference {
                table: dependent.key(),
                target: target.clone(),
                reason: "expected 'table.column' or 'schema.table.column'".into(),
            })?;
            let referenced_col = source_column(ref_source, referenced, &target_column)?;
            let local_col = source_column(dep_source, dependent, local)?;
            clauses.push(referenced_col.eq(local_col));
        }
        found.push((fk.describe(dependent.name()), and_(clauses)));
    }
    Ok(())
}

fn source_column(source: &ColumnSource, table: &TableRef, name: &str) -> Result<Expr> {
    match source {
        ColumnSource::Table(t) => t.c(name),
        ColumnSource::Alias(a) => {
            let col = table.clause().get_column(name).ok_or_else(|| Error::NoSuchColumn {
                owner: a.description(),
                column: name.to_string(),
            })?;
            Ok(column_expr(source.clone(), col))
        }
    }
}

// =============================================================================
// FROM items
// =============================================================================

/// One entry of a FROM list.
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Table(TableRef),
    Alias(AliasRef),
    Join(Arc<Join>),
}

impl FromItem {
    /// Every column source this item makes visible.
    pub fn sources(&self) -> Vec<ColumnSource> {
        match self {
            FromItem::Table(t) => vec![ColumnSource::Table(t.clone())],
            FromItem::Alias(a) => vec![ColumnSource::Alias(a.clone())],
            FromItem::Join(j) => {
                let mut out = j.left.sources();
                out.extend(j.right.sources());
                out
            }
        }
    }

    /// Source keys of [`sources`](Self::sources).
    pub fn source_keys(&self) -> Vec<SourceKey> {
        self.sources().iter().map(ColumnSource::key).collect()
    }

    /// Tables usable for join inference, with the source their columns
    /// should be referenced through.
    fn joinable_tables(&self) -> Vec<(ColumnSource, TableRef)> {
        match self {
            FromItem::Table(t) => vec![(ColumnSource::Table(t.clone()), t.clone())],
            FromItem::Alias(a) => match a.target() {
                AliasTarget::Table(t) => vec![(ColumnSource::Alias(a.clone()), t.clone())],
                AliasTarget::Select(_) | AliasTarget::Compound(_) | AliasTarget::Cte(_) => {
                    Vec::new()
                }
            },
            FromItem::Join(j) => {
                let mut out = j.left.joinable_tables();
                out.extend(j.right.joinable_tables());
                out
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            FromItem::Table(t) => t.key(),
            FromItem::Alias(a) => a.description(),
            FromItem::Join(j) => format!("{} JOIN {}", j.left.description(), j.right.description()),
        }
    }
}

impl fmt::Display for FromItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl From<TableRef> for FromItem {
    fn from(t: TableRef) -> Self {
        FromItem::Table(t)
    }
}

impl From<&TableRef> for FromItem {
    fn from(t: &TableRef) -> Self {
        FromItem::Table(t.clone())
    }
}

impl From<AliasRef> for FromItem {
    fn from(a: AliasRef) -> Self {
        FromItem::Alias(a)
    }
}

impl From<&AliasRef> for FromItem {
    fn from(a: &AliasRef) -> Self {
        FromItem::Alias(a.clone())
    }
}

impl From<Join> for FromItem {
    fn from(j: Join) -> Self {
        FromItem::Join(Arc::new(j))
    }
}

impl From<Select> for FromItem {
    fn from(select: Select) -> Self {
        tracing::warn!(
            "SELECT used directly as a FROM source; wrapping it in an anonymous subquery. \
             Call .subquery() to make this explicit"
        );
        FromItem::Alias(select.subquery())
    }
}

impl From<CompoundSelect> for FromItem {
    fn from(compound: CompoundSelect) -> Self {
        tracing::warn!(
            "compound SELECT used directly as a FROM source; wrapping it in an anonymous subquery. \
             Call .subquery() to make this explicit"
        );
        FromItem::Alias(compound.subquery())
    }
}
