//! SELECT and compound SELECT construction.
//!
//! Every builder method takes `self` and returns a new statement; nothing
//! is shared mutably, so a statement can be extended in two directions
//! without either copy seeing the other's changes.

use std::collections::HashSet;
use std::sync::Arc;

use super::compiler::{CompiledStatement, Compiler, CompileOptions};
use super::dialect::SqlDialect;
use super::expr::{and_, AnonName, Expr, ExprExt, OrderByItem, DEFAULT_ANON_BASE};
use super::selectable::{AliasRef, AliasTarget, ColumnSource, FromItem, Join, JoinKind, SourceKey};
use super::types::DataType;
use crate::error::{Error, Result};

// =============================================================================
// Exported Columns
// =============================================================================

/// A column a SELECT makes visible to an enclosing statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedColumn {
    /// Lookup name; unique within the SELECT.
    pub key: Option<String>,
    /// Set for unnamed expressions, whose name is generated per statement.
    pub anon: Option<AnonName>,
    pub data_type: Option<DataType>,
}

fn unique_key(used: &mut HashSet<String>, base: &str) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Exported names for a SELECT or RETURNING list whose entries went
/// through `into_select_item`. Duplicate names get `_1`, `_2`... suffixes.
pub(crate) fn export_columns(items: &[Expr]) -> Vec<ExportedColumn> {
    let mut used = HashSet::new();
    items
        .iter()
        .map(|item| match item {
            Expr::Column(c) => ExportedColumn {
                key: Some(unique_key(&mut used, &c.name)),
                anon: c.anon.clone(),
                data_type: c.data_type.clone(),
            },
            Expr::Label(label) => {
                let key = match &label.name {
                    Some(name) => Some(unique_key(&mut used, name)),
                    None if label.anon.base != DEFAULT_ANON_BASE => {
                        Some(unique_key(&mut used, &label.anon.base))
                    }
                    None => None,
                };
                ExportedColumn {
                    key,
                    anon: if label.name.is_none() {
                        Some(label.anon.clone())
                    } else {
                        None
                    },
                    data_type: label.expr.data_type(),
                }
            }
            other => ExportedColumn {
                key: None,
                anon: None,
                data_type: other.data_type(),
            },
        })
        .collect()
}

// =============================================================================
// Select
// =============================================================================

/// A SELECT statement.
///
/// ```ignore
/// let stmt = select([users.c("name")?])
///     .filter(users.c("id")?.eq(5))
///     .order_by([users.c("name")?.asc()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Select has no effect until compiled"]
pub struct Select {
    columns: Vec<Expr>,
    from: Vec<FromItem>,
    where_clause: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderByItem>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
}

/// Start a SELECT of the given columns and expressions.
pub fn select<I>(columns: I) -> Select
where
    I: IntoIterator,
    I::Item: Into<Expr>,
{
    Select::new().add_columns(columns)
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry to the SELECT list.
    pub fn column(mut self, column: impl Into<Expr>) -> Self {
        self.columns.push(column.into().into_select_item());
        self
    }

    /// Append entries to the SELECT list.
    pub fn add_columns<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| c.into().into_select_item()));
        self
    }

    /// Add an explicit FROM entry.
    pub fn select_from(mut self, item: impl Into<FromItem>) -> Self {
        self.from.push(item.into());
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

    pub fn group_by<I>(mut self, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        self.group_by.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Add a HAVING condition, ANDed with any existing one.
    pub fn having(mut self, condition: Expr) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn order_by<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<OrderByItem>,
    {
        self.order_by.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // =========================================================================
    // Joins
    // =========================================================================

    /// INNER JOIN with the ON clause inferred from foreign keys.
    pub fn join(self, right: impl Into<FromItem>) -> Result<Self> {
        self.join_with(right.into(), None, JoinKind::Inner)
    }

    /// INNER JOIN with an explicit ON clause.
    pub fn join_on(self, right: impl Into<FromItem>, on: Expr) -> Result<Self> {
        self.join_with(right.into(), Some(on), JoinKind::Inner)
    }

    /// LEFT OUTER JOIN with the ON clause inferred from foreign keys.
    pub fn outer_join(self, right: impl Into<FromItem>) -> Result<Self> {
        self.join_with(right.into(), None, JoinKind::LeftOuter)
    }

    /// LEFT OUTER JOIN with an explicit ON clause.
    pub fn outer_join_on(self, right: impl Into<FromItem>, on: Expr) -> Result<Self> {
        self.join_with(right.into(), Some(on), JoinKind::LeftOuter)
    }

    /// FULL OUTER JOIN with the ON clause inferred from foreign keys.
    pub fn full_join(self, right: impl Into<FromItem>) -> Result<Self> {
        self.join_with(right.into(), None, JoinKind::FullOuter)
    }

    /// Join `right` onto the FROM entry it links to.
    ///
    /// The left side is the explicit FROM entry when there is one, else the
    /// one that the ON clause (given or inferred) ties to `right`. When no
    /// explicit FROM exists the left side comes from the sources the
    /// SELECT's columns imply.
    pub fn join_with(mut self, right: FromItem, on: Option<Expr>, kind: JoinKind) -> Result<Self> {
        let right_keys: HashSet<SourceKey> = right.source_keys().into_iter().collect();
        let explicit = !self.from.is_empty();
        let candidates: Vec<FromItem> = if explicit {
            self.from.clone()
        } else {
            self.froms()
                .into_iter()
                .filter(|item| !item.source_keys().iter().any(|k| right_keys.contains(k)))
                .collect()
        };
        if candidates.is_empty() {
            return Err(Error::argument(format!(
                "no FROM clause to join '{}' to; add a column or call select_from first",
                right.description()
            )));
        }

        let index = pick_left(&candidates, &right, &right_keys, on.as_ref())?;
        let left = candidates[index].clone();
        let join = match on {
            Some(on) => Join::new(left, right, on, kind),
            None => Join::infer(left, right, kind)?,
        };

        if explicit {
            self.from[index] = join.into();
        } else {
            self.from.push(join.into());
        }
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The SELECT list, with anonymous labels applied.
    pub fn columns(&self) -> &[Expr] {
        &self.columns
    }

    /// Explicit FROM entries only.
    pub fn from_items(&self) -> &[FromItem] {
        &self.from
    }

    pub fn where_clause(&self) -> Option<&Expr> {
        self.where_clause.as_ref()
    }

    pub fn group_by_exprs(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn having_clause(&self) -> Option<&Expr> {
        self.having.as_ref()
    }

    pub fn order_by_items(&self) -> &[OrderByItem] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// FROM entries given through `select_from` and the join builders.
    pub fn explicit_froms(&self) -> &[FromItem] {
        &self.from
    }

    pub(crate) fn has_ordering_or_limit(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    /// Every source the clauses refer to, in order of first appearance.
    pub(crate) fn referenced_sources(&self) -> Vec<ColumnSource> {
        let mut out = Vec::new();
        let mut push = |s: &ColumnSource| out.push(s.clone());
        for c in &self.columns {
            c.visit_sources(&mut push);
        }
        if let Some(w) = &self.where_clause {
            w.visit_sources(&mut push);
        }
        for g in &self.group_by {
            g.visit_sources(&mut push);
        }
        if let Some(h) = &self.having {
            h.visit_sources(&mut push);
        }
        for o in &self.order_by {
            o.expr.visit_sources(&mut push);
        }
        out
    }

    /// The effective FROM list: explicit entries, then every other source
    /// the clauses refer to, each once.
    pub fn froms(&self) -> Vec<FromItem> {
        let mut items = self.from.clone();
        let mut covered: HashSet<SourceKey> =
            items.iter().flat_map(FromItem::source_keys).collect();
        for source in self.referenced_sources() {
            if covered.insert(source.key()) {
                items.push(source.into());
            }
        }
        items
    }

    /// Names and types this SELECT exports, in SELECT-list order.
    pub fn exported_columns(&self) -> Vec<ExportedColumn> {
        export_columns(&self.columns)
    }

    // =========================================================================
    // Wrapping
    // =========================================================================

    /// Wrap as an anonymous FROM source, aliased `anon_N` when compiled.
    pub fn subquery(self) -> AliasRef {
        AliasRef::new(AliasTarget::Select(Arc::new(self)), None)
    }

    /// Wrap as a named FROM source.
    pub fn alias(self, name: impl Into<String>) -> AliasRef {
        AliasRef::new(AliasTarget::Select(Arc::new(self)), Some(name.into()))
    }

    /// Wrap as a common table expression, hoisted into the statement's
    /// `WITH` clause and referenced by `name`.
    pub fn cte(self, name: impl Into<String>) -> AliasRef {
        AliasRef::new_cte(CompoundElement::Select(Arc::new(self)), name.into())
    }

    /// Use as a single value; correlates against the enclosing statement.
    pub fn scalar_subquery(self) -> Expr {
        Expr::ScalarSubquery(Arc::new(self))
    }

    /// `EXISTS (SELECT ...)`
    pub fn exists(self) -> Expr {
        Expr::Exists(Arc::new(self))
    }

    // =========================================================================
    // Set Operations
    // =========================================================================

    pub fn union(self, other: impl Into<CompoundElement>) -> Result<CompoundSelect> {
        CompoundSelect::new(SetOperator::Union, self, other)
    }

    pub fn union_all(self, other: impl Into<CompoundElement>) -> Result<CompoundSelect> {
        CompoundSelect::new(SetOperator::UnionAll, self, other)
    }

    pub fn intersect(self, other: impl Into<CompoundElement>) -> Result<CompoundSelect> {
        CompoundSelect::new(SetOperator::Intersect, self, other)
    }

    pub fn intersect_all(self, other: impl Into<CompoundElement>) -> Result<CompoundSelect> {
        CompoundSelect::new(SetOperator::IntersectAll, self, other)
    }

    pub fn except(self, other: impl Into<CompoundElement>) -> Result<CompoundSelect> {
        CompoundSelect::new(SetOperator::Except, self, other)
    }

    pub fn except_all(self, other: impl Into<CompoundElement>) -> Result<CompoundSelect> {
        CompoundSelect::new(SetOperator::ExceptAll, self, other)
    }

    /// Compile for a dialect with default options.
    pub fn compile(&self, dialect: &dyn SqlDialect) -> Result<CompiledStatement> {
        Compiler::new(dialect, CompileOptions::default()).compile_select(self)
    }
}

fn pick_left(
    candidates: &[FromItem],
    right: &FromItem,
    right_keys: &HashSet<SourceKey>,
    on: Option<&Expr>,
) -> Result<usize> {
    if candidates.len() == 1 {
        return Ok(0);
    }
    let matches: Vec<usize> = match on {
        Some(on) => {
            let mut keys = Vec::new();
            on.visit_sources(&mut |s| keys.push(s.key()));
            keys.retain(|k| !right_keys.contains(k));
            candidates
                .iter()
                .enumerate()
                .filter(|(_, item)| item.source_keys().iter().any(|k| keys.contains(k)))
                .map(|(i, _)| i)
                .collect()
        }
        None => candidates
            .iter()
            .enumerate()
            .filter(|(_, item)| Join::infer_on(item, right).is_ok())
            .map(|(i, _)| i)
            .collect(),
    };
    match matches.as_slice() {
        [index] => Ok(*index),
        [] => Err(Error::argument(format!(
            "don't know how to join to '{}'; none of the FROM entries link to it. \
             Use select_from to name the left side",
            right.description()
        ))),
        _ => Err(Error::argument(format!(
            "can't determine which FROM entry to join '{}' from; several of them link to it. \
             Use select_from to name the left side",
            right.description()
        ))),
    }
}

// =============================================================================
// Compound Select
// =============================================================================

/// Set operations between SELECTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

/// One side of a set operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundElement {
    Select(Arc<Select>),
    Compound(Arc<CompoundSelect>),
}

impl CompoundElement {
    fn column_count(&self) -> usize {
        match self {
            CompoundElement::Select(s) => s.columns().len(),
            CompoundElement::Compound(c) => c.column_count(),
        }
    }

    fn first_select(&self) -> &Select {
        match self {
            CompoundElement::Select(s) => s,
            CompoundElement::Compound(c) => c.first_select(),
        }
    }

    pub(crate) fn exported_columns(&self) -> Vec<ExportedColumn> {
        self.first_select().exported_columns()
    }
}

impl From<Select> for CompoundElement {
    fn from(s: Select) -> Self {
        CompoundElement::Select(Arc::new(s))
    }
}

impl From<CompoundSelect> for CompoundElement {
    fn from(c: CompoundSelect) -> Self {
        CompoundElement::Compound(Arc::new(c))
    }
}

/// `SELECT ... UNION SELECT ...` and friends.
///
/// Exports the first SELECT's columns. ORDER BY may only name those
/// columns or their positions.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "CompoundSelect has no effect until compiled"]
pub struct CompoundSelect {
    op: SetOperator,
    elements: Vec<CompoundElement>,
    order_by: Vec<OrderByItem>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl CompoundSelect {
    /// Combine two selects; both must have the same number of columns.
    pub fn new(
        op: SetOperator,
        first: impl Into<CompoundElement>,
        second: impl Into<CompoundElement>,
    ) -> Result<Self> {
        let first = first.into();
        let second = second.into();
        check_column_counts(&first, &second)?;
        Ok(Self {
            op,
            elements: vec![first, second],
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    fn chain(self, op: SetOperator, other: impl Into<CompoundElement>) -> Result<Self> {
        let other = other.into();
        if op == self.op && !self.has_ordering_or_limit() {
            check_column_counts(&self.elements[0], &other)?;
            let mut next = self;
            next.elements.push(other);
            Ok(next)
        } else {
            Self::new(op, self, other)
        }
    }

    pub fn union(self, other: impl Into<CompoundElement>) -> Result<Self> {
        self.chain(SetOperator::Union, other)
    }

    pub fn union_all(self, other: impl Into<CompoundElement>) -> Result<Self> {
        self.chain(SetOperator::UnionAll, other)
    }

    pub fn intersect(self, other: impl Into<CompoundElement>) -> Result<Self> {
        self.chain(SetOperator::Intersect, other)
    }

    pub fn intersect_all(self, other: impl Into<CompoundElement>) -> Result<Self> {
        self.chain(SetOperator::IntersectAll, other)
    }

    pub fn except(self, other: impl Into<CompoundElement>) -> Result<Self> {
        self.chain(SetOperator::Except, other)
    }

    pub fn except_all(self, other: impl Into<CompoundElement>) -> Result<Self> {
        self.chain(SetOperator::ExceptAll, other)
    }

    /// ORDER BY result columns, named by the first SELECT's labels or by
    /// 1-based position.
    pub fn order_by<I>(mut self, items: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<OrderByItem>,
    {
        let exported = self.exported_columns();
        for item in items {
            let mut item = item.into();
            item.expr = self.result_column_reference(&item.expr, &exported)?;
            self.order_by.push(item);
        }
        Ok(self)
    }

    fn result_column_reference(&self, expr: &Expr, exported: &[ExportedColumn]) -> Result<Expr> {
        let named = |name: &str| exported.iter().any(|e| e.key.as_deref() == Some(name));
        let reference = match expr {
            Expr::Column(c) if named(&c.name) => Some(Expr::LabelReference(c.name.clone())),
            Expr::Label(l) => match &l.name {
                Some(name) if named(name) => Some(Expr::LabelReference(name.clone())),
                _ => None,
            },
            Expr::LabelReference(name) if named(name) => Some(expr.clone()),
            Expr::Ordinal(n) if *n >= 1 && (*n as usize) <= exported.len() => Some(expr.clone()),
            _ => None,
        };
        reference.ok_or_else(|| {
            let names: Vec<&str> = exported.iter().filter_map(|e| e.key.as_deref()).collect();
            Error::argument(format!(
                "ORDER BY of a compound SELECT must name a result column of the first SELECT \
                 ({}) or a position between 1 and {}",
                names.join(", "),
                exported.len()
            ))
        })
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn operator(&self) -> SetOperator {
        self.op
    }

    pub fn elements(&self) -> &[CompoundElement] {
        &self.elements
    }

    pub fn order_by_items(&self) -> &[OrderByItem] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub(crate) fn has_ordering_or_limit(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    pub fn first_select(&self) -> &Select {
        self.elements[0].first_select()
    }

    pub fn column_count(&self) -> usize {
        self.elements[0].column_count()
    }

    pub fn exported_columns(&self) -> Vec<ExportedColumn> {
        self.first_select().exported_columns()
    }

    pub fn subquery(self) -> AliasRef {
        AliasRef::new(AliasTarget::Compound(Arc::new(self)), None)
    }

    pub fn alias(self, name: impl Into<String>) -> AliasRef {
        AliasRef::new(AliasTarget::Compound(Arc::new(self)), Some(name.into()))
    }

    pub fn cte(self, name: impl Into<String>) -> AliasRef {
        AliasRef::new_cte(CompoundElement::Compound(Arc::new(self)), name.into())
    }

    pub fn compile(&self, dialect: &dyn SqlDialect) -> Result<CompiledStatement> {
        Compiler::new(dialect, CompileOptions::default()).compile_compound(self)
    }
}

fn check_column_counts(first: &CompoundElement, other: &CompoundElement) -> Result<()> {
    let (expected, got) = (first.column_count(), other.column_count());
    if expected != got {
        return Err(Error::argument(format!(
            "all SELECTs in a compound statement must have the same number of columns; \
             expected {}, got {}",
            expected, got
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{count, ordinal};
    use crate::sql::selectable::{TableClause, TableRef};
    use crate::sql::types::DataType;

    fn users() -> TableRef {
        TableClause::new("users")
            .primary_key_column("id", DataType::Int64)
            .column("name", DataType::Varchar(50))
            .into_ref()
    }

    fn addresses() -> TableRef {
        TableClause::new("addresses")
            .primary_key_column("id", DataType::Int64)
            .column("user_id", DataType::Int64)
            .column("email", DataType::String)
            .foreign_key(["user_id"], ["users.id"])
            .into_ref()
    }

    #[test]
    fn test_froms_inferred_from_columns() {
        let u = users();
        let a = addresses();
        let s = select([u.c("name").unwrap(), a.c("email").unwrap()]);
        let keys: Vec<SourceKey> = s.froms().iter().flat_map(FromItem::source_keys).collect();
        assert_eq!(
            keys,
            vec![SourceKey::Table("users".into()), SourceKey::Table("addresses".into())]
        );
    }

    #[test]
    fn test_builders_do_not_share_state() {
        let u = users();
        let base = select([u.c("id").unwrap()]);
        let a = base.clone().filter(u.c("id").unwrap().gt(1));
        let b = base.clone().limit(3);
        assert!(base.where_clause().is_none());
        assert!(a.where_clause().is_some() && a.limit_value().is_none());
        assert!(b.where_clause().is_none() && b.limit_value() == Some(3));
    }

    #[test]
    fn test_filter_accumulates_with_and() {
        let u = users();
        let s = select([u.c("id").unwrap()])
            .filter(u.c("id").unwrap().gt(1))
            .filter(u.c("name").unwrap().eq("x"));
        assert!(matches!(s.where_clause(), Some(Expr::BooleanList { .. })));
    }

    #[test]
    fn test_join_from_inferred_left() {
        let u = users();
        let a = addresses();
        let s = select([u.c("name").unwrap()]).join(a).unwrap();
        assert_eq!(s.from_items().len(), 1);
        assert!(matches!(s.from_items()[0], FromItem::Join(_)));
        assert_eq!(s.froms().len(), 1);
    }

    #[test]
    fn test_join_replaces_explicit_from_entry() {
        let u = users();
        let a = addresses();
        let s = select([a.c("email").unwrap()])
            .select_from(u.clone())
            .join(a.clone())
            .unwrap();
        assert_eq!(s.froms().len(), 1);
    }

    #[test]
    fn test_exported_columns_disambiguate() {
        let u = users();
        let a = addresses();
        let s = select([u.c("id").unwrap(), a.c("id").unwrap(), count(u.c("id").unwrap())]);
        let keys: Vec<Option<String>> = s.exported_columns().into_iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec![Some("id".into()), Some("id_1".into()), Some("count".into())]
        );
    }

    #[test]
    fn test_subquery_columns() {
        let u = users();
        let sub = select([u.c("id").unwrap(), count(u.c("name").unwrap())]).subquery();
        assert!(sub.c("id").is_ok());
        assert!(sub.c("count").is_ok());
        assert!(sub.column_at(1).is_ok());
        assert!(sub.c("name").is_err());
    }

    #[test]
    fn test_union_column_count_mismatch() {
        let u = users();
        let err = select([u.c("id").unwrap()])
            .union(select([u.c("id").unwrap(), u.c("name").unwrap()]))
            .unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
    }

    #[test]
    fn test_union_chain_flattens() {
        let u = users();
        let c = select([u.c("id").unwrap()])
            .union(select([u.c("id").unwrap()]))
            .unwrap()
            .union(select([u.c("id").unwrap()]))
            .unwrap();
        assert_eq!(c.elements().len(), 3);

        let mixed = c.union_all(select([u.c("id").unwrap()])).unwrap();
        assert_eq!(mixed.elements().len(), 2);
        assert_eq!(mixed.operator(), SetOperator::UnionAll);
    }

    #[test]
    fn test_compound_order_by_validation() {
        let u = users();
        let c = select([u.c("id").unwrap(), u.c("name").unwrap()])
            .union(select([u.c("id").unwrap(), u.c("name").unwrap()]))
            .unwrap();
        assert!(c.clone().order_by([u.c("name").unwrap()]).is_ok());
        assert!(c.clone().order_by([ordinal(2)]).is_ok());
        assert!(c.clone().order_by([ordinal(3)]).is_err());
        let other = TableClause::new("t").column("zzz", DataType::Int32).into_ref();
        assert!(c.order_by([other.c("zzz").unwrap()]).is_err());
    }
}
