//! Statement compiler: expression trees to SQL text plus parameters.
//!
//! One [`Compiler`] compiles one statement. It owns everything that is
//! decided per statement: generated names for anonymous labels, aliases and
//! binds, the parameter list, and the stack of FROM scopes that decides
//! column qualification and subquery correlation. Statement trees are never
//! modified, so compiling the same tree twice gives the same output.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::dialect::{ParamStyle, SqlDialect};
use super::dml::{Delete, Insert, Update};
use super::expr::{
    AnonName, BinaryOperator, BindKey, BindParam, BooleanOperator, CaseExpr, ColumnRef, Expr,
    FunctionCall, Label, NullsOrder, OrderByItem, SortDir, UnaryOperator, WindowFrameBound,
    WindowFrameKind, WindowFunction, PREDICATE_PRECEDENCE,
};
use super::naming::{check_identifier_length, truncate_name};
use super::query::{export_columns, CompoundElement, CompoundSelect, ExportedColumn, Select, SetOperator};
use super::selectable::{
    AliasRef, AliasTarget, ColumnSource, Cte, FromItem, Join, JoinKind, SourceKey, TableColumn, TableRef,
};
use super::token::{Token, TokenStream};
use super::types::{DataType, Value};
use crate::error::{Error, Result};

// =============================================================================
// Output
// =============================================================================

/// Compilation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Render bound values inline as literals instead of placeholders.
    pub literal_binds: bool,
}

/// A parameter of a compiled statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundParameter {
    pub name: String,
    /// `None` when the value is supplied at execution time.
    pub value: Option<Value>,
    pub data_type: Option<DataType>,
}

/// SQL text, its parameters and its result column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStatement {
    pub sql: String,
    pub param_style: ParamStyle,
    /// One entry per distinct parameter name, in order of first use.
    pub parameters: Vec<BoundParameter>,
    /// Parameter name at each placeholder, in textual order.
    pub positional_names: Vec<String>,
    /// Names of the columns the statement returns.
    pub result_columns: Vec<String>,
}

impl CompiledStatement {
    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Values in placeholder order, for positional parameter styles.
    pub fn positional_values(&self) -> Vec<Option<&Value>> {
        self.positional_names
            .iter()
            .map(|name| self.parameter(name).and_then(|p| p.value.as_ref()))
            .collect()
    }

    pub fn is_positional(&self) -> bool {
        self.param_style.is_positional()
    }

    /// JSON form for handing the statement to an execution layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Anything the compiler accepts as a top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Compound(CompoundSelect),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl From<Select> for Statement {
    fn from(s: Select) -> Self {
        Statement::Select(s)
    }
}

impl From<CompoundSelect> for Statement {
    fn from(c: CompoundSelect) -> Self {
        Statement::Compound(c)
    }
}

impl From<Insert> for Statement {
    fn from(i: Insert) -> Self {
        Statement::Insert(i)
    }
}

impl From<Update> for Statement {
    fn from(u: Update) -> Self {
        Statement::Update(u)
    }
}

impl From<Delete> for Statement {
    fn from(d: Delete) -> Self {
        Statement::Delete(d)
    }
}

/// Compile a statement with default options.
pub fn compile(statement: &Statement, dialect: &dyn SqlDialect) -> Result<CompiledStatement> {
    compile_with(statement, dialect, CompileOptions::default())
}

/// Compile a statement.
pub fn compile_with(
    statement: &Statement,
    dialect: &dyn SqlDialect,
    options: CompileOptions,
) -> Result<CompiledStatement> {
    let compiler = Compiler::new(dialect, options);
    match statement {
        Statement::Select(s) => compiler.compile_select(s),
        Statement::Compound(c) => compiler.compile_compound(c),
        Statement::Insert(i) => compiler.compile_insert(i),
        Statement::Update(u) => compiler.compile_update(u),
        Statement::Delete(d) => compiler.compile_delete(d),
    }
}

/// Render an expression with binds inlined, in the scope of one table.
/// Used for CHECK constraints and other DDL fragments.
pub(crate) fn inline_expression(
    dialect: &dyn SqlDialect,
    table: &TableRef,
    expr: &Expr,
) -> Result<TokenStream> {
    let mut compiler = Compiler::new(dialect, CompileOptions { literal_binds: true });
    compiler.scopes.push(Scope::single_table(table));
    let mut ts = TokenStream::new();
    compiler.expr(expr, &mut ts)?;
    Ok(ts)
}

/// Literal token for a value.
pub(crate) fn literal_token(value: &Value) -> Result<Token> {
    Ok(match value {
        Value::Null => Token::LitNull,
        Value::Bool(b) => Token::LitBool(*b),
        Value::Int(n) => Token::LitInt(*n),
        Value::Float(f) if f.is_finite() => Token::LitFloat(*f),
        Value::Float(f) => {
            return Err(Error::compile(format!(
                "the float value {} cannot be rendered as a SQL literal",
                f
            )))
        }
        Value::Text(s) => Token::LitString(s.clone()),
        Value::Bytes(b) => Token::LitBytes(b.clone()),
    })
}

// =============================================================================
// Compiler State
// =============================================================================

/// The FROM sources visible to one SELECT (or DML statement).
#[derive(Debug, Default)]
struct Scope {
    keys: HashSet<SourceKey>,
    /// Set when exactly one plain table or alias is in FROM; its columns
    /// render unqualified.
    single: Option<SourceKey>,
    /// Identities of labels in this SELECT's column list.
    labels: HashSet<u64>,
}

impl Scope {
    fn new(froms: &[FromItem], columns: &[Expr]) -> Self {
        let keys = froms.iter().flat_map(FromItem::source_keys).collect();
        let single = match froms {
            [FromItem::Table(_) | FromItem::Alias(_)] => froms[0].source_keys().pop(),
            _ => None,
        };
        let labels = columns
            .iter()
            .filter_map(|c| match c {
                Expr::Label(l) => Some(l.anon.id),
                _ => None,
            })
            .collect();
        Self {
            keys,
            single,
            labels,
        }
    }

    fn single_table(table: &TableRef) -> Self {
        let key = SourceKey::Table(table.key());
        Self {
            keys: HashSet::from([key.clone()]),
            single: Some(key),
            labels: HashSet::new(),
        }
    }
}

/// How a nested SELECT relates to the statement around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectContext {
    /// Top level, FROM subquery or compound member: owns all its sources.
    Standalone,
    /// Scalar, EXISTS or IN subquery: drops sources the enclosing
    /// statement already provides.
    Correlated,
}

/// One rendered entry of the `WITH` prefix.
#[derive(Debug)]
struct CteClause {
    name: String,
    columns: Vec<String>,
    body: TokenStream,
    recursive: bool,
}

/// Which CTE owns a name in this statement, and where it was rendered.
#[derive(Debug, Clone, Copy)]
struct CteEntry {
    root: u64,
    restated: bool,
    slot: Option<usize>,
}

/// Compiles one statement.
pub struct Compiler<'d> {
    dialect: &'d dyn SqlDialect,
    options: CompileOptions,
    max_identifier_length: usize,
    anon_names: HashMap<u64, String>,
    anon_counters: HashMap<String, usize>,
    bind_names: HashMap<u64, String>,
    bind_counters: HashMap<String, usize>,
    params: Vec<BoundParameter>,
    param_index: HashMap<String, usize>,
    scopes: Vec<Scope>,
    ctes: Vec<CteClause>,
    cte_entries: HashMap<String, CteEntry>,
}

impl<'d> Compiler<'d> {
    pub fn new(dialect: &'d dyn SqlDialect, options: CompileOptions) -> Self {
        Self {
            dialect,
            options,
            max_identifier_length: dialect.max_identifier_length(),
            anon_names: HashMap::new(),
            anon_counters: HashMap::new(),
            bind_names: HashMap::new(),
            bind_counters: HashMap::new(),
            params: Vec::new(),
            param_index: HashMap::new(),
            scopes: Vec::new(),
            ctes: Vec::new(),
            cte_entries: HashMap::new(),
        }
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    pub fn compile_select(mut self, select: &Select) -> Result<CompiledStatement> {
        let mut ts = TokenStream::new();
        let columns = self.select(select, SelectContext::Standalone, &mut ts)?;
        Ok(self.finish(ts, columns))
    }

    pub fn compile_compound(mut self, compound: &CompoundSelect) -> Result<CompiledStatement> {
        let mut ts = TokenStream::new();
        let columns = self.compound(compound, &mut ts)?;
        Ok(self.finish(ts, columns))
    }

    pub fn compile_insert(mut self, insert: &Insert) -> Result<CompiledStatement> {
        let mut ts = TokenStream::new();
        self.scopes.push(Scope::single_table(&insert.table));
        self.insert(insert, &mut ts)?;
        let columns = self.returning(&insert.returning, &mut ts)?;
        self.scopes.pop();
        Ok(self.finish(ts, columns))
    }

    pub fn compile_update(mut self, update: &Update) -> Result<CompiledStatement> {
        let mut ts = TokenStream::new();
        self.scopes.push(Scope::single_table(&update.table));
        self.update(update, &mut ts)?;
        let columns = self.returning(&update.returning, &mut ts)?;
        self.scopes.pop();
        Ok(self.finish(ts, columns))
    }

    pub fn compile_delete(mut self, delete: &Delete) -> Result<CompiledStatement> {
        let mut ts = TokenStream::new();
        self.scopes.push(Scope::single_table(&delete.table));
        ts.push(Token::Delete).space().push(Token::From).space();
        self.table_name(&delete.table, &mut ts);
        if let Some(w) = &delete.where_clause {
            ts.newline().push(Token::Where).space();
            self.expr(w, &mut ts)?;
        }
        let columns = self.returning(&delete.returning, &mut ts)?;
        self.scopes.pop();
        Ok(self.finish(ts, columns))
    }

    fn finish(self, ts: TokenStream, result_columns: Vec<String>) -> CompiledStatement {
        let mut statement = self.with_clause();
        statement.append(&ts);
        let positional_names = statement.number_placeholders();
        let sql = statement.serialize(self.dialect);
        tracing::debug!(
            dialect = self.dialect.name(),
            parameters = self.params.len(),
            ctes = self.ctes.len(),
            "compiled statement"
        );
        CompiledStatement {
            sql,
            param_style: self.dialect.param_style(),
            parameters: self.params,
            positional_names,
            result_columns,
        }
    }

    /// `WITH [RECURSIVE] name [(columns)] AS (...)` for every CTE the
    /// statement referenced, dependencies first.
    fn with_clause(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        if self.ctes.is_empty() {
            return ts;
        }
        ts.push(Token::With).space();
        if self.ctes.iter().any(|c| c.recursive) && self.dialect.emit_recursive_keyword() {
            ts.push(Token::Recursive).space();
        }
        for (i, cte) in self.ctes.iter().enumerate() {
            if i > 0 {
                ts.push(Token::Comma).newline();
            }
            ts.push(Token::Ident(cte.name.clone()));
            if cte.recursive && !cte.columns.is_empty() {
                ts.lparen();
                for (j, column) in cte.columns.iter().enumerate() {
                    if j > 0 {
                        ts.comma_space();
                    }
                    ts.push(Token::Ident(column.clone()));
                }
                ts.rparen();
            }
            ts.space().push(Token::As).space().lparen();
            ts.append(&cte.body);
            ts.rparen();
        }
        ts.newline();
        ts
    }

    // =========================================================================
    // Naming
    // =========================================================================

    /// Name for an anonymous label or alias: `<base>_<n>`, numbered per
    /// base in order of first use within the statement.
    fn anon_name(&mut self, anon: &AnonName) -> String {
        if let Some(name) = self.anon_names.get(&anon.id) {
            return name.clone();
        }
        let counter = self.anon_counters.entry(anon.base.clone()).or_insert(0);
        *counter += 1;
        let name = truncate_name(&format!("{}_{}", anon.base, counter), self.max_identifier_length);
        self.anon_names.insert(anon.id, name.clone());
        name
    }

    fn label_name(&mut self, label: &Label) -> Result<String> {
        match &label.name {
            Some(name) => {
                check_identifier_length(name, self.max_identifier_length)?;
                Ok(name.clone())
            }
            None => Ok(self.anon_name(&label.anon)),
        }
    }

    fn alias_name(&mut self, alias: &AliasRef) -> Result<String> {
        match alias.name() {
            Some(name) => {
                check_identifier_length(name, self.max_identifier_length)?;
                Ok(name.to_string())
            }
            None => Ok(self.anon_name(alias.anon())),
        }
    }

    fn bind_name(&mut self, bind: &BindParam) -> String {
        let anon = match &bind.key {
            BindKey::Named(name) => return name.clone(),
            BindKey::Anonymous(anon) => anon,
        };
        if let Some(name) = self.bind_names.get(&anon.id) {
            return name.clone();
        }
        let name = loop {
            let counter = self.bind_counters.entry(anon.base.clone()).or_insert(0);
            *counter += 1;
            let candidate = format!("{}_{}", anon.base, counter);
            if !self.param_index.contains_key(&candidate) {
                break candidate;
            }
        };
        self.bind_names.insert(anon.id, name.clone());
        name
    }

    fn register_parameter(&mut self, name: &str, bind: &BindParam) -> Result<()> {
        if let Some(&index) = self.param_index.get(name) {
            let existing = &self.params[index];
            if existing.value != bind.value {
                return Err(Error::compile(format!(
                    "bind parameter '{}' is used more than once with different values",
                    name
                )));
            }
            return Ok(());
        }
        self.param_index.insert(name.to_string(), self.params.len());
        self.params.push(BoundParameter {
            name: name.to_string(),
            value: bind.value.clone(),
            data_type: bind.data_type.clone(),
        });
        Ok(())
    }

    // =========================================================================
    // Qualification
    // =========================================================================

    /// Whether columns of `key` need a `source.` prefix here.
    fn qualify(&self, key: &SourceKey) -> bool {
        match self.scopes.split_last() {
            Some((current, outer)) => {
                current.single.as_ref() != Some(key) || outer.iter().any(|s| s.keys.contains(key))
            }
            None => true,
        }
    }

    fn source_qualifier(&mut self, source: &ColumnSource, ts: &mut TokenStream) -> Result<()> {
        match source {
            ColumnSource::Table(t) => {
                self.table_name(t, ts);
            }
            ColumnSource::Alias(a) => {
                let name = self.alias_name(a)?;
                ts.push(Token::Ident(name));
            }
        }
        Ok(())
    }

    fn table_name(&self, table: &TableRef, ts: &mut TokenStream) {
        ts.push(Token::QualifiedIdent {
            schema: table.schema().map(str::to_string),
            name: table.name().to_string(),
        });
    }

    fn column_name(&mut self, column: &ColumnRef) -> String {
        match &column.anon {
            Some(anon) => self.anon_name(anon),
            None => column.name.clone(),
        }
    }

    fn column(&mut self, column: &ColumnRef, ts: &mut TokenStream) -> Result<()> {
        if self.qualify(&column.source.key()) {
            self.source_qualifier(&column.source, ts)?;
            ts.push(Token::Dot);
        }
        let name = self.column_name(column);
        ts.push(Token::Ident(name));
        Ok(())
    }

    // =========================================================================
    // SELECT
    // =========================================================================

    fn select(&mut self, select: &Select, context: SelectContext, ts: &mut TokenStream) -> Result<Vec<String>> {
        let mut froms = select.froms();
        // A lone FROM is never correlated away.
        if context == SelectContext::Correlated && froms.len() > 1 {
            let enclosing: HashSet<SourceKey> = self
                .scopes
                .iter()
                .flat_map(|s| s.keys.iter().cloned())
                .collect();
            let explicit: HashSet<SourceKey> = select
                .explicit_froms()
                .iter()
                .flat_map(FromItem::source_keys)
                .collect();
            froms.retain(|item| match item {
                FromItem::Join(_) => true,
                other => {
                    let keys = other.source_keys();
                    keys.iter().any(|k| explicit.contains(k))
                        || !keys.iter().all(|k| enclosing.contains(k))
                }
            });
            if froms.is_empty() {
                return Err(Error::compile(
                    "SELECT returned no FROM clauses due to auto-correlation; \
                     list the FROM entries it should keep with select_from",
                ));
            }
        }

        self.scopes.push(Scope::new(&froms, select.columns()));
        let result = self.select_body(select, &froms, ts);
        self.scopes.pop();
        result
    }

    fn select_body(&mut self, select: &Select, froms: &[FromItem], ts: &mut TokenStream) -> Result<Vec<String>> {
        if select.columns().is_empty() {
            return Err(Error::compile("SELECT has no columns"));
        }

        ts.push(Token::Select).space();
        if select.is_distinct() {
            ts.push(Token::Distinct).space();
        }
        let exported = select.exported_columns();
        let names = self.column_list(select.columns(), &exported, ts)?;

        if !froms.is_empty() {
            ts.newline().push(Token::From).space();
            for (i, item) in froms.iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                self.from_item(item, ts)?;
            }
        }

        if let Some(w) = select.where_clause() {
            ts.newline().push(Token::Where).space();
            self.expr(w, ts)?;
        }

        if !select.group_by_exprs().is_empty() {
            ts.newline().push(Token::GroupBy).space();
            for (i, e) in select.group_by_exprs().iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                self.expr(e, ts)?;
            }
        }

        if let Some(h) = select.having_clause() {
            ts.newline().push(Token::Having).space();
            self.expr(h, ts)?;
        }

        self.ordering_and_pagination(
            select.order_by_items(),
            select.limit_value(),
            select.offset_value(),
            ts,
        )?;
        Ok(names)
    }

    /// SELECT or RETURNING list. Returns the result column names.
    fn column_list(&mut self, items: &[Expr], exported: &[ExportedColumn], ts: &mut TokenStream) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(items.len());
        for (i, (item, export)) in items.iter().zip(exported).enumerate() {
            if i > 0 {
                ts.comma_space();
            }
            match item {
                Expr::Column(c) => {
                    self.column(c, ts)?;
                    match &export.key {
                        Some(key) if c.anon.is_none() && *key != c.name => {
                            ts.space().push(Token::As).space().push(Token::Ident(key.clone()));
                            names.push(key.clone());
                        }
                        _ => names.push(self.column_name(c)),
                    }
                }
                Expr::Label(l) => {
                    self.expr(&l.expr, ts)?;
                    let name = self.label_name(l)?;
                    ts.space().push(Token::As).space().push(Token::Ident(name.clone()));
                    names.push(name);
                }
                Expr::Star(_) => {
                    self.expr(item, ts)?;
                    names.push("*".to_string());
                }
                other => {
                    self.expr(other, ts)?;
                    names.push(String::new());
                }
            }
        }
        Ok(names)
    }

    fn ordering_and_pagination(
        &mut self,
        order_by: &[OrderByItem],
        limit: Option<u64>,
        offset: Option<u64>,
        ts: &mut TokenStream,
    ) -> Result<()> {
        let paginated = limit.is_some() || offset.is_some();
        if !order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            for (i, item) in order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                self.order_item(item, ts)?;
            }
        } else if paginated && self.dialect.requires_order_by_for_offset() {
            ts.newline()
                .push(Token::OrderBy)
                .space()
                .push(Token::Raw("(SELECT NULL)".into()));
        }
        if paginated {
            let clause = self.dialect.emit_limit_offset(limit, offset);
            ts.newline().append(&clause);
        }
        Ok(())
    }

    fn order_item(&mut self, item: &OrderByItem, ts: &mut TokenStream) -> Result<()> {
        let in_column_list = match &item.expr {
            Expr::Label(l) => self
                .scopes
                .last()
                .map(|s| s.labels.contains(&l.anon.id))
                .unwrap_or(false),
            _ => false,
        };
        match &item.expr {
            Expr::Label(l) if in_column_list => {
                let name = self.label_name(l)?;
                ts.push(Token::Ident(name));
            }
            other => self.expr(other, ts)?,
        }
        match item.dir {
            Some(SortDir::Asc) => {
                ts.space().push(Token::Asc);
            }
            Some(SortDir::Desc) => {
                ts.space().push(Token::Desc);
            }
            None => {}
        }
        if let Some(nulls) = item.nulls {
            if !self.dialect.supports_nulls_ordering() {
                return Err(Error::unsupported(self.dialect.name(), "NULLS FIRST / NULLS LAST"));
            }
            ts.space().push(match nulls {
                NullsOrder::First => Token::NullsFirst,
                NullsOrder::Last => Token::NullsLast,
            });
        }
        Ok(())
    }

    fn from_item(&mut self, item: &FromItem, ts: &mut TokenStream) -> Result<()> {
        match item {
            FromItem::Table(t) => {
                self.table_name(t, ts);
            }
            FromItem::Alias(a) => {
                match a.target() {
                    AliasTarget::Table(t) => {
                        self.table_name(t, ts);
                    }
                    AliasTarget::Select(s) => {
                        ts.lparen();
                        self.select(s, SelectContext::Standalone, ts)?;
                        ts.rparen();
                    }
                    AliasTarget::Compound(c) => {
                        ts.lparen();
                        self.compound(c, ts)?;
                        ts.rparen();
                    }
                    AliasTarget::Cte(cte) => {
                        let name = self.alias_name(a)?;
                        self.register_cte(a, &name, cte)?;
                        ts.push(Token::Ident(name));
                        return Ok(());
                    }
                }
                let name = self.alias_name(a)?;
                ts.space().push(Token::As).space().push(Token::Ident(name));
            }
            FromItem::Join(j) => self.join(j, ts)?,
        }
        Ok(())
    }

    /// Render a CTE body into the WITH prefix the first time its name is
    /// used. A restated CTE replaces its anchor in place; references made
    /// while the body is rendering resolve to the name alone.
    fn register_cte(&mut self, alias: &AliasRef, name: &str, cte: &Cte) -> Result<()> {
        let root = alias.source_id();
        let restated = cte.restates.is_some();
        let slot = match self.cte_entries.get(name) {
            Some(entry) if entry.root != root => {
                return Err(Error::compile(format!(
                    "two different CTEs are named '{}' in one statement",
                    name
                )));
            }
            Some(entry) if entry.restated || !restated => return Ok(()),
            Some(entry) => entry.slot,
            None => None,
        };
        self.cte_entries.insert(name.to_string(), CteEntry { root, restated, slot });

        let outer = std::mem::take(&mut self.scopes);
        let mut body = TokenStream::new();
        let columns = match &cte.query {
            CompoundElement::Select(s) => self.select(s, SelectContext::Standalone, &mut body),
            CompoundElement::Compound(c) => self.compound(c, &mut body),
        };
        self.scopes = outer;
        let clause = CteClause {
            name: name.to_string(),
            columns: columns?,
            body,
            recursive: cte.recursive,
        };

        let slot = match slot {
            Some(index) => {
                self.ctes[index] = clause;
                index
            }
            None => {
                self.ctes.push(clause);
                self.ctes.len() - 1
            }
        };
        if let Some(entry) = self.cte_entries.get_mut(name) {
            entry.slot = Some(slot);
        }
        Ok(())
    }

    fn join(&mut self, join: &Join, ts: &mut TokenStream) -> Result<()> {
        self.from_item(&join.left, ts)?;
        ts.space();
        match join.kind {
            JoinKind::Inner => {}
            JoinKind::LeftOuter => {
                ts.push(Token::Left).space().push(Token::Outer).space();
            }
            JoinKind::RightOuter => {
                ts.push(Token::Right).space().push(Token::Outer).space();
            }
            JoinKind::FullOuter => {
                if !self.dialect.supports_full_outer_join() {
                    return Err(Error::unsupported(self.dialect.name(), "FULL OUTER JOIN"));
                }
                ts.push(Token::Full).space().push(Token::Outer).space();
            }
        }
        ts.push(Token::Join).space();
        if matches!(join.right, FromItem::Join(_)) {
            ts.lparen();
            self.from_item(&join.right, ts)?;
            ts.rparen();
        } else {
            self.from_item(&join.right, ts)?;
        }
        ts.space().push(Token::On).space();
        self.expr(&join.on, ts)
    }

    // =========================================================================
    // Compound SELECT
    // =========================================================================

    fn compound(&mut self, compound: &CompoundSelect, ts: &mut TokenStream) -> Result<Vec<String>> {
        let mut names = None;
        for (i, element) in compound.elements().iter().enumerate() {
            if i > 0 {
                ts.newline();
                set_operator_tokens(compound.operator(), ts);
                ts.newline();
            }
            let element_names = match element {
                CompoundElement::Select(s) if !s.has_ordering_or_limit() => {
                    self.select(s, SelectContext::Standalone, ts)?
                }
                CompoundElement::Select(s) => {
                    ts.lparen();
                    let n = self.select(s, SelectContext::Standalone, ts)?;
                    ts.rparen();
                    n
                }
                CompoundElement::Compound(c) => {
                    ts.lparen();
                    let n = self.compound(c, ts)?;
                    ts.rparen();
                    n
                }
            };
            names.get_or_insert(element_names);
        }

        // ORDER BY entries were reduced to label references and ordinals
        // when they were added, so no scope is needed to render them.
        self.scopes.push(Scope::default());
        let result = self.ordering_and_pagination(
            compound.order_by_items(),
            compound.limit_value(),
            compound.offset_value(),
            ts,
        );
        self.scopes.pop();
        result?;
        Ok(names.unwrap_or_default())
    }

    // =========================================================================
    // DML
    // =========================================================================

    fn insert(&mut self, insert: &Insert, ts: &mut TokenStream) -> Result<()> {
        let table = &insert.table;
        ts.push(Token::Insert).space().push(Token::Into).space();
        self.table_name(table, ts);

        if let Some((columns, select)) = &insert.select {
            for name in columns {
                require_column(table, name)?;
            }
            if columns.len() != select.columns().len() {
                return Err(Error::compile(format!(
                    "INSERT names {} columns but its SELECT returns {}",
                    columns.len(),
                    select.columns().len()
                )));
            }
            ts.space().lparen();
            for (i, name) in columns.iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                ts.push(Token::Ident(name.clone()));
            }
            ts.rparen().space();
            self.select(select, SelectContext::Standalone, ts)?;
            return Ok(());
        }

        let multi = insert.rows.len() > 1;
        if multi && !self.dialect.supports_multivalues_insert() {
            return Err(Error::unsupported(self.dialect.name(), "multi-row INSERT ... VALUES"));
        }
        for row in &insert.rows {
            for (name, _) in row {
                require_column(table, name)?;
            }
        }
        if let Some(first) = insert.rows.first() {
            let expected: HashSet<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
            for row in &insert.rows[1..] {
                let got: HashSet<&str> = row.iter().map(|(k, _)| k.as_str()).collect();
                if got != expected {
                    return Err(Error::compile(
                        "every row of a multi-row INSERT must name the same columns",
                    ));
                }
            }
        }

        let empty = Vec::new();
        let rows: Vec<&Vec<(String, Expr)>> = if insert.rows.is_empty() {
            vec![&empty]
        } else {
            insert.rows.iter().collect()
        };
        let columns: Vec<&TableColumn> = table
            .table_columns()
            .iter()
            .filter(|c| {
                insert.rows.is_empty()
                    || c.default.is_some()
                    || rows[0].iter().any(|(k, _)| *k == c.name)
            })
            .collect();

        ts.space().lparen();
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                ts.comma_space();
            }
            ts.push(Token::Ident(col.name.clone()));
        }
        ts.rparen().space().push(Token::Values).space();

        for (row_index, row) in rows.iter().enumerate() {
            if row_index > 0 {
                ts.comma_space();
            }
            ts.lparen();
            for (i, col) in columns.iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                let bind_name = if multi {
                    format!("{}_m{}", col.name, row_index)
                } else {
                    col.name.clone()
                };
                match row.iter().find(|(k, _)| *k == col.name) {
                    Some((_, value)) => self.dml_value(col, bind_name, value, ts)?,
                    None => {
                        let bind = BindParam {
                            key: BindKey::Named(bind_name),
                            value: col.default.clone(),
                            data_type: col.data_type.clone(),
                        };
                        self.bind(&bind, ts)?;
                    }
                }
            }
            ts.rparen();
        }
        Ok(())
    }

    fn update(&mut self, update: &Update, ts: &mut TokenStream) -> Result<()> {
        let table = &update.table;
        for (name, _) in &update.values {
            require_column(table, name)?;
        }
        ts.push(Token::Update).space();
        self.table_name(table, ts);
        ts.space().push(Token::Set).space();

        let mut first = true;
        for col in table.table_columns() {
            let value = update.values.iter().find(|(k, _)| *k == col.name);
            if value.is_none() && !update.values.is_empty() {
                continue;
            }
            if !first {
                ts.comma_space();
            }
            first = false;
            ts.push(Token::Ident(col.name.clone())).push(Token::Eq);
            match value {
                Some((_, v)) => self.dml_value(col, col.name.clone(), v, ts)?,
                None => {
                    let bind = BindParam {
                        key: BindKey::Named(col.name.clone()),
                        value: None,
                        data_type: col.data_type.clone(),
                    };
                    self.bind(&bind, ts)?;
                }
            }
        }

        if let Some(w) = &update.where_clause {
            ts.newline().push(Token::Where).space();
            self.expr(w, ts)?;
        }
        Ok(())
    }

    /// A value in VALUES or SET. Plain values bind under the column's name;
    /// expressions render as they are.
    fn dml_value(&mut self, col: &TableColumn, name: String, value: &Expr, ts: &mut TokenStream) -> Result<()> {
        let bind = match value {
            Expr::Bind(b) if matches!(b.key, BindKey::Anonymous(_)) => BindParam {
                key: BindKey::Named(name),
                value: b.value.clone(),
                data_type: col.data_type.clone().or_else(|| b.data_type.clone()),
            },
            Expr::Null => BindParam {
                key: BindKey::Named(name),
                value: Some(Value::Null),
                data_type: col.data_type.clone(),
            },
            other => return self.expr(other, ts),
        };
        self.bind(&bind, ts)
    }

    fn returning(&mut self, items: &[Expr], ts: &mut TokenStream) -> Result<Vec<String>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        if !self.dialect.supports_returning() {
            return Err(Error::unsupported(self.dialect.name(), "RETURNING"));
        }
        ts.newline().push(Token::Returning).space();
        let exported = export_columns(items);
        self.column_list(items, &exported, ts)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&mut self, expr: &Expr, ts: &mut TokenStream) -> Result<()> {
        match expr {
            Expr::Column(c) => self.column(c, ts)?,
            Expr::Bind(b) => self.bind(b, ts)?,
            Expr::Null => {
                ts.push(Token::LitNull);
            }
            Expr::Boolean(b) => {
                ts.push(Token::LitBool(*b));
            }
            Expr::Binary { left, op, right } => self.binary(left, *op, right, ts)?,
            Expr::Unary { op, expr } => {
                match op {
                    UnaryOperator::Not => ts.push(Token::Not).space(),
                    UnaryOperator::Neg => ts.push(Token::Minus),
                };
                self.operand(expr, op.precedence(), ts)?;
            }
            Expr::BooleanList { op, clauses } => {
                let token = match op {
                    BooleanOperator::And => Token::And,
                    BooleanOperator::Or => Token::Or,
                };
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        ts.space().push(token.clone()).space();
                    }
                    self.operand(clause, op.precedence(), ts)?;
                }
            }
            Expr::Function(f) => self.function(f, ts)?,
            Expr::Label(l) => self.expr(&l.expr, ts)?,
            Expr::Case(c) => self.case(c, ts)?,
            Expr::Cast { expr, data_type } => {
                ts.push(Token::Cast).lparen();
                self.expr(expr, ts)?;
                ts.space()
                    .push(Token::As)
                    .space()
                    .push(Token::Raw(self.dialect.emit_data_type(data_type)))
                    .rparen();
            }
            Expr::In {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // Nothing matches an empty list; everything is outside it.
                    ts.push(Token::LitInt(1))
                        .space()
                        .push(if *negated { Token::Eq } else { Token::Ne })
                        .space()
                        .push(Token::LitInt(1));
                    return Ok(());
                }
                self.operand(expr, PREDICATE_PRECEDENCE, ts)?;
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space().lparen();
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        ts.comma_space();
                    }
                    self.expr(v, ts)?;
                }
                ts.rparen();
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                self.operand(expr, PREDICATE_PRECEDENCE, ts)?;
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space().lparen();
                self.select(subquery, SelectContext::Correlated, ts)?;
                ts.rparen();
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                self.operand(expr, PREDICATE_PRECEDENCE, ts)?;
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Between).space();
                self.operand(low, PREDICATE_PRECEDENCE, ts)?;
                ts.space().push(Token::And).space();
                self.operand(high, PREDICATE_PRECEDENCE, ts)?;
            }
            Expr::IsNull { expr, negated } => {
                self.operand(expr, PREDICATE_PRECEDENCE, ts)?;
                ts.space().push(Token::Is).space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Null);
            }
            Expr::Like {
                expr,
                pattern,
                escape,
                case_insensitive,
                negated,
            } => self.like(expr, pattern, *escape, *case_insensitive, *negated, ts)?,
            Expr::Exists(s) => {
                ts.push(Token::Exists).space().lparen();
                self.select(s, SelectContext::Correlated, ts)?;
                ts.rparen();
            }
            Expr::ScalarSubquery(s) => {
                ts.lparen();
                self.select(s, SelectContext::Correlated, ts)?;
                ts.rparen();
            }
            Expr::Star(source) => {
                if let Some(source) = source {
                    if self.qualify(&source.key()) {
                        self.source_qualifier(source, ts)?;
                        ts.push(Token::Dot);
                    }
                }
                ts.push(Token::Star);
            }
            Expr::Over(w) => self.window(w, ts)?,
            Expr::LabelReference(name) => {
                ts.push(Token::Ident(name.clone()));
            }
            Expr::Ordinal(n) => {
                ts.push(Token::LitInt(*n as i64));
            }
            Expr::Text(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }
        Ok(())
    }

    /// Render `expr`, parenthesized when it binds no tighter than its parent.
    fn operand(&mut self, expr: &Expr, parent: u8, ts: &mut TokenStream) -> Result<()> {
        if expr.precedence() <= parent {
            ts.lparen();
            self.expr(expr, ts)?;
            ts.rparen();
            Ok(())
        } else {
            self.expr(expr, ts)
        }
    }

    fn binary(&mut self, left: &Expr, op: BinaryOperator, right: &Expr, ts: &mut TokenStream) -> Result<()> {
        if op == BinaryOperator::Concat && !self.dialect.supports_concat_operator() {
            ts.push(Token::FunctionName("concat".into())).lparen();
            self.expr(left, ts)?;
            ts.comma_space();
            self.expr(right, ts)?;
            ts.rparen();
            return Ok(());
        }

        let prec = op.precedence();

        // Left-associative: an equal-precedence left operand needs no
        // parentheses, except under comparisons, which do not chain.
        let left_parens = left.precedence() < prec || (left.precedence() == prec && op.is_comparison());
        let right_parens = right.precedence() <= prec
            && !matches!(right, Expr::Binary { op: inner, .. } if *inner == op && op.is_associative());

        self.wrapped(left, left_parens, ts)?;
        ts.space().push(binary_token(op)).space();
        self.wrapped(right, right_parens, ts)
    }

    fn wrapped(&mut self, expr: &Expr, parens: bool, ts: &mut TokenStream) -> Result<()> {
        if parens {
            ts.lparen();
        }
        self.expr(expr, ts)?;
        if parens {
            ts.rparen();
        }
        Ok(())
    }

    fn like(
        &mut self,
        expr: &Expr,
        pattern: &Expr,
        escape: Option<char>,
        case_insensitive: bool,
        negated: bool,
        ts: &mut TokenStream,
    ) -> Result<()> {
        let lowered = case_insensitive && !self.dialect.supports_ilike();
        if lowered {
            ts.push(Token::FunctionName("lower".into())).lparen();
            self.expr(expr, ts)?;
            ts.rparen();
        } else {
            self.operand(expr, PREDICATE_PRECEDENCE, ts)?;
        }
        ts.space();
        if negated {
            ts.push(Token::Not).space();
        }
        ts.push(if case_insensitive && !lowered {
            Token::ILike
        } else {
            Token::Like
        });
        ts.space();
        if lowered {
            ts.push(Token::FunctionName("lower".into())).lparen();
            self.expr(pattern, ts)?;
            ts.rparen();
        } else {
            self.operand(pattern, PREDICATE_PRECEDENCE, ts)?;
        }
        if let Some(c) = escape {
            ts.space()
                .push(Token::Escape)
                .space()
                .push(Token::LitString(c.to_string()));
        }
        Ok(())
    }

    fn bind(&mut self, bind: &BindParam, ts: &mut TokenStream) -> Result<()> {
        if self.options.literal_binds {
            let value = bind.value.as_ref().ok_or_else(|| {
                Error::compile(format!(
                    "bind parameter '{}' has no value to render inline",
                    self.bind_name(bind)
                ))
            })?;
            ts.push(literal_token(value)?);
            return Ok(());
        }
        let name = self.bind_name(bind);
        self.register_parameter(&name, bind)?;
        // Positions are assigned once the WITH prefix is in place.
        ts.push(Token::Placeholder { name, position: 0 });
        Ok(())
    }

    fn function(&mut self, f: &FunctionCall, ts: &mut TokenStream) -> Result<()> {
        ts.push(Token::FunctionName(f.name.clone())).lparen();
        if f.distinct {
            ts.push(Token::Distinct).space();
        }
        for (i, arg) in f.args.iter().enumerate() {
            if i > 0 {
                ts.comma_space();
            }
            self.expr(arg, ts)?;
        }
        ts.rparen();
        Ok(())
    }

    fn case(&mut self, case: &CaseExpr, ts: &mut TokenStream) -> Result<()> {
        if case.whens.is_empty() {
            return Err(Error::compile("CASE needs at least one WHEN"));
        }
        ts.push(Token::Case);
        if let Some(operand) = &case.operand {
            ts.space();
            self.expr(operand, ts)?;
        }
        for (when, then) in &case.whens {
            ts.space().push(Token::When).space();
            self.expr(when, ts)?;
            ts.space().push(Token::Then).space();
            self.expr(then, ts)?;
        }
        if let Some(e) = &case.else_result {
            ts.space().push(Token::Else).space();
            self.expr(e, ts)?;
        }
        ts.space().push(Token::End);
        Ok(())
    }

    fn window(&mut self, w: &WindowFunction, ts: &mut TokenStream) -> Result<()> {
        self.expr(&w.function, ts)?;
        ts.space().push(Token::Over).space().lparen();
        let mut needs_space = false;

        if !w.partition_by.is_empty() {
            ts.push(Token::PartitionBy).space();
            for (i, p) in w.partition_by.iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                self.expr(p, ts)?;
            }
            needs_space = true;
        }

        if !w.order_by.is_empty() {
            if needs_space {
                ts.space();
            }
            ts.push(Token::OrderBy).space();
            for (i, o) in w.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma_space();
                }
                self.order_item(o, ts)?;
            }
            needs_space = true;
        }

        if let Some(frame) = &w.frame {
            if needs_space {
                ts.space();
            }
            ts.push(match frame.kind {
                WindowFrameKind::Rows => Token::Rows,
                WindowFrameKind::Range => Token::Range,
            })
            .space();
            match &frame.end {
                Some(end) => {
                    ts.push(Token::Between).space();
                    frame_bound(&frame.start, ts);
                    ts.space().push(Token::And).space();
                    frame_bound(end, ts);
                }
                None => frame_bound(&frame.start, ts),
            }
        }

        ts.rparen();
        Ok(())
    }
}

fn require_column(table: &TableRef, name: &str) -> Result<()> {
    if table.clause().get_column(name).is_none() {
        return Err(Error::compile(format!(
            "unconsumed column names: {} (not a column of '{}')",
            name,
            table.key()
        )));
    }
    Ok(())
}

fn binary_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
        BinaryOperator::Mod => Token::Mod,
        BinaryOperator::Concat => Token::Concat,
    }
}

fn set_operator_tokens(op: SetOperator, ts: &mut TokenStream) {
    let (keyword, all) = match op {
        SetOperator::Union => (Token::Union, false),
        SetOperator::UnionAll => (Token::Union, true),
        SetOperator::Intersect => (Token::Intersect, false),
        SetOperator::IntersectAll => (Token::Intersect, true),
        SetOperator::Except => (Token::Except, false),
        SetOperator::ExceptAll => (Token::Except, true),
    };
    ts.push(keyword);
    if all {
        ts.space().push(Token::All);
    }
}

fn frame_bound(bound: &WindowFrameBound, ts: &mut TokenStream) {
    match bound {
        WindowFrameBound::UnboundedPreceding => {
            ts.push(Token::Unbounded).space().push(Token::Preceding);
        }
        WindowFrameBound::Preceding(n) => {
            ts.push(Token::LitInt(*n as i64)).space().push(Token::Preceding);
        }
        WindowFrameBound::CurrentRow => {
            ts.push(Token::CurrentRow);
        }
        WindowFrameBound::Following(n) => {
            ts.push(Token::LitInt(*n as i64)).space().push(Token::Following);
        }
        WindowFrameBound::UnboundedFollowing => {
            ts.push(Token::Unbounded).space().push(Token::Following);
        }
    }
}
