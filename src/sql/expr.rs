//! Expression AST - the core of SQL expression building.
//!
//! Expressions are immutable. Child nodes are held in [`Arc`] so that
//! composing a new expression shares the existing subtree instead of
//! copying it. Every variant is handled by the compiler's exhaustive match,
//! so adding one is a compile error until it renders.
//!
//! Anonymous nodes (bind parameters without an explicit name, labels and
//! aliases without a name) carry an identity drawn from a process-wide
//! counter. The compiler turns identities into names like `name_1` or
//! `anon_1`, scoped to one statement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::query::Select;
use super::selectable::ColumnSource;
use super::types::{DataType, Value};

static NEXT_ANON_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a new identity for an anonymous node.
pub(crate) fn next_anon_id() -> u64 {
    NEXT_ANON_ID.fetch_add(1, Ordering::Relaxed)
}

/// Base name for anonymous binds that are not tied to a column.
pub const DEFAULT_BIND_BASE: &str = "param";

/// Base name for anonymous labels and aliases.
pub const DEFAULT_ANON_BASE: &str = "anon";

/// Precedence of atoms: never parenthesized.
pub const ATOM_PRECEDENCE: u8 = 100;

/// Comparisons, NOT and the IN / BETWEEN / IS / LIKE predicates.
pub const PREDICATE_PRECEDENCE: u8 = 5;

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column of a table or alias.
    Column(ColumnRef),

    /// Bound parameter.
    Bind(BindParam),

    /// `NULL` constant.
    Null,

    /// `TRUE` / `FALSE` constant.
    Boolean(bool),

    /// Binary operation: left op right
    Binary {
        left: Arc<Expr>,
        op: BinaryOperator,
        right: Arc<Expr>,
    },

    /// Unary operation: op expr
    Unary { op: UnaryOperator, expr: Arc<Expr> },

    /// Flattened AND / OR of two or more clauses.
    BooleanList {
        op: BooleanOperator,
        clauses: Arc<Vec<Expr>>,
    },

    /// Function call: name(args...)
    Function(Arc<FunctionCall>),

    /// `expr AS name`, or an anonymous label named at compile time.
    Label(Arc<Label>),

    /// CASE WHEN... THEN... ELSE... END
    Case(Arc<CaseExpr>),

    /// CAST(expr AS type)
    Cast { expr: Arc<Expr>, data_type: DataType },

    /// IN: expr IN (values...)
    In {
        expr: Arc<Expr>,
        values: Arc<Vec<Expr>>,
        negated: bool,
    },

    /// IN subquery: expr IN (SELECT ...)
    InSubquery {
        expr: Arc<Expr>,
        subquery: Arc<Select>,
        negated: bool,
    },

    /// BETWEEN: expr BETWEEN low AND high
    Between {
        expr: Arc<Expr>,
        low: Arc<Expr>,
        high: Arc<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Arc<Expr>, negated: bool },

    /// LIKE / ILIKE with optional ESCAPE.
    Like {
        expr: Arc<Expr>,
        pattern: Arc<Expr>,
        escape: Option<char>,
        case_insensitive: bool,
        negated: bool,
    },

    /// EXISTS (SELECT ...)
    Exists(Arc<Select>),

    /// (SELECT ...) used as a value.
    ScalarSubquery(Arc<Select>),

    /// Wildcard: * or source.*
    Star(Option<ColumnSource>),

    /// Window function: fn(...) OVER (...)
    Over(Arc<WindowFunction>),

    /// Reference to a result column by its label, e.g. in a UNION's ORDER BY.
    LabelReference(String),

    /// 1-based reference to a result column position.
    Ordinal(u64),

    /// Raw SQL passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass user input to this variant.** Raw SQL is not sanitized
    /// and can lead to SQL injection vulnerabilities. Bind values instead.
    Text(String),
}

/// Identity of an anonymous node and the base its generated name uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonName {
    pub id: u64,
    pub base: String,
}

impl AnonName {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            id: next_anon_id(),
            base: base.into(),
        }
    }
}

/// A column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub source: ColumnSource,
    pub name: String,
    pub data_type: Option<DataType>,
    /// Set when the column is an unnamed expression exported by a subquery;
    /// the rendered name is whatever the subquery's label resolves to.
    pub anon: Option<AnonName>,
}

/// How a bound parameter is named.
#[derive(Debug, Clone, PartialEq)]
pub enum BindKey {
    /// Rendered exactly as given.
    Named(String),
    /// Named `<base>_<n>` at compile time.
    Anonymous(AnonName),
}

/// A bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BindParam {
    pub key: BindKey,
    /// `None` for a placeholder whose value is supplied at execution.
    pub value: Option<Value>,
    pub data_type: Option<DataType>,
}

impl BindParam {
    /// Anonymous bind carrying a value.
    pub fn anonymous(value: Value) -> Self {
        let data_type = value.data_type();
        Self {
            key: BindKey::Anonymous(AnonName::new(DEFAULT_BIND_BASE)),
            value: Some(value),
            data_type,
        }
    }

    /// Explicitly named bind.
    pub fn named(name: impl Into<String>, value: Option<Value>) -> Self {
        let data_type = value.as_ref().and_then(Value::data_type);
        Self {
            key: BindKey::Named(name.into()),
            value,
            data_type,
        }
    }

    /// Adopt the type of the expression this bind is compared with, and
    /// its name when the other side is a column.
    fn coerced_to(mut self, against: &Expr) -> Self {
        if let (BindKey::Anonymous(anon), Expr::Column(col)) = (&mut self.key, against) {
            if anon.base == DEFAULT_BIND_BASE {
                anon.base = col.name.clone();
            }
        }
        if let Some(ty) = against.data_type() {
            self.data_type = Some(ty);
        }
        self
    }
}

/// Function call node.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub return_type: Option<DataType>,
}

/// A labeled expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Explicit name; `None` means generate one from `anon`.
    pub name: Option<String>,
    pub anon: AnonName,
    pub expr: Expr,
}

/// CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    pub operand: Option<Expr>,
    pub whens: Vec<(Expr, Expr)>,
    pub else_result: Option<Expr>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    // String
    Concat,
}

impl BinaryOperator {
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 8,
            BinaryOperator::Plus | BinaryOperator::Minus => 7,
            BinaryOperator::Concat => 6,
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Gt
            | BinaryOperator::Lte
            | BinaryOperator::Gte => PREDICATE_PRECEDENCE,
        }
    }

    /// `a op (b op c)` equals `(a op b) op c`.
    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Plus | BinaryOperator::Mul | BinaryOperator::Concat
        )
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == PREDICATE_PRECEDENCE
    }

    /// The comparison that is true exactly when this one is false.
    pub fn negate(&self) -> Option<Self> {
        Some(match self {
            BinaryOperator::Eq => BinaryOperator::Ne,
            BinaryOperator::Ne => BinaryOperator::Eq,
            BinaryOperator::Lt => BinaryOperator::Gte,
            BinaryOperator::Gte => BinaryOperator::Lt,
            BinaryOperator::Gt => BinaryOperator::Lte,
            BinaryOperator::Lte => BinaryOperator::Gt,
            _ => return None,
        })
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Neg,
}

impl UnaryOperator {
    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOperator::Not => PREDICATE_PRECEDENCE,
            UnaryOperator::Neg => 8,
        }
    }
}

/// Conjunction operators for [`Expr::BooleanList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOperator {
    And,
    Or,
}

impl BooleanOperator {
    pub fn precedence(&self) -> u8 {
        match self {
            BooleanOperator::And => 3,
            BooleanOperator::Or => 2,
        }
    }
}

// =============================================================================
// Ordering and Window Types
// =============================================================================

/// Sort direction (shared by ORDER BY and window ordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// NULLS ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub dir: Option<SortDir>,
    pub nulls: Option<NullsOrder>,
}

impl OrderByItem {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            dir: None,
            nulls: None,
        }
    }

    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: Some(SortDir::Asc),
            nulls: None,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: Some(SortDir::Desc),
            nulls: None,
        }
    }

    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }
}

impl From<Expr> for OrderByItem {
    fn from(expr: Expr) -> Self {
        OrderByItem::new(expr)
    }
}

/// Window function node.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFunction {
    pub function: Expr,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub frame: Option<WindowFrame>,
}

/// Window frame specification.
///
/// Examples:
/// - `ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW`
/// - `RANGE BETWEEN 1 PRECEDING AND 1 FOLLOWING`
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub kind: WindowFrameKind,
    pub start: WindowFrameBound,
    pub end: Option<WindowFrameBound>,
}

impl WindowFrame {
    /// Create a frame with just a start bound.
    pub fn new(kind: WindowFrameKind, start: WindowFrameBound) -> Self {
        Self {
            kind,
            start,
            end: None,
        }
    }

    /// Create a frame with BETWEEN start AND end.
    pub fn between(kind: WindowFrameKind, start: WindowFrameBound, end: WindowFrameBound) -> Self {
        Self {
            kind,
            start,
            end: Some(end),
        }
    }

    /// ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
    pub fn rows_to_current() -> Self {
        Self::between(
            WindowFrameKind::Rows,
            WindowFrameBound::UnboundedPreceding,
            WindowFrameBound::CurrentRow,
        )
    }

    /// Rolling window: ROWS BETWEEN (periods-1) PRECEDING AND CURRENT ROW
    pub fn rolling(periods: u32) -> Self {
        let preceding = periods.saturating_sub(1);
        Self::between(
            WindowFrameKind::Rows,
            WindowFrameBound::Preceding(preceding as u64),
            WindowFrameBound::CurrentRow,
        )
    }
}

/// Frame type: ROWS or RANGE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFrameKind {
    Rows,
    Range,
}

/// Frame boundary specification.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowFrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

/// Builder for window function expressions.
#[derive(Debug, Clone)]
#[must_use = "call .build() to produce the windowed expression"]
pub struct WindowBuilder {
    function: Expr,
    partition_by: Vec<Expr>,
    order_by: Vec<OrderByItem>,
    frame: Option<WindowFrame>,
}

impl WindowBuilder {
    pub fn new(function: Expr) -> Self {
        Self {
            function,
            partition_by: Vec::new(),
            order_by: Vec::new(),
            frame: None,
        }
    }

    pub fn partition_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.partition_by.extend(exprs);
        self
    }

    pub fn order_by<I, O>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderByItem>,
    {
        self.order_by.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn build(self) -> Expr {
        Expr::Over(Arc::new(WindowFunction {
            function: self.function,
            partition_by: self.partition_by,
            order_by: self.order_by,
            frame: self.frame,
        }))
    }
}

// =============================================================================
// Node Properties
// =============================================================================

impl Expr {
    /// Precedence class used by the compiler to decide parenthesization.
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { op, .. } => op.precedence(),
            Expr::BooleanList { op, .. } => op.precedence(),
            Expr::In { .. }
            | Expr::InSubquery { .. }
            | Expr::Between { .. }
            | Expr::IsNull { .. }
            | Expr::Like { .. } => PREDICATE_PRECEDENCE,
            Expr::Label(label) => label.expr.precedence(),
            _ => ATOM_PRECEDENCE,
        }
    }

    /// The semantic type this expression would produce, when known.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Expr::Column(c) => c.data_type.clone(),
            Expr::Bind(b) => b.data_type.clone(),
            Expr::Null => None,
            Expr::Boolean(_) => Some(DataType::Bool),
            Expr::Binary { left, op, right } => {
                if op.is_comparison() {
                    Some(DataType::Bool)
                } else if *op == BinaryOperator::Concat {
                    Some(DataType::String)
                } else {
                    left.data_type().or_else(|| right.data_type())
                }
            }
            Expr::Unary { op, expr } => match op {
                UnaryOperator::Not => Some(DataType::Bool),
                UnaryOperator::Neg => expr.data_type(),
            },
            Expr::BooleanList { .. }
            | Expr::In { .. }
            | Expr::InSubquery { .. }
            | Expr::Between { .. }
            | Expr::IsNull { .. }
            | Expr::Like { .. }
            | Expr::Exists(_) => Some(DataType::Bool),
            Expr::Function(f) => f.return_type.clone(),
            Expr::Label(label) => label.expr.data_type(),
            Expr::Case(case) => case.whens.first().and_then(|(_, then)| then.data_type()),
            Expr::Cast { data_type, .. } => Some(data_type.clone()),
            Expr::ScalarSubquery(select) => select.columns().first().and_then(Expr::data_type),
            Expr::Over(w) => w.function.data_type(),
            Expr::Star(_) | Expr::LabelReference(_) | Expr::Ordinal(_) | Expr::Text(_) => None,
        }
    }

    /// Visit every FROM source this expression refers to, in order of
    /// appearance. Subqueries own their sources and are not entered.
    pub fn visit_sources(&self, f: &mut dyn FnMut(&ColumnSource)) {
        match self {
            Expr::Column(c) => f(&c.source),
            Expr::Star(Some(source)) => f(source),
            Expr::Binary { left, right, .. } => {
                left.visit_sources(f);
                right.visit_sources(f);
            }
            Expr::Unary { expr, .. }
            | Expr::Cast { expr, .. }
            | Expr::IsNull { expr, .. }
            | Expr::InSubquery { expr, .. } => expr.visit_sources(f),
            Expr::BooleanList { clauses, .. } => {
                for clause in clauses.iter() {
                    clause.visit_sources(f);
                }
            }
            Expr::Function(func) => {
                for arg in &func.args {
                    arg.visit_sources(f);
                }
            }
            Expr::Label(label) => label.expr.visit_sources(f),
            Expr::Case(case) => {
                if let Some(operand) = &case.operand {
                    operand.visit_sources(f);
                }
                for (when, then) in &case.whens {
                    when.visit_sources(f);
                    then.visit_sources(f);
                }
                if let Some(e) = &case.else_result {
                    e.visit_sources(f);
                }
            }
            Expr::In { expr, values, .. } => {
                expr.visit_sources(f);
                for v in values.iter() {
                    v.visit_sources(f);
                }
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.visit_sources(f);
                low.visit_sources(f);
                high.visit_sources(f);
            }
            Expr::Like { expr, pattern, .. } => {
                expr.visit_sources(f);
                pattern.visit_sources(f);
            }
            Expr::Over(w) => {
                w.function.visit_sources(f);
                for p in &w.partition_by {
                    p.visit_sources(f);
                }
                for o in &w.order_by {
                    o.expr.visit_sources(f);
                }
            }
            Expr::Bind(_)
            | Expr::Null
            | Expr::Boolean(_)
            | Expr::Exists(_)
            | Expr::ScalarSubquery(_)
            | Expr::Star(None)
            | Expr::LabelReference(_)
            | Expr::Ordinal(_)
            | Expr::Text(_) => {}
        }
    }

    /// Wrap an expression for use as a SELECT list entry: anything that is
    /// not a column, label or star gets an anonymous label.
    pub(crate) fn into_select_item(self) -> Expr {
        match &self {
            Expr::Column(_) | Expr::Label(_) | Expr::Star(_) => self,
            Expr::Function(f) => {
                let base = f.name.to_lowercase();
                label_with(self, None, base)
            }
            Expr::Over(w) => {
                let base = match &w.function {
                    Expr::Function(f) => f.name.to_lowercase(),
                    _ => DEFAULT_ANON_BASE.to_string(),
                };
                label_with(self, None, base)
            }
            _ => label_with(self, None, DEFAULT_ANON_BASE),
        }
    }
}

fn label_with(expr: Expr, name: Option<String>, base: impl Into<String>) -> Expr {
    Expr::Label(Arc::new(Label {
        name,
        anon: AnonName::new(base),
        expr,
    }))
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::Binary {
        left: Arc::new(left),
        op,
        right: Arc::new(right),
    }
}

/// Coerce a bind on either side against the other operand.
fn coerce_pair(left: Expr, right: Expr) -> (Expr, Expr) {
    match (left, right) {
        (Expr::Bind(b), right) if !matches!(right, Expr::Bind(_)) => {
            (Expr::Bind(b.coerced_to(&right)), right)
        }
        (left, Expr::Bind(b)) => {
            let coerced = b.coerced_to(&left);
            (left, Expr::Bind(coerced))
        }
        pair => pair,
    }
}

fn coerce_against(against: &Expr, value: Expr) -> Expr {
    match value {
        Expr::Bind(b) => Expr::Bind(b.coerced_to(against)),
        other => other,
    }
}

fn coerced_binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    let (left, right) = coerce_pair(left, right);
    binary(left, op, right)
}

// =============================================================================
// Constructors
// =============================================================================

/// A value bound as an anonymous parameter.
pub fn literal(value: impl Into<Value>) -> Expr {
    match value.into() {
        Value::Null => Expr::Null,
        v => Expr::Bind(BindParam::anonymous(v)),
    }
}

/// A named parameter whose value is supplied at execution time.
pub fn bindparam(name: impl Into<String>) -> Expr {
    Expr::Bind(BindParam::named(name, None))
}

/// A named parameter with a value.
pub fn bindparam_value(name: impl Into<String>, value: impl Into<Value>) -> Expr {
    Expr::Bind(BindParam::named(name, Some(value.into())))
}

pub fn null() -> Expr {
    Expr::Null
}

pub fn true_() -> Expr {
    Expr::Boolean(true)
}

pub fn false_() -> Expr {
    Expr::Boolean(false)
}

/// Raw SQL text. See the warning on [`Expr::Text`].
pub fn text(sql: impl Into<String>) -> Expr {
    Expr::Text(sql.into())
}

/// 1-based result column position, for ORDER BY.
pub fn ordinal(position: u64) -> Expr {
    Expr::Ordinal(position)
}

/// Result column label, for ORDER BY.
pub fn label_ref(name: impl Into<String>) -> Expr {
    Expr::LabelReference(name.into())
}

fn boolean_list(op: BooleanOperator, clauses: impl IntoIterator<Item = Expr>) -> Expr {
    let mut flat = Vec::new();
    for clause in clauses {
        match clause {
            Expr::BooleanList { op: inner, clauses } if inner == op => {
                flat.extend(clauses.iter().cloned());
            }
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => Expr::Boolean(op == BooleanOperator::And),
        1 => flat.remove(0),
        _ => Expr::BooleanList {
            op,
            clauses: Arc::new(flat),
        },
    }
}

/// AND of all clauses. Nested ANDs are flattened; no clauses is `TRUE`.
pub fn and_(clauses: impl IntoIterator<Item = Expr>) -> Expr {
    boolean_list(BooleanOperator::And, clauses)
}

/// OR of all clauses. Nested ORs are flattened; no clauses is `FALSE`.
pub fn or_(clauses: impl IntoIterator<Item = Expr>) -> Expr {
    boolean_list(BooleanOperator::Or, clauses)
}

/// Negate a clause, inverting comparisons where possible.
pub fn not_(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { left, op, right } => match op.negate() {
            Some(negated) => Expr::Binary {
                left,
                op: negated,
                right,
            },
            None => Expr::Unary {
                op: UnaryOperator::Not,
                expr: Arc::new(Expr::Binary { left, op, right }),
            },
        },
        Expr::Unary {
            op: UnaryOperator::Not,
            expr,
        } => (*expr).clone(),
        Expr::Boolean(b) => Expr::Boolean(!b),
        Expr::In {
            expr,
            values,
            negated,
        } => Expr::In {
            expr,
            values,
            negated: !negated,
        },
        Expr::InSubquery {
            expr,
            subquery,
            negated,
        } => Expr::InSubquery {
            expr,
            subquery,
            negated: !negated,
        },
        Expr::Between {
            expr,
            low,
            high,
            negated,
        } => Expr::Between {
            expr,
            low,
            high,
            negated: !negated,
        },
        Expr::IsNull { expr, negated } => Expr::IsNull {
            expr,
            negated: !negated,
        },
        Expr::Like {
            expr,
            pattern,
            escape,
            case_insensitive,
            negated,
        } => Expr::Like {
            expr,
            pattern,
            escape,
            case_insensitive,
            negated: !negated,
        },
        other => Expr::Unary {
            op: UnaryOperator::Not,
            expr: Arc::new(other),
        },
    }
}

/// Generic function call. The return type is unknown.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    func_typed(name, args, None)
}

/// Function call with a declared return type.
pub fn func_typed(name: &str, args: Vec<Expr>, return_type: Option<DataType>) -> Expr {
    Expr::Function(Arc::new(FunctionCall {
        name: name.to_string(),
        args,
        distinct: false,
        return_type,
    }))
}

pub fn count(expr: Expr) -> Expr {
    func_typed("count", vec![expr], Some(DataType::Int64))
}

pub fn count_star() -> Expr {
    func_typed("count", vec![Expr::Star(None)], Some(DataType::Int64))
}

pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Function(Arc::new(FunctionCall {
        name: "count".into(),
        args: vec![expr],
        distinct: true,
        return_type: Some(DataType::Int64),
    }))
}

pub fn sum(expr: Expr) -> Expr {
    let ty = expr.data_type();
    func_typed("sum", vec![expr], ty)
}

pub fn avg(expr: Expr) -> Expr {
    func_typed("avg", vec![expr], Some(DataType::Float64))
}

pub fn min(expr: Expr) -> Expr {
    let ty = expr.data_type();
    func_typed("min", vec![expr], ty)
}

pub fn max(expr: Expr) -> Expr {
    let ty = expr.data_type();
    func_typed("max", vec![expr], ty)
}

pub fn lower(expr: Expr) -> Expr {
    func_typed("lower", vec![expr], Some(DataType::String))
}

pub fn coalesce(args: Vec<Expr>) -> Expr {
    let ty = args.iter().find_map(Expr::data_type);
    func_typed("coalesce", args, ty)
}

pub fn row_number() -> Expr {
    func_typed("row_number", vec![], Some(DataType::Int64))
}

pub fn rank() -> Expr {
    func_typed("rank", vec![], Some(DataType::Int64))
}

pub fn dense_rank() -> Expr {
    func_typed("dense_rank", vec![], Some(DataType::Int64))
}

pub fn lag(expr: Expr, offset: i64) -> Expr {
    let ty = expr.data_type();
    func_typed("lag", vec![expr, literal(offset)], ty)
}

pub fn lead(expr: Expr, offset: i64) -> Expr {
    let ty = expr.data_type();
    func_typed("lead", vec![expr, literal(offset)], ty)
}

/// Searched CASE: `CASE WHEN c THEN r ... ELSE e END`.
pub fn case(whens: Vec<(Expr, Expr)>, else_result: Option<Expr>) -> Expr {
    Expr::Case(Arc::new(CaseExpr {
        operand: None,
        whens,
        else_result,
    }))
}

/// Simple CASE: `CASE operand WHEN v THEN r ... END`. Values are coerced
/// against the operand.
pub fn case_value(operand: Expr, whens: Vec<(Expr, Expr)>, else_result: Option<Expr>) -> Expr {
    let whens = whens
        .into_iter()
        .map(|(value, result)| (coerce_against(&operand, value), result))
        .collect();
    Expr::Case(Arc::new(CaseExpr {
        operand: Some(operand),
        whens,
        else_result,
    }))
}

/// `EXISTS (subquery)`.
pub fn exists(subquery: Select) -> Expr {
    Expr::Exists(Arc::new(subquery))
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
///
/// Values on the right-hand side become anonymous bind parameters, typed
/// and named after the column they are compared with.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    // Comparison operators

    /// `= other`; comparing with NULL yields `IS NULL`.
    fn eq(self, other: impl Into<Expr>) -> Expr {
        match other.into() {
            Expr::Null => Expr::IsNull {
                expr: Arc::new(self.into_expr()),
                negated: false,
            },
            other => coerced_binary(self.into_expr(), BinaryOperator::Eq, other),
        }
    }

    /// `<> other`; comparing with NULL yields `IS NOT NULL`.
    fn ne(self, other: impl Into<Expr>) -> Expr {
        match other.into() {
            Expr::Null => Expr::IsNull {
                expr: Arc::new(self.into_expr()),
                negated: true,
            },
            other => coerced_binary(self.into_expr(), BinaryOperator::Ne, other),
        }
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Gt, other.into())
    }

    fn ge(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Gte, other.into())
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Lt, other.into())
    }

    fn le(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Lte, other.into())
    }

    // Logical operators
    fn and(self, other: impl Into<Expr>) -> Expr {
        and_([self.into_expr(), other.into()])
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        or_([self.into_expr(), other.into()])
    }

    fn not(self) -> Expr {
        not_(self.into_expr())
    }

    // Arithmetic operators

    /// `+`, or concatenation when either side is a string.
    fn add(self, other: impl Into<Expr>) -> Expr {
        let (left, right) = coerce_pair(self.into_expr(), other.into());
        let is_string = |e: &Expr| e.data_type().map(|t| t.is_string()).unwrap_or(false);
        let op = if is_string(&left) || is_string(&right) {
            BinaryOperator::Concat
        } else {
            BinaryOperator::Plus
        };
        binary(left, op, right)
    }

    fn sub(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Minus, other.into())
    }

    fn mul(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Mul, other.into())
    }

    fn div(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Div, other.into())
    }

    fn rem(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Mod, other.into())
    }

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOperator::Neg,
            expr: Arc::new(self.into_expr()),
        }
    }

    // String operators
    fn concat(self, other: impl Into<Expr>) -> Expr {
        coerced_binary(self.into_expr(), BinaryOperator::Concat, other.into())
    }

    fn like(self, pattern: impl Into<Expr>) -> Expr {
        like_expr(self.into_expr(), pattern.into(), None, false)
    }

    /// LIKE with ESCAPE clause for matching literal `%` and `_` characters.
    fn like_escape(self, pattern: impl Into<Expr>, escape_char: char) -> Expr {
        like_expr(self.into_expr(), pattern.into(), Some(escape_char), false)
    }

    /// Case-insensitive LIKE; dialects without ILIKE compare lowercased.
    fn ilike(self, pattern: impl Into<Expr>) -> Expr {
        like_expr(self.into_expr(), pattern.into(), None, true)
    }

    // NULL checks
    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Arc::new(self.into_expr()),
            negated: false,
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Arc::new(self.into_expr()),
            negated: true,
        }
    }

    // IN operator
    fn in_list<I, V>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Expr>,
    {
        in_expr(self.into_expr(), values, false)
    }

    fn not_in<I, V>(self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Expr>,
    {
        in_expr(self.into_expr(), values, true)
    }

    fn in_subquery(self, subquery: Select) -> Expr {
        Expr::InSubquery {
            expr: Arc::new(self.into_expr()),
            subquery: Arc::new(subquery),
            negated: false,
        }
    }

    // BETWEEN operator
    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        let expr = self.into_expr();
        let low = coerce_against(&expr, low.into());
        let high = coerce_against(&expr, high.into());
        Expr::Between {
            expr: Arc::new(expr),
            low: Arc::new(low),
            high: Arc::new(high),
            negated: false,
        }
    }

    fn cast(self, data_type: DataType) -> Expr {
        Expr::Cast {
            expr: Arc::new(self.into_expr()),
            data_type,
        }
    }

    /// `expr AS name`.
    fn label(self, name: impl Into<String>) -> Expr {
        label_with(self.into_expr(), Some(name.into()), DEFAULT_ANON_BASE)
    }

    /// Label named at compile time (`anon_1`, ...).
    fn anon_label(self) -> Expr {
        label_with(self.into_expr(), None, DEFAULT_ANON_BASE)
    }

    fn asc(self) -> OrderByItem {
        OrderByItem::asc(self.into_expr())
    }

    fn desc(self) -> OrderByItem {
        OrderByItem::desc(self.into_expr())
    }

    /// Start building a window function with OVER clause.
    fn over(self) -> WindowBuilder {
        WindowBuilder::new(self.into_expr())
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

fn like_expr(expr: Expr, pattern: Expr, escape: Option<char>, case_insensitive: bool) -> Expr {
    let pattern = coerce_against(&expr, pattern);
    Expr::Like {
        expr: Arc::new(expr),
        pattern: Arc::new(pattern),
        escape,
        case_insensitive,
        negated: false,
    }
}

fn in_expr<I, V>(expr: Expr, values: I, negated: bool) -> Expr
where
    I: IntoIterator<Item = V>,
    V: Into<Expr>,
{
    let values = values
        .into_iter()
        .map(|v| coerce_against(&expr, v.into()))
        .collect();
    Expr::In {
        expr: Arc::new(expr),
        values: Arc::new(values),
        negated,
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ColumnRef> for Expr {
    fn from(c: ColumnRef) -> Self {
        Expr::Column(c)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        literal(v)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        literal(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        literal(n)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        literal(f)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        literal(b)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        literal(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        literal(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Expr {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => literal(v),
            None => Expr::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::selectable::TableClause;

    fn users() -> crate::sql::selectable::TableRef {
        TableClause::new("users")
            .column("id", DataType::Int64)
            .column("name", DataType::Varchar(50))
            .into_ref()
    }

    #[test]
    fn test_literal_adopts_column_name_and_type() {
        let t = users();
        let e = t.c("id").unwrap().eq(5);
        let Expr::Binary { right, .. } = e else {
            panic!("expected binary")
        };
        let Expr::Bind(b) = &*right else {
            panic!("expected bind")
        };
        match &b.key {
            BindKey::Anonymous(a) => assert_eq!(a.base, "id"),
            other => panic!("unexpected key {:?}", other),
        }
        assert_eq!(b.data_type, Some(DataType::Int64));
        assert_eq!(b.value, Some(Value::Int(5)));
    }

    #[test]
    fn test_eq_null_is_null() {
        let t = users();
        assert!(matches!(
            t.c("name").unwrap().eq(Value::Null),
            Expr::IsNull { negated: false, .. }
        ));
        assert!(matches!(
            t.c("name").unwrap().ne(None::<i64>),
            Expr::IsNull { negated: true, .. }
        ));
    }

    #[test]
    fn test_add_on_strings_concatenates() {
        let t = users();
        let e = t.c("name").unwrap().add(" jr");
        assert!(matches!(
            e,
            Expr::Binary {
                op: BinaryOperator::Concat,
                ..
            }
        ));
        let e = t.c("id").unwrap().add(1);
        assert!(matches!(
            e,
            Expr::Binary {
                op: BinaryOperator::Plus,
                ..
            }
        ));
    }

    #[test]
    fn test_and_flattens() {
        let t = users();
        let a = t.c("id").unwrap().eq(1);
        let b = t.c("id").unwrap().eq(2);
        let c = t.c("id").unwrap().eq(3);
        let e = and_([a.and(b), c]);
        match e {
            Expr::BooleanList { op, clauses } => {
                assert_eq!(op, BooleanOperator::And);
                assert_eq!(clauses.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_boolean_lists() {
        assert_eq!(and_(Vec::new()), Expr::Boolean(true));
        assert_eq!(or_(Vec::new()), Expr::Boolean(false));
    }

    #[test]
    fn test_not_inverts_comparisons() {
        let t = users();
        let e = t.c("id").unwrap().eq(1).not();
        assert!(matches!(
            e,
            Expr::Binary {
                op: BinaryOperator::Ne,
                ..
            }
        ));
        let e = t.c("id").unwrap().in_list([1, 2]).not();
        assert!(matches!(e, Expr::In { negated: true, .. }));
    }

    #[test]
    fn test_precedence_classes() {
        let t = users();
        let id = t.c("id").unwrap();
        assert_eq!(id.precedence(), ATOM_PRECEDENCE);
        assert_eq!(id.clone().mul(2).precedence(), 8);
        assert_eq!(id.clone().add(2).precedence(), 7);
        assert_eq!(id.clone().eq(2).precedence(), PREDICATE_PRECEDENCE);
        assert_eq!(id.clone().between(1, 9).precedence(), PREDICATE_PRECEDENCE);
        assert_eq!(id.clone().eq(1).and(id.clone().eq(2)).precedence(), 3);
        assert_eq!(id.clone().eq(1).or(id.eq(2)).precedence(), 2);
    }

    #[test]
    fn test_data_type_resolution() {
        let t = users();
        assert_eq!(count_star().data_type(), Some(DataType::Int64));
        assert_eq!(t.c("id").unwrap().eq(1).data_type(), Some(DataType::Bool));
        assert_eq!(
            t.c("id").unwrap().cast(DataType::String).data_type(),
            Some(DataType::String)
        );
        assert_eq!(
            sum(t.c("id").unwrap()).data_type(),
            Some(DataType::Int64)
        );
    }

    #[test]
    fn test_select_items_get_labels() {
        let t = users();
        assert!(matches!(
            t.c("id").unwrap().into_select_item(),
            Expr::Column(_)
        ));
        match count_star().into_select_item() {
            Expr::Label(l) => {
                assert!(l.name.is_none());
                assert_eq!(l.anon.base, "count");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_anon_ids_are_distinct() {
        assert_ne!(AnonName::new("x").id, AnonName::new("x").id);
    }
}
