//! Semantic value types and literal values.
//!
//! [`DataType`] is the type a column is declared with and the type an
//! expression evaluates to. The compiler uses it to coerce bound
//! parameters, and dialects map it to a DDL type name through
//! [`SqlDialect::emit_data_type`](super::dialect::SqlDialect::emit_data_type).
//!
//! [`Value`] is a scalar destined to become a bound parameter (or, in DDL,
//! an inline literal).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic data type of a column or expression.
///
/// # Examples
///
/// ```ignore
/// use sqlweave::sql::types::DataType;
///
/// let parsed = DataType::parse("decimal(10,2)").unwrap();
/// assert_eq!(parsed, DataType::Decimal(10, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean type.
    Bool,

    /// 16-bit signed integer (SMALLINT).
    Int16,

    /// 32-bit signed integer (INT/INTEGER).
    Int32,

    /// 64-bit signed integer (BIGINT).
    Int64,

    /// 32-bit floating point (REAL).
    Float32,

    /// 64-bit floating point (DOUBLE PRECISION).
    Float64,

    /// Fixed-precision decimal: precision, scale.
    Decimal(u8, u8),

    /// Unbounded string (TEXT).
    String,

    /// Fixed-length character string.
    Char(u16),

    /// Variable-length character string with maximum length.
    Varchar(u16),

    /// Date without time.
    Date,

    /// Time without date or timezone.
    Time,

    /// Timestamp without timezone.
    Timestamp,

    /// Timestamp with timezone.
    TimestampTz,

    /// Binary data.
    Binary,

    /// JSON document.
    Json,

    /// UUID/GUID.
    Uuid,
}

impl DataType {
    /// Parse a SQL type name such as `bigint`, `varchar(255)` or
    /// `numeric(10, 2)`. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();

        if let Some(inner) = extract_parens(&s, "decimal").or_else(|| extract_parens(&s, "numeric"))
        {
            return parse_decimal_params(&inner);
        }

        if let Some(inner) = extract_parens(&s, "varchar")
            .or_else(|| extract_parens(&s, "character varying"))
            .or_else(|| extract_parens(&s, "nvarchar"))
        {
            return parse_length_param(&inner).map(DataType::Varchar);
        }

        if let Some(inner) = extract_parens(&s, "char")
            .or_else(|| extract_parens(&s, "character"))
            .or_else(|| extract_parens(&s, "nchar"))
        {
            return parse_length_param(&inner).map(DataType::Char);
        }

        match s.as_str() {
            "bool" | "boolean" | "bit" => Some(DataType::Bool),
            "smallint" | "int2" => Some(DataType::Int16),
            "int" | "integer" | "int4" => Some(DataType::Int32),
            "bigint" | "int8" => Some(DataType::Int64),
            "real" | "float4" => Some(DataType::Float32),
            "double" | "float8" | "double precision" | "float" => Some(DataType::Float64),
            "decimal" | "numeric" => Some(DataType::Decimal(18, 2)),
            "text" | "string" | "clob" | "varchar" => Some(DataType::String),
            "date" => Some(DataType::Date),
            "time" => Some(DataType::Time),
            "timestamp" | "datetime" => Some(DataType::Timestamp),
            "timestamptz" | "timestamp with time zone" => Some(DataType::TimestampTz),
            "binary" | "blob" | "bytea" | "varbinary" => Some(DataType::Binary),
            "json" | "jsonb" => Some(DataType::Json),
            "uuid" | "uniqueidentifier" => Some(DataType::Uuid),
            _ => None,
        }
    }

    /// Returns true if this is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Int16 | DataType::Int32 | DataType::Int64)
    }

    /// Returns true if this is a string/text type.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::String | DataType::Char(_) | DataType::Varchar(_)
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "BOOLEAN"),
            DataType::Int16 => write!(f, "SMALLINT"),
            DataType::Int32 => write!(f, "INTEGER"),
            DataType::Int64 => write!(f, "BIGINT"),
            DataType::Float32 => write!(f, "REAL"),
            DataType::Float64 => write!(f, "DOUBLE PRECISION"),
            DataType::Decimal(p, s) => write!(f, "DECIMAL({}, {})", p, s),
            DataType::String => write!(f, "TEXT"),
            DataType::Char(n) => write!(f, "CHAR({})", n),
            DataType::Varchar(n) => write!(f, "VARCHAR({})", n),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::TimestampTz => write!(f, "TIMESTAMP WITH TIME ZONE"),
            DataType::Binary => write!(f, "BINARY"),
            DataType::Json => write!(f, "JSON"),
            DataType::Uuid => write!(f, "UUID"),
        }
    }
}

fn extract_parens(s: &str, prefix: &str) -> Option<String> {
    let rest = s.strip_prefix(prefix)?.trim();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.to_string())
}

fn parse_decimal_params(inner: &str) -> Option<DataType> {
    let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    if parts.len() != 2 {
        return None;
    }

    let precision: u8 = parts[0].parse().ok()?;
    let scale: u8 = parts[1].parse().ok()?;

    Some(DataType::Decimal(precision, scale))
}

fn parse_length_param(inner: &str) -> Option<u16> {
    let inner = inner.trim();
    if inner.eq_ignore_ascii_case("max") {
        return Some(u16::MAX);
    }
    inner.parse().ok()
}

/// A scalar value carried by a bound parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// The type a bare value implies when nothing else constrains it.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int64),
            Value::Float(_) => Some(DataType::Float64),
            Value::Text(_) => Some(DataType::String),
            Value::Bytes(_) => Some(DataType::Binary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_types() {
        assert_eq!(DataType::parse("BOOLEAN"), Some(DataType::Bool));
        assert_eq!(DataType::parse("smallint"), Some(DataType::Int16));
        assert_eq!(DataType::parse("integer"), Some(DataType::Int32));
        assert_eq!(DataType::parse("int8"), Some(DataType::Int64));
        assert_eq!(DataType::parse("double precision"), Some(DataType::Float64));
        assert_eq!(DataType::parse("timestamptz"), Some(DataType::TimestampTz));
        assert_eq!(DataType::parse("bytea"), Some(DataType::Binary));
    }

    #[test]
    fn test_parse_parameterized_types() {
        assert_eq!(DataType::parse("NUMERIC(38,0)"), Some(DataType::Decimal(38, 0)));
        assert_eq!(DataType::parse("decimal(18, 4)"), Some(DataType::Decimal(18, 4)));
        assert_eq!(DataType::parse("varchar(255)"), Some(DataType::Varchar(255)));
        assert_eq!(DataType::parse("nvarchar(max)"), Some(DataType::Varchar(u16::MAX)));
        assert_eq!(DataType::parse("char(1)"), Some(DataType::Char(1)));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(DataType::parse("unknown_type"), None);
        assert_eq!(DataType::parse("decimal(abc)"), None);
        assert_eq!(DataType::parse("varchar()"), None);
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from(5).data_type(), Some(DataType::Int64));
        assert_eq!(Value::from("x").data_type(), Some(DataType::String));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::Null.data_type(), None);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::Int(1), Value::Text("a".into()), Value::Null])
            .unwrap();
        assert_eq!(json, r#"[1,"a",null]"#);
    }
}
