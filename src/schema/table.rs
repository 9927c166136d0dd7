//! Tables and columns as declared by calling code.

use super::constraint::{Constraint, ForeignKey, Index};
use crate::sql::selectable::table_key;
use crate::sql::types::{DataType, Value};

/// Default applied by the database itself (`DEFAULT ...` in CREATE TABLE).
#[derive(Debug, Clone, PartialEq)]
pub enum ServerDefault {
    Value(Value),
    /// SQL text such as `CURRENT_TIMESTAMP`, emitted verbatim.
    Text(String),
}

/// A column declaration.
///
/// `unique`, `index` and `references` are shorthand: they become a
/// [`Constraint::Unique`], an [`Index`] or a foreign key constraint when the
/// table is added to a [`MetaData`](super::MetaData).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// `None` takes the type of the referenced column of a foreign key.
    pub data_type: Option<DataType>,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
    pub autoincrement: bool,
    /// Bound by INSERT when no value is given.
    pub default: Option<Value>,
    pub server_default: Option<ServerDefault>,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self::with_type(name, Some(data_type))
    }

    /// A column whose type comes from the column its foreign key references.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::with_type(name, None)
    }

    fn with_type(name: impl Into<String>, data_type: Option<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            unique: false,
            index: false,
            autoincrement: false,
            default: None,
            server_default: None,
            foreign_key: None,
        }
    }

    /// Part of the primary key. Implies NOT NULL.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Render the dialect's identity clause for this column.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn server_default(mut self, value: impl Into<Value>) -> Self {
        self.server_default = Some(ServerDefault::Value(value.into()));
        self
    }

    #[must_use]
    pub fn server_default_text(mut self, sql: impl Into<String>) -> Self {
        self.server_default = Some(ServerDefault::Text(sql.into()));
        self
    }

    /// Foreign key shorthand: `Column::untyped("user_id").references("users.id")`.
    #[must_use]
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey::new(target));
        self
    }

    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_key = Some(fk);
        self
    }

    /// Whether `other` declares the same structure (type, nullability,
    /// primary key). Used when a table name is registered twice.
    pub(crate) fn conflicts_with(&self, other: &Column) -> Option<String> {
        if self.data_type != other.data_type {
            return Some(format!(
                "column '{}' is declared as {} but was defined as {}",
                self.name,
                describe_type(&other.data_type),
                describe_type(&self.data_type),
            ));
        }
        if self.nullable != other.nullable {
            return Some(format!(
                "column '{}' differs in nullability",
                self.name
            ));
        }
        if self.primary_key != other.primary_key {
            return Some(format!(
                "column '{}' differs in primary key membership",
                self.name
            ));
        }
        None
    }
}

fn describe_type(data_type: &Option<DataType>) -> String {
    match data_type {
        Some(t) => t.to_string(),
        None => "untyped".to_string(),
    }
}

/// A table declaration.
///
/// ```ignore
/// let users = Table::new("users")
///     .column(Column::new("id", DataType::Int64).primary_key())
///     .column(Column::new("name", DataType::Varchar(50)).unique())
///     .constraint(Constraint::check("length(name) > 0"));
/// let id = metadata.add_table(users)?;
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    pub(crate) columns: Vec<Column>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: impl Into<Constraint>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// `schema.name`, or `name` without a schema.
    pub fn key(&self) -> String {
        table_key(self.schema.as_deref(), &self.name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns in key order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .find_map(|c| match c {
                Constraint::PrimaryKey { columns, .. } => {
                    Some(columns.iter().map(String::as_str).collect())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Foreign key constraints with their position in [`constraints`](Self::constraints).
    pub fn foreign_key_constraints(
        &self,
    ) -> impl Iterator<Item = (usize, &super::constraint::ForeignKeyConstraint)> {
        self.constraints
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_foreign_key().map(|fk| (i, fk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_implies_not_null() {
        let col = Column::new("id", DataType::Int64).primary_key();
        assert!(col.primary_key);
        assert!(!col.nullable);
    }

    #[test]
    fn test_conflict_reports_type_change() {
        let a = Column::new("id", DataType::Int64);
        let b = Column::new("id", DataType::String);
        let detail = a.conflicts_with(&b).unwrap();
        assert!(detail.contains("'id'"));
        assert!(a.conflicts_with(&a.clone()).is_none());
    }

    #[test]
    fn test_key_includes_schema() {
        assert_eq!(Table::new("users").key(), "users");
        assert_eq!(Table::new("users").schema("app").key(), "app.users");
    }
}
