//! Error types for schema declaration, construction and compilation.
//!
//! Every error is raised where it is detected and is meant to be fixed in
//! the calling code's declarations; nothing here is transient.

use thiserror::Error;

/// Result type for sqlweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while declaring schema, building expressions or compiling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A table name was registered again with a different structure.
    #[error("table '{table}' is already defined in this MetaData with a different structure: {detail}")]
    SchemaConflict { table: String, detail: String },

    /// A foreign key target string could not be resolved.
    #[error("foreign key on table '{table}' references '{target}', which could not be resolved: {reason}")]
    UnresolvedReference {
        table: String,
        target: String,
        reason: String,
    },

    /// Join inference found no foreign key between the two sides.
    #[error("can't find any foreign key relationships between '{left}' and '{right}'")]
    NoJoinCondition { left: String, right: String },

    /// Join inference found more than one foreign key between the two sides.
    #[error(
        "can't determine join between '{left}' and '{right}'; tables have more than one foreign key \
         constraint relationship between them ({}). Specify the ON clause explicitly",
        .constraints.join(", ")
    )]
    AmbiguousJoin {
        left: String,
        right: String,
        constraints: Vec<String>,
    },

    /// A foreign key cycle cannot be broken for DROP because constraints lack names.
    #[error(
        "can't sort tables for DROP; an unresolvable foreign key dependency exists between tables: {}. \
         Name the foreign key constraints involved in the cycle so they can be dropped with DROP CONSTRAINT",
        .tables.join(", ")
    )]
    CircularDependency { tables: Vec<String> },

    /// The target dialect lacks a construct the statement needs.
    #[error("dialect '{dialect}' does not support {feature}")]
    Unsupported { dialect: String, feature: String },

    /// A malformed or incomplete tree was presented to the compiler.
    #[error("compile error: {0}")]
    Compile(String),

    /// An explicitly given identifier is longer than the dialect allows.
    #[error("identifier '{name}' exceeds maximum length of {max} characters")]
    IdentifierTooLong { name: String, max: usize },

    /// No table is registered under this name.
    #[error("no such table: '{0}'")]
    NoSuchTable(String),

    /// The named column does not exist on the table or alias.
    #[error("no column named '{column}' on '{owner}'")]
    NoSuchColumn { owner: String, column: String },

    /// A construction call received arguments that cannot work together.
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl Error {
    /// Create a compile error from a message.
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create a capability error for a dialect.
    pub fn unsupported(dialect: &str, feature: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect: dialect.to_string(),
            feature: feature.into(),
        }
    }

    /// Create an argument error from a message.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub fn is_schema_conflict(&self) -> bool {
        matches!(self, Self::SchemaConflict { .. })
    }

    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }

    /// True for both the ambiguous and the missing join cases.
    pub fn is_join_error(&self) -> bool {
        matches!(self, Self::NoJoinCondition { .. } | Self::AmbiguousJoin { .. })
    }

    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_) | Self::IdentifierTooLong { .. })
    }
}
