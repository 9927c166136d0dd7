//! Shared fixtures for integration tests.

#![allow(dead_code)]

use sqlparser::dialect::{
    DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;
use sqlweave::prelude::*;

/// Parse `sql` with sqlparser's matching dialect.
pub fn validate_sql(sql: &str, dialect: Dialect) -> std::result::Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Ansi => Box::new(GenericDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
    };
    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {:?}: {}\nSQL: {}", dialect, e, sql))
}

/// users(id, name, fullname) and addresses(id, user_id -> users.id, email).
pub fn users_addresses() -> MetaData {
    let mut md = MetaData::new();
    md.add_table(
        Table::new("users")
            .column(Column::new("id", DataType::Int64).primary_key())
            .column(Column::new("name", DataType::Varchar(30)).not_null())
            .column(Column::new("fullname", DataType::String)),
    )
    .unwrap();
    md.add_table(
        Table::new("addresses")
            .column(Column::new("id", DataType::Int64).primary_key())
            .column(Column::untyped("user_id").not_null().references("users.id"))
            .column(Column::new("email", DataType::String).not_null()),
    )
    .unwrap();
    md
}

/// The node/element cycle. `name_element_fk` names element's key.
pub fn node_element(name_element_fk: bool) -> MetaData {
    let mut md = MetaData::new();
    md.add_table(
        Table::new("node")
            .column(Column::new("node_id", DataType::Int32).primary_key())
            .column(Column::untyped("primary_element").references("element.element_id")),
    )
    .unwrap();
    let mut parent = ForeignKey::new("node.node_id");
    if name_element_fk {
        parent = parent.name("fk_element_parent_node_id");
    }
    md.add_table(
        Table::new("element")
            .column(Column::new("element_id", DataType::Int32).primary_key())
            .column(Column::untyped("parent_node_id").foreign_key(parent)),
    )
    .unwrap();
    md
}

pub fn render(statements: &[DdlStatement], dialect: Dialect) -> Vec<String> {
    statements.iter().map(|s| s.to_sql(&dialect)).collect()
}
