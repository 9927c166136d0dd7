//! Integration tests for schema-driven DDL generation.

#[path = "../common/mod.rs"]
mod common;

use common::{render, validate_sql};
use sqlweave::config::Settings;
use sqlweave::ddl::{create_index, create_table, drop_index};
use sqlweave::prelude::*;

const CONFIG: &str = r#"
[dialect]
name = "postgresql"
max_identifier_length = 30

[naming_convention]
pk = "pk_%(table_name)s"
fk = "fk_%(table_name)s_%(column_0_name)s_%(referred_table_name)s"
ix = "ix_%(table_name)s_%(column_0_name)s"
"#;

#[test]
fn test_create_all_from_settings() {
    let settings = Settings::from_toml_str(CONFIG).unwrap();
    let dialect = settings.dialect();
    let md = common::users_addresses().with_naming_convention(settings.naming_convention().unwrap());

    let sql = render(&create_all(&md, &dialect).unwrap(), Dialect::Postgres);
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE users (id BIGINT NOT NULL, name VARCHAR(30) NOT NULL, fullname TEXT, \
             CONSTRAINT pk_users PRIMARY KEY (id))",
            "CREATE TABLE addresses (id BIGINT NOT NULL, user_id BIGINT NOT NULL, email TEXT NOT NULL, \
             CONSTRAINT pk_addresses PRIMARY KEY (id), \
             CONSTRAINT fk_addresses_user_id_users FOREIGN KEY (user_id) REFERENCES users (id))",
        ]
    );
    for statement in &sql {
        validate_sql(statement, Dialect::Postgres).unwrap();
    }
}

#[test]
fn test_configured_length_limit_truncates_generated_names() {
    let settings = Settings::from_toml_str(CONFIG).unwrap();
    let dialect = settings.dialect();
    let mut md = MetaData::new().with_naming_convention(settings.naming_convention().unwrap());
    let id = md
        .add_table(
            Table::new("shipment_events")
                .column(Column::new("carrier_tracking_number", DataType::String).index()),
        )
        .unwrap();

    let index = md.table(id).unwrap().indexes()[0].clone();
    let create = create_index(&md, id, &index, &dialect).unwrap();
    assert_eq!(create.name.len(), 30);
    assert!(create.name.starts_with("ix_shipment_events_carrier"));

    // The same name is produced for the matching DROP.
    let drop = drop_index(&md, id, &index, &dialect).unwrap();
    assert_eq!(drop.name, create.name);
}

#[test]
fn test_schema_qualified_tables() {
    let mut md = MetaData::new();
    md.add_table(
        Table::new("accounts")
            .schema("billing")
            .column(Column::new("id", DataType::Int64).primary_key()),
    )
    .unwrap();
    let invoices = md
        .add_table(
            Table::new("invoices")
                .schema("billing")
                .column(Column::new("id", DataType::Int64).primary_key())
                .column(
                    Column::untyped("account_id")
                        .not_null()
                        .references("billing.accounts.id"),
                ),
        )
        .unwrap();

    let sql = create_table(&md, invoices, &Dialect::Postgres)
        .unwrap()
        .to_sql(&Dialect::Postgres);
    assert_eq!(
        sql,
        "CREATE TABLE billing.invoices (id BIGINT NOT NULL, account_id BIGINT NOT NULL, \
         PRIMARY KEY (id), FOREIGN KEY (account_id) REFERENCES billing.accounts (id))"
    );
    validate_sql(&sql, Dialect::Postgres).unwrap();

    let drops = render(&drop_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(drops, vec!["DROP TABLE billing.invoices", "DROP TABLE billing.accounts"]);
}

#[test]
fn test_unique_index_and_referential_actions() {
    let mut md = MetaData::new();
    md.add_table(Table::new("authors").column(Column::new("id", DataType::Int32).primary_key()))
        .unwrap();
    let books = md
        .add_table(
            Table::new("books")
                .column(Column::new("id", DataType::Int32).primary_key())
                .column(Column::new("isbn", DataType::Varchar(13)).not_null())
                .column(
                    Column::untyped("author_id").foreign_key(
                        ForeignKey::new("authors.id")
                            .on_delete(ReferentialAction::SetNull)
                            .on_update(ReferentialAction::Cascade),
                    ),
                )
                .index(Index::new(["isbn"]).named("books_isbn_key").unique()),
        )
        .unwrap();

    let sql = create_table(&md, books, &Dialect::Postgres)
        .unwrap()
        .to_sql(&Dialect::Postgres);
    assert!(
        sql.ends_with(
            "FOREIGN KEY (author_id) REFERENCES authors (id) ON DELETE SET NULL ON UPDATE CASCADE)"
        ),
        "{}",
        sql
    );
    validate_sql(&sql, Dialect::Postgres).unwrap();

    let statements = render(&create_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(
        statements.last().map(String::as_str),
        Some("CREATE UNIQUE INDEX books_isbn_key ON books (isbn)")
    );
    validate_sql(statements.last().unwrap(), Dialect::Postgres).unwrap();
}

#[test]
fn test_untyped_column_without_foreign_key_fails() {
    let mut md = MetaData::new();
    let id = md
        .add_table(Table::new("loose").column(Column::untyped("mystery")))
        .unwrap();
    let err = create_table(&md, id, &Dialect::Ansi).unwrap_err();
    assert!(err.is_compile());
    assert!(err.to_string().contains("mystery"), "{}", err);
}

#[test]
fn test_statements_render_for_every_dialect() {
    let md = common::users_addresses();
    for dialect in [
        Dialect::Ansi,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::TSql,
        Dialect::DuckDb,
    ] {
        let statements = create_all(&md, &dialect).unwrap();
        assert_eq!(statements.len(), 2, "{:?}", dialect);
        let sql = render(&statements, dialect);
        assert!(sql[0].starts_with("CREATE TABLE users ("), "{}", sql[0]);
        assert!(
            sql[1].contains("FOREIGN KEY (user_id) REFERENCES users (id)"),
            "{}",
            sql[1]
        );
    }
}

#[test]
fn test_server_defaults_and_appended_index() {
    let mut md = MetaData::new();
    let events = md
        .add_table(
            Table::new("events")
                .column(Column::new("id", DataType::Int32).primary_key())
                .column(Column::new("stage", DataType::Varchar(10)).server_default("new").not_null())
                .column(
                    Column::new("created_at", DataType::Timestamp)
                        .server_default_text("CURRENT_TIMESTAMP"),
                ),
        )
        .unwrap();
    md.append_index(events, Index::new(["created_at"]).named("ix_events_created"))
        .unwrap();

    let err = md
        .append_index(events, Index::new(["finished_at"]))
        .unwrap_err();
    assert!(matches!(err, Error::NoSuchColumn { .. }), "{:?}", err);

    let sql = render(&create_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE events (id INTEGER NOT NULL, stage VARCHAR(10) DEFAULT 'new' NOT NULL, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, PRIMARY KEY (id))",
            "CREATE INDEX ix_events_created ON events (created_at)",
        ]
    );
    for statement in &sql {
        validate_sql(statement, Dialect::Postgres).unwrap();
    }
}
