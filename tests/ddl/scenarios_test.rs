//! End-to-end schema scenarios: mutually dependent tables, naming
//! conventions and identifier limits, rendered as DDL.

#[path = "../common/mod.rs"]
mod common;

use common::{render, validate_sql};
use sqlweave::prelude::*;

// ============================================================================
// Mutually dependent tables
// ============================================================================

#[test]
fn test_cycle_with_named_key_creates_then_alters() {
    let md = common::node_element(true);
    let sql = render(&create_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);

    assert_eq!(
        sql,
        vec![
            "CREATE TABLE element (element_id INTEGER NOT NULL, parent_node_id INTEGER, \
             PRIMARY KEY (element_id))",
            "CREATE TABLE node (node_id INTEGER NOT NULL, primary_element INTEGER, \
             PRIMARY KEY (node_id), FOREIGN KEY (primary_element) REFERENCES element (element_id))",
            "ALTER TABLE element ADD CONSTRAINT fk_element_parent_node_id \
             FOREIGN KEY (parent_node_id) REFERENCES node (node_id)",
        ]
    );
    for statement in &sql {
        validate_sql(statement, Dialect::Postgres).unwrap();
    }
}

#[test]
fn test_cycle_with_named_key_drops_constraint_first() {
    let md = common::node_element(true);
    let sql = render(&drop_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);

    assert_eq!(
        sql,
        vec![
            "ALTER TABLE element DROP CONSTRAINT fk_element_parent_node_id",
            "DROP TABLE node",
            "DROP TABLE element",
        ]
    );
    for statement in &sql {
        validate_sql(statement, Dialect::Postgres).unwrap();
    }
}

#[test]
fn test_cycle_without_names_cannot_be_dropped() {
    let md = common::node_element(false);
    let err = drop_all(&md, &Dialect::Postgres).unwrap_err();
    match err {
        Error::CircularDependency { tables } => assert_eq!(tables, vec!["element", "node"]),
        other => panic!("expected a circular dependency, got {:?}", other),
    }
}

#[test]
fn test_cycle_without_names_still_creates() {
    // CREATE only needs the ALTER, which does not need a name.
    let md = common::node_element(false);
    let sql = render(&create_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(sql.len(), 3);
    assert_eq!(
        sql[2],
        "ALTER TABLE element ADD FOREIGN KEY (parent_node_id) REFERENCES node (node_id)"
    );
}

#[test]
fn test_cycle_on_sqlite_keeps_keys_inline() {
    let md = common::node_element(false);
    let sql = render(&create_all(&md, &Dialect::Sqlite).unwrap(), Dialect::Sqlite);
    assert_eq!(sql.len(), 2);
    assert!(sql.iter().all(|s| s.starts_with("CREATE TABLE")));
    assert!(
        sql[0].contains("FOREIGN KEY (parent_node_id) REFERENCES node (node_id)"),
        "{}",
        sql[0]
    );

    let drops = render(&drop_all(&md, &Dialect::Sqlite).unwrap(), Dialect::Sqlite);
    assert_eq!(drops, vec!["DROP TABLE node", "DROP TABLE element"]);
}

#[test]
fn test_use_alter_defers_without_a_cycle() {
    let mut md = MetaData::new();
    md.add_table(Table::new("regions").column(Column::new("id", DataType::Int32).primary_key()))
        .unwrap();
    md.add_table(
        Table::new("stores")
            .column(Column::new("id", DataType::Int32).primary_key())
            .column(
                Column::untyped("region_id").foreign_key(
                    ForeignKey::new("regions.id")
                        .name("fk_stores_region")
                        .use_alter(),
                ),
            ),
    )
    .unwrap();

    let sql = render(&create_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE regions (id INTEGER NOT NULL, PRIMARY KEY (id))",
            "CREATE TABLE stores (id INTEGER NOT NULL, region_id INTEGER, PRIMARY KEY (id))",
            "ALTER TABLE stores ADD CONSTRAINT fk_stores_region \
             FOREIGN KEY (region_id) REFERENCES regions (id)",
        ]
    );
}

#[test]
fn test_use_alter_declared_before_its_target() {
    let mut md = MetaData::new();
    md.add_table(
        Table::new("stores")
            .column(Column::new("id", DataType::Int32).primary_key())
            .column(Column::untyped("region_id").foreign_key(ForeignKey::new("regions.id").use_alter())),
    )
    .unwrap();
    md.add_table(Table::new("regions").column(Column::new("id", DataType::Int32).primary_key()))
        .unwrap();

    let creates = render(&create_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(
        creates,
        vec![
            "CREATE TABLE regions (id INTEGER NOT NULL, PRIMARY KEY (id))",
            "CREATE TABLE stores (id INTEGER NOT NULL, region_id INTEGER, PRIMARY KEY (id))",
            "ALTER TABLE stores ADD FOREIGN KEY (region_id) REFERENCES regions (id)",
        ]
    );

    let drops = render(&drop_all(&md, &Dialect::Postgres).unwrap(), Dialect::Postgres);
    assert_eq!(drops, vec!["DROP TABLE stores", "DROP TABLE regions"]);
}

// ============================================================================
// Naming conventions
// ============================================================================

#[test]
fn test_convention_names_unique_constraint_in_create() {
    let convention =
        NamingConvention::from_map([("uq", "uq_%(table_name)s_%(column_0_name)s")]).unwrap();
    let mut md = MetaData::new().with_naming_convention(convention);
    let id = md
        .add_table(
            Table::new("user")
                .column(Column::new("id", DataType::Int32).primary_key())
                .column(Column::new("name", DataType::Varchar(50)).unique()),
        )
        .unwrap();

    let sql = sqlweave::ddl::create_table(&md, id, &Dialect::Postgres)
        .unwrap()
        .to_sql(&Dialect::Postgres);
    assert_eq!(
        sql,
        "CREATE TABLE \"user\" (id INTEGER NOT NULL, name VARCHAR(50), \
         PRIMARY KEY (id), CONSTRAINT uq_user_name UNIQUE (name))"
    );
    validate_sql(&sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_long_convention_name_is_truncated_in_create() {
    let convention =
        NamingConvention::from_map([("uq", "uq_%(table_name)s_%(column_0_name)s")]).unwrap();
    let mut md = MetaData::new().with_naming_convention(convention);
    let id = md
        .add_table(
            Table::new("customer_account_balance_history_snapshots")
                .column(Column::new("reconciliation_reference", DataType::String).unique()),
        )
        .unwrap();

    let create = sqlweave::ddl::create_table(&md, id, &Dialect::Postgres).unwrap();
    let name = create.constraints[0].name().unwrap();
    assert_eq!(name.len(), 63);
    assert!(name.starts_with("uq_customer_account_balance_history_snapshots_reconcil"));

    let again = sqlweave::ddl::create_table(&md, id, &Dialect::Postgres).unwrap();
    assert_eq!(again.constraints[0].name(), Some(name));
}
