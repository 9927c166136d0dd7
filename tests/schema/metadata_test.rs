//! Integration tests for table registration, foreign key resolution and
//! constraint naming.

#[path = "../common/mod.rs"]
mod common;

use sqlweave::prelude::*;
use sqlweave::sql::naming::{ConstraintKind, NamingConvention};

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_same_name_returns_existing_table() {
    let mut md = common::users_addresses();
    let first = md.table_id("users").unwrap();
    let again = md
        .add_table(Table::new("users").column(Column::new("id", DataType::Int64).primary_key()))
        .unwrap();
    assert_eq!(first, again);
    assert_eq!(md.len(), 2);
}

#[test]
fn test_same_name_with_different_columns_conflicts() {
    let mut md = common::users_addresses();
    let err = md
        .add_table(Table::new("users").column(Column::new("id", DataType::String)))
        .unwrap_err();
    assert!(err.is_schema_conflict());
    assert!(err.to_string().contains("users"), "{}", err);
}

#[test]
fn test_same_name_with_new_constraint_conflicts() {
    let mut md = common::users_addresses();
    let err = md
        .add_table(
            Table::new("users")
                .column(Column::new("name", DataType::Varchar(30)).not_null())
                .constraint(Constraint::unique(["name"])),
        )
        .unwrap_err();
    assert!(err.is_schema_conflict());
    assert!(err.to_string().contains("(name)"), "{}", err);

    let users = md.table(md.table_id("users").unwrap()).unwrap();
    assert_eq!(users.constraints().len(), 1);
}

#[test]
fn test_same_name_with_new_index_conflicts() {
    let mut md = common::users_addresses();
    let err = md
        .add_table(
            Table::new("users")
                .column(Column::new("fullname", DataType::String))
                .index(Index::new(["fullname"])),
        )
        .unwrap_err();
    assert!(err.is_schema_conflict());
}

#[test]
fn test_identical_redeclaration_is_accepted() {
    let mut md = common::users_addresses();
    let first = md.table_id("addresses").unwrap();
    let again = md
        .add_table(
            Table::new("addresses")
                .column(Column::new("id", DataType::Int64).primary_key())
                .column(Column::untyped("user_id").not_null().references("users.id"))
                .column(Column::new("email", DataType::String).not_null()),
        )
        .unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_schema_is_part_of_the_key() {
    let mut md = common::users_addresses();
    let other = md
        .add_table(
            Table::new("users")
                .schema("archive")
                .column(Column::new("id", DataType::String)),
        )
        .unwrap();
    assert_ne!(Some(other), md.table_id("users"));
    assert_eq!(md.table(other).unwrap().key(), "archive.users");
}

// ============================================================================
// Foreign keys
// ============================================================================

#[test]
fn test_forward_reference_resolves_after_target_is_added() {
    let mut md = MetaData::new();
    let orders = md
        .add_table(
            Table::new("orders")
                .column(Column::new("id", DataType::Int64).primary_key())
                .column(Column::untyped("customer_id").references("customers.id")),
        )
        .unwrap();

    let err = md.column_type(orders, "customer_id").unwrap_err();
    assert!(err.is_unresolved_reference());

    md.add_table(Table::new("customers").column(Column::new("id", DataType::Int32).primary_key()))
        .unwrap();
    assert_eq!(
        md.column_type(orders, "customer_id").unwrap(),
        Some(DataType::Int32)
    );
}

#[test]
fn test_unknown_target_column_is_reported() {
    let mut md = common::users_addresses();
    let id = md
        .add_table(
            Table::new("notes")
                .column(Column::new("id", DataType::Int64).primary_key())
                .column(Column::untyped("user_id").references("users.uid")),
        )
        .unwrap();
    let table = md.table(id).unwrap();
    let (_, fk) = table.foreign_key_constraints().next().unwrap();
    let err = md.resolve_foreign_key(table, fk).unwrap_err();
    assert!(err.is_unresolved_reference());
    assert!(err.to_string().contains("uid"), "{}", err);
}

#[test]
fn test_table_ref_carries_foreign_keys_for_joins() {
    let md = common::users_addresses();
    let addresses = md.table_ref_by_name("addresses").unwrap();
    assert_eq!(addresses.foreign_keys().len(), 1);
    assert_eq!(addresses.foreign_keys()[0].targets, vec!["users.id"]);
    assert_eq!(
        addresses.clause().get_column("user_id").unwrap().data_type,
        Some(DataType::Int64)
    );
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn test_unique_constraint_named_by_convention() {
    let convention =
        NamingConvention::from_map([("uq", "uq_%(table_name)s_%(column_0_name)s")]).unwrap();
    let mut md = MetaData::new().with_naming_convention(convention);
    let id = md
        .add_table(
            Table::new("user")
                .column(Column::new("id", DataType::Int64).primary_key())
                .column(Column::new("name", DataType::Varchar(50)))
                .constraint(Constraint::unique(["name"])),
        )
        .unwrap();

    let table = md.table(id).unwrap();
    let unique = table
        .constraints()
        .iter()
        .find(|c| c.kind() == ConstraintKind::Unique)
        .unwrap();
    let name = md.constraint_name(id, unique, 63).unwrap();
    assert_eq!(name.as_deref(), Some("uq_user_name"));

    // Same input, same name.
    assert_eq!(md.constraint_name(id, unique, 63).unwrap(), name);
}

#[test]
fn test_long_generated_name_truncates_with_hash() {
    let convention =
        NamingConvention::from_map([("uq", "uq_%(table_name)s_%(column_0_name)s")]).unwrap();
    let mut md = MetaData::new().with_naming_convention(convention);
    let id = md
        .add_table(
            Table::new("customer_account_balance_history_snapshots")
                .column(Column::new("reconciliation_reference", DataType::String).unique()),
        )
        .unwrap();
    let full = "uq_customer_account_balance_history_snapshots_reconciliation_reference";
    assert_eq!(full.len(), 70);

    let table = md.table(id).unwrap();
    let unique = &table.constraints()[0];
    let dialect = Dialect::Postgres;
    let name = md
        .constraint_name(id, unique, dialect.max_identifier_length())
        .unwrap()
        .unwrap();

    assert_eq!(name.len(), 63);
    assert_eq!(&name[..59], &full[..59]);
    assert!(name[59..].chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(
        md.constraint_name(id, unique, 63).unwrap().unwrap(),
        name,
        "truncation must be deterministic"
    );
}

#[test]
fn test_explicit_name_too_long_is_an_error() {
    let mut md = MetaData::new();
    let long = "x".repeat(70);
    let id = md
        .add_table(
            Table::new("t")
                .column(Column::new("a", DataType::Int32))
                .constraint(Constraint::unique(["a"]).named(long)),
        )
        .unwrap();
    let table = md.table(id).unwrap();
    let err = md
        .constraint_name(id, &table.constraints()[0], 63)
        .unwrap_err();
    assert!(matches!(err, Error::IdentifierTooLong { .. }));
}

#[test]
fn test_foreign_key_convention_uses_referred_table() {
    let convention = NamingConvention::default().with(
        ConstraintKind::ForeignKey,
        "fk_%(table_name)s_%(column_0_name)s_%(referred_table_name)s",
    );
    let md = common::users_addresses().with_naming_convention(convention);
    let id = md.table_id("addresses").unwrap();
    let table = md.table(id).unwrap();
    let (index, _) = table.foreign_key_constraints().next().unwrap();
    let name = md
        .constraint_name(id, &table.constraints()[index], 63)
        .unwrap();
    assert_eq!(name.as_deref(), Some("fk_addresses_user_id_users"));
}
