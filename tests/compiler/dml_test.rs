//! Integration tests for INSERT, UPDATE and DELETE compilation.

#[path = "../common/mod.rs"]
mod common;

use common::validate_sql;
use sqlweave::prelude::*;

fn users() -> TableRef {
    common::users_addresses().table_ref_by_name("users").unwrap()
}

#[test]
fn test_insert_binds_under_column_names() {
    let users = users();
    let stmt = insert(&users).values([("fullname", "Jack Jones"), ("name", "jack")]);

    let compiled = stmt.compile(&Dialect::Ansi).unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO users (name, fullname) VALUES (:name, :fullname)"
    );
    assert_eq!(
        compiled.parameter("name").unwrap().value,
        Some(Value::Text("jack".into()))
    );
    assert_eq!(
        compiled.parameter("name").unwrap().data_type,
        Some(DataType::Varchar(30))
    );
    assert!(compiled.result_columns.is_empty());
}

#[test]
fn test_insert_without_values_binds_every_column() {
    let users = users();
    let compiled = insert(&users).compile(&Dialect::Ansi).unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO users (id, name, fullname) VALUES (:id, :name, :fullname)"
    );
    assert!(compiled.parameters.iter().all(|p| p.value.is_none()));
}

#[test]
fn test_multi_row_insert() {
    let users = users();
    let stmt = insert(&users).multi_values([[("name", "a")], [("name", "b")]]);

    let compiled = stmt.compile(&Dialect::Postgres).unwrap();
    assert_eq!(compiled.sql, "INSERT INTO users (name) VALUES ($1), ($2)");
    assert_eq!(compiled.positional_names, vec!["name_m0", "name_m1"]);
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_insert_from_select() {
    let md = common::users_addresses();
    let users = md.table_ref_by_name("users").unwrap();
    let addresses = md.table_ref_by_name("addresses").unwrap();
    let stmt = insert(&users).from_select(["name"], select([addresses.c("email").unwrap()]));

    let compiled = stmt.compile(&Dialect::Ansi).unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO users (name) SELECT email\nFROM addresses"
    );
}

#[test]
fn test_insert_unknown_column_fails() {
    let users = users();
    let err = insert(&users)
        .values([("nickname", "x")])
        .compile(&Dialect::Ansi)
        .unwrap_err();
    assert!(err.to_string().contains("nickname"), "{}", err);
}

#[test]
fn test_update_with_where() {
    let users = users();
    let stmt = update(&users)
        .values([("name", "ed")])
        .filter(users.c("id").unwrap().eq(5));

    let compiled = stmt.compile(&Dialect::Ansi).unwrap();
    assert_eq!(compiled.sql, "UPDATE users SET name=:name\nWHERE id = :id_1");
    assert_eq!(compiled.parameter("id_1").unwrap().value, Some(Value::Int(5)));
}

#[test]
fn test_update_with_expression_value() {
    let users = users();
    let stmt = update(&users).values([(
        "fullname",
        users.c("name").unwrap().concat(" (inactive)"),
    )]);

    let compiled = stmt.compile(&Dialect::Postgres).unwrap();
    assert_eq!(compiled.sql, "UPDATE users SET fullname=name || $1");
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_delete_with_where() {
    let users = users();
    let stmt = delete(&users).filter(users.c("name").unwrap().eq("ed"));

    let compiled = stmt.compile(&Dialect::Ansi).unwrap();
    assert_eq!(compiled.sql, "DELETE FROM users\nWHERE name = :name_1");

    let compiled = stmt.compile(&Dialect::Sqlite).unwrap();
    assert_eq!(compiled.sql, "DELETE FROM users\nWHERE name = ?");
    validate_sql(&compiled.sql, Dialect::Sqlite).unwrap();
}

#[test]
fn test_returning_on_postgres() {
    let users = users();
    let stmt = insert(&users)
        .values([("name", "jack")])
        .returning([users.c("id").unwrap()]);

    let compiled = stmt.compile(&Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO users (name) VALUES ($1)\nRETURNING id"
    );
    assert_eq!(compiled.result_columns, vec!["id"]);
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_returning_unsupported_on_mysql() {
    let users = users();
    let stmt = delete(&users)
        .filter(users.c("id").unwrap().eq(1))
        .returning([users.c("id").unwrap()]);

    let err = stmt.compile(&Dialect::MySql).unwrap_err();
    assert!(err.is_capability());
    assert!(err.to_string().contains("RETURNING"), "{}", err);
}

#[test]
fn test_statement_enum_dispatch() {
    let users = users();
    let stmt: Statement = update(&users).values([("name", "x")]).into();
    let compiled = compile(&stmt, &Dialect::MySql).unwrap();
    assert_eq!(compiled.sql, "UPDATE users SET name=?");
    validate_sql(&compiled.sql, Dialect::MySql).unwrap();
}
