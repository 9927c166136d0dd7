//! Integration tests for SELECT compilation against schema-built tables.

#[path = "../common/mod.rs"]
mod common;

use common::validate_sql;
use sqlweave::prelude::*;
use sqlweave::sql::selectable::FromItem;

fn tables() -> (TableRef, TableRef) {
    let md = common::users_addresses();
    (
        md.table_ref_by_name("users").unwrap(),
        md.table_ref_by_name("addresses").unwrap(),
    )
}

// ============================================================================
// Joins
// ============================================================================

#[test]
fn test_join_inferred_from_foreign_key() {
    let (users, addresses) = tables();
    let query = select([users.c("name").unwrap(), addresses.c("email").unwrap()])
        .join(addresses.clone())
        .unwrap();

    let compiled = query.compile(&Dialect::Ansi).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT users.name, addresses.email\nFROM users JOIN addresses ON users.id = addresses.user_id"
    );
    assert!(compiled.parameters.is_empty());
}

#[test]
fn test_inferred_join_matches_explicit_on() {
    let (users, addresses) = tables();
    let columns = [users.c("name").unwrap(), addresses.c("email").unwrap()];

    let inferred = select(columns.clone()).join(addresses.clone()).unwrap();
    let explicit = select(columns)
        .join_on(
            addresses.clone(),
            users.c("id").unwrap().eq(addresses.c("user_id").unwrap()),
        )
        .unwrap();

    assert_eq!(
        inferred.compile(&Dialect::Postgres).unwrap().sql,
        explicit.compile(&Dialect::Postgres).unwrap().sql
    );
}

#[test]
fn test_outer_join_from_explicit_left_side() {
    let (users, addresses) = tables();
    let query = select([users.c("name").unwrap()])
        .select_from(users.clone())
        .outer_join(addresses.clone())
        .unwrap()
        .filter(addresses.c("email").unwrap().is_null());

    insta::assert_snapshot!(query.compile(&Dialect::Ansi).unwrap().sql, @r"
    SELECT users.name
    FROM users LEFT OUTER JOIN addresses ON users.id = addresses.user_id
    WHERE addresses.email IS NULL
    ");
}

#[test]
fn test_join_without_foreign_key_fails() {
    let (users, _) = tables();
    let tags = TableClause::new("tags")
        .column("label", DataType::String)
        .into_ref();
    let err = select([users.c("name").unwrap()]).join(tags).unwrap_err();
    assert!(err.is_join_error());
    assert!(matches!(err, Error::NoJoinCondition { .. }));
}

#[test]
fn test_join_with_two_foreign_keys_is_ambiguous() {
    let (users, _) = tables();
    let transfers = TableClause::new("transfers")
        .primary_key_column("id", DataType::Int64)
        .column("sender_id", DataType::Int64)
        .column("receiver_id", DataType::Int64)
        .foreign_key(["sender_id"], ["users.id"])
        .foreign_key(["receiver_id"], ["users.id"])
        .into_ref();

    let err = select([users.c("name").unwrap()])
        .join(transfers)
        .unwrap_err();
    match err {
        Error::AmbiguousJoin { constraints, .. } => assert_eq!(constraints.len(), 2),
        other => panic!("expected an ambiguous join, got {:?}", other),
    }
}

// ============================================================================
// Labels and binds
// ============================================================================

#[test]
fn test_string_addition_gets_anonymous_label() {
    let people = TableClause::new("people")
        .column("firstname", DataType::String)
        .column("lastname", DataType::String)
        .into_ref();
    let full_name = people
        .c("firstname")
        .unwrap()
        .add(" ")
        .add(people.c("lastname").unwrap())
        .anon_label();

    let compiled = select([full_name]).compile(&Dialect::Ansi).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT firstname || :firstname_1 || lastname AS anon_1\nFROM people"
    );
    assert_eq!(compiled.result_columns, vec!["anon_1"]);
    assert_eq!(
        compiled.parameter("firstname_1").unwrap().value,
        Some(Value::Text(" ".into()))
    );
}

#[test]
fn test_positional_parameters_follow_render_order() {
    let (users, _) = tables();
    let query = select([users.c("id").unwrap()])
        .filter(users.c("name").unwrap().eq("bob"))
        .filter(users.c("id").unwrap().gt(3));

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT id\nFROM users\nWHERE name = $1 AND id > $2"
    );
    assert!(compiled.is_positional());
    assert_eq!(compiled.positional_names, vec!["name_1", "id_1"]);
    assert_eq!(
        compiled.positional_values(),
        vec![Some(&Value::Text("bob".into())), Some(&Value::Int(3))]
    );
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_paramstyle_override() {
    let (users, _) = tables();
    let query = select([users.c("id").unwrap()]).filter(users.c("id").unwrap().eq(1));
    let dialect = ConfiguredDialect::new(Dialect::Postgres).with_param_style(ParamStyle::Named);
    let compiled = query.compile(&dialect).unwrap();
    assert!(compiled.sql.ends_with("WHERE id = :id_1"), "{}", compiled.sql);
    assert!(!compiled.is_positional());
}

// ============================================================================
// Subqueries
// ============================================================================

#[test]
fn test_anonymous_subquery_in_from() {
    let (users, _) = tables();
    let sub = select([users.c("id").unwrap(), users.c("name").unwrap()])
        .filter(users.c("id").unwrap().gt(5))
        .subquery();
    let query = select([sub.c("name").unwrap()]);

    insta::assert_snapshot!(query.compile(&Dialect::Ansi).unwrap().sql, @r"
    SELECT name
    FROM (SELECT id, name
    FROM users
    WHERE id > :id_1) AS anon_1
    ");
}

#[test]
fn test_bare_select_in_from_is_wrapped() {
    let (users, _) = tables();
    let inner = select([users.c("id").unwrap()]);
    let item: FromItem = inner.into();
    let query = select([count_star()]).select_from(item);

    let sql = query.compile(&Dialect::Ansi).unwrap().sql;
    assert!(sql.contains("FROM (SELECT id\nFROM users) AS anon_1"), "{}", sql);
}

#[test]
fn test_scalar_subquery_correlates_to_enclosing_table() {
    let (users, addresses) = tables();
    let address_count = select([count(addresses.c("id").unwrap())])
        .filter(addresses.c("user_id").unwrap().eq(users.c("id").unwrap()))
        .scalar_subquery()
        .label("address_count");
    let query = select([users.c("name").unwrap(), address_count]);

    let compiled = query.compile(&Dialect::Ansi).unwrap();
    let sql = &compiled.sql;
    assert!(sql.contains("\nFROM addresses\nWHERE user_id = users.id)"), "{}", sql);
    assert!(sql.ends_with(" AS address_count\nFROM users"), "{}", sql);
    assert!(!sql.contains("FROM addresses, users"), "{}", sql);
    assert_eq!(compiled.result_columns, vec!["name", "address_count"]);
}

#[test]
fn test_exists_subquery() {
    let (users, addresses) = tables();
    let has_address = select([addresses.c("id").unwrap()])
        .filter(addresses.c("user_id").unwrap().eq(users.c("id").unwrap()))
        .exists();
    let query = select([users.c("name").unwrap()]).filter(has_address);

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert!(
        compiled.sql.ends_with("WHERE EXISTS (SELECT id\nFROM addresses\nWHERE user_id = users.id)"),
        "{}",
        compiled.sql
    );
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_scalar_subquery_over_the_same_table_keeps_its_from() {
    let (users, _) = tables();
    let newest = select([max(users.c("id").unwrap())]).scalar_subquery();
    let query = select([users.c("name").unwrap()]).filter(users.c("id").unwrap().eq(newest));

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert!(
        compiled
            .sql
            .starts_with("SELECT name\nFROM users\nWHERE id = (SELECT MAX(users.id)"),
        "{}",
        compiled.sql
    );
    assert!(compiled.sql.ends_with("\nFROM users)"), "{}", compiled.sql);
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_in_subquery_over_the_same_table_keeps_its_from() {
    let (users, _) = tables();
    let query = select([users.c("name").unwrap()])
        .filter(users.c("id").unwrap().in_subquery(select([users.c("id").unwrap()])));

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT name\nFROM users\nWHERE id IN (SELECT users.id\nFROM users)"
    );
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_select_from_survives_correlation() {
    let (users, addresses) = tables();
    let owners = select([addresses.c("user_id").unwrap()])
        .select_from(users.clone())
        .filter(addresses.c("user_id").unwrap().eq(users.c("id").unwrap()));
    let query = select([users.c("name").unwrap()])
        .filter(users.c("id").unwrap().in_subquery(owners));

    let sql = query.compile(&Dialect::Ansi).unwrap().sql;
    assert!(sql.contains("(SELECT addresses.user_id\nFROM users, addresses\n"), "{}", sql);
}

// ============================================================================
// Common table expressions
// ============================================================================

#[test]
fn test_cte_is_hoisted_and_binds_follow_text_order() {
    let (users, _) = tables();
    let bobs = select([users.c("id").unwrap(), users.c("name").unwrap()])
        .filter(users.c("name").unwrap().eq("bob"))
        .cte("bobs");
    let query = select([users.c("name").unwrap()])
        .filter(users.c("id").unwrap().gt(3))
        .filter(users.c("id").unwrap().in_subquery(select([bobs.c("id").unwrap()])));

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        "WITH bobs AS (SELECT id, name\nFROM users\nWHERE name = $1)\n\
         SELECT name\nFROM users\nWHERE id > $2 AND id IN (SELECT id\nFROM bobs)"
    );
    assert_eq!(compiled.positional_names, vec!["name_1", "id_1"]);
    assert_eq!(
        compiled.positional_values(),
        vec![Some(&Value::Text("bob".into())), Some(&Value::Int(3))]
    );
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_cte_referenced_twice_is_declared_once() {
    let (users, _) = tables();
    let bobs = select([users.c("id").unwrap(), users.c("name").unwrap()])
        .filter(users.c("name").unwrap().eq("bob"))
        .cte("bobs");
    let query = select([bobs.c("name").unwrap()])
        .filter(bobs.c("id").unwrap().in_subquery(select([bobs.c("id").unwrap()])));

    let compiled = query.compile(&Dialect::Sqlite).unwrap();
    assert_eq!(compiled.sql.matches("bobs AS (").count(), 1, "{}", compiled.sql);
    assert!(compiled.sql.starts_with("WITH bobs AS ("), "{}", compiled.sql);
    assert_eq!(compiled.positional_names, vec!["name_1"]);
    validate_sql(&compiled.sql, Dialect::Sqlite).unwrap();
}

fn parts_explosion() -> Select {
    let parts = TableClause::new("parts")
        .column("assembly", DataType::String)
        .column("component", DataType::String)
        .into_ref();
    let included = select([parts.c("component").unwrap(), parts.c("assembly").unwrap()])
        .filter(parts.c("assembly").unwrap().eq("engine"))
        .cte("included_parts")
        .recursive()
        .unwrap();
    let p = parts.alias("p");
    let member = select([p.c("component").unwrap(), p.c("assembly").unwrap()])
        .filter(p.c("assembly").unwrap().eq(included.c("component").unwrap()));
    let included = included.union_all(member).unwrap();
    select([included.c("component").unwrap()])
}

#[test]
fn test_recursive_cte_references_itself() {
    let compiled = parts_explosion().compile(&Dialect::Postgres).unwrap();

    insta::assert_snapshot!(compiled.sql, @r"
    WITH RECURSIVE included_parts(component, assembly) AS (SELECT component, assembly
    FROM parts
    WHERE assembly = $1
    UNION ALL
    SELECT p.component, p.assembly
    FROM parts AS p, included_parts
    WHERE p.assembly = included_parts.component)
    SELECT component
    FROM included_parts
    ");
    assert_eq!(compiled.positional_names, vec!["assembly_1"]);
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_tsql_omits_the_recursive_keyword() {
    let sql = parts_explosion().compile(&Dialect::TSql).unwrap().sql;
    assert!(sql.starts_with("WITH included_parts(component, assembly) AS ("), "{}", sql);
    assert!(!sql.contains("RECURSIVE"), "{}", sql);
}

#[test]
fn test_two_ctes_with_one_name_conflict() {
    let (users, addresses) = tables();
    let first = select([users.c("id").unwrap()]).cte("ids");
    let second = select([addresses.c("id").unwrap()]).cte("ids");
    let query = select([first.c("id").unwrap(), second.c("id").unwrap()]);

    let err = query.compile(&Dialect::Ansi).unwrap_err();
    assert!(matches!(err, Error::Compile(_)), "{:?}", err);
    assert!(err.to_string().contains("'ids'"), "{}", err);
}

#[test]
fn test_only_ctes_can_be_recursive() {
    let (users, _) = tables();
    let err = users.alias("u").recursive().unwrap_err();
    assert!(matches!(err, Error::Argument(_)), "{:?}", err);
}

// ============================================================================
// Compound selects and pagination
// ============================================================================

#[test]
fn test_union_all_with_limit() {
    let (users, _) = tables();
    let query = select([users.c("id").unwrap()])
        .filter(users.c("id").unwrap().lt(10))
        .union_all(select([users.c("id").unwrap()]).filter(users.c("id").unwrap().gt(100)))
        .unwrap()
        .limit(5);

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert!(compiled.sql.contains("\nUNION ALL\n"), "{}", compiled.sql);
    assert_eq!(compiled.parameters.len(), 2);
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_full_outer_join_unsupported_on_mysql() {
    let (users, addresses) = tables();
    let query = select([users.c("name").unwrap()])
        .full_join(addresses)
        .unwrap();
    let err = query.compile(&Dialect::MySql).unwrap_err();
    assert!(err.is_capability());
}

#[test]
fn test_group_by_with_having_validates() {
    let (users, addresses) = tables();
    let query = select([users.c("name").unwrap(), count(addresses.c("id").unwrap())])
        .join(addresses.clone())
        .unwrap()
        .group_by([users.c("name").unwrap()])
        .having(count(addresses.c("id").unwrap()).gt(1))
        .order_by([users.c("name").unwrap().desc()]);

    for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite] {
        let compiled = query.compile(&dialect).unwrap();
        validate_sql(&compiled.sql, dialect).unwrap();
    }
}

// ============================================================================
// Ordering and window functions
// ============================================================================

#[test]
fn test_nulls_ordering_depends_on_dialect() {
    let (users, _) = tables();
    let query = select([users.c("fullname").unwrap()])
        .order_by([users.c("fullname").unwrap().desc().nulls_last()]);

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT fullname\nFROM users\nORDER BY fullname DESC NULLS LAST"
    );
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();

    let err = query.compile(&Dialect::MySql).unwrap_err();
    assert!(err.is_capability());
}

#[test]
fn test_running_total_over_rolling_frame() {
    use sqlweave::expr::WindowFrame;

    let ledger = TableClause::new("ledger")
        .primary_key_column("id", DataType::Int64)
        .column("account", DataType::String)
        .column("amount", DataType::Int64)
        .into_ref();
    let running = sum(ledger.c("amount").unwrap())
        .over()
        .partition_by([ledger.c("account").unwrap()])
        .order_by([ledger.c("id").unwrap()])
        .frame(WindowFrame::rolling(3))
        .build()
        .label("running");
    let query =
        select([ledger.c("id").unwrap(), running]).order_by([sqlweave::expr::label_ref("running")]);

    let compiled = query.compile(&Dialect::Postgres).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT id, SUM(amount) OVER (PARTITION BY account ORDER BY id \
         ROWS BETWEEN 2 PRECEDING AND CURRENT ROW) AS running\nFROM ledger\nORDER BY running"
    );
    assert_eq!(compiled.result_columns, vec!["id", "running"]);
    validate_sql(&compiled.sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_cumulative_frame_from_unbounded_start() {
    use sqlweave::expr::WindowFrame;

    let (users, _) = tables();
    let cumulative = count(users.c("id").unwrap())
        .over()
        .order_by([users.c("id").unwrap()])
        .frame(WindowFrame::rows_to_current())
        .build()
        .label("seen");
    let sql = select([cumulative]).compile(&Dialect::DuckDb).unwrap().sql;
    assert!(
        sql.contains("OVER (ORDER BY id ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS seen"),
        "{}",
        sql
    );
}

#[test]
fn test_intersect_and_except_all() {
    let (users, addresses) = tables();
    let ids = || select([users.c("id").unwrap()]);
    let owners = || select([addresses.c("user_id").unwrap()]);

    let both = ids().intersect_all(owners()).unwrap();
    assert_eq!(
        both.compile(&Dialect::Postgres).unwrap().sql,
        "SELECT id\nFROM users\nINTERSECT ALL\nSELECT user_id\nFROM addresses"
    );

    let without = ids().except_all(owners()).unwrap();
    let sql = without.compile(&Dialect::Postgres).unwrap().sql;
    assert!(sql.contains("\nEXCEPT ALL\n"), "{}", sql);
    validate_sql(&sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_outer_join_with_explicit_condition() {
    let (users, addresses) = tables();
    let query = select([users.c("name").unwrap(), addresses.c("email").unwrap()])
        .outer_join_on(
            addresses.clone(),
            users
                .c("id")
                .unwrap()
                .eq(addresses.c("user_id").unwrap())
                .and(addresses.c("email").unwrap().is_not_null()),
        )
        .unwrap();

    let sql = query.compile(&Dialect::Postgres).unwrap().sql;
    assert_eq!(
        sql,
        "SELECT users.name, addresses.email\nFROM users LEFT OUTER JOIN addresses \
         ON users.id = addresses.user_id AND addresses.email IS NOT NULL"
    );
    validate_sql(&sql, Dialect::Postgres).unwrap();
}

#[test]
fn test_simple_case_coerces_values_against_operand() {
    let (users, _) = tables();
    let kind = sqlweave::expr::case_value(
        users.c("name").unwrap(),
        vec![("root".into(), literal("admin"))],
        Some(literal("member")),
    )
    .label("kind");

    let compiled = select([kind]).compile(&Dialect::Ansi).unwrap();
    assert!(
        compiled.sql.starts_with("SELECT CASE name WHEN :name_1 THEN "),
        "{}",
        compiled.sql
    );
    assert!(compiled.sql.contains(" END AS kind\nFROM users"), "{}", compiled.sql);
    assert_eq!(
        compiled.parameter("name_1").unwrap().data_type,
        Some(DataType::Varchar(30))
    );
}
