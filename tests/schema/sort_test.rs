//! Integration tests for dependency ordering of tables.

#[path = "../common/mod.rs"]
mod common;

use sqlweave::prelude::*;
use sqlweave::schema::{sort_tables_and_constraints, sort_tables_for_drop};

fn int(name: &str) -> Column {
    Column::new(name, DataType::Int64)
}

/// A small acyclic schema declared in an unhelpful order.
fn shop() -> MetaData {
    let mut md = MetaData::new();
    md.add_table(
        Table::new("order_lines")
            .column(int("id").primary_key())
            .column(int("order_id").references("orders.id"))
            .column(int("product_id").references("products.id")),
    )
    .unwrap();
    md.add_table(
        Table::new("orders")
            .column(int("id").primary_key())
            .column(int("customer_id").references("customers.id")),
    )
    .unwrap();
    md.add_table(Table::new("products").column(int("id").primary_key()))
        .unwrap();
    md.add_table(Table::new("customers").column(int("id").primary_key()))
        .unwrap();
    md
}

fn position(md: &MetaData, order: &[TableId], name: &str) -> usize {
    let id = md.table_id(name).unwrap();
    order.iter().position(|t| *t == id).unwrap()
}

#[test]
fn test_referenced_tables_are_created_first() {
    let md = shop();
    let order = md.sorted_tables().unwrap();
    assert_eq!(order.len(), 4);

    for (id, table) in md.tables() {
        for (_, fk) in table.foreign_key_constraints() {
            let target = md.resolve_foreign_key(table, fk).unwrap();
            assert!(
                position(&md, &order, &md.table(target.table).unwrap().key())
                    < position(&md, &order, &md.table(id).unwrap().key()),
                "{} must precede {}",
                md.table(target.table).unwrap().name,
                table.name
            );
        }
    }
}

#[test]
fn test_drop_order_is_exact_reverse() {
    let md = shop();
    let mut create = md.sorted_tables().unwrap();
    let drop = sort_tables_for_drop(&md, &md.table_ids()).unwrap();
    create.reverse();
    assert_eq!(drop.tables, create);
}

#[test]
fn test_sorting_is_stable_across_runs() {
    let md = shop();
    let first = md.sorted_tables().unwrap();
    for _ in 0..5 {
        assert_eq!(md.sorted_tables().unwrap(), first);
    }
}

#[test]
fn test_named_cycle_defers_one_edge() {
    let md = common::node_element(true);
    let sorted = sort_tables_and_constraints(&md, &md.table_ids()).unwrap();
    assert_eq!(sorted.deferred.len(), 1);

    let deferred = &sorted.deferred[0];
    let table = md.table(deferred.table).unwrap();
    assert_eq!(table.name, "element");
    assert_eq!(
        table.constraints()[deferred.constraint].name(),
        Some("fk_element_parent_node_id")
    );

    let names: Vec<String> = sorted
        .tables
        .iter()
        .map(|id| md.table(*id).unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["element", "node"]);
}

#[test]
fn test_unnamed_cycle_fails_for_drop() {
    let md = common::node_element(false);
    let err = sort_tables_for_drop(&md, &md.table_ids()).unwrap_err();
    assert!(err.is_circular_dependency());
    let message = err.to_string();
    assert!(message.contains("element"), "{}", message);
    assert!(message.contains("node"), "{}", message);
}

#[test]
fn test_unresolvable_target_fails_the_sort() {
    let mut md = MetaData::new();
    md.add_table(
        Table::new("orphans")
            .column(int("id").primary_key())
            .column(int("parent_id").references("parents.id")),
    )
    .unwrap();
    let err = md.sorted_tables().unwrap_err();
    assert!(err.is_unresolved_reference());
}

#[test]
fn test_deferred_lookup_by_table_and_position() {
    let md = common::node_element(true);
    let sorted = sort_tables_and_constraints(&md, &md.table_ids()).unwrap();
    let element = md.table_id("element").unwrap();
    let node = md.table_id("node").unwrap();

    let position = sorted.deferred[0].constraint;
    assert!(sorted.is_deferred(element, position));
    assert!(!sorted.is_deferred(node, position));
}
