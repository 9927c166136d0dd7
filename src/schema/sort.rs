//! Dependency ordering of tables for CREATE and DROP.
//!
//! Each foreign key adds an edge from the referenced table to the table
//! holding the key, so a topological order creates referenced tables
//! first. Cycles are broken by deferring one foreign key per cyclic
//! component: it is left out of CREATE TABLE and added afterwards with
//! `ALTER TABLE ... ADD CONSTRAINT`. Keys declared with `use_alter` are
//! always deferred; outside a cycle they still order their tables.
//!
//! Dropping a schema with deferred keys inside a cycle needs
//! `ALTER TABLE ... DROP CONSTRAINT` first, which needs a constraint name,
//! so [`sort_tables_for_drop`] refuses cycles whose deferred keys would
//! stay anonymous.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::{MetaData, TableId};
use crate::error::{Error, Result};

/// A foreign key that is created or dropped separately from its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredConstraint {
    /// Table holding the foreign key.
    pub table: TableId,
    /// Position of the constraint in [`Table::constraints`](super::Table::constraints).
    pub constraint: usize,
    /// Tables of the dependency cycle this key was part of, in input
    /// order. Empty for `use_alter` keys outside any cycle.
    pub cycle: Vec<TableId>,
}

impl DeferredConstraint {
    pub fn in_cycle(&self) -> bool {
        !self.cycle.is_empty()
    }
}

/// Result of [`sort_tables_and_constraints`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedTables {
    pub tables: Vec<TableId>,
    pub deferred: Vec<DeferredConstraint>,
}

impl SortedTables {
    /// Whether the constraint at `constraint` on `table` was deferred.
    pub fn is_deferred(&self, table: TableId, constraint: usize) -> bool {
        self.deferred
            .iter()
            .any(|d| d.table == table && d.constraint == constraint)
    }
}

/// One foreign key between two tables of the input set.
#[derive(Debug, Clone, Copy)]
struct Dependency {
    /// Input position of the referenced table.
    from: usize,
    /// Input position of the table holding the key.
    to: usize,
    constraint: usize,
    named: bool,
    use_alter: bool,
}

/// Order `tables` so that referenced tables come first, deferring foreign
/// keys that cannot be satisfied by ordering alone.
///
/// Ties are broken by input position. Self references and references to
/// tables outside `tables` impose no ordering.
pub fn sort_tables_and_constraints(metadata: &MetaData, tables: &[TableId]) -> Result<SortedTables> {
    let positions: HashMap<TableId, usize> =
        tables.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut dependencies = Vec::new();
    for (to, &id) in tables.iter().enumerate() {
        let table = metadata.table(id)?;
        for (constraint, fk) in table.foreign_key_constraints() {
            let target = metadata.resolve_foreign_key(table, fk)?;
            let Some(&from) = positions.get(&target.table) else {
                continue;
            };
            if from == to {
                continue;
            }
            dependencies.push(Dependency {
                from,
                to,
                constraint,
                named: metadata.has_resolvable_name(&table.constraints()[constraint]),
                use_alter: fk.use_alter,
            });
        }
    }

    // Cycles over every key, use_alter included, decide which deferred
    // keys sit inside a cycle.
    let all_cycles = cyclic_components(tables.len(), dependencies.iter());
    let cycle_of = |dep: &Dependency| -> Vec<TableId> {
        all_cycles
            .iter()
            .find(|c| c.contains(&dep.from) && c.contains(&dep.to))
            .map(|c| c.iter().map(|&i| tables[i]).collect())
            .unwrap_or_default()
    };

    let mut deferred = Vec::new();
    let mut active = Vec::new();
    for dep in &dependencies {
        if dep.use_alter {
            let cycle = cycle_of(dep);
            // Outside a cycle the key is still emitted late but keeps
            // ordering its tables, so DROP stays the exact reverse.
            if cycle.is_empty() {
                active.push(*dep);
            }
            deferred.push(DeferredConstraint {
                table: tables[dep.to],
                constraint: dep.constraint,
                cycle,
            });
        } else {
            active.push(*dep);
        }
    }

    loop {
        let cycles = cyclic_components(tables.len(), active.iter());
        if cycles.is_empty() {
            break;
        }
        for cycle in cycles {
            // Prefer a named key, then the latest table, then its earliest key.
            let Some(pick) = active
                .iter()
                .enumerate()
                .filter(|(_, d)| cycle.contains(&d.from) && cycle.contains(&d.to))
                .min_by_key(|(_, d)| (!d.named, Reverse(d.to), d.constraint))
                .map(|(i, _)| i)
            else {
                continue;
            };
            let dep = active.remove(pick);
            let table = tables[dep.to];
            tracing::debug!(
                table = %metadata.table(table)?.key(),
                constraint = dep.constraint,
                named = dep.named,
                "deferring foreign key to break dependency cycle"
            );
            deferred.push(DeferredConstraint {
                table,
                constraint: dep.constraint,
                cycle: cycle.iter().map(|&i| tables[i]).collect(),
            });
        }
    }

    let order = topological_order(tables.len(), &active);
    Ok(SortedTables {
        tables: order.into_iter().map(|i| tables[i]).collect(),
        deferred,
    })
}

/// Tables in CREATE order.
pub fn sort_tables(metadata: &MetaData, tables: &[TableId]) -> Result<Vec<TableId>> {
    Ok(sort_tables_and_constraints(metadata, tables)?.tables)
}

/// Tables in DROP order, the reverse of CREATE order.
///
/// Fails with [`Error::CircularDependency`] when a key deferred to break a
/// cycle has no name, since it could not be dropped ahead of its table.
pub fn sort_tables_for_drop(metadata: &MetaData, tables: &[TableId]) -> Result<SortedTables> {
    let mut sorted = sort_tables_and_constraints(metadata, tables)?;

    let mut stuck = Vec::new();
    for deferred in sorted.deferred.iter().filter(|d| d.in_cycle()) {
        let table = metadata.table(deferred.table)?;
        if !metadata.has_resolvable_name(&table.constraints()[deferred.constraint]) {
            for id in &deferred.cycle {
                let name = metadata.table(*id)?.key();
                if !stuck.contains(&name) {
                    stuck.push(name);
                }
            }
        }
    }
    if !stuck.is_empty() {
        stuck.sort();
        return Err(Error::CircularDependency { tables: stuck });
    }

    sorted.tables.reverse();
    Ok(sorted)
}

/// Strongly connected components with more than one table, each as sorted
/// input positions.
fn cyclic_components<'a>(
    nodes: usize,
    dependencies: impl Iterator<Item = &'a Dependency>,
) -> Vec<Vec<usize>> {
    let mut graph = DiGraph::<usize, ()>::with_capacity(nodes, 0);
    let indexes: Vec<NodeIndex> = (0..nodes).map(|i| graph.add_node(i)).collect();
    for dep in dependencies {
        graph.add_edge(indexes[dep.from], indexes[dep.to], ());
    }
    let mut components: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut members: Vec<usize> = scc.into_iter().map(|n| graph[n]).collect();
            members.sort_unstable();
            members
        })
        .collect();
    components.sort();
    components
}

/// Kahn's algorithm, always taking the ready table with the smallest input
/// position. `dependencies` must be acyclic.
fn topological_order(nodes: usize, dependencies: &[Dependency]) -> Vec<usize> {
    let mut in_degree = vec![0usize; nodes];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    for dep in dependencies {
        in_degree[dep.to] += 1;
        dependents[dep.from].push(dep.to);
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..nodes)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(nodes);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order
}
