//! Topological ordering of the module graph.
//!
//! Produces the initialization order: every module appears after all of
//! its dependencies. The worklist runs over dependents (modules nothing
//! else imports first) and the result is reversed, which keeps the
//! entry module last without a separate pass. Library modules have no
//! dependencies, so they are emitted up front in name order rather than
//! threaded through the worklist.

use crate::error::LinkError;
use crate::table::{ModuleKey, ModuleRecord, ModuleTable};
use std::collections::HashMap;

/// Orders the table's modules dependencies-first. Fails with
/// `CircularImport` when local modules form a cycle; the reported
/// sequence follows import direction.
pub fn sort(table: &ModuleTable) -> Result<Vec<ModuleKey>, LinkError> {
    let mut indegree: HashMap<&ModuleKey, usize> = HashMap::new();
    for (key, record) in &table.records {
        if let ModuleRecord::Local(module) = record {
            indegree.insert(key, module.indegree);
        }
    }

    // Seed deterministically: ties broken by path.
    let mut ready: Vec<&ModuleKey> = indegree
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(key, _)| *key)
        .collect();
    ready.sort();
    ready.reverse();

    let mut reversed: Vec<ModuleKey> = Vec::with_capacity(indegree.len());
    while let Some(key) = ready.pop() {
        reversed.push(key.clone());
        let module = match table.records.get(key) {
            Some(ModuleRecord::Local(module)) => module,
            _ => continue,
        };
        for dep in &module.dependencies {
            if let Some(n) = indegree.get_mut(dep) {
                *n -= 1;
                if *n == 0 {
                    ready.push(dep);
                }
            }
        }
    }

    if reversed.len() < indegree.len() {
        let cycle = find_cycle(table, &indegree);
        return Err(LinkError::CircularImport { cycle });
    }

    reversed.reverse();

    let mut libraries: Vec<ModuleKey> = table
        .records
        .iter()
        .filter(|(_, record)| matches!(record, ModuleRecord::Library(_)))
        .map(|(key, _)| key.clone())
        .collect();
    libraries.sort();

    libraries.extend(reversed);
    Ok(libraries)
}

/// Walks the residual subgraph (local modules the worklist never
/// drained) until a node repeats on the path; the tail from the first
/// occurrence is a concrete cycle in import order.
fn find_cycle(table: &ModuleTable, residual: &HashMap<&ModuleKey, usize>) -> Vec<ModuleKey> {
    let mut nodes: Vec<&ModuleKey> = residual
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(key, _)| *key)
        .collect();
    nodes.sort();

    let mut path: Vec<&ModuleKey> = Vec::new();
    for start in nodes {
        path.clear();
        if let Some(cycle) = walk(table, residual, start, &mut path) {
            return cycle;
        }
    }
    // Unreachable when the worklist fell short, but a sorter bug must
    // not panic the driver.
    Vec::new()
}

fn walk<'a>(
    table: &'a ModuleTable,
    residual: &HashMap<&ModuleKey, usize>,
    node: &'a ModuleKey,
    path: &mut Vec<&'a ModuleKey>,
) -> Option<Vec<ModuleKey>> {
    if let Some(pos) = path.iter().position(|k| *k == node) {
        return Some(path[pos..].iter().map(|k| (*k).clone()).collect());
    }
    path.push(node);
    if let Some(ModuleRecord::Local(module)) = table.records.get(node) {
        for dep in &module.dependencies {
            let in_residual = residual.get(dep).map(|n| *n > 0).unwrap_or(false);
            if !in_residual {
                continue;
            }
            if let Some(cycle) = walk(table, residual, dep, path) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    None
}
