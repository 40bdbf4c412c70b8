// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory dependency-graph checks run before the first insert of an
//! enqueue.
//!
//! Deferred cross-workflow edges (targets not present in the node set)
//! are frontier nodes: they do not participate in the cycle check until
//! resolved.

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Reject dependency cycles among `nodes`.
///
/// `nodes` maps a node key to the keys it depends on. Edges pointing
/// outside the node set are ignored.
pub fn check_acyclic(nodes: &HashMap<String, Vec<String>>) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        key: &str,
        nodes: &HashMap<String, Vec<String>>,
        marks: &mut HashMap<String, Mark>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let mut cycle: Vec<&str> = stack
                    .iter()
                    .skip_while(|k| k.as_str() != key)
                    .map(String::as_str)
                    .collect();
                cycle.push(key);
                return Err(Error::validation(format!(
                    "dependency cycle: {}",
                    cycle.join(" -> ")
                )));
            }
            None => {}
        }
        marks.insert(key.to_string(), Mark::Visiting);
        stack.push(key.to_string());
        if let Some(deps) = nodes.get(key) {
            for dep in deps {
                // Frontier edge: target not materialised yet.
                if nodes.contains_key(dep) {
                    visit(dep, nodes, marks, stack)?;
                }
            }
        }
        stack.pop();
        marks.insert(key.to_string(), Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut keys: Vec<&String> = nodes.keys().collect();
    keys.sort();
    for key in keys {
        visit(key, nodes, &mut marks, &mut stack)?;
    }
    Ok(())
}

/// Transitive closure of `roots` following dependency edges, used to
/// narrow a build to `nodes_to_run`. Unknown roots are reported.
pub fn reachable_from(
    nodes: &HashMap<String, Vec<String>>,
    roots: &[String],
) -> Result<HashSet<String>> {
    let mut out = HashSet::new();
    let mut work: Vec<String> = Vec::new();
    for root in roots {
        if !nodes.contains_key(root) {
            return Err(Error::validation(format!("unknown node {root:?}")));
        }
        work.push(root.clone());
    }
    while let Some(key) = work.pop() {
        if !out.insert(key.clone()) {
            continue;
        }
        if let Some(deps) = nodes.get(&key) {
            for dep in deps {
                if nodes.contains_key(dep) {
                    work.push(dep.clone());
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
