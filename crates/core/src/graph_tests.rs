// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn graph(edges: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    edges
        .iter()
        .map(|(k, deps)| {
            (k.to_string(), deps.iter().map(|d| d.to_string()).collect())
        })
        .collect()
}

#[test]
fn empty_graph_is_acyclic() {
    assert!(check_acyclic(&HashMap::new()).is_ok());
}

#[test]
fn chain_is_acyclic() {
    let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
    assert!(check_acyclic(&g).is_ok());
}

#[test]
fn diamond_is_acyclic() {
    let g = graph(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])]);
    assert!(check_acyclic(&g).is_ok());
}

#[test]
fn self_loop_is_a_cycle() {
    let g = graph(&[("a", &["a"])]);
    let err = check_acyclic(&g).unwrap_err();
    assert!(err.message.contains("cycle"));
}

#[test]
fn two_node_cycle_reports_path() {
    let g = graph(&[("a", &["b"]), ("b", &["a"])]);
    let err = check_acyclic(&g).unwrap_err();
    assert!(err.message.contains("a"));
    assert!(err.message.contains("b"));
}

#[test]
fn deferred_edges_are_frontier_nodes() {
    // "b" points outside the node set: a cross-workflow target that is
    // not materialised yet must not trip the check.
    let g = graph(&[("a", &["b"]), ("b", &["other.missing"])]);
    assert!(check_acyclic(&g).is_ok());
}

// --- reachable_from ---

#[test]
fn reachability_follows_dependencies() {
    let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[]), ("d", &[])]);
    let got = reachable_from(&g, &["a".to_string()]).unwrap();
    assert_eq!(got.len(), 3);
    assert!(got.contains("a") && got.contains("b") && got.contains("c"));
    assert!(!got.contains("d"));
}

#[test]
fn reachability_rejects_unknown_root() {
    let g = graph(&[("a", &[])]);
    assert!(reachable_from(&g, &["nope".to_string()]).is_err());
}
