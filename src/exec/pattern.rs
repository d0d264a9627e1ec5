//! Pattern matching: turns `MATCH`/`CREATE` patterns into binding rows.
//!
//! Candidate sets iterate in ascending node/edge id order (via `Store`'s
//! `BTreeMap`-backed indexes) so that repeated matches over the same store
//! state are deterministic. Variable-length traversal is a bounded DFS that
//! never reuses an edge within a single path; results are re-sorted by hop
//! count afterwards so callers see paths in increasing-length order.

use std::collections::HashSet;

use crate::cypher::ast::{NodePattern, Pattern, PatternDirection, PatternElement, RelPattern};
use crate::model::{Direction, NodeId, PropertyMap, RelId};
use crate::store::Store;
use crate::Result;

use super::binding::{Binding, Row};
use super::eval::eval;

/// Unbounded variable-length traversal is capped at this many hops to
/// guarantee termination on cyclic graphs.
pub const TRAVERSAL_CAP: usize = 15;

struct Chain<'a> {
    nodes: Vec<&'a NodePattern>,
    rels: Vec<&'a RelPattern>,
}

fn split_chain(pattern: &Pattern) -> Chain<'_> {
    let mut nodes = Vec::new();
    let mut rels = Vec::new();
    for element in &pattern.elements {
        match element {
            PatternElement::Node(n) => nodes.push(n),
            PatternElement::Rel(r) => rels.push(r),
        }
    }
    Chain { nodes, rels }
}

/// Extends every row in `rows` with matches of `pattern`. With an empty
/// `rows` input (the first `MATCH`/`CREATE`-context pattern of a query),
/// pass a single empty row to seed matching from scratch.
pub fn match_pattern(rows: &[Row], pattern: &Pattern, store: &Store, params: &PropertyMap) -> Result<Vec<Row>> {
    let chain = split_chain(pattern);
    let mut out = Vec::new();
    for row in rows {
        match_chain(&chain, store, params, row, &mut out)?;
    }
    Ok(out)
}

fn match_chain(chain: &Chain<'_>, store: &Store, params: &PropertyMap, base: &Row, out: &mut Vec<Row>) -> Result<()> {
    let first = chain.nodes[0];
    for candidate in candidates_for_node(first, base, store, params)? {
        let mut row = base.clone();
        if !bind_node(&mut row, first, candidate) {
            continue;
        }
        extend_from(chain, 1, candidate, row, Vec::new(), store, params, out)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn extend_from(
    chain: &Chain<'_>,
    node_idx: usize,
    current: NodeId,
    row: Row,
    used: Vec<RelId>,
    store: &Store,
    params: &PropertyMap,
    out: &mut Vec<Row>,
) -> Result<()> {
    if node_idx == chain.nodes.len() {
        out.push(row);
        return Ok(());
    }
    let rel_pat = chain.rels[node_idx - 1];
    let next_pat = chain.nodes[node_idx];
    let (min, max) = resolve_var_length(rel_pat);

    for (path_edges, end_node) in enumerate_paths(current, min, max, rel_pat, store, &used)? {
        let mut row2 = row.clone();
        if !bind_rel(&mut row2, rel_pat, &path_edges) {
            continue;
        }
        if !node_matches(end_node, next_pat, &row2, store, params)? {
            continue;
        }
        if !bind_node(&mut row2, next_pat, end_node) {
            continue;
        }
        let mut used2 = used.clone();
        used2.extend(&path_edges);
        extend_from(chain, node_idx + 1, end_node, row2, used2, store, params, out)?;
    }
    Ok(())
}

fn resolve_var_length(rel_pat: &RelPattern) -> (usize, usize) {
    match rel_pat.var_length {
        None => (1, 1),
        Some(vl) => (vl.min.unwrap_or(1), vl.max.unwrap_or(TRAVERSAL_CAP)),
    }
}

fn pattern_direction_to_store(direction: PatternDirection) -> Direction {
    match direction {
        PatternDirection::Right => Direction::Outgoing,
        PatternDirection::Left => Direction::Incoming,
        PatternDirection::Both => Direction::Both,
    }
}

fn other_endpoint(rel: &crate::model::Relationship, from: NodeId, direction: PatternDirection) -> NodeId {
    match direction {
        PatternDirection::Right => rel.dst,
        PatternDirection::Left => rel.src,
        PatternDirection::Both => rel.other_node(from).unwrap_or(rel.dst),
    }
}

/// DFS enumeration of every simple (no-edge-reuse) path of length in
/// `[min, max]` hops from `start`, respecting the relationship pattern's
/// direction and type filter. Returns `(traversed edge ids, end node)`.
fn enumerate_paths(
    start: NodeId,
    min: usize,
    max: usize,
    rel_pat: &RelPattern,
    store: &Store,
    used_so_far: &[RelId],
) -> Result<Vec<(Vec<RelId>, NodeId)>> {
    let mut results = Vec::new();
    if min == 0 {
        results.push((Vec::new(), start));
    }
    let mut used: HashSet<RelId> = used_so_far.iter().copied().collect();
    let mut path = Vec::new();
    let direction = pattern_direction_to_store(rel_pat.direction);
    dfs(start, 0, min, max, rel_pat, direction, store, &mut path, &mut used, &mut results);
    // Enumeration itself is depth-first; re-sort so callers see paths in
    // increasing hop-count order, shortest paths (and ties within the same
    // length, in discovery order) first.
    results.sort_by_key(|(path, _)| path.len());
    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    node: NodeId,
    depth: usize,
    min: usize,
    max: usize,
    rel_pat: &RelPattern,
    direction: Direction,
    store: &Store,
    path: &mut Vec<RelId>,
    used: &mut HashSet<RelId>,
    results: &mut Vec<(Vec<RelId>, NodeId)>,
) {
    if depth >= max {
        return;
    }
    for rel_id in store.adjacent_edges(node, direction) {
        if used.contains(&rel_id) {
            continue;
        }
        let Ok(rel) = store.get_edge(rel_id) else { continue };
        if !rel_pat.rel_types.is_empty() && !rel_pat.rel_types.contains(&rel.rel_type) {
            continue;
        }
        let next = other_endpoint(rel, node, rel_pat.direction);
        path.push(rel_id);
        used.insert(rel_id);
        let new_depth = depth + 1;
        if new_depth >= min {
            results.push((path.clone(), next));
        }
        dfs(next, new_depth, min, max, rel_pat, direction, store, path, used, results);
        path.pop();
        used.remove(&rel_id);
    }
}

fn candidates_for_node(pat: &NodePattern, row: &Row, store: &Store, params: &PropertyMap) -> Result<Vec<NodeId>> {
    if let Some(alias) = &pat.alias {
        if let Some(Binding::Node(id)) = row.get(alias) {
            return Ok(if node_matches(*id, pat, row, store, params)? { vec![*id] } else { vec![] });
        }
    }
    let base: Vec<NodeId> = match pat.labels.first() {
        Some(label) => store.nodes_by_label(label).map(|n| n.id).collect(),
        None => store.all_nodes().map(|n| n.id).collect(),
    };
    let mut out = Vec::new();
    for id in base {
        if node_matches(id, pat, row, store, params)? {
            out.push(id);
        }
    }
    Ok(out)
}

fn node_matches(id: NodeId, pat: &NodePattern, row: &Row, store: &Store, params: &PropertyMap) -> Result<bool> {
    let node = store.get_node(id)?;
    for label in &pat.labels {
        if !node.has_label(label) {
            return Ok(false);
        }
    }
    for (key, expr) in &pat.properties {
        let expected = eval(expr, row, store, params)?;
        let actual = node.get(key).cloned().unwrap_or(crate::model::Value::Null);
        if !actual.values_equal(&expected) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Binds `pat`'s alias to `id`, checking consistency with any existing
/// binding of the same name (shared-variable join constraint). Returns
/// `false` if the candidate conflicts with a prior binding.
fn bind_node(row: &mut Row, pat: &NodePattern, id: NodeId) -> bool {
    let Some(alias) = &pat.alias else { return true };
    match row.get(alias) {
        Some(Binding::Node(existing)) => *existing == id,
        Some(_) => false,
        None => {
            row.insert(alias.clone(), Binding::Node(id));
            true
        }
    }
}

fn bind_rel(row: &mut Row, pat: &RelPattern, path_edges: &[RelId]) -> bool {
    let Some(alias) = &pat.alias else { return true };
    let binding = if pat.var_length.is_some() {
        Binding::EdgePath(path_edges.to_vec())
    } else {
        match path_edges.first() {
            Some(id) => Binding::Edge(*id),
            None => return false,
        }
    };
    match row.get(alias) {
        Some(Binding::Edge(existing)) => matches!(&binding, Binding::Edge(id) if id == existing),
        Some(Binding::EdgePath(existing)) => matches!(&binding, Binding::EdgePath(ids) if ids == existing),
        Some(_) => false,
        None => {
            row.insert(alias.clone(), binding);
            true
        }
    }
}
