//! End-to-end integration tests for relationship traversal patterns.
//!
//! Tests multi-hop relationship patterns, bidirectional traversal,
//! relationship type filtering, and variable-length paths.

use graphlite::{Direction, NodeId, Store, Value};

/// Builds a linear chain A-[:R]->B-[:R]->C-[:R]->D via the store API and
/// returns (store, ids in chain order).
fn linear_chain(store: &mut Store, names: &[&str]) -> Vec<NodeId> {
    let ids: Vec<NodeId> = names
        .iter()
        .map(|name| {
            let mut props = graphlite::PropertyMap::new();
            props.insert("name".to_string(), Value::String((*name).to_string()));
            store.create_node(vec!["Node".into()], props, None).unwrap()
        })
        .collect();
    for pair in ids.windows(2) {
        store.create_edge(pair[0], pair[1], "R".into(), Default::default()).unwrap();
    }
    ids
}

#[test]
fn single_hop_directed_pattern() {
    let mut store = Store::new();
    linear_chain(&mut store, &["Alice", "Bob"]);
    let result = store
        .execute("MATCH (a)-[:R]->(b) RETURN a.name AS a, b.name AS b")
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get_value("a"), Some(&Value::String("Alice".into())));
    assert_eq!(result.rows[0].get_value("b"), Some(&Value::String("Bob".into())));
}

#[test]
fn relationship_type_filter_excludes_other_types() {
    let mut store = Store::new();
    let a = store.create_node(vec![], Default::default(), None).unwrap();
    let b = store.create_node(vec![], Default::default(), None).unwrap();
    store.create_edge(a, b, "LIKES".into(), Default::default()).unwrap();

    let result = store.execute("MATCH (a)-[:KNOWS]->(b) RETURN a").unwrap();
    assert!(result.is_empty());
}

#[test]
fn reverse_direction_pattern_matches_incoming_edges() {
    let mut store = Store::new();
    let a = store.create_node(vec![], Default::default(), None).unwrap();
    let b = store.create_node(vec![], Default::default(), None).unwrap();
    store.create_edge(a, b, "R".into(), Default::default()).unwrap();

    let result = store.execute("MATCH (x)<-[:R]-(y) RETURN x, y").unwrap();
    assert_eq!(result.rows.len(), 1);
    let x = result.rows[0].get("x").unwrap().as_node().unwrap();
    assert_eq!(x.id, b);
}

/// Scenario 4: variable-length path over a linear chain returns endpoints
/// in order of path length, innermost first.
#[test]
fn variable_length_path_orders_by_hop_count() {
    let mut store = Store::new();
    linear_chain(&mut store, &["A", "B", "C", "D"]);

    let result = store
        .execute("MATCH (start {name: 'A'})-[:R*1..3]->(x) RETURN x.name AS name")
        .unwrap();
    let names: Vec<String> = result
        .rows
        .iter()
        .map(|r| r.get_value("name").unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["B".to_string(), "C".to_string(), "D".to_string()]);
}

/// Same ordering requirement on a branching graph, where DFS discovery
/// order and length order diverge: `A->B`, `A->C`, `B->D`. A naive DFS
/// visits `B`, then dives straight to `D` before backtracking to `C`; the
/// required order is by hop count first, so `C` (depth 1) must precede
/// `D` (depth 2).
#[test]
fn variable_length_path_orders_by_hop_count_on_branching_graph() {
    let mut store = Store::new();
    let mut make = |name: &str| {
        let mut props = graphlite::PropertyMap::new();
        props.insert("name".to_string(), Value::String(name.to_string()));
        store.create_node(vec!["Node".into()], props, None).unwrap()
    };
    let a = make("A");
    let b = make("B");
    let c = make("C");
    let d = make("D");
    store.create_edge(a, b, "R".into(), Default::default()).unwrap();
    store.create_edge(a, c, "R".into(), Default::default()).unwrap();
    store.create_edge(b, d, "R".into(), Default::default()).unwrap();

    let result = store
        .execute("MATCH (start {name: 'A'})-[:R*1..2]->(x) RETURN x.name AS name")
        .unwrap();
    let names: Vec<String> = result
        .rows
        .iter()
        .map(|r| r.get_value("name").unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["B".to_string(), "C".to_string(), "D".to_string()]);
}

#[test]
fn zero_length_path_includes_start_node() {
    let mut store = Store::new();
    let ids = linear_chain(&mut store, &["A", "B"]);

    let result = store
        .execute("MATCH (a {name: 'A'})-[:R*0..1]->(x) RETURN x")
        .unwrap();
    let returned: Vec<NodeId> = result.rows.iter().map(|r| r.get("x").unwrap().as_node().unwrap().id).collect();
    assert!(returned.contains(&ids[0]));
    assert!(returned.contains(&ids[1]));
}

#[test]
fn adjacent_edges_direction_both_returns_union() {
    let mut store = Store::new();
    let a = store.create_node(vec![], Default::default(), None).unwrap();
    let b = store.create_node(vec![], Default::default(), None).unwrap();
    let c = store.create_node(vec![], Default::default(), None).unwrap();
    store.create_edge(a, b, "R".into(), Default::default()).unwrap();
    store.create_edge(c, a, "R".into(), Default::default()).unwrap();

    let both = store.adjacent_edges(a, Direction::Both);
    assert_eq!(both.len(), 2);
}
