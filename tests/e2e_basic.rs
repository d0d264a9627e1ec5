//! End-to-end tests for the core CRUD + cascade-delete scenario and the
//! basic CREATE/MATCH/RETURN round trip.

use graphlite::{Store, Value};

#[test]
fn create_and_query_node() {
    let mut store = Store::new();
    store.execute("CREATE (n:Person)").unwrap();

    let result = store.execute("MATCH (n:Person) RETURN n").unwrap();
    assert_eq!(result.columns, vec!["n".to_string()]);
    assert_eq!(result.rows.len(), 1);

    let node = result.rows[0].get("n").unwrap().as_node().unwrap();
    assert!(node.has_label("Person"));
}

#[test]
fn create_with_properties_round_trips() {
    let mut store = Store::new();
    store.execute("CREATE (n:Person {name: 'Ada', age: 36})").unwrap();

    let result = store.execute("MATCH (n:Person) RETURN n").unwrap();
    let node = result.rows[0].get("n").unwrap().as_node().unwrap();
    assert_eq!(node.get("name"), Some(&Value::String("Ada".into())));
    assert_eq!(node.get("age"), Some(&Value::Int(36)));
}

/// Scenario 1: create A, B, C and edges A->B, B->C; deleting B cascades to
/// both incident edges and leaves A and C behind.
#[test]
fn delete_cascades_to_incident_edges() {
    let mut store = Store::new();
    let a = store.create_node(vec!["Node".into()], Default::default(), None).unwrap();
    let b = store.create_node(vec!["Node".into()], Default::default(), None).unwrap();
    let c = store.create_node(vec!["Node".into()], Default::default(), None).unwrap();
    store.create_edge(a, b, "R".into(), Default::default()).unwrap();
    store.create_edge(b, c, "R".into(), Default::default()).unwrap();

    store.delete_node(b).unwrap();

    assert_eq!(store.node_count(), 2);
    assert_eq!(store.edge_count(), 0);
    assert!(store.get_node(a).is_ok());
    assert!(store.get_node(c).is_ok());
    assert!(store.get_node(b).is_err());
}

#[test]
fn empty_query_is_a_parse_error() {
    let mut store = Store::new();
    assert!(store.execute("").is_err());
}

#[test]
fn match_with_no_results_is_an_empty_result_set() {
    let mut store = Store::new();
    let result = store.execute("MATCH (n:Ghost) RETURN n").unwrap();
    assert!(result.is_empty());
}
