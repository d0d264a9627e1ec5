//! End-to-end integration tests for aggregation, grouping, `DISTINCT`, and
//! result ordering (`ORDER BY` / `SKIP` / `LIMIT`).

use graphlite::{Store, Value};

fn setup_people(store: &mut Store) {
    for (name, age) in [("Alice", 25), ("Bob", 30), ("Charlie", 35), ("Diana", 28), ("Eve", 22)] {
        let mut props = graphlite::PropertyMap::new();
        props.insert("name".to_string(), Value::String(name.to_string()));
        props.insert("age".to_string(), Value::Int(age));
        store.create_node(vec!["Person".into()], props, None).unwrap();
    }
}

/// Scenario 2: filter + order.
#[test]
fn filter_then_order_by() {
    let mut store = Store::new();
    for age in [20, 30, 40] {
        let mut props = graphlite::PropertyMap::new();
        props.insert("age".to_string(), Value::Int(age));
        store.create_node(vec!["Person".into()], props, None).unwrap();
    }
    let result = store
        .execute("MATCH (p:Person) WHERE p.age > 25 RETURN p.age AS age ORDER BY p.age")
        .unwrap();
    let ages: Vec<i64> = result.rows.iter().map(|r| r.get_value("age").unwrap().as_int().unwrap()).collect();
    assert_eq!(ages, vec![30, 40]);
}

/// Scenario 3: join + count.
#[test]
fn join_then_count_aggregate() {
    let mut store = Store::new();
    let mut alice_props = graphlite::PropertyMap::new();
    alice_props.insert("name".to_string(), Value::String("Alice".into()));
    let mut bob_props = graphlite::PropertyMap::new();
    bob_props.insert("name".to_string(), Value::String("Bob".into()));
    let alice = store.create_node(vec!["Person".into()], alice_props, None).unwrap();
    let bob = store.create_node(vec!["Person".into()], bob_props, None).unwrap();
    store.create_edge(alice, bob, "KNOWS", Default::default()).unwrap();

    let result = store
        .execute("MATCH (a)-[:KNOWS]->(b) RETURN a.name AS a, b.name AS b")
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get_value("a"), Some(&Value::String("Alice".into())));
    assert_eq!(result.rows[0].get_value("b"), Some(&Value::String("Bob".into())));

    let count = store.execute("MATCH (p:Person) RETURN COUNT(*) AS total").unwrap();
    assert_eq!(count.rows[0].get_value("total"), Some(&Value::Int(2)));
}

#[test]
fn order_by_desc_then_skip_limit() {
    let mut store = Store::new();
    setup_people(&mut store);
    let result = store
        .execute("MATCH (p:Person) RETURN p.name AS name, p.age AS age ORDER BY age DESC SKIP 1 LIMIT 2")
        .unwrap();
    let ages: Vec<i64> = result.rows.iter().map(|r| r.get_value("age").unwrap().as_int().unwrap()).collect();
    assert_eq!(ages, vec![30, 28]);
}

#[test]
fn distinct_removes_duplicate_projections() {
    let mut store = Store::new();
    for _ in 0..3 {
        let mut props = graphlite::PropertyMap::new();
        props.insert("city".to_string(), Value::String("NYC".into()));
        store.create_node(vec!["Person".into()], props, None).unwrap();
    }
    let result = store.execute("MATCH (p:Person) RETURN DISTINCT p.city AS city").unwrap();
    assert_eq!(result.rows.len(), 1);
}

#[test]
fn grouped_aggregation_buckets_by_non_aggregate_columns() {
    let mut store = Store::new();
    for (city, age) in [("NYC", 20), ("NYC", 30), ("LA", 40)] {
        let mut props = graphlite::PropertyMap::new();
        props.insert("city".to_string(), Value::String(city.to_string()));
        props.insert("age".to_string(), Value::Int(age));
        store.create_node(vec!["Person".into()], props, None).unwrap();
    }
    let result = store
        .execute("MATCH (p:Person) RETURN p.city AS city, COUNT(*) AS n, AVG(p.age) AS avg_age ORDER BY city")
        .unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0].get_value("city"), Some(&Value::String("LA".into())));
    assert_eq!(result.rows[0].get_value("n"), Some(&Value::Int(1)));
    assert_eq!(result.rows[1].get_value("city"), Some(&Value::String("NYC".into())));
    assert_eq!(result.rows[1].get_value("n"), Some(&Value::Int(2)));
    assert_eq!(result.rows[1].get_value("avg_age"), Some(&Value::Float(25.0)));
}

#[test]
fn aggregate_over_empty_match_yields_one_default_row() {
    let mut store = Store::new();
    let result = store.execute("MATCH (n:Ghost) RETURN COUNT(*) AS total, SUM(n.age) AS total_age").unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get_value("total"), Some(&Value::Int(0)));
    assert_eq!(result.rows[0].get_value("total_age"), Some(&Value::Null));
}
