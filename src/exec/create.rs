//! `CREATE` clause execution.
//!
//! Named nodes already bound by an earlier clause are reused rather than
//! recreated: properties in the `CREATE` pattern are merged into the
//! existing node (new keys win on conflict) and labels are unioned.
//! Relationships in a `CREATE` pattern are always freshly created, even
//! between two already-bound nodes.

use crate::cypher::ast::{NodePattern, Pattern, PatternDirection, PatternElement, RelPattern};
use crate::model::PropertyMap;
use crate::store::Store;
use crate::Result;

use super::binding::{Binding, Row};
use super::eval::eval;

/// Applies `patterns` once against `row`, mutating `store` and returning
/// the row extended with any newly bound variables.
pub fn execute_create(patterns: &[Pattern], row: &Row, store: &mut Store, params: &PropertyMap) -> Result<Row> {
    let mut row = row.clone();
    for pattern in patterns {
        create_chain(pattern, &mut row, store, params)?;
    }
    Ok(row)
}

fn create_chain(pattern: &Pattern, row: &mut Row, store: &mut Store, params: &PropertyMap) -> Result<()> {
    let mut prior_node: Option<crate::model::NodeId> = None;
    let mut pending_rel: Option<&RelPattern> = None;
    for element in &pattern.elements {
        match element {
            PatternElement::Node(node_pat) => {
                let id = create_or_reuse_node(node_pat, row, store, params)?;
                if let (Some(rel_pat), Some(src)) = (pending_rel.take(), prior_node) {
                    finish_edge(rel_pat, src, id, row, store, params)?;
                }
                prior_node = Some(id);
            }
            PatternElement::Rel(rel_pat) => {
                pending_rel = Some(rel_pat);
            }
        }
    }
    Ok(())
}

fn create_or_reuse_node(
    pat: &NodePattern,
    row: &mut Row,
    store: &mut Store,
    params: &PropertyMap,
) -> Result<crate::model::NodeId> {
    if let Some(alias) = &pat.alias {
        if let Some(Binding::Node(id)) = row.get(alias) {
            let id = *id;
            for label in &pat.labels {
                store.add_node_label(id, label.clone())?;
            }
            for (key, expr) in &pat.properties {
                let value = eval(expr, row, store, params)?;
                store.set_node_property(id, key.clone(), value)?;
            }
            return Ok(id);
        }
    }
    let mut properties = PropertyMap::new();
    for (key, expr) in &pat.properties {
        properties.insert(key.clone(), eval(expr, row, store, params)?);
    }
    let id = store.create_node(pat.labels.clone(), properties, None)?;
    if let Some(alias) = &pat.alias {
        row.insert(alias.clone(), Binding::Node(id));
    }
    Ok(id)
}

/// Resolves the destination node of a relationship pattern and creates the
/// edge. Called immediately after the trailing node pattern is resolved.
fn finish_edge(
    rel_pat: &RelPattern,
    src: crate::model::NodeId,
    dst: crate::model::NodeId,
    row: &mut Row,
    store: &mut Store,
    params: &PropertyMap,
) -> Result<()> {
    let (from, to) = match rel_pat.direction {
        PatternDirection::Left => (dst, src),
        PatternDirection::Right | PatternDirection::Both => (src, dst),
    };
    let rel_type = rel_pat.rel_types.first().cloned().unwrap_or_default();
    let mut properties = PropertyMap::new();
    for (key, expr) in &rel_pat.properties {
        properties.insert(key.clone(), eval(expr, row, store, params)?);
    }
    let id = store.create_edge(from, to, rel_type, properties)?;
    if let Some(alias) = &rel_pat.alias {
        row.insert(alias.clone(), Binding::Edge(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher;
    use crate::cypher::ast::Clause;

    fn patterns_of(query: &str) -> Vec<Pattern> {
        let stmt = cypher::parse(query).unwrap();
        match &stmt.clauses[0] {
            Clause::Create(p) => p.clone(),
            _ => panic!("expected CREATE clause"),
        }
    }

    #[test]
    fn creates_single_node() {
        let patterns = patterns_of("CREATE (n:Person {name: 'Ada'})");
        let mut store = Store::new();
        let row = execute_create(&patterns, &Row::new(), &mut store, &PropertyMap::new()).unwrap();
        assert_eq!(store.node_count(), 1);
        assert!(matches!(row.get("n"), Some(Binding::Node(_))));
    }

    #[test]
    fn creates_relationship_between_new_nodes() {
        let patterns = patterns_of("CREATE (a:Person {name: 'Ada'})-[r:KNOWS]->(b:Person {name: 'Bea'})");
        let mut store = Store::new();
        let row = execute_create(&patterns, &Row::new(), &mut store, &PropertyMap::new()).unwrap();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert!(matches!(row.get("r"), Some(Binding::Edge(_))));
    }

    #[test]
    fn reusing_bound_node_merges_properties_and_unions_labels() {
        let mut store = Store::new();
        let existing = store.create_node(vec!["Person".into()], PropertyMap::new(), None).unwrap();
        let mut row = Row::new();
        row.insert("n".to_string(), Binding::Node(existing));

        let patterns = patterns_of("CREATE (n:Admin {name: 'Ada'})");
        execute_create(&patterns, &row, &mut store, &PropertyMap::new()).unwrap();

        assert_eq!(store.node_count(), 1);
        let node = store.get_node(existing).unwrap();
        assert!(node.has_label("Person"));
        assert!(node.has_label("Admin"));
        assert_eq!(node.get("name"), Some(&crate::model::Value::String("Ada".into())));
    }
}
