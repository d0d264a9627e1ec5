//! The property-graph store: nodes, edges, label/type indexes, adjacency.
//!
//! Single-threaded, synchronous, no suspension points (see crate docs).
//! All state lives in one `Store` value; there is no global or process state.

pub mod snapshot;

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Direction, Node, NodeId, PropertyMap, RelId, Relationship, Value};
use crate::{Error, Result};

pub use snapshot::Snapshot;

/// The embedded property graph: holds nodes, edges, and every index derived
/// from them. Indexes are never independent state — they are always
/// rebuilt from `nodes`/`edges` by [`Store::reindex`], so a [`Snapshot`]
/// only needs to carry the source-of-truth entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<RelId, Relationship>,
    label_index: BTreeMap<String, BTreeSet<NodeId>>,
    type_index: BTreeMap<String, BTreeSet<RelId>>,
    adjacency_out: BTreeMap<NodeId, Vec<RelId>>,
    adjacency_in: BTreeMap<NodeId, Vec<RelId>>,
    next_node_id: u64,
    next_edge_id: u64,
    /// Transient: true while a transaction is in progress. Never persisted.
    tx_active: bool,
}

impl Store {
    pub fn new() -> Self {
        Self { next_node_id: 1, next_edge_id: 1, ..Default::default() }
    }

    // ------------------------------------------------------------------
    // Node CRUD
    // ------------------------------------------------------------------

    pub fn create_node(
        &mut self,
        labels: Vec<String>,
        properties: PropertyMap,
        id: Option<u64>,
    ) -> Result<NodeId> {
        let node_id = match id {
            Some(raw) => {
                let node_id = NodeId(raw);
                if self.nodes.contains_key(&node_id) {
                    return Err(Error::DuplicateId(raw));
                }
                node_id
            }
            None => NodeId(self.next_node_id),
        };
        if node_id.0 >= self.next_node_id {
            self.next_node_id = node_id.0 + 1;
        }

        for label in &labels {
            self.label_index.entry(label.clone()).or_default().insert(node_id);
        }
        self.nodes.insert(node_id, Node { id: node_id, labels, properties });
        self.adjacency_out.entry(node_id).or_default();
        self.adjacency_in.entry(node_id).or_default();
        Ok(node_id)
    }

    pub fn get_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NotFound(format!("node {id}")))
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NotFound(format!("node {id}")))
    }

    /// Deletes a node and cascades to every incident edge.
    pub fn delete_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.nodes.remove(&id).ok_or(Error::NotFound(format!("node {id}")))?;
        for label in &node.labels {
            if let Some(set) = self.label_index.get_mut(label) {
                set.remove(&id);
            }
        }
        let out: Vec<RelId> = self.adjacency_out.remove(&id).unwrap_or_default();
        let inn: Vec<RelId> = self.adjacency_in.remove(&id).unwrap_or_default();
        let mut incident: Vec<RelId> = out;
        incident.extend(inn);
        incident.sort_unstable();
        incident.dedup();
        for rel_id in incident {
            self.remove_edge_everywhere(rel_id);
        }
        Ok(())
    }

    pub fn set_node_property(&mut self, id: NodeId, key: impl Into<String>, value: Value) -> Result<()> {
        self.get_node_mut(id)?.set_property(key, value);
        Ok(())
    }

    pub fn remove_node_property(&mut self, id: NodeId, key: &str) -> Result<Option<Value>> {
        Ok(self.get_node_mut(id)?.remove_property(key))
    }

    pub fn add_node_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        self.get_node_mut(id)?.add_label(label.clone());
        self.label_index.entry(label).or_default().insert(id);
        Ok(())
    }

    /// Nodes carrying `label`, in ascending id order (deterministic).
    pub fn nodes_by_label(&self, label: &str) -> impl Iterator<Item = &Node> {
        self.label_index
            .get(label)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.nodes.get(id))
    }

    /// All nodes, in ascending id order (deterministic candidate set for an
    /// unlabelled node pattern).
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Edge CRUD
    // ------------------------------------------------------------------

    pub fn create_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        rel_type: impl Into<String>,
        properties: PropertyMap,
    ) -> Result<RelId> {
        if !self.nodes.contains_key(&src) {
            return Err(Error::MissingNode(src.0));
        }
        if !self.nodes.contains_key(&dst) {
            return Err(Error::MissingNode(dst.0));
        }
        let rel_type = rel_type.into();
        let id = RelId(self.next_edge_id);
        self.next_edge_id += 1;

        self.type_index.entry(rel_type.clone()).or_default().insert(id);
        self.adjacency_out.entry(src).or_default().push(id);
        self.adjacency_in.entry(dst).or_default().push(id);
        self.edges.insert(id, Relationship { id, src, dst, rel_type, properties });
        Ok(id)
    }

    /// Creates a batch of edges atomically: validates every endpoint first,
    /// so a failure leaves no partial mutation visible.
    pub fn create_edges_batch(
        &mut self,
        specs: Vec<(NodeId, NodeId, String, PropertyMap)>,
    ) -> Result<Vec<RelId>> {
        for (src, dst, _, _) in &specs {
            if !self.nodes.contains_key(src) {
                return Err(Error::MissingNode(src.0));
            }
            if !self.nodes.contains_key(dst) {
                return Err(Error::MissingNode(dst.0));
            }
        }
        let mut ids = Vec::with_capacity(specs.len());
        for (src, dst, rel_type, properties) in specs {
            ids.push(self.create_edge(src, dst, rel_type, properties)?);
        }
        Ok(ids)
    }

    pub fn get_edge(&self, id: RelId) -> Result<&Relationship> {
        self.edges.get(&id).ok_or(Error::NotFound(format!("relationship {id}")))
    }

    pub fn get_edge_mut(&mut self, id: RelId) -> Result<&mut Relationship> {
        self.edges.get_mut(&id).ok_or(Error::NotFound(format!("relationship {id}")))
    }

    pub fn delete_edge(&mut self, id: RelId) -> Result<()> {
        if !self.edges.contains_key(&id) {
            return Err(Error::NotFound(format!("relationship {id}")));
        }
        self.remove_edge_everywhere(id);
        Ok(())
    }

    fn remove_edge_everywhere(&mut self, id: RelId) {
        if let Some(rel) = self.edges.remove(&id) {
            if let Some(set) = self.type_index.get_mut(&rel.rel_type) {
                set.remove(&id);
            }
            if let Some(list) = self.adjacency_out.get_mut(&rel.src) {
                list.retain(|e| *e != id);
            }
            if let Some(list) = self.adjacency_in.get_mut(&rel.dst) {
                list.retain(|e| *e != id);
            }
        }
    }

    pub fn set_edge_property(&mut self, id: RelId, key: impl Into<String>, value: Value) -> Result<()> {
        self.get_edge_mut(id)?.set_property(key, value);
        Ok(())
    }

    pub fn remove_edge_property(&mut self, id: RelId, key: &str) -> Result<Option<Value>> {
        Ok(self.get_edge_mut(id)?.remove_property(key))
    }

    /// Edges of `rel_type`, in ascending id order.
    pub fn edges_by_type(&self, rel_type: &str) -> impl Iterator<Item = &Relationship> {
        self.type_index
            .get(rel_type)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.edges.get(id))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edge ids of `node`, in insertion (creation) order.
    pub fn out_edges(&self, node: NodeId) -> &[RelId] {
        self.adjacency_out.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming edge ids of `node`, in insertion (creation) order.
    pub fn in_edges(&self, node: NodeId) -> &[RelId] {
        self.adjacency_in.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edge ids adjacent to `node` for the given traversal direction.
    pub fn adjacent_edges(&self, node: NodeId, direction: Direction) -> Vec<RelId> {
        match direction {
            Direction::Outgoing => self.out_edges(node).to_vec(),
            Direction::Incoming => self.in_edges(node).to_vec(),
            Direction::Both => {
                let mut edges = self.out_edges(node).to_vec();
                edges.extend_from_slice(self.in_edges(node));
                edges
            }
        }
    }

    // ------------------------------------------------------------------
    // Snapshot / restore / bulk load
    // ------------------------------------------------------------------

    /// A deep, independent copy of the store's observable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_node_id: self.next_node_id,
            next_edge_id: self.next_edge_id,
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Replaces the store's state with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let tx_active = self.tx_active;
        *self = Self::from_snapshot(snapshot);
        self.tx_active = tx_active;
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Store::new();
        store
            .bulk_load(snapshot.nodes, snapshot.edges, snapshot.next_node_id, snapshot.next_edge_id)
            .expect("a captured snapshot is always internally consistent");
        store
    }

    /// Replaces the store's state from a flat node/edge list, validating
    /// endpoints up front so construction is O(n) rather than O(n) mutator
    /// calls each re-deriving the indexes.
    pub fn bulk_load(
        &mut self,
        nodes: Vec<Node>,
        edges: Vec<Relationship>,
        next_node_id: u64,
        next_edge_id: u64,
    ) -> Result<()> {
        let node_ids: BTreeSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        for edge in &edges {
            if !node_ids.contains(&edge.src) {
                return Err(Error::MissingNode(edge.src.0));
            }
            if !node_ids.contains(&edge.dst) {
                return Err(Error::MissingNode(edge.dst.0));
            }
        }

        self.nodes.clear();
        self.edges.clear();
        self.label_index.clear();
        self.type_index.clear();
        self.adjacency_out.clear();
        self.adjacency_in.clear();

        for node in nodes {
            for label in &node.labels {
                self.label_index.entry(label.clone()).or_default().insert(node.id);
            }
            self.adjacency_out.entry(node.id).or_default();
            self.adjacency_in.entry(node.id).or_default();
            self.nodes.insert(node.id, node);
        }
        for edge in edges {
            self.type_index.entry(edge.rel_type.clone()).or_default().insert(edge.id);
            self.adjacency_out.entry(edge.src).or_default().push(edge.id);
            self.adjacency_in.entry(edge.dst).or_default().push(edge.id);
            self.edges.insert(edge.id, edge);
        }

        self.next_node_id = next_node_id;
        self.next_edge_id = next_edge_id;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Runs `f` as a scoped transaction: snapshots on entry, discards the
    /// snapshot on success, restores it if `f` returns an error.
    pub fn transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Store) -> Result<T>,
    {
        if self.tx_active {
            return Err(Error::NestedTransaction);
        }
        self.tx_active = true;
        let snapshot = self.snapshot();
        let result = f(self);
        self.tx_active = false;
        if result.is_err() {
            self.restore(snapshot);
        }
        result
    }

    /// Begins an explicit transaction guard. The guard rolls back on
    /// `Drop` unless `commit()` or `rollback()` was called explicitly.
    pub fn begin_transaction(&mut self) -> Result<super::tx::TransactionGuard<'_>> {
        super::tx::TransactionGuard::begin(self)
    }

    pub(crate) fn is_tx_active(&self) -> bool {
        self.tx_active
    }

    pub(crate) fn set_tx_active(&mut self, active: bool) {
        self.tx_active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn create_and_fetch_node() {
        let mut store = Store::new();
        let id = store.create_node(vec!["Person".into()], PropertyMap::new(), None).unwrap();
        assert!(store.get_node(id).unwrap().has_label("Person"));
    }

    #[test]
    fn duplicate_explicit_id_fails() {
        let mut store = Store::new();
        store.create_node(vec![], PropertyMap::new(), Some(5)).unwrap();
        let err = store.create_node(vec![], PropertyMap::new(), Some(5)).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(5)));
    }

    #[test]
    fn explicit_id_advances_next_id() {
        let mut store = Store::new();
        store.create_node(vec![], PropertyMap::new(), Some(100)).unwrap();
        let next = store.create_node(vec![], PropertyMap::new(), None).unwrap();
        assert_eq!(next.0, 101);
    }

    #[test]
    fn create_edge_missing_endpoint_fails() {
        let mut store = Store::new();
        let a = store.create_node(vec![], PropertyMap::new(), None).unwrap();
        let err = store.create_edge(a, NodeId(999), "KNOWS", PropertyMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingNode(999)));
    }

    #[test]
    fn delete_node_cascades_to_edges() {
        let mut store = Store::new();
        let a = store.create_node(vec![], PropertyMap::new(), None).unwrap();
        let b = store.create_node(vec![], PropertyMap::new(), None).unwrap();
        let c = store.create_node(vec![], PropertyMap::new(), None).unwrap();
        store.create_edge(a, b, "R", PropertyMap::new()).unwrap();
        store.create_edge(b, c, "R", PropertyMap::new()).unwrap();

        store.delete_node(b).unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn label_index_matches_node_labels() {
        let mut store = Store::new();
        let a = store.create_node(vec!["Person".into()], PropertyMap::new(), None).unwrap();
        let b = store.create_node(vec![], PropertyMap::new(), None).unwrap();
        store.add_node_label(b, "Person").unwrap();

        let ids: Vec<NodeId> = store.nodes_by_label("Person").map(|n| n.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn rollback_restores_exact_prior_state() {
        let mut store = Store::new();
        store.create_node(vec!["Seed".into()], PropertyMap::new(), None).unwrap();
        let before = store.snapshot();

        let _ = store.transaction(|s| {
            for _ in 0..10 {
                s.create_node(vec![], PropertyMap::new(), None)?;
            }
            Err(Error::NotFound("force rollback".into()))
        });

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn nested_transaction_rejected() {
        let mut store = Store::new();
        let err = store
            .transaction(|s| s.transaction(|_| Ok(())))
            .unwrap_err();
        assert!(matches!(err, Error::NestedTransaction));
    }

    #[test]
    fn snapshot_round_trip_via_bulk_load() {
        let mut store = Store::new();
        let a = store.create_node(vec!["Person".into()], PropertyMap::new(), None).unwrap();
        let b = store.create_node(vec!["Person".into()], PropertyMap::new(), None).unwrap();
        store
            .create_edge(a, b, "KNOWS", [("since".to_string(), Value::Int(2020))].into_iter().collect())
            .unwrap();

        let snap = store.snapshot();
        let mut fresh = Store::new();
        fresh.bulk_load(snap.nodes.clone(), snap.edges.clone(), snap.next_node_id, snap.next_edge_id).unwrap();
        assert_eq!(fresh, store);
    }
}
