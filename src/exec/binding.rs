//! A binding row: the executor's unit of work between pipeline stages.

use indexmap::IndexMap;

use crate::model::{NodeId, RelId, Value};

/// What a pattern variable is bound to. Entities are kept as ids — the
/// store is always consulted for current property values, so a row never
/// goes stale even if a later `CREATE` in the same pipeline mutates a node
/// a prior clause bound.
#[derive(Debug, Clone)]
pub enum Binding {
    Node(NodeId),
    Edge(RelId),
    /// A variable-length relationship binds to the list of traversed edges.
    EdgePath(Vec<RelId>),
    Value(Value),
}

/// An ordered variable → binding mapping. Insertion-ordered so that
/// debug rendering and `RETURN *`-style expansion are deterministic.
pub type Row = IndexMap<String, Binding>;
