//! Node in the property graph.

use serde::{Deserialize, Serialize};

use super::{PropertyMap, Value};

/// Stable 64-bit node identifier, assigned monotonically by the store or
/// chosen explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the property graph: an id, a set of labels, and a property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            labels: Vec::new(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Adds a label, treating the label set as unordered: no duplicates.
    pub fn add_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.has_label(&label) {
            self.labels.push(label);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    pub fn remove_property(&mut self, key: &str) -> Option<Value> {
        self.properties.shift_remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_deduplicated() {
        let mut n = Node::new(NodeId(1));
        n.add_label("Person");
        n.add_label("Person");
        assert_eq!(n.labels.len(), 1);
    }
}
