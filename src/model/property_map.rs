//! PropertyMap — the key-value store carried by nodes and relationships.

use indexmap::IndexMap;

use super::Value;

/// A map of property names to values. Insertion-ordered so that serialised
/// output (snapshot text codec, debug rendering) is deterministic.
pub type PropertyMap = IndexMap<String, Value>;

/// Build a `Value::Map` from an iterator of (key, value) pairs — used when
/// constructing map literals during expression evaluation.
impl<K, V> FromIterator<(K, V)> for Value
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
