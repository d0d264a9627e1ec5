//! Query results: ordered records keyed by projection column name.

use std::fmt;

use crate::model::{Node, PropertyMap, Relationship, Value};

/// A single projected value. Wider than [`Value`] because a projection can
/// return a bound node or relationship directly (`RETURN n`), not just
/// literal/computed scalars.
#[derive(Debug, Clone)]
pub enum RecordValue {
    Value(Value),
    Node(Node),
    Relationship(Relationship),
    Path(Vec<Relationship>),
}

impl RecordValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            RecordValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            RecordValue::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            RecordValue::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Value(v) => write!(f, "{v}"),
            RecordValue::Node(n) => write!(f, "({}:{})", n.id, n.labels.join(":")),
            RecordValue::Relationship(r) => write!(f, "[{}:{}]", r.id, r.rel_type),
            RecordValue::Path(edges) => {
                write!(f, "[")?;
                for (i, e) in edges.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", e.id, e.rel_type)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// One result row: an ordered column name → value mapping.
#[derive(Debug, Clone, Default)]
pub struct Record {
    columns: PropertyMap2,
}

/// A `Vec`-backed ordered map so `Record` doesn't need to depend on
/// `indexmap` just for display purposes; column counts are small.
type PropertyMap2 = Vec<(String, RecordValue)>;

impl Record {
    pub fn new(columns: Vec<(String, RecordValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.columns.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(RecordValue::as_value)
    }

    /// The value of the first column; used for single-value extraction of
    /// aggregate queries (`RETURN count(*)`).
    pub fn first(&self) -> Option<&RecordValue> {
        self.columns.first().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The outcome of executing a query: ordered rows with named columns.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The first column of the first row — convenient for aggregate
    /// queries that return exactly one value.
    pub fn single_value(&self) -> Option<&RecordValue> {
        self.rows.first().and_then(Record::first)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            writeln!(f, "{}", cells.join(" | "))?;
        }
        Ok(())
    }
}
