//! # graphlite — embedded property-graph database
//!
//! An embedded, in-process property-graph database that accepts a subset
//! of the Cypher query language and executes it against an in-memory
//! directed multigraph.
//!
//! ## Design principles
//!
//! 1. **Single-threaded, synchronous**: no suspension points, no locking.
//! 2. **Clean DTOs**: [`Node`], [`Relationship`], [`Value`] cross every API boundary.
//! 3. **Parser owns nothing**: Cypher → AST is a pure function.
//! 4. **Store is the single source of truth**: every index is derived, never independent state.
//!
//! ## Quick start
//!
//! ```rust
//! use graphlite::{Store, PropertyMap, Value};
//!
//! # fn example() -> graphlite::Result<()> {
//! let mut store = Store::new();
//! let mut params = PropertyMap::new();
//! params.insert("name".into(), Value::from("Ada"));
//!
//! store.execute_with_params("CREATE (n:Person {name: $name})", &params)?;
//! let result = store.execute("MATCH (n:Person) RETURN n.name AS name")?;
//!
//! for row in &result.rows {
//!     println!("{:?}", row.get_value("name"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cypher;
pub mod exec;
pub mod model;
pub mod result;
pub mod store;
pub mod tx;

pub use model::{Direction, Node, NodeId, PropertyMap, RelId, Relationship, Value};
pub use result::{QueryResult, Record, RecordValue};
pub use store::{Snapshot, Store};
pub use tx::TransactionGuard;

impl Store {
    /// Parses and executes a Cypher query with no parameters.
    pub fn execute(&mut self, query: &str) -> Result<QueryResult> {
        self.execute_with_params(query, &PropertyMap::new())
    }

    /// Parses and executes a Cypher query, binding `$name`-style
    /// parameters from `params`.
    pub fn execute_with_params(&mut self, query: &str, params: &PropertyMap) -> Result<QueryResult> {
        let statement = cypher::parse(query)?;
        exec::execute(&statement, self, params)
    }
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax error at offset {offset}: {message}")]
    ParseError { offset: usize, message: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("argument error: {0}")]
    ArgumentError(String),

    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("node {0} does not exist")]
    MissingNode(u64),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("id {0} is already in use")]
    DuplicateId(u64),

    #[error("a transaction is already active on this store")]
    NestedTransaction,

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
