//! # Property Graph Model
//!
//! Clean DTOs for the embedded property graph: nodes, relationships, the
//! dynamic value union, and the property map they share.
//!
//! Design rule: pure data — no I/O, no state, no async.

pub mod edge;
pub mod node;
pub mod property_map;
pub mod value;

pub use edge::{Direction, RelId, Relationship};
pub use node::{Node, NodeId};
pub use property_map::PropertyMap;
pub use value::Value;
