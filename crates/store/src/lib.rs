//! # Scaffold Store
//!
//! Typed persistence of the code graph.
//!
//! Node kinds map to fixed store labels; every relationship is written into a
//! named edge collection chosen by its `(parent kind, child kind, relation)`
//! triple. The triple table is closed: anything outside it is a schema
//! violation and stops the write.

mod error;
mod memory;
mod persister;
mod schema;
mod store;

pub use error::{Result, StoreError};
pub use memory::{MemoryGraphStore, StoredEdge};
pub use persister::{GraphPersister, PersistReport};
pub use schema::{node_label, CompatibilityTable, EdgeCollection, EdgeKey};
pub use store::{GraphStore, NodeProperties, StoreId, StoredNode};
