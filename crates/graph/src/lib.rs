//! # Scaffold Graph
//!
//! The global code graph of one indexing run.
//!
//! ```text
//! FileGraph[] (per-file, scope-id keyed)
//!     │
//!     ├──> GraphBuilder        FILE nodes + declarations, DEFINE/USE edges
//!     │
//!     ├──> ImportResolver      IMPORT edges (needs every FILE node first)
//!     │
//!     └──> enrich_hierarchy    FOLDER nodes, DEFINE chains down to files
//! ```
//!
//! Node ids are sequential from 1 and only meaningful within one run.

mod builder;
mod error;
mod graph;
mod hierarchy;
mod resolver;
mod types;

pub use builder::{FileMapping, GraphBuilder};
pub use error::{GraphError, Result};
pub use graph::GraphView;
pub use hierarchy::{directory_prefixes, enrich_hierarchy, HierarchySummary};
pub use resolver::ImportResolver;
pub use types::{CodeGraph, MetaInfo, Node, NodeId, NodeKind, RelationType, Relationship};
