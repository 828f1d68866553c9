use crate::store::StoreId;
use scaffold_graph::{GraphError, NodeKind, RelationType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No edge collection for {parent} -[{relation}]-> {child}")]
    SchemaViolation {
        parent: NodeKind,
        child: NodeKind,
        relation: RelationType,
    },

    #[error("Compatibility table is incomplete: {0}")]
    IncompleteSchema(String),

    #[error("Unknown store node: {0}")]
    UnknownNode(StoreId),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
