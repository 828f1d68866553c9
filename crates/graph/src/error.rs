use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Relationship {from} -> {to} references a missing node")]
    DanglingRelationship { from: NodeId, to: NodeId },

    #[error("Local scope {scope} of {path} has no global node")]
    UnmappedScope { path: String, scope: usize },
}
