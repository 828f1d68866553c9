use crate::error::{Result, StoreError};
use crate::schema::EdgeCollection;
use async_trait::async_trait;
use scaffold_graph::{MetaInfo, NodeKind};
use serde::{Deserialize, Serialize};

/// Store-local node id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub u64);

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Properties written for every node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperties {
    pub name: String,
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub docstring: Option<String>,
}

impl From<&MetaInfo> for NodeProperties {
    fn from(meta: &MetaInfo) -> Self {
        Self {
            name: meta.name.clone(),
            path: meta.path.clone(),
            start_line: meta.start_line,
            end_line: meta.end_line,
            docstring: meta.docstring.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub id: StoreId,
    pub kind: NodeKind,
    pub properties: NodeProperties,
}

/// Property-graph store the persister writes into and the CLI reads from
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create-only: an identical node created twice exists twice
    async fn create_node(&mut self, kind: NodeKind, properties: NodeProperties) -> Result<StoreId>;

    /// Connect `from` to `to` in `collection`; connecting twice is a no-op
    async fn connect(&mut self, from: StoreId, to: StoreId, collection: EdgeCollection)
        -> Result<()>;

    /// Drop every node and edge
    async fn clear(&mut self) -> Result<()>;

    fn supports_transactions(&self) -> bool {
        false
    }

    async fn begin(&mut self) -> Result<()> {
        Err(StoreError::Transaction(
            "store does not support transactions".into(),
        ))
    }

    async fn commit(&mut self) -> Result<()> {
        Err(StoreError::Transaction(
            "store does not support transactions".into(),
        ))
    }

    async fn rollback(&mut self) -> Result<()> {
        Err(StoreError::Transaction(
            "store does not support transactions".into(),
        ))
    }

    /// Make writes durable, where the store has a backing medium
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn count(&self, kind: NodeKind) -> Result<usize>;

    /// Nodes of any kind with this name, in creation order
    async fn find_by_name(&self, name: &str) -> Result<Vec<StoredNode>>;

    /// Targets of `node`'s edges in `collection`
    async fn relationships(
        &self,
        node: StoreId,
        collection: EdgeCollection,
    ) -> Result<Vec<StoredNode>>;
}
