use crate::error::{Result, StoreError};
use crate::schema::EdgeCollection;
use crate::store::{GraphStore, NodeProperties, StoreId, StoredNode};
use async_trait::async_trait;
use scaffold_graph::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredEdge {
    pub from: StoreId,
    pub to: StoreId,
    pub collection: EdgeCollection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    nodes: BTreeMap<StoreId, StoredNode>,
    edges: Vec<StoredEdge>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            next_id: 1,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }
}

/// In-memory property graph, optionally persisted as one JSON file.
///
/// Transactions are snapshot based: `begin` copies the current state and
/// `rollback` restores it.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    data: Snapshot,
    edge_index: HashSet<StoredEdge>,
    path: Option<PathBuf>,
    checkpoint: Option<Snapshot>,
    transactions: bool,
}

impl MemoryGraphStore {
    /// Volatile store with transaction support
    #[must_use]
    pub fn new() -> Self {
        Self {
            transactions: true,
            ..Self::default()
        }
    }

    /// Store backed by `path`; loads it when the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if tokio::fs::try_exists(&path).await? {
            let bytes = tokio::fs::read(&path).await?;
            serde_json::from_slice(&bytes)?
        } else {
            Snapshot::default()
        };

        let mut store = Self {
            data,
            path: Some(path),
            transactions: true,
            ..Self::default()
        };
        store.rebuild_index();
        log::debug!(
            "opened graph store with {} nodes, {} edges",
            store.data.nodes.len(),
            store.data.edges.len()
        );
        Ok(store)
    }

    /// Behave like a store without transactions: failed runs keep partial writes
    #[must_use]
    pub fn without_transactions(mut self) -> Self {
        self.transactions = false;
        self
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.data.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StoredNode> {
        self.data.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &StoredEdge> {
        self.data.edges.iter()
    }

    fn rebuild_index(&mut self) {
        self.edge_index = self.data.edges.iter().copied().collect();
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn create_node(&mut self, kind: NodeKind, properties: NodeProperties) -> Result<StoreId> {
        let id = StoreId(self.data.next_id);
        self.data.next_id += 1;
        self.data.nodes.insert(
            id,
            StoredNode {
                id,
                kind,
                properties,
            },
        );
        Ok(id)
    }

    async fn connect(
        &mut self,
        from: StoreId,
        to: StoreId,
        collection: EdgeCollection,
    ) -> Result<()> {
        for id in [from, to] {
            if !self.data.nodes.contains_key(&id) {
                return Err(StoreError::UnknownNode(id));
            }
        }
        let edge = StoredEdge {
            from,
            to,
            collection,
        };
        if self.edge_index.insert(edge) {
            self.data.edges.push(edge);
        }
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.data = Snapshot::default();
        self.edge_index.clear();
        Ok(())
    }

    fn supports_transactions(&self) -> bool {
        self.transactions
    }

    async fn begin(&mut self) -> Result<()> {
        if !self.transactions {
            return Err(StoreError::Transaction("transactions disabled".into()));
        }
        if self.checkpoint.is_some() {
            return Err(StoreError::Transaction("transaction already open".into()));
        }
        self.checkpoint = Some(self.data.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.checkpoint
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::Transaction("no open transaction".into()))
    }

    async fn rollback(&mut self) -> Result<()> {
        let checkpoint = self
            .checkpoint
            .take()
            .ok_or_else(|| StoreError::Transaction("no open transaction".into()))?;
        self.data = checkpoint;
        self.rebuild_index();
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&self.data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn count(&self, kind: NodeKind) -> Result<usize> {
        Ok(self.data.nodes.values().filter(|n| n.kind == kind).count())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<StoredNode>> {
        Ok(self
            .data
            .nodes
            .values()
            .filter(|n| n.properties.name == name)
            .cloned()
            .collect())
    }

    async fn relationships(
        &self,
        node: StoreId,
        collection: EdgeCollection,
    ) -> Result<Vec<StoredNode>> {
        if !self.data.nodes.contains_key(&node) {
            return Err(StoreError::UnknownNode(node));
        }
        Ok(self
            .data
            .edges
            .iter()
            .filter(|e| e.from == node && e.collection == collection)
            .filter_map(|e| self.data.nodes.get(&e.to).cloned())
            .collect())
    }
}
