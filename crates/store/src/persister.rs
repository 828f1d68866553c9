use crate::error::Result;
use crate::schema::CompatibilityTable;
use crate::store::{GraphStore, NodeProperties, StoreId};
use scaffold_graph::{CodeGraph, GraphError, NodeId};
use std::collections::HashMap;
use std::time::Instant;

/// What one persistence call wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub nodes_written: usize,
    pub edges_written: usize,
    pub transactional: bool,
    pub time_ms: u64,
}

/// Projects a [`CodeGraph`] onto a [`GraphStore`] through the compatibility table
#[derive(Debug, Clone)]
pub struct GraphPersister {
    table: CompatibilityTable,
}

impl GraphPersister {
    #[must_use]
    pub fn new(table: CompatibilityTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &CompatibilityTable {
        &self.table
    }

    /// Write every node, then every relationship.
    ///
    /// A relationship whose kind triple is missing from the table stops the
    /// call. Inside a transaction the store is rolled back; without one the
    /// writes made so far stay.
    pub async fn persist<S>(&self, graph: &CodeGraph, store: &mut S) -> Result<PersistReport>
    where
        S: GraphStore + ?Sized,
    {
        self.write(graph, store, false).await
    }

    /// Like [`persist`](Self::persist), but clears the store first.
    ///
    /// The clear happens inside the same transaction as the writes, so a
    /// failed run on a transactional store leaves the previous graph intact.
    pub async fn replace<S>(&self, graph: &CodeGraph, store: &mut S) -> Result<PersistReport>
    where
        S: GraphStore + ?Sized,
    {
        self.write(graph, store, true).await
    }

    async fn write<S>(&self, graph: &CodeGraph, store: &mut S, clear: bool) -> Result<PersistReport>
    where
        S: GraphStore + ?Sized,
    {
        graph.validate()?;
        let start = Instant::now();
        let transactional = store.supports_transactions();
        if transactional {
            store.begin().await?;
        }

        let mut report = PersistReport {
            transactional,
            ..PersistReport::default()
        };
        let written = async {
            if clear {
                store.clear().await?;
            }
            self.write_all(graph, store, &mut report).await
        }
        .await;
        match written {
            Ok(()) => {
                if transactional {
                    store.commit().await?;
                }
            }
            Err(err) => {
                if transactional {
                    log::warn!("persist failed, rolling back: {err}");
                    if let Err(rollback_err) = store.rollback().await {
                        log::error!("rollback after failed persist also failed: {rollback_err}");
                    }
                    report.nodes_written = 0;
                    report.edges_written = 0;
                } else {
                    log::error!(
                        "persist failed after {} nodes and {} edges: {err}",
                        report.nodes_written,
                        report.edges_written
                    );
                }
                return Err(err);
            }
        }

        report.time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "persisted {} nodes, {} edges in {} ms",
            report.nodes_written,
            report.edges_written,
            report.time_ms
        );
        Ok(report)
    }

    async fn write_all<S>(
        &self,
        graph: &CodeGraph,
        store: &mut S,
        report: &mut PersistReport,
    ) -> Result<()>
    where
        S: GraphStore + ?Sized,
    {
        let mut ids: HashMap<NodeId, StoreId> = HashMap::with_capacity(graph.len());
        for (id, node) in graph.nodes() {
            let store_id = store
                .create_node(node.kind, NodeProperties::from(&node.meta))
                .await?;
            ids.insert(id, store_id);
            report.nodes_written += 1;
        }

        for rel in graph.relationships() {
            let (Some(parent), Some(child)) = (graph.kind_of(rel.source), graph.kind_of(rel.target))
            else {
                return Err(GraphError::DanglingRelationship {
                    from: rel.source,
                    to: rel.target,
                }
                .into());
            };
            let collection = self
                .table
                .collection_for(parent, child, rel.relation_type)?;
            let (Some(&from), Some(&to)) = (ids.get(&rel.source), ids.get(&rel.target)) else {
                return Err(GraphError::DanglingRelationship {
                    from: rel.source,
                    to: rel.target,
                }
                .into());
            };
            store.connect(from, to, collection).await?;
            report.edges_written += 1;
        }
        Ok(())
    }
}

impl Default for GraphPersister {
    fn default() -> Self {
        Self::new(CompatibilityTable::standard())
    }
}
