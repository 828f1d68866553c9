use scaffold_graph::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Source files that contributed nodes
    pub files: usize,
    pub lines: usize,
    pub nodes: BTreeMap<NodeKind, usize>,
    pub relationships: usize,
    /// IMPORT edges added by the resolver
    pub imports_resolved: usize,
    pub folders_created: usize,
    /// Nodes written to the store; zero for graph-only builds
    pub nodes_persisted: usize,
    pub edges_persisted: usize,
    /// File-level faults as `"<path>: <message>"`
    pub errors: Vec<String>,
    pub time_ms: u64,
}

impl IndexStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, lines: usize) {
        self.files += 1;
        self.lines += lines;
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    #[must_use]
    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.nodes.values().sum()
    }
}
