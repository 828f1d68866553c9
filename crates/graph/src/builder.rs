use crate::error::{GraphError, Result};
use crate::types::{CodeGraph, MetaInfo, NodeId, NodeKind};
use scaffold_parser::{FileGraph, ScopeId, ROOT_SCOPE};
use std::collections::HashMap;

/// Local scope id -> global node id, for one file
#[derive(Debug, Clone, Default)]
pub struct FileMapping {
    local_to_global: HashMap<ScopeId, NodeId>,
}

impl FileMapping {
    fn insert(&mut self, local: ScopeId, global: NodeId) {
        self.local_to_global.insert(local, global);
    }

    #[must_use]
    pub fn file_node(&self) -> Option<NodeId> {
        self.global(ROOT_SCOPE)
    }

    #[must_use]
    pub fn global(&self, local: ScopeId) -> Option<NodeId> {
        self.local_to_global.get(&local).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.local_to_global.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }
}

/// Merges per-file local graphs into one global [`CodeGraph`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: CodeGraph,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file: its FILE node, a node per local element, then the
    /// translated DEFINE/USE edges, each attached to its parent's node.
    ///
    /// The FILE node is named by its root-relative path, so two `__init__.py`
    /// files stay distinguishable by name.
    pub fn add_file(&mut self, file: &FileGraph) -> Result<FileMapping> {
        let path = file.path().to_string();

        let mut mapping = FileMapping::default();
        let file_node = self.graph.add_node(
            NodeKind::File,
            MetaInfo {
                name: path.clone(),
                path: path.clone(),
                start_line: 1,
                end_line: file.line_count(),
                docstring: file.docstring().map(str::to_string),
            },
        );
        mapping.insert(ROOT_SCOPE, file_node);

        for (local, element) in file.elements() {
            let node = self.graph.add_node(
                element.kind.into(),
                MetaInfo {
                    name: element.name.clone(),
                    path: path.clone(),
                    start_line: element.start_line,
                    end_line: element.end_line,
                    docstring: element.docstring.clone(),
                },
            );
            mapping.insert(local, node);
        }

        for relation in file.relations() {
            let parent = mapping
                .global(relation.parent)
                .ok_or_else(|| GraphError::UnmappedScope {
                    path: path.clone(),
                    scope: relation.parent,
                })?;
            let child = mapping
                .global(relation.child)
                .ok_or_else(|| GraphError::UnmappedScope {
                    path: path.clone(),
                    scope: relation.child,
                })?;
            self.graph.relate(parent, relation.kind.into(), child)?;
        }

        log::debug!(
            "{path}: {} nodes, FILE node {file_node}",
            mapping.len()
        );
        Ok(mapping)
    }

    #[must_use]
    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    #[must_use]
    pub fn finish(self) -> CodeGraph {
        self.graph
    }
}
