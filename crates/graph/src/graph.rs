use crate::error::{GraphError, Result};
use crate::types::{CodeGraph, NodeId, NodeKind, RelationType};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Read-only petgraph projection of a [`CodeGraph`], with reverse lookups the
/// owner-keyed relationship lists cannot answer directly
pub struct GraphView<'a> {
    graph: &'a CodeGraph,
    inner: DiGraph<NodeId, RelationType>,
    index: HashMap<NodeId, NodeIndex>,
}

impl CodeGraph {
    /// Build a traversal view; dangling relationships are rejected
    pub fn view(&self) -> Result<GraphView<'_>> {
        self.validate()?;
        let mut inner = DiGraph::with_capacity(self.len(), self.relationship_count());
        let mut index = HashMap::with_capacity(self.len());
        for (id, _) in self.nodes() {
            index.insert(id, inner.add_node(id));
        }
        for rel in self.relationships() {
            let (Some(&from), Some(&to)) = (index.get(&rel.source), index.get(&rel.target)) else {
                return Err(GraphError::DanglingRelationship {
                    from: rel.source,
                    to: rel.target,
                });
            };
            inner.add_edge(from, to, rel.relation_type);
        }
        Ok(GraphView {
            graph: self,
            inner,
            index,
        })
    }
}

impl GraphView<'_> {
    /// Outgoing edges of one type (`None` for any), in insertion order
    #[must_use]
    pub fn children(&self, node: NodeId, relation: Option<RelationType>) -> Vec<NodeId> {
        self.neighbors(node, relation, Direction::Outgoing)
    }

    /// Incoming edges of one type (`None` for any)
    #[must_use]
    pub fn parents(&self, node: NodeId, relation: Option<RelationType>) -> Vec<NodeId> {
        self.neighbors(node, relation, Direction::Incoming)
    }

    /// Folders and files nothing DEFINEs: top-level folders, and files at
    /// the root. Call-site placeholders are never roots.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Folder | NodeKind::File))
            .map(|(id, _)| id)
            .filter(|id| self.parents(*id, Some(RelationType::Define)).is_empty())
            .collect()
    }

    /// Depth-first walk of the DEFINE tree under `root`, with depth
    #[must_use]
    pub fn define_tree(&self, root: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(root, 0)];
        while let Some((node, depth)) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            out.push((node, depth));
            let children = self.children(node, Some(RelationType::Define));
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        out
    }

    fn neighbors(
        &self,
        node: NodeId,
        relation: Option<RelationType>,
        direction: Direction,
    ) -> Vec<NodeId> {
        let Some(&idx) = self.index.get(&node) else {
            return Vec::new();
        };
        let mut found: Vec<(petgraph::graph::EdgeIndex, NodeId)> = self
            .inner
            .edges_directed(idx, direction)
            .filter(|e| relation.map_or(true, |rel| *e.weight() == rel))
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), self.inner[other])
            })
            .collect();
        // petgraph yields the newest edge first; restore insertion order.
        found.sort_by_key(|(edge, _)| *edge);
        found.into_iter().map(|(_, id)| id).collect()
    }
}
