use crate::error::{GraphError, Result};
use scaffold_parser::{ElementKind, LocalRelationKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Process-local node identity, sequential from 1 within one run
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Folder,
    File,
    Class,
    Function,
}

impl NodeKind {
    pub const ALL: [Self; 4] = [Self::Folder, Self::File, Self::Class, Self::Function];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "FOLDER",
            Self::File => "FILE",
            Self::Class => "CLASS",
            Self::Function => "FUNCTION",
        }
    }
}

impl From<ElementKind> for NodeKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Class => Self::Class,
            ElementKind::Function => Self::Function,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationType {
    Define,
    Use,
    Import,
}

impl RelationType {
    pub const ALL: [Self; 3] = [Self::Define, Self::Use, Self::Import];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Define => "DEFINE",
            Self::Use => "USE",
            Self::Import => "IMPORT",
        }
    }
}

impl From<LocalRelationKind> for RelationType {
    fn from(kind: LocalRelationKind) -> Self {
        match kind {
            LocalRelationKind::Define => Self::Define,
            LocalRelationKind::Use => Self::Use,
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub name: String,
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub docstring: Option<String>,
}

/// Directed, typed edge owned by its source node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub relation_type: RelationType,
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub meta: MetaInfo,
    pub relationships: Vec<Relationship>,
}

impl Node {
    /// Targets of outgoing edges of one type, in insertion order
    pub fn targets(&self, relation_type: RelationType) -> impl Iterator<Item = NodeId> + '_ {
        self.relationships
            .iter()
            .filter(move |rel| rel.relation_type == relation_type)
            .map(|rel| rel.target)
    }
}

/// The global graph of one indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: NodeId,
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a node under the next sequential id
    pub fn add_node(&mut self, kind: NodeKind, meta: MetaInfo) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                meta,
                relationships: Vec::new(),
            },
        );
        id
    }

    /// Append an edge to `source`'s relationship list.
    ///
    /// An identical edge already owned by `source` is not added twice; the
    /// return value tells whether the edge is new.
    pub fn relate(
        &mut self,
        source: NodeId,
        relation_type: RelationType,
        target: NodeId,
    ) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(&source)
            .ok_or(GraphError::NodeNotFound(source))?;
        let relationship = Relationship {
            relation_type,
            source,
            target,
        };
        if node.relationships.contains(&relationship) {
            return Ok(false);
        }
        node.relationships.push(relationship);
        Ok(true)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|node| node.kind)
    }

    /// Nodes in id (creation) order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Every relationship, grouped by source in id order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.nodes.values().flat_map(|node| node.relationships.iter())
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes().filter(move |(_, node)| node.kind == kind)
    }

    /// Nodes whose name matches, any kind
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (NodeId, &'a Node)> {
        self.nodes().filter(move |(_, node)| node.meta.name == name)
    }

    /// FILE node with exactly this root-relative path
    #[must_use]
    pub fn file_by_path(&self, path: &str) -> Option<NodeId> {
        self.nodes_of_kind(NodeKind::File)
            .find(|(_, node)| node.meta.path == path)
            .map(|(id, _)| id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.nodes.values().map(|node| node.relationships.len()).sum()
    }

    #[must_use]
    pub fn count_by_kind(&self) -> BTreeMap<NodeKind, usize> {
        let mut counts: BTreeMap<NodeKind, usize> =
            NodeKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        for node in self.nodes.values() {
            *counts.entry(node.kind).or_default() += 1;
        }
        counts
    }

    /// Reject relationships whose endpoints are not nodes of this graph
    pub fn validate(&self) -> Result<()> {
        for rel in self.relationships() {
            if !self.nodes.contains_key(&rel.source) || !self.nodes.contains_key(&rel.target) {
                return Err(GraphError::DanglingRelationship {
                    from: rel.source,
                    to: rel.target,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> MetaInfo {
        MetaInfo {
            name: name.to_string(),
            path: "a.py".to_string(),
            start_line: 1,
            end_line: 1,
            docstring: None,
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut graph = CodeGraph::new();
        assert_eq!(graph.add_node(NodeKind::File, meta("a.py")), 1);
        assert_eq!(graph.add_node(NodeKind::Class, meta("A")), 2);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn relate_deduplicates_and_requires_source() {
        let mut graph = CodeGraph::new();
        let file = graph.add_node(NodeKind::File, meta("a.py"));
        let class = graph.add_node(NodeKind::Class, meta("A"));

        assert!(graph.relate(file, RelationType::Define, class).unwrap());
        assert!(!graph.relate(file, RelationType::Define, class).unwrap());
        assert!(graph.relate(file, RelationType::Use, class).unwrap());
        assert_eq!(graph.relationship_count(), 2);

        assert_eq!(
            graph.relate(99, RelationType::Use, class),
            Err(GraphError::NodeNotFound(99))
        );
    }

    #[test]
    fn validate_rejects_dangling_targets() {
        let mut graph = CodeGraph::new();
        let file = graph.add_node(NodeKind::File, meta("a.py"));
        assert!(graph.validate().is_ok());

        graph.relate(file, RelationType::Import, 42).unwrap();
        assert_eq!(
            graph.validate(),
            Err(GraphError::DanglingRelationship { from: file, to: 42 })
        );
    }

    #[test]
    fn count_by_kind_lists_every_kind() {
        let mut graph = CodeGraph::new();
        graph.add_node(NodeKind::Function, meta("f"));
        let counts = graph.count_by_kind();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&NodeKind::Function], 1);
        assert_eq!(counts[&NodeKind::Folder], 0);
    }
}
