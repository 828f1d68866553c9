use async_trait::async_trait;
use pretty_assertions::assert_eq;
use scaffold_graph::{
    enrich_hierarchy, CodeGraph, GraphBuilder, MetaInfo, NodeKind, RelationType,
};
use scaffold_parser::{extract_file, SourceLanguage};
use scaffold_store::{
    CompatibilityTable, EdgeCollection, GraphPersister, GraphStore, MemoryGraphStore, NodeProperties,
    StoreError, StoreId, StoredNode,
};
use tempfile::TempDir;

fn sample_graph() -> CodeGraph {
    let mut builder = GraphBuilder::new();
    let (_, local) = extract_file(
        SourceLanguage::Python,
        "pkg/a.py",
        "class A:\n    def m(self):\n        helper()\n\ndef helper():\n    pass\n",
    )
    .unwrap();
    builder.add_file(&local).unwrap();
    let mut graph = builder.finish();
    enrich_hierarchy(&mut graph).unwrap();
    graph
}

fn meta(name: &str) -> MetaInfo {
    MetaInfo {
        name: name.to_string(),
        path: name.to_string(),
        start_line: 0,
        end_line: 0,
        docstring: None,
    }
}

/// FOLDER -DEFINE-> CLASS is not a legal triple; a legal edge follows it.
fn graph_with_violation() -> CodeGraph {
    let mut graph = CodeGraph::new();
    let folder = graph.add_node(NodeKind::Folder, meta("pkg"));
    let class = graph.add_node(NodeKind::Class, meta("A"));
    let file = graph.add_node(NodeKind::File, meta("pkg/a.py"));
    graph.relate(folder, RelationType::Define, class).unwrap();
    graph.relate(file, RelationType::Define, class).unwrap();
    graph
}

#[tokio::test]
async fn persists_every_node_and_edge() {
    let graph = sample_graph();
    let mut store = MemoryGraphStore::new();
    let report = GraphPersister::default()
        .persist(&graph, &mut store)
        .await
        .unwrap();

    assert_eq!(report.nodes_written, graph.len());
    assert_eq!(report.edges_written, graph.relationship_count());
    assert!(report.transactional);

    assert_eq!(store.count(NodeKind::Folder).await.unwrap(), 1);
    assert_eq!(store.count(NodeKind::File).await.unwrap(), 1);
    assert_eq!(store.count(NodeKind::Class).await.unwrap(), 1);

    let class = store.find_by_name("A").await.unwrap();
    assert_eq!(class.len(), 1);
    let methods = store
        .relationships(class[0].id, EdgeCollection::DefinesFunctions)
        .await
        .unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].properties.name, "m");

    let used = store
        .relationships(methods[0].id, EdgeCollection::UsesFunctions)
        .await
        .unwrap();
    assert_eq!(used[0].properties.name, "helper");

    let folder = store.find_by_name("pkg").await.unwrap();
    let files = store
        .relationships(folder[0].id, EdgeCollection::DefinesFiles)
        .await
        .unwrap();
    assert_eq!(files[0].properties.path, "pkg/a.py");
}

#[tokio::test]
async fn schema_violation_stops_writes_and_keeps_partial_state() {
    let graph = graph_with_violation();
    let mut store = MemoryGraphStore::new().without_transactions();

    let err = GraphPersister::default()
        .persist(&graph, &mut store)
        .await
        .unwrap_err();

    match err {
        StoreError::SchemaViolation {
            parent,
            child,
            relation,
        } => {
            assert_eq!(
                (parent, child, relation),
                (NodeKind::Folder, NodeKind::Class, RelationType::Define)
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nodes went in before the edge pass; the legal edge after the violation did not.
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.edge_count(), 0);
}

#[tokio::test]
async fn schema_violation_rolls_back_inside_a_transaction() {
    let graph = graph_with_violation();
    let mut store = MemoryGraphStore::new();

    let err = GraphPersister::default()
        .persist(&graph, &mut store)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SchemaViolation { .. }));
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.edge_count(), 0);
}

#[tokio::test]
async fn rerunning_without_clear_duplicates_nodes() {
    let graph = sample_graph();
    let mut store = MemoryGraphStore::new();
    let persister = GraphPersister::new(CompatibilityTable::standard());

    persister.persist(&graph, &mut store).await.unwrap();
    persister.persist(&graph, &mut store).await.unwrap();
    assert_eq!(store.node_count(), graph.len() * 2);

    store.clear().await.unwrap();
    persister.persist(&graph, &mut store).await.unwrap();
    assert_eq!(store.node_count(), graph.len());
}

#[tokio::test]
async fn file_backed_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".scaffold").join("graph.json");
    let graph = sample_graph();

    let mut store = MemoryGraphStore::open(&path).await.unwrap();
    GraphPersister::default()
        .persist(&graph, &mut store)
        .await
        .unwrap();
    store.flush().await.unwrap();
    assert!(path.exists());

    let reopened = MemoryGraphStore::open(&path).await.unwrap();
    assert_eq!(reopened.node_count(), graph.len());
    assert_eq!(reopened.edge_count(), graph.relationship_count());
    assert_eq!(
        reopened.count(NodeKind::Function).await.unwrap(),
        store.count(NodeKind::Function).await.unwrap()
    );
}

#[tokio::test]
async fn replace_swaps_contents_and_rolls_back_on_violation() {
    let graph = sample_graph();
    let mut store = MemoryGraphStore::new();
    let persister = GraphPersister::default();

    persister.persist(&graph, &mut store).await.unwrap();
    persister.replace(&graph, &mut store).await.unwrap();
    assert_eq!(store.node_count(), graph.len());

    let err = persister
        .replace(&graph_with_violation(), &mut store)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SchemaViolation { .. }));
    // The cleared contents came back with the rollback.
    assert_eq!(store.node_count(), graph.len());
    assert_eq!(store.edge_count(), graph.relationship_count());
}

/// Transactional store whose rollback always fails
struct BrokenRollback(MemoryGraphStore);

#[async_trait]
impl GraphStore for BrokenRollback {
    async fn create_node(
        &mut self,
        kind: NodeKind,
        properties: NodeProperties,
    ) -> scaffold_store::Result<StoreId> {
        self.0.create_node(kind, properties).await
    }

    async fn connect(
        &mut self,
        from: StoreId,
        to: StoreId,
        collection: EdgeCollection,
    ) -> scaffold_store::Result<()> {
        self.0.connect(from, to, collection).await
    }

    async fn clear(&mut self) -> scaffold_store::Result<()> {
        self.0.clear().await
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn begin(&mut self) -> scaffold_store::Result<()> {
        self.0.begin().await
    }

    async fn commit(&mut self) -> scaffold_store::Result<()> {
        self.0.commit().await
    }

    async fn rollback(&mut self) -> scaffold_store::Result<()> {
        Err(StoreError::Transaction("connection lost".into()))
    }

    async fn count(&self, kind: NodeKind) -> scaffold_store::Result<usize> {
        self.0.count(kind).await
    }

    async fn find_by_name(&self, name: &str) -> scaffold_store::Result<Vec<StoredNode>> {
        self.0.find_by_name(name).await
    }

    async fn relationships(
        &self,
        node: StoreId,
        collection: EdgeCollection,
    ) -> scaffold_store::Result<Vec<StoredNode>> {
        self.0.relationships(node, collection).await
    }
}

#[tokio::test]
async fn failed_rollback_still_reports_the_schema_violation() {
    let mut store = BrokenRollback(MemoryGraphStore::new());
    let err = GraphPersister::default()
        .persist(&graph_with_violation(), &mut store)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            StoreError::SchemaViolation {
                parent: NodeKind::Folder,
                child: NodeKind::Class,
                relation: RelationType::Define,
            }
        ),
        "unexpected error: {err}"
    );
}
