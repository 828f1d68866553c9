use crate::error::Result;
use crate::types::{CodeGraph, MetaInfo, NodeId, NodeKind, RelationType};
use std::collections::HashMap;

/// Outcome of one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchySummary {
    pub folders_created: usize,
    pub edges_added: usize,
}

/// Directory prefixes of a `/`-separated path, longest first.
///
/// `a/b/c.py` yields `a/b`, then `a`.
pub fn directory_prefixes(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .rev()
        .map(|k| segments[..k].join("/"))
        .collect()
}

/// Synthesize FOLDER nodes so every FILE hangs off a DEFINE chain of folders.
///
/// A folder's name and path are both the full directory prefix, so reuse by
/// name never merges two different directories. Running it again over the
/// same graph creates nothing new.
pub fn enrich_hierarchy(graph: &mut CodeGraph) -> Result<HierarchySummary> {
    let mut folders: HashMap<String, NodeId> = graph
        .nodes_of_kind(NodeKind::Folder)
        .map(|(id, node)| (node.meta.name.clone(), id))
        .collect();
    let files: Vec<(NodeId, String)> = graph
        .nodes_of_kind(NodeKind::File)
        .map(|(id, node)| (id, node.meta.path.clone()))
        .collect();

    let mut summary = HierarchySummary::default();
    for (file, path) in files {
        let mut child = file;
        for prefix in directory_prefixes(&path) {
            let folder = match folders.get(&prefix) {
                Some(existing) => *existing,
                None => {
                    let id = graph.add_node(
                        NodeKind::Folder,
                        MetaInfo {
                            name: prefix.clone(),
                            path: prefix.clone(),
                            start_line: 0,
                            end_line: 0,
                            docstring: None,
                        },
                    );
                    folders.insert(prefix, id);
                    summary.folders_created += 1;
                    id
                }
            };
            if graph.relate(folder, RelationType::Define, child)? {
                summary.edges_added += 1;
            }
            child = folder;
        }
    }

    log::debug!(
        "hierarchy: {} folders created, {} edges added",
        summary.folders_created,
        summary.edges_added
    );
    Ok(summary)
}
