use anyhow::{Context, Result};
use scaffold_graph::NodeKind;
use scaffold_indexer::{
    IndexStats, IndexUpdate, IndexerConfig, NullSemanticIndex, ProjectIndexer, StreamingIndexer,
};
use scaffold_store::{node_label, EdgeCollection, GraphStore, NodeProperties};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn index(root: &Path, config: IndexerConfig, clear: bool, json: bool) -> Result<()> {
    let indexer = ProjectIndexer::open(root, config).await?;
    let stats = if clear {
        indexer.index_with_clear().await?
    } else {
        indexer.index().await?
    };
    print_stats(&stats, json)
}

pub async fn watch(root: &Path, config: IndexerConfig, json: bool) -> Result<()> {
    let indexer = Arc::new(ProjectIndexer::open(root, config).await?);
    let stats = indexer.index_with_clear().await?;
    print_stats(&stats, json)?;

    let watcher = StreamingIndexer::start(indexer.clone(), Arc::new(NullSemanticIndex))?;
    let mut updates = watcher.subscribe_updates();
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => print_update(&update, json)?,
                Err(RecvError::Lagged(skipped)) => log::warn!("Missed {skipped} index updates"),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                log::info!("Stopping watcher");
                watcher.shutdown().await?;
                break;
            }
        }
    }
    Ok(())
}

pub async fn tree(root: &Path, config: IndexerConfig, json: bool) -> Result<()> {
    let indexer = ProjectIndexer::open(root, config).await?;
    let (graph, stats) = indexer.build_graph().await?;
    let view = graph.view()?;

    let mut rows = Vec::new();
    for root_node in view.roots() {
        for (id, depth) in view.define_tree(root_node) {
            let Some(node) = graph.node(id) else {
                continue;
            };
            rows.push(TreeRow {
                depth,
                kind: node.kind,
                name: node.meta.name.clone(),
                path: node.meta.path.clone(),
                start_line: node.meta.start_line,
                end_line: node.meta.end_line,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            let indent = "  ".repeat(row.depth);
            match row.kind {
                NodeKind::Folder => println!("{indent}{}/", row.name),
                NodeKind::File => println!("{indent}{}", row.name),
                kind => println!(
                    "{indent}{} {} [{}-{}]",
                    kind.as_str().to_lowercase(),
                    row.name,
                    row.start_line,
                    row.end_line
                ),
            }
        }
        report_errors(&stats);
    }
    Ok(())
}

pub async fn show(root: &Path, config: IndexerConfig, name: &str, json: bool) -> Result<()> {
    let indexer = ProjectIndexer::open(root, config).await?;
    let store = indexer.store().await;
    let found = store.find_by_name(name).await?;
    if found.is_empty() {
        anyhow::bail!("no node named '{name}' in the store; run `scaffold index` first");
    }

    let mut entries = Vec::with_capacity(found.len());
    for node in found {
        let mut relationships = BTreeMap::new();
        for collection in EdgeCollection::ALL {
            let targets = store.relationships(node.id, collection).await?;
            if !targets.is_empty() {
                relationships.insert(
                    collection.as_str(),
                    targets.into_iter().map(|t| t.properties).collect::<Vec<_>>(),
                );
            }
        }
        entries.push(ShowEntry {
            label: node_label(node.kind),
            node: node.properties,
            relationships,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{} {} ({}:{}-{})",
            entry.label,
            entry.node.name,
            entry.node.path,
            entry.node.start_line,
            entry.node.end_line
        );
        if let Some(doc) = &entry.node.docstring {
            for line in doc.lines() {
                println!("  | {line}");
            }
        }
        for (collection, targets) in &entry.relationships {
            for target in targets {
                println!("  {collection} -> {} ({})", target.name, target.path);
            }
        }
    }
    Ok(())
}

pub async fn stats(root: &Path, config: IndexerConfig, json: bool) -> Result<()> {
    let indexer = ProjectIndexer::open(root, config).await?;
    let store = indexer.store().await;
    let mut counts = BTreeMap::new();
    for kind in NodeKind::ALL {
        counts.insert(node_label(kind), store.count(kind).await?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        for (label, count) in &counts {
            println!("{label:<14} {count}");
        }
        println!("{:<14} {}", "edges", store.edge_count());
    }
    Ok(())
}

#[derive(Serialize)]
struct TreeRow {
    depth: usize,
    kind: NodeKind,
    name: String,
    path: String,
    start_line: usize,
    end_line: usize,
}

#[derive(Serialize)]
struct ShowEntry {
    label: &'static str,
    node: NodeProperties,
    relationships: BTreeMap<&'static str, Vec<NodeProperties>>,
}

fn print_stats(stats: &IndexStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    println!(
        "Indexed {} files ({} lines) in {} ms",
        stats.files, stats.lines, stats.time_ms
    );
    for kind in NodeKind::ALL {
        println!("  {:<14} {}", node_label(kind), stats.count(kind));
    }
    println!(
        "  {:<14} {} ({} imports resolved)",
        "relationships", stats.relationships, stats.imports_resolved
    );
    report_errors(stats);
    Ok(())
}

fn print_update(update: &IndexUpdate, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(update)?);
        return Ok(());
    }
    match (&update.stats, &update.error) {
        (Some(stats), _) => println!(
            "Re-indexed after {} created, {} deleted, {} modified: {} nodes in {} ms",
            update.created,
            update.deleted,
            update.modified,
            stats.total_nodes(),
            update.duration_ms
        ),
        (None, Some(error)) => println!("Re-index failed ({}): {error}", update.reason),
        (None, None) => println!("Re-index finished ({})", update.reason),
    }
    if let Some(stats) = &update.stats {
        report_errors(stats);
    }
    Ok(())
}

fn report_errors(stats: &IndexStats) {
    if stats.errors.is_empty() {
        return;
    }
    eprintln!("{} files could not be analyzed:", stats.errors.len());
    for error in &stats.errors {
        eprintln!("  {error}");
    }
}
