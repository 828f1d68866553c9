use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::scanner::FileScanner;
use crate::stats::IndexStats;
use scaffold_graph::{enrich_hierarchy, CodeGraph, GraphBuilder, ImportResolver, NodeId};
use scaffold_parser::{collect_imports, extract_file, SourceFile, SourceLanguage};
use scaffold_store::{CompatibilityTable, GraphPersister, GraphStore, MemoryGraphStore};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};

/// Runs the extraction, resolution, enrichment and persistence pipeline over
/// one project root.
///
/// Runs are serialized: [`index`](Self::index) waits for an active run to
/// finish, [`try_index`](Self::try_index) gives up with
/// [`IndexerError::RunInProgress`].
pub struct ProjectIndexer<S = MemoryGraphStore> {
    root: PathBuf,
    config: IndexerConfig,
    language: SourceLanguage,
    persister: GraphPersister,
    store: Mutex<S>,
    run_lock: Mutex<()>,
}

impl ProjectIndexer<MemoryGraphStore> {
    /// Indexer backed by the JSON store under the project's state directory
    pub async fn open(root: impl AsRef<Path>, config: IndexerConfig) -> Result<Self> {
        let root = project_root(root.as_ref())?;
        let store = MemoryGraphStore::open(config.store_path(&root)).await?;
        Self::with_store(root, config, store)
    }
}

impl<S: GraphStore> ProjectIndexer<S> {
    pub fn with_store(root: impl AsRef<Path>, config: IndexerConfig, store: S) -> Result<Self> {
        let root = project_root(root.as_ref())?;
        config.validate()?;
        let language = config.source_language()?;

        let table = CompatibilityTable::standard();
        table.verify()?;

        Ok(Self {
            root,
            config,
            language,
            persister: GraphPersister::new(table),
            store: Mutex::new(store),
            run_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    #[must_use]
    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Whether a run currently holds the run lock
    pub fn is_indexing(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Exclusive access to the store, e.g. for read queries
    pub async fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().await
    }

    /// Index the project, appending to whatever the store already holds
    pub async fn index(&self) -> Result<IndexStats> {
        let _run = self.run_lock.lock().await;
        self.run(false).await
    }

    /// Index the project unless another run is active
    pub async fn try_index(&self) -> Result<IndexStats> {
        let Ok(_run) = self.run_lock.try_lock() else {
            log::info!("Indexing already in progress, dropping trigger");
            return Err(IndexerError::RunInProgress);
        };
        self.run(false).await
    }

    /// Index the project and replace the store contents with the new graph
    pub async fn index_with_clear(&self) -> Result<IndexStats> {
        let _run = self.run_lock.lock().await;
        self.run(true).await
    }

    pub async fn clear_store(&self) -> Result<()> {
        let _run = self.run_lock.lock().await;
        let mut store = self.store.lock().await;
        store.clear().await?;
        store.flush().await?;
        Ok(())
    }

    async fn run(&self, replace: bool) -> Result<IndexStats> {
        let start = Instant::now();
        log::info!("Indexing project at {}", self.root.display());

        let (graph, mut stats) = self.build_graph().await?;

        let mut store = self.store.lock().await;
        let persisted = if replace {
            self.persister.replace(&graph, &mut *store).await
        } else {
            self.persister.persist(&graph, &mut *store).await
        };
        // Flush even after a failed write so the medium matches memory.
        let flushed = store.flush().await;
        let report = persisted?;
        flushed?;

        stats.nodes_persisted = report.nodes_written;
        stats.edges_persisted = report.edges_written;
        stats.time_ms = elapsed_ms(start);
        log::info!(
            "Indexing completed in {} ms: {} files, {} nodes, {} relationships, {} errors",
            stats.time_ms,
            stats.files,
            stats.total_nodes(),
            stats.relationships,
            stats.errors.len()
        );
        Ok(stats)
    }

    /// Extract, resolve and enrich without touching the store.
    ///
    /// File-level faults are recorded in the returned stats and the file is
    /// left out. Faults in the extractor's own bookkeeping abort the run.
    pub async fn build_graph(&self) -> Result<(CodeGraph, IndexStats)> {
        let start = Instant::now();
        let mut stats = IndexStats::new();

        let scanner = FileScanner::new(
            &self.root,
            self.language,
            &self.config.state_dir,
            &self.config.ignore_file,
        );
        let files = scanner.scan();

        let reads = self.read_files_parallel(&files).await;

        // Pass 1: per-file extraction
        let mut builder = GraphBuilder::new();
        let mut sources: Vec<(NodeId, SourceFile)> = Vec::with_capacity(reads.len());
        for read in reads {
            let (relative_path, content) = match read {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("Failed to read file: {e}");
                    stats.add_error(e);
                    continue;
                }
            };
            match extract_file(self.language, relative_path.clone(), content) {
                Ok((source, local)) => {
                    let mapping = builder.add_file(&local)?;
                    stats.add_file(local.line_count());
                    if let Some(file_node) = mapping.file_node() {
                        sources.push((file_node, source));
                    }
                }
                Err(e) if e.is_internal() => return Err(e.into()),
                Err(e) => {
                    log::warn!("Failed to process {relative_path}: {e}");
                    stats.add_error(format!("{relative_path}: {e}"));
                }
            }
        }

        // Pass 2 needs every FILE node in place.
        let mut graph = builder.finish();
        let resolver = ImportResolver::new(self.language);
        for (file_node, source) in &sources {
            let imports = collect_imports(source);
            stats.imports_resolved += resolver.resolve_file(&mut graph, *file_node, &imports)?;
        }

        let summary = enrich_hierarchy(&mut graph)?;
        graph.validate()?;

        stats.folders_created = summary.folders_created;
        stats.nodes = graph.count_by_kind();
        stats.relationships = graph.relationship_count();
        stats.time_ms = elapsed_ms(start);
        log::debug!(
            "Built graph of {} nodes from {} files",
            graph.len(),
            stats.files
        );
        Ok((graph, stats))
    }

    /// Read files concurrently; results keep the order of `files`
    async fn read_files_parallel(
        &self,
        files: &[PathBuf],
    ) -> Vec<std::result::Result<(String, String), String>> {
        const MAX_CONCURRENT: usize = 16;

        let mut aggregated = Vec::with_capacity(files.len());
        for file_chunk in files.chunks(MAX_CONCURRENT) {
            let mut tasks = Vec::with_capacity(file_chunk.len());
            for file_path in file_chunk {
                let file_path = file_path.clone();
                tasks.push(tokio::spawn(async move {
                    let content = tokio::fs::read_to_string(&file_path).await;
                    (file_path, content)
                }));
            }

            for task in tasks {
                match task.await {
                    Ok((file_path, Ok(content))) => {
                        aggregated.push(Ok((self.normalize_path(&file_path), content)));
                    }
                    Ok((file_path, Err(e))) => {
                        aggregated.push(Err(format!("{}: {e}", self.normalize_path(&file_path))));
                    }
                    Err(e) => aggregated.push(Err(format!("Task panicked: {e}"))),
                }
            }
        }
        aggregated
    }

    /// Root-relative path with `/` separators
    pub fn normalize_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let mut normalized = relative.to_string_lossy().to_string();
        if normalized.contains('\\') {
            normalized = normalized.replace('\\', "/");
        }
        normalized
    }
}

fn project_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(IndexerError::InvalidPath(format!(
            "Path is not a directory: {}",
            root.display()
        )));
    }
    Ok(root.canonicalize()?)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis())
        .unwrap_or(u64::MAX)
        .max(1)
}
