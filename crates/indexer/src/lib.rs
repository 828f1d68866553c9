//! # Scaffold Indexer
//!
//! Builds the code graph of a project and keeps the store in step with it.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (.scaffoldignore aware, state dir pruned)
//!     │      └─> Source files
//!     │
//!     ├──> Entity Extractor (pass 1, per file)
//!     │      └─> GraphBuilder: FILE / CLASS / FUNCTION nodes
//!     │
//!     ├──> Import Resolver (pass 2, all FILE nodes known)
//!     │
//!     ├──> Hierarchy Enricher
//!     │      └─> FOLDER chains
//!     │
//!     └──> Graph Persister
//!            └─> Graph store
//! ```
//!
//! `StreamingIndexer` reruns the whole pipeline after a debounced burst of
//! file-system events.
//!
//! ## Example
//!
//! ```no_run
//! use scaffold_indexer::{IndexerConfig, ProjectIndexer};
//!
//! #[tokio::main]
//! async fn main() -> scaffold_indexer::Result<()> {
//!     let config = IndexerConfig::discover("/path/to/project")?;
//!     let indexer = ProjectIndexer::open("/path/to/project", config).await?;
//!     let stats = indexer.index().await?;
//!
//!     println!("Indexed {} files, {} nodes", stats.files, stats.total_nodes());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod ignore_rules;
mod pipeline;
mod scanner;
mod semantic;
mod stats;
mod watcher;

pub use config::{IndexerConfig, CONFIG_FILE_NAME};
pub use error::{IndexerError, Result};
pub use ignore_rules::IgnoreMatcher;
pub use pipeline::ProjectIndexer;
pub use scanner::FileScanner;
pub use semantic::{NullSemanticIndex, SemanticIndex};
pub use stats::IndexStats;
pub use watcher::{
    ChangeSet, FsEvent, FsEventKind, IndexUpdate, IndexerHealth, StreamingIndexer,
};
