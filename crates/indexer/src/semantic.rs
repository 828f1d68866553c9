use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// External chunk/embedding index kept in step with the file tree.
///
/// The change watcher drops deleted paths and re-adds created or modified
/// ones before it triggers a structural reindex.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Remove every chunk whose source path equals `path`
    async fn remove_path(&self, path: &Path) -> Result<()>;

    /// Chunk the file at `path` and add it
    async fn add_file(&self, path: &Path) -> Result<()>;
}

/// Semantic index that only logs the calls it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSemanticIndex;

#[async_trait]
impl SemanticIndex for NullSemanticIndex {
    async fn remove_path(&self, path: &Path) -> Result<()> {
        log::debug!("semantic index: drop {}", path.display());
        Ok(())
    }

    async fn add_file(&self, path: &Path) -> Result<()> {
        log::debug!("semantic index: add {}", path.display());
        Ok(())
    }
}
