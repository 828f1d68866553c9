use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] scaffold_parser::ParseError),

    #[error("Graph error: {0}")]
    GraphError(#[from] scaffold_graph::GraphError),

    #[error("Store error: {0}")]
    StoreError(#[from] scaffold_store::StoreError),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Watcher error: {0}")]
    WatcherError(#[from] notify::Error),

    #[error("An indexing run is already in progress")]
    RunInProgress,

    #[error("{0}")]
    Other(String),
}
