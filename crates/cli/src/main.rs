//! scaffold: build, watch and inspect the code graph of a project.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scaffold_indexer::IndexerConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "scaffold", about = "Code graph extraction and incremental indexing")]
#[command(version, propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to <project>/scaffold.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the watcher debounce window
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and write it to the store
    Index {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Replace the store contents instead of appending
        #[arg(long)]
        clear: bool,
    },

    /// Index once, then re-index on file changes until Ctrl-C
    Watch {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Print the folder/file/declaration hierarchy without persisting
    Tree {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Show stored nodes with this name and their relationships
    Show {
        /// Entity name
        name: String,

        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Node counts per label in the store
    Stats {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Index { ref path, clear } => {
            let root = project_root(path.as_deref())?;
            let config = load_config(&cli, &root)?;
            commands::index(&root, config, clear, cli.json).await
        }
        Commands::Watch { ref path } => {
            let root = project_root(path.as_deref())?;
            let config = load_config(&cli, &root)?;
            commands::watch(&root, config, cli.json).await
        }
        Commands::Tree { ref path } => {
            let root = project_root(path.as_deref())?;
            let config = load_config(&cli, &root)?;
            commands::tree(&root, config, cli.json).await
        }
        Commands::Show { ref name, ref path } => {
            let root = project_root(path.as_deref())?;
            let config = load_config(&cli, &root)?;
            commands::show(&root, config, name, cli.json).await
        }
        Commands::Stats { ref path } => {
            let root = project_root(path.as_deref())?;
            let config = load_config(&cli, &root)?;
            commands::stats(&root, config, cli.json).await
        }
    }
}

fn project_root(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().context("failed to read current directory"),
    }
}

fn load_config(cli: &Cli, root: &Path) -> Result<IndexerConfig> {
    let mut config = match &cli.config {
        Some(file) => IndexerConfig::load(file)
            .with_context(|| format!("failed to load {}", file.display()))?,
        None => IndexerConfig::discover(root)?,
    };
    if let Some(debounce_ms) = cli.debounce_ms {
        config.debounce_ms = debounce_ms;
        config.validate()?;
    }
    Ok(config)
}
