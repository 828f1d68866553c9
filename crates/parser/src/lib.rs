//! # Scaffold Parser
//!
//! Per-file syntax analysis for the code graph.
//!
//! ```text
//! source text
//!     │
//!     ├──> SourceFile (tree-sitter parse, syntax check)
//!     │
//!     ├──> EntityExtractor (pass 1)
//!     │      ├─ declarations with DEFINE edges to their lexical parent
//!     │      └─ call-sites with USE edges, resolved outward through the scope chain
//!     │      => FileGraph keyed by ScopeTable ids
//!     │
//!     └──> collect_imports (pass 2 input)
//! ```

mod error;
mod extractor;
mod imports;
mod language;
mod local_graph;
mod scope;
mod source;

pub use error::{ParseError, Result};
pub use extractor::{clean_docstring, docstring_of, EntityExtractor};
pub use imports::{collect_imports, ImportStatement};
pub use language::SourceLanguage;
pub use local_graph::{CodeElement, ElementKind, FileGraph, LocalRelation, LocalRelationKind};
pub use scope::{scope_path, ScopeId, ScopeTable, ROOT_SCOPE};
pub use source::{end_line, start_line, SourceFile};

/// Parse and extract one file in a single step
pub fn extract_file(
    language: SourceLanguage,
    path: impl Into<String>,
    content: impl Into<String>,
) -> Result<(SourceFile, FileGraph)> {
    let file = SourceFile::parse(language, path, content)?;
    let graph = EntityExtractor::extract(&file)?;
    Ok((file, graph))
}
