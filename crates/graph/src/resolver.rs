use crate::error::Result;
use crate::types::{CodeGraph, NodeId, NodeKind, RelationType};
use scaffold_parser::{ImportStatement, SourceLanguage};

/// Second pass: turns import statements into IMPORT edges between existing
/// nodes. Never creates nodes; anything it cannot match is treated as an
/// external dependency and skipped.
#[derive(Debug, Clone, Copy)]
pub struct ImportResolver {
    language: SourceLanguage,
}

impl ImportResolver {
    #[must_use]
    pub fn new(language: SourceLanguage) -> Self {
        Self { language }
    }

    /// FILE node for a dotted module path.
    ///
    /// Exact path match against `a/b/c.py` then `a/b/c/__init__.py`; failing
    /// that, the first FILE node whose path contains one of them.
    #[must_use]
    pub fn resolve_module(&self, graph: &CodeGraph, module: &str) -> Option<NodeId> {
        let candidates = self.language.module_candidates(module);

        for candidate in &candidates {
            if let Some(id) = graph.file_by_path(candidate) {
                return Some(id);
            }
        }

        graph
            .nodes_of_kind(NodeKind::File)
            .find(|(_, node)| {
                candidates
                    .iter()
                    .any(|candidate| node.meta.path.contains(candidate.as_str()))
            })
            .map(|(id, _)| id)
    }

    /// Top-level declaration `name` of a FILE node, found through its DEFINE edges
    #[must_use]
    pub fn resolve_declaration(graph: &CodeGraph, file: NodeId, name: &str) -> Option<NodeId> {
        graph
            .node(file)?
            .targets(RelationType::Define)
            .find(|target| {
                graph
                    .node(*target)
                    .is_some_and(|node| node.meta.name == name)
            })
    }

    /// Add the IMPORT edges of one importing file; returns how many were new
    pub fn resolve_file(
        &self,
        graph: &mut CodeGraph,
        importer: NodeId,
        imports: &[ImportStatement],
    ) -> Result<usize> {
        let mut added = 0;
        for import in imports {
            match import {
                ImportStatement::Module { module, .. } => {
                    match self.resolve_module(graph, module) {
                        Some(target) => {
                            added +=
                                usize::from(graph.relate(importer, RelationType::Import, target)?);
                        }
                        None => Self::log_unresolved(import, module),
                    }
                }
                ImportStatement::From { module, names, .. } => {
                    let Some(file) = self.resolve_module(graph, module) else {
                        Self::log_unresolved(import, module);
                        continue;
                    };
                    for name in names {
                        if let Some(target) = Self::resolve_declaration(graph, file, name) {
                            added +=
                                usize::from(graph.relate(importer, RelationType::Import, target)?);
                        }
                    }
                }
                ImportStatement::Wildcard { module, line } => {
                    log::debug!("line {line}: wildcard import from '{module}' not resolved");
                }
                ImportStatement::Relative { level, line, .. } => {
                    log::debug!("line {line}: relative import (level {level}) not resolved");
                }
            }
        }
        Ok(added)
    }

    fn log_unresolved(import: &ImportStatement, module: &str) {
        log::debug!(
            "line {}: module '{module}' is not part of the project",
            import.line()
        );
    }
}
