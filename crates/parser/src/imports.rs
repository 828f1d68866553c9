//! Import statement collection for the second (resolution) pass

use crate::source::{start_line, SourceFile};
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// An import statement, reduced to what the resolver needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatement {
    /// `import a.b.c` (one per imported module, aliases dropped)
    Module { module: String, line: usize },
    /// `from a.b import x, y`; names are the imported names, not their aliases
    From {
        module: String,
        names: Vec<String>,
        line: usize,
    },
    /// `from a.b import *`
    Wildcard { module: String, line: usize },
    /// `from . import x`, `from ..pkg import y`
    Relative {
        level: usize,
        module: Option<String>,
        names: Vec<String>,
        line: usize,
    },
}

impl ImportStatement {
    pub fn line(&self) -> usize {
        match self {
            Self::Module { line, .. }
            | Self::From { line, .. }
            | Self::Wildcard { line, .. }
            | Self::Relative { line, .. } => *line,
        }
    }
}

/// All import statements of a file in source order, nested ones included
pub fn collect_imports(file: &SourceFile) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    let mut stack = vec![file.root()];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => collect_plain(file, node, &mut imports),
            "import_from_statement" => {
                if let Some(import) = parse_from(file, node) {
                    imports.push(import);
                }
            }
            _ => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.named_children(&mut cursor).collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }
    imports
}

fn collect_plain(file: &SourceFile, node: Node<'_>, out: &mut Vec<ImportStatement>) {
    let line = start_line(node);
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        if let Some(module) = imported_name(file, name) {
            out.push(ImportStatement::Module { module, line });
        }
    }
}

fn parse_from(file: &SourceFile, node: Node<'_>) -> Option<ImportStatement> {
    let line = start_line(node);
    let module_node = node.child_by_field_name("module_name")?;

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        if let Some(name) = imported_name(file, name) {
            names.push(name);
        }
    }
    let mut cursor = node.walk();
    let wildcard = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");

    if module_node.kind() == "relative_import" {
        let text = file.text(module_node);
        let level = text.chars().take_while(|c| *c == '.').count();
        let rest = text[level..].trim();
        if wildcard {
            names.push("*".to_string());
        }
        return Some(ImportStatement::Relative {
            level,
            module: (!rest.is_empty()).then(|| rest.to_string()),
            names,
            line,
        });
    }

    let module = file.text(module_node).to_string();
    if wildcard {
        return Some(ImportStatement::Wildcard { module, line });
    }
    Some(ImportStatement::From {
        module,
        names,
        line,
    })
}

/// Original (un-aliased) name of an import item
fn imported_name(file: &SourceFile, node: Node<'_>) -> Option<String> {
    let target = match node.kind() {
        "aliased_import" => node.child_by_field_name("name")?,
        _ => node,
    };
    let text = file.text(target).trim();
    (!text.is_empty()).then(|| text.to_string())
}
