use crate::error::{ParseError, Result};
use crate::language::SourceLanguage;
use tree_sitter::{Node, Parser, Tree};

/// One parsed source file.
///
/// The tree is kept after extraction so the import pass can walk it again
/// without re-parsing.
pub struct SourceFile {
    path: String,
    language: SourceLanguage,
    content: String,
    tree: Tree,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("bytes", &self.content.len())
            .finish()
    }
}

impl SourceFile {
    /// Parse `content`; a tree containing error or missing nodes is rejected
    pub fn parse(
        language: SourceLanguage,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self> {
        let content = content.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| ParseError::Grammar(format!("Failed to set language: {e}")))?;

        let tree = parser.parse(&content, None).ok_or(ParseError::NoTree)?;
        if let Some(line) = first_error_line(tree.root_node()) {
            return Err(ParseError::Syntax { line });
        }

        Ok(Self {
            path: path.into(),
            language,
            content,
            tree,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        &self.content[node.start_byte()..node.end_byte()]
    }
}

/// 1-based first line of a node
pub fn start_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// 1-based last line of a node
pub fn end_line(node: Node<'_>) -> usize {
    node.end_position().row + 1
}

fn first_error_line(root: Node<'_>) -> Option<usize> {
    if !root.has_error() {
        return None;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(start_line(node));
        }
        if !node.has_error() {
            continue;
        }
        // Reverse so the leftmost child is examined first.
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    Some(start_line(root))
}
