//! Entity extraction: one syntax tree in, one [`FileGraph`] out.
//!
//! The walker keeps a stack of lexical frames. Declarations push a frame for
//! their body; a call on a bare name pushes a frame while its arguments are
//! visited, so calls nested in the arguments are attributed to it. A call on
//! an attribute (`obj.method()`) never pushes, since its receiver is not a
//! local lexical construct.

use crate::error::{ParseError, Result};
use crate::local_graph::{CodeElement, ElementKind, FileGraph};
use crate::scope::{ScopeId, ROOT_SCOPE};
use crate::source::{end_line, start_line, SourceFile};
use tree_sitter::Node;

struct Frame {
    name: String,
    id: ScopeId,
}

/// Walks a parsed file and collects its declarations and call-sites
pub struct EntityExtractor<'a> {
    file: &'a SourceFile,
    graph: FileGraph,
    frames: Vec<Frame>,
}

impl<'a> EntityExtractor<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        let mut graph = FileGraph::new(file.path(), file.line_count());
        graph.set_docstring(docstring_of(file, file.root()));
        Self {
            file,
            graph,
            frames: Vec::new(),
        }
    }

    /// Extract the local graph of `file`
    pub fn extract(file: &'a SourceFile) -> Result<FileGraph> {
        let mut extractor = Self::new(file);
        extractor.visit(file.root())?;
        Ok(extractor.graph)
    }

    fn current_scope(&self) -> ScopeId {
        self.frames.last().map_or(ROOT_SCOPE, |frame| frame.id)
    }

    fn frame_names(&self) -> Vec<String> {
        self.frames.iter().map(|frame| frame.name.clone()).collect()
    }

    fn visit(&mut self, node: Node<'a>) -> Result<()> {
        match node.kind() {
            "class_definition" => self.visit_declaration(node, ElementKind::Class),
            "function_definition" => self.visit_declaration(node, ElementKind::Function),
            "call" => self.visit_call(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'a>) -> Result<()> {
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_declaration(&mut self, node: Node<'a>, kind: ElementKind) -> Result<()> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.file.text(n).to_string())
            .filter(|n| !n.is_empty())
            .ok_or(ParseError::UnnamedDeclaration {
                kind: kind.as_str(),
                line: start_line(node),
            })?;
        let body = node.child_by_field_name("body");

        // Parameters, defaults, bases and annotations belong to the enclosing scope.
        let mut cursor = node.walk();
        let header: Vec<Node<'a>> = node
            .named_children(&mut cursor)
            .filter(|child| Some(*child) != body)
            .collect();
        for child in header {
            self.visit(child)?;
        }

        let mut path = self.frame_names();
        path.push(name.clone());
        let element = CodeElement {
            name: name.clone(),
            kind,
            start_line: start_line(node),
            end_line: end_line(node),
            docstring: body.and_then(|b| docstring_of(self.file, b)),
        };
        let id = self.graph.declare(&path, element)?;

        self.frames.push(Frame { name, id });
        let result = match body {
            Some(body) => self.visit_children(body),
            None => Ok(()),
        };
        self.frames.pop();
        result
    }

    fn visit_call(&mut self, node: Node<'a>) -> Result<()> {
        let line = start_line(node);
        let function = node
            .child_by_field_name("function")
            .ok_or(ParseError::UnnamedCall { line })?;
        let arguments = node.child_by_field_name("arguments");

        let (name, receiver) = match function.kind() {
            "identifier" => (self.file.text(function).to_string(), None),
            "attribute" => {
                let attr = function
                    .child_by_field_name("attribute")
                    .ok_or(ParseError::UnnamedCall { line })?;
                (
                    self.file.text(attr).to_string(),
                    function.child_by_field_name("object"),
                )
            }
            _ => return Err(ParseError::UnnamedCall { line }),
        };
        if name.is_empty() {
            return Err(ParseError::UnnamedCall { line });
        }

        let caller = self.current_scope();
        let target = self.resolve_target(&name, node);
        self.graph.add_use(caller, target);

        if function.kind() == "identifier" {
            self.frames.push(Frame { name, id: target });
            let result = match arguments {
                Some(args) => self.visit(args),
                None => Ok(()),
            };
            self.frames.pop();
            result
        } else {
            if let Some(receiver) = receiver {
                self.visit(receiver)?;
            }
            match arguments {
                Some(args) => self.visit(args),
                None => Ok(()),
            }
        }
    }

    /// Existing element visible from the current frames, else a new placeholder
    fn resolve_target(&mut self, name: &str, call: Node<'a>) -> ScopeId {
        let frames = self.frame_names();
        if let Some(found) = self.graph.find_visible(&frames, name) {
            return found;
        }

        log::debug!(
            "{}:{}: call target '{name}' not visible, adding placeholder",
            self.file.path(),
            start_line(call)
        );
        let mut path = frames;
        path.push(name.to_string());
        let placeholder = CodeElement {
            name: name.to_string(),
            kind: ElementKind::Function,
            start_line: start_line(call),
            end_line: end_line(call),
            docstring: None,
        };
        self.graph.add_placeholder(&path, placeholder)
    }
}

/// Docstring of a module or declaration body: its first statement, when that
/// statement is a bare string literal
pub fn docstring_of(file: &SourceFile, body: Node<'_>) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    Some(clean_docstring(strip_quotes(file.text(literal))))
}

fn strip_quotes(literal: &str) -> &str {
    let unprefixed = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = unprefixed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    unprefixed
}

/// Strip the common indentation of all lines after the first and drop
/// leading/trailing blank lines
pub fn clean_docstring(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            cleaned.push(line.trim());
        } else if line.trim().is_empty() {
            cleaned.push("");
        } else {
            cleaned.push(line.get(indent..).unwrap_or(line.trim_start()).trim_end());
        }
    }

    while cleaned.first().is_some_and(|line| line.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}
