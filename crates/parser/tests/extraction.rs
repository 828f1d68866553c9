use pretty_assertions::assert_eq;
use scaffold_parser::{
    extract_file, ElementKind, FileGraph, LocalRelation, LocalRelationKind, ParseError, ScopeId,
    SourceLanguage, ROOT_SCOPE,
};

fn extract(source: &str) -> FileGraph {
    let (_, graph) = extract_file(SourceLanguage::Python, "sample.py", source).expect("extract");
    graph
}

fn id(graph: &FileGraph, path: &[&str]) -> ScopeId {
    graph
        .scopes()
        .id_of(path)
        .unwrap_or_else(|| panic!("scope {path:?} not registered"))
}

fn has(graph: &FileGraph, kind: LocalRelationKind, parent: ScopeId, child: ScopeId) -> bool {
    graph.relations_of(parent).contains(&LocalRelation {
        kind,
        parent,
        child,
    })
}

const NESTED: &str = r#""""Module doc."""

def f():
    pass

class A:
    """Class doc."""

    def m(self):
        """Method doc."""
        return f()
"#;

#[test]
fn nested_declarations_hang_off_their_lexical_parent() {
    let graph = extract(NESTED);
    let f = id(&graph, &["f"]);
    let a = id(&graph, &["A"]);
    let m = id(&graph, &["A", "m"]);

    assert!(has(&graph, LocalRelationKind::Define, ROOT_SCOPE, f));
    assert!(has(&graph, LocalRelationKind::Define, ROOT_SCOPE, a));
    assert!(has(&graph, LocalRelationKind::Define, a, m));
    assert!(!has(&graph, LocalRelationKind::Define, ROOT_SCOPE, m));

    let top: Vec<&str> = graph.top_level().map(|(_, e)| e.name.as_str()).collect();
    assert_eq!(top, vec!["f", "A"]);
}

#[test]
fn records_kinds_lines_and_docstrings() {
    let graph = extract(NESTED);
    assert_eq!(graph.docstring(), Some("Module doc."));
    assert_eq!(graph.line_count(), 11);

    let a = graph.element(id(&graph, &["A"])).unwrap();
    assert_eq!(a.kind, ElementKind::Class);
    assert_eq!((a.start_line, a.end_line), (6, 11));
    assert_eq!(a.docstring.as_deref(), Some("Class doc."));

    let m = graph.element(id(&graph, &["A", "m"])).unwrap();
    assert_eq!(m.kind, ElementKind::Function);
    assert_eq!((m.start_line, m.end_line), (9, 11));
    assert_eq!(m.docstring.as_deref(), Some("Method doc."));

    let f = graph.element(id(&graph, &["f"])).unwrap();
    assert_eq!(f.docstring, None);
}

#[test]
fn call_resolves_to_visible_declaration() {
    let graph = extract(NESTED);
    let f = id(&graph, &["f"]);
    let m = id(&graph, &["A", "m"]);

    assert!(has(&graph, LocalRelationKind::Use, m, f));
    // No placeholder was created for the resolved call.
    assert_eq!(graph.element_count(), 3);
}

#[test]
fn innermost_declaration_wins() {
    let graph = extract(
        "def helper():\n    pass\n\n\
         def outer():\n    def helper():\n        pass\n    helper()\n\n\
         def other():\n    helper()\n",
    );
    let top_helper = id(&graph, &["helper"]);
    let inner_helper = id(&graph, &["outer", "helper"]);
    let outer = id(&graph, &["outer"]);
    let other = id(&graph, &["other"]);

    assert!(has(&graph, LocalRelationKind::Use, outer, inner_helper));
    assert!(!has(&graph, LocalRelationKind::Use, outer, top_helper));
    assert!(has(&graph, LocalRelationKind::Use, other, top_helper));
}

#[test]
fn bare_calls_scope_their_arguments_attribute_calls_do_not() {
    let graph = extract("def main():\n    wrap(inner())\n    obj.method(arg())\n");
    let main = id(&graph, &["main"]);
    let wrap = id(&graph, &["main", "wrap"]);
    let inner = id(&graph, &["main", "wrap", "inner"]);
    let method = id(&graph, &["main", "method"]);
    let arg = id(&graph, &["main", "arg"]);

    assert!(has(&graph, LocalRelationKind::Use, main, wrap));
    assert!(has(&graph, LocalRelationKind::Use, wrap, inner));
    assert!(!has(&graph, LocalRelationKind::Use, main, inner));
    assert!(has(&graph, LocalRelationKind::Use, main, method));
    assert!(has(&graph, LocalRelationKind::Use, main, arg));

    let placeholder = graph.element(wrap).unwrap();
    assert_eq!(placeholder.kind, ElementKind::Function);
    assert_eq!((placeholder.start_line, placeholder.end_line), (2, 2));
}

#[test]
fn repeated_calls_reuse_placeholder() {
    let graph = extract("def main():\n    log()\n    log()\n");
    let main = id(&graph, &["main"]);
    let log = id(&graph, &["main", "log"]);

    assert_eq!(graph.element_count(), 2);
    assert_eq!(graph.relations_of(main).len(), 1);
    assert!(has(&graph, LocalRelationKind::Use, main, log));
}

#[test]
fn decorated_and_async_declarations_are_extracted() {
    let graph = extract("@register(\"x\")\nasync def fetch():\n    pass\n");
    let register = id(&graph, &["register"]);
    let fetch = id(&graph, &["fetch"]);

    assert!(has(&graph, LocalRelationKind::Use, ROOT_SCOPE, register));
    assert!(has(&graph, LocalRelationKind::Define, ROOT_SCOPE, fetch));
    assert_eq!(graph.element(fetch).unwrap().kind, ElementKind::Function);
}

#[test]
fn call_without_determinable_name_is_a_file_fault() {
    let err = extract_file(
        SourceLanguage::Python,
        "bad.py",
        "def main():\n    handlers[0]()\n",
    )
    .unwrap_err();
    assert_eq!(err, ParseError::UnnamedCall { line: 2 });
    assert!(!err.is_internal());
}

#[test]
fn malformed_source_is_a_file_fault() {
    let err = extract_file(SourceLanguage::Python, "bad.py", "class :\n").unwrap_err();
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn declaration_after_a_call_keeps_its_own_metadata() {
    let source = "obj = Widget()\nlater = lambda: helper()\n\nclass Widget:\n    \"\"\"W.\"\"\"\n\n    def __init__(self):\n        pass\n\ndef helper():\n    return 1\n";
    let graph = extract(source);
    let widget = id(&graph, &["Widget"]);
    let helper = id(&graph, &["helper"]);

    let class = graph.element(widget).unwrap();
    assert_eq!(class.kind, ElementKind::Class);
    assert_eq!((class.start_line, class.end_line), (4, 8));
    assert_eq!(class.docstring.as_deref(), Some("W."));
    assert!(!graph.is_placeholder(widget));

    let function = graph.element(helper).unwrap();
    assert_eq!((function.start_line, function.end_line), (10, 11));

    // The calls made before the declarations now point at them.
    assert!(has(&graph, LocalRelationKind::Use, ROOT_SCOPE, widget));
    assert!(has(&graph, LocalRelationKind::Use, ROOT_SCOPE, helper));
    assert!(has(&graph, LocalRelationKind::Define, ROOT_SCOPE, widget));
    assert!(has(&graph, LocalRelationKind::Define, ROOT_SCOPE, helper));
}
