use std::path::PathBuf;

use super::*;
use crate::frontend::preprocess::PreprocessDiagnostic;

fn document(source: &str) -> Document {
    Document::new(PathBuf::from("/nowhere/doc.cpp"), 1, source.to_string(), source, Vec::new(), Vec::new())
}

#[test]
fn line_index_round_trips_positions() {
    let lines = LineIndex::new("ab\ncd\n");
    assert_eq!(lines.line_count(), 3);
    assert_eq!(lines.position(0), (1, 1));
    assert_eq!(lines.position(4), (2, 2));
    assert_eq!(lines.position(6), (3, 1));

    assert_eq!(lines.offset(2, 3), Some(5));
    assert_eq!(lines.offset(1, 3), Some(2));
    assert_eq!(lines.offset(1, 4), None);
    assert_eq!(lines.offset(3, 1), Some(6));
    assert_eq!(lines.offset(4, 1), None);
    assert_eq!(lines.offset(0, 1), None);

    assert_eq!(lines.line_range(1), Some((0, 2)));
    assert_eq!(lines.line_range(2), Some((3, 5)));
    assert_eq!(lines.line_range(3), Some((6, 6)));
}

#[test]
fn huge_columns_are_out_of_range() {
    let lines = LineIndex::new("ab\ncd\n");
    assert_eq!(lines.offset(2, u32::MAX), None);
    assert_eq!(lines.offset(1, u32::MAX), None);
}

#[test]
fn symbol_lookup_by_position() {
    let doc = document("class Foo {\n    void bar();\n};\n");

    let bar = doc.symbol_at(2, 12).unwrap();
    assert_eq!(doc.symbol(bar).qualified_name, "Foo::bar");
    assert_eq!(doc.symbol_at(2, 10).map(|id| doc.symbol(id).name.clone()), Some("bar".to_string()));
    assert_eq!(doc.symbol_at(2, 13), None);
    assert_eq!(doc.symbol_declared_at(doc.symbol(bar).offset), Some(bar));
    assert_eq!(doc.exported("Foo::bar"), &[bar]);
    assert!(doc.exported("bar").is_empty());
    assert_eq!(doc.global_symbol_count(), 1);
}

#[test]
fn scope_at_finds_the_innermost_scope() {
    let source = "namespace n {\nvoid f(int a) {\n    if (a) {\n        a++;\n    }\n}\n}\n";
    let doc = document(source);

    let inner = source.find("a++").unwrap() as u32;
    let scope = doc.scope(doc.scope_at(inner));
    assert_eq!(scope.kind, ScopeKind::Block);
    let function = doc.enclosing_function(doc.scope_at(inner)).unwrap();
    assert_eq!(doc.scope(function).kind, ScopeKind::Function);

    let in_namespace = source.find("void").unwrap() as u32;
    assert_eq!(doc.scope(doc.scope_at(in_namespace)).kind, ScopeKind::Namespace);
    assert_eq!(doc.scope_at(0), ScopeId::GLOBAL);
}

#[test]
fn identifiers_and_line_text() {
    let doc = document("int value = other;\r\nint x;\n");
    assert!(doc.contains_identifier("other"));
    assert!(!doc.contains_identifier("missing"));
    assert_eq!(doc.line_text(1), "int value = other;");
    assert_eq!(doc.line_text(2), "int x;");
    assert_eq!(doc.line_text(9), "");
}

#[test]
fn diagnostics_combine_preprocessor_and_parser() {
    let doc = Document::new(
        PathBuf::from("/nowhere/doc.cpp"),
        3,
        "int x;\n}\n".to_string(),
        "int x;\n}\n",
        Vec::new(),
        vec![PreprocessDiagnostic {
            line: 1,
            message: "#endif without #if".to_string(),
        }],
    );
    let rendered: Vec<String> = doc.diagnostics().iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["1:1: #endif without #if".to_string(), "2:1: unbalanced `}`".to_string()]);
    assert_eq!(doc.revision(), 3);
}
