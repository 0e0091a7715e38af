use std::path::PathBuf;

use super::*;
use crate::frontend::Include;
use crate::frontend::preprocess::{MacroEnv, preprocess};

fn document(
    path: &str,
    source: &str,
    includes: &[&str],
) -> Arc<Document> {
    let masked = preprocess(source, &mut MacroEnv::default(), &mut |_, _| {}).text;
    let includes = includes
        .iter()
        .map(|resolved| Include {
            line: 1,
            spelled: resolved.rsplit('/').next().unwrap_or(resolved).to_string(),
            angled: false,
            resolved: Some(PathBuf::from(resolved)),
        })
        .collect();
    Arc::new(Document::new(PathBuf::from(path), 1, source.to_string(), &masked, includes, Vec::new()))
}

struct Project {
    header: Arc<Document>,
    source: Arc<Document>,
    main: Arc<Document>,
    snapshot: Snapshot,
    files: FileIds,
}

fn project() -> Project {
    let header = document("/p/foo.h", "class Foo {\npublic:\n    void bar();\n};\n", &[]);
    let source = document("/p/foo.cpp", "#include \"foo.h\"\nvoid Foo::bar() {}\n", &["/p/foo.h"]);
    let main = document("/p/main.cpp", "#include \"foo.h\"\nvoid run() {\n    Foo foo;\n    foo.bar();\n}\n", &["/p/foo.h"]);
    let snapshot = [header.clone(), source.clone(), main.clone()].into_iter().collect();
    Project {
        header,
        source,
        main,
        snapshot,
        files: FileIds::new(),
    }
}

fn formatted(
    project: &Project,
    document: &Arc<Document>,
    line: u32,
    column: u32,
    mode: FindMode,
) -> Option<String> {
    CursorResolver::new(&project.snapshot, &project.files)
        .cursor(document, None, line, column, mode)
        .map(|cursor| cursor.format(&project.files))
}

#[test]
fn kind_characters() {
    assert_eq!(CursorKind::of_symbol(SymbolKind::Function).as_char(), 'm');
    assert_eq!(CursorKind::of_symbol(SymbolKind::ForwardClass).as_char(), 'c');
    assert_eq!(CursorKind::of_symbol(SymbolKind::Enumerator).as_char(), 'v');
    assert_eq!(CursorKind::of_symbol(SymbolKind::Namespace).as_char(), 'n');
    assert_eq!(CursorKind::Invalid.as_char(), '?');
    assert!(Cursor::default().is_null());
}

#[test]
fn declaration_swaps_to_definition() {
    let project = project();
    assert_eq!(formatted(&project, &project.header, 3, 10, FindMode::Swap).as_deref(), Some("r\t/p/foo.cpp:2:11"));
    assert_eq!(formatted(&project, &project.header, 3, 11, FindMode::Definition).as_deref(), Some("r\t/p/foo.cpp:2:11"));
    assert_eq!(formatted(&project, &project.header, 3, 10, FindMode::Declaration).as_deref(), Some("m\t/p/foo.h:3:10"));
}

#[test]
fn definition_swaps_to_declaration() {
    let project = project();
    assert_eq!(formatted(&project, &project.source, 2, 11, FindMode::Swap).as_deref(), Some("r\t/p/foo.h:3:10"));
    assert_eq!(formatted(&project, &project.source, 2, 11, FindMode::Definition).as_deref(), Some("m\t/p/foo.cpp:2:11"));
}

#[test]
fn member_call_resolves_through_the_object() {
    let project = project();
    let resolver = CursorResolver::new(&project.snapshot, &project.files);

    let cursor = resolver.cursor(&project.main, None, 4, 9, FindMode::Declaration).unwrap();
    assert_eq!(cursor.kind, CursorKind::Reference);
    assert_eq!(cursor.symbol_name, "Foo::bar");
    assert_eq!((cursor.location.line, cursor.location.column), (4, 5));
    assert_eq!(cursor.format(&project.files), "r\t/p/foo.h:3:10");

    assert_eq!(formatted(&project, &project.main, 4, 9, FindMode::Swap).as_deref(), Some("r\t/p/foo.cpp:2:11"));
    assert_eq!(formatted(&project, &project.main, 4, 5, FindMode::Swap).as_deref(), Some("r\t/p/main.cpp:3:9"));
}

#[test]
fn include_lines_yield_file_cursors() {
    let project = project();
    let resolver = CursorResolver::new(&project.snapshot, &project.files);

    let cursor = resolver.cursor(&project.main, None, 1, 3, FindMode::Swap).unwrap();
    assert_eq!(cursor.kind, CursorKind::File);
    assert_eq!(cursor.symbol_name, "/p/foo.h");
    assert_eq!(cursor.format(&project.files), "f\t/p/foo.h:1:1");
}

#[test]
fn positions_without_a_name_resolve_to_nothing() {
    let project = project();
    assert_eq!(formatted(&project, &project.main, 2, 12, FindMode::Swap), None);
    assert_eq!(formatted(&project, &project.main, 40, 1, FindMode::Swap), None);
    assert_eq!(formatted(&project, &project.main, 2, u32::MAX, FindMode::Swap), None);
}

#[test]
fn forward_declarations_land_on_the_class() {
    let forward = document("/p/fwd.h", "class Foo;\n", &[]);
    let header = document("/p/foo.h", "class Foo {\npublic:\n    void bar();\n};\n", &[]);
    let snapshot: Snapshot = [forward.clone(), header].into_iter().collect();
    let files = FileIds::new();

    let cursor = CursorResolver::new(&snapshot, &files).cursor(&forward, None, 1, 7, FindMode::Swap).unwrap();
    assert_eq!(cursor.format(&files), "r\t/p/foo.h:1:7");
    assert_eq!(cursor.symbol_name, "Foo");
}

#[test]
fn make_cursor_points_at_the_symbol_itself() {
    let project = project();
    let resolver = CursorResolver::new(&project.snapshot, &project.files);
    let id = project.header.symbol_ids().find(|id| project.header.symbol(*id).name == "bar").unwrap();

    let cursor = resolver.make_cursor(&SymbolRef::new(project.header.clone(), id));
    assert_eq!(cursor.location, cursor.target);
    assert_eq!(cursor.kind, CursorKind::MemberFunction);
    assert_eq!(cursor.format(&project.files), "m\t/p/foo.h:3:10");
}
