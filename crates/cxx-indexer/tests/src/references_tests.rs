use expect_test::expect;

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

fn foo_project() -> (Arc<Document>, Snapshot) {
    let header = document("/p/foo.h", "class Foo {\npublic:\n    void bar();\n};\n", &[]);
    let source = document("/p/foo.cpp", "#include \"foo.h\"\nvoid Foo::bar() {}\n", &["/p/foo.h"]);
    let main = document("/p/main.cpp", "#include \"foo.h\"\nvoid run() {\n    Foo foo;\n    foo.bar();\n}\n", &["/p/foo.h"]);
    (header.clone(), [header, source, main].into_iter().collect())
}

fn lines(
    document: &Arc<Document>,
    snapshot: &Snapshot,
    line: u32,
    column: u32,
    flags: ReferenceFlags,
    filter: &[&str],
) -> Vec<String> {
    let files = FileIds::new();
    let filter: HashSet<PathBuf> = filter.iter().map(PathBuf::from).collect();
    let references = ReferenceResolver::new(snapshot, &files).references(document, None, line, column, flags, &filter);
    format_references(&references, flags)
}

#[test]
fn plain_references_skip_declarations() {
    let (header, snapshot) = foo_project();
    assert_eq!(
        lines(&header, &snapshot, 3, 10, ReferenceFlags::default(), &[]),
        vec!["/p/main.cpp:4:9 r\t    foo.bar();", SENTINEL]
    );
}

#[test]
fn all_references_include_declaration_sites() {
    let (header, snapshot) = foo_project();
    assert_eq!(
        lines(&header, &snapshot, 3, 10, ReferenceFlags::all(), &[]),
        vec!["/p/foo.cpp:2:11 m\tvoid Foo::bar() {}", "/p/main.cpp:4:9 r\t    foo.bar();", SENTINEL]
    );
}

#[test]
fn no_context_prints_bare_locations() {
    let (header, snapshot) = foo_project();
    let flags = ReferenceFlags {
        all_references: true,
        no_context: true,
        ..ReferenceFlags::default()
    };
    assert_eq!(lines(&header, &snapshot, 3, 10, flags, &[]), vec!["/p/foo.cpp:2:11", "/p/main.cpp:4:9", SENTINEL]);
}

#[test]
fn path_filter_restricts_output() {
    let (header, snapshot) = foo_project();
    assert_eq!(
        lines(&header, &snapshot, 3, 10, ReferenceFlags::all(), &["/p/foo.cpp"]),
        vec!["/p/foo.cpp:2:11 m\tvoid Foo::bar() {}", SENTINEL]
    );
}

#[test]
fn virtuals_keep_only_virtual_declarations() {
    let a = document("/p/a.h", "class Foo {\npublic:\n    virtual void bar();\n};\n", &[]);
    let b = document("/p/b.h", "class Foo {\npublic:\n    virtual void bar();\n};\n", &[]);
    let source = document("/p/foo.cpp", "void Foo::bar() {}\n", &[]);
    let snapshot: Snapshot = [a.clone(), b, source].into_iter().collect();

    let flags = ReferenceFlags {
        find_virtuals: true,
        ..ReferenceFlags::default()
    };
    assert_eq!(lines(&a, &snapshot, 3, 18, flags, &[]), vec!["/p/b.h:3:18 m\t    virtual void bar();", SENTINEL]);
}

#[test]
fn nothing_under_the_cursor_yields_only_the_sentinel() {
    let (header, snapshot) = foo_project();
    assert_eq!(lines(&header, &snapshot, 4, 1, ReferenceFlags::all(), &[]), vec![SENTINEL]);
}

#[test]
fn reference_formatting() {
    let reference = Reference {
        path: PathBuf::from("/p/x.cpp"),
        line: 7,
        column: 3,
        kind: CursorKind::Reference,
        line_text: "  x();".to_string(),
    };
    assert_eq!(reference.format(false), "/p/x.cpp:7:3 r\t  x();");
    assert_eq!(reference.format(true), "/p/x.cpp:7:3");
}

#[test]
fn global_variable_reads() {
    let source = document("/p/x.cpp", "int x;\nint read_a() { return x; }\nint read_b() { return x + 1; }\n", &[]);
    let snapshot: Snapshot = [source.clone()].into_iter().collect();
    let flags = ReferenceFlags {
        all_references: true,
        no_context: true,
        ..ReferenceFlags::default()
    };
    let mut actual = lines(&source, &snapshot, 1, 5, flags, &[]).join("\n");
    actual.push('\n');
    expect![[r#"
        /p/x.cpp:2:23
        /p/x.cpp:3:23
        `
    "#]]
    .assert_eq(&actual);
}
