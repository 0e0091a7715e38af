use std::sync::Arc;

use super::*;
use crate::frontend::document::{Document, Include};
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

fn symbol_named(
    document: &Arc<Document>,
    qualified_name: &str,
) -> SymbolRef {
    let id = document.symbol_ids().find(|id| document.symbol(*id).qualified_name == qualified_name).unwrap();
    SymbolRef::new(document.clone(), id)
}

fn positions(usages: &[Usage]) -> Vec<(String, u32, u32)> {
    usages
        .iter()
        .map(|usage| (usage.path.display().to_string(), usage.line, usage.column))
        .collect()
}

#[test]
fn method_usages_across_files() {
    let header = document("/p/foo.h", "class Foo {\npublic:\n    void bar();\n};\n", &[]);
    let source = document("/p/foo.cpp", "#include \"foo.h\"\nvoid Foo::bar() {}\n", &["/p/foo.h"]);
    let main = document("/p/main.cpp", "#include \"foo.h\"\nvoid run() {\n    Foo foo;\n    foo.bar();\n}\n", &["/p/foo.h"]);
    let snapshot: Snapshot = [header.clone(), source, main].into_iter().collect();

    let usages = find_usages(&symbol_named(&header, "Foo::bar"), &snapshot);
    assert_eq!(
        positions(&usages),
        vec![("/p/foo.cpp".to_string(), 2, 11), ("/p/main.cpp".to_string(), 4, 9)]
    );
    assert_eq!(usages[1].line_text, "    foo.bar();");
}

#[test]
fn unrelated_members_with_the_same_name_are_ignored() {
    let header = document("/p/foo.h", "class Foo {\npublic:\n    void bar();\n};\n", &[]);
    let other = document("/p/other.cpp", "struct Other { void bar(); };\nvoid g() { Other o; o.bar(); }\n", &[]);
    let snapshot: Snapshot = [header.clone(), other].into_iter().collect();

    assert!(find_usages(&symbol_named(&header, "Foo::bar"), &snapshot).is_empty());
}

#[test]
fn local_variable_usages() {
    let main = document("/p/main.cpp", "void f() {\n    int count = 0;\n    count++;\n}\n", &[]);
    let snapshot: Snapshot = [main.clone()].into_iter().collect();

    let usages = find_usages(&symbol_named(&main, "count"), &snapshot);
    assert_eq!(positions(&usages), vec![("/p/main.cpp".to_string(), 3, 5)]);
    assert_eq!(usages[0].line_text, "    count++;");
}
