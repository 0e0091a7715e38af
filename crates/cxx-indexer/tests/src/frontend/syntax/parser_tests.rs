use super::*;
use crate::frontend::syntax::{SyntaxKind, SyntaxNode};

fn parse(source: &str) -> (SyntaxNode, Vec<SyntaxError>) {
    let parse = Parser::new(source).parse();
    (SyntaxNode::new_root(parse.green), parse.errors)
}

fn kinds(root: &SyntaxNode) -> Vec<SyntaxKind> {
    root.descendants().map(|node| node.kind()).collect()
}

#[test]
fn tree_is_lossless() {
    let source = "#include <a.h>\n// c\nint  main ( ) { return 0 ; }\n}}} @@ garbage (";
    let (root, _) = parse(source);
    assert_eq!(root.text().to_string(), source);
}

#[test]
fn class_in_namespace() {
    let (root, errors) = parse("namespace ns { class Foo { public: void bar(); }; }");
    assert!(errors.is_empty(), "{errors:?}");
    let kinds = kinds(&root);
    for expected in [SyntaxKind::NamespaceDef, SyntaxKind::ClassDef, SyntaxKind::AccessLabel, SyntaxKind::FunctionDecl] {
        assert!(kinds.contains(&expected), "missing {expected:?} in {kinds:?}");
    }
}

#[test]
fn out_of_class_definition_with_call() {
    let (root, errors) = parse("void Foo::bar() { helper(1); }");
    assert!(errors.is_empty(), "{errors:?}");
    let function = root.descendants().find(|node| node.kind() == SyntaxKind::FunctionDecl).unwrap();
    assert!(function.children().any(|child| child.kind() == SyntaxKind::QualifiedName));
    assert!(function.children().any(|child| child.kind() == SyntaxKind::Block));
    let call = function.descendants().find(|node| node.kind() == SyntaxKind::CallExpr).unwrap();
    assert_eq!(call.text().to_string(), "helper(1)");
}

#[test]
fn member_access_chain() {
    let (root, errors) = parse("void f() { a.b->c(); }");
    assert!(errors.is_empty(), "{errors:?}");
    let members: Vec<String> = root
        .descendants()
        .filter(|node| node.kind() == SyntaxKind::MemberExpr)
        .map(|node| node.text().to_string())
        .collect();
    assert_eq!(members, vec!["a.b->c".to_string(), "a.b".to_string()]);
}

#[test]
fn stray_brace_is_reported_and_skipped() {
    let (root, errors) = parse("int x;\n}\nint y;");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "unbalanced `}`");
    assert_eq!(errors[0].offset, 7);
    let declarations = root.children().filter(|node| node.kind() == SyntaxKind::VarDecl).count();
    assert_eq!(declarations, 2);
}

#[test]
fn missing_semicolon_is_reported() {
    let (_, errors) = parse("int x = 1\nint y;");
    assert_eq!(errors[0].message, "expected `;` after declaration");
}

#[test]
fn deeply_nested_blocks_do_not_overflow() {
    let source = format!("void f() {}{}", "{".repeat(1000), "}".repeat(1000));
    let (root, _) = parse(&source);
    assert_eq!(root.text().to_string(), source);
}
