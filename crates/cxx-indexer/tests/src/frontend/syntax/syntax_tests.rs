use expect_test::expect;

use super::*;

#[test]
fn token_at_offset_prefers_identifiers() {
    let tree = SyntaxTree::parse("int value = other;");
    let root = tree.root();

    assert_eq!(token_at_offset(&root, 4).unwrap().text(), "value");
    // between `value` and the space: the identifier wins
    assert_eq!(token_at_offset(&root, 9).unwrap().text(), "value");
    assert_eq!(token_at_offset(&root, 12).unwrap().text(), "other");
    assert!(token_at_offset(&root, 100).is_none());
}

#[test]
fn prev_significant_token_skips_trivia() {
    let tree = SyntaxTree::parse("a :: /* c */ b");
    let root = tree.root();
    let b = token_at_offset(&root, 13).unwrap();
    assert_eq!(b.text(), "b");
    let prev = prev_significant_token(&b).unwrap();
    assert_eq!(prev.kind(), SyntaxKind::ColonColon);
}

#[test]
fn compact_text_joins_words_with_one_space() {
    let tree = SyntaxTree::parse("unsigned   int x  =  y ( 1 ) ;");
    assert_eq!(compact_text(&tree.root()), "unsigned int x=y(1);");
}

#[test]
fn ident_tokens_in_order() {
    let tree = SyntaxTree::parse("int a = b + c;");
    let names: Vec<String> = ident_tokens(&tree.root()).map(|token| token.text().to_string()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn dump_tree_renders_nested_nodes() {
    let tree = SyntaxTree::parse("int a = b;");
    assert!(tree.errors().is_empty());
    let mut actual = dump_tree(&tree.root()).join("\n");
    actual.push('\n');
    expect![[r#"
        Root: int a=b;
          VarDecl: int a=b;
            TypeRef: int
            Declarator: a=b
              NameRef: a
              Initializer: =b
                NameRef: b
    "#]]
    .assert_eq(&actual);
}
