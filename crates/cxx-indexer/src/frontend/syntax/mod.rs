pub mod cst;
pub mod kind;
pub mod lexer;
pub mod parser;

use rowan::{TextSize, TokenAtOffset};

pub use cst::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use kind::SyntaxKind;
pub use parser::SyntaxError;

use crate::frontend::syntax::parser::Parser;

/// Immutable parse result: a lossless green tree plus recovered errors.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    green: rowan::GreenNode,
    errors: Vec<SyntaxError>,
}

impl SyntaxTree {
    pub fn parse(source: &str) -> Self {
        let parse = Parser::new(source).parse();
        Self {
            green: parse.green,
            errors: parse.errors,
        }
    }

    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }
}

/// The significant token covering `offset`, preferring identifiers when the
/// offset sits between two tokens.
pub fn token_at_offset(
    root: &SyntaxNode,
    offset: u32,
) -> Option<SyntaxToken> {
    if offset > u32::from(root.text_range().end()) {
        return None;
    }
    pick_token(root.token_at_offset(TextSize::from(offset)))
}

fn pick_token(tokens: TokenAtOffset<SyntaxToken>) -> Option<SyntaxToken> {
    match tokens {
        TokenAtOffset::None => None,
        TokenAtOffset::Single(token) => Some(token),
        TokenAtOffset::Between(left, right) => {
            if right.kind() == SyntaxKind::Ident || left.kind().is_trivia() {
                Some(right)
            } else {
                Some(left)
            }
        },
    }
}

pub fn prev_significant_token(token: &SyntaxToken) -> Option<SyntaxToken> {
    let mut current = token.prev_token();
    while let Some(token) = current {
        if !token.kind().is_trivia() {
            return Some(token);
        }
        current = token.prev_token();
    }
    None
}

pub fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| !token.kind().is_trivia())
}

/// Every identifier token in document order.
pub fn ident_tokens(root: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> + '_ {
    root.descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| token.kind() == SyntaxKind::Ident)
}

/// Significant token texts joined without separators, e.g. `operator()`.
pub fn compact_text(node: &SyntaxNode) -> String {
    let mut out = String::new();
    let mut last_was_word = false;
    for token in node.descendants_with_tokens().filter_map(|element| element.into_token()) {
        if token.kind().is_trivia() {
            continue;
        }
        let text = token.text();
        let is_word = text.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
        if is_word && last_was_word {
            out.push(' ');
        }
        out.push_str(text);
        last_was_word = is_word;
    }
    out
}

/// Indented one-line-per-node rendering of a tree, `Kind: compact text`.
pub fn dump_tree(root: &SyntaxNode) -> Vec<String> {
    let mut lines = Vec::new();
    let mut depth = 0usize;
    for event in root.preorder() {
        match event {
            rowan::WalkEvent::Enter(node) => {
                lines.push(format!("{:indent$}{:?}: {}", "", node.kind(), compact_text(&node), indent = depth * 2));
                depth += 1;
            },
            rowan::WalkEvent::Leave(_) => depth = depth.saturating_sub(1),
        }
    }
    lines
}

#[cfg(test)]
#[path = "../../../tests/src/frontend/syntax/syntax_tests.rs"]
mod tests;
