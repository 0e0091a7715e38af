use logos::Logos;

use crate::frontend::syntax::kind::{SyntaxKind, TokenKind};

/// Wraps `logos::Lexer`, yielding `(SyntaxKind, text)` pairs that cover the
/// whole input. Unlexable bytes come back as `SyntaxKind::Error`.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = (SyntaxKind, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let kind = token.map(SyntaxKind::from).unwrap_or(SyntaxKind::Error);
        Some((kind, self.inner.slice()))
    }
}

/// Non-trivia tokens of `input` with their byte offsets.
pub fn significant_tokens(input: &str) -> Vec<(SyntaxKind, &str, usize)> {
    TokenKind::lexer(input)
        .spanned()
        .filter_map(|(token, span)| {
            let kind = token.map(SyntaxKind::from).unwrap_or(SyntaxKind::Error);
            (!kind.is_trivia()).then(|| (kind, &input[span.clone()], span.start))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../../tests/src/frontend/syntax/lexer_tests.rs"]
mod tests;
