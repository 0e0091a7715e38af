use std::path::PathBuf;

use crate::frontend::Snapshot;
use crate::frontend::lookup::{LookupContext, SymbolRef, same_entity};
use crate::frontend::syntax::{SyntaxKind, SyntaxNode, SyntaxToken, ident_tokens, prev_significant_token};

/// One textual occurrence of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub line_text: String,
}

/// Every identifier in the snapshot that resolves to the entity `target`
/// names, in snapshot order. The target's own name token is not a usage.
pub fn find_usages(
    target: &SymbolRef,
    snapshot: &Snapshot,
) -> Vec<Usage> {
    let symbol = target.symbol();
    let ident = symbol.name.trim_start_matches('~');
    if ident.is_empty() || ident.starts_with("operator") {
        return Vec::new();
    }

    let mut usages = Vec::new();
    for document in snapshot.documents() {
        if !document.contains_identifier(ident) {
            continue;
        }
        let context = LookupContext::new(document, snapshot);
        let root = document.root();
        for token in ident_tokens(&root).filter(|token| token.text() == ident) {
            let offset = site_offset(&token);
            let candidates = match document.symbol_declared_at(offset) {
                Some(id) => vec![SymbolRef::new(document.clone(), id)],
                None => {
                    let Some(expression) = name_expression(&token) else {
                        continue;
                    };
                    let scope = document.scope_at(offset);
                    context.lookup(document, scope, &expression)
                },
            };
            let Some(found) = candidates.iter().find(|candidate| same_entity(candidate, target)) else {
                continue;
            };
            if found.same_symbol(target) && found.symbol().offset == offset && document.path() == target.path() {
                continue;
            }
            let (line, column) = document.lines().position(offset);
            usages.push(Usage {
                path: document.path().to_path_buf(),
                line,
                column,
                line_text: document.line_text(line).to_string(),
            });
        }
    }
    usages
}

/// Destructor names start at their `~`.
fn site_offset(token: &SyntaxToken) -> u32 {
    let start = u32::from(token.text_range().start());
    match prev_significant_token(token) {
        Some(prev) if prev.kind() == SyntaxKind::Tilde && prev.parent() == token.parent() => u32::from(prev.text_range().start()),
        _ => start,
    }
}

/// Text to evaluate for an identifier: the member access it completes, or
/// its qualified name up to and including it.
fn name_expression(token: &SyntaxToken) -> Option<String> {
    let segment = token.parent().filter(|node| node.kind() == SyntaxKind::NameRef)?;
    let end = u32::from(segment.text_range().end());
    let mut name = segment.clone();
    if let Some(parent) = segment.parent()
        && parent.kind() == SyntaxKind::QualifiedName
    {
        name = parent;
    }
    if let Some(member) = name.parent()
        && member.kind() == SyntaxKind::MemberExpr
        && member.last_child().as_ref() == Some(&name)
    {
        return Some(member.text().to_string());
    }
    Some(text_until(&name, end))
}

fn text_until(
    node: &SyntaxNode,
    end: u32,
) -> String {
    let start = u32::from(node.text_range().start());
    let text = node.text().to_string();
    let len = end.saturating_sub(start) as usize;
    text.get(..len).unwrap_or(&text).to_string()
}

#[cfg(test)]
#[path = "../../tests/src/frontend/usages_tests.rs"]
mod tests;
