//! "What is under the cursor": resolves a location to the symbol it names
//! and to the declaration or definition the caller is after.

use std::sync::Arc;

use tracing::debug;

use crate::frontend::lookup::canonical;
use crate::frontend::syntax::{SyntaxNode, SyntaxToken, first_significant_token, prev_significant_token, token_at_offset};
use crate::frontend::{Document, LookupContext, Snapshot, SymbolKind, SymbolRef};
use crate::vfs::{FileIds, Location};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CursorKind {
    #[default]
    Invalid,
    Enum,
    MemberFunction,
    Namespace,
    Class,
    Variable,
    Reference,
    File,
}

impl CursorKind {
    pub fn as_char(self) -> char {
        match self {
            CursorKind::Invalid => '?',
            CursorKind::Enum => 'e',
            CursorKind::MemberFunction => 'm',
            CursorKind::Namespace => 'n',
            CursorKind::Class => 'c',
            CursorKind::Variable => 'v',
            CursorKind::Reference => 'r',
            CursorKind::File => 'f',
        }
    }

    pub fn of_symbol(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Enum => CursorKind::Enum,
            SymbolKind::Function => CursorKind::MemberFunction,
            SymbolKind::Namespace => CursorKind::Namespace,
            SymbolKind::Class | SymbolKind::ForwardClass => CursorKind::Class,
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Typedef | SymbolKind::Enumerator => {
                CursorKind::Variable
            },
        }
    }
}

/// A resolved point query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cursor {
    /// Where the queried name starts: the symbol's own name, or the start
    /// of the expression that was evaluated.
    pub location: Location,
    /// The declaration, definition or file the query lands on.
    pub target: Location,
    pub kind: CursorKind,
    pub symbol_name: String,
}

impl Cursor {
    pub fn is_null(&self) -> bool {
        self.target.is_null()
    }

    /// `<kind>\t<path>:<line>:<column>` of the target.
    pub fn format(
        &self,
        files: &FileIds,
    ) -> String {
        format!("{}\t{}", self.kind.as_char(), files.format(&self.target))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindMode {
    Declaration,
    Definition,
    /// Declaration when sitting on a definition, definition otherwise.
    Swap,
}

/// A symbol found at a location, and where its name starts there.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub symbol: SymbolRef,
    pub site: Location,
}

pub struct CursorResolver<'a> {
    snapshot: &'a Snapshot,
    files: &'a FileIds,
}

impl<'a> CursorResolver<'a> {
    pub fn new(
        snapshot: &'a Snapshot,
        files: &'a FileIds,
    ) -> Self {
        Self {
            snapshot,
            files,
        }
    }

    pub fn symbol_location(
        &self,
        symbol: &SymbolRef,
    ) -> Location {
        let sym = symbol.symbol();
        Location::new(self.files.insert(symbol.path()), sym.line, sym.column)
    }

    /// Cursor for a symbol at its own declaration.
    pub fn make_cursor(
        &self,
        symbol: &SymbolRef,
    ) -> Cursor {
        let location = self.symbol_location(symbol);
        Cursor {
            location,
            target: location,
            kind: CursorKind::of_symbol(symbol.symbol().kind),
            symbol_name: symbol.symbol().qualified_name.clone(),
        }
    }

    /// Resolves `line:column` of `document` and turns it into a cursor. An
    /// unresolvable position on an `#include` line yields a file cursor.
    /// `context` is the document whose view of the world lookups use,
    /// normally a header's includer.
    pub fn cursor(
        &self,
        document: &Arc<Document>,
        context: Option<&Arc<Document>>,
        line: u32,
        column: u32,
        mode: FindMode,
    ) -> Option<Cursor> {
        let Some(resolved) = self.resolve(document, context, line, column, mode) else {
            return self.include_cursor(document, line);
        };
        let target = self.symbol_location(&resolved.symbol);
        let kind = if resolved.site == target {
            CursorKind::of_symbol(resolved.symbol.symbol().kind)
        } else {
            CursorKind::Reference
        };
        debug!(
            "resolved {} to {} ({})",
            self.files.format(&resolved.site),
            self.files.format(&target),
            resolved.symbol.symbol().qualified_name
        );
        Some(Cursor {
            location: resolved.site,
            target,
            kind,
            symbol_name: resolved.symbol.symbol().qualified_name.clone(),
        })
    }

    pub fn resolve(
        &self,
        document: &Arc<Document>,
        context: Option<&Arc<Document>>,
        line: u32,
        column: u32,
        mode: FindMode,
    ) -> Option<Resolved> {
        let found = match document.symbol_at(line, column) {
            Some(id) => {
                let symbol = SymbolRef::new(document.clone(), id);
                debug!("found {} outright", symbol.symbol().qualified_name);
                let site = self.symbol_location(&symbol);
                Resolved {
                    symbol,
                    site,
                }
            },
            None => self.evaluate_at(document, context, line, column)?,
        };
        Some(Resolved {
            symbol: self.apply_mode(found.symbol, mode),
            site: found.site,
        })
    }

    /// Evaluates the innermost expression around the position that yields a
    /// symbol, skipping names that hang off a `::`, `.` or `->`.
    fn evaluate_at(
        &self,
        document: &Arc<Document>,
        context: Option<&Arc<Document>>,
        line: u32,
        column: u32,
    ) -> Option<Resolved> {
        let offset = document.lines().offset(line, column)?;
        let root = document.root();
        let token = token_at_offset(&root, offset)?;
        let scope = document.scope_at(offset);
        let lookup = LookupContext::new(context.unwrap_or(document), self.snapshot);

        for node in token.parent_ancestors() {
            if !node.kind().is_expression_candidate() {
                continue;
            }
            let Some(first) = first_significant_token(&node) else {
                continue;
            };
            if prev_significant_token(&first).is_some_and(|prev| prev.kind().is_scope_or_member_operator()) {
                continue;
            }
            let Some(last) = last_token_starting_by(&node, offset) else {
                continue;
            };
            let start = u32::from(first.text_range().start());
            let end = u32::from(last.text_range().end());
            let Some(expression) = document.source().get(start as usize..end as usize) else {
                continue;
            };
            debug!("trying expression `{expression}` in scope {}", scope.index());
            let candidates = lookup.lookup(document, scope, expression);
            if let Some(symbol) = canonical(&candidates) {
                let (line, column) = document.lines().position(start);
                return Some(Resolved {
                    symbol,
                    site: Location::new(self.files.insert(document.path()), line, column),
                });
            }
        }
        None
    }

    /// Swaps between a function's declaration and definition as `mode`
    /// asks, and replaces a forward declaration with its class.
    fn apply_mode(
        &self,
        symbol: SymbolRef,
        mode: FindMode,
    ) -> SymbolRef {
        let sym = symbol.symbol();
        if sym.is_function() {
            let definition = self
                .snapshot
                .find_matching_definition(&symbol, true)
                .or_else(|| self.snapshot.find_matching_definition(&symbol, false));
            let Some(definition) = definition else {
                return symbol;
            };
            if !definition.same_symbol(&symbol) {
                if matches!(mode, FindMode::Definition | FindMode::Swap) {
                    return definition;
                }
            } else if mode != FindMode::Definition
                && let Some(declaration) = self.snapshot.find_matching_declarations(&symbol).into_iter().next()
            {
                return declaration;
            }
            return symbol;
        }
        if sym.kind == SymbolKind::ForwardClass
            && let Some(class) = self.snapshot.find_matching_class(&symbol)
        {
            return class;
        }
        symbol
    }

    fn include_cursor(
        &self,
        document: &Document,
        line: u32,
    ) -> Option<Cursor> {
        let include = document.includes().iter().find(|include| include.line == line)?;
        let resolved = include.resolved.as_deref()?;
        let location = Location::new(self.files.insert(resolved), 1, 1);
        Some(Cursor {
            location,
            target: location,
            kind: CursorKind::File,
            symbol_name: resolved.display().to_string(),
        })
    }
}

fn last_token_starting_by(
    node: &SyntaxNode,
    offset: u32,
) -> Option<SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .filter(|token| !token.kind().is_trivia())
        .take_while(|token| u32::from(token.text_range().start()) <= offset)
        .last()
}

#[cfg(test)]
#[path = "../tests/src/cursor_tests.rs"]
mod tests;
