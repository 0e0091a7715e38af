use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cursor::{CursorKind, CursorResolver, FindMode};
use crate::frontend::{Document, Snapshot};
use crate::vfs::FileIds;

/// Terminates every streamed response.
pub const SENTINEL: &str = "`";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceFlags {
    /// Report declaration sites too, with their own kind.
    pub all_references: bool,
    /// Only declaration sites of virtual functions.
    pub find_virtuals: bool,
    /// Omit the kind and source line.
    pub no_context: bool,
}

impl ReferenceFlags {
    pub fn all() -> Self {
        Self {
            all_references: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub kind: CursorKind,
    pub line_text: String,
}

impl Reference {
    pub fn format(
        &self,
        no_context: bool,
    ) -> String {
        if no_context {
            format!("{}:{}:{}", self.path.display(), self.line, self.column)
        } else {
            format!(
                "{}:{}:{} {}\t{}",
                self.path.display(),
                self.line,
                self.column,
                self.kind.as_char(),
                self.line_text
            )
        }
    }
}

/// Output lines for `references`, sentinel included.
pub fn format_references(
    references: &[Reference],
    flags: ReferenceFlags,
) -> Vec<String> {
    references
        .iter()
        .map(|reference| reference.format(flags.no_context))
        .chain(std::iter::once(SENTINEL.to_string()))
        .collect()
}

pub struct ReferenceResolver<'a> {
    snapshot: &'a Snapshot,
    files: &'a FileIds,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(
        snapshot: &'a Snapshot,
        files: &'a FileIds,
    ) -> Self {
        Self {
            snapshot,
            files,
        }
    }

    /// Usages of the declaration at `line:column`, in snapshot order.
    pub fn references(
        &self,
        document: &Arc<Document>,
        context: Option<&Arc<Document>>,
        line: u32,
        column: u32,
        flags: ReferenceFlags,
        path_filter: &HashSet<PathBuf>,
    ) -> Vec<Reference> {
        let resolver = CursorResolver::new(self.snapshot, self.files);
        let Some(resolved) = resolver.resolve(document, context, line, column, FindMode::Declaration) else {
            debug!("no symbol at {}:{line}:{column}", document.path().display());
            return Vec::new();
        };

        let mut references = Vec::new();
        for usage in self.snapshot.find_usages(&resolved.symbol) {
            if !path_filter.is_empty() && !path_filter.contains(&usage.path) {
                continue;
            }
            let declared = self
                .snapshot
                .get(&usage.path)
                .and_then(|doc| {
                    let id = doc.symbol_at(usage.line, usage.column)?;
                    let symbol = doc.symbol(id);
                    (symbol.line == usage.line && symbol.column == usage.column).then(|| symbol.clone())
                });
            let kind = match declared {
                Some(symbol) if flags.find_virtuals && !flags.all_references => {
                    if symbol.is_function() && (symbol.is_virtual || symbol.is_pure) {
                        CursorKind::MemberFunction
                    } else {
                        continue;
                    }
                },
                Some(symbol) if flags.all_references => CursorKind::of_symbol(symbol.kind),
                Some(_) => continue,
                None if flags.find_virtuals && !flags.all_references => continue,
                None => CursorKind::Reference,
            };
            references.push(Reference {
                path: usage.path,
                line: usage.line,
                column: usage.column,
                kind,
                line_text: usage.line_text,
            });
        }
        debug!("{} references to {}", references.len(), resolved.symbol.symbol().qualified_name);
        references
    }
}

#[cfg(test)]
#[path = "../tests/src/references_tests.rs"]
mod tests;
