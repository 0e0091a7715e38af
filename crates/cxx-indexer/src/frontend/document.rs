use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::frontend::preprocess::PreprocessDiagnostic;
use crate::frontend::syntax::{SyntaxNode, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of symbol categories produced by the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Class,
    ForwardClass,
    Enum,
    Enumerator,
    Function,
    Variable,
    Parameter,
    Typedef,
}

impl SymbolKind {
    pub fn is_class_like(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::ForwardClass)
    }

    /// Kinds that may be looked up as the left side of `::`.
    pub fn is_scope_like(self) -> bool {
        matches!(self, SymbolKind::Namespace | SymbolKind::Class | SymbolKind::Enum)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Explicit qualifier as written, `["Foo"]` for `void Foo::bar()`.
    pub qualifier: Vec<String>,
    /// Fully qualified display name.
    pub qualified_name: String,
    pub kind: SymbolKind,
    /// Byte offset and length of the name token.
    pub offset: u32,
    pub len: u32,
    pub line: u32,
    pub column: u32,
    /// Scope the symbol is declared in.
    pub scope: ScopeId,
    /// Scope opened by the symbol: namespace, class, enum or function body.
    pub body: Option<ScopeId>,
    /// Declared type as a `::` path, without template arguments.
    pub type_name: Option<String>,
    /// Initializer text of an `auto` variable.
    pub initializer: Option<String>,
    /// Normalised parameter types of a function.
    pub params: Vec<String>,
    pub bases: Vec<String>,
    pub is_definition: bool,
    pub is_virtual: bool,
    pub is_pure: bool,
    /// Declared at namespace, class or enum level and reachable by name.
    pub exported: bool,
}

impl Symbol {
    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    pub fn signature(&self) -> String {
        self.params.join(",")
    }

    pub fn contains(
        &self,
        line: u32,
        column: u32,
    ) -> bool {
        self.line == line && self.column <= column && column < self.column + self.len.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Namespace,
    Class,
    Enum,
    Function,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub owner: Option<SymbolId>,
    /// Byte range `[start, end)`.
    pub start: u32,
    pub end: u32,
    pub members: Vec<SymbolId>,
    /// Namespaces named by `using namespace` directives in this scope.
    pub usings: Vec<String>,
    /// Qualification applied to the names declared here.
    pub prefix: String,
}

impl Scope {
    pub fn contains(
        &self,
        offset: u32,
    ) -> bool {
        self.start <= offset && offset < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub line: u32,
    pub spelled: String,
    pub angled: bool,
    pub resolved: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Byte offsets of line starts, for 1-based line/column conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx as u32 + 1),
        );
        Self {
            starts,
            len: text.len() as u32,
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 1-based `(line, column)` of a byte offset.
    pub fn position(
        &self,
        offset: u32,
    ) -> (u32, u32) {
        let line = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line as u32 + 1, offset - self.starts[line] + 1)
    }

    /// Byte offset of a 1-based `(line, column)`; the column may point one
    /// past the end of the line.
    pub fn offset(
        &self,
        line: u32,
        column: u32,
    ) -> Option<u32> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.starts.get(line as usize - 1)?;
        let end = self.starts.get(line as usize).copied().unwrap_or(self.len + 1);
        let offset = start.checked_add(column - 1)?;
        (offset < end).then_some(offset)
    }

    pub fn line_range(
        &self,
        line: u32,
    ) -> Option<(u32, u32)> {
        if line == 0 {
            return None;
        }
        let start = *self.starts.get(line as usize - 1)?;
        let end = self.starts.get(line as usize).map(|next| next - 1).unwrap_or(self.len);
        Some((start, end))
    }
}

/// Output of the binder for one parsed file.
#[derive(Debug, Default)]
pub struct BoundTable {
    pub symbols: Vec<Symbol>,
    pub scopes: Vec<Scope>,
}

/// The bound parse result of one file at one revision.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    revision: u64,
    source: String,
    lines: LineIndex,
    tree: SyntaxTree,
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    includes: Vec<Include>,
    diagnostics: Vec<Diagnostic>,
    identifiers: HashSet<String>,
    exported: HashMap<String, Vec<SymbolId>>,
    declared_at: HashMap<u32, SymbolId>,
}

impl Document {
    /// Parses the masked text, binds it and collects diagnostics. Offsets in
    /// `masked` must match `source` byte for byte.
    pub fn new(
        path: PathBuf,
        revision: u64,
        source: String,
        masked: &str,
        includes: Vec<Include>,
        preprocess_diagnostics: Vec<PreprocessDiagnostic>,
    ) -> Self {
        let lines = LineIndex::new(&source);
        let tree = SyntaxTree::parse(masked);
        let root = tree.root();
        let BoundTable {
            symbols,
            scopes,
        } = crate::frontend::binder::bind(&root, &lines);

        let mut diagnostics: Vec<Diagnostic> = preprocess_diagnostics
            .into_iter()
            .map(|diag| Diagnostic {
                line: diag.line,
                column: 1,
                message: diag.message,
            })
            .collect();
        diagnostics.extend(tree.errors().iter().map(|error| {
            let offset = u32::try_from(error.offset).unwrap_or(u32::MAX);
            let (line, column) = lines.position(offset);
            Diagnostic {
                line,
                column,
                message: error.message.clone(),
            }
        }));

        let identifiers = crate::frontend::syntax::ident_tokens(&root)
            .map(|token| token.text().to_string())
            .collect();

        let mut exported: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut declared_at = HashMap::with_capacity(symbols.len());
        for (idx, symbol) in symbols.iter().enumerate() {
            let id = SymbolId(idx as u32);
            declared_at.entry(symbol.offset).or_insert(id);
            if symbol.exported && !symbol.qualified_name.is_empty() {
                exported.entry(symbol.qualified_name.clone()).or_default().push(id);
            }
        }

        Self {
            path,
            revision,
            source,
            lines,
            tree,
            symbols,
            scopes,
            includes,
            diagnostics,
            identifiers,
            exported,
            declared_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn root(&self) -> SyntaxNode {
        self.tree.root()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol(
        &self,
        id: SymbolId,
    ) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.symbols.len() as u32).map(SymbolId)
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn scope(
        &self,
        id: ScopeId,
    ) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn contains_identifier(
        &self,
        name: &str,
    ) -> bool {
        self.identifiers.contains(name)
    }

    /// Namespace-, class- and enum-level symbols with this qualified name.
    pub fn exported(
        &self,
        qualified_name: &str,
    ) -> &[SymbolId] {
        self.exported.get(qualified_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn symbol_declared_at(
        &self,
        offset: u32,
    ) -> Option<SymbolId> {
        self.declared_at.get(&offset).copied()
    }

    /// Symbol whose name token covers the 1-based position.
    pub fn symbol_at(
        &self,
        line: u32,
        column: u32,
    ) -> Option<SymbolId> {
        self.symbol_ids().find(|id| self.symbol(*id).contains(line, column))
    }

    /// Innermost scope whose range contains `offset`.
    pub fn scope_at(
        &self,
        offset: u32,
    ) -> ScopeId {
        let mut best = ScopeId::GLOBAL;
        let mut best_len = u32::MAX;
        for (idx, scope) in self.scopes.iter().enumerate() {
            if !scope.contains(offset) {
                continue;
            }
            let len = scope.end - scope.start;
            // later scopes nest inside earlier ones with the same range
            if len <= best_len {
                best = ScopeId(idx as u32);
                best_len = len;
            }
        }
        best
    }

    pub fn line_text(
        &self,
        line: u32,
    ) -> &str {
        self.lines
            .line_range(line)
            .map(|(start, end)| self.source[start as usize..end as usize].trim_end_matches('\r'))
            .unwrap_or("")
    }

    /// Number of symbols declared directly in the global scope.
    pub fn global_symbol_count(&self) -> usize {
        self.scopes.first().map(|scope| scope.members.len()).unwrap_or(0)
    }

    /// The class or namespace scope that `id` opens, if any.
    pub fn body_of(
        &self,
        id: SymbolId,
    ) -> Option<&Scope> {
        self.symbol(id).body.map(|scope| self.scope(scope))
    }

    /// Function scope enclosing `scope`, if any.
    pub fn enclosing_function(
        &self,
        mut scope: ScopeId,
    ) -> Option<ScopeId> {
        loop {
            let current = self.scope(scope);
            match current.kind {
                ScopeKind::Function => return Some(scope),
                ScopeKind::Block => scope = current.parent?,
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/frontend/document_tests.rs"]
mod tests;
