//! Name lookup and expression evaluation over a snapshot.
//!
//! A [`LookupContext`] sees one document plus everything it transitively
//! includes. Expressions are re-lexed and evaluated as postfix chains of
//! names, member accesses, calls and subscripts; anything else yields no
//! candidates.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::frontend::Snapshot;
use crate::frontend::document::{Document, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind};
use crate::frontend::syntax::{SyntaxKind as K, lexer::significant_tokens};

const MAX_DEPTH: u32 = 16;

/// A symbol together with the document that declares it.
#[derive(Debug, Clone)]
pub struct SymbolRef {
    document: Arc<Document>,
    id: SymbolId,
}

impl SymbolRef {
    pub fn new(
        document: Arc<Document>,
        id: SymbolId,
    ) -> Self {
        Self {
            document,
            id,
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn symbol(&self) -> &Symbol {
        self.document.symbol(self.id)
    }

    pub fn path(&self) -> &Path {
        self.document.path()
    }

    pub fn same_symbol(
        &self,
        other: &SymbolRef,
    ) -> bool {
        self.id == other.id
            && (Arc::ptr_eq(&self.document, &other.document)
                || (self.path() == other.path() && self.document.revision() == other.document.revision()))
    }
}

/// Which symbols a lookup step may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    Any,
    /// Things that can appear left of `::`.
    Scope,
}

impl Want {
    fn accepts(
        self,
        symbol: &Symbol,
    ) -> bool {
        match self {
            Want::Any => true,
            Want::Scope => symbol.kind.is_scope_like() || matches!(symbol.kind, SymbolKind::ForwardClass | SymbolKind::Typedef),
        }
    }
}

pub struct LookupContext<'s> {
    snapshot: &'s Snapshot,
    visible: Vec<Arc<Document>>,
}

impl<'s> LookupContext<'s> {
    /// Context seeing `document` and its transitive includes, breadth first.
    pub fn new(
        document: &Arc<Document>,
        snapshot: &'s Snapshot,
    ) -> Self {
        let mut visible = vec![document.clone()];
        let mut seen: HashSet<&Path> = HashSet::new();
        seen.insert(document.path());
        let mut queue = VecDeque::from([document.clone()]);
        while let Some(current) = queue.pop_front() {
            for include in current.includes() {
                let Some(resolved) = include.resolved.as_deref() else {
                    continue;
                };
                let Some(next) = snapshot.get(resolved) else {
                    continue;
                };
                if seen.insert(next.path()) {
                    visible.push(next.clone());
                    queue.push_back(next.clone());
                }
            }
        }
        Self {
            snapshot,
            visible,
        }
    }

    pub fn snapshot(&self) -> &'s Snapshot {
        self.snapshot
    }

    pub fn visible(&self) -> &[Arc<Document>] {
        &self.visible
    }

    fn is_visible(
        &self,
        document: &Document,
    ) -> bool {
        self.visible.iter().any(|doc| doc.path() == document.path())
    }

    /// Evaluates `expression` as written inside `scope` of `document`.
    pub fn lookup(
        &self,
        document: &Arc<Document>,
        scope: ScopeId,
        expression: &str,
    ) -> Vec<SymbolRef> {
        if !self.is_visible(document) {
            return LookupContext::new(document, self.snapshot).lookup(document, scope, expression);
        }
        let tokens = significant_tokens(expression);
        let mut evaluator = Evaluator {
            cx: self,
            document,
            scope,
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let result = evaluator.run();
        trace!(expression, candidates = result.len(), "evaluated expression");
        result
    }

    /// Every visible symbol whose qualified name is `key`.
    fn exported(
        &self,
        key: &str,
        want: Want,
    ) -> Vec<SymbolRef> {
        self.visible
            .iter()
            .flat_map(|doc| {
                doc.exported(key)
                    .iter()
                    .filter(|id| want.accepts(doc.symbol(**id)))
                    .map(|id| SymbolRef::new(doc.clone(), *id))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn namespace_members(
        &self,
        prefix: &str,
        name: &str,
        want: Want,
    ) -> Vec<SymbolRef> {
        self.exported(&join(prefix, name), want)
    }

    fn unqualified(
        &self,
        document: &Arc<Document>,
        scope: ScopeId,
        name: &str,
        want: Want,
        depth: u32,
    ) -> Vec<SymbolRef> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = document.scope(id);
            let found = match scope.kind {
                ScopeKind::Block | ScopeKind::Enum => local_members(document, id, name, want),
                ScopeKind::Function => {
                    let mut found = local_members(document, id, name, want);
                    if found.is_empty()
                        && let Some(owner) = scope.owner
                    {
                        found = self.function_context(&SymbolRef::new(document.clone(), owner), name, want, depth);
                    }
                    found
                },
                ScopeKind::Class => match scope.owner {
                    Some(owner) => self.class_members(&SymbolRef::new(document.clone(), owner), name, want, depth),
                    None => local_members(document, id, name, want),
                },
                ScopeKind::Namespace | ScopeKind::Global => {
                    let mut found = self.namespace_members(&scope.prefix, name, want);
                    if found.is_empty() {
                        found = local_members(document, id, name, want);
                    }
                    for using in &scope.usings {
                        if !found.is_empty() {
                            break;
                        }
                        found = self.namespace_members(&join(&scope.prefix, using), name, want);
                        if found.is_empty() && !scope.prefix.is_empty() {
                            found = self.namespace_members(using, name, want);
                        }
                    }
                    found
                },
            };
            if !found.is_empty() {
                return found;
            }
            current = scope.parent;
        }
        Vec::new()
    }

    /// Members of the class an out-of-line member function belongs to, then
    /// the scopes enclosing that class.
    fn function_context(
        &self,
        function: &SymbolRef,
        name: &str,
        want: Want,
        depth: u32,
    ) -> Vec<SymbolRef> {
        let symbol = function.symbol();
        if symbol.qualifier.is_empty() {
            return Vec::new();
        }
        let Some(class) = self.class_of_function(function, depth) else {
            return Vec::new();
        };
        let found = self.class_members(&class, name, want, depth + 1);
        if !found.is_empty() {
            return found;
        }
        self.unqualified(class.document(), class.symbol().scope, name, want, depth + 1)
    }

    fn class_of_function(
        &self,
        function: &SymbolRef,
        depth: u32,
    ) -> Option<SymbolRef> {
        let document = function.document();
        let symbol = function.symbol();
        let scope = document.scope(symbol.scope);
        if scope.kind == ScopeKind::Class {
            return scope.owner.map(|owner| SymbolRef::new(document.clone(), owner));
        }
        if symbol.qualifier.is_empty() {
            return None;
        }
        let segments: Vec<&str> = symbol.qualifier.iter().map(String::as_str).collect();
        let found = self.qualified(document, symbol.scope, false, &segments, Want::Scope, depth + 1);
        found.first().and_then(|entity| self.resolve_class(entity, depth + 1))
    }

    /// Members declared in the class body, then in its bases.
    fn class_members(
        &self,
        class: &SymbolRef,
        name: &str,
        want: Want,
        depth: u32,
    ) -> Vec<SymbolRef> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let Some(class) = self.resolve_class(class, depth) else {
            return Vec::new();
        };
        let symbol = class.symbol();
        let Some(body) = symbol.body else {
            return Vec::new();
        };
        let found = local_members(class.document(), body, name, want);
        if !found.is_empty() || symbol.kind != SymbolKind::Class {
            return found;
        }
        for base in &symbol.bases {
            let segments: Vec<&str> = base.split("::").collect();
            let bases = self.qualified(class.document(), symbol.scope, false, &segments, Want::Scope, depth + 1);
            if let Some(base) = bases.first() {
                let found = self.class_members(base, name, want, depth + 1);
                if !found.is_empty() {
                    return found;
                }
            }
        }
        Vec::new()
    }

    /// Follows typedefs and forward declarations to the entity that owns
    /// members: a class, enum or namespace.
    fn resolve_class(
        &self,
        entity: &SymbolRef,
        depth: u32,
    ) -> Option<SymbolRef> {
        if depth > MAX_DEPTH {
            return None;
        }
        let symbol = entity.symbol();
        match symbol.kind {
            SymbolKind::Class | SymbolKind::Enum | SymbolKind::Namespace => Some(entity.clone()),
            SymbolKind::ForwardClass => self
                .exported(&symbol.qualified_name, Want::Any)
                .into_iter()
                .find(|candidate| candidate.symbol().kind == SymbolKind::Class)
                .or_else(|| find_matching_class(entity, self.snapshot))
                .or_else(|| Some(entity.clone())),
            _ => self.type_of(entity, depth + 1),
        }
    }

    /// Class (or enum) named by the declared type of a symbol.
    fn type_of(
        &self,
        entity: &SymbolRef,
        depth: u32,
    ) -> Option<SymbolRef> {
        if depth > MAX_DEPTH {
            return None;
        }
        let symbol = entity.symbol();
        if symbol.kind.is_scope_like() || symbol.kind == SymbolKind::ForwardClass {
            return self.resolve_class(entity, depth + 1);
        }
        let document = entity.document();
        if let Some(type_name) = &symbol.type_name {
            let segments: Vec<&str> = type_name.split("::").collect();
            let found = self.qualified(document, symbol.scope, false, &segments, Want::Scope, depth + 1);
            return found.first().and_then(|found| self.resolve_class(found, depth + 1));
        }
        let initializer = symbol.initializer.as_deref()?;
        let tokens = significant_tokens(initializer);
        let mut evaluator = Evaluator {
            cx: self,
            document,
            scope: symbol.scope,
            tokens: &tokens,
            pos: 0,
            depth: depth + 1,
        };
        let value = evaluator.expression();
        evaluator.type_of_value(&value)
    }

    /// `a::b::c` (or `::a::b` when `global`) looked up from `scope`.
    fn qualified(
        &self,
        document: &Arc<Document>,
        scope: ScopeId,
        global: bool,
        segments: &[&str],
        want: Want,
        depth: u32,
    ) -> Vec<SymbolRef> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };
        let first_want = if rest.is_empty() { want } else { Want::Scope };
        let mut found = if global {
            self.exported(first, first_want)
        } else {
            self.unqualified(document, scope, first, first_want, depth)
        };
        for (idx, segment) in rest.iter().enumerate() {
            let step_want = if idx + 1 == rest.len() { want } else { Want::Scope };
            found = found
                .iter()
                .map(|entity| self.members_of(entity, segment, step_want, depth))
                .find(|members| !members.is_empty())
                .unwrap_or_default();
            if found.is_empty() {
                break;
            }
        }
        found
    }

    fn members_of(
        &self,
        entity: &SymbolRef,
        name: &str,
        want: Want,
        depth: u32,
    ) -> Vec<SymbolRef> {
        let Some(owner) = self.resolve_class(entity, depth + 1) else {
            return Vec::new();
        };
        let symbol = owner.symbol();
        match symbol.kind {
            SymbolKind::Namespace => self.namespace_members(&symbol.qualified_name, name, want),
            SymbolKind::Enum => symbol
                .body
                .map(|body| local_members(owner.document(), body, name, want))
                .unwrap_or_default(),
            _ => self.class_members(&owner, name, want, depth + 1),
        }
    }

    /// The class `this` refers to inside `scope`.
    fn this_class(
        &self,
        document: &Arc<Document>,
        scope: ScopeId,
        depth: u32,
    ) -> Option<SymbolRef> {
        let function = document.enclosing_function(scope)?;
        let owner = document.scope(function).owner?;
        self.class_of_function(&SymbolRef::new(document.clone(), owner), depth)
    }
}

fn join(
    prefix: &str,
    name: &str,
) -> String {
    if prefix.is_empty() { name.to_string() } else { format!("{prefix}::{name}") }
}

fn local_members(
    document: &Arc<Document>,
    scope: ScopeId,
    name: &str,
    want: Want,
) -> Vec<SymbolRef> {
    document
        .scope(scope)
        .members
        .iter()
        .filter(|id| {
            let symbol = document.symbol(**id);
            symbol.name == name && want.accepts(symbol)
        })
        .map(|id| SymbolRef::new(document.clone(), *id))
        .collect()
}

#[derive(Debug, Clone)]
enum Value {
    Symbols(Vec<SymbolRef>),
    /// Result of a call or subscript: an object of this class.
    Object(SymbolRef),
    Nothing,
}

struct Evaluator<'c, 's, 't, 'a> {
    cx: &'c LookupContext<'s>,
    document: &'c Arc<Document>,
    scope: ScopeId,
    tokens: &'t [(K, &'a str, usize)],
    pos: usize,
    depth: u32,
}

impl Evaluator<'_, '_, '_, '_> {
    fn run(&mut self) -> Vec<SymbolRef> {
        let value = self.expression();
        if self.pos != self.tokens.len() {
            return Vec::new();
        }
        match value {
            Value::Symbols(symbols) => symbols,
            Value::Object(class) => vec![class],
            Value::Nothing => Vec::new(),
        }
    }

    fn peek(&self) -> K {
        self.tokens.get(self.pos).map(|(kind, _, _)| *kind).unwrap_or(K::Eof)
    }

    fn nth(
        &self,
        n: usize,
    ) -> K {
        self.tokens.get(self.pos + n).map(|(kind, _, _)| *kind).unwrap_or(K::Eof)
    }

    fn text(&self) -> &str {
        self.tokens.get(self.pos).map(|(_, text, _)| *text).unwrap_or("")
    }

    fn eat(
        &mut self,
        kind: K,
    ) -> bool {
        if self.peek() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expression(&mut self) -> Value {
        while matches!(self.peek(), K::Star | K::Amp | K::Bang | K::Minus | K::Plus | K::PlusPlus | K::MinusMinus)
            || (self.peek() == K::Tilde && self.nth(1) != K::Ident)
        {
            self.pos += 1;
        }
        let mut value = self.primary();
        loop {
            match self.peek() {
                K::Dot | K::Arrow => {
                    self.pos += 1;
                    let Some((_, segments)) = self.name() else {
                        return Value::Nothing;
                    };
                    value = self.member(&value, &segments);
                },
                K::LParen => {
                    if !self.skip_balanced(K::LParen, K::RParen) {
                        return Value::Nothing;
                    }
                    value = self.call(&value);
                },
                K::LBracket => {
                    if !self.skip_balanced(K::LBracket, K::RBracket) {
                        return Value::Nothing;
                    }
                    value = match self.type_of_value(&value) {
                        Some(class) => Value::Object(class),
                        None => Value::Nothing,
                    };
                },
                K::PlusPlus | K::MinusMinus => self.pos += 1,
                _ => break,
            }
        }
        value
    }

    fn primary(&mut self) -> Value {
        match self.peek() {
            K::KwThis => {
                self.pos += 1;
                match self.cx.this_class(self.document, self.scope, self.depth) {
                    Some(class) => Value::Object(class),
                    None => Value::Nothing,
                }
            },
            K::LParen => {
                self.pos += 1;
                let value = self.expression();
                if !self.eat(K::RParen) {
                    self.pos = self.tokens.len() + 1;
                    return Value::Nothing;
                }
                value
            },
            K::Ident | K::ColonColon | K::Tilde | K::KwOperator => {
                let Some((global, segments)) = self.name() else {
                    return Value::Nothing;
                };
                let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
                Value::Symbols(self.cx.qualified(
                    self.document,
                    self.scope,
                    global,
                    &segments,
                    Want::Any,
                    self.depth,
                ))
            },
            _ => Value::Nothing,
        }
    }

    /// `[::] segment (:: segment)*`, template arguments skipped.
    fn name(&mut self) -> Option<(bool, Vec<String>)> {
        let global = self.eat(K::ColonColon);
        let mut segments = vec![self.segment()?];
        while self.peek() == K::ColonColon && matches!(self.nth(1), K::Ident | K::Tilde | K::KwOperator) {
            self.pos += 1;
            segments.push(self.segment()?);
        }
        Some((global, segments))
    }

    fn segment(&mut self) -> Option<String> {
        match self.peek() {
            K::Ident => {
                let name = self.text().to_string();
                self.pos += 1;
                if self.peek() == K::Lt {
                    let save = self.pos;
                    if !self.skip_angles() {
                        self.pos = save;
                    }
                }
                Some(name)
            },
            K::Tilde if self.nth(1) == K::Ident => {
                self.pos += 1;
                let name = format!("~{}", self.text());
                self.pos += 1;
                Some(name)
            },
            K::KwOperator => {
                self.pos += 1;
                let mut name = String::from("operator");
                match self.peek() {
                    K::LParen if self.nth(1) == K::RParen => {
                        name.push_str("()");
                        self.pos += 2;
                    },
                    K::LBracket if self.nth(1) == K::RBracket => {
                        name.push_str("[]");
                        self.pos += 2;
                    },
                    K::Eof => return None,
                    _ => {
                        name.push_str(self.text());
                        self.pos += 1;
                    },
                }
                Some(name)
            },
            _ => None,
        }
    }

    fn skip_angles(&mut self) -> bool {
        let mut depth = 0usize;
        while self.pos < self.tokens.len() {
            match self.peek() {
                K::Lt => depth += 1,
                K::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return true;
                    }
                },
                K::Semicolon | K::LBrace | K::RBrace => return false,
                _ => {},
            }
            self.pos += 1;
        }
        false
    }

    fn skip_balanced(
        &mut self,
        open: K,
        close: K,
    ) -> bool {
        let mut depth = 0usize;
        while self.pos < self.tokens.len() {
            let kind = self.peek();
            self.pos += 1;
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
        }
        false
    }

    fn member(
        &mut self,
        base: &Value,
        segments: &[String],
    ) -> Value {
        let Some(class) = self.type_of_value(base) else {
            return Value::Nothing;
        };
        let mut found = vec![class];
        for segment in segments {
            found = found
                .iter()
                .map(|entity| self.cx.members_of(entity, segment, Want::Any, self.depth))
                .find(|members| !members.is_empty())
                .unwrap_or_default();
        }
        Value::Symbols(found)
    }

    fn call(
        &mut self,
        callee: &Value,
    ) -> Value {
        match callee {
            Value::Symbols(symbols) => {
                let Some(first) = symbols.first() else {
                    return Value::Nothing;
                };
                match first.symbol().kind {
                    SymbolKind::Function | SymbolKind::Class | SymbolKind::ForwardClass | SymbolKind::Typedef => {
                        match self.cx.type_of(first, self.depth + 1) {
                            Some(class) => Value::Object(class),
                            None => Value::Nothing,
                        }
                    },
                    _ => Value::Nothing,
                }
            },
            Value::Object(_) | Value::Nothing => Value::Nothing,
        }
    }

    fn type_of_value(
        &self,
        value: &Value,
    ) -> Option<SymbolRef> {
        match value {
            Value::Object(class) => Some(class.clone()),
            Value::Symbols(symbols) => symbols.iter().find_map(|symbol| self.cx.type_of(symbol, self.depth + 1)),
            Value::Nothing => None,
        }
    }
}

/// Picks the declaration a lookup denotes: a virtual member wins over
/// constructors and destructors, otherwise the first candidate.
pub fn canonical(candidates: &[SymbolRef]) -> Option<SymbolRef> {
    for candidate in candidates.iter().rev() {
        let document = candidate.document();
        let symbol = candidate.symbol();
        let scope = document.scope(symbol.scope);
        if scope.kind != ScopeKind::Class {
            continue;
        }
        if let Some(owner) = scope.owner {
            let class_name = &document.symbol(owner).name;
            if symbol.name.trim_start_matches('~') == class_name.as_str() {
                continue;
            }
        }
        if symbol.is_function() && symbol.is_virtual {
            return Some(candidate.clone());
        }
    }
    candidates.first().cloned()
}

/// Whether `a` and `b` name the same entity: the same symbol, or matching
/// exported declarations of it (a function's declaration and definition, a
/// class and its forward declarations).
pub fn same_entity(
    a: &SymbolRef,
    b: &SymbolRef,
) -> bool {
    if a.same_symbol(b) {
        return true;
    }
    let (x, y) = (a.symbol(), b.symbol());
    if !x.exported || !y.exported || x.qualified_name != y.qualified_name {
        return false;
    }
    match (x.kind, y.kind) {
        (SymbolKind::Function, SymbolKind::Function) => x.params == y.params,
        (k1, k2) if k1.is_class_like() && k2.is_class_like() => true,
        (k1, k2) => k1 == k2 && !matches!(k1, SymbolKind::Parameter),
    }
}

fn identifier_of(name: &str) -> Option<&str> {
    let ident = name.trim_start_matches('~');
    (!ident.starts_with("operator")).then_some(ident)
}

/// Exported symbols named `key` in every document that may declare them.
fn snapshot_symbols<'a>(
    snapshot: &'a Snapshot,
    name: &'a str,
    key: &'a str,
) -> impl Iterator<Item = SymbolRef> + 'a {
    let ident = identifier_of(name);
    snapshot
        .documents()
        .filter(move |doc| ident.is_none_or(|ident| doc.contains_identifier(ident)))
        .flat_map(move |doc| {
            doc.exported(key)
                .iter()
                .map(|id| SymbolRef::new(doc.clone(), *id))
                .collect::<Vec<_>>()
        })
}

/// Definition of the function `symbol` declares. A definition is its own
/// match. `strict` requires identical parameter types; otherwise the
/// parameter count, then the name alone decide.
pub fn find_matching_definition(
    symbol: &SymbolRef,
    snapshot: &Snapshot,
    strict: bool,
) -> Option<SymbolRef> {
    let declaration = symbol.symbol();
    if !declaration.is_function() {
        return None;
    }
    if declaration.is_definition {
        return Some(symbol.clone());
    }
    if !declaration.exported {
        return None;
    }
    let definitions: Vec<SymbolRef> = snapshot_symbols(snapshot, &declaration.name, &declaration.qualified_name)
        .filter(|candidate| {
            let candidate = candidate.symbol();
            candidate.is_function() && candidate.is_definition
        })
        .collect();
    if let Some(found) = definitions.iter().find(|candidate| candidate.symbol().params == declaration.params) {
        return Some(found.clone());
    }
    if strict {
        return None;
    }
    definitions
        .iter()
        .find(|candidate| candidate.symbol().params.len() == declaration.params.len())
        .or_else(|| definitions.first())
        .cloned()
        .or_else(|| find_by_suffix(symbol, snapshot, true))
}

/// Declarations matching a function definition, best match first.
pub fn find_matching_declarations(
    symbol: &SymbolRef,
    snapshot: &Snapshot,
) -> Vec<SymbolRef> {
    let definition = symbol.symbol();
    if !definition.is_function() || !definition.exported {
        return Vec::new();
    }
    let declarations: Vec<SymbolRef> = snapshot_symbols(snapshot, &definition.name, &definition.qualified_name)
        .filter(|candidate| {
            let candidate = candidate.symbol();
            candidate.is_function() && !candidate.is_definition
        })
        .collect();

    let mut ordered: Vec<SymbolRef> = Vec::with_capacity(declarations.len());
    let tiers: [&dyn Fn(&Symbol) -> bool; 3] = [
        &|candidate: &Symbol| candidate.params == definition.params,
        &|candidate: &Symbol| candidate.params.len() == definition.params.len(),
        &|_: &Symbol| true,
    ];
    for tier in tiers {
        for candidate in &declarations {
            if tier(candidate.symbol()) && !ordered.iter().any(|seen| seen.same_symbol(candidate)) {
                ordered.push(candidate.clone());
            }
        }
    }
    if ordered.is_empty()
        && let Some(found) = find_by_suffix(symbol, snapshot, false)
    {
        ordered.push(found);
    }
    ordered
}

/// Definition of the class a forward declaration names.
pub fn find_matching_class(
    symbol: &SymbolRef,
    snapshot: &Snapshot,
) -> Option<SymbolRef> {
    let forward = symbol.symbol();
    if !forward.kind.is_class_like() {
        return None;
    }
    snapshot_symbols(snapshot, &forward.name, &forward.qualified_name)
        .find(|candidate| candidate.symbol().kind == SymbolKind::Class)
}

/// A function counterpart whose qualified name differs only by leading
/// namespaces, e.g. a definition written after `using namespace`.
fn find_by_suffix(
    symbol: &SymbolRef,
    snapshot: &Snapshot,
    want_definition: bool,
) -> Option<SymbolRef> {
    let target = symbol.symbol();
    let ident = identifier_of(&target.name)?;
    snapshot
        .documents()
        .filter(|doc| doc.contains_identifier(ident))
        .flat_map(|doc| {
            doc.symbol_ids()
                .map(|id| SymbolRef::new(doc.clone(), id))
                .collect::<Vec<_>>()
        })
        .find(|candidate| {
            let other = candidate.symbol();
            other.is_function()
                && other.exported
                && other.is_definition == want_definition
                && other.name == target.name
                && other.params.len() == target.params.len()
                && (other.qualified_name.ends_with(&format!("::{}", target.qualified_name))
                    || target.qualified_name.ends_with(&format!("::{}", other.qualified_name)))
        })
}

#[cfg(test)]
#[path = "../../tests/src/frontend/lookup_tests.rs"]
mod tests;
