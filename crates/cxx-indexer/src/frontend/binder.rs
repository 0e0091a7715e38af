//! Builds the symbol table and scope tree of one file from its CST.

use crate::frontend::document::{BoundTable, LineIndex, Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind};
use crate::frontend::syntax::{SyntaxKind as K, SyntaxNode, SyntaxToken, compact_text};

pub fn bind(
    root: &SyntaxNode,
    lines: &LineIndex,
) -> BoundTable {
    let mut binder = Binder {
        lines,
        table: BoundTable::default(),
    };
    binder.table.scopes.push(Scope {
        kind: ScopeKind::Global,
        parent: None,
        owner: None,
        start: 0,
        end: u32::from(root.text_range().end()) + 1,
        members: Vec::new(),
        usings: Vec::new(),
        prefix: String::new(),
    });
    binder.visit_children(root, ScopeId::GLOBAL);
    binder.table
}

/// A declared name: `bar` plus the `Foo` of `Foo::bar`.
#[derive(Debug, Clone)]
pub(crate) struct NameInfo {
    pub name: String,
    pub qualifier: Vec<String>,
    pub offset: u32,
    pub len: u32,
}

struct Binder<'a> {
    lines: &'a LineIndex,
    table: BoundTable,
}

impl Binder<'_> {
    fn visit_children(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        for child in node.children() {
            self.visit(&child, scope);
        }
    }

    fn visit(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        match node.kind() {
            K::NamespaceDef => self.bind_namespace(node, scope),
            K::UsingDirective => {
                if let Some(name) = name_child(node) {
                    let path = name_path(&name);
                    self.table.scopes[scope.index()].usings.push(path);
                }
            },
            K::AliasDecl => self.bind_alias(node, scope),
            K::TypedefDecl => self.bind_typedef(node, scope),
            K::ClassDef => {
                self.bind_class(node, scope, None);
            },
            K::EnumDef => {
                self.bind_enum(node, scope, None);
            },
            K::FunctionDecl => self.bind_function(node, scope),
            K::VarDecl => self.bind_variables(node, scope),
            K::Block | K::IfStmt | K::ForStmt | K::WhileStmt | K::SwitchStmt => {
                let inner = self.push_block(node, scope);
                self.visit_children(node, inner);
            },
            K::CatchClause | K::LambdaExpr => {
                let inner = self.push_block(node, scope);
                for child in node.children() {
                    match child.kind() {
                        K::ParamList => {
                            self.bind_params(&child, inner);
                        },
                        // the body shares the scope holding the parameters
                        K::Block => self.visit_children(&child, inner),
                        _ => self.visit(&child, inner),
                    }
                }
            },
            K::TypeRef
            | K::TemplateParams
            | K::TokenTree
            | K::AccessLabel
            | K::NameRef
            | K::QualifiedName
            | K::UsingDecl
            | K::ParamList => {},
            _ => self.visit_children(node, scope),
        }
    }

    fn bind_namespace(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        let Some(body) = child_of_kind(node, K::DeclList) else {
            return;
        };
        let (start, end) = node_range(&body);
        let mut current = scope;
        match name_child(node) {
            Some(name) => {
                // `namespace a::b {` opens one namespace per segment
                for segment in name_segments(&name) {
                    let id = self.add_symbol(current, SymbolKind::Namespace, segment);
                    let prefix = self.table.symbols[id.index()].qualified_name.clone();
                    current = self.push_scope(ScopeKind::Namespace, current, Some(id), start, end, prefix);
                }
            },
            None => {
                let prefix = self.table.scopes[scope.index()].prefix.clone();
                current = self.push_scope(ScopeKind::Namespace, scope, None, start, end, prefix);
            },
        }
        self.visit_children(&body, current);
    }

    fn bind_alias(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        let Some(declarator) = child_of_kind(node, K::Declarator) else {
            return;
        };
        let Some(name) = declarator_name(&declarator) else {
            return;
        };
        let id = self.add_symbol(scope, SymbolKind::Typedef, name);
        self.table.symbols[id.index()].type_name = child_of_kind(node, K::TypeRef).and_then(|ty| type_path(&ty));
    }

    fn bind_typedef(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        let declarators: Vec<SyntaxNode> = node.children().filter(|child| child.kind() == K::Declarator).collect();
        let first_name = declarators.first().and_then(declarator_name);

        let mut target = child_of_kind(node, K::TypeRef).and_then(|ty| type_path(&ty));
        let mut skip_first = false;
        for child in node.children() {
            let bound = match child.kind() {
                K::ClassDef => {
                    let anonymous = name_child(&child).is_none();
                    // `typedef struct { ... } Name;` names the class itself
                    let id = self.bind_class(&child, scope, if anonymous { first_name.clone() } else { None });
                    skip_first |= anonymous && id.is_some();
                    id
                },
                K::EnumDef => {
                    let anonymous = name_child(&child).is_none();
                    let id = self.bind_enum(&child, scope, if anonymous { first_name.clone() } else { None });
                    skip_first |= anonymous && id.is_some();
                    id
                },
                _ => None,
            };
            if let Some(id) = bound {
                target = Some(self.table.symbols[id.index()].qualified_name.clone());
            }
        }

        for (idx, declarator) in declarators.iter().enumerate() {
            if idx == 0 && skip_first {
                continue;
            }
            if let Some(name) = declarator_name(declarator) {
                let id = self.add_symbol(scope, SymbolKind::Typedef, name);
                self.table.symbols[id.index()].type_name = target.clone();
            }
        }
    }

    fn bind_class(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
        name_override: Option<NameInfo>,
    ) -> Option<SymbolId> {
        let body = child_of_kind(node, K::DeclList);
        let name = name_child(node).and_then(|name| name_info(&name)).or(name_override);

        let id = name.map(|name| {
            let kind = if body.is_some() { SymbolKind::Class } else { SymbolKind::ForwardClass };
            let id = self.add_symbol(scope, kind, name);
            let symbol = &mut self.table.symbols[id.index()];
            symbol.is_definition = body.is_some();
            symbol.bases = node
                .children()
                .filter(|child| child.kind() == K::BaseClause)
                .flat_map(|clause| clause.children())
                .filter_map(|spec| name_child(&spec))
                .map(|name| name_path(&name))
                .collect();
            id
        });

        if let Some(body) = body {
            let (start, end) = node_range(&body);
            let prefix = match id {
                Some(id) => self.table.symbols[id.index()].qualified_name.clone(),
                // anonymous struct/union members belong to the enclosing scope
                None => self.table.scopes[scope.index()].prefix.clone(),
            };
            let inner = self.push_scope(ScopeKind::Class, scope, id, start, end, prefix);
            if let Some(id) = id {
                self.table.symbols[id.index()].body = Some(inner);
            }
            self.visit_children(&body, inner);
        }
        id
    }

    fn bind_enum(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
        name_override: Option<NameInfo>,
    ) -> Option<SymbolId> {
        let scoped = node
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .any(|token| matches!(token.kind(), K::KwClass | K::KwStruct));
        let name = name_child(node).and_then(|name| name_info(&name)).or(name_override);
        let id = name.map(|name| {
            let id = self.add_symbol(scope, SymbolKind::Enum, name);
            self.table.symbols[id.index()].is_definition = child_of_kind(node, K::DeclList).is_some();
            id
        });

        let Some(body) = child_of_kind(node, K::DeclList) else {
            return id;
        };
        let (start, end) = node_range(&body);
        let prefix = match id {
            Some(id) if scoped => self.table.symbols[id.index()].qualified_name.clone(),
            _ => self.table.scopes[scope.index()].prefix.clone(),
        };
        let inner = self.push_scope(ScopeKind::Enum, scope, id, start, end, prefix);
        if let Some(id) = id {
            self.table.symbols[id.index()].body = Some(inner);
        }
        let enum_type = id.map(|id| self.table.symbols[id.index()].qualified_name.clone());
        for enumerator in body.children().filter(|child| child.kind() == K::Enumerator) {
            let Some(name) = declarator_name(&enumerator) else {
                continue;
            };
            let member = self.add_symbol(inner, SymbolKind::Enumerator, name);
            self.table.symbols[member.index()].type_name = enum_type.clone();
            if !scoped {
                self.table.scopes[scope.index()].members.push(member);
            }
        }
        id
    }

    fn bind_function(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        let params = child_of_kind(node, K::ParamList);
        let body = child_of_kind(node, K::Block);
        let Some(name) = name_child(node).and_then(|name| name_info(&name)) else {
            if let Some(body) = body {
                self.visit_children(&body, scope);
            }
            return;
        };

        let type_ref = child_of_kind(node, K::TypeRef);
        let direct_tokens: Vec<SyntaxToken> = node
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| !token.kind().is_trivia())
            .collect();
        let is_virtual = type_ref.as_ref().is_some_and(|ty| has_token(ty, K::KwVirtual))
            || direct_tokens.iter().any(|token| token.kind() == K::Ident && matches!(token.text(), "override" | "final"));
        let is_pure = direct_tokens
            .windows(2)
            .any(|pair| pair[0].kind() == K::Eq && pair[1].kind() == K::IntNumber && pair[1].text() == "0");

        let qualifier = name.qualifier.clone();
        let id = self.add_symbol(scope, SymbolKind::Function, name);
        {
            let symbol = &mut self.table.symbols[id.index()];
            symbol.type_name = type_ref.as_ref().and_then(type_path);
            symbol.params = params.as_ref().map(param_signature).unwrap_or_default();
            symbol.is_definition = body.is_some();
            symbol.is_virtual = is_virtual;
            symbol.is_pure = is_pure;
        }

        let start = params
            .as_ref()
            .map(|list| node_range(list).0)
            .unwrap_or_else(|| node_range(node).0);
        let end = node_range(node).1;
        let mut prefix = self.table.scopes[scope.index()].prefix.clone();
        for segment in &qualifier {
            push_segment(&mut prefix, segment);
        }
        let inner = self.push_scope(ScopeKind::Function, scope, Some(id), start, end, prefix);
        self.table.symbols[id.index()].body = Some(inner);

        if let Some(params) = params {
            self.bind_params(&params, inner);
        }
        for child in node.children() {
            match child.kind() {
                K::CtorInit => self.visit_children(&child, inner),
                K::Block => self.visit_children(&child, inner),
                _ => {},
            }
        }
    }

    fn bind_params(
        &mut self,
        list: &SyntaxNode,
        scope: ScopeId,
    ) {
        for param in list.children().filter(|child| child.kind() == K::Param) {
            let Some(name) = name_child(&param).and_then(|name| name_info(&name)) else {
                continue;
            };
            let id = self.add_symbol(scope, SymbolKind::Parameter, name);
            self.table.symbols[id.index()].type_name = child_of_kind(&param, K::TypeRef).and_then(|ty| type_path(&ty));
        }
    }

    fn bind_variables(
        &mut self,
        node: &SyntaxNode,
        scope: ScopeId,
    ) {
        let type_ref = child_of_kind(node, K::TypeRef);
        let mut type_name = type_ref.as_ref().and_then(type_path);
        let is_auto = type_ref.as_ref().is_some_and(|ty| has_token(ty, K::KwAuto));
        for child in node.children() {
            match child.kind() {
                K::ClassDef => {
                    if let Some(id) = self.bind_class(&child, scope, None) {
                        type_name = Some(self.table.symbols[id.index()].qualified_name.clone());
                    }
                },
                K::EnumDef => {
                    if let Some(id) = self.bind_enum(&child, scope, None) {
                        type_name = Some(self.table.symbols[id.index()].qualified_name.clone());
                    }
                },
                K::Declarator => {
                    if let Some(name) = declarator_name(&child) {
                        let id = self.add_symbol(scope, SymbolKind::Variable, name);
                        let symbol = &mut self.table.symbols[id.index()];
                        symbol.type_name = type_name.clone();
                        symbol.is_definition = true;
                        if is_auto {
                            symbol.initializer = child_of_kind(&child, K::Initializer).and_then(|init| initializer_expression(&init));
                        }
                    }
                    for init in child.children().filter(|child| child.kind() == K::Initializer) {
                        self.visit(&init, scope);
                    }
                },
                _ => {},
            }
        }
    }

    fn push_block(
        &mut self,
        node: &SyntaxNode,
        parent: ScopeId,
    ) -> ScopeId {
        let (start, end) = node_range(node);
        let prefix = self.table.scopes[parent.index()].prefix.clone();
        self.push_scope(ScopeKind::Block, parent, None, start, end, prefix)
    }

    fn push_scope(
        &mut self,
        kind: ScopeKind,
        parent: ScopeId,
        owner: Option<SymbolId>,
        start: u32,
        end: u32,
        prefix: String,
    ) -> ScopeId {
        let id = ScopeId(self.table.scopes.len() as u32);
        self.table.scopes.push(Scope {
            kind,
            parent: Some(parent),
            owner,
            start,
            end,
            members: Vec::new(),
            usings: Vec::new(),
            prefix,
        });
        id
    }

    fn add_symbol(
        &mut self,
        scope: ScopeId,
        kind: SymbolKind,
        name: NameInfo,
    ) -> SymbolId {
        let (line, column) = self.lines.position(name.offset);
        let mut qualified_name = self.table.scopes[scope.index()].prefix.clone();
        for segment in &name.qualifier {
            push_segment(&mut qualified_name, segment);
        }
        push_segment(&mut qualified_name, &name.name);

        let id = SymbolId(self.table.symbols.len() as u32);
        self.table.symbols.push(Symbol {
            name: name.name,
            qualifier: name.qualifier,
            qualified_name,
            kind,
            offset: name.offset,
            len: name.len,
            line,
            column,
            scope,
            body: None,
            type_name: None,
            initializer: None,
            params: Vec::new(),
            bases: Vec::new(),
            is_definition: false,
            is_virtual: false,
            is_pure: false,
            exported: !self.is_local(scope),
        });
        self.table.scopes[scope.index()].members.push(id);
        id
    }

    fn is_local(
        &self,
        mut scope: ScopeId,
    ) -> bool {
        loop {
            let current = &self.table.scopes[scope.index()];
            if matches!(current.kind, ScopeKind::Function | ScopeKind::Block) {
                return true;
            }
            match current.parent {
                Some(parent) => scope = parent,
                None => return false,
            }
        }
    }
}

fn push_segment(
    path: &mut String,
    segment: &str,
) {
    if !path.is_empty() {
        path.push_str("::");
    }
    path.push_str(segment);
}

fn node_range(node: &SyntaxNode) -> (u32, u32) {
    let range = node.text_range();
    (u32::from(range.start()), u32::from(range.end()))
}

fn child_of_kind(
    node: &SyntaxNode,
    kind: K,
) -> Option<SyntaxNode> {
    node.children().find(|child| child.kind() == kind)
}

fn has_token(
    node: &SyntaxNode,
    kind: K,
) -> bool {
    node.descendants_with_tokens()
        .filter_map(|element| element.into_token())
        .any(|token| token.kind() == kind)
}

/// The direct `NameRef` / `QualifiedName` child.
pub(crate) fn name_child(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children().find(|child| matches!(child.kind(), K::NameRef | K::QualifiedName))
}

/// Name of a declarator-like node: a name child or a bare identifier token.
fn declarator_name(node: &SyntaxNode) -> Option<NameInfo> {
    if let Some(name) = name_child(node) {
        return name_info(&name);
    }
    let token = node
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| token.kind() == K::Ident)?;
    Some(token_name(&token))
}

fn token_name(token: &SyntaxToken) -> NameInfo {
    let range = token.text_range();
    NameInfo {
        name: token.text().to_string(),
        qualifier: Vec::new(),
        offset: u32::from(range.start()),
        len: u32::from(range.len()),
    }
}

pub(crate) fn name_info(node: &SyntaxNode) -> Option<NameInfo> {
    let mut segments = name_segments(node);
    let mut last = segments.pop()?;
    last.qualifier = segments.into_iter().map(|segment| segment.name).collect();
    Some(last)
}

/// One `NameInfo` per `NameRef` segment of a name node.
fn name_segments(node: &SyntaxNode) -> Vec<NameInfo> {
    match node.kind() {
        K::NameRef => segment_info(node).into_iter().collect(),
        _ => node
            .children()
            .filter(|child| child.kind() == K::NameRef)
            .filter_map(|segment| segment_info(&segment))
            .collect(),
    }
}

fn segment_info(segment: &SyntaxNode) -> Option<NameInfo> {
    let first = segment
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| !token.kind().is_trivia())?;
    if first.kind() == K::Ident {
        return Some(token_name(&first));
    }
    let (start, end) = node_range(segment);
    let text = compact_text(segment);
    if text.is_empty() {
        return None;
    }
    Some(NameInfo {
        name: text,
        qualifier: Vec::new(),
        offset: start,
        len: end - start,
    })
}

/// `a::b<T>::c` -> `a::b::c`.
pub(crate) fn name_path(node: &SyntaxNode) -> String {
    name_segments(node)
        .into_iter()
        .map(|segment| segment.name)
        .collect::<Vec<_>>()
        .join("::")
}

/// Named type of a `TypeRef`, ignoring builtins and qualifiers.
pub(crate) fn type_path(type_ref: &SyntaxNode) -> Option<String> {
    name_child(type_ref).map(|name| name_path(&name)).filter(|path| !path.is_empty())
}

fn param_signature(list: &SyntaxNode) -> Vec<String> {
    let mut params: Vec<String> = list
        .children()
        .filter(|child| child.kind() == K::Param)
        .map(|param| {
            let mut text = child_of_kind(&param, K::TypeRef)
                .map(|ty| compact_text(&ty))
                .unwrap_or_default();
            for token in param.children_with_tokens().filter_map(|element| element.into_token()) {
                match token.kind() {
                    K::Star | K::Amp | K::AmpAmp | K::Ellipsis => text.push_str(token.text()),
                    K::LBracket => text.push_str("[]"),
                    _ => {},
                }
            }
            text
        })
        .collect();
    if params.len() == 1 && params[0] == "void" {
        params.clear();
    }
    let variadic = list
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .any(|token| token.kind() == K::Ellipsis);
    if variadic {
        params.push("...".to_string());
    }
    params
}

/// The expression after `=` in an initializer.
fn initializer_expression(init: &SyntaxNode) -> Option<String> {
    let first = init
        .children_with_tokens()
        .filter_map(|element| element.into_token())
        .find(|token| !token.kind().is_trivia())?;
    if first.kind() != K::Eq {
        return None;
    }
    let expr = init.children().next()?;
    Some(expr.text().to_string())
}

#[cfg(test)]
#[path = "../../tests/src/frontend/binder_tests.rs"]
mod tests;
