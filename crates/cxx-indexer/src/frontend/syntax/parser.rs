use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use crate::frontend::syntax::{kind::SyntaxKind, lexer::Lexer};

use SyntaxKind as K;

const MAX_DEPTH: u32 = 192;

/// A recoverable syntax error at a byte offset of the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclContext {
    Namespace,
    Class,
    Block,
    Param,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameMode {
    /// `<` after a name always opens template arguments.
    Type,
    /// `<` opens template arguments only when the closing `>` is followed by
    /// something that cannot continue a comparison.
    Expr,
}

/// Error-tolerant recursive descent parser producing a lossless rowan tree.
///
/// The parser never fails: anything it does not understand ends up inside an
/// `ErrorNode` (or a `TokenTree` for balanced groups it skips on purpose) and
/// parsing resumes at the next plausible declaration or statement.
pub struct Parser<'a> {
    tokens: Vec<(SyntaxKind, &'a str)>,
    offsets: Vec<usize>,
    significant: Vec<usize>,
    pos: usize,
    sig: usize,
    depth: u32,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let tokens: Vec<_> = Lexer::new(input).collect();
        let mut offsets = Vec::with_capacity(tokens.len());
        let mut significant = Vec::new();
        let mut offset = 0usize;
        for (idx, (kind, text)) in tokens.iter().enumerate() {
            offsets.push(offset);
            offset += text.len();
            if !kind.is_trivia() {
                significant.push(idx);
            }
        }
        Self {
            tokens,
            offsets,
            significant,
            pos: 0,
            sig: 0,
            depth: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Parse {
        self.builder.start_node(K::Root.into());
        while !self.at_eof() {
            self.parse_declaration(DeclContext::Namespace);
        }
        self.skip_trivia();
        self.builder.finish_node();
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // ---------------------------------------------------------------------
    // declarations

    fn parse_declaration(
        &mut self,
        ctx: DeclContext,
    ) {
        let before = self.sig;
        self.skip_attributes();
        match self.peek() {
            K::Eof => return,
            K::Semicolon => self.bump(),
            K::KwNamespace => self.parse_namespace(),
            K::KwInline if self.nth(1) == K::KwNamespace => self.parse_namespace(),
            K::KwUsing => self.parse_using(),
            K::KwTypedef => self.parse_typedef(),
            K::KwTemplate => self.parse_template(ctx),
            K::KwExtern if self.nth(1) == K::StringLit => self.parse_linkage_spec(),
            K::KwStaticAssert => self.parse_token_statement(),
            K::KwAccess if self.nth(1) == K::Colon => {
                self.start_node(K::AccessLabel);
                self.bump();
                self.bump();
                self.finish_node();
            },
            K::KwClass | K::KwStruct | K::KwUnion if self.class_head_follows() => self.parse_class_declaration(ctx),
            K::KwEnum if self.enum_head_follows() => self.parse_enum_declaration(ctx),
            K::RBrace => {
                self.error_here("unbalanced `}`");
                self.bump_error();
            },
            _ => self.parse_simple_declaration(ctx),
        }
        if self.sig == before {
            self.bump_error();
        }
    }

    fn parse_namespace(&mut self) {
        if self.nth(1) == K::Ident && self.nth(2) == K::Eq {
            // namespace alias
            self.parse_token_statement();
            return;
        }
        self.start_node(K::NamespaceDef);
        self.eat(K::KwInline);
        self.bump();
        self.skip_attributes();
        if matches!(self.peek(), K::Ident | K::ColonColon) {
            self.parse_name(NameMode::Type);
        }
        if self.at(K::LBrace) {
            self.parse_decl_list(DeclContext::Namespace);
        } else {
            self.error_here("expected `{` after namespace name");
        }
        self.finish_node();
    }

    fn parse_using(&mut self) {
        if self.nth(1) == K::KwNamespace {
            self.start_node(K::UsingDirective);
            self.bump();
            self.bump();
            self.parse_name(NameMode::Type);
            self.expect(K::Semicolon);
            self.finish_node();
        } else if self.nth(1) == K::Ident && self.nth(2) == K::Eq {
            self.start_node(K::AliasDecl);
            self.bump();
            self.start_node(K::Declarator);
            self.bump();
            self.finish_node();
            self.bump();
            self.parse_type_ref(DeclContext::Param);
            self.expect(K::Semicolon);
            self.finish_node();
        } else {
            self.start_node(K::UsingDecl);
            self.bump();
            self.eat(K::KwTypename);
            if matches!(self.peek(), K::Ident | K::ColonColon) {
                self.parse_name(NameMode::Type);
            }
            self.recover_to_semicolon();
            self.finish_node();
        }
    }

    fn parse_typedef(&mut self) {
        self.start_node(K::TypedefDecl);
        self.bump();
        match self.peek() {
            K::KwClass | K::KwStruct | K::KwUnion if self.class_body_follows() => self.parse_class_def(),
            K::KwEnum if self.enum_head_follows() => self.parse_enum_def(),
            _ => {
                self.parse_type_ref(DeclContext::Param);
            },
        }
        self.parse_declarator_list(DeclContext::Namespace);
        self.expect(K::Semicolon);
        self.finish_node();
    }

    fn parse_template(
        &mut self,
        ctx: DeclContext,
    ) {
        self.start_node(K::TemplateDecl);
        self.bump();
        if self.at(K::Lt) {
            self.start_node(K::TemplateParams);
            self.bump_balanced_angles();
            self.finish_node();
        }
        if !self.at_eof() {
            self.parse_declaration(ctx);
        }
        self.finish_node();
    }

    fn parse_linkage_spec(&mut self) {
        self.start_node(K::LinkageSpec);
        self.bump();
        self.bump();
        if self.at(K::LBrace) {
            self.parse_decl_list(DeclContext::Namespace);
        } else {
            self.parse_declaration(DeclContext::Namespace);
        }
        self.finish_node();
    }

    fn parse_decl_list(
        &mut self,
        ctx: DeclContext,
    ) {
        if self.depth > MAX_DEPTH {
            self.bump_balanced(K::TokenTree, K::LBrace, K::RBrace);
            return;
        }
        self.depth += 1;
        self.start_node(K::DeclList);
        self.bump();
        while !self.at_eof() && !self.at(K::RBrace) {
            self.parse_declaration(ctx);
        }
        self.expect(K::RBrace);
        self.finish_node();
        self.depth -= 1;
    }

    fn parse_class_declaration(
        &mut self,
        ctx: DeclContext,
    ) {
        let cp = self.checkpoint();
        self.parse_class_def();
        self.finish_tagged_declaration(cp, ctx);
    }

    fn parse_enum_declaration(
        &mut self,
        ctx: DeclContext,
    ) {
        let cp = self.checkpoint();
        self.parse_enum_def();
        self.finish_tagged_declaration(cp, ctx);
    }

    /// `struct S { ... } s, *p;` wraps the definition into a variable declaration.
    fn finish_tagged_declaration(
        &mut self,
        cp: Checkpoint,
        ctx: DeclContext,
    ) {
        if self.eat(K::Semicolon) {
            return;
        }
        if self.at_declarator_start() {
            self.start_node_at(cp, K::VarDecl);
            self.parse_declarator_list(ctx);
            self.expect(K::Semicolon);
            self.finish_node();
        } else {
            self.error_here("expected `;` after type definition");
        }
    }

    fn parse_class_def(&mut self) {
        self.start_node(K::ClassDef);
        self.bump();
        self.skip_attributes();
        if self.at(K::Ident) && self.nth(1) == K::Ident && !matches!(self.text_at(self.sig + 1), "final" | "sealed") {
            // export macro: `class EXPORT Name {`
            self.bump();
        }
        if matches!(self.peek(), K::Ident | K::ColonColon) {
            self.parse_name(NameMode::Type);
        }
        while self.at(K::Ident) && matches!(self.peek_text(), "final" | "sealed") {
            self.bump();
        }
        if self.at(K::Colon) {
            self.parse_base_clause();
        }
        if self.at(K::LBrace) {
            self.parse_decl_list(DeclContext::Class);
        }
        self.finish_node();
    }

    fn parse_base_clause(&mut self) {
        self.start_node(K::BaseClause);
        self.bump();
        loop {
            self.start_node(K::BaseSpec);
            while matches!(self.peek(), K::KwAccess | K::KwVirtual) {
                self.bump();
            }
            if matches!(self.peek(), K::Ident | K::ColonColon) {
                self.parse_name(NameMode::Type);
            }
            self.eat(K::Ellipsis);
            self.finish_node();
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.finish_node();
    }

    fn parse_enum_def(&mut self) {
        self.start_node(K::EnumDef);
        self.bump();
        if matches!(self.peek(), K::KwClass | K::KwStruct) {
            self.bump();
        }
        self.skip_attributes();
        if matches!(self.peek(), K::Ident | K::ColonColon) {
            self.parse_name(NameMode::Type);
        }
        if self.eat(K::Colon) {
            self.parse_type_ref(DeclContext::Param);
        }
        if self.at(K::LBrace) {
            self.start_node(K::DeclList);
            self.bump();
            while self.at(K::Ident) {
                self.start_node(K::Enumerator);
                self.bump();
                self.skip_attributes();
                if self.eat(K::Eq) {
                    self.start_node(K::Initializer);
                    self.parse_expr_no_comma();
                    self.finish_node();
                }
                self.finish_node();
                if !self.eat(K::Comma) {
                    break;
                }
            }
            if !self.at(K::RBrace) {
                self.recover_until(&[K::RBrace]);
            }
            self.expect(K::RBrace);
            self.finish_node();
        }
        self.finish_node();
    }

    /// A declaration starting with a type: functions, variables, fields.
    fn parse_simple_declaration(
        &mut self,
        ctx: DeclContext,
    ) {
        let cp = self.checkpoint();
        let typed = self.parse_type_ref(ctx);

        if !self.at_declarator_start() {
            if self.eat(K::Semicolon) {
                self.start_node_at(cp, K::VarDecl);
                self.finish_node();
                return;
            }
            // a lone identifier is usually an unexpanded macro
            self.start_node_at(cp, K::ErrorNode);
            if !typed {
                self.recover_to_semicolon();
            }
            self.finish_node();
            return;
        }

        let name_cp = self.checkpoint();
        self.eat_ptr_operators();
        let paren_declarator = self.at(K::LParen) && matches!(self.nth(1), K::Star | K::Amp | K::AmpAmp);
        if paren_declarator || !self.at_name_start() {
            // `void (*fp)(int)`, `auto [a, b] = ...`
            self.start_node_at(cp, K::VarDecl);
            self.start_node_at(name_cp, K::Declarator);
            if self.at(K::LBracket) {
                self.bump_balanced(K::TokenTree, K::LBracket, K::RBracket);
                self.parse_declarator_tail(ctx, false);
            } else {
                self.parse_declarator_tail(ctx, true);
            }
            self.finish_node();
            self.parse_more_declarators(ctx);
            self.finish_node();
            return;
        }

        self.parse_name(NameMode::Expr);
        self.skip_attributes();
        if self.at(K::LParen) && self.looks_like_param_list(ctx) {
            self.start_node_at(cp, K::FunctionDecl);
            self.parse_param_list();
            self.parse_function_tail();
            self.finish_node();
            return;
        }

        self.start_node_at(cp, K::VarDecl);
        self.start_node_at(name_cp, K::Declarator);
        self.parse_declarator_tail(ctx, false);
        self.finish_node();
        self.parse_more_declarators(ctx);
        self.finish_node();
    }

    fn parse_more_declarators(
        &mut self,
        ctx: DeclContext,
    ) {
        while self.eat(K::Comma) {
            self.start_node(K::Declarator);
            self.eat_ptr_operators();
            self.parse_declarator_tail(ctx, true);
            self.finish_node();
        }
        if !self.eat(K::Semicolon) {
            self.error_here("expected `;` after declaration");
            self.recover_to_semicolon();
        }
    }

    fn parse_declarator_list(
        &mut self,
        ctx: DeclContext,
    ) {
        loop {
            self.start_node(K::Declarator);
            self.eat_ptr_operators();
            self.parse_declarator_tail(ctx, true);
            self.finish_node();
            if !self.eat(K::Comma) {
                break;
            }
        }
    }

    /// Everything after the pointer operators of one declarator. With
    /// `with_name` the name itself is parsed here, otherwise it already was.
    fn parse_declarator_tail(
        &mut self,
        ctx: DeclContext,
        with_name: bool,
    ) {
        if with_name {
            if self.at(K::LParen) && matches!(self.nth(1), K::Star | K::Amp | K::AmpAmp) {
                self.bump();
                self.eat_ptr_operators();
                if self.at_name_start() {
                    self.parse_name(NameMode::Type);
                }
                self.expect(K::RParen);
                if self.at(K::LParen) {
                    self.parse_param_list();
                }
            } else if self.at_name_start() {
                self.parse_name(NameMode::Expr);
            }
        }
        while self.at(K::LBracket) {
            self.bump();
            if !self.at(K::RBracket) {
                self.parse_expr();
            }
            self.expect(K::RBracket);
        }
        self.skip_attributes();
        if self.at(K::Colon) && ctx == DeclContext::Class {
            // bit-field width
            self.bump();
            self.parse_expr_no_comma();
        }
        match self.peek() {
            K::Eq => {
                self.start_node(K::Initializer);
                self.bump();
                if self.at(K::LBrace) {
                    self.parse_init_list();
                } else {
                    self.parse_expr_no_comma();
                }
                self.finish_node();
            },
            K::LParen if ctx != DeclContext::Param => {
                self.start_node(K::Initializer);
                self.parse_arg_list();
                self.finish_node();
            },
            K::LBrace if ctx != DeclContext::Param => {
                self.start_node(K::Initializer);
                self.parse_init_list();
                self.finish_node();
            },
            _ => {},
        }
    }

    fn parse_param_list(&mut self) {
        self.start_node(K::ParamList);
        self.bump();
        while !self.at_eof() && !self.at(K::RParen) {
            let before = self.sig;
            if self.at(K::Ellipsis) {
                self.bump();
            } else {
                self.start_node(K::Param);
                self.skip_attributes();
                self.parse_type_ref(DeclContext::Param);
                self.eat_ptr_operators();
                self.eat(K::Ellipsis);
                if self.at_name_start() || (self.at(K::LParen) && self.nth(1) == K::Star) {
                    self.parse_declarator_tail(DeclContext::Param, true);
                } else {
                    self.parse_declarator_tail(DeclContext::Param, false);
                }
                self.finish_node();
            }
            if !self.eat(K::Comma) && !self.at(K::RParen) {
                self.error_here("expected `,` or `)` in parameter list");
                self.recover_until(&[K::Comma, K::RParen, K::LBrace, K::Semicolon]);
                if !self.eat(K::Comma) {
                    break;
                }
            }
            if self.sig == before {
                self.bump_error();
            }
        }
        self.expect(K::RParen);
        self.finish_node();
    }

    /// Qualifiers, pure/default markers, constructor initializers and the body.
    fn parse_function_tail(&mut self) {
        loop {
            match self.peek() {
                K::KwConst | K::KwVolatile | K::Amp | K::AmpAmp => self.bump(),
                K::KwNoexcept | K::KwThrow => {
                    self.bump();
                    if self.at(K::LParen) {
                        self.bump_balanced(K::TokenTree, K::LParen, K::RParen);
                    }
                },
                K::Ident if matches!(self.peek_text(), "override" | "final") => self.bump(),
                K::Ident if self.at_attribute() => self.skip_attributes(),
                K::LBracket if self.nth(1) == K::LBracket => self.skip_attributes(),
                K::Arrow => {
                    self.bump();
                    self.parse_type_ref(DeclContext::Param);
                },
                _ => break,
            }
        }
        if self.eat(K::Eq) {
            // `= 0`, `= default`, `= delete`
            if matches!(self.peek(), K::IntNumber | K::KwDefault | K::KwDelete) {
                self.bump();
            }
        }
        if self.at(K::Colon) {
            self.parse_ctor_initializers();
        }
        if self.at(K::KwTry) {
            self.bump();
        }
        if self.at(K::LBrace) {
            self.parse_block();
            while self.at(K::KwCatch) {
                self.parse_catch();
            }
        } else if !self.eat(K::Semicolon) {
            self.error_here("expected `;` or a function body");
        }
    }

    fn parse_ctor_initializers(&mut self) {
        self.start_node(K::CtorInit);
        self.bump();
        loop {
            if self.at_name_start() {
                self.parse_name(NameMode::Expr);
            }
            match self.peek() {
                K::LParen => self.parse_arg_list(),
                K::LBrace => self.parse_init_list(),
                _ => break,
            }
            self.eat(K::Ellipsis);
            if !self.eat(K::Comma) {
                break;
            }
        }
        self.finish_node();
    }

    /// Parses decl-specifiers, the type name and trailing cv-qualifiers.
    /// Returns `false` if nothing that names a type was consumed.
    fn parse_type_ref(
        &mut self,
        ctx: DeclContext,
    ) -> bool {
        self.start_node(K::TypeRef);
        let mut saw_type = false;
        loop {
            let kind = self.peek();
            if kind.is_decl_specifier() {
                self.bump();
            } else if kind.is_builtin_type() {
                self.bump();
                saw_type = true;
            } else if matches!(kind, K::KwClass | K::KwStruct | K::KwUnion | K::KwEnum) && !saw_type {
                self.bump();
                if self.at_name_start() {
                    self.parse_name(NameMode::Type);
                }
                saw_type = true;
            } else if kind == K::KwDecltype && !saw_type {
                self.bump();
                if self.at(K::LParen) {
                    self.bump_balanced(K::TokenTree, K::LParen, K::RParen);
                }
                saw_type = true;
            } else if matches!(kind, K::Ident | K::ColonColon) && !saw_type {
                if self.at_attribute() {
                    self.skip_attributes();
                    continue;
                }
                if ctx != DeclContext::Param && self.name_is_declarator() {
                    break;
                }
                self.parse_name(NameMode::Type);
                saw_type = true;
            } else if kind == K::LBracket && self.nth(1) == K::LBracket {
                self.skip_attributes();
            } else {
                break;
            }
        }
        while matches!(self.peek(), K::KwConst | K::KwVolatile) {
            self.bump();
        }
        if ctx == DeclContext::Param {
            self.eat_ptr_operators();
        }
        self.finish_node();
        saw_type
    }

    // ---------------------------------------------------------------------
    // statements

    fn parse_block(&mut self) {
        if self.depth > MAX_DEPTH {
            self.bump_balanced(K::TokenTree, K::LBrace, K::RBrace);
            return;
        }
        self.depth += 1;
        self.start_node(K::Block);
        self.bump();
        while !self.at_eof() && !self.at(K::RBrace) {
            self.parse_statement();
        }
        self.expect(K::RBrace);
        self.finish_node();
        self.depth -= 1;
    }

    fn parse_statement(&mut self) {
        let before = self.sig;
        match self.peek() {
            K::LBrace => self.parse_block(),
            K::Semicolon => self.bump(),
            K::KwIf => self.parse_if(),
            K::KwFor => self.parse_for(),
            K::KwWhile => {
                self.start_node(K::WhileStmt);
                self.bump();
                self.parse_condition();
                self.parse_substatement();
                self.finish_node();
            },
            K::KwDo => {
                self.start_node(K::DoStmt);
                self.bump();
                self.parse_substatement();
                if self.eat(K::KwWhile) {
                    self.parse_condition();
                }
                self.expect(K::Semicolon);
                self.finish_node();
            },
            K::KwSwitch => {
                self.start_node(K::SwitchStmt);
                self.bump();
                self.parse_condition();
                self.parse_substatement();
                self.finish_node();
            },
            K::KwCase => {
                self.start_node(K::CaseLabel);
                self.bump();
                self.parse_expr();
                if self.eat(K::Ellipsis) {
                    self.parse_expr();
                }
                self.expect(K::Colon);
                self.finish_node();
            },
            K::KwDefault if self.nth(1) == K::Colon => {
                self.start_node(K::CaseLabel);
                self.bump();
                self.bump();
                self.finish_node();
            },
            K::KwReturn => {
                self.start_node(K::ReturnStmt);
                self.bump();
                if self.at(K::LBrace) {
                    self.parse_init_list();
                } else if !self.at(K::Semicolon) {
                    self.parse_expr();
                }
                self.expect_statement_end();
                self.finish_node();
            },
            K::KwBreak | K::KwContinue | K::KwGoto => {
                self.start_node(K::JumpStmt);
                self.bump();
                self.eat(K::Ident);
                self.expect(K::Semicolon);
                self.finish_node();
            },
            K::KwTry => {
                self.start_node(K::TryStmt);
                self.bump();
                if self.at(K::LBrace) {
                    self.parse_block();
                }
                while self.at(K::KwCatch) {
                    self.parse_catch();
                }
                self.finish_node();
            },
            K::Ident if self.nth(1) == K::Colon => {
                // label
                self.bump();
                self.bump();
            },
            K::KwUsing | K::KwTypedef | K::KwNamespace | K::KwStaticAssert | K::KwTemplate => {
                self.parse_declaration(DeclContext::Block);
            },
            K::KwClass | K::KwStruct | K::KwUnion if self.class_head_follows() => {
                self.parse_class_declaration(DeclContext::Block);
            },
            K::KwEnum if self.enum_head_follows() => self.parse_enum_declaration(DeclContext::Block),
            K::RParen | K::RBracket => {
                self.error_here("unexpected closing delimiter");
                self.bump_error();
            },
            _ if self.looks_like_local_declaration() => self.parse_simple_declaration(DeclContext::Block),
            _ => {
                self.start_node(K::ExprStmt);
                self.parse_expr();
                self.expect_statement_end();
                self.finish_node();
            },
        }
        if self.sig == before {
            self.bump_error();
        }
    }

    fn parse_substatement(&mut self) {
        if !self.at_eof() && !self.at(K::RBrace) {
            self.parse_statement();
        }
    }

    fn parse_if(&mut self) {
        self.start_node(K::IfStmt);
        self.bump();
        self.eat(K::KwConstexpr);
        self.parse_condition();
        self.parse_substatement();
        if self.eat(K::KwElse) {
            self.parse_substatement();
        }
        self.finish_node();
    }

    /// `( expr )` or `( declaration )` as used by if/while/switch.
    fn parse_condition(&mut self) {
        if !self.eat(K::LParen) {
            self.error_here("expected `(`");
            return;
        }
        if self.looks_like_local_declaration() {
            self.parse_condition_declaration();
            if self.eat(K::Semicolon) && !self.at(K::RParen) {
                self.parse_expr();
            }
        } else if !self.at(K::RParen) {
            self.parse_expr();
        }
        self.expect(K::RParen);
    }

    fn parse_condition_declaration(&mut self) {
        self.start_node(K::VarDecl);
        self.parse_type_ref(DeclContext::Block);
        self.start_node(K::Declarator);
        self.eat_ptr_operators();
        self.parse_declarator_tail(DeclContext::Param, true);
        self.finish_node();
        self.finish_node();
    }

    fn parse_for(&mut self) {
        self.start_node(K::ForStmt);
        self.bump();
        if self.eat(K::LParen) {
            if self.looks_like_local_declaration() {
                self.start_node(K::VarDecl);
                self.parse_type_ref(DeclContext::Block);
                self.start_node(K::Declarator);
                self.eat_ptr_operators();
                if self.at(K::LBracket) {
                    // structured binding
                    self.bump_balanced(K::TokenTree, K::LBracket, K::RBracket);
                } else {
                    self.parse_declarator_tail(DeclContext::Param, true);
                }
                self.finish_node();
                while self.eat(K::Comma) {
                    self.start_node(K::Declarator);
                    self.eat_ptr_operators();
                    self.parse_declarator_tail(DeclContext::Param, true);
                    self.finish_node();
                }
                self.finish_node();
            } else if !self.at(K::Semicolon) {
                self.parse_expr();
            }
            if self.eat(K::Colon) {
                if self.at(K::LBrace) {
                    self.parse_init_list();
                } else {
                    self.parse_expr();
                }
            } else {
                self.expect(K::Semicolon);
                if !self.at(K::Semicolon) {
                    self.parse_expr();
                }
                self.expect(K::Semicolon);
                if !self.at(K::RParen) {
                    self.parse_expr();
                }
            }
            self.expect(K::RParen);
        }
        self.parse_substatement();
        self.finish_node();
    }

    fn parse_catch(&mut self) {
        self.start_node(K::CatchClause);
        self.bump();
        if self.at(K::LParen) {
            self.start_node(K::ParamList);
            self.bump();
            if self.at(K::Ellipsis) {
                self.bump();
            } else if !self.at(K::RParen) {
                self.start_node(K::Param);
                self.parse_type_ref(DeclContext::Param);
                if self.at_name_start() {
                    self.parse_declarator_tail(DeclContext::Param, true);
                }
                self.finish_node();
            }
            self.expect(K::RParen);
            self.finish_node();
        }
        if self.at(K::LBrace) {
            self.parse_block();
        }
        self.finish_node();
    }

    fn parse_token_statement(&mut self) {
        self.start_node(K::TokenTree);
        self.recover_to_semicolon();
        self.finish_node();
    }

    fn expect_statement_end(&mut self) {
        if self.eat(K::Semicolon) {
            return;
        }
        self.error_here("expected `;`");
        if !matches!(self.peek(), K::LBrace | K::RBrace) {
            self.recover_to_semicolon();
        }
    }

    // ---------------------------------------------------------------------
    // expressions

    fn parse_expr(&mut self) {
        self.parse_binary(0);
    }

    fn parse_expr_no_comma(&mut self) {
        self.parse_binary(1);
    }

    fn parse_binary(
        &mut self,
        min_prec: u8,
    ) {
        if self.depth > MAX_DEPTH {
            self.recover_until(&[K::Semicolon, K::RParen, K::RBrace, K::RBracket, K::Comma]);
            return;
        }
        self.depth += 1;
        let cp = self.checkpoint();
        self.parse_unary();
        loop {
            if self.at(K::Question) && min_prec <= 2 {
                self.start_node_at(cp, K::ConditionalExpr);
                self.bump();
                self.parse_expr();
                self.expect(K::Colon);
                self.parse_binary(2);
                self.finish_node();
                continue;
            }
            let Some((prec, right_assoc, width)) = self.binary_operator() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.start_node_at(cp, K::BinaryExpr);
            for _ in 0..width {
                self.bump();
            }
            if self.at(K::LBrace) {
                self.parse_init_list();
            } else {
                self.parse_binary(if right_assoc { prec } else { prec + 1 });
            }
            self.finish_node();
        }
        self.depth -= 1;
    }

    /// Precedence, associativity and token width of the operator at the cursor.
    fn binary_operator(&self) -> Option<(u8, bool, usize)> {
        let op = match self.peek() {
            K::Comma => (0, false, 1),
            K::Eq | K::CompoundAssign => (1, true, 1),
            K::PipePipe => (3, false, 1),
            K::AmpAmp => (4, false, 1),
            K::Pipe => (5, false, 1),
            K::Caret => (6, false, 1),
            K::Amp => (7, false, 1),
            K::EqEq | K::BangEq => (8, false, 1),
            K::Gt if self.nth(1) == K::Gt && self.adjacent(0, 1) => (10, false, 2),
            K::Lt | K::Gt | K::LtEq | K::GtEq => (9, false, 1),
            K::Shl => (10, false, 1),
            K::Plus | K::Minus => (11, false, 1),
            K::Star | K::Slash | K::Percent => (12, false, 1),
            K::DotStar | K::ArrowStar => (13, false, 1),
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) {
        match self.peek() {
            K::Plus
            | K::Minus
            | K::Star
            | K::Amp
            | K::AmpAmp
            | K::Bang
            | K::Tilde
            | K::PlusPlus
            | K::MinusMinus
            | K::KwThrow => {
                self.start_node(K::UnaryExpr);
                self.bump();
                if self.depth > MAX_DEPTH {
                    self.recover_until(&[K::Semicolon, K::RParen, K::RBrace, K::RBracket, K::Comma]);
                } else if !self.at_expression_end() {
                    self.depth += 1;
                    self.parse_unary();
                    self.depth -= 1;
                }
                self.finish_node();
            },
            K::KwDelete => {
                self.start_node(K::UnaryExpr);
                self.bump();
                if self.at(K::LBracket) && self.nth(1) == K::RBracket {
                    self.bump();
                    self.bump();
                }
                self.parse_unary();
                self.finish_node();
            },
            K::KwSizeof => {
                self.start_node(K::SizeofExpr);
                self.bump();
                self.eat(K::Ellipsis);
                if self.at(K::LParen) && self.type_in_parens_follows() {
                    self.bump();
                    self.parse_type_ref(DeclContext::Param);
                    self.expect(K::RParen);
                } else {
                    self.parse_unary();
                }
                self.finish_node();
            },
            K::KwNew => self.parse_new(),
            _ => self.parse_postfix(),
        }
    }

    fn parse_new(&mut self) {
        self.start_node(K::NewExpr);
        self.bump();
        if self.at(K::LParen) && !self.type_in_parens_follows() {
            // placement arguments
            self.parse_arg_list();
        }
        if self.at(K::LParen) {
            self.bump();
            self.parse_type_ref(DeclContext::Param);
            self.expect(K::RParen);
        } else {
            self.parse_type_ref(DeclContext::Param);
        }
        while self.at(K::LBracket) {
            self.bump();
            self.parse_expr();
            self.expect(K::RBracket);
        }
        match self.peek() {
            K::LParen => self.parse_arg_list(),
            K::LBrace => self.parse_init_list(),
            _ => {},
        }
        self.finish_node();
    }

    fn parse_postfix(&mut self) {
        let cp = self.checkpoint();
        if !self.parse_primary() {
            return;
        }
        loop {
            match self.peek() {
                K::LParen => {
                    self.start_node_at(cp, K::CallExpr);
                    self.parse_arg_list();
                    self.finish_node();
                },
                K::LBracket if self.nth(1) != K::LBracket => {
                    self.start_node_at(cp, K::IndexExpr);
                    self.bump();
                    if self.at(K::LBrace) {
                        self.parse_init_list();
                    } else {
                        self.parse_expr();
                    }
                    self.expect(K::RBracket);
                    self.finish_node();
                },
                K::Dot | K::Arrow => {
                    self.start_node_at(cp, K::MemberExpr);
                    self.bump();
                    self.eat(K::KwTemplate);
                    if self.at_name_start() {
                        self.parse_name(NameMode::Expr);
                    } else {
                        self.error_here("expected member name");
                    }
                    self.finish_node();
                },
                K::PlusPlus | K::MinusMinus => {
                    self.start_node_at(cp, K::PostfixExpr);
                    self.bump();
                    self.finish_node();
                },
                _ => break,
            }
        }
    }

    /// Returns `false` when no primary expression starts at the cursor.
    fn parse_primary(&mut self) -> bool {
        match self.peek() {
            K::Ident if self.nth(1) == K::StringLit && self.adjacent(0, 1) => {
                // encoding prefix: L"..", u8".."
                self.start_node(K::Literal);
                while self.at(K::StringLit) || (self.at(K::Ident) && self.nth(1) == K::StringLit) {
                    self.bump();
                }
                self.finish_node();
            },
            K::Ident | K::ColonColon | K::KwOperator => {
                self.parse_name(NameMode::Expr);
                if self.at(K::LBrace) && self.brace_init_follows() {
                    self.parse_init_list();
                }
            },
            K::KwThis => {
                self.start_node(K::ThisExpr);
                self.bump();
                self.finish_node();
            },
            K::IntNumber | K::FloatNumber | K::CharLit | K::KwTrue | K::KwFalse | K::KwNullptr => {
                self.start_node(K::Literal);
                self.bump();
                self.finish_node();
            },
            K::StringLit => {
                self.start_node(K::Literal);
                while self.at(K::StringLit) || (self.at(K::Ident) && self.nth(1) == K::StringLit) {
                    self.bump();
                }
                self.finish_node();
            },
            K::LParen => {
                if self.cast_follows() {
                    self.start_node(K::CastExpr);
                    self.bump();
                    self.parse_type_ref(DeclContext::Param);
                    self.expect(K::RParen);
                    self.parse_unary();
                } else {
                    self.start_node(K::ParenExpr);
                    self.bump();
                    if !self.at(K::RParen) {
                        self.parse_expr();
                    }
                    self.expect(K::RParen);
                }
                self.finish_node();
            },
            K::KwCast => {
                self.start_node(K::CastExpr);
                self.bump();
                if self.at(K::Lt) {
                    self.parse_template_args();
                }
                if self.at(K::LParen) {
                    self.bump();
                    self.parse_expr();
                    self.expect(K::RParen);
                }
                self.finish_node();
            },
            K::LBracket => self.parse_lambda(),
            K::LBrace => self.parse_init_list(),
            kind if kind.is_builtin_type() => {
                // functional cast: `int(x)`, `unsigned{y}`
                self.parse_type_ref(DeclContext::Param);
                if self.at(K::LBrace) {
                    self.parse_init_list();
                }
            },
            K::KwDecltype => {
                self.parse_type_ref(DeclContext::Param);
            },
            _ => {
                if !self.at_expression_end() {
                    self.error_here("expected expression");
                    self.bump_error();
                }
                return false;
            },
        }
        true
    }

    fn parse_lambda(&mut self) {
        self.start_node(K::LambdaExpr);
        self.bump_balanced(K::TokenTree, K::LBracket, K::RBracket);
        if self.at(K::LParen) {
            self.parse_param_list();
        }
        loop {
            match self.peek() {
                K::KwMutable | K::KwConstexpr => self.bump(),
                K::KwNoexcept => {
                    self.bump();
                    if self.at(K::LParen) {
                        self.bump_balanced(K::TokenTree, K::LParen, K::RParen);
                    }
                },
                K::Arrow => {
                    self.bump();
                    self.parse_type_ref(DeclContext::Param);
                },
                _ => break,
            }
        }
        if self.at(K::LBrace) {
            self.parse_block();
        }
        self.finish_node();
    }

    fn parse_arg_list(&mut self) {
        self.start_node(K::ArgList);
        self.bump();
        while !self.at_eof() && !self.at(K::RParen) {
            let before = self.sig;
            if self.at(K::LBrace) {
                self.parse_init_list();
            } else {
                self.parse_expr_no_comma();
            }
            self.eat(K::Ellipsis);
            if !self.eat(K::Comma) {
                break;
            }
            if self.sig == before {
                self.bump_error();
            }
        }
        if !self.eat(K::RParen) {
            self.error_here("expected `)`");
            self.recover_until(&[K::RParen, K::Semicolon, K::RBrace]);
            self.eat(K::RParen);
        }
        self.finish_node();
    }

    fn parse_init_list(&mut self) {
        if self.depth > MAX_DEPTH {
            self.bump_balanced(K::TokenTree, K::LBrace, K::RBrace);
            return;
        }
        self.depth += 1;
        self.start_node(K::InitList);
        self.bump();
        while !self.at_eof() && !self.at(K::RBrace) {
            let before = self.sig;
            if self.at(K::Dot) && self.nth(1) == K::Ident {
                // designated initializer
                self.bump();
                self.bump();
                self.eat(K::Eq);
            }
            if self.at(K::LBrace) {
                self.parse_init_list();
            } else {
                self.parse_expr_no_comma();
            }
            self.eat(K::Ellipsis);
            if !self.eat(K::Comma) && !self.at(K::RBrace) {
                self.recover_until(&[K::Comma, K::RBrace, K::Semicolon]);
                if !self.eat(K::Comma) {
                    break;
                }
            }
            if self.sig == before {
                self.bump_error();
            }
        }
        self.expect(K::RBrace);
        self.finish_node();
        self.depth -= 1;
    }

    fn parse_template_args(&mut self) {
        self.start_node(K::TemplateArgs);
        self.bump();
        let mut depth = 1usize;
        while !self.at_eof() {
            match self.peek() {
                K::Lt => {
                    depth += 1;
                    self.bump();
                },
                K::Gt => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                },
                K::LParen => self.bump_balanced(K::TokenTree, K::LParen, K::RParen),
                K::Ident | K::ColonColon => self.parse_name(NameMode::Type),
                K::Semicolon | K::LBrace | K::RBrace => break,
                _ => self.bump(),
            }
        }
        self.finish_node();
    }

    // ---------------------------------------------------------------------
    // names

    /// `a`, `a::b<T>::c`, `::a`, `~A`, `operator+`, `A::operator()`.
    fn parse_name(
        &mut self,
        mode: NameMode,
    ) {
        let cp = self.checkpoint();
        let mut qualified = self.eat(K::ColonColon);
        self.parse_name_segment(mode);
        while self.at(K::ColonColon) && matches!(self.nth(1), K::Ident | K::Tilde | K::KwOperator | K::KwTemplate) {
            self.bump();
            self.eat(K::KwTemplate);
            self.parse_name_segment(mode);
            qualified = true;
        }
        if qualified {
            self.start_node_at(cp, K::QualifiedName);
            self.finish_node();
        }
    }

    fn parse_name_segment(
        &mut self,
        mode: NameMode,
    ) {
        self.start_node(K::NameRef);
        match self.peek() {
            K::Ident => {
                self.bump();
                if self.at(K::Lt) && self.template_args_end(self.sig, mode).is_some() {
                    self.parse_template_args();
                }
            },
            K::Tilde => {
                self.bump();
                self.eat(K::Ident);
            },
            K::KwOperator => {
                self.bump();
                self.parse_operator_name();
            },
            _ => self.error_here("expected a name"),
        }
        self.finish_node();
    }

    fn parse_operator_name(&mut self) {
        match self.peek() {
            K::LParen if self.nth(1) == K::RParen => {
                self.bump();
                self.bump();
            },
            K::LBracket if self.nth(1) == K::RBracket => {
                self.bump();
                self.bump();
            },
            K::KwNew | K::KwDelete => {
                self.bump();
                if self.at(K::LBracket) && self.nth(1) == K::RBracket {
                    self.bump();
                    self.bump();
                }
            },
            K::StringLit => {
                // user-defined literal
                self.bump();
                self.eat(K::Ident);
            },
            K::Gt if self.nth(1) == K::Gt && self.adjacent(0, 1) => {
                self.bump();
                self.bump();
            },
            K::LParen | K::Eof => {},
            kind if kind.is_builtin_type() || matches!(kind, K::Ident | K::ColonColon | K::KwConst) => {
                // conversion operator
                self.parse_type_ref(DeclContext::Param);
            },
            _ => self.bump(),
        }
    }

    // ---------------------------------------------------------------------
    // lookahead

    fn nth(
        &self,
        n: usize,
    ) -> SyntaxKind {
        self.kind_at(self.sig + n)
    }

    fn kind_at(
        &self,
        index: usize,
    ) -> SyntaxKind {
        self.significant.get(index).map(|&i| self.tokens[i].0).unwrap_or(K::Eof)
    }

    fn text_at(
        &self,
        index: usize,
    ) -> &'a str {
        self.significant.get(index).map(|&i| self.tokens[i].1).unwrap_or("")
    }

    fn peek(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn peek_text(&self) -> &'a str {
        self.text_at(self.sig)
    }

    fn at(
        &self,
        kind: SyntaxKind,
    ) -> bool {
        self.peek() == kind
    }

    fn at_eof(&self) -> bool {
        self.sig >= self.significant.len()
    }

    /// Whether the `a`-th and `b`-th significant tokens touch (no trivia between).
    fn adjacent(
        &self,
        a: usize,
        b: usize,
    ) -> bool {
        match (self.significant.get(self.sig + a), self.significant.get(self.sig + b)) {
            (Some(&x), Some(&y)) => y == x + 1,
            _ => false,
        }
    }

    fn at_name_start(&self) -> bool {
        match self.peek() {
            K::Ident | K::KwOperator => true,
            K::ColonColon => matches!(self.nth(1), K::Ident | K::KwOperator | K::Tilde),
            K::Tilde => self.nth(1) == K::Ident,
            _ => false,
        }
    }

    fn at_declarator_start(&self) -> bool {
        self.at_name_start()
            || matches!(self.peek(), K::Star | K::Amp | K::AmpAmp)
            || (self.at(K::LParen) && matches!(self.nth(1), K::Star | K::Amp | K::AmpAmp))
    }

    fn at_expression_end(&self) -> bool {
        matches!(
            self.peek(),
            K::Eof | K::Semicolon | K::RParen | K::RBrace | K::RBracket | K::Comma | K::Colon
        )
    }

    fn at_attribute(&self) -> bool {
        self.at(K::Ident)
            && matches!(self.peek_text(), "__attribute__" | "__declspec" | "alignas" | "__asm__" | "__asm")
            && self.nth(1) == K::LParen
    }

    /// Index just past the template argument list opening at `start`, if the
    /// list is balanced and (in expression mode) plausibly not a comparison.
    fn template_args_end(
        &self,
        start: usize,
        mode: NameMode,
    ) -> Option<usize> {
        let mut depth = 0usize;
        let mut parens = 0usize;
        let mut i = start;
        loop {
            match self.kind_at(i) {
                K::Lt if parens == 0 => depth += 1,
                K::Gt if parens == 0 => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                },
                K::LParen => parens += 1,
                K::RParen => {
                    if parens == 0 {
                        return None;
                    }
                    parens -= 1;
                },
                K::Semicolon | K::LBrace | K::RBrace | K::Eof | K::AmpAmp | K::PipePipe => return None,
                _ => {},
            }
            i += 1;
            if i - start > 128 {
                return None;
            }
        }
        let end = i + 1;
        if mode == NameMode::Expr
            && !matches!(
                self.kind_at(end),
                K::LParen | K::ColonColon | K::LBrace | K::RParen | K::Semicolon | K::Comma | K::Gt | K::Ident
            )
        {
            return None;
        }
        Some(end)
    }

    /// Index just past a possibly qualified name starting at `start`.
    fn scan_name(
        &self,
        start: usize,
    ) -> Option<usize> {
        let mut i = start;
        if self.kind_at(i) == K::ColonColon {
            i += 1;
        }
        loop {
            match self.kind_at(i) {
                K::Ident => i += 1,
                K::Tilde if self.kind_at(i + 1) == K::Ident => i += 2,
                _ => return None,
            }
            if self.kind_at(i) == K::Lt
                && let Some(end) = self.template_args_end(i, NameMode::Type)
            {
                i = end;
            }
            if self.kind_at(i) == K::ColonColon && matches!(self.kind_at(i + 1), K::Ident | K::Tilde) {
                i += 1;
                continue;
            }
            return Some(i);
        }
    }

    /// At namespace or class scope, a name followed by `(` with no type before
    /// it is a constructor, destructor or conversion declarator.
    fn name_is_declarator(&self) -> bool {
        let Some(end) = self.scan_name(self.sig) else {
            return self.at(K::ColonColon);
        };
        if (self.sig..end).any(|i| self.kind_at(i) == K::Tilde) {
            return true;
        }
        match self.kind_at(end) {
            K::LParen => true,
            K::ColonColon => matches!(self.kind_at(end + 1), K::KwOperator | K::Tilde),
            _ => false,
        }
    }

    fn looks_like_local_declaration(&self) -> bool {
        let first = self.peek();
        if first.is_builtin_type() || first.is_decl_specifier() || first == K::KwDecltype {
            return true;
        }
        if matches!(first, K::KwClass | K::KwStruct | K::KwUnion | K::KwEnum) {
            return true;
        }
        if !matches!(first, K::Ident | K::ColonColon) {
            return false;
        }
        let Some(mut i) = self.scan_name(self.sig) else {
            return false;
        };
        let name_end = i;
        while matches!(self.kind_at(i), K::Star | K::Amp | K::AmpAmp | K::KwConst) {
            i += 1;
        }
        if self.kind_at(i) == K::LBracket && i == name_end {
            // `auto [a, b] = ...` handled above; `x[0] = 1` is an expression
            return false;
        }
        self.kind_at(i) == K::Ident
            && matches!(
                self.kind_at(i + 1),
                K::Semicolon | K::Eq | K::Comma | K::LParen | K::LBracket | K::LBrace | K::Colon | K::RParen
            )
    }

    fn looks_like_param_list(
        &self,
        ctx: DeclContext,
    ) -> bool {
        let first = self.sig + 1;
        let kind = self.kind_at(first);
        if kind == K::RParen || kind == K::Ellipsis {
            return true;
        }
        if kind.is_builtin_type()
            || kind.is_decl_specifier()
            || matches!(kind, K::KwClass | K::KwStruct | K::KwUnion | K::KwEnum)
        {
            return true;
        }
        if !matches!(kind, K::Ident | K::ColonColon) {
            return false;
        }
        let Some(end) = self.scan_name(first) else {
            return false;
        };
        match self.kind_at(end) {
            K::Ident | K::AmpAmp => true,
            K::Star | K::Amp | K::Comma | K::RParen | K::Eq | K::Ellipsis => ctx != DeclContext::Block,
            _ => false,
        }
    }

    fn type_in_parens_follows(&self) -> bool {
        let kind = self.nth(1);
        if kind.is_builtin_type() || matches!(kind, K::KwConst | K::KwClass | K::KwStruct | K::KwTypename) {
            return true;
        }
        if !matches!(kind, K::Ident | K::ColonColon) {
            return false;
        }
        let Some(mut end) = self.scan_name(self.sig + 1) else {
            return false;
        };
        while matches!(self.kind_at(end), K::Star | K::Amp | K::AmpAmp | K::KwConst) {
            end += 1;
        }
        self.kind_at(end) == K::RParen && end > self.sig + 2
    }

    /// `(T) x` or `(T*) x`: a C-style cast rather than a parenthesized expression.
    fn cast_follows(&self) -> bool {
        let kind = self.nth(1);
        let mut end = if kind.is_builtin_type() || kind == K::KwConst {
            let mut i = self.sig + 1;
            while self.kind_at(i).is_builtin_type() || matches!(self.kind_at(i), K::KwConst | K::KwVolatile) {
                i += 1;
            }
            i
        } else if matches!(kind, K::Ident | K::ColonColon) {
            match self.scan_name(self.sig + 1) {
                Some(end) => end,
                None => return false,
            }
        } else {
            return false;
        };
        let name_end = end;
        while matches!(self.kind_at(end), K::Star | K::Amp | K::AmpAmp | K::KwConst) {
            end += 1;
        }
        if self.kind_at(end) != K::RParen {
            return false;
        }
        if kind.is_builtin_type() || end > name_end {
            return true;
        }
        matches!(
            self.kind_at(end + 1),
            K::Ident | K::IntNumber | K::FloatNumber | K::StringLit | K::CharLit | K::LParen | K::KwThis
        )
    }

    /// `T{...}` inside an expression, as opposed to a name followed by a block.
    fn brace_init_follows(&self) -> bool {
        !matches!(
            self.nth(1),
            K::KwReturn | K::KwIf | K::KwFor | K::KwWhile | K::KwDo | K::KwSwitch | K::Semicolon
        )
    }

    fn class_head_follows(&self) -> bool {
        self.class_head_end().is_some()
    }

    fn class_body_follows(&self) -> bool {
        matches!(self.class_head_end(), Some(K::LBrace | K::Colon))
    }

    /// Kind of the token ending a class head (`;`, `{` or `:`), if the tokens
    /// after the class key form one: `class X;`, `class X : B {`, `class {`,
    /// `class EXPORT X {`.
    fn class_head_end(&self) -> Option<SyntaxKind> {
        let mut i = self.sig + 1;
        while self.kind_at(i) == K::LBracket && self.kind_at(i + 1) == K::LBracket {
            i += 2;
            while !matches!(self.kind_at(i), K::RBracket | K::Eof) {
                i += 1;
            }
            i += 2;
        }
        if self.kind_at(i) == K::LBrace {
            return Some(K::LBrace);
        }
        let mut end = self.scan_name(i)?;
        if self.kind_at(end) == K::Ident
            && !matches!(self.text_at(end), "final" | "sealed")
            && let Some(after) = self.scan_name(end)
            && matches!(self.kind_at(after), K::LBrace | K::Colon)
        {
            end = after;
        }
        while self.kind_at(end) == K::Ident && matches!(self.text_at(end), "final" | "sealed") {
            end += 1;
        }
        let kind = self.kind_at(end);
        matches!(kind, K::Semicolon | K::LBrace | K::Colon).then_some(kind)
    }

    fn enum_head_follows(&self) -> bool {
        let mut i = self.sig + 1;
        if matches!(self.kind_at(i), K::KwClass | K::KwStruct) {
            i += 1;
        }
        if self.kind_at(i) == K::LBrace {
            return true;
        }
        let Some(end) = self.scan_name(i) else {
            return false;
        };
        matches!(self.kind_at(end), K::Semicolon | K::LBrace | K::Colon)
    }

    // ---------------------------------------------------------------------
    // token plumbing

    fn skip_trivia(&mut self) {
        let stop = self.significant.get(self.sig).copied().unwrap_or(self.tokens.len());
        while self.pos < stop {
            let (kind, text) = self.tokens[self.pos];
            self.builder.token(kind.into(), text);
            self.pos += 1;
        }
    }

    fn bump(&mut self) {
        if self.at_eof() {
            return;
        }
        self.skip_trivia();
        let (kind, text) = self.tokens[self.pos];
        self.builder.token(kind.into(), text);
        self.pos += 1;
        self.sig += 1;
    }

    fn eat(
        &mut self,
        kind: SyntaxKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        kind: SyntaxKind,
    ) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_here(&format!("expected {}", describe(kind)));
        false
    }

    fn bump_error(&mut self) {
        if self.at_eof() {
            return;
        }
        self.start_node(K::ErrorNode);
        self.bump();
        self.finish_node();
    }

    fn eat_ptr_operators(&mut self) -> bool {
        let mut any = false;
        while matches!(self.peek(), K::Star | K::Amp | K::AmpAmp | K::KwConst | K::KwVolatile) {
            self.bump();
            any = true;
        }
        any
    }

    fn skip_attributes(&mut self) {
        loop {
            if self.at(K::LBracket) && self.nth(1) == K::LBracket {
                self.bump_balanced(K::TokenTree, K::LBracket, K::RBracket);
            } else if self.at_attribute() {
                self.start_node(K::TokenTree);
                self.bump();
                self.bump_balanced_inline(K::LParen, K::RParen);
                self.finish_node();
            } else {
                break;
            }
        }
    }

    fn bump_balanced(
        &mut self,
        node: SyntaxKind,
        open: SyntaxKind,
        close: SyntaxKind,
    ) {
        self.start_node(node);
        self.bump_balanced_inline(open, close);
        self.finish_node();
    }

    fn bump_balanced_inline(
        &mut self,
        open: SyntaxKind,
        close: SyntaxKind,
    ) {
        let mut depth = 0usize;
        while !self.at_eof() {
            let kind = self.peek();
            self.bump();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
        }
    }

    fn bump_balanced_angles(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.peek() {
                K::Lt => depth += 1,
                K::Gt => depth = depth.saturating_sub(1),
                K::LParen => {
                    self.bump_balanced_inline(K::LParen, K::RParen);
                    continue;
                },
                K::LBrace | K::Semicolon => break,
                _ => {},
            }
            self.bump();
            if depth == 0 {
                break;
            }
        }
    }

    /// Consumes tokens up to and including the next `;` at nesting depth zero,
    /// stopping early (without consuming) at an unbalanced `}`.
    fn recover_to_semicolon(&mut self) {
        while !self.at_eof() {
            match self.peek() {
                K::Semicolon => {
                    self.bump();
                    return;
                },
                K::RBrace => return,
                K::LBrace => self.bump_balanced(K::TokenTree, K::LBrace, K::RBrace),
                K::LParen => self.bump_balanced(K::TokenTree, K::LParen, K::RParen),
                _ => self.bump(),
            }
        }
    }

    fn recover_until(
        &mut self,
        stops: &[SyntaxKind],
    ) {
        while !self.at_eof() && !stops.contains(&self.peek()) {
            match self.peek() {
                K::LBrace => self.bump_balanced(K::TokenTree, K::LBrace, K::RBrace),
                K::LParen => self.bump_balanced(K::TokenTree, K::LParen, K::RParen),
                K::RBrace | K::RParen => return,
                _ => self.bump(),
            }
        }
    }

    fn error_here(
        &mut self,
        message: &str,
    ) {
        let offset = self
            .significant
            .get(self.sig)
            .map(|&i| self.offsets[i])
            .unwrap_or_else(|| self.offsets.last().copied().unwrap_or(0));
        if self.errors.last().is_some_and(|last| last.offset == offset) {
            return;
        }
        self.errors.push(SyntaxError {
            offset,
            message: message.to_string(),
        });
    }

    fn start_node(
        &mut self,
        kind: SyntaxKind,
    ) {
        self.skip_trivia();
        self.builder.start_node(kind.into());
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia();
        self.builder.checkpoint()
    }

    fn start_node_at(
        &mut self,
        checkpoint: Checkpoint,
        kind: SyntaxKind,
    ) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }
}

fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        K::Semicolon => "`;`",
        K::RParen => "`)`",
        K::RBrace => "`}`",
        K::RBracket => "`]`",
        K::Colon => "`:`",
        K::LParen => "`(`",
        _ => "a token",
    }
}

#[cfg(test)]
#[path = "../../../tests/src/frontend/syntax/parser_tests.rs"]
mod tests;
