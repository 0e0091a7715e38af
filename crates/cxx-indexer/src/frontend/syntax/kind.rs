use logos::Logos;

/// Declares the lexer token enum, the rowan kind enum that embeds every token
/// kind followed by the composite node kinds, and the conversion between them.
macro_rules! syntax_kinds {
    (
        tokens { $( $(#[$attr:meta])* $token:ident, )* }
        nodes { $( $node:ident, )* }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            Error = 0,
            $( $token, )*
            $( $node, )*
            #[doc(hidden)]
            #[allow(non_camel_case_types)]
            __LAST,
        }

        #[derive(Logos, Debug, PartialEq, Clone, Copy)]
        #[logos(error = ())]
        pub enum TokenKind {
            $( $(#[$attr])* $token, )*
        }

        impl From<TokenKind> for SyntaxKind {
            fn from(token: TokenKind) -> Self {
                match token {
                    $( TokenKind::$token => SyntaxKind::$token, )*
                }
            }
        }
    };
}

syntax_kinds! {
    tokens {
        #[regex(r"[ \t\r\n\f\x0B]+")]
        #[regex(r"\\\r?\n")]
        Whitespace,
        #[regex(r"//.*", allow_greedy = true)]
        LineComment,
        #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
        BlockComment,

        #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
        Ident,
        #[regex(r"0[xX][0-9A-Fa-f]('?[0-9A-Fa-f])*[uUlLzZ]*")]
        #[regex(r"0[bB][01]('?[01])*[uUlLzZ]*")]
        #[regex(r"[0-9]('?[0-9])*[uUlLzZ]*")]
        IntNumber,
        #[regex(r"[0-9]('?[0-9])*\.[0-9]*([eE][+-]?[0-9]+)?[fFlL]?")]
        #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?")]
        #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?")]
        FloatNumber,
        #[regex(r#""([^"\\\n]|\\[\s\S])*""#)]
        #[regex(r#"R"[^(\s]*\(([^)]|\)[^"])*\)[^"\s]*""#)]
        StringLit,
        #[regex(r#"'([^'\\\n]|\\[\s\S])+'"#)]
        CharLit,

        #[token("#")]
        Hash,
        #[token("(")]
        LParen,
        #[token(")")]
        RParen,
        #[token("{")]
        LBrace,
        #[token("}")]
        RBrace,
        #[token("[")]
        LBracket,
        #[token("]")]
        RBracket,
        #[token(";")]
        Semicolon,
        #[token(":")]
        Colon,
        #[token("::")]
        ColonColon,
        #[token(",")]
        Comma,
        #[token(".")]
        Dot,
        #[token(".*")]
        DotStar,
        #[token("->")]
        Arrow,
        #[token("->*")]
        ArrowStar,
        #[token("...")]
        Ellipsis,
        #[token("?")]
        Question,

        #[token("+")]
        Plus,
        #[token("-")]
        Minus,
        #[token("*")]
        Star,
        #[token("/")]
        Slash,
        #[token("%")]
        Percent,
        #[token("^")]
        Caret,
        #[token("&")]
        Amp,
        #[token("|")]
        Pipe,
        #[token("~")]
        Tilde,
        #[token("!")]
        Bang,
        #[token("=")]
        Eq,
        #[token("<")]
        Lt,
        #[token(">")]
        Gt,
        #[token("++")]
        PlusPlus,
        #[token("--")]
        MinusMinus,
        #[token("&&")]
        AmpAmp,
        #[token("||")]
        PipePipe,
        #[token("<<")]
        Shl,
        #[token("==")]
        EqEq,
        #[token("!=")]
        BangEq,
        #[token("<=")]
        LtEq,
        #[token(">=")]
        GtEq,
        #[token("+=")]
        #[token("-=")]
        #[token("*=")]
        #[token("/=")]
        #[token("%=")]
        #[token("^=")]
        #[token("&=")]
        #[token("|=")]
        #[token("<<=")]
        #[token(">>=")]
        CompoundAssign,

        #[token("auto")]
        KwAuto,
        #[token("bool")]
        KwBool,
        #[token("break")]
        KwBreak,
        #[token("case")]
        KwCase,
        #[token("catch")]
        KwCatch,
        #[token("char")]
        #[token("char8_t")]
        #[token("char16_t")]
        #[token("char32_t")]
        #[token("wchar_t")]
        KwChar,
        #[token("class")]
        KwClass,
        #[token("const")]
        KwConst,
        #[token("constexpr")]
        #[token("consteval")]
        #[token("constinit")]
        KwConstexpr,
        #[token("continue")]
        KwContinue,
        #[token("decltype")]
        KwDecltype,
        #[token("default")]
        KwDefault,
        #[token("delete")]
        KwDelete,
        #[token("do")]
        KwDo,
        #[token("double")]
        KwDouble,
        #[token("else")]
        KwElse,
        #[token("enum")]
        KwEnum,
        #[token("explicit")]
        KwExplicit,
        #[token("extern")]
        KwExtern,
        #[token("false")]
        KwFalse,
        #[token("float")]
        KwFloat,
        #[token("for")]
        KwFor,
        #[token("friend")]
        KwFriend,
        #[token("goto")]
        KwGoto,
        #[token("if")]
        KwIf,
        #[token("inline")]
        KwInline,
        #[token("int")]
        KwInt,
        #[token("long")]
        KwLong,
        #[token("mutable")]
        KwMutable,
        #[token("namespace")]
        KwNamespace,
        #[token("new")]
        KwNew,
        #[token("noexcept")]
        KwNoexcept,
        #[token("nullptr")]
        KwNullptr,
        #[token("operator")]
        KwOperator,
        #[token("private")]
        #[token("protected")]
        #[token("public")]
        KwAccess,
        #[token("register")]
        KwRegister,
        #[token("return")]
        KwReturn,
        #[token("short")]
        KwShort,
        #[token("signed")]
        KwSigned,
        #[token("sizeof")]
        #[token("alignof")]
        #[token("typeid")]
        KwSizeof,
        #[token("static")]
        KwStatic,
        #[token("static_assert")]
        KwStaticAssert,
        #[token("static_cast")]
        #[token("dynamic_cast")]
        #[token("const_cast")]
        #[token("reinterpret_cast")]
        KwCast,
        #[token("struct")]
        KwStruct,
        #[token("switch")]
        KwSwitch,
        #[token("template")]
        KwTemplate,
        #[token("this")]
        KwThis,
        #[token("thread_local")]
        KwThreadLocal,
        #[token("throw")]
        KwThrow,
        #[token("true")]
        KwTrue,
        #[token("try")]
        KwTry,
        #[token("typedef")]
        KwTypedef,
        #[token("typename")]
        KwTypename,
        #[token("union")]
        KwUnion,
        #[token("unsigned")]
        KwUnsigned,
        #[token("using")]
        KwUsing,
        #[token("virtual")]
        KwVirtual,
        #[token("void")]
        KwVoid,
        #[token("volatile")]
        KwVolatile,
        #[token("while")]
        KwWhile,
    }
    nodes {
        // lookahead past the last token; never stored in a tree
        Eof,

        Root,

        // declarations
        NamespaceDef,
        UsingDirective,
        UsingDecl,
        AliasDecl,
        TypedefDecl,
        TemplateDecl,
        TemplateParams,
        ClassDef,
        BaseClause,
        BaseSpec,
        AccessLabel,
        EnumDef,
        Enumerator,
        FunctionDecl,
        ParamList,
        Param,
        CtorInit,
        VarDecl,
        Declarator,
        Initializer,
        TypeRef,
        DeclList,
        LinkageSpec,

        // statements
        Block,
        ExprStmt,
        ReturnStmt,
        IfStmt,
        ForStmt,
        WhileStmt,
        DoStmt,
        SwitchStmt,
        CaseLabel,
        JumpStmt,
        TryStmt,
        CatchClause,

        // expressions
        NameRef,
        QualifiedName,
        TemplateArgs,
        ThisExpr,
        Literal,
        ParenExpr,
        CallExpr,
        ArgList,
        IndexExpr,
        MemberExpr,
        UnaryExpr,
        PostfixExpr,
        BinaryExpr,
        ConditionalExpr,
        CastExpr,
        NewExpr,
        SizeofExpr,
        LambdaExpr,
        InitList,
        TokenTree,
        ErrorNode,
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Whitespace | SyntaxKind::LineComment | SyntaxKind::BlockComment)
    }

    /// Keywords that can only start a type in a declaration.
    pub fn is_builtin_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::KwAuto
                | SyntaxKind::KwBool
                | SyntaxKind::KwChar
                | SyntaxKind::KwDouble
                | SyntaxKind::KwFloat
                | SyntaxKind::KwInt
                | SyntaxKind::KwLong
                | SyntaxKind::KwShort
                | SyntaxKind::KwSigned
                | SyntaxKind::KwUnsigned
                | SyntaxKind::KwVoid
        )
    }

    /// Specifier keywords that may precede the type of a declaration.
    pub fn is_decl_specifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::KwConst
                | SyntaxKind::KwConstexpr
                | SyntaxKind::KwExplicit
                | SyntaxKind::KwExtern
                | SyntaxKind::KwFriend
                | SyntaxKind::KwInline
                | SyntaxKind::KwMutable
                | SyntaxKind::KwRegister
                | SyntaxKind::KwStatic
                | SyntaxKind::KwThreadLocal
                | SyntaxKind::KwTypename
                | SyntaxKind::KwVirtual
                | SyntaxKind::KwVolatile
        )
    }

    /// Node kinds whose text can be evaluated as a name or expression.
    pub fn is_expression_candidate(self) -> bool {
        matches!(
            self,
            SyntaxKind::NameRef
                | SyntaxKind::QualifiedName
                | SyntaxKind::MemberExpr
                | SyntaxKind::CallExpr
                | SyntaxKind::IndexExpr
                | SyntaxKind::ParenExpr
                | SyntaxKind::UnaryExpr
                | SyntaxKind::BinaryExpr
                | SyntaxKind::ThisExpr
                | SyntaxKind::TypeRef
        )
    }

    pub fn is_scope_or_member_operator(self) -> bool {
        matches!(
            self,
            SyntaxKind::ColonColon
                | SyntaxKind::Dot
                | SyntaxKind::Arrow
                | SyntaxKind::DotStar
                | SyntaxKind::ArrowStar
        )
    }
}
