use rowan::Language;

use crate::frontend::syntax::kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CxxLanguage {}

impl Language for CxxLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        let raw = raw.0;
        assert!(raw < SyntaxKind::__LAST as u16);
        // SAFETY: SyntaxKind is repr(u16) with contiguous discriminants starting at 0,
        // and the assertion keeps `raw` below the sentinel.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<CxxLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<CxxLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<CxxLanguage>;
