//! Rowan language implementation for the host language
//!
//! This module implements the `rowan::Language` trait, which connects our
//! [`SyntaxKind`] enum to Rowan's generic CST infrastructure.

use rowan::Language;

use super::SyntaxKind;

/// Zero-sized marker tying [`SyntaxKind`] to rowan's generic tree types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CsLanguage;

impl Language for CsLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        SyntaxKind::from_raw(raw.0)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        CsLanguage::kind_to_raw(kind)
    }
}

pub type SyntaxNode = rowan::SyntaxNode<CsLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<CsLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<CsLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<CsLanguage>;
