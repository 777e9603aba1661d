//! Node location from reported text ranges
//!
//! Fix providers receive a diagnostic's range and must find the node it was
//! reported on. Every lookup returns an `Option`: a range that no longer
//! resolves to the expected shape means "nothing to do here", never an error.

use rowan::{NodeOrToken, TextRange, TextSize, TokenAtOffset};

use crate::cst::ast::AstNode;
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::trivia::{
    element_full_range, next_significant_token, prev_significant_token, trailing_range,
};

/// Which token wins when an offset sits on the boundary between two tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenBias {
    /// The token starting at the offset
    #[default]
    Following,
    /// The token ending at the offset
    Previous,
}

/// Search options for [`find_node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    /// Match against full ranges, so a range inside a comment finds the node
    /// owning that comment
    pub include_trivia: bool,
    pub bias: TokenBias,
}

impl FindOptions {
    pub fn with_trivia() -> Self {
        Self {
            include_trivia: true,
            ..Self::default()
        }
    }

    pub fn previous() -> Self {
        Self {
            bias: TokenBias::Previous,
            ..Self::default()
        }
    }
}

/// Token (trivia included) at `offset`, resolving boundaries with `bias`
fn raw_token_at(root: &SyntaxNode, offset: TextSize, bias: TokenBias) -> Option<SyntaxToken> {
    if !root.text_range().contains_inclusive(offset) {
        return None;
    }
    match root.token_at_offset(offset) {
        TokenAtOffset::None => root.last_token(),
        TokenAtOffset::Single(token) => Some(token),
        TokenAtOffset::Between(left, right) => match bias {
            TokenBias::Following => Some(right),
            TokenBias::Previous => Some(left),
        },
    }
}

/// Non-trivia token at `offset`
///
/// Offsets inside trivia move to the next significant token (`Following`)
/// or the previous one (`Previous`).
pub fn find_token(root: &SyntaxNode, offset: TextSize, bias: TokenBias) -> Option<SyntaxToken> {
    let token = raw_token_at(root, offset, bias)?;
    if !token.kind().is_trivia() {
        return Some(token);
    }
    match bias {
        TokenBias::Following => next_significant_token(&token),
        TokenBias::Previous => prev_significant_token(&token),
    }
}

/// Significant token owning a trivia token
fn trivia_owner(token: &SyntaxToken) -> Option<SyntaxToken> {
    match prev_significant_token(token) {
        Some(prev) if trailing_range(&prev).contains_range(token.text_range()) => Some(prev),
        _ => next_significant_token(token),
    }
}

/// Deepest node whose span (or full range) contains `range`
pub fn find_node(root: &SyntaxNode, range: TextRange, options: FindOptions) -> Option<SyntaxNode> {
    if !root.text_range().contains_range(range) {
        return None;
    }

    let start = if range.is_empty() {
        raw_token_at(root, range.start(), options.bias)?
    } else {
        match root.covering_element(range) {
            NodeOrToken::Node(node) => {
                if options.include_trivia {
                    raw_token_at(root, range.start(), TokenBias::Following)?
                } else {
                    return Some(node);
                }
            }
            NodeOrToken::Token(token) => token,
        }
    };

    if !options.include_trivia {
        return start
            .parent()?
            .ancestors()
            .find(|n| n.text_range().contains_range(range));
    }

    let owner = if start.kind().is_trivia() {
        trivia_owner(&start)?
    } else {
        start
    };
    owner.parent()?.ancestors().find(|n| {
        element_full_range(&NodeOrToken::Node(n.clone())).contains_range(range)
    })
}

/// Closest node around `range` accepted by `predicate`
pub fn find_node_matching(
    root: &SyntaxNode,
    range: TextRange,
    options: FindOptions,
    predicate: impl Fn(&SyntaxNode) -> bool,
) -> Option<SyntaxNode> {
    find_node(root, range, options)?
        .ancestors()
        .find(|n| predicate(n))
}

/// Closest node around `range` of the typed shape `N`
pub fn find_ancestor<N: AstNode>(
    root: &SyntaxNode,
    range: TextRange,
    options: FindOptions,
) -> Option<N> {
    find_node(root, range, options)?.ancestors().find_map(N::cast)
}
