//! Syntax trees with identity
//!
//! A [`SyntaxTree`] pairs an immutable green root with a process-unique
//! [`TreeId`]. Every parse and every applied edit yields a new id, so a node
//! or diagnostic can always be checked against the tree it came from.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rowan::{GreenNode, TextSize};

use super::parser::{ParseError, parse_green};
use super::{SyntaxNode, SyntaxToken};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one tree version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    fn fresh() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// An immutable, shareable syntax tree
///
/// Cloning is cheap and keeps the id: clones are the same tree version.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    green: GreenNode,
    id: TreeId,
    errors: Arc<[ParseError]>,
}

impl SyntaxTree {
    /// Parse source text into a new tree
    pub fn parse(text: &str) -> Self {
        let (green, errors) = parse_green(text);
        Self {
            green,
            id: TreeId::fresh(),
            errors: errors.into(),
        }
    }

    /// Wrap an edited green root as a new tree version
    ///
    /// Edited trees carry no parse errors of their own; use
    /// [`SyntaxTree::reparse`] when the error set matters.
    pub fn from_green(green: GreenNode) -> Self {
        Self {
            green,
            id: TreeId::fresh(),
            errors: Arc::from(Vec::new()),
        }
    }

    /// Same tree version with a different recorded error set
    pub(crate) fn with_errors(self, errors: Vec<ParseError>) -> Self {
        Self {
            errors: errors.into(),
            ..self
        }
    }

    /// Parse this tree's text from scratch into a fresh tree version
    pub fn reparse(&self) -> Self {
        Self::parse(&self.text())
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Red root for navigation, built on the calling thread
    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn text(&self) -> String {
        self.root().text().to_string()
    }

    pub fn len(&self) -> TextSize {
        self.green.text_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == TextSize::from(0)
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether `node` belongs to this exact tree version
    pub fn owns(&self, node: &SyntaxNode) -> bool {
        match node.ancestors().last() {
            Some(root) => std::ptr::eq(&*root.green(), &*self.green),
            None => false,
        }
    }

    pub fn owns_token(&self, token: &SyntaxToken) -> bool {
        token.parent().is_some_and(|parent| self.owns(&parent))
    }
}
