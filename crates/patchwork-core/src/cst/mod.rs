//! Concrete Syntax Tree (CST) for the host language
//!
//! A lossless syntax tree built on Rowan. The CST preserves all source
//! information including whitespace, comments and preprocessor directives, so
//! every edit can be expressed as a splice of green elements and everything it
//! does not touch comes out byte for byte.
//!
//! ## Architecture
//!
//! - **Green tree**: immutable, position-independent, shared between tree
//!   versions. An edit rebuilds only the spine from the root to the edited
//!   nodes.
//! - **Red tree**: built on demand by [`SyntaxTree::root`] for navigation with
//!   parent pointers and absolute offsets.
//!
//! ## Trivia
//!
//! Trivia are tokens of their own. The parser places them so that no node
//! starts or ends with trivia; [`crate::trivia`] attributes them to tokens:
//!
//! - **Trailing trivia**: after a token, up to and including the first line break
//! - **Leading trivia**: everything else before a token
//!
//! Round trip: `SyntaxTree::parse(source).text() == source` for any input.

mod language;
mod lexer;
mod parser;
mod syntax_kind;
mod tree;

pub mod ast;
pub mod make;

pub use language::{CsLanguage, SyntaxElement, SyntaxNode, SyntaxNodeChildren, SyntaxToken};
pub use lexer::{CstLexResult, CstToken, LexerError, lex_with_trivia};
pub use make::GreenElement;
pub use parser::{ParseError, parse, parse_green};
pub use syntax_kind::{SyntaxKind, keyword_kind};
pub use tree::{SyntaxTree, TreeId};

/// Indented dump of a tree: one element per line, kind, range and token text
pub fn debug_tree(node: &SyntaxNode) -> String {
    use rowan::WalkEvent;

    let mut out = String::new();
    let mut depth = 0usize;
    for event in node.preorder_with_tokens() {
        match event {
            WalkEvent::Enter(element) => {
                out.push_str(&"  ".repeat(depth));
                match element {
                    rowan::NodeOrToken::Node(node) => {
                        out.push_str(&format!("{:?}@{:?}\n", node.kind(), node.text_range()));
                    }
                    rowan::NodeOrToken::Token(token) => {
                        out.push_str(&format!(
                            "{:?}@{:?} {:?}\n",
                            token.kind(),
                            token.text_range(),
                            token.text()
                        ));
                    }
                }
                depth += 1;
            }
            WalkEvent::Leave(_) => depth -= 1,
        }
    }
    out
}
