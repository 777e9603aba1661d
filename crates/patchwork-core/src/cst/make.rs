//! Green-node factory
//!
//! Fixes build new content by parsing a snippet inside a minimal context and
//! lifting the requested node out of it. A snippet that does not parse
//! cleanly to exactly the requested shape yields `None`, so a fix can never
//! splice half-parsed text into a tree.

use rowan::{GreenNode, GreenToken, NodeOrToken};

use super::ast::is_expression;
use super::{SyntaxKind, SyntaxNode, SyntaxTree};

/// A green element ready to be spliced into a tree
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

const STATEMENT_PREFIX: &str = "class __Make { void __M() {\n";
const STATEMENT_SUFFIX: &str = "\n} }";

/// Parse `context` and return the first node accepted by `select` whose text
/// is exactly `snippet`
fn lift(context: &str, snippet: &str, select: impl Fn(&SyntaxNode) -> bool) -> Option<GreenNode> {
    let tree = SyntaxTree::parse(context);
    if tree.has_errors() {
        tracing::debug!("Snippet did not parse cleanly: {snippet:?}");
        return None;
    }
    let node = tree.root().descendants().find(|n| select(n))?;
    if node.text() != snippet {
        return None;
    }
    Some(node.green().into_owned())
}

/// One statement, e.g. `ArgumentNullException.ThrowIfNull(x);`
pub fn statement(text: &str) -> Option<GreenNode> {
    let snippet = text.trim();
    let context = format!("{STATEMENT_PREFIX}{snippet}{STATEMENT_SUFFIX}");
    lift(&context, snippet, |n| {
        n.kind().is_statement()
            && n.parent()
                .and_then(|p| p.parent())
                .is_some_and(|gp| gp.kind() == SyntaxKind::MethodDeclaration)
    })
}

/// One expression, e.g. `Red` or `!flag`
pub fn expression(text: &str) -> Option<GreenNode> {
    let snippet = text.trim();
    let context = format!("class __Make {{ object __f = {snippet}; }}");
    lift(&context, snippet, |n| {
        is_expression(n.kind())
            && n.parent()
                .is_some_and(|p| p.kind() == SyntaxKind::EqualsValueClause)
    })
}

/// Expression wrapped in parentheses when it is not already primary
pub fn parenthesize(text: &str) -> Option<GreenNode> {
    let node = expression(text)?;
    let kind = SyntaxKind::from_raw(node.kind().0);
    if matches!(
        kind,
        SyntaxKind::BinaryExpression
            | SyntaxKind::ConditionalExpression
            | SyntaxKind::AssignmentExpression
            | SyntaxKind::LambdaExpression
    ) {
        expression(&format!("({})", text.trim()))
    } else {
        Some(node)
    }
}

/// `IdentifierName` node for a simple name
pub fn identifier_name(name: &str) -> Option<GreenNode> {
    expression(name).filter(|n| n.kind() == SyntaxKind::IdentifierName.into())
}

/// One enum member, e.g. `Blue = 4`
pub fn enum_member(text: &str) -> Option<GreenNode> {
    let snippet = text.trim();
    let context = format!("enum __Make {{ {snippet} }}");
    lift(&context, snippet, |n| {
        n.kind() == SyntaxKind::EnumMemberDeclaration
    })
}

/// One type member, e.g. a field or method declaration
pub fn member(text: &str) -> Option<GreenNode> {
    let snippet = text.trim();
    let context = format!("class __Make {{\n{snippet}\n}}");
    lift(&context, snippet, |n| {
        n.kind().is_member_declaration()
            && n.parent()
                .is_some_and(|p| p.kind() == SyntaxKind::ClassDeclaration)
    })
}

pub fn token(kind: SyntaxKind, text: &str) -> GreenToken {
    GreenToken::new(kind.into(), text)
}

pub fn whitespace(text: &str) -> GreenElement {
    NodeOrToken::Token(token(SyntaxKind::Whitespace, text))
}

pub fn newline(text: &str) -> GreenElement {
    NodeOrToken::Token(token(SyntaxKind::Newline, text))
}

/// Green element for an existing red node or token
pub fn element_of(element: &super::SyntaxElement) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => NodeOrToken::Node(node.green().into_owned()),
        NodeOrToken::Token(token) => NodeOrToken::Token(token.green().to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(node: GreenNode) -> String {
        SyntaxNode::new_root(node).text().to_string()
    }

    #[test]
    fn test_statement() {
        let node = statement("ArgumentNullException.ThrowIfNull(x);").expect("statement");
        assert_eq!(node.kind(), SyntaxKind::ExpressionStatement.into());
        assert_eq!(text_of(node), "ArgumentNullException.ThrowIfNull(x);");
    }

    #[test]
    fn test_statement_rejects_two_statements_and_garbage() {
        assert!(statement("a(); b();").is_none());
        assert!(statement("if (").is_none());
    }

    #[test]
    fn test_expression_and_identifier() {
        let node = expression("!flag").expect("expression");
        assert_eq!(node.kind(), SyntaxKind::PrefixUnaryExpression.into());

        assert!(identifier_name("Red").is_some());
        assert!(identifier_name("a.b").is_none());
    }

    #[test]
    fn test_parenthesize() {
        let node = parenthesize("a == b").expect("expression");
        assert_eq!(text_of(node), "(a == b)");
        let node = parenthesize("a.b").expect("expression");
        assert_eq!(text_of(node), "a.b");
    }

    #[test]
    fn test_enum_member() {
        let node = enum_member("Blue = 4").expect("member");
        assert_eq!(node.kind(), SyntaxKind::EnumMemberDeclaration.into());
        assert_eq!(text_of(node), "Blue = 4");
    }
}
