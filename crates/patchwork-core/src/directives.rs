//! Directive-balance checking
//!
//! A node may only be removed or replaced wholesale when every
//! conditional-compilation or region directive inside its full range has its
//! partner inside the same range. Anything else would orphan a directive and
//! leave code that no longer compiles.

use rowan::TextRange;

use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken};
use crate::trivia::{full_range, tokens_in_range};

/// Preprocessor directive classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    If,
    Elif,
    Else,
    EndIf,
    Region,
    EndRegion,
    /// `#pragma`, `#define`, `#nullable` and friends; never paired
    Other,
}

impl DirectiveKind {
    pub fn of(kind: SyntaxKind) -> Option<Self> {
        let directive = match kind {
            SyntaxKind::IfDirective => Self::If,
            SyntaxKind::ElifDirective => Self::Elif,
            SyntaxKind::ElseDirective => Self::Else,
            SyntaxKind::EndIfDirective => Self::EndIf,
            SyntaxKind::RegionDirective => Self::Region,
            SyntaxKind::EndRegionDirective => Self::EndRegion,
            SyntaxKind::OtherDirective => Self::Other,
            _ => return None,
        };
        Some(directive)
    }

    /// Whether the directive takes part in balancing
    pub fn is_paired(self) -> bool {
        self != Self::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Conditional,
    Region,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    opener: SyntaxToken,
    branches: Vec<SyntaxToken>,
}

/// Directive tokens lying entirely inside `range`, in document order
fn directives_in(root: &SyntaxNode, range: TextRange) -> Vec<SyntaxToken> {
    tokens_in_range(root, range)
        .filter(|t| t.kind().is_directive() && range.contains_range(t.text_range()))
        .collect()
}

fn root_of(node: &SyntaxNode) -> SyntaxNode {
    node.ancestors().last().unwrap_or_else(|| node.clone())
}

/// Whether the full range of `node` holds any directive trivia
pub fn contains_directives(node: &SyntaxNode) -> bool {
    !directives_in(&root_of(node), full_range(node)).is_empty()
}

/// Whether removing or replacing `node` (full range) would orphan a directive
pub fn contains_unbalanced_directives(node: &SyntaxNode) -> bool {
    !unbalanced_directives_of(node).is_empty()
}

/// Directives in the full range of `node` whose partner lies outside it
pub fn unbalanced_directives_of(node: &SyntaxNode) -> Vec<SyntaxToken> {
    unbalanced_directives_in(&root_of(node), full_range(node))
}

/// Directives inside `range` whose partner lies outside it
///
/// `#elif`/`#else` without their `#if`, closers without openers, openers
/// without closers and crossed `#region`/`#if` nesting all count.
pub fn unbalanced_directives_in(root: &SyntaxNode, range: TextRange) -> Vec<SyntaxToken> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut unbalanced = Vec::new();

    for token in directives_in(root, range) {
        let Some(kind) = DirectiveKind::of(token.kind()) else {
            continue;
        };
        match kind {
            DirectiveKind::If => stack.push(Frame {
                kind: FrameKind::Conditional,
                opener: token,
                branches: Vec::new(),
            }),
            DirectiveKind::Region => stack.push(Frame {
                kind: FrameKind::Region,
                opener: token,
                branches: Vec::new(),
            }),
            DirectiveKind::Elif | DirectiveKind::Else => match stack.last_mut() {
                Some(frame) if frame.kind == FrameKind::Conditional => frame.branches.push(token),
                _ => unbalanced.push(token),
            },
            DirectiveKind::EndIf => close(&mut stack, FrameKind::Conditional, token, &mut unbalanced),
            DirectiveKind::EndRegion => close(&mut stack, FrameKind::Region, token, &mut unbalanced),
            DirectiveKind::Other => {}
        }
    }

    for frame in stack {
        unbalanced.push(frame.opener);
        unbalanced.extend(frame.branches);
    }
    unbalanced.sort_by_key(|t| t.text_range().start());
    unbalanced
}

fn close(
    stack: &mut Vec<Frame>,
    expected: FrameKind,
    closer: SyntaxToken,
    unbalanced: &mut Vec<SyntaxToken>,
) {
    match stack.last() {
        Some(frame) if frame.kind == expected => {
            stack.pop();
        }
        _ => unbalanced.push(closer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::SyntaxTree;

    fn field(tree: &SyntaxTree, index: usize) -> SyntaxNode {
        tree.root()
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::FieldDeclaration)
            .nth(index)
            .expect("field")
    }

    #[test]
    fn test_balanced_pair_inside_node() {
        let tree = SyntaxTree::parse(
            "class C\n{\n    void M()\n    {\n#if DEBUG\n        Log();\n#else\n        Skip();\n#endif\n    }\n}\n",
        );
        let method = tree
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::MethodDeclaration)
            .expect("method");
        assert!(contains_directives(&method));
        assert!(!contains_unbalanced_directives(&method));
    }

    #[test]
    fn test_half_pair_in_leading_trivia() {
        let tree = SyntaxTree::parse("class C\n{\n#if DEBUG\n    int a;\n#endif\n    int b;\n}\n");
        // `#if` leads `a`, `#endif` leads `b`
        assert!(contains_unbalanced_directives(&field(&tree, 0)));
        assert!(contains_unbalanced_directives(&field(&tree, 1)));
    }

    #[test]
    fn test_region_and_other_directives() {
        let tree = SyntaxTree::parse(
            "class C\n{\n    #region Fields\n    #pragma warning disable\n    int a;\n    #endregion\n    int b;\n    int c;\n}\n",
        );
        let root = tree.root();
        let whole = root.text_range();
        assert!(unbalanced_directives_in(&root, whole).is_empty());
        assert!(contains_unbalanced_directives(&field(&tree, 0)));
        assert!(contains_unbalanced_directives(&field(&tree, 1)));
        assert!(!contains_directives(&field(&tree, 2)));
        assert!(!contains_unbalanced_directives(&field(&tree, 2)));
    }

    #[test]
    fn test_crossed_nesting_is_unbalanced() {
        let tree = SyntaxTree::parse("#region A\n#if X\n#endregion\n#endif\nclass C { }\n");
        let root = tree.root();
        let offending = unbalanced_directives_in(&root, root.text_range());
        let kinds: Vec<_> = offending.iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![SyntaxKind::RegionDirective, SyntaxKind::EndRegionDirective]
        );
    }

    #[test]
    fn test_stray_else_is_unbalanced() {
        let tree = SyntaxTree::parse("#if A\nclass C\n{\n#else\n}\n#endif\n");
        let root = tree.root();
        let class = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ClassDeclaration)
            .expect("class");
        let offending = unbalanced_directives_in(&root, class.text_range());
        assert_eq!(offending.len(), 1);
        assert_eq!(offending[0].kind(), SyntaxKind::ElseDirective);
    }

    #[test]
    fn test_only_the_node_range_is_inspected() {
        let tree = SyntaxTree::parse(
            "class C\n{\n#if A\n    int a;\n    int b;\n    int c;\n#endif\n}\n#region Tail\n",
        );
        // `#if` leads `a`, `#endif` leads the closing brace
        assert_eq!(unbalanced_directives_of(&field(&tree, 0)).len(), 1);
        assert!(unbalanced_directives_of(&field(&tree, 1)).is_empty());
        assert!(!contains_directives(&field(&tree, 1)));
        assert!(unbalanced_directives_of(&field(&tree, 2)).is_empty());
    }
}
