//! Green-tree splicing
//!
//! A splice replaces the text of a range with a list of green elements. The
//! range is resolved against children boundaries from the root down: when it
//! falls inside one child the splice recurses into that child, otherwise the
//! covered children of the current node are swapped for the replacement. Only
//! the spine from the root to the edited node is rebuilt; every untouched
//! subtree is shared with the input.
//!
//! Ranges whose ends sit inside a child node (a removal that takes a
//! statement plus the line break its parent owns) are clipped into that child.
//! A range that cuts a token is rejected as misaligned.

use rowan::{GreenNode, GreenNodeData, GreenTokenData, NodeOrToken, TextRange, TextSize};

use crate::cst::{GreenElement, SyntaxKind};
use crate::error::EditError;

type ChildRef<'a> = NodeOrToken<&'a GreenNodeData, &'a GreenTokenData>;

fn children_with_ranges(node: &GreenNodeData, offset: TextSize) -> Vec<(ChildRef<'_>, TextRange)> {
    let mut start = offset;
    node.children()
        .map(|child| {
            let len = match child {
                NodeOrToken::Node(node) => node.text_len(),
                NodeOrToken::Token(token) => token.text_len(),
            };
            let range = TextRange::at(start, len);
            start += len;
            (child, range)
        })
        .collect()
}

fn kind_of(node: &GreenNodeData) -> SyntaxKind {
    SyntaxKind::from_raw(node.kind().0)
}

/// Whether `node` has a descendant of `kind` spanning all of its text
fn wraps_kind(node: &GreenNodeData, kind: SyntaxKind) -> bool {
    node.children().any(|child| match child {
        NodeOrToken::Node(child) if child.text_len() == node.text_len() => {
            kind_of(child) == kind || wraps_kind(child, kind)
        }
        _ => false,
    })
}

/// Replace `range` (absolute, with `node` starting at `offset`) by
/// `replacement`
///
/// `target` names the kind of node the splice was built for; when several
/// nested nodes share the same range the splice goes to the one of that kind.
pub(crate) fn splice(
    node: &GreenNodeData,
    offset: TextSize,
    range: TextRange,
    target: Option<SyntaxKind>,
    replacement: &[GreenElement],
) -> Result<GreenNode, EditError> {
    if range.is_empty() {
        insert(node, offset, range.start(), replacement)
    } else {
        replace(node, offset, range, target, replacement)
    }
}

fn insert(
    node: &GreenNodeData,
    offset: TextSize,
    point: TextSize,
    replacement: &[GreenElement],
) -> Result<GreenNode, EditError> {
    let children = children_with_ranges(node, offset);
    let mut index = children.len();
    for (i, (child, child_range)) in children.iter().enumerate() {
        if child_range.start() < point && point < child_range.end() {
            return match child {
                NodeOrToken::Node(child) => {
                    let new_child = insert(child, child_range.start(), point, replacement)?;
                    Ok(node.replace_child(i, NodeOrToken::Node(new_child)))
                }
                NodeOrToken::Token(_) => Err(EditError::Misaligned {
                    range: TextRange::empty(point),
                }),
            };
        }
        if child_range.start() >= point {
            index = i;
            break;
        }
    }
    Ok(node.splice_children(index..index, replacement.iter().cloned()))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Home {
    Left,
    Covered,
    Right,
}

fn replace(
    node: &GreenNodeData,
    offset: TextSize,
    range: TextRange,
    target: Option<SyntaxKind>,
    replacement: &[GreenElement],
) -> Result<GreenNode, EditError> {
    let children = children_with_ranges(node, offset);
    let mut covered: Vec<usize> = Vec::new();
    let mut left = None;
    let mut right = None;

    for (index, (_, child_range)) in children.iter().enumerate() {
        if child_range.is_empty() {
            if range.start() < child_range.start() && child_range.end() < range.end() {
                covered.push(index);
            }
            continue;
        }
        if child_range.end() <= range.start() || child_range.start() >= range.end() {
            continue;
        }
        if range.contains_range(*child_range) {
            covered.push(index);
        } else if child_range.start() < range.start() {
            if child_range.end() > range.end() {
                // the whole range lies inside this child
                let (child, child_range) = &children[index];
                let NodeOrToken::Node(child) = child else {
                    return Err(EditError::Misaligned { range });
                };
                let new_child = replace(child, child_range.start(), range, target, replacement)?;
                return Ok(node.replace_child(index, NodeOrToken::Node(new_child)));
            }
            left = Some(index);
        } else {
            right = Some(index);
        }
    }

    if left.is_none() && right.is_none() {
        let (Some(&first), Some(&last)) = (covered.first(), covered.last()) else {
            return Err(EditError::Misaligned { range });
        };
        if first == last {
            if let (NodeOrToken::Node(child), child_range) = &children[first] {
                let descend = *child_range == range
                    && target.is_some_and(|kind| kind != kind_of(child) && wraps_kind(child, kind));
                if descend {
                    let new_child = replace(child, child_range.start(), range, target, replacement)?;
                    return Ok(node.replace_child(first, NodeOrToken::Node(new_child)));
                }
            }
        }
        return Ok(node.splice_children(first..=last, replacement.iter().cloned()));
    }

    let home = if left.is_some() {
        Home::Left
    } else if !covered.is_empty() {
        Home::Covered
    } else {
        Home::Right
    };
    let nothing: &[GreenElement] = &[];
    let elements_for = |place: Home| if place == home { replacement } else { nothing };
    let target_for = |place: Home| if place == home { target } else { None };

    // Right to left so the indices of earlier children stay valid
    let mut result = node.to_owned();
    if let Some(index) = right {
        let (child, child_range) = &children[index];
        let NodeOrToken::Node(child) = child else {
            return Err(EditError::Misaligned { range });
        };
        let clipped = TextRange::new(child_range.start(), range.end());
        let new_child = replace(
            child,
            child_range.start(),
            clipped,
            target_for(Home::Right),
            elements_for(Home::Right),
        )?;
        result = result.replace_child(index, NodeOrToken::Node(new_child));
    }
    if let (Some(&first), Some(&last)) = (covered.first(), covered.last()) {
        result = result.splice_children(first..=last, elements_for(Home::Covered).iter().cloned());
    }
    if let Some(index) = left {
        let (child, child_range) = &children[index];
        let NodeOrToken::Node(child) = child else {
            return Err(EditError::Misaligned { range });
        };
        let clipped = TextRange::new(range.start(), child_range.end());
        let new_child = replace(
            child,
            child_range.start(),
            clipped,
            target_for(Home::Left),
            elements_for(Home::Left),
        )?;
        result = result.replace_child(index, NodeOrToken::Node(new_child));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{SyntaxNode, SyntaxTree, make};

    fn text_of(green: GreenNode) -> String {
        SyntaxNode::new_root(green).text().to_string()
    }

    fn at(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn test_replace_whole_token_range() {
        let tree = SyntaxTree::parse("class C { int a = 1; }");
        let one = make::expression("2").expect("expression");
        let green = splice(tree.green(), 0.into(), at(18, 19), None, &[NodeOrToken::Node(one)])
            .expect("splice");
        assert_eq!(text_of(green), "class C { int a = 2; }");
    }

    #[test]
    fn test_delete_range_crossing_node_end() {
        // the space before `break` belongs to the section, the one after
        // `break;` to the switch statement
        let source = "class C { void F(int x) { switch (x) { case 1: M(); break; } } }";
        let tree = SyntaxTree::parse(source);
        let start = source.find(" break;").expect("break") as u32;
        let end = start + " break; ".len() as u32;
        let green = splice(tree.green(), 0.into(), at(start, end), None, &[]).expect("splice");
        assert_eq!(
            text_of(green),
            "class C { void F(int x) { switch (x) { case 1: M();} } }"
        );
    }

    #[test]
    fn test_insert_at_boundary_goes_to_outermost_parent() {
        let tree = SyntaxTree::parse("class C { int a; }");
        let green = splice(
            tree.green(),
            0.into(),
            TextRange::empty(16.into()),
            None,
            &[make::whitespace(" ")],
        )
        .expect("splice");
        let root = SyntaxNode::new_root(green);
        assert_eq!(root.text().to_string(), "class C { int a;  }");
        let field = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::FieldDeclaration)
            .expect("field");
        assert_eq!(field.text().to_string(), "int a;");
    }

    #[test]
    fn test_cutting_a_token_is_misaligned() {
        let tree = SyntaxTree::parse("class Widget { }");
        let err = splice(tree.green(), 0.into(), at(7, 9), None, &[]).unwrap_err();
        assert!(matches!(err, EditError::Misaligned { .. }));
        let err = splice(tree.green(), 0.into(), TextRange::empty(8.into()), None, &[]).unwrap_err();
        assert!(matches!(err, EditError::Misaligned { .. }));
    }

    #[test]
    fn test_target_kind_picks_nested_node_with_same_range() {
        // the argument and its expression share a range
        let tree = SyntaxTree::parse("class C { void F() { M(a); } }");
        let name = tree
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::IdentifierName && n.text() == "a")
            .expect("name");
        let replacement = make::expression("b").expect("expression");
        let green = splice(
            tree.green(),
            0.into(),
            name.text_range(),
            Some(SyntaxKind::IdentifierName),
            &[NodeOrToken::Node(replacement)],
        )
        .expect("splice");
        let root = SyntaxNode::new_root(green);
        assert_eq!(root.text().to_string(), "class C { void F() { M(b); } }");
        let argument = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::Argument)
            .expect("argument survives");
        assert_eq!(argument.text().to_string(), "b");
    }
}
