//! Annotation-driven re-indentation
//!
//! Fixes move code between nesting levels (unwrapping a block, inserting a
//! statement) and mark what they touched with
//! [`AnnotationKind::Formatter`](crate::edit::AnnotationKind). This pass
//! re-indents only the lines that start inside those ranges:
//!
//! - Lines starting a statement, member, label, clause or brace get the
//!   indentation of their structural depth
//! - Continuation lines move by the same amount as the line that starts
//!   their statement
//! - Blank lines and directive lines are left alone
//!
//! Only indentation whitespace changes, and `format(format(x)) == format(x)`.

use std::collections::HashMap;

use rowan::{TextRange, TextSize};

use crate::Result;
use crate::cancel::CancellationToken;
use crate::config::{FormatterConfiguration, IndentStyle};
use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree, make};
use crate::edit::{Replacement, Splice, TreeEdit};
use crate::trivia::{first_significant_token, next_significant_token};

/// Re-indents annotated lines of a tree
#[derive(Debug, Clone)]
pub struct Formatter {
    indent_style: IndentStyle,
    indent_size: usize,
}

/// The first token of a line and the indentation before it
struct Line {
    indent: Option<SyntaxToken>,
    first: SyntaxToken,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(&FormatterConfiguration::default())
    }
}

impl Formatter {
    pub fn new(config: &FormatterConfiguration) -> Self {
        Self {
            indent_style: config.indent_style(),
            indent_size: config.indent_size(),
        }
    }

    /// Re-indent every line whose first token starts inside one of `ranges`
    ///
    /// Returns the input tree itself when nothing changes.
    pub fn format_annotated(
        &self,
        tree: &SyntaxTree,
        ranges: &[TextRange],
        cancel: &CancellationToken,
    ) -> Result<SyntaxTree> {
        let edit = self.indent_edit(tree, ranges, cancel)?;
        if edit.is_empty() {
            return Ok(tree.clone());
        }
        tracing::debug!("Re-indenting {} line(s) of {}", edit.len(), tree.id());
        Ok(edit.apply(tree)?.tree)
    }

    /// The whitespace splices [`Formatter::format_annotated`] would apply
    pub fn indent_edit(
        &self,
        tree: &SyntaxTree,
        ranges: &[TextRange],
        cancel: &CancellationToken,
    ) -> Result<TreeEdit> {
        let mut edit = TreeEdit::new(tree.id());
        if ranges.is_empty() {
            return Ok(edit);
        }

        let root = tree.root();
        // indentation delta per anchor, keyed by the anchor's start
        let mut deltas: HashMap<TextSize, isize> = HashMap::new();

        for line in lines(&root) {
            cancel.check()?;
            let start = line.first.text_range().start();
            if !ranges.iter().any(|r| r.start() <= start && start < r.end()) {
                continue;
            }

            let current = line.indent.as_ref().map(|t| t.text().to_string()).unwrap_or_default();
            let current_width = self.width(&current);
            let anchor = anchor_of(&line.first);

            let target_width = if line.first.kind().is_comment() {
                let Some(next) = next_significant_token(&line.first) else {
                    continue;
                };
                let extra = usize::from(next.kind() == SyntaxKind::RBrace);
                (depth(&next) + extra) * self.indent_size
            } else if is_structural(&line.first, anchor.as_ref()) {
                let width = depth(&line.first) * self.indent_size;
                if let Some(anchor) = &anchor {
                    if first_significant_token(&anchor.clone().into()).as_ref() == Some(&line.first) {
                        deltas.insert(
                            anchor.text_range().start(),
                            width as isize - current_width as isize,
                        );
                    }
                }
                width
            } else {
                let delta = anchor
                    .as_ref()
                    .and_then(|a| deltas.get(&a.text_range().start()))
                    .copied()
                    .unwrap_or(0);
                (current_width as isize + delta).max(0) as usize
            };

            let target = self.render(target_width);
            if target == current {
                continue;
            }
            let splice = match &line.indent {
                Some(indent) if target.is_empty() => Splice::delete(indent.text_range()),
                Some(indent) => Splice::new(
                    indent.text_range(),
                    Replacement::elements(vec![make::whitespace(&target)]),
                ),
                None => Splice::insert(start, Replacement::elements(vec![make::whitespace(&target)])),
            };
            edit.push(splice);
        }
        Ok(edit)
    }

    /// Columns taken by an indentation string
    fn width(&self, indent: &str) -> usize {
        indent
            .chars()
            .map(|c| if c == '\t' { self.indent_size } else { 1 })
            .sum()
    }

    fn render(&self, width: usize) -> String {
        match self.indent_style {
            IndentStyle::Spaces => " ".repeat(width),
            IndentStyle::Tabs => {
                let mut out = "\t".repeat(width / self.indent_size);
                out.push_str(&" ".repeat(width % self.indent_size));
                out
            }
        }
    }
}

/// Non-blank lines, skipping directive lines and the end of the document
fn lines(root: &SyntaxNode) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut at_line_start = true;
    let mut indent: Option<SyntaxToken> = None;

    for token in root.descendants_with_tokens().filter_map(|e| e.into_token()) {
        let kind = token.kind();
        if at_line_start {
            match kind {
                SyntaxKind::Whitespace if indent.is_none() => {
                    indent = Some(token);
                    continue;
                }
                SyntaxKind::Newline => {
                    indent = None;
                    continue;
                }
                _ => {
                    at_line_start = false;
                    if kind != SyntaxKind::EndOfFile && !kind.is_directive() {
                        lines.push(Line {
                            indent: indent.take(),
                            first: token.clone(),
                        });
                    }
                    indent = None;
                }
            }
        }
        if kind == SyntaxKind::Newline {
            at_line_start = true;
        }
    }
    lines
}

fn is_anchor(kind: SyntaxKind) -> bool {
    kind.is_statement()
        || kind.is_member_declaration()
        || matches!(
            kind,
            SyntaxKind::UsingDirective
                | SyntaxKind::CaseSwitchLabel
                | SyntaxKind::DefaultSwitchLabel
                | SyntaxKind::ElseClause
                | SyntaxKind::CatchClause
                | SyntaxKind::FinallyClause
                | SyntaxKind::AccessorDeclaration
        )
}

/// Innermost statement-like node holding `token`
fn anchor_of(token: &SyntaxToken) -> Option<SyntaxNode> {
    token.parent_ancestors().find(|n| is_anchor(n.kind()))
}

fn is_structural(token: &SyntaxToken, anchor: Option<&SyntaxNode>) -> bool {
    if matches!(token.kind(), SyntaxKind::LBrace | SyntaxKind::RBrace) {
        return true;
    }
    anchor.is_some_and(|a| first_significant_token(&a.clone().into()).as_ref() == Some(token))
}

fn has_braced_body(kind: SyntaxKind) -> bool {
    kind.is_type_declaration()
        || matches!(
            kind,
            SyntaxKind::Block
                | SyntaxKind::SwitchStatement
                | SyntaxKind::NamespaceDeclaration
                | SyntaxKind::AccessorList
                | SyntaxKind::InitializerExpression
        )
}

fn is_embedding_statement(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IfStatement
            | SyntaxKind::ElseClause
            | SyntaxKind::WhileStatement
            | SyntaxKind::DoStatement
            | SyntaxKind::ForStatement
            | SyntaxKind::ForEachStatement
            | SyntaxKind::UsingStatement
    )
}

/// Whether `token` lies strictly between the direct braces of `node`
fn inside_braces(node: &SyntaxNode, token: &SyntaxToken) -> bool {
    let braces: Vec<SyntaxToken> = node
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| matches!(t.kind(), SyntaxKind::LBrace | SyntaxKind::RBrace))
        .collect();
    let Some(open) = braces.iter().find(|t| t.kind() == SyntaxKind::LBrace) else {
        return false;
    };
    let start = token.text_range().start();
    if start < open.text_range().end() {
        return false;
    }
    match braces.iter().rev().find(|t| t.kind() == SyntaxKind::RBrace) {
        Some(close) if close.text_range().start() > open.text_range().start() => {
            start < close.text_range().start()
        }
        _ => true,
    }
}

/// Structural nesting depth of the line starting with `token`
fn depth(token: &SyntaxToken) -> usize {
    let mut depth = 0;
    for node in token.parent_ancestors() {
        let kind = node.kind();
        if has_braced_body(kind) && inside_braces(&node, token) {
            depth += 1;
        }
        if kind == SyntaxKind::SwitchSection {
            let in_label = token.parent_ancestors().any(|n| {
                matches!(
                    n.kind(),
                    SyntaxKind::CaseSwitchLabel | SyntaxKind::DefaultSwitchLabel
                ) && n.parent().as_ref() == Some(&node)
            });
            if !in_label {
                depth += 1;
            }
        }
        if kind.is_statement() && kind != SyntaxKind::Block {
            let embedded = node.parent().is_some_and(|parent| {
                is_embedding_statement(parent.kind())
                    && !(kind == SyntaxKind::IfStatement && parent.kind() == SyntaxKind::ElseClause)
            });
            if embedded {
                depth += 1;
            }
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_all(source: &str, config: &FormatterConfiguration) -> String {
        let tree = SyntaxTree::parse(source);
        let range = TextRange::up_to(tree.len());
        Formatter::new(config)
            .format_annotated(&tree, &[range], &CancellationToken::new())
            .expect("format")
            .text()
    }

    #[test]
    fn test_reindents_statements_and_braces() {
        let source = "class C\n{\nvoid M()\n{\n  if (a)\n  {\n  M();\n  }\n}\n}\n";
        let formatted = format_all(source, &FormatterConfiguration::default());
        assert_eq!(
            formatted,
            "class C\n{\n    void M()\n    {\n        if (a)\n        {\n            M();\n        }\n    }\n}\n"
        );
    }

    #[test]
    fn test_switch_sections_and_embedded_statements() {
        let source = "class C {\nvoid M(int x) {\nswitch (x) {\ncase 1:\nM();\nbreak;\ndefault:\nif (x > 2)\nreturn;\nelse if (x < 0)\nthrow null;\nbreak;\n}\n}\n}\n";
        let formatted = format_all(source, &FormatterConfiguration::default());
        insta::assert_snapshot!(formatted, @r"
        class C {
            void M(int x) {
                switch (x) {
                    case 1:
                        M();
                        break;
                    default:
                        if (x > 2)
                            return;
                        else if (x < 0)
                            throw null;
                        break;
                }
            }
        }
        ");
    }

    #[test]
    fn test_continuation_lines_follow_their_statement() {
        let source = "class C\n{\n    void M()\n    {\n            Call(a,\n                 b);\n    }\n}\n";
        let formatted = format_all(source, &FormatterConfiguration::default());
        assert_eq!(
            formatted,
            "class C\n{\n    void M()\n    {\n        Call(a,\n             b);\n    }\n}\n"
        );
    }

    #[test]
    fn test_only_annotated_lines_change() {
        let source = "class C\n{\nint a;\nint b;\n}\n";
        let tree = SyntaxTree::parse(source);
        let start = source.find("int b").expect("b") as u32;
        let range = TextRange::new(start.into(), (start + 6).into());
        let formatted = Formatter::default()
            .format_annotated(&tree, &[range], &CancellationToken::new())
            .expect("format");
        assert_eq!(formatted.text(), "class C\n{\nint a;\n    int b;\n}\n");
    }

    #[test]
    fn test_comment_lines_and_directives() {
        let source = "class C\n{\nvoid M()\n{\nM();\n// done\n#if DEBUG\nM();\n#endif\n}\n}\n";
        let formatted = format_all(source, &FormatterConfiguration::default());
        assert_eq!(
            formatted,
            "class C\n{\n    void M()\n    {\n        M();\n        // done\n#if DEBUG\n        M();\n#endif\n    }\n}\n"
        );
    }

    #[test]
    fn test_tabs_and_idempotence() {
        let config = FormatterConfiguration {
            indent_style: Some(IndentStyle::Tabs),
            indent_size: Some(4),
        };
        let source = "enum E\n{\n  A,\n        B\n}\n";
        let once = format_all(source, &config);
        assert_eq!(once, "enum E\n{\n\tA,\n\tB\n}\n");
        assert_eq!(format_all(&once, &config), once);
    }

    #[test]
    fn test_unchanged_tree_is_returned_as_is() {
        let tree = SyntaxTree::parse("class C\n{\n    int a;\n}\n");
        let range = TextRange::up_to(tree.len());
        let formatted = Formatter::default()
            .format_annotated(&tree, &[range], &CancellationToken::new())
            .expect("format");
        assert_eq!(formatted.id(), tree.id());
    }

    #[test]
    fn test_cancellation_stops_the_pass() {
        let tree = SyntaxTree::parse("class C\n{\nint a;\n}\n");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result =
            Formatter::default().format_annotated(&tree, &[TextRange::up_to(tree.len())], &cancel);
        assert!(matches!(result, Err(crate::PatchworkError::Cancelled)));
    }
}
