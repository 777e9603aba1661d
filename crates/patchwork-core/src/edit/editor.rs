use rowan::{GreenNode, GreenToken, NodeOrToken, TextRange, TextSize};

use super::{Annotation, AnnotationKind, Replacement, Splice, TreeEdit};
use crate::cst::{GreenElement, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree, make};
use crate::directives::{unbalanced_directives_in, unbalanced_directives_of};
use crate::error::EditError;
use crate::trivia::{
    first_significant_token, full_range, last_significant_token, line_indentation,
    prev_significant_token, tokens_in_range, trailing_range, trailing_trivia,
};

/// What happens to the trivia around a removed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Remove the node with its leading and trailing trivia
    #[default]
    KeepNoTrivia,
    /// Keep the leading trivia, remove the trailing trivia
    KeepLeadingTrivia,
    /// Keep the trailing trivia, remove the leading trivia
    KeepTrailingTrivia,
    /// Remove the span only
    KeepExteriorTrivia,
    /// Remove everything, but write back the directive lines of the exterior
    /// trivia whose partner lives elsewhere
    KeepUnbalancedDirectives,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

/// Collects the splices of one fix against one tree
///
/// Every operation checks that its node belongs to the editor's tree and that
/// it would not orphan a preprocessor directive. Removals also refuse to drop
/// comments from the trivia they take away. A refused operation leaves the
/// splices collected so far untouched.
#[derive(Debug, Clone)]
pub struct SyntaxEditor {
    tree: SyntaxTree,
    edit: TreeEdit,
}

impl SyntaxEditor {
    pub fn new(tree: &SyntaxTree) -> Self {
        Self {
            tree: tree.clone(),
            edit: TreeEdit::new(tree.id()),
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.edit.is_empty()
    }

    pub fn finish(self) -> TreeEdit {
        self.edit
    }

    fn check_node(&self, node: &SyntaxNode) -> Result<(), EditError> {
        if self.tree.owns(node) {
            Ok(())
        } else {
            Err(EditError::StaleTree {
                expected: self.tree.id(),
                found: None,
            })
        }
    }

    fn check_token(&self, token: &SyntaxToken) -> Result<(), EditError> {
        if self.tree.owns_token(token) {
            Ok(())
        } else {
            Err(EditError::StaleTree {
                expected: self.tree.id(),
                found: None,
            })
        }
    }

    fn check_node_balance(&self, node: &SyntaxNode) -> Result<(), EditError> {
        match unbalanced_directives_of(node).len() {
            0 => Ok(()),
            count => Err(unbalanced(full_range(node), count)),
        }
    }

    fn check_range_balance(&self, range: TextRange) -> Result<(), EditError> {
        match unbalanced_directives_in(&self.tree.root(), range).len() {
            0 => Ok(()),
            count => Err(unbalanced(range, count)),
        }
    }

    /// Comments in `removed` outside the node's own `span` would be lost
    fn check_exterior_comments(&self, removed: TextRange, span: TextRange) -> Result<(), EditError> {
        let count = tokens_in_range(&self.tree.root(), removed)
            .filter(|t| t.kind().is_comment())
            .filter(|t| removed.contains_range(t.text_range()) && !span.contains_range(t.text_range()))
            .count();
        if count == 0 {
            return Ok(());
        }
        tracing::debug!("Refusing removal at {removed:?}: {count} comment(s) in its trivia");
        Err(EditError::CommentTrivia {
            range: removed,
            count,
        })
    }

    /// Line break used by the document, `\n` when it has none
    fn line_break(&self) -> String {
        self.tree
            .root()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::Newline)
            .map(|t| t.text().to_string())
            .unwrap_or_else(|| "\n".to_string())
    }

    fn push(&mut self, range: TextRange, target_kind: Option<SyntaxKind>, replacement: Replacement) {
        self.edit.push(Splice {
            range,
            target_kind,
            replacement,
        });
    }

    /// Replace the span of `node`; its exterior trivia stay in place
    pub fn replace_node(&mut self, node: &SyntaxNode, replacement: Replacement) -> Result<(), EditError> {
        self.check_node(node)?;
        self.check_node_balance(node)?;
        self.push(node.text_range(), Some(node.kind()), replacement);
        Ok(())
    }

    /// Replace `node` by existing elements of the same tree, e.g. the
    /// statements of a block being unwrapped
    pub fn replace_node_with_elements(
        &mut self,
        node: &SyntaxNode,
        elements: impl IntoIterator<Item = SyntaxElement>,
    ) -> Result<(), EditError> {
        let mut green = Vec::new();
        for element in elements {
            match &element {
                NodeOrToken::Node(n) => self.check_node(n)?,
                NodeOrToken::Token(t) => self.check_token(t)?,
            }
            green.push(make::element_of(&element));
        }
        self.replace_node(node, Replacement::elements(green).formatted())
    }

    pub fn replace_token(&mut self, token: &SyntaxToken, new: GreenToken) -> Result<(), EditError> {
        self.check_token(token)?;
        if token.kind().is_directive() {
            return Err(unbalanced(token.text_range(), 1));
        }
        self.push(
            token.text_range(),
            None,
            Replacement::elements(vec![NodeOrToken::Token(new)]),
        );
        Ok(())
    }

    pub fn remove_node(&mut self, node: &SyntaxNode, policy: RemovalPolicy) -> Result<(), EditError> {
        self.check_node(node)?;
        let span = node.text_range();
        let full = full_range(node);

        if policy == RemovalPolicy::KeepUnbalancedDirectives {
            self.check_range_balance(span)?;
            self.check_exterior_comments(full, span)?;
            let replacement = self.kept_directives(full);
            self.push(full, Some(node.kind()), replacement);
            return Ok(());
        }

        self.check_node_balance(node)?;
        let range = match policy {
            RemovalPolicy::KeepNoTrivia => full,
            RemovalPolicy::KeepLeadingTrivia => TextRange::new(span.start(), full.end()),
            RemovalPolicy::KeepTrailingTrivia => TextRange::new(full.start(), span.end()),
            RemovalPolicy::KeepExteriorTrivia | RemovalPolicy::KeepUnbalancedDirectives => span,
        };
        self.check_exterior_comments(range, span)?;
        self.push(range, Some(node.kind()), Replacement::empty());
        Ok(())
    }

    /// Each unbalanced directive of `range` on a line of its own
    fn kept_directives(&self, range: TextRange) -> Replacement {
        let line_break = self.line_break();
        let mut elements: Vec<GreenElement> = Vec::new();
        for directive in unbalanced_directives_in(&self.tree.root(), range) {
            elements.push(NodeOrToken::Token(directive.green().to_owned()));
            elements.push(make::newline(&line_break));
        }
        Replacement::elements(elements)
    }

    /// Remove a type member together with the blank lines that would be left
    /// right after the opening brace
    pub fn remove_member(&mut self, member: &SyntaxNode) -> Result<(), EditError> {
        self.check_node(member)?;
        self.check_node_balance(member)?;
        let full = full_range(member);

        let follows_open_brace = first_significant_token(&NodeOrToken::Node(member.clone()))
            .and_then(|t| prev_significant_token(&t))
            .is_some_and(|t| t.kind() == SyntaxKind::LBrace);

        let mut end = full.end();
        if follows_open_brace {
            let mut cursor = last_significant_token(&NodeOrToken::Node(member.clone()))
                .and_then(|last| trailing_trivia(&last).last().cloned())
                .and_then(|t| t.next_token());
            while let Some(token) = cursor {
                match token.kind() {
                    SyntaxKind::Newline => end = token.text_range().end(),
                    SyntaxKind::Whitespace => {}
                    _ => break,
                }
                cursor = token.next_token();
            }
        }

        let range = TextRange::new(full.start(), end);
        self.check_exterior_comments(range, member.text_range())?;
        self.push(range, Some(member.kind()), Replacement::empty());
        Ok(())
    }

    /// Put `replacement` right before `anchor`, on the same line
    pub fn insert_before(&mut self, anchor: &SyntaxNode, replacement: Replacement) -> Result<(), EditError> {
        self.check_node(anchor)?;
        let mut replacement = replacement;
        replacement
            .elements
            .push(NodeOrToken::Node(anchor.green().into_owned()));
        self.push(anchor.text_range(), Some(anchor.kind()), replacement);
        Ok(())
    }

    /// Put `replacement` right after `anchor`, on the same line
    pub fn insert_after(&mut self, anchor: &SyntaxNode, replacement: Replacement) -> Result<(), EditError> {
        self.check_node(anchor)?;
        let shift = anchor.text_range().len();
        let mut elements = vec![NodeOrToken::Node(anchor.green().into_owned())];
        elements.extend(replacement.elements);
        let annotations = replacement
            .annotations
            .into_iter()
            .map(|a| Annotation {
                kind: a.kind,
                range: a.range + shift,
            })
            .collect();
        self.push(
            anchor.text_range(),
            Some(anchor.kind()),
            Replacement {
                elements,
                annotations,
            },
        );
        Ok(())
    }

    /// Insert statements on lines of their own next to `anchor`, indented
    /// like it and marked for the formatter
    pub fn insert_statements(
        &mut self,
        anchor: &SyntaxNode,
        statements: Vec<GreenNode>,
        position: InsertPosition,
    ) -> Result<(), EditError> {
        self.check_node(anchor)?;
        if statements.is_empty() {
            return Ok(());
        }
        let anchor_element = NodeOrToken::Node(anchor.clone());
        let (Some(first), Some(last)) = (
            first_significant_token(&anchor_element),
            last_significant_token(&anchor_element),
        ) else {
            return Err(EditError::InvalidReplacement {
                message: "anchor has no tokens".to_string(),
            });
        };

        let line_break = self.line_break();
        // Not first on its line: keep the anchor's line and separate by a space
        let (separator, indent) = match line_indentation(&first) {
            Some(indent) => (line_break, indent),
            None => (" ".to_string(), String::new()),
        };
        let on_own_line = separator != " ";

        let mut builder = LineBuilder::default();
        match position {
            InsertPosition::Before => {
                for statement in statements {
                    builder.statement(statement);
                    builder.trivia(separator_element(&separator));
                    builder.indent(&indent);
                }
                self.push(
                    TextRange::empty(anchor.text_range().start()),
                    None,
                    builder.finish(),
                );
            }
            InsertPosition::After => {
                let ends_line = trailing_trivia(&last)
                    .last()
                    .is_some_and(|t| t.kind() == SyntaxKind::Newline);
                if on_own_line && ends_line {
                    for statement in statements {
                        builder.indent(&indent);
                        builder.statement(statement);
                        builder.trivia(separator_element(&separator));
                    }
                    self.push(TextRange::empty(trailing_range(&last).end()), None, builder.finish());
                } else {
                    for statement in statements {
                        builder.trivia(separator_element(&separator));
                        builder.indent(&indent);
                        builder.statement(statement);
                    }
                    self.insert_after(anchor, builder.finish())?;
                }
            }
        }
        Ok(())
    }

    /// Insert at a position between tokens; used for trivia such as blank
    /// lines
    pub fn insert_at(&mut self, offset: TextSize, replacement: Replacement) -> Result<(), EditError> {
        if offset > self.tree.len() {
            return Err(EditError::Misaligned {
                range: TextRange::empty(offset),
            });
        }
        self.push(TextRange::empty(offset), None, replacement);
        Ok(())
    }

    /// Delete a range made of trivia only
    pub fn delete_range(&mut self, range: TextRange) -> Result<(), EditError> {
        let root = self.tree.root();
        if !root.text_range().contains_range(range) {
            return Err(EditError::Misaligned { range });
        }
        let touches_code = tokens_in_range(&root, range)
            .filter(|t| t.text_range().intersect(range).is_some_and(|r| !r.is_empty()))
            .any(|t| !t.kind().is_trivia());
        if touches_code {
            return Err(EditError::InvalidReplacement {
                message: format!("range {range:?} is not trivia"),
            });
        }
        self.check_range_balance(range)?;
        self.push(range, None, Replacement::empty());
        Ok(())
    }
}

fn unbalanced(range: TextRange, count: usize) -> EditError {
    tracing::debug!("Refusing edit at {range:?}: {count} unbalanced directive(s)");
    EditError::UnbalancedDirectives { range, count }
}

fn separator_element(text: &str) -> GreenElement {
    if text.contains('\n') {
        make::newline(text)
    } else {
        make::whitespace(text)
    }
}

/// Accumulates inserted statements and the trivia between them, marking
/// each statement for the formatter
#[derive(Default)]
struct LineBuilder {
    elements: Vec<GreenElement>,
    annotations: Vec<Annotation>,
    len: TextSize,
}

impl LineBuilder {
    fn statement(&mut self, statement: GreenNode) {
        let range = TextRange::at(self.len, statement.text_len());
        self.annotations.push(Annotation {
            kind: AnnotationKind::Formatter,
            range,
        });
        self.len += statement.text_len();
        self.elements.push(NodeOrToken::Node(statement));
    }

    fn trivia(&mut self, element: GreenElement) {
        if let NodeOrToken::Token(token) = &element {
            self.len += token.text_len();
        }
        self.elements.push(element);
    }

    fn indent(&mut self, indent: &str) {
        if !indent.is_empty() {
            self.trivia(make::whitespace(indent));
        }
    }

    fn finish(self) -> Replacement {
        Replacement {
            elements: self.elements,
            annotations: self.annotations,
        }
    }
}
