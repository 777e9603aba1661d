//! Structural edit builder
//!
//! Edits never mutate a tree. A [`SyntaxEditor`] collects splices against one
//! [`SyntaxTree`] into a [`TreeEdit`]; [`TreeEdit::apply`] checks the batch as
//! a whole and either returns a new tree or fails without producing anything.
//!
//! - Splices of one batch must target disjoint text. Overlap is an error,
//!   never "last wins".
//! - An edit built against one tree refuses to apply to any other tree,
//!   including newer versions of the same document.
//! - Replacement text carries [`Annotation`]s that survive application and
//!   tell the formatter which lines to re-indent and an editor which
//!   identifier to offer for renaming.

mod editor;
mod splice;

pub use editor::{InsertPosition, RemovalPolicy, SyntaxEditor};

use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};

use crate::cst::{GreenElement, SyntaxKind, SyntaxNode, SyntaxTree, TreeId};
use crate::error::EditError;

/// What a marker asks of later passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    /// Lines starting inside the range need re-indenting
    Formatter,
    /// A newly introduced identifier the user will want to rename
    RenameTarget,
}

/// A marked range, relative to its replacement before application and
/// absolute in the new tree afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub range: TextRange,
}

impl Annotation {
    pub fn formatter(range: TextRange) -> Self {
        Self {
            kind: AnnotationKind::Formatter,
            range,
        }
    }

    pub fn rename_target(range: TextRange) -> Self {
        Self {
            kind: AnnotationKind::RenameTarget,
            range,
        }
    }

    fn shifted(self, by: TextSize) -> Self {
        Self {
            kind: self.kind,
            range: self.range + by,
        }
    }
}

/// New content for a splice: green elements plus markers relative to their
/// text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacement {
    pub elements: Vec<GreenElement>,
    pub annotations: Vec<Annotation>,
}

impl Replacement {
    /// Nothing; the splice deletes its range
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node(node: GreenNode) -> Self {
        Self::elements(vec![NodeOrToken::Node(node)])
    }

    pub fn elements(elements: Vec<GreenElement>) -> Self {
        Self {
            elements,
            annotations: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn text_len(&self) -> TextSize {
        self.elements
            .iter()
            .map(|element| match element {
                NodeOrToken::Node(node) => node.text_len(),
                NodeOrToken::Token(token) => token.text_len(),
            })
            .sum()
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            match element {
                NodeOrToken::Node(node) => {
                    out.push_str(&SyntaxNode::new_root(node.clone()).text().to_string())
                }
                NodeOrToken::Token(token) => out.push_str(token.text()),
            }
        }
        out
    }

    /// Mark `range` (relative to this replacement's text)
    pub fn annotate(mut self, kind: AnnotationKind, range: TextRange) -> Self {
        self.annotations.push(Annotation { kind, range });
        self
    }

    /// Mark the whole replacement for re-indenting
    pub fn formatted(self) -> Self {
        let range = TextRange::up_to(self.text_len());
        self.annotate(AnnotationKind::Formatter, range)
    }
}

/// One contiguous change: the text of `range` becomes `replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: TextRange,
    /// Kind of the node being replaced, used to pick among nested nodes that
    /// share the same range
    pub target_kind: Option<SyntaxKind>,
    pub replacement: Replacement,
}

impl Splice {
    pub fn new(range: TextRange, replacement: Replacement) -> Self {
        Self {
            range,
            target_kind: None,
            replacement,
        }
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, Replacement::empty())
    }

    pub fn insert(offset: TextSize, replacement: Replacement) -> Self {
        Self::new(TextRange::empty(offset), replacement)
    }
}

/// A batch of splices against one tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEdit {
    tree_id: TreeId,
    splices: Vec<Splice>,
}

/// The tree an edit produced, with its annotations in the new coordinates
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub tree: SyntaxTree,
    pub annotations: Vec<Annotation>,
}

impl EditOutcome {
    pub fn formatter_ranges(&self) -> Vec<TextRange> {
        self.ranges_of(AnnotationKind::Formatter)
    }

    pub fn rename_target(&self) -> Option<TextRange> {
        self.ranges_of(AnnotationKind::RenameTarget).into_iter().next()
    }

    fn ranges_of(&self, kind: AnnotationKind) -> Vec<TextRange> {
        self.annotations
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.range)
            .collect()
    }
}

impl TreeEdit {
    pub fn new(tree_id: TreeId) -> Self {
        Self {
            tree_id,
            splices: Vec::new(),
        }
    }

    pub fn tree_id(&self) -> TreeId {
        self.tree_id
    }

    pub fn splices(&self) -> &[Splice] {
        &self.splices
    }

    pub fn len(&self) -> usize {
        self.splices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splices.is_empty()
    }

    pub fn push(&mut self, splice: Splice) {
        self.splices.push(splice);
    }

    /// Combine edits computed against the same tree
    ///
    /// Overlap between the merged splices is reported when the result is
    /// applied, not here.
    pub fn merge(edits: impl IntoIterator<Item = TreeEdit>) -> Result<Option<TreeEdit>, EditError> {
        let mut edits = edits.into_iter();
        let Some(mut merged) = edits.next() else {
            return Ok(None);
        };
        for edit in edits {
            if edit.tree_id != merged.tree_id {
                return Err(EditError::StaleTree {
                    expected: merged.tree_id,
                    found: Some(edit.tree_id),
                });
            }
            merged.splices.extend(edit.splices);
        }
        Ok(Some(merged))
    }

    /// Splices ordered by position, or the first overlapping pair
    ///
    /// Two insertions at the same offset overlap: their relative order would
    /// be arbitrary. An insertion at the boundary of a replaced range does not.
    fn ordered(&self) -> Result<Vec<&Splice>, EditError> {
        let mut ordered: Vec<&Splice> = self.splices.iter().collect();
        ordered.sort_by_key(|s| (s.range.start(), s.range.end()));
        for pair in ordered.windows(2) {
            let (first, second) = (pair[0].range, pair[1].range);
            let same_point = first.is_empty() && second.is_empty() && first.start() == second.start();
            if first.end() > second.start() || same_point {
                return Err(EditError::OverlappingEdits { first, second });
            }
        }
        Ok(ordered)
    }

    /// Check the batch without applying it
    pub fn validate(&self, tree: &SyntaxTree) -> Result<(), EditError> {
        if tree.id() != self.tree_id {
            return Err(EditError::StaleTree {
                expected: tree.id(),
                found: Some(self.tree_id),
            });
        }
        let len = tree.len();
        for splice in self.ordered()? {
            if splice.range.end() > len {
                return Err(EditError::Misaligned {
                    range: splice.range,
                });
            }
        }
        Ok(())
    }

    /// Where `range` of the input tree ends up once this edit is applied
    ///
    /// Only meaningful for ranges no splice touches.
    pub fn map_range(&self, range: TextRange) -> TextRange {
        let shift = |offset: TextSize| {
            let growth: i64 = self
                .splices
                .iter()
                .filter(|s| s.range.end() <= offset)
                .map(|s| {
                    i64::from(u32::from(s.replacement.text_len())) - i64::from(u32::from(s.range.len()))
                })
                .sum();
            let moved = (i64::from(u32::from(offset)) + growth).max(0);
            TextSize::from(u32::try_from(moved).unwrap_or(u32::MAX))
        };
        TextRange::new(shift(range.start()), shift(range.end()).max(shift(range.start())))
    }

    /// Apply every splice, last in the document first, and build the new tree
    pub fn apply(&self, tree: &SyntaxTree) -> Result<EditOutcome, EditError> {
        self.validate(tree)?;
        let ordered = self.ordered()?;

        let mut green = tree.green().clone();
        for splice in ordered.iter().rev() {
            green = splice::splice(
                &green,
                TextSize::from(0),
                splice.range,
                splice.target_kind,
                &splice.replacement.elements,
            )?;
        }

        // Each replacement lands where its range started, moved by the net
        // growth of everything spliced before it
        let mut annotations = Vec::new();
        let mut growth: i64 = 0;
        for splice in &ordered {
            let start = i64::from(u32::from(splice.range.start())) + growth;
            let start = u32::try_from(start).map_err(|_| EditError::Misaligned {
                range: splice.range,
            })?;
            annotations.extend(
                splice
                    .replacement
                    .annotations
                    .iter()
                    .map(|a| a.shifted(TextSize::from(start))),
            );
            growth += i64::from(u32::from(splice.replacement.text_len()))
                - i64::from(u32::from(splice.range.len()));
        }

        let new_tree = SyntaxTree::from_green(green);
        tracing::debug!(
            "Applied {} splice(s) to {}, produced {}",
            ordered.len(),
            tree.id(),
            new_tree.id()
        );
        Ok(EditOutcome {
            tree: new_tree,
            annotations,
        })
    }
}

/// Replace `old` with `new`, keeping the trivia around it
pub fn replace_node(
    tree: &SyntaxTree,
    old: &SyntaxNode,
    new: GreenNode,
) -> Result<EditOutcome, EditError> {
    let mut editor = SyntaxEditor::new(tree);
    editor.replace_node(old, Replacement::node(new).formatted())?;
    editor.finish().apply(tree)
}

/// Remove `node`, disposing of its trivia according to `policy`
pub fn remove_node(
    tree: &SyntaxTree,
    node: &SyntaxNode,
    policy: RemovalPolicy,
) -> Result<EditOutcome, EditError> {
    let mut editor = SyntaxEditor::new(tree);
    editor.remove_node(node, policy)?;
    editor.finish().apply(tree)
}

/// Insert statements on their own lines before or after `anchor`
pub fn insert_statements(
    tree: &SyntaxTree,
    anchor: &SyntaxNode,
    statements: Vec<GreenNode>,
    position: InsertPosition,
) -> Result<EditOutcome, EditError> {
    let mut editor = SyntaxEditor::new(tree);
    editor.insert_statements(anchor, statements, position)?;
    editor.finish().apply(tree)
}
