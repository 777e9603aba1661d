//! Code actions: fixes and refactorings
//!
//! A [`CodeAction`] is a titled [`TreeEdit`] plus an [`EquivalenceKey`].
//! Applying it runs the splices, re-indents what the splices marked for the
//! formatter and, unless disabled in configuration, refuses results that
//! parse worse than the input.

use std::fmt;

use rowan::TextRange;
use similar::TextDiff;

use crate::Result;
use crate::cancel::CancellationToken;
use crate::config::AnalyzerOptions;
use crate::cst::SyntaxTree;
use crate::edit::TreeEdit;
use crate::error::PatchworkError;
use crate::format::Formatter;

/// Identifies a fix variant across occurrences, for fix-all
///
/// Either a bare rule id (`RCS1234`) or a rule id with a variant suffix
/// (`RCS1234.UseMember`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EquivalenceKey(String);

impl EquivalenceKey {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn with_variant(id: &str, variant: &str) -> Self {
        Self(format!("{id}.{variant}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The rule id part
    pub fn id(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(id, _)| id)
    }

    pub fn variant(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, variant)| variant)
    }
}

impl fmt::Display for EquivalenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EquivalenceKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeActionKind {
    /// Resolves a diagnostic
    Fix,
    /// Offered at a location without a diagnostic
    Refactoring,
}

/// A titled, not yet applied edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    pub title: String,
    pub equivalence_key: EquivalenceKey,
    pub kind: CodeActionKind,
    pub edit: TreeEdit,
}

/// The document after a code action
#[derive(Debug, Clone)]
pub struct AppliedFix {
    pub tree: SyntaxTree,
    /// Identifier the action introduced, for an editor to start renaming
    pub rename_target: Option<TextRange>,
}

impl CodeAction {
    pub fn fix(title: impl Into<String>, equivalence_key: EquivalenceKey, edit: TreeEdit) -> Self {
        Self {
            title: title.into(),
            equivalence_key,
            kind: CodeActionKind::Fix,
            edit,
        }
    }

    pub fn refactoring(
        title: impl Into<String>,
        equivalence_key: EquivalenceKey,
        edit: TreeEdit,
    ) -> Self {
        Self {
            title: title.into(),
            equivalence_key,
            kind: CodeActionKind::Refactoring,
            edit,
        }
    }

    pub fn apply(&self, document: &SyntaxTree, options: &AnalyzerOptions) -> Result<AppliedFix> {
        self.apply_with_cancel(document, options, &CancellationToken::new())
    }

    pub fn apply_with_cancel(
        &self,
        document: &SyntaxTree,
        options: &AnalyzerOptions,
        cancel: &CancellationToken,
    ) -> Result<AppliedFix> {
        apply_edit(&self.title, &self.edit, document, options, cancel)
    }

    /// Unified diff between the document and the action's result
    pub fn preview(&self, document: &SyntaxTree, options: &AnalyzerOptions) -> Result<String> {
        let applied = self.apply(document, options)?;
        Ok(unified_diff(&document.text(), &applied.tree.text()))
    }
}

/// Apply an edit, re-indent its formatter annotations and validate the result
pub(crate) fn apply_edit(
    title: &str,
    edit: &TreeEdit,
    document: &SyntaxTree,
    options: &AnalyzerOptions,
    cancel: &CancellationToken,
) -> Result<AppliedFix> {
    let outcome = edit.apply(document)?;
    let rename_target = outcome.rename_target();

    let formatter = Formatter::new(&options.formatter());
    let indent = formatter.indent_edit(&outcome.tree, &outcome.formatter_ranges(), cancel)?;
    let (tree, rename_target) = if indent.is_empty() {
        (outcome.tree, rename_target)
    } else {
        let rename_target = rename_target.map(|range| indent.map_range(range));
        (indent.apply(&outcome.tree)?.tree, rename_target)
    };

    let errors = tree.reparse().errors().to_vec();
    if options.fixes().validate_syntax() && errors.len() > document.errors().len() {
        tracing::warn!(
            "Refusing fix '{}': {} syntax error(s) after, {} before",
            title,
            errors.len(),
            document.errors().len()
        );
        return Err(PatchworkError::InvalidFix {
            title: title.to_string(),
            message: format!(
                "{} syntax error(s) after the fix, {} before",
                errors.len(),
                document.errors().len()
            ),
        });
    }

    Ok(AppliedFix {
        tree: tree.with_errors(errors),
        rename_target,
    })
}

/// Unified diff of two document texts, three lines of context
pub fn unified_diff(original: &str, modified: &str) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header("original", "fixed")
        .to_string()
}
