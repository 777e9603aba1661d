//! Rule registry and dispatcher
//!
//! Rules are registered once, through a [`RegistryBuilder`], from a
//! compiled-in table. [`RegistryBuilder::build`] freezes the table into a
//! [`RuleRegistry`] that is read-only from then on and can be shared across
//! threads behind an `Arc`.
//!
//! During analysis every node of a document is visited once, in document
//! order, and handed to the analyzers registered for its kind. A panicking
//! analyzer is isolated: its fault is recorded, it is skipped for the rest of
//! that document, and every other rule keeps running.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use rayon::prelude::*;
use rowan::{TextRange, WalkEvent};

use crate::Result;
use crate::cancel::CancellationToken;
use crate::config::AnalyzerOptions;
use crate::cst::{SyntaxKind, SyntaxNode, SyntaxTree};
use crate::diagnostics::{
    Diagnostic, DiagnosticDescriptor, DiagnosticProperties, LineIndex, Location,
};
use crate::edit::{SyntaxEditor, TreeEdit};
use crate::error::{ErrorKind, PatchworkError};
use crate::fix::{self, CodeAction, EquivalenceKey};
use crate::locator::{FindOptions, find_node};
use crate::semantic::SemanticModel;
use crate::workspace::Workspace;

/// Analyzer callback, invoked once per node of a registered kind
pub type AnalyzerFn = fn(&AnalysisContext<'_>, &SyntaxNode);

/// Fix provider callback; an empty list means "no fix for this occurrence"
pub type FixProviderFn = fn(&FixContext<'_>) -> Result<Vec<CodeAction>>;

/// Refactoring callback, invoked for a caret position or selection
pub type RefactoringFn = fn(&RefactoringContext<'_>) -> Result<Vec<CodeAction>>;

#[derive(Debug, Clone)]
pub struct AnalyzerRegistration {
    /// Descriptors this analyzer may report; the first one names the rule
    pub descriptors: Vec<&'static DiagnosticDescriptor>,
    pub kinds: Vec<SyntaxKind>,
    pub callback: AnalyzerFn,
}

impl AnalyzerRegistration {
    pub fn new(
        descriptors: Vec<&'static DiagnosticDescriptor>,
        kinds: Vec<SyntaxKind>,
        callback: AnalyzerFn,
    ) -> Self {
        Self {
            descriptors,
            kinds,
            callback,
        }
    }

    pub fn rule_id(&self) -> &'static str {
        self.descriptors.first().map_or("<unnamed>", |d| d.id)
    }

    fn supports(&self, id: &str) -> bool {
        self.descriptors.iter().any(|d| d.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct FixProviderRegistration {
    pub diagnostic_ids: Vec<&'static str>,
    pub callback: FixProviderFn,
}

impl FixProviderRegistration {
    pub fn new(diagnostic_ids: Vec<&'static str>, callback: FixProviderFn) -> Self {
        Self {
            diagnostic_ids,
            callback,
        }
    }

    pub fn fixes(&self, diagnostic_id: &str) -> bool {
        self.diagnostic_ids.contains(&diagnostic_id)
    }
}

#[derive(Debug, Clone)]
pub struct RefactoringRegistration {
    pub id: &'static str,
    pub title: &'static str,
    pub callback: RefactoringFn,
}

impl RefactoringRegistration {
    pub fn new(id: &'static str, title: &'static str, callback: RefactoringFn) -> Self {
        Self {
            id,
            title,
            callback,
        }
    }
}

/// Collects registrations before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    analyzers: Vec<AnalyzerRegistration>,
    fix_providers: Vec<FixProviderRegistration>,
    refactorings: Vec<RefactoringRegistration>,
    ids: HashSet<&'static str>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an analyzer; every descriptor id must be new
    pub fn register_analyzer(&mut self, registration: AnalyzerRegistration) -> Result<&mut Self> {
        if registration.descriptors.is_empty() {
            return Err(PatchworkError::rule_error(
                "<unnamed>",
                "analyzer registered without descriptors",
            ));
        }
        for descriptor in &registration.descriptors {
            self.claim(descriptor.id)?;
        }
        tracing::debug!(
            "Registered analyzer '{}' for {:?}",
            registration.rule_id(),
            registration.kinds
        );
        self.analyzers.push(registration);
        Ok(self)
    }

    /// Register a fix provider; several providers may fix the same id
    pub fn register_fix_provider(&mut self, registration: FixProviderRegistration) -> Result<&mut Self> {
        tracing::debug!("Registered fix provider for {:?}", registration.diagnostic_ids);
        self.fix_providers.push(registration);
        Ok(self)
    }

    pub fn register_refactoring(&mut self, registration: RefactoringRegistration) -> Result<&mut Self> {
        self.claim(registration.id)?;
        tracing::debug!("Registered refactoring '{}'", registration.id);
        self.refactorings.push(registration);
        Ok(self)
    }

    fn claim(&mut self, id: &'static str) -> Result<()> {
        if !self.ids.insert(id) {
            return Err(PatchworkError::rule_error(id, "id is already registered"));
        }
        Ok(())
    }

    /// Freeze the registrations
    ///
    /// Fails when a fix provider names a diagnostic no analyzer reports.
    pub fn build(self) -> Result<RuleRegistry> {
        let mut descriptors = IndexMap::new();
        let mut by_kind: HashMap<SyntaxKind, Vec<usize>> = HashMap::new();
        for (index, analyzer) in self.analyzers.iter().enumerate() {
            for descriptor in &analyzer.descriptors {
                descriptors.insert(descriptor.id, *descriptor);
            }
            for kind in &analyzer.kinds {
                by_kind.entry(*kind).or_default().push(index);
            }
        }

        let mut by_diagnostic: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for (index, provider) in self.fix_providers.iter().enumerate() {
            for id in &provider.diagnostic_ids {
                if !descriptors.contains_key(id) {
                    return Err(PatchworkError::rule_error(
                        *id,
                        "fix provider registered for an unknown diagnostic",
                    ));
                }
                by_diagnostic.entry(*id).or_default().push(index);
            }
        }

        tracing::debug!(
            "Registry built: {} analyzer(s), {} fix provider(s), {} refactoring(s)",
            self.analyzers.len(),
            self.fix_providers.len(),
            self.refactorings.len()
        );
        Ok(RuleRegistry {
            analyzers: self.analyzers,
            fix_providers: self.fix_providers,
            refactorings: self.refactorings,
            descriptors,
            by_kind,
            by_diagnostic,
        })
    }
}

/// Outcome of analyzing one document
#[derive(Debug)]
pub struct AnalysisReport {
    pub diagnostics: Vec<Diagnostic>,
    /// One `RuleFault` per rule that panicked
    pub faults: Vec<PatchworkError>,
}

impl AnalysisReport {
    pub fn of_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.id == id)
    }
}

/// Outcome of a fix-all batch
#[derive(Debug, Clone)]
pub struct FixAllOutcome {
    pub tree: SyntaxTree,
    /// Occurrences the chosen variant was applied to
    pub fixed: usize,
    /// Occurrences that did not offer the chosen variant
    pub skipped: usize,
}

/// Frozen rule table
#[derive(Debug)]
pub struct RuleRegistry {
    analyzers: Vec<AnalyzerRegistration>,
    fix_providers: Vec<FixProviderRegistration>,
    refactorings: Vec<RefactoringRegistration>,
    descriptors: IndexMap<&'static str, &'static DiagnosticDescriptor>,
    by_kind: HashMap<SyntaxKind, Vec<usize>>,
    by_diagnostic: HashMap<&'static str, Vec<usize>>,
}

impl RuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// A registry without rules
    pub fn empty() -> Self {
        Self {
            analyzers: Vec::new(),
            fix_providers: Vec::new(),
            refactorings: Vec::new(),
            descriptors: IndexMap::new(),
            by_kind: HashMap::new(),
            by_diagnostic: HashMap::new(),
        }
    }

    pub fn descriptor(&self, id: &str) -> Option<&'static DiagnosticDescriptor> {
        self.descriptors.get(id).copied()
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &'static DiagnosticDescriptor> + '_ {
        self.descriptors.values().copied()
    }

    pub fn analyzers(&self) -> &[AnalyzerRegistration] {
        &self.analyzers
    }

    pub fn refactoring_registrations(&self) -> &[RefactoringRegistration] {
        &self.refactorings
    }

    /// Run every enabled analyzer over `document`
    pub fn analyze(
        &self,
        document: &SyntaxTree,
        options: &AnalyzerOptions,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport> {
        self.analyze_in(&DocumentContext::new(document, options), cancel)
    }

    fn analyze_in(&self, context: &DocumentContext<'_>, cancel: &CancellationToken) -> Result<AnalysisReport> {
        let options = context.options();
        let enabled: Vec<bool> = self
            .analyzers
            .iter()
            .map(|a| a.descriptors.iter().any(|d| options.is_enabled(d)))
            .collect();
        let mut faulted = vec![false; self.analyzers.len()];
        let mut faults = Vec::new();
        let sink = RefCell::new(Vec::new());

        for event in context.root.preorder() {
            let WalkEvent::Enter(node) = event else {
                continue;
            };
            cancel.check()?;
            let Some(indices) = self.by_kind.get(&node.kind()) else {
                continue;
            };
            for &index in indices {
                if !enabled[index] || faulted[index] {
                    continue;
                }
                let analyzer = &self.analyzers[index];
                let analysis = AnalysisContext {
                    document: context,
                    analyzer,
                    sink: &sink,
                };
                let reported = sink.borrow().len();
                let outcome = catch_unwind(AssertUnwindSafe(|| (analyzer.callback)(&analysis, &node)));
                if let Err(payload) = outcome {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(
                        "Analyzer '{}' faulted at {:?}: {}",
                        analyzer.rule_id(),
                        node.text_range(),
                        message
                    );
                    sink.borrow_mut().truncate(reported);
                    faulted[index] = true;
                    faults.push(PatchworkError::rule_fault(analyzer.rule_id(), message));
                }
            }
        }

        let mut diagnostics = sink.into_inner();
        diagnostics.sort_by(|a, b| {
            (a.range().start(), a.range().end(), &a.id).cmp(&(b.range().start(), b.range().end(), &b.id))
        });
        tracing::debug!(
            "Analyzed {}: {} diagnostic(s), {} fault(s)",
            context.tree().id(),
            diagnostics.len(),
            faults.len()
        );
        Ok(AnalysisReport {
            diagnostics,
            faults,
        })
    }

    /// Fix providers registered for a diagnostic's id
    pub fn dispatch(&self, diagnostic: &Diagnostic) -> Vec<&FixProviderRegistration> {
        self.by_diagnostic
            .get(diagnostic.id.as_str())
            .map(|indices| indices.iter().map(|&i| &self.fix_providers[i]).collect())
            .unwrap_or_default()
    }

    /// Every fix offered for `diagnostic`, one action per variant
    ///
    /// A diagnostic reported against another tree is rejected, as is a set of
    /// actions in which two share an equivalence key.
    pub fn code_fixes(
        &self,
        document: &SyntaxTree,
        diagnostic: &Diagnostic,
        options: &AnalyzerOptions,
    ) -> Result<Vec<CodeAction>> {
        if diagnostic.tree_id() != document.id() {
            return Err(PatchworkError::StaleDiagnostic {
                diagnostic_id: diagnostic.id.clone(),
                reported: diagnostic.tree_id(),
                current: document.id(),
            });
        }

        self.fixes_in(&DocumentContext::new(document, options), diagnostic)
    }

    fn fixes_in(&self, context: &DocumentContext<'_>, diagnostic: &Diagnostic) -> Result<Vec<CodeAction>> {
        let fix_context = FixContext {
            document: context,
            diagnostic,
        };
        let mut actions = Vec::new();
        for provider in self.dispatch(diagnostic) {
            let offered = guarded(&diagnostic.id, || (provider.callback)(&fix_context));
            actions.extend(skip_refused(&diagnostic.id, offered)?);
        }

        let mut keys = HashSet::new();
        for action in &actions {
            if !keys.insert(&action.equivalence_key) {
                return Err(PatchworkError::rule_error(
                    diagnostic.id.clone(),
                    format!("equivalence key '{}' offered twice", action.equivalence_key),
                ));
            }
        }
        Ok(actions)
    }

    /// Refactorings available at `range`
    ///
    /// Refactorings are optional; a failing one is logged and left out.
    pub fn refactorings(
        &self,
        document: &SyntaxTree,
        range: TextRange,
        options: &AnalyzerOptions,
    ) -> Vec<CodeAction> {
        let context = DocumentContext::new(document, options);
        let refactoring_context = RefactoringContext {
            document: &context,
            range,
        };
        let mut actions = Vec::new();
        for refactoring in &self.refactorings {
            let offered = guarded(refactoring.id, || (refactoring.callback)(&refactoring_context));
            match skip_refused(refactoring.id, offered) {
                Ok(offered) => actions.extend(offered),
                Err(err) => tracing::warn!("Refactoring '{}' failed: {}", refactoring.id, err),
            }
        }
        actions
    }

    /// Apply one fix variant to every occurrence of a diagnostic at once
    ///
    /// The chosen variant's edits are merged and applied in a single pass;
    /// overlapping occurrences fail the whole batch.
    pub fn fix_all(
        &self,
        document: &SyntaxTree,
        diagnostic_id: &str,
        equivalence_key: &EquivalenceKey,
        options: &AnalyzerOptions,
        cancel: &CancellationToken,
    ) -> Result<FixAllOutcome> {
        // One context for the analysis and every occurrence's fixes
        let context = DocumentContext::new(document, options);
        let report = self.analyze_in(&context, cancel)?;
        let mut edits: Vec<TreeEdit> = Vec::new();
        let mut skipped = 0;
        for diagnostic in report.of_id(diagnostic_id) {
            cancel.check()?;
            let chosen = self
                .fixes_in(&context, diagnostic)?
                .into_iter()
                .find(|action| &action.equivalence_key == equivalence_key);
            match chosen {
                Some(action) => edits.push(action.edit),
                None => skipped += 1,
            }
        }

        let fixed = edits.len();
        let Some(merged) = TreeEdit::merge(edits)? else {
            return Ok(FixAllOutcome {
                tree: document.clone(),
                fixed,
                skipped,
            });
        };
        tracing::debug!(
            "Fix all '{}': {} occurrence(s), {} skipped",
            equivalence_key,
            fixed,
            skipped
        );
        let title = format!("Fix all '{equivalence_key}'");
        let applied = fix::apply_edit(&title, &merged, document, options, cancel)?;
        Ok(FixAllOutcome {
            tree: applied.tree,
            fixed,
            skipped,
        })
    }

    /// Analyze every open document in parallel, results sorted by path
    pub fn analyze_workspace(
        &self,
        workspace: &Workspace,
        options: &AnalyzerOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<(PathBuf, AnalysisReport)>> {
        workspace
            .documents()
            .par_iter()
            .map(|document| {
                let report = self.analyze(&document.tree, options, cancel)?;
                Ok((document.path.clone(), report))
            })
            .collect()
    }
}

/// Run a fix or refactoring callback, turning a panic into a `RuleFault`
fn guarded<T>(rule_id: &str, callback: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("Rule '{}' faulted: {}", rule_id, message);
            Err(PatchworkError::rule_fault(rule_id, message))
        }
    }
}

/// Refused edits and faults mean "no action"; other errors propagate
fn skip_refused(rule_id: &str, offered: Result<Vec<CodeAction>>) -> Result<Vec<CodeAction>> {
    match offered {
        Ok(actions) => Ok(actions),
        Err(err) if matches!(err.kind(), ErrorKind::Edit | ErrorKind::Fault) => {
            tracing::debug!("Skipped action of '{}': {}", rule_id, err);
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Per-document state shared by the callbacks of one run
///
/// The red tree, line index and semantic model are built at most once per
/// run and only when a callback asks for them.
pub struct DocumentContext<'a> {
    tree: &'a SyntaxTree,
    root: SyntaxNode,
    options: &'a AnalyzerOptions,
    line_index: OnceCell<LineIndex>,
    semantic_model: OnceCell<SemanticModel>,
}

impl<'a> DocumentContext<'a> {
    pub fn new(tree: &'a SyntaxTree, options: &'a AnalyzerOptions) -> Self {
        Self {
            tree,
            root: tree.root(),
            options,
            line_index: OnceCell::new(),
            semantic_model: OnceCell::new(),
        }
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn options(&self) -> &'a AnalyzerOptions {
        self.options
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.tree.text()))
    }

    pub fn semantic_model(&self) -> &SemanticModel {
        self.semantic_model.get_or_init(|| {
            SemanticModel::with_root(self.tree, self.root.clone(), self.options.catalog())
        })
    }

    pub fn editor(&self) -> SyntaxEditor {
        SyntaxEditor::new(self.tree)
    }

    #[cfg(test)]
    fn has_semantic_model(&self) -> bool {
        self.semantic_model.get().is_some()
    }
}

/// What an analyzer callback sees
pub struct AnalysisContext<'a> {
    document: &'a DocumentContext<'a>,
    analyzer: &'a AnalyzerRegistration,
    sink: &'a RefCell<Vec<Diagnostic>>,
}

impl<'a> std::ops::Deref for AnalysisContext<'a> {
    type Target = DocumentContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.document
    }
}

impl AnalysisContext<'_> {
    pub fn report(&self, descriptor: &DiagnosticDescriptor, range: TextRange, args: &[&str]) {
        self.report_with(descriptor, range, args, DiagnosticProperties::new());
    }

    /// Report a diagnostic carrying a property bag for the fix provider
    ///
    /// Dropped when the rule is switched off in configuration.
    pub fn report_with(
        &self,
        descriptor: &DiagnosticDescriptor,
        range: TextRange,
        args: &[&str],
        properties: DiagnosticProperties,
    ) {
        if !self.analyzer.supports(descriptor.id) {
            tracing::warn!(
                "Analyzer '{}' reported undeclared id '{}'",
                self.analyzer.rule_id(),
                descriptor.id
            );
            return;
        }
        let Some(severity) = self.options().rule_severity(descriptor) else {
            return;
        };
        let location = Location::new(self.tree(), range, self.line_index());
        let diagnostic = Diagnostic::new(descriptor, severity, descriptor.format_message(args), location)
            .with_properties(properties);
        self.sink.borrow_mut().push(diagnostic);
    }

    /// Whether `descriptor` would be reported under the current options
    pub fn is_enabled(&self, descriptor: &DiagnosticDescriptor) -> bool {
        self.options().is_enabled(descriptor)
    }
}

/// What a fix provider sees
pub struct FixContext<'a> {
    document: &'a DocumentContext<'a>,
    diagnostic: &'a Diagnostic,
}

impl<'a> std::ops::Deref for FixContext<'a> {
    type Target = DocumentContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.document
    }
}

impl FixContext<'_> {
    pub fn diagnostic(&self) -> &Diagnostic {
        self.diagnostic
    }

    /// The node the diagnostic was reported on
    pub fn node(&self) -> Option<SyntaxNode> {
        self.node_with(FindOptions::default())
    }

    pub fn node_with(&self, options: FindOptions) -> Option<SyntaxNode> {
        find_node(self.root(), self.diagnostic.range(), options)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.diagnostic.property(key)
    }
}

/// What a refactoring callback sees
pub struct RefactoringContext<'a> {
    document: &'a DocumentContext<'a>,
    range: TextRange,
}

impl<'a> std::ops::Deref for RefactoringContext<'a> {
    type Target = DocumentContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.document
    }
}

impl RefactoringContext<'_> {
    /// Caret position or selection
    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn node(&self) -> Option<SyntaxNode> {
        find_node(self.root(), self.range, FindOptions::default())
    }
}
