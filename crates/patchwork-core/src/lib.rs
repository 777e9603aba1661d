//! Patchwork Core
//!
//! Trivia-aware structural patch engine. This crate provides lossless syntax
//! trees, node location from diagnostic spans, trivia classification,
//! directive-safe structural edits, the formatter pass applied after a fix,
//! and the registry that dispatches analyzers, fix providers and
//! refactorings.

pub mod cancel;
pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod directives;
pub mod edit;
pub mod error;
pub mod fix;
pub mod format;
pub mod locator;
pub mod pool;
pub mod registry;
pub mod result;
pub mod semantic;
pub mod trivia;
pub mod workspace;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use config::{
    AnalyzerOptions, ConfigLoader, FixConfiguration, FormatterConfiguration, IndentStyle,
    PatchworkConfig, RuleSeverity,
};
pub use cst::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree, TreeId};
pub use diagnostics::{
    Diagnostic, DiagnosticDescriptor, DiagnosticProperties, LineCol, LineIndex, Location, Severity,
};
pub use directives::{
    DirectiveKind, contains_directives, contains_unbalanced_directives, unbalanced_directives_of,
};
pub use edit::{
    Annotation, AnnotationKind, InsertPosition, RemovalPolicy, Replacement, Splice, SyntaxEditor,
    TreeEdit,
};
pub use error::{EditError, ErrorKind, PatchworkError};
pub use fix::{AppliedFix, CodeAction, CodeActionKind, EquivalenceKey};
pub use format::Formatter;
pub use locator::{FindOptions, TokenBias, find_ancestor, find_node, find_node_matching, find_token};
pub use pool::{Pool, Pooled, Reset};
pub use registry::{
    AnalysisContext, AnalysisReport, AnalyzerRegistration, FixAllOutcome, FixContext,
    FixProviderRegistration, RefactoringContext, RefactoringRegistration, RegistryBuilder,
    RuleRegistry,
};
pub use result::{Result, ResultExt};
pub use semantic::{
    ConstantValue, ReferenceCatalog, ReferenceMethod, ReferenceType, SemanticModel, Symbol,
    SymbolKind,
};
pub use trivia::{TriviaBlock, TriviaKind};
pub use workspace::{Document, Workspace};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("patchwork=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
