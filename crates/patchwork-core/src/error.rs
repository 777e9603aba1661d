//! Error types and handling for patch engine operations
//!
//! Not-applicable outcomes (a node that cannot be found, a rule whose
//! preconditions do not hold) are modelled as `Option::None` throughout the
//! crate. The types here are reserved for contract violations and genuine
//! failures.

use std::path::PathBuf;

use rowan::TextRange;
use thiserror::Error;

use crate::cst::TreeId;

/// Failures raised by the structural edit builder.
///
/// An edit that fails never produces a partial tree: the input tree is left
/// untouched and the error is returned instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The target belongs to a different tree than the one being edited.
    /// `found` is known when a whole edit is applied to the wrong tree, not
    /// when a single foreign node is handed to an editor.
    #[error("edit targets a stale or foreign tree, the current tree is {expected}")]
    StaleTree {
        expected: TreeId,
        found: Option<TreeId>,
    },

    /// The edit would orphan one half of a conditional-compilation or region pair
    #[error("edit at {range:?} would orphan {count} preprocessor directive(s)")]
    UnbalancedDirectives { range: TextRange, count: usize },

    /// The removal would drop comments from the trivia around the node
    #[error("edit at {range:?} would delete {count} comment(s)")]
    CommentTrivia { range: TextRange, count: usize },

    /// Two splices of the same batch touch overlapping text
    #[error("overlapping edits at {first:?} and {second:?}")]
    OverlappingEdits { first: TextRange, second: TextRange },

    /// The splice range cuts through the middle of a token
    #[error("edit range {range:?} does not align with token boundaries")]
    Misaligned { range: TextRange },

    /// The requested replacement cannot be built (e.g. a snippet did not parse)
    #[error("invalid replacement: {message}")]
    InvalidReplacement { message: String },
}

/// Main error type for patchwork operations
#[derive(Debug, Error)]
pub enum PatchworkError {
    /// Source text could not be turned into a usable tree
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Rule registration or contract errors
    #[error("Rule error in '{rule_id}': {message}")]
    RuleError { rule_id: String, message: String },

    /// A rule callback panicked; isolated by the dispatcher
    #[error("Rule '{rule_id}' faulted: {message}")]
    RuleFault { rule_id: String, message: String },

    /// Structural edit failures
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    /// A diagnostic was produced against a tree that is no longer current
    #[error("Diagnostic '{diagnostic_id}' was reported against tree {reported}, document is at tree {current}")]
    StaleDiagnostic {
        diagnostic_id: String,
        reported: TreeId,
        current: TreeId,
    },

    /// A fix produced a document with more syntax errors than its input
    #[error("Fix '{title}' produced invalid code: {message}")]
    InvalidFix { title: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cooperative cancellation was requested
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Rule,
    Fault,
    Edit,
    Stale,
    Fix,
    Io,
    Cancelled,
    Internal,
}

impl PatchworkError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchworkError::ParseError { .. } => ErrorKind::Parse,
            PatchworkError::ConfigError { .. } => ErrorKind::Config,
            PatchworkError::RuleError { .. } => ErrorKind::Rule,
            PatchworkError::RuleFault { .. } => ErrorKind::Fault,
            PatchworkError::Edit(_) => ErrorKind::Edit,
            PatchworkError::StaleDiagnostic { .. } => ErrorKind::Stale,
            PatchworkError::InvalidFix { .. } => ErrorKind::Fix,
            PatchworkError::IoError { .. } => ErrorKind::Io,
            PatchworkError::Cancelled => ErrorKind::Cancelled,
            PatchworkError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (processing can continue with other
    /// rules or documents)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Parse | ErrorKind::Fault | ErrorKind::Edit | ErrorKind::Fix
        )
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleError {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create a rule fault
    pub fn rule_fault(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleFault {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PatchworkError::config_error("bad").kind(),
            ErrorKind::Config
        );
        assert_eq!(
            PatchworkError::rule_error("RCS1000", "dup").kind(),
            ErrorKind::Rule
        );
        assert_eq!(PatchworkError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_edit_error_converts() {
        let err: PatchworkError = EditError::Misaligned {
            range: TextRange::new(1.into(), 2.into()),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Edit);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_cancellation_is_not_recoverable() {
        assert!(!PatchworkError::Cancelled.is_recoverable());
        assert!(!PatchworkError::internal("boom").is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = PatchworkError::rule_error("RCS1031", "duplicate registration");
        assert_eq!(
            err.to_string(),
            "Rule error in 'RCS1031': duplicate registration"
        );
    }
}
