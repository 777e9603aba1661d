//! Diagnostic types
//!
//! A diagnostic's id is the only link between an analyzer and the fix
//! providers that handle it. Small facts the analyzer already computed travel
//! to the fix in the diagnostic's [`DiagnosticProperties`], under keys each
//! rule documents as constants.

use std::fmt;

use indexmap::IndexMap;
use rowan::{TextRange, TextSize};
use serde::{Deserialize, Serialize};

use crate::config::RuleSeverity;
use crate::cst::{SyntaxTree, TreeId};

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported to tooling only; offers its fix without being shown
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Severity chosen by configuration; `None` when the rule is switched off
    pub fn from_rule_severity(severity: RuleSeverity) -> Option<Self> {
        match severity {
            RuleSeverity::Off => None,
            RuleSeverity::Info => Some(Severity::Info),
            RuleSeverity::Warn => Some(Severity::Warning),
            RuleSeverity::Error => Some(Severity::Error),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Hidden => "hidden",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Static description of one diagnostic id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticDescriptor {
    /// Stable id such as `RCS1031`; never reused for another rule
    pub id: &'static str,
    pub title: &'static str,
    /// Message with `{0}`, `{1}`, ... placeholders
    pub message_format: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
}

impl DiagnosticDescriptor {
    pub const fn new(
        id: &'static str,
        title: &'static str,
        message_format: &'static str,
        category: &'static str,
        default_severity: Severity,
    ) -> Self {
        Self {
            id,
            title,
            message_format,
            category,
            default_severity,
            enabled_by_default: true,
        }
    }

    pub const fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    /// Fill the `{n}` placeholders of the message format
    pub fn format_message(&self, args: &[&str]) -> String {
        let mut message = self.message_format.to_string();
        for (index, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{index}}}"), arg);
        }
        message
    }
}

/// Ordered string map passed from an analyzer to its fix providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticProperties(IndexMap<String, String>);

impl DiagnosticProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Where a diagnostic was reported: a range of one specific tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub tree_id: TreeId,
    pub range: TextRange,
    /// 1-based
    pub line: usize,
    /// 1-based, in bytes
    pub column: usize,
}

impl Location {
    pub fn new(tree: &SyntaxTree, range: TextRange, index: &LineIndex) -> Self {
        let position = index.line_col(range.start());
        Self {
            tree_id: tree.id(),
            range,
            line: position.line,
            column: position.column,
        }
    }
}

/// A reported diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    pub properties: DiagnosticProperties,
}

impl Diagnostic {
    pub fn new(
        descriptor: &DiagnosticDescriptor,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            id: descriptor.id.to_string(),
            severity,
            message: message.into(),
            location,
            properties: DiagnosticProperties::new(),
        }
    }

    pub fn with_properties(mut self, properties: DiagnosticProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn range(&self) -> TextRange {
        self.location.range
    }

    pub fn tree_id(&self) -> TreeId {
        self.location.tree_id
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}: {}",
            self.location.line, self.location.column, self.severity, self.id, self.message
        )
    }
}

/// 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

/// Offsets of line starts, for offset to line/column conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset`; offsets past the end clamp to the end
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let column = u32::from(offset - self.line_starts[line]) as usize;
        LineCol {
            line: line + 1,
            column: column + 1,
        }
    }

    /// Offset of a 1-based position, if it lies inside the text
    pub fn offset(&self, position: LineCol) -> Option<TextSize> {
        let start = *self.line_starts.get(position.line.checked_sub(1)?)?;
        let offset = start + TextSize::from(u32::try_from(position.column.checked_sub(1)?).ok()?);
        (offset <= self.len).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
        "RCS9999",
        "Test rule",
        "Remove '{0}' from '{1}'",
        "Style",
        Severity::Info,
    );

    #[test]
    fn test_format_message() {
        assert_eq!(DESCRIPTOR.format_message(&["x", "y"]), "Remove 'x' from 'y'");
        assert!(DESCRIPTOR.enabled_by_default);
        assert!(!DESCRIPTOR.disabled_by_default().enabled_by_default);
    }

    #[test]
    fn test_severity_from_configuration() {
        assert_eq!(Severity::from_rule_severity(RuleSeverity::Off), None);
        assert_eq!(
            Severity::from_rule_severity(RuleSeverity::Warn),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn test_properties_keep_insertion_order() {
        let properties = DiagnosticProperties::new()
            .with("Zeta", "1")
            .with("Alpha", "2");
        let keys: Vec<_> = properties.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
        assert_eq!(properties.get("Alpha"), Some("2"));
        assert!(!properties.contains_key("Beta"));
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\r\ncd\n\nef");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_col(0.into()), LineCol { line: 1, column: 1 });
        assert_eq!(index.line_col(5.into()), LineCol { line: 2, column: 2 });
        assert_eq!(index.line_col(7.into()), LineCol { line: 3, column: 1 });
        assert_eq!(index.line_col(100.into()), LineCol { line: 4, column: 3 });
        assert_eq!(index.offset(LineCol { line: 2, column: 2 }), Some(5.into()));
        assert_eq!(index.offset(LineCol { line: 9, column: 1 }), None);
    }

    #[test]
    fn test_display() {
        let tree = SyntaxTree::parse("class C { }");
        let index = LineIndex::new(&tree.text());
        let range = TextRange::new(6.into(), 7.into());
        let diagnostic = Diagnostic::new(
            &DESCRIPTOR,
            Severity::Warning,
            "message",
            Location::new(&tree, range, &index),
        );
        assert_eq!(diagnostic.to_string(), "1:7: warning RCS9999: message");
        assert_eq!(diagnostic.tree_id(), tree.id());
    }
}
