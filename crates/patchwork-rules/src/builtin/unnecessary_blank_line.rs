//! RCS0063: remove unnecessary blank line
//!
//! Blank lines right after an opening brace or right before a closing brace
//! of a block, type, namespace or switch body.

use patchwork_core::cst::ast::token_of_kind;
use patchwork_core::locator::{TokenBias, find_token};
use patchwork_core::trivia::{TriviaBlock, classify_tokens, next_significant_token, prev_significant_token};
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, EquivalenceKey,
    FixContext, FixProviderRegistration, RegistryBuilder, Result, Severity, SyntaxKind,
    SyntaxNode, SyntaxToken,
};

pub const ID: &str = "RCS0063";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Remove unnecessary blank line",
    "Remove unnecessary blank line",
    "Formatting",
    Severity::Info,
)
.disabled_by_default();

const BRACED: &[SyntaxKind] = &[
    SyntaxKind::Block,
    SyntaxKind::ClassDeclaration,
    SyntaxKind::StructDeclaration,
    SyntaxKind::InterfaceDeclaration,
    SyntaxKind::EnumDeclaration,
    SyntaxKind::NamespaceDeclaration,
    SyntaxKind::SwitchStatement,
];

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            BRACED.to_vec(),
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

fn last_close_brace(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == SyntaxKind::RBrace)
        .last()
}

/// Blank lines of a separator that holds nothing but whitespace
fn removable(trivia: Option<TriviaBlock>) -> Option<rowan::TextRange> {
    trivia.filter(|t| t.is_fixable())?.blank_lines_range()
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let (Some(open), Some(close)) = (
        token_of_kind(node, SyntaxKind::LBrace),
        last_close_brace(node),
    ) else {
        return;
    };
    let Some(first) = next_significant_token(&open) else {
        return;
    };

    // Empty body: one separator between the braces
    if first == close {
        if let Some(range) = removable(classify_tokens(&open, &close)) {
            ctx.report(&DESCRIPTOR, range, &[]);
        }
        return;
    }

    if let Some(range) = removable(classify_tokens(&open, &first)) {
        ctx.report(&DESCRIPTOR, range, &[]);
    }
    let Some(last) = prev_significant_token(&close) else {
        return;
    };
    if let Some(range) = removable(classify_tokens(&last, &close)) {
        ctx.report(&DESCRIPTOR, range, &[]);
    }
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let range = ctx.diagnostic().range();
    let Some(before) = find_token(ctx.root(), range.start(), TokenBias::Previous) else {
        return Ok(Vec::new());
    };
    let Some(after) = next_significant_token(&before) else {
        return Ok(Vec::new());
    };
    // The separator must still be the one that was reported
    if removable(classify_tokens(&before, &after)) != Some(range) {
        return Ok(Vec::new());
    }
    let mut editor = ctx.editor();
    editor.delete_range(range)?;
    Ok(vec![CodeAction::fix(
        "Remove blank line",
        EquivalenceKey::new(ID),
        editor.finish(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::registry;
    use crate::builtin::testing::{diagnostics, options_with};
    use patchwork_core::{AnalyzerOptions, CancellationToken, SyntaxTree};

    fn fix_all(source: &str) -> String {
        let options = options_with(&[ID], &[]);
        registry()
            .fix_all(
                &SyntaxTree::parse(source),
                ID,
                &EquivalenceKey::new(ID),
                &options,
                &CancellationToken::new(),
            )
            .expect("fix all")
            .tree
            .text()
    }

    #[test]
    fn test_blank_lines_inside_braces() {
        let source = "class C\n{\n\n    void M()\n    {\n\n        M();\n\n    }\n\n}\n";
        let options = options_with(&[ID], &[]);
        assert_eq!(diagnostics(source, ID, &options).len(), 4);

        let fixed = fix_all(source);
        assert_eq!(fixed, "class C\n{\n    void M()\n    {\n        M();\n    }\n}\n");
        assert!(diagnostics(&fixed, ID, &options).is_empty());
    }

    #[test]
    fn test_whitespace_only_lines_and_empty_bodies() {
        assert_eq!(
            fix_all("class C\n{\n    \n    void M()\n    {\n\n\n    }\n}\n"),
            "class C\n{\n    void M()\n    {\n    }\n}\n"
        );
    }

    #[test]
    fn test_blank_lines_between_members_are_kept() {
        let source = "class C\n{\n    int a;\n\n    int b;\n}\n";
        assert!(diagnostics(source, ID, &options_with(&[ID], &[])).is_empty());
    }

    #[test]
    fn test_comments_keep_the_separator() {
        let source = "class C\n{\n\n    // header\n    int a;\n}\n";
        assert!(diagnostics(source, ID, &options_with(&[ID], &[])).is_empty());
    }

    #[test]
    fn test_disabled_by_default() {
        let source = "class C\n{\n\n    int a;\n}\n";
        assert!(diagnostics(source, ID, &AnalyzerOptions::default()).is_empty());
    }
}
