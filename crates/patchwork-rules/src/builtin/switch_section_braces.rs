//! RCS1031: remove unnecessary braces in switch section
//!
//! A section whose only statement is a block can lose the braces when doing
//! so changes nothing but layout: the block declares no `using` local (its
//! dispose point would move to the end of the switch), none of its local
//! names is declared in a sibling section (the section blocks would merge
//! into one scope) and the braces carry no comments or directives.

use std::collections::HashSet;

use patchwork_core::cst::ast::{
    AstNode, Block, LocalDeclarationStatement, Parameter, SwitchSection, VariableDeclarator,
    token_of_kind,
};
use patchwork_core::cst::make;
use patchwork_core::trivia::{
    classify_between, classify_tokens, first_significant_token, last_significant_token,
};
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, EquivalenceKey,
    FixContext, FixProviderRegistration, Pool, RegistryBuilder, Replacement, Reset, Result,
    Severity, SyntaxKind, SyntaxNode,
};
use rowan::{NodeOrToken, TextRange};

pub const ID: &str = "RCS1031";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Remove unnecessary braces in switch section",
    "Remove unnecessary braces in switch section",
    "Redundancy",
    Severity::Hidden,
);

thread_local! {
    static WALKERS: Pool<LocalNameWalker> = Pool::new();
}

/// Collects the names of locals declared anywhere below a node
#[derive(Debug, Default)]
struct LocalNameWalker {
    names: HashSet<String>,
}

impl Reset for LocalNameWalker {
    fn reset(&mut self) {
        self.names.clear();
    }
}

impl LocalNameWalker {
    fn visit(&mut self, node: &SyntaxNode) {
        for descendant in node.descendants() {
            let name = match descendant.kind() {
                SyntaxKind::VariableDeclarator => {
                    VariableDeclarator::cast(descendant).and_then(|d| d.name())
                }
                SyntaxKind::Parameter => Parameter::cast(descendant).and_then(|p| p.name()),
                // foreach variable and catch variable are direct identifiers
                SyntaxKind::ForEachStatement | SyntaxKind::CatchDeclaration => {
                    token_of_kind(&descendant, SyntaxKind::Ident).map(|t| t.text().to_string())
                }
                _ => None,
            };
            if let Some(name) = name {
                self.names.insert(name);
            }
        }
    }

    fn overlaps(&self, other: &LocalNameWalker) -> bool {
        self.names.iter().any(|name| other.names.contains(name))
    }
}

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            vec![SyntaxKind::SwitchSection],
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let Some(section) = SwitchSection::cast(node.clone()) else {
        return;
    };
    let Some(block) = section.sole_block() else {
        return;
    };
    if !braces_are_removable(&block) {
        return;
    }
    if block
        .statements()
        .filter_map(LocalDeclarationStatement::cast)
        .any(|s| s.is_using())
    {
        return;
    }
    if collides_with_siblings(&section, &block) {
        return;
    }
    ctx.report(&DESCRIPTOR, block.syntax().text_range(), &[]);
}

/// The block has statements and nothing but plain whitespace inside its braces
fn braces_are_removable(block: &Block) -> bool {
    let (Some(open), Some(close)) = (block.open_brace(), block.close_brace()) else {
        return false;
    };
    let statements: Vec<SyntaxNode> = block.statements().collect();
    let (Some(first), Some(last)) = (statements.first(), statements.last()) else {
        return false;
    };
    let first = first_significant_token(&NodeOrToken::Node(first.clone()));
    let last = last_significant_token(&NodeOrToken::Node(last.clone()));
    let (Some(first), Some(last)) = (first, last) else {
        return false;
    };
    let after_open = classify_tokens(&open, &first);
    let before_close = classify_tokens(&last, &close);
    after_open.is_some_and(|t| t.is_fixable()) && before_close.is_some_and(|t| t.is_fixable())
}

fn collides_with_siblings(section: &SwitchSection, block: &Block) -> bool {
    let Some(switch) = section.syntax().parent() else {
        return true;
    };
    WALKERS.with(|pool| {
        let mut own = pool.checkout();
        own.visit(block.syntax());
        if own.names.is_empty() {
            return false;
        }
        let mut siblings = pool.checkout();
        for sibling in switch.children().filter_map(SwitchSection::cast) {
            if sibling != *section {
                siblings.visit(sibling.syntax());
            }
        }
        own.overlaps(&siblings)
    })
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(block) = ctx.node().and_then(Block::cast) else {
        return Ok(Vec::new());
    };
    let statements: Vec<SyntaxNode> = block.statements().collect();
    let (Some(first), Some(last)) = (statements.first(), statements.last()) else {
        return Ok(Vec::new());
    };
    let inner = TextRange::new(first.text_range().start(), last.text_range().end());
    let elements = block
        .syntax()
        .children_with_tokens()
        .filter(|e| inner.contains_range(e.text_range()));

    let mut editor = ctx.editor();
    editor.replace_node_with_elements(block.syntax(), elements)?;

    // Keep the next label off the unwrapped statements
    let next_section = block
        .syntax()
        .parent()
        .and_then(|section| section.next_sibling())
        .filter(|n| n.kind() == SyntaxKind::SwitchSection);
    if let Some(next) = next_section {
        let trivia = classify_between(
            &NodeOrToken::Node(block.syntax().clone()),
            &NodeOrToken::Node(next),
        );
        if let Some(trivia) = trivia.filter(|t| t.is_fixable()) {
            if let Some(offset) = trivia.blank_line_insertion_point() {
                editor.insert_at(
                    offset,
                    Replacement::elements(vec![make::newline(trivia.line_break_text())]),
                )?;
            }
        }
    }

    Ok(vec![CodeAction::fix(
        "Remove braces",
        EquivalenceKey::new(ID),
        editor.finish(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::{diagnostics, fix as apply_fix};
    use patchwork_core::AnalyzerOptions;

    fn method(body: &str) -> String {
        format!("class C\n{{\n    void M(int k)\n    {{\n{body}    }}\n}}\n")
    }

    #[test]
    fn test_unwraps_sole_block_and_separates_next_label() {
        let source = method(concat!(
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                {\n",
            "                    M(k);\n",
            "                    break;\n",
            "                }\n",
            "            case 2:\n",
            "                break;\n",
            "        }\n",
        ));
        let options = AnalyzerOptions::default();
        assert_eq!(diagnostics(&source, ID, &options).len(), 1);

        let fixed = apply_fix(&source, ID, ID, &options);
        assert_eq!(
            fixed,
            method(concat!(
                "        switch (k)\n",
                "        {\n",
                "            case 1:\n",
                "                M(k);\n",
                "                break;\n",
                "\n",
                "            case 2:\n",
                "                break;\n",
                "        }\n",
            ))
        );
        assert!(diagnostics(&fixed, ID, &options).is_empty());
    }

    #[test]
    fn test_using_declaration_keeps_braces() {
        let source = method(concat!(
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                {\n",
            "                    using IDisposable d = Open();\n",
            "                    break;\n",
            "                }\n",
            "        }\n",
        ));
        assert!(diagnostics(&source, ID, &AnalyzerOptions::default()).is_empty());
    }

    #[test]
    fn test_locals_shared_with_sibling_keep_braces() {
        let source = method(concat!(
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                {\n",
            "                    int x = 1;\n",
            "                    break;\n",
            "                }\n",
            "            case 2:\n",
            "                {\n",
            "                    int x = 2;\n",
            "                    break;\n",
            "                }\n",
            "        }\n",
        ));
        assert!(diagnostics(&source, ID, &AnalyzerOptions::default()).is_empty());
    }

    #[test]
    fn test_distinct_locals_allow_removal() {
        let source = method(concat!(
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                {\n",
            "                    int x = 1;\n",
            "                    break;\n",
            "                }\n",
            "            default:\n",
            "                {\n",
            "                    int y = 2;\n",
            "                    break;\n",
            "                }\n",
            "        }\n",
        ));
        assert_eq!(diagnostics(&source, ID, &AnalyzerOptions::default()).len(), 2);
    }

    #[test]
    fn test_comment_inside_braces_keeps_them() {
        let source = method(concat!(
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                { // keep\n",
            "                    break;\n",
            "                }\n",
            "        }\n",
        ));
        assert!(diagnostics(&source, ID, &AnalyzerOptions::default()).is_empty());
    }

    #[test]
    fn test_block_among_other_statements_is_ignored() {
        let source = method(concat!(
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                M(k);\n",
            "                {\n",
            "                    break;\n",
            "                }\n",
            "        }\n",
        ));
        assert!(diagnostics(&source, ID, &AnalyzerOptions::default()).is_empty());
    }

    #[test]
    fn test_walker_is_reset_between_checkouts() {
        let tree = patchwork_core::SyntaxTree::parse("class C { void M() { int a = 1; } }");
        WALKERS.with(|pool| {
            {
                let mut walker = pool.checkout();
                walker.visit(&tree.root());
                assert!(walker.names.contains("a"));
            }
            assert!(pool.checkout().names.is_empty());
        });
    }
}
