//! RCS0061: add or remove the blank line between switch sections
//!
//! Style option `blank_line_between_switch_sections`:
//!
//! - `include` (default): every section is followed by a blank line
//! - `omit`: no blank lines between sections
//! - `omit_after_block`: no blank line after a section ending with a block,
//!   a blank line after every other section
//!
//! Separators carrying comments or directives are left alone.

use std::str::FromStr;

use patchwork_core::cst::ast::{AstNode, Block, SwitchSection, SwitchStatement};
use patchwork_core::cst::make;
use patchwork_core::trivia::{TriviaBlock, TriviaKind, classify_between};
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, DiagnosticProperties,
    EquivalenceKey, FixContext, FixProviderRegistration, RegistryBuilder, Replacement, Result,
    Severity, SyntaxKind, SyntaxNode,
};
use rowan::NodeOrToken;

pub const ID: &str = "RCS0061";

/// Configuration key of the style option
pub const OPTION: &str = "blank_line_between_switch_sections";

/// Property: `add` or `remove`
pub const BLANK_LINE: &str = "BlankLine";
pub const ADD: &str = "add";
pub const REMOVE: &str = "remove";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Add/remove blank line between switch sections",
    "{0} blank line between switch sections",
    "Formatting",
    Severity::Info,
)
.disabled_by_default();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlankLineStyle {
    #[default]
    Include,
    Omit,
    OmitAfterBlock,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown blank line style '{0}', expected include, omit or omit_after_block")]
pub struct UnknownStyle(String);

impl FromStr for BlankLineStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "include" => Ok(Self::Include),
            "omit" => Ok(Self::Omit),
            "omit_after_block" => Ok(Self::OmitAfterBlock),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}

impl BlankLineStyle {
    fn wants_blank_line_after(self, section: &SwitchSection) -> bool {
        match self {
            Self::Include => true,
            Self::Omit => false,
            Self::OmitAfterBlock => !ends_with_block(section),
        }
    }
}

fn ends_with_block(section: &SwitchSection) -> bool {
    section.statements().last().and_then(Block::cast).is_some()
}

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            vec![SyntaxKind::SwitchStatement],
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

/// Separator between two adjacent sections, if it may be rewritten
fn separator(previous: &SwitchSection, next: &SwitchSection) -> Option<TriviaBlock> {
    classify_between(
        &NodeOrToken::Node(previous.syntax().clone()),
        &NodeOrToken::Node(next.syntax().clone()),
    )
    .filter(|t| t.is_fixable() && t.kind != TriviaKind::NoNewLine)
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let Some(switch) = SwitchStatement::cast(node.clone()) else {
        return;
    };
    let style: BlankLineStyle = ctx.options().parse_or(OPTION, BlankLineStyle::default());
    let sections: Vec<SwitchSection> = switch.sections().collect();

    for pair in sections.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        let Some(trivia) = separator(previous, next) else {
            continue;
        };
        let Some(label) = next.labels().next() else {
            continue;
        };
        let wanted = style.wants_blank_line_after(previous);
        let (action, message) = match (wanted, trivia.kind) {
            (true, TriviaKind::SingleNewLine) => (ADD, "Add"),
            (false, TriviaKind::BlankLine) => (REMOVE, "Remove"),
            _ => continue,
        };
        ctx.report_with(
            &DESCRIPTOR,
            label.text_range(),
            &[message],
            DiagnosticProperties::new().with(BLANK_LINE, action),
        );
    }
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(next) = ctx
        .node()
        .and_then(|n| n.ancestors().find_map(SwitchSection::cast))
    else {
        return Ok(Vec::new());
    };
    let Some(previous) = next.syntax().prev_sibling().and_then(SwitchSection::cast) else {
        return Ok(Vec::new());
    };
    let Some(trivia) = separator(&previous, &next) else {
        return Ok(Vec::new());
    };

    let mut editor = ctx.editor();
    let title = match ctx.property(BLANK_LINE) {
        Some(ADD) => {
            let Some(offset) = trivia.blank_line_insertion_point() else {
                return Ok(Vec::new());
            };
            editor.insert_at(
                offset,
                Replacement::elements(vec![make::newline(trivia.line_break_text())]),
            )?;
            "Add blank line"
        }
        Some(REMOVE) => {
            let Some(range) = trivia.blank_lines_range() else {
                return Ok(Vec::new());
            };
            editor.delete_range(range)?;
            "Remove blank line"
        }
        _ => return Ok(Vec::new()),
    };
    Ok(vec![CodeAction::fix(title, EquivalenceKey::new(ID), editor.finish())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::registry;
    use crate::builtin::testing::{diagnostics, fix as apply_fix, options_with};
    use patchwork_core::{AnalyzerOptions, CancellationToken, SyntaxTree};

    fn switch(sections: &str) -> String {
        format!(
            "class C\n{{\n    void M(int k)\n    {{\n        switch (k)\n        {{\n{sections}        }}\n    }}\n}}\n"
        )
    }

    const TIGHT: &str = concat!(
        "            case 1:\n",
        "                break;\n",
        "            case 2:\n",
        "                {\n",
        "                    break;\n",
        "                }\n",
        "            default:\n",
        "                break;\n",
    );

    const SPACED: &str = concat!(
        "            case 1:\n",
        "                break;\n",
        "\n",
        "            case 2:\n",
        "                {\n",
        "                    break;\n",
        "                }\n",
        "\n",
        "            default:\n",
        "                break;\n",
    );

    #[test]
    fn test_disabled_unless_configured() {
        assert!(diagnostics(&switch(TIGHT), ID, &AnalyzerOptions::default()).is_empty());
    }

    #[test]
    fn test_include_adds_blank_lines() {
        let options = options_with(&[ID], &[]);
        let found = diagnostics(&switch(TIGHT), ID, &options);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].message, "Add blank line between switch sections");
        assert_eq!(found[0].property(BLANK_LINE), Some(ADD));

        let outcome = registry()
            .fix_all(
                &SyntaxTree::parse(&switch(TIGHT)),
                ID,
                &EquivalenceKey::new(ID),
                &options,
                &CancellationToken::new(),
            )
            .expect("fix all");
        assert_eq!(outcome.tree.text(), switch(SPACED));
        assert!(diagnostics(&outcome.tree.text(), ID, &options).is_empty());
    }

    #[test]
    fn test_omit_removes_blank_lines() {
        let options = options_with(&[ID], &[(OPTION, "omit")]);
        let found = diagnostics(&switch(SPACED), ID, &options);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].property(BLANK_LINE), Some(REMOVE));

        let fixed = apply_fix(&switch(SPACED), ID, ID, &options);
        assert!(fixed.contains("                break;\n            case 2:\n"));
    }

    #[test]
    fn test_omit_after_block() {
        let options = options_with(&[ID], &[(OPTION, "omit_after_block")]);
        let found = diagnostics(&switch(SPACED), ID, &options);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].property(BLANK_LINE), Some(REMOVE));

        let fixed = apply_fix(&switch(SPACED), ID, ID, &options);
        assert_eq!(
            fixed,
            switch(concat!(
                "            case 1:\n",
                "                break;\n",
                "\n",
                "            case 2:\n",
                "                {\n",
                "                    break;\n",
                "                }\n",
                "            default:\n",
                "                break;\n",
            ))
        );
        assert!(diagnostics(&fixed, ID, &options).is_empty());
    }

    #[test]
    fn test_comment_between_sections_is_left_alone() {
        let sections = concat!(
            "            case 1:\n",
            "                break;\n",
            "            // next\n",
            "            case 2:\n",
            "                break;\n",
        );
        let options = options_with(&[ID], &[]);
        assert!(diagnostics(&switch(sections), ID, &options).is_empty());
    }

    #[test]
    fn test_unknown_style_falls_back_to_include() {
        let options = options_with(&[ID], &[(OPTION, "sometimes")]);
        assert_eq!(diagnostics(&switch(TIGHT), ID, &options).len(), 2);
        assert!("sometimes".parse::<BlankLineStyle>().is_err());
    }
}
