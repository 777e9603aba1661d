//! RCS1049: simplify boolean comparison

use patchwork_core::cst::ast::{AstNode, BinaryExpression, LiteralExpression, PrefixUnaryExpression};
use patchwork_core::cst::make;
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, DiagnosticProperties,
    EquivalenceKey, FixContext, FixProviderRegistration, RegistryBuilder, Replacement, Result,
    Severity, SyntaxKind, SyntaxNode,
};

pub const ID: &str = "RCS1049";

/// Property: `true` when the operand must be negated (`b == false`, `b != true`)
pub const INVERT: &str = "Invert";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Simplify boolean comparison",
    "Simplify boolean comparison",
    "Simplification",
    Severity::Info,
);

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            vec![SyntaxKind::BinaryExpression],
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

/// A comparison of a `bool` operand with a `true`/`false` literal
struct Comparison {
    operand: SyntaxNode,
    invert: bool,
}

fn match_comparison(binary: &BinaryExpression) -> Option<Comparison> {
    let equals = match binary.operator()? {
        SyntaxKind::EqEq => true,
        SyntaxKind::BangEq => false,
        _ => return None,
    };
    let (lhs, rhs) = (binary.lhs()?, binary.rhs()?);
    let (operand, literal) = match (bool_literal(&lhs), bool_literal(&rhs)) {
        (None, Some(literal)) => (lhs, literal),
        (Some(literal), None) => (rhs, literal),
        _ => return None,
    };
    Some(Comparison {
        operand,
        invert: equals != literal,
    })
}

fn bool_literal(node: &SyntaxNode) -> Option<bool> {
    match LiteralExpression::cast(node.clone())?.kind()? {
        SyntaxKind::TrueKw => Some(true),
        SyntaxKind::FalseKw => Some(false),
        _ => None,
    }
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let Some(comparison) = BinaryExpression::cast(node.clone()).and_then(|b| match_comparison(&b))
    else {
        return;
    };
    // `bool?` comparisons are three-valued and stay as written
    let operand_type = ctx.semantic_model().type_of_expression(&comparison.operand);
    if operand_type.as_deref() != Some("bool") {
        return;
    }
    ctx.report_with(
        &DESCRIPTOR,
        node.text_range(),
        &[],
        DiagnosticProperties::new().with(INVERT, comparison.invert.to_string()),
    );
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(binary) = ctx.node().and_then(BinaryExpression::cast) else {
        return Ok(Vec::new());
    };
    let Some(comparison) = match_comparison(&binary) else {
        return Ok(Vec::new());
    };
    let invert = ctx.property(INVERT).map_or(comparison.invert, |v| v == "true");

    let replacement = if invert {
        match negate(&comparison.operand) {
            Some(negated) => negated,
            None => return Ok(Vec::new()),
        }
    } else {
        Replacement::node(comparison.operand.green().into_owned())
    };

    let mut editor = ctx.editor();
    editor.replace_node(binary.syntax(), replacement)?;
    Ok(vec![CodeAction::fix(
        "Simplify boolean comparison",
        EquivalenceKey::new(ID),
        editor.finish(),
    )])
}

/// `!x` for a primary operand, `x` for `!x`, `!(x)` otherwise
fn negate(operand: &SyntaxNode) -> Option<Replacement> {
    if let Some(unary) = PrefixUnaryExpression::cast(operand.clone()) {
        if unary.operator() == Some(SyntaxKind::Bang) {
            let inner = unary.operand()?;
            return Some(Replacement::node(inner.green().into_owned()));
        }
    }
    let text = operand.text().to_string();
    let negated = if is_primary(operand.kind()) {
        format!("!{text}")
    } else {
        format!("!({text})")
    };
    make::expression(&negated).map(Replacement::node)
}

fn is_primary(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IdentifierName
            | SyntaxKind::LiteralExpression
            | SyntaxKind::ThisExpression
            | SyntaxKind::ParenthesizedExpression
            | SyntaxKind::MemberAccessExpression
            | SyntaxKind::InvocationExpression
            | SyntaxKind::ElementAccessExpression
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::{diagnostics, fix as apply_fix};
    use patchwork_core::AnalyzerOptions;

    fn method(condition: &str) -> String {
        format!(
            "class C\n{{\n    bool F;\n    bool Check() {{ return F; }}\n    void M(bool b, bool? n, int i)\n    {{\n        if ({condition}) {{ }}\n    }}\n}}\n"
        )
    }

    fn simplified(condition: &str) -> String {
        apply_fix(&method(condition), ID, ID, &AnalyzerOptions::default())
    }

    #[test]
    fn test_comparison_with_true_keeps_operand() {
        assert_eq!(simplified("b == true"), method("b"));
        assert_eq!(simplified("b != false"), method("b"));
        assert_eq!(simplified("true == F"), method("F"));
    }

    #[test]
    fn test_comparison_with_false_negates_operand() {
        assert_eq!(simplified("b == false"), method("!b"));
        assert_eq!(simplified("b != true"), method("!b"));
        assert_eq!(simplified("Check() == false"), method("!Check()"));
        assert_eq!(simplified("(b && F) == false"), method("!(b && F)"));
        assert_eq!(simplified("!b == false"), method("b"));
    }

    #[test]
    fn test_invert_property() {
        let options = AnalyzerOptions::default();
        let found = diagnostics(&method("b != true"), ID, &options);
        assert_eq!(found[0].property(INVERT), Some("true"));
        let found = diagnostics(&method("b == true"), ID, &options);
        assert_eq!(found[0].property(INVERT), Some("false"));
    }

    #[test]
    fn test_non_bool_operands_are_ignored() {
        let options = AnalyzerOptions::default();
        assert!(diagnostics(&method("n == true"), ID, &options).is_empty());
        assert!(diagnostics(&method("i == 1"), ID, &options).is_empty());
        assert!(diagnostics(&method("true == false"), ID, &options).is_empty());
        assert!(diagnostics(&method("Unknown == true"), ID, &options).is_empty());
    }

    #[test]
    fn test_simplified_code_is_not_reported_again() {
        let fixed = simplified("b == false");
        assert!(diagnostics(&fixed, ID, &AnalyzerOptions::default()).is_empty());
    }
}
