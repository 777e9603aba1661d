//! RCS1234: duplicate enum value
//!
//! Reported on every member whose explicit value equals the value of an
//! earlier member, unless the value already names another member (an
//! intentional alias). Two fixes are offered: reference the earlier member by
//! name, or move to the next free value.

use std::collections::HashSet;

use indexmap::IndexMap;
use patchwork_core::cst::ast::{AstNode, EnumDeclaration, EnumMemberDeclaration, ParenthesizedExpression};
use patchwork_core::cst::make;
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, DiagnosticProperties,
    EquivalenceKey, FixContext, FixProviderRegistration, RegistryBuilder, Replacement, Result,
    Severity, SyntaxKind, SyntaxNode,
};

pub const ID: &str = "RCS1234";

/// Property: name of the earlier member holding the same value
pub const EARLIER_MEMBER: &str = "EarlierMember";
/// Property: free value to move to; absent when moving would shift the
/// implicit value of the following member
pub const NEXT_VALUE: &str = "NextValue";

/// Fix variant referencing the earlier member
pub const USE_MEMBER: &str = "UseMember";
/// Fix variant assigning the free value
pub const USE_NEXT_VALUE: &str = "NextValue";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Duplicate enum value",
    "Enum member '{0}' has the same value as '{1}'",
    "Design",
    Severity::Info,
);

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            vec![SyntaxKind::EnumDeclaration],
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let Some(declaration) = EnumDeclaration::cast(node.clone()) else {
        return;
    };
    let model = ctx.semantic_model();
    let members: Vec<EnumMemberDeclaration> = declaration.members().collect();
    let values: Vec<Option<i64>> = members
        .iter()
        .map(|m| model.constant_value(m.syntax()).and_then(|v| v.as_int()))
        .collect();
    let flags = is_flags(&declaration);

    let mut used: HashSet<i64> = values.iter().flatten().copied().collect();
    let mut first_by_value: IndexMap<i64, String> = IndexMap::new();

    for (index, member) in members.iter().enumerate() {
        let (Some(value), Some(name)) = (values[index], member.name()) else {
            continue;
        };
        let Some(earlier) = first_by_value.get(&value) else {
            first_by_value.insert(value, name);
            continue;
        };
        let Some(expression) = member.value() else {
            continue;
        };
        if names_member(&expression) {
            continue;
        }

        let mut properties = DiagnosticProperties::new().with(EARLIER_MEMBER, earlier.as_str());
        let follower_is_explicit = members
            .get(index + 1)
            .is_none_or(|next| next.value().is_some());
        if follower_is_explicit {
            if let Some(next) = next_free_value(value, &used, flags) {
                used.insert(next);
                properties.insert(NEXT_VALUE, next.to_string());
            }
        }
        ctx.report_with(
            &DESCRIPTOR,
            member.syntax().text_range(),
            &[&name, earlier],
            properties,
        );
    }
}

/// `[Flags]` or `[FlagsAttribute]`
pub(crate) fn is_flags(declaration: &EnumDeclaration) -> bool {
    declaration
        .syntax()
        .children()
        .filter(|n| n.kind() == SyntaxKind::AttributeList)
        .flat_map(|list| list.descendants_with_tokens())
        .filter_map(|e| e.into_token())
        .any(|t| t.kind() == SyntaxKind::Ident && matches!(t.text(), "Flags" | "FlagsAttribute"))
}

fn names_member(expression: &SyntaxNode) -> bool {
    let mut current = expression.clone();
    while let Some(inner) = ParenthesizedExpression::cast(current.clone()).and_then(|p| p.expression()) {
        current = inner;
    }
    matches!(
        current.kind(),
        SyntaxKind::IdentifierName | SyntaxKind::MemberAccessExpression
    )
}

/// Smallest unused value above `value`; the next unused power of two for
/// flag enums
fn next_free_value(value: i64, used: &HashSet<i64>, flags: bool) -> Option<i64> {
    if flags {
        let mut candidate: i64 = 1;
        while candidate <= value || used.contains(&candidate) {
            candidate = candidate.checked_mul(2)?;
        }
        return Some(candidate);
    }
    let mut candidate = value.checked_add(1)?;
    while used.contains(&candidate) {
        candidate = candidate.checked_add(1)?;
    }
    Some(candidate)
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(value) = ctx
        .node()
        .and_then(EnumMemberDeclaration::cast)
        .and_then(|m| m.value())
    else {
        return Ok(Vec::new());
    };

    let mut actions = Vec::new();
    if let Some(earlier) = ctx.property(EARLIER_MEMBER) {
        if let Some(name) = make::identifier_name(earlier) {
            let mut editor = ctx.editor();
            editor.replace_node(&value, Replacement::node(name))?;
            actions.push(CodeAction::fix(
                format!("Use '{earlier}' as the value"),
                EquivalenceKey::with_variant(ID, USE_MEMBER),
                editor.finish(),
            ));
        }
    }
    if let Some(next) = ctx.property(NEXT_VALUE) {
        if let Some(literal) = make::expression(next) {
            let mut editor = ctx.editor();
            editor.replace_node(&value, Replacement::node(literal))?;
            actions.push(CodeAction::fix(
                format!("Change the value to {next}"),
                EquivalenceKey::with_variant(ID, USE_NEXT_VALUE),
                editor.finish(),
            ));
        }
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::registry;
    use crate::builtin::testing::{actions, diagnostics, fix as apply_fix};
    use patchwork_core::{AnalyzerOptions, CancellationToken, SyntaxTree};

    const USE_MEMBER_KEY: &str = "RCS1234.UseMember";
    const NEXT_VALUE_KEY: &str = "RCS1234.NextValue";

    #[test]
    fn test_later_member_references_earlier_one() {
        let source = "enum E\n{\n    A = 2,\n    B = 2,\n}\n";
        let options = AnalyzerOptions::default();
        let found = diagnostics(source, ID, &options);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Enum member 'B' has the same value as 'A'");
        assert_eq!(found[0].property(EARLIER_MEMBER), Some("A"));
        assert_eq!(found[0].property(NEXT_VALUE), Some("3"));

        assert_eq!(
            apply_fix(source, ID, USE_MEMBER_KEY, &options),
            "enum E\n{\n    A = 2,\n    B = A,\n}\n"
        );
        assert_eq!(
            apply_fix(source, ID, NEXT_VALUE_KEY, &options),
            "enum E\n{\n    A = 2,\n    B = 3,\n}\n"
        );
    }

    #[test]
    fn test_each_variant_has_its_own_key() {
        let (_, offered) = actions("enum E { A = 2, B = 2 }", ID, &AnalyzerOptions::default());
        let keys: Vec<_> = offered.iter().map(|a| a.equivalence_key.as_str()).collect();
        assert_eq!(keys, vec![USE_MEMBER_KEY, NEXT_VALUE_KEY]);
    }

    #[test]
    fn test_computed_values_are_compared() {
        let found = diagnostics("enum E { A = 1 << 1, B = 2, C = 3 - 1 }", ID, &AnalyzerOptions::default());
        let names: Vec<_> = found.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Enum member 'B' has the same value as 'A'",
                "Enum member 'C' has the same value as 'A'",
            ]
        );
    }

    #[test]
    fn test_aliases_and_implicit_values_are_not_reported() {
        let options = AnalyzerOptions::default();
        assert!(diagnostics("enum E { A = 1, B = A }", ID, &options).is_empty());
        assert!(diagnostics("enum E { A = 1, B = (A) }", ID, &options).is_empty());
        assert!(diagnostics("enum E { A = 1, B = 0, C }", ID, &options).is_empty());
    }

    #[test]
    fn test_no_next_value_when_follower_is_implicit() {
        let found = diagnostics("enum E { A = 1, B = 1, C }", ID, &AnalyzerOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].property(NEXT_VALUE), None);

        let (_, offered) = actions("enum E { A = 1, B = 1, C }", ID, &AnalyzerOptions::default());
        assert_eq!(offered.len(), 1);
        assert_eq!(offered[0].equivalence_key.as_str(), USE_MEMBER_KEY);
    }

    #[test]
    fn test_flags_move_to_next_power_of_two() {
        let found = diagnostics(
            "[Flags]\nenum F { A = 1, B = 2, C = 2 }",
            ID,
            &AnalyzerOptions::default(),
        );
        assert_eq!(found[0].property(NEXT_VALUE), Some("4"));
    }

    #[test]
    fn test_fix_all_assigns_distinct_values() {
        let tree = SyntaxTree::parse("enum E { A = 1, B = 1, C = 1 }");
        let outcome = registry()
            .fix_all(
                &tree,
                ID,
                &EquivalenceKey::from(NEXT_VALUE_KEY),
                &AnalyzerOptions::default(),
                &CancellationToken::new(),
            )
            .expect("fix all");
        assert_eq!(outcome.fixed, 2);
        assert_eq!(outcome.tree.text(), "enum E { A = 1, B = 2, C = 3 }");
    }
}
