//! Built-in rules driven through the public registry, one document at a time
//! and across a workspace.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use patchwork_core::{
    AnalysisContext, AnalyzerOptions, AnalyzerRegistration, CancellationToken,
    DiagnosticDescriptor, EquivalenceKey, ErrorKind, PatchworkConfig, RuleRegistry, RuleSeverity,
    Severity, SyntaxKind, SyntaxNode, SyntaxTree, Workspace,
};
use patchwork_rules::builtin::{
    argument_null_check, blank_line_between_switch_sections, duplicate_enum_value,
    redundant_constructor, switch_section_braces, unnecessary_blank_line,
};
use patchwork_rules::registry;

const SHAPES: &str = r#"using System;

public class Shapes
{
    public Shapes()
    {
    }

    public void Draw(string name, int k)
    {
        if (name == null) throw new ArgumentNullException(nameof(name));
        switch (k)
        {
            case 1:
                {
                    Draw(name, k);
                    break;
                }
            case 2:
                break;
        }
    }
}

public enum Color
{
    Red = 2,
    Blue = 2,
}
"#;

fn analyze(text: &str, options: &AnalyzerOptions) -> Result<Vec<String>> {
    let tree = SyntaxTree::parse(text);
    let report = registry().analyze(&tree, options, &CancellationToken::new())?;
    assert!(report.faults.is_empty());
    Ok(report.diagnostics.iter().map(ToString::to_string).collect())
}

fn fix_first(text: &str, id: &str, key: &str, options: &AnalyzerOptions) -> Result<String> {
    let tree = SyntaxTree::parse(text);
    let registry = registry();
    let report = registry.analyze(&tree, options, &CancellationToken::new())?;
    let diagnostic = report.of_id(id).next().expect("diagnostic");
    let actions = registry.code_fixes(&tree, diagnostic, options)?;
    let action = actions
        .iter()
        .find(|a| a.equivalence_key.as_str() == key)
        .expect("action");
    Ok(action.apply(&tree, options)?.tree.text())
}

fn with_rules(rules: &[(&str, RuleSeverity)]) -> AnalyzerOptions {
    AnalyzerOptions::new(PatchworkConfig {
        rules: Some(rules.iter().map(|(id, s)| (id.to_string(), *s)).collect()),
        ..Default::default()
    })
}

#[test]
fn document_reports_every_scenario_in_order() -> Result<()> {
    let found = analyze(SHAPES, &AnalyzerOptions::default())?;
    insta::assert_snapshot!(found.join("\n"), @r"
    5:5: hidden RCS1074: Remove redundant constructor
    11:9: info RCS1255: Use 'ArgumentNullException.ThrowIfNull' to check 'name'
    15:17: hidden RCS1031: Remove unnecessary braces in switch section
    28:5: info RCS1234: Enum member 'Blue' has the same value as 'Red'
    ");
    Ok(())
}

#[test]
fn each_fix_touches_only_its_own_code() -> Result<()> {
    let options = AnalyzerOptions::default();

    let fixed = fix_first(SHAPES, redundant_constructor::ID, redundant_constructor::ID, &options)?;
    assert!(!fixed.contains("public Shapes()"));
    assert!(fixed.starts_with("using System;\n\npublic class Shapes\n{\n    public void Draw("));

    let fixed = fix_first(SHAPES, argument_null_check::ID, argument_null_check::ID, &options)?;
    assert!(fixed.contains("    {\n        ArgumentNullException.ThrowIfNull(name);\n        switch (k)\n"));

    let fixed = fix_first(SHAPES, switch_section_braces::ID, switch_section_braces::ID, &options)?;
    assert!(fixed.contains(concat!(
        "            case 1:\n",
        "                Draw(name, k);\n",
        "                break;\n",
        "\n",
        "            case 2:\n",
    )));

    let fixed = fix_first(SHAPES, duplicate_enum_value::ID, "RCS1234.UseMember", &options)?;
    assert!(fixed.ends_with("    Red = 2,\n    Blue = Red,\n}\n"));

    for id in [
        redundant_constructor::ID,
        argument_null_check::ID,
        switch_section_braces::ID,
    ] {
        let fixed = fix_first(SHAPES, id, id, &options)?;
        assert!(fixed.len() < SHAPES.len(), "{id} shrinks the document");
        assert!(!analyze(&fixed, &options)?.iter().any(|d| d.contains(id)));
    }
    Ok(())
}

#[test]
fn fix_variants_have_distinct_keys() -> Result<()> {
    let tree = SyntaxTree::parse(SHAPES);
    let options = AnalyzerOptions::default();
    let registry = registry();
    let report = registry.analyze(&tree, &options, &CancellationToken::new())?;
    for diagnostic in &report.diagnostics {
        let actions = registry.code_fixes(&tree, diagnostic, &options)?;
        let keys: HashSet<&str> = actions.iter().map(|a| a.equivalence_key.as_str()).collect();
        assert_eq!(keys.len(), actions.len(), "{}", diagnostic.id);
        assert!(!actions.is_empty(), "{}", diagnostic.id);
        for key in keys {
            assert!(key.starts_with(&diagnostic.id));
        }
    }
    Ok(())
}

#[test]
fn style_fixes_are_idempotent() -> Result<()> {
    let source = concat!(
        "class C\n",
        "{\n",
        "\n",
        "    void M(int k)\n",
        "    {\n",
        "        switch (k)\n",
        "        {\n",
        "            case 1:\n",
        "                break;\n",
        "            case 2:\n",
        "                break;\n",
        "        }\n",
        "\n",
        "    }\n",
        "}\n",
    );
    let options = with_rules(&[
        (blank_line_between_switch_sections::ID, RuleSeverity::Warn),
        (unnecessary_blank_line::ID, RuleSeverity::Warn),
    ]);
    let registry = registry();
    let cancel = CancellationToken::new();

    let mut tree = SyntaxTree::parse(source);
    for id in [blank_line_between_switch_sections::ID, unnecessary_blank_line::ID] {
        let outcome = registry.fix_all(&tree, id, &EquivalenceKey::new(id), &options, &cancel)?;
        assert!(outcome.fixed > 0, "{id}");
        tree = outcome.tree;
    }
    assert_eq!(
        tree.text(),
        concat!(
            "class C\n",
            "{\n",
            "    void M(int k)\n",
            "    {\n",
            "        switch (k)\n",
            "        {\n",
            "            case 1:\n",
            "                break;\n",
            "\n",
            "            case 2:\n",
            "                break;\n",
            "        }\n",
            "    }\n",
            "}\n",
        )
    );
    assert!(analyze(&tree.text(), &options)?.is_empty());
    Ok(())
}

#[test]
fn single_line_section_block_is_unwrapped_once() -> Result<()> {
    let source = concat!(
        "class C\n",
        "{\n",
        "    void M(int k)\n",
        "    {\n",
        "        switch (k)\n",
        "        {\n",
        "            case 1: { M(); break; }\n",
        "            case 2:\n",
        "                break;\n",
        "        }\n",
        "    }\n",
        "}\n",
    );
    let options = AnalyzerOptions::default();
    let found = analyze(source, &options)?;
    assert_eq!(found, vec!["7:21: hidden RCS1031: Remove unnecessary braces in switch section"]);

    let fixed = fix_first(source, switch_section_braces::ID, switch_section_braces::ID, &options)?;
    assert_eq!(
        fixed,
        concat!(
            "class C\n",
            "{\n",
            "    void M(int k)\n",
            "    {\n",
            "        switch (k)\n",
            "        {\n",
            "            case 1: M(); break;\n",
            "\n",
            "            case 2:\n",
            "                break;\n",
            "        }\n",
            "    }\n",
            "}\n",
        )
    );
    assert!(analyze(&fixed, &options)?.is_empty());
    let spacing = with_rules(&[(blank_line_between_switch_sections::ID, RuleSeverity::Warn)]);
    assert!(analyze(&fixed, &spacing)?.is_empty());

    let outcome = registry().fix_all(
        &SyntaxTree::parse(&fixed),
        switch_section_braces::ID,
        &EquivalenceKey::new(switch_section_braces::ID),
        &options,
        &CancellationToken::new(),
    )?;
    assert_eq!(outcome.fixed, 0);
    assert_eq!(outcome.tree.text(), fixed);
    Ok(())
}

#[test]
fn directives_suppress_destructive_rules() -> Result<()> {
    let source = concat!(
        "public class C\n",
        "{\n",
        "#if DEBUG\n",
        "    public C()\n",
        "    {\n",
        "    }\n",
        "#endif\n",
        "\n",
        "    void M(int k)\n",
        "    {\n",
        "        switch (k)\n",
        "        {\n",
        "            case 1:\n",
        "                {\n",
        "#if TRACE\n",
        "                    M(k);\n",
        "#endif\n",
        "                    break;\n",
        "                }\n",
        "        }\n",
        "    }\n",
        "}\n",
    );
    let found = analyze(source, &AnalyzerOptions::default())?;
    assert!(found.is_empty(), "{found:?}");
    Ok(())
}

static FAULTY: DiagnosticDescriptor =
    DiagnosticDescriptor::new("TST9999", "Faulty", "Faulty", "Test", Severity::Warning);

fn panicking_analyzer(_: &AnalysisContext<'_>, _: &SyntaxNode) {
    panic!("analyzer bug");
}

#[test]
fn faulting_rule_does_not_stop_the_others() -> Result<()> {
    let mut builder = RuleRegistry::builder();
    builder.register_analyzer(AnalyzerRegistration::new(
        vec![&FAULTY],
        vec![SyntaxKind::EnumDeclaration],
        panicking_analyzer,
    ))?;
    duplicate_enum_value::register(&mut builder)?;
    let registry = builder.build()?;

    let tree = SyntaxTree::parse(SHAPES);
    let report = registry.analyze(&tree, &AnalyzerOptions::default(), &CancellationToken::new())?;
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].kind(), ErrorKind::Fault);
    let ids: Vec<_> = report.diagnostics.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec![duplicate_enum_value::ID]);
    Ok(())
}

#[test]
fn cancelled_analysis_stops() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let tree = SyntaxTree::parse(SHAPES);
    assert!(registry().analyze(&tree, &AnalyzerOptions::default(), &cancel).is_err());
}

#[test]
fn workspace_documents_are_analyzed_independently() -> Result<()> {
    let workspace = Workspace::new();
    workspace.open("b.cs", "enum E { A = 1, B = 1 }");
    workspace.open("a.cs", SHAPES);
    workspace.open("c.cs", "class Empty { }");

    let results = registry().analyze_workspace(
        &workspace,
        &with_rules(&[(switch_section_braces::ID, RuleSeverity::Off)]),
        &CancellationToken::new(),
    )?;
    let summary: Vec<(PathBuf, usize)> = results
        .iter()
        .map(|(path, report)| (path.clone(), report.diagnostics.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (PathBuf::from("a.cs"), 3),
            (PathBuf::from("b.cs"), 1),
            (PathBuf::from("c.cs"), 0),
        ]
    );
    Ok(())
}
