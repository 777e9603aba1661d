//! End-to-end properties of the engine: lossless trees, directive-safe and
//! disjoint edits, configuration discovery feeding rule options.

use std::fs;

use anyhow::Result;
use patchwork_core::cst::make;
use patchwork_core::edit::{remove_node, replace_node};
use patchwork_core::{
    AnalyzerOptions, ConfigLoader, DiagnosticDescriptor, EditError, RemovalPolicy, Replacement,
    Severity, SyntaxEditor, SyntaxKind, SyntaxNode, SyntaxTree, TreeEdit,
};

fn nth(tree: &SyntaxTree, kind: SyntaxKind, n: usize) -> SyntaxNode {
    tree.root()
        .descendants()
        .filter(|node| node.kind() == kind)
        .nth(n)
        .expect("node of requested kind")
}

#[test]
fn round_trip_preserves_every_byte() {
    let sources = [
        "",
        "class C { }",
        "using System;\r\n\r\nnamespace N\r\n{\r\n    class C { }\r\n}\r\n",
        "class C\n{\n    /// docs\n    void M() { /* inline */ M(); } // tail\n}\n",
        "#region R\nenum E { A = 1 << 2, B }\n#endregion\n",
        "class C { void M() { if (x == null) throw new ArgumentNullException(nameof(x)); } }",
        // malformed
        "class { void ( } } }",
        "/* never closed",
        "class C { string s = \"never closed",
        "\t \n\n",
    ];
    for source in sources {
        let tree = SyntaxTree::parse(source);
        assert_eq!(tree.text(), source);
        let tokens: String = tree
            .root()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(tokens, source);
    }
}

#[test]
fn unbalanced_directive_blocks_removal_and_replacement() {
    let source = "class C\n{\n    void M()\n    {\n#if DEBUG\n        A();\n#endif\n        B();\n    }\n}\n";
    let tree = SyntaxTree::parse(source);
    let first = nth(&tree, SyntaxKind::ExpressionStatement, 0);

    let removed = remove_node(&tree, &first, RemovalPolicy::KeepNoTrivia);
    assert!(matches!(removed, Err(EditError::UnbalancedDirectives { .. })));

    let call = make::statement("C();").expect("statement");
    let replaced = replace_node(&tree, &first, call);
    assert!(matches!(replaced, Err(EditError::UnbalancedDirectives { .. })));

    assert_eq!(tree.text(), source);
}

#[test]
fn balanced_directives_travel_with_the_node() -> Result<()> {
    let source = "class C\n{\n    void M()\n    {\n        A();\n#if DEBUG\n        B();\n#endif\n        C();\n    }\n}\n";
    let tree = SyntaxTree::parse(source);
    let method = nth(&tree, SyntaxKind::MethodDeclaration, 0);
    let outcome = remove_node(&tree, &method, RemovalPolicy::KeepNoTrivia)?;
    assert_eq!(outcome.tree.text(), "class C\n{\n}\n");
    Ok(())
}

#[test]
fn overlapping_batch_fails_as_a_whole() {
    let tree = SyntaxTree::parse("class C { void M() { A(); B(); } }");
    let statement = nth(&tree, SyntaxKind::ExpressionStatement, 0);
    let call = nth(&tree, SyntaxKind::InvocationExpression, 0);

    let mut outer = SyntaxEditor::new(&tree);
    outer
        .replace_node(&statement, Replacement::empty())
        .expect("replace statement");
    let mut inner = SyntaxEditor::new(&tree);
    inner
        .replace_node(&call, Replacement::node(make::expression("X()").expect("expression")))
        .expect("replace call");

    let merged = TreeEdit::merge([outer.finish(), inner.finish()])
        .expect("same tree")
        .expect("non-empty batch");
    assert!(matches!(
        merged.apply(&tree),
        Err(EditError::OverlappingEdits { .. })
    ));
}

#[test]
fn disjoint_batch_applies_in_one_pass() -> Result<()> {
    let tree = SyntaxTree::parse("class C { void M() { A(); B(); } }");
    let mut edits = Vec::new();
    for (n, name) in ["X()", "Y()"].into_iter().enumerate() {
        let call = nth(&tree, SyntaxKind::InvocationExpression, n);
        let mut editor = SyntaxEditor::new(&tree);
        editor.replace_node(&call, Replacement::node(make::expression(name).expect("expression")))?;
        edits.push(editor.finish());
    }
    let merged = TreeEdit::merge(edits)?.expect("non-empty batch");
    assert_eq!(
        merged.apply(&tree)?.tree.text(),
        "class C { void M() { X(); Y(); } }"
    );
    Ok(())
}

#[test]
fn edits_against_an_older_tree_are_rejected() -> Result<()> {
    let tree = SyntaxTree::parse("class C { int a; }");
    let field = nth(&tree, SyntaxKind::FieldDeclaration, 0);
    let mut editor = SyntaxEditor::new(&tree);
    editor.remove_node(&field, RemovalPolicy::KeepNoTrivia)?;
    let edit = editor.finish();

    let newer = edit.apply(&tree)?.tree;
    assert!(matches!(edit.apply(&newer), Err(EditError::StaleTree { .. })));

    let mut editor = SyntaxEditor::new(&newer);
    assert!(matches!(
        editor.remove_node(&field, RemovalPolicy::KeepNoTrivia),
        Err(EditError::StaleTree { .. })
    ));
    Ok(())
}

static STYLE_RULE: DiagnosticDescriptor =
    DiagnosticDescriptor::new("TST0100", "Style", "Style", "Formatting", Severity::Info)
        .disabled_by_default();

#[test]
fn discovered_configuration_reaches_rule_options() -> Result<()> {
    let root = tempfile::tempdir()?;
    let nested = root.path().join("src").join("deep");
    fs::create_dir_all(&nested)?;
    fs::write(
        root.path().join(".patchworkrc.toml"),
        "[rules]\nTST0100 = \"warn\"\n\n[options]\nblank_line_between_switch_sections = \"omit\"\n",
    )?;

    let found = ConfigLoader::auto_discover(&nested)?.expect("config file");
    assert_eq!(
        found.file_name().and_then(|n| n.to_str()),
        Some(".patchworkrc.toml")
    );

    let options = AnalyzerOptions::new(ConfigLoader::load(None, Some(&nested))?);
    assert_eq!(options.rule_severity(&STYLE_RULE), Some(Severity::Warning));
    assert_eq!(options.get("blank_line_between_switch_sections"), Some("omit"));
    assert_eq!(options.get_or("missing", "include"), "include");
    Ok(())
}

#[test]
fn closer_file_wins_over_parent() -> Result<()> {
    let root = tempfile::tempdir()?;
    let nested = root.path().join("project");
    fs::create_dir_all(&nested)?;
    fs::write(root.path().join("patchwork.yaml"), "rules:\n  TST0100: error\n")?;
    fs::write(
        nested.join("patchwork.jsonc"),
        "{\n  // project override\n  \"rules\": { \"TST0100\": \"off\" },\n}\n",
    )?;

    let options = AnalyzerOptions::new(ConfigLoader::load(None, Some(&nested))?);
    assert!(!options.is_enabled(&STYLE_RULE));

    let options = AnalyzerOptions::new(ConfigLoader::load(None, Some(root.path()))?);
    assert_eq!(options.rule_severity(&STYLE_RULE), Some(Severity::Error));
    Ok(())
}
