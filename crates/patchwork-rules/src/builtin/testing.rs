//! Helpers shared by the rule unit tests

use std::collections::BTreeMap;

use patchwork_core::{
    AnalyzerOptions, CancellationToken, CodeAction, Diagnostic, PatchworkConfig, RuleSeverity,
    SyntaxTree,
};

use super::registry;

/// Options with `rules` switched on at info level and the given style options
pub(crate) fn options_with(rules: &[&str], values: &[(&str, &str)]) -> AnalyzerOptions {
    AnalyzerOptions::new(PatchworkConfig {
        rules: Some(
            rules
                .iter()
                .map(|id| (id.to_string(), RuleSeverity::Info))
                .collect(),
        ),
        options: Some(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    })
}

/// Diagnostics of one id reported for `text`
pub(crate) fn diagnostics(text: &str, id: &str, options: &AnalyzerOptions) -> Vec<Diagnostic> {
    let tree = SyntaxTree::parse(text);
    let report = registry()
        .analyze(&tree, options, &CancellationToken::new())
        .expect("analyze");
    assert!(report.faults.is_empty(), "rule faulted: {:?}", report.faults);
    report.of_id(id).cloned().collect()
}

/// Actions offered for the first diagnostic of `id`
pub(crate) fn actions(text: &str, id: &str, options: &AnalyzerOptions) -> (SyntaxTree, Vec<CodeAction>) {
    let tree = SyntaxTree::parse(text);
    let registry = registry();
    let report = registry
        .analyze(&tree, options, &CancellationToken::new())
        .expect("analyze");
    let diagnostic = report.of_id(id).next().expect("diagnostic of requested id");
    let actions = registry
        .code_fixes(&tree, diagnostic, options)
        .expect("code fixes");
    (tree, actions)
}

/// Text after applying the action with equivalence key `key` to the first
/// diagnostic of `id`
pub(crate) fn fix(text: &str, id: &str, key: &str, options: &AnalyzerOptions) -> String {
    let (tree, actions) = actions(text, id, options);
    let action = actions
        .iter()
        .find(|a| a.equivalence_key.as_str() == key)
        .expect("action with requested key");
    action.apply(&tree, options).expect("apply").tree.text()
}
