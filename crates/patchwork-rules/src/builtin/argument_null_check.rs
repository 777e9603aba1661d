//! RCS1255: simplify argument null check
//!
//! `if (x == null) throw new ArgumentNullException(nameof(x));` becomes
//! `ArgumentNullException.ThrowIfNull(x);` when `x` is a reference-type
//! parameter and the referenced library has the `ThrowIfNull` helper.

use patchwork_core::cst::ast::{
    AstNode, BinaryExpression, Block, IdentifierName, IfStatement, InvocationExpression,
    LiteralExpression, ObjectCreationExpression, ThrowStatement,
};
use patchwork_core::cst::make;
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, EquivalenceKey,
    FixContext, FixProviderRegistration, RegistryBuilder, Replacement, Result, SemanticModel,
    Severity, SymbolKind, SyntaxKind, SyntaxNode,
};

pub const ID: &str = "RCS1255";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Simplify argument null check",
    "Use 'ArgumentNullException.ThrowIfNull' to check '{0}'",
    "Simplification",
    Severity::Info,
);

const EXCEPTION: &str = "ArgumentNullException";
const HELPER: &str = "ThrowIfNull";

/// What a matching null check consists of
struct NullCheck {
    statement: IfStatement,
    parameter: String,
    /// The exception type as written, qualification included
    exception_type: String,
}

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            vec![SyntaxKind::IfStatement],
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let Some(check) = match_null_check(node, ctx.semantic_model()) else {
        return;
    };
    let Some(keyword) = check.statement.if_keyword() else {
        return;
    };
    ctx.report(&DESCRIPTOR, keyword.text_range(), &[&check.parameter]);
}

fn match_null_check(node: &SyntaxNode, model: &SemanticModel) -> Option<NullCheck> {
    let statement = IfStatement::cast(node.clone())?;
    if statement.else_clause().is_some() {
        return None;
    }
    // Comments inside the statement would be lost
    let has_trivia_of_note = node
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .any(|t| t.kind().is_comment() || t.kind().is_directive());
    if has_trivia_of_note {
        return None;
    }

    let condition = statement.condition().and_then(BinaryExpression::cast)?;
    if condition.operator()? != SyntaxKind::EqEq {
        return None;
    }
    let (lhs, rhs) = (condition.lhs()?, condition.rhs()?);
    let checked = match (is_null(&lhs), is_null(&rhs)) {
        (false, true) => lhs,
        (true, false) => rhs,
        _ => return None,
    };
    let parameter = IdentifierName::cast(checked.clone())?.text()?;

    let creation = thrown_creation(&statement)?;
    let ty = creation.ty()?;
    if ty.simple_name().as_deref() != Some(EXCEPTION) || creation.initializer().is_some() {
        return None;
    }
    let argument_list = creation.argument_list()?;
    let mut arguments = argument_list.arguments();
    let argument = arguments.next()?;
    if arguments.next().is_some() || argument.name().is_some() {
        return None;
    }
    if !names_parameter(&argument.expression()?, &parameter) {
        return None;
    }

    let symbol = model.symbol(&checked)?;
    if symbol.kind != SymbolKind::Parameter {
        return None;
    }
    let type_name = symbol.type_name.as_deref()?;
    if model.is_reference_type(type_name) != Some(true) {
        return None;
    }
    let exception_type = ty.text();
    if model.symbol(ty.syntax()).is_none() || !model.has_static_method(&exception_type, HELPER, 1) {
        return None;
    }

    Some(NullCheck {
        statement,
        parameter,
        exception_type,
    })
}

fn is_null(node: &SyntaxNode) -> bool {
    LiteralExpression::cast(node.clone()).is_some_and(|l| l.kind() == Some(SyntaxKind::NullKw))
}

/// `throw new ...;` directly or as the only statement of a block
fn thrown_creation(statement: &IfStatement) -> Option<ObjectCreationExpression> {
    let mut body = statement.statement()?;
    if let Some(block) = Block::cast(body.clone()) {
        let mut statements = block.statements();
        body = statements.next()?;
        if statements.next().is_some() {
            return None;
        }
    }
    ThrowStatement::cast(body)?
        .expression()
        .and_then(ObjectCreationExpression::cast)
}

/// `nameof(x)` or `"x"`
fn names_parameter(expression: &SyntaxNode, parameter: &str) -> bool {
    if let Some(invocation) = InvocationExpression::cast(expression.clone()) {
        let is_nameof = invocation
            .expression()
            .and_then(IdentifierName::cast)
            .and_then(|n| n.text())
            .is_some_and(|name| name == "nameof");
        let Some(list) = invocation.argument_list() else {
            return false;
        };
        let arguments: Vec<_> = list.arguments().collect();
        return is_nameof
            && arguments.len() == 1
            && arguments[0]
                .expression()
                .and_then(IdentifierName::cast)
                .and_then(|n| n.text())
                .is_some_and(|name| name == parameter);
    }
    LiteralExpression::cast(expression.clone())
        .and_then(|l| l.token())
        .is_some_and(|t| t.kind() == SyntaxKind::StringLiteral && t.text() == format!("\"{parameter}\""))
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(node) = ctx
        .node()
        .and_then(|n| n.ancestors().find(|a| a.kind() == SyntaxKind::IfStatement))
    else {
        return Ok(Vec::new());
    };
    let Some(check) = match_null_check(&node, ctx.semantic_model()) else {
        return Ok(Vec::new());
    };
    let Some(call) = make::statement(&format!(
        "{}.{HELPER}({});",
        check.exception_type, check.parameter
    )) else {
        return Ok(Vec::new());
    };

    let mut editor = ctx.editor();
    editor.replace_node(check.statement.syntax(), Replacement::node(call).formatted())?;
    Ok(vec![CodeAction::fix(
        format!("Call '{EXCEPTION}.{HELPER}'"),
        EquivalenceKey::new(ID),
        editor.finish(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::{diagnostics, fix as apply_fix};
    use patchwork_core::{AnalyzerOptions, ReferenceCatalog, ReferenceType};

    fn method(parameters: &str, body: &str) -> String {
        format!(
            "using System;\n\nclass C\n{{\n    void M({parameters})\n    {{\n{body}    }}\n}}\n"
        )
    }

    #[test]
    fn test_replaces_null_check_with_helper_call() {
        let source = method(
            "string x",
            "        if (x == null) throw new ArgumentNullException(nameof(x));\n        Use(x);\n",
        );
        let options = AnalyzerOptions::default();
        let found = diagnostics(&source, ID, &options);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Use 'ArgumentNullException.ThrowIfNull' to check 'x'");
        let if_offset = source.find("if (").expect("if keyword");
        assert_eq!(usize::from(found[0].range().start()), if_offset);
        assert_eq!(usize::from(found[0].range().len()), 2);

        let fixed = apply_fix(&source, ID, ID, &options);
        assert_eq!(
            fixed,
            method(
                "string x",
                "        ArgumentNullException.ThrowIfNull(x);\n        Use(x);\n",
            )
        );
    }

    #[test]
    fn test_block_body_and_reversed_operands() {
        let source = method(
            "object value",
            concat!(
                "        if (null == value)\n",
                "        {\n",
                "            throw new System.ArgumentNullException(\"value\");\n",
                "        }\n",
            ),
        );
        let fixed = apply_fix(&source, ID, ID, &AnalyzerOptions::default());
        assert_eq!(
            fixed,
            method("object value", "        System.ArgumentNullException.ThrowIfNull(value);\n")
        );
    }

    #[test]
    fn test_legacy_library_has_no_helper() {
        let source = method(
            "string x",
            "        if (x == null) throw new ArgumentNullException(nameof(x));\n",
        );
        let options = AnalyzerOptions::default().with_catalog(ReferenceCatalog::legacy());
        assert!(diagnostics(&source, ID, &options).is_empty());
    }

    #[test]
    fn test_helper_can_come_from_a_custom_catalog() {
        let source = method(
            "string x",
            "        if (x == null) throw new ArgumentNullException(nameof(x));\n",
        );
        let catalog = ReferenceCatalog::empty().with_type(
            ReferenceType::class("System", "ArgumentNullException")
                .with_static_method("ThrowIfNull", &["object"]),
        );
        let options = AnalyzerOptions::default().with_catalog(catalog);
        assert_eq!(diagnostics(&source, ID, &options).len(), 1);
    }

    #[test]
    fn test_not_a_simple_parameter_check() {
        let options = AnalyzerOptions::default();
        let cases = [
            // value type
            method("int x", "        if (x == null) throw new ArgumentNullException(nameof(x));\n"),
            // local, not a parameter
            method(
                "",
                "        string x = null;\n        if (x == null) throw new ArgumentNullException(nameof(x));\n",
            ),
            // names another parameter
            method(
                "string x, string y",
                "        if (x == null) throw new ArgumentNullException(nameof(y));\n",
            ),
            // else branch
            method(
                "string x",
                "        if (x == null) throw new ArgumentNullException(nameof(x)); else M(x);\n",
            ),
            // other exception
            method("string x", "        if (x == null) throw new ArgumentException(nameof(x));\n"),
            // message argument
            method(
                "string x",
                "        if (x == null) throw new ArgumentNullException(nameof(x), \"m\");\n",
            ),
            // comment would be lost
            method(
                "string x",
                "        if (x == null) // guard\n            throw new ArgumentNullException(nameof(x));\n",
            ),
        ];
        for source in cases {
            assert!(diagnostics(&source, ID, &options).is_empty(), "{source}");
        }
    }

    #[test]
    fn test_document_type_without_helper_shadows_library() {
        let source = format!(
            "{}\nclass ArgumentNullException : Exception\n{{\n    public ArgumentNullException(string name) {{ }}\n}}\n",
            method("string x", "        if (x == null) throw new ArgumentNullException(nameof(x));\n")
        );
        assert!(diagnostics(&source, ID, &AnalyzerOptions::default()).is_empty());
    }
}
