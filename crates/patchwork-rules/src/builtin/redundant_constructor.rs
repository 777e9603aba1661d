//! RCS1074: remove redundant constructor
//!
//! An empty, parameterless instance constructor that is the only one of its
//! class and has the accessibility the compiler would give the implicit one
//! (`public`, or `protected` in an abstract class) adds nothing.

use patchwork_core::cst::ast::{AstNode, ConstructorDeclaration, TypeDeclaration};
use patchwork_core::trivia::{
    first_significant_token, last_significant_token, leading_trivia, trailing_trivia,
};
use patchwork_core::{
    AnalysisContext, AnalyzerRegistration, CodeAction, DiagnosticDescriptor, EquivalenceKey,
    FixContext, FixProviderRegistration, RegistryBuilder, Result, Severity, SyntaxKind,
    SyntaxNode,
};
use rowan::NodeOrToken;

pub const ID: &str = "RCS1074";

pub static DESCRIPTOR: DiagnosticDescriptor = DiagnosticDescriptor::new(
    ID,
    "Remove redundant constructor",
    "Remove redundant constructor",
    "Redundancy",
    Severity::Hidden,
);

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder
        .register_analyzer(AnalyzerRegistration::new(
            vec![&DESCRIPTOR],
            vec![SyntaxKind::ConstructorDeclaration],
            analyze,
        ))?
        .register_fix_provider(FixProviderRegistration::new(vec![ID], fix))?;
    Ok(())
}

pub fn analyze(ctx: &AnalysisContext<'_>, node: &SyntaxNode) {
    let Some(ctor) = ConstructorDeclaration::cast(node.clone()) else {
        return;
    };
    if ctor.has_modifier(SyntaxKind::StaticKw) || ctor.attribute_lists().next().is_some() {
        return;
    }
    let Some(class) = node
        .parent()
        .filter(|p| p.kind() == SyntaxKind::ClassDeclaration)
        .and_then(TypeDeclaration::cast)
    else {
        return;
    };
    if class.is_static() || !has_implicit_accessibility(&ctor, &class) {
        return;
    }
    if !is_empty_parameterless(&ctor) {
        return;
    }
    let instance_constructors = class
        .constructors()
        .filter(|c| !c.has_modifier(SyntaxKind::StaticKw))
        .count();
    if instance_constructors != 1 || carries_trivia_of_note(node) {
        return;
    }
    ctx.report(&DESCRIPTOR, node.text_range(), &[]);
}

/// `public`, or `protected` when the class is abstract, and nothing else
fn has_implicit_accessibility(ctor: &ConstructorDeclaration, class: &TypeDeclaration) -> bool {
    let expected = if class.has_modifier(SyntaxKind::AbstractKw) {
        SyntaxKind::ProtectedKw
    } else {
        SyntaxKind::PublicKw
    };
    let modifiers: Vec<SyntaxKind> = ctor.modifiers().map(|t| t.kind()).collect();
    modifiers == [expected]
}

fn is_empty_parameterless(ctor: &ConstructorDeclaration) -> bool {
    let no_parameters = ctor
        .parameter_list()
        .is_some_and(|list| list.parameters().next().is_none());
    let empty_body = ctor.expression_body().is_none()
        && ctor.body().is_some_and(|body| body.statements().next().is_none());
    // `: base()` is what the implicit constructor calls anyway
    let trivial_initializer = match ctor.initializer() {
        None => true,
        Some(init) => {
            init.is_base()
                && init
                    .argument_list()
                    .is_some_and(|args| args.arguments().next().is_none())
        }
    };
    no_parameters && empty_body && trivial_initializer
}

/// Comments (documentation included) or directives anywhere in the full range
fn carries_trivia_of_note(node: &SyntaxNode) -> bool {
    let element = NodeOrToken::Node(node.clone());
    let leading = first_significant_token(&element)
        .map(|t| leading_trivia(&t))
        .unwrap_or_default();
    let trailing = last_significant_token(&element)
        .map(|t| trailing_trivia(&t))
        .unwrap_or_default();
    node.descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .chain(leading)
        .chain(trailing)
        .any(|t| t.kind().is_comment() || t.kind().is_directive())
}

pub fn fix(ctx: &FixContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(ctor) = ctx.node().and_then(ConstructorDeclaration::cast) else {
        return Ok(Vec::new());
    };
    let mut editor = ctx.editor();
    editor.remove_member(ctor.syntax())?;
    Ok(vec![CodeAction::fix(
        "Remove redundant constructor",
        EquivalenceKey::new(ID),
        editor.finish(),
    )])
}
