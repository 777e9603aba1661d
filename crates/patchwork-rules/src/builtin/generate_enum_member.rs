//! RR0001: generate enum member
//!
//! Appends a member named `EnumMember` (`EnumMember2`, ... when taken) with
//! the next value of the enum and marks its name for renaming.

use std::collections::HashSet;

use patchwork_core::cst::ast::{AstNode, EnumDeclaration, EnumMemberDeclaration};
use patchwork_core::cst::{GreenElement, make};
use patchwork_core::trivia::{
    first_significant_token, last_significant_token, line_indentation, next_significant_token,
    trailing_range, trailing_trivia,
};
use patchwork_core::{
    AnnotationKind, CodeAction, EquivalenceKey, RefactoringContext, RefactoringRegistration,
    RegistryBuilder, Replacement, Result, SyntaxEditor, SyntaxKind, SyntaxToken,
};
use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};

use super::duplicate_enum_value::is_flags;

pub const ID: &str = "RR0001";
pub const TITLE: &str = "Generate enum member";

const BASE_NAME: &str = "EnumMember";

pub fn register(builder: &mut RegistryBuilder) -> Result<()> {
    builder.register_refactoring(RefactoringRegistration::new(ID, TITLE, refactor))?;
    Ok(())
}

pub fn refactor(ctx: &RefactoringContext<'_>) -> Result<Vec<CodeAction>> {
    let Some(declaration) = ctx
        .node()
        .and_then(|n| n.ancestors().find_map(EnumDeclaration::cast))
    else {
        return Ok(Vec::new());
    };
    let members: Vec<EnumMemberDeclaration> = declaration.members().collect();

    let model = ctx.semantic_model();
    let mut values = Vec::with_capacity(members.len());
    for member in &members {
        let Some(value) = model.constant_value(member.syntax()).and_then(|v| v.as_int()) else {
            return Ok(Vec::new());
        };
        values.push(value);
    }
    let Some(value) = next_value(&values, is_flags(&declaration)) else {
        return Ok(Vec::new());
    };
    let taken: HashSet<String> = members.iter().filter_map(|m| m.name()).collect();
    let name = unique_name(&taken);
    let Some(member) = make::enum_member(&format!("{name} = {value}")) else {
        return Ok(Vec::new());
    };

    let mut editor = ctx.editor();
    let name_len = TextSize::of(name.as_str());
    match members.last() {
        Some(last) => append(&mut editor, last, member, name_len)?,
        None => {
            let (Some(open), Some(close)) = (declaration.open_brace(), declaration.close_brace())
            else {
                return Ok(Vec::new());
            };
            insert_first(&mut editor, &open, &close, member, name_len)?;
        }
    }
    Ok(vec![CodeAction::refactoring(
        TITLE,
        EquivalenceKey::new(ID),
        editor.finish(),
    )])
}

/// `max + 1`, or the next power of two above every value for flag enums
fn next_value(values: &[i64], flags: bool) -> Option<i64> {
    let max = values.iter().copied().max();
    if flags {
        let mut candidate: i64 = 1;
        while max.is_some_and(|max| candidate <= max) {
            candidate = candidate.checked_mul(2)?;
        }
        return Some(candidate);
    }
    match max {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

fn unique_name(taken: &HashSet<String>) -> String {
    if !taken.contains(BASE_NAME) {
        return BASE_NAME.to_string();
    }
    (2..)
        .map(|n| format!("{BASE_NAME}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| BASE_NAME.to_string())
}

fn comma() -> GreenElement {
    NodeOrToken::Token(make::token(SyntaxKind::Comma, ","))
}

fn rename(replacement: Replacement, start: TextSize, len: TextSize) -> Replacement {
    replacement.annotate(AnnotationKind::RenameTarget, TextRange::at(start, len))
}

fn append(
    editor: &mut SyntaxEditor,
    last: &EnumMemberDeclaration,
    member: GreenNode,
    name_len: TextSize,
) -> Result<()> {
    let element = NodeOrToken::Node(last.syntax().clone());
    let indent = first_significant_token(&element).and_then(|t| line_indentation(&t));
    let trailing_comma = last_significant_token(&element)
        .and_then(|t| next_significant_token(&t))
        .filter(|t| t.kind() == SyntaxKind::Comma);

    match (indent, trailing_comma) {
        (Some(indent), Some(comma_token)) => {
            let line_break = trailing_trivia(&comma_token)
                .into_iter()
                .find(|t| t.kind() == SyntaxKind::Newline);
            let Some(line_break) = line_break else {
                return append_inline_after_comma(editor, &comma_token, member, name_len);
            };
            // A new line below the last member
            let mut elements = Vec::new();
            if !indent.is_empty() {
                elements.push(make::whitespace(&indent));
            }
            elements.push(NodeOrToken::Node(member));
            elements.push(comma());
            elements.push(make::newline(line_break.text()));
            let replacement = rename(
                Replacement::elements(elements),
                TextSize::of(indent.as_str()),
                name_len,
            );
            editor.insert_at(trailing_range(&comma_token).end(), replacement)?;
        }
        (Some(indent), None) => {
            let line_break = line_break_near(last);
            let start = TextSize::of(",") + TextSize::of(line_break.as_str()) + TextSize::of(indent.as_str());
            let mut elements = vec![comma(), make::newline(&line_break)];
            if !indent.is_empty() {
                elements.push(make::whitespace(&indent));
            }
            elements.push(NodeOrToken::Node(member));
            editor.insert_after(last.syntax(), rename(Replacement::elements(elements), start, name_len))?;
        }
        (None, Some(comma_token)) => {
            append_inline_after_comma(editor, &comma_token, member, name_len)?;
        }
        (None, None) => {
            let elements = vec![comma(), make::whitespace(" "), NodeOrToken::Node(member)];
            editor.insert_after(
                last.syntax(),
                rename(Replacement::elements(elements), TextSize::of(", "), name_len),
            )?;
        }
    }
    Ok(())
}

/// `A, EnumMember = 1,` on the same line
fn append_inline_after_comma(
    editor: &mut SyntaxEditor,
    comma_token: &SyntaxToken,
    member: GreenNode,
    name_len: TextSize,
) -> Result<()> {
    let elements = vec![make::whitespace(" "), NodeOrToken::Node(member), comma()];
    editor.insert_at(
        comma_token.text_range().end(),
        rename(Replacement::elements(elements), TextSize::of(" "), name_len),
    )?;
    Ok(())
}

/// Line break used by the document around `member`
fn line_break_near(member: &EnumMemberDeclaration) -> String {
    member
        .syntax()
        .parent()
        .into_iter()
        .flat_map(|p| p.descendants_with_tokens())
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == SyntaxKind::Newline)
        .map_or_else(|| "\n".to_string(), |t| t.text().to_string())
}

fn insert_first(
    editor: &mut SyntaxEditor,
    open: &SyntaxToken,
    close: &SyntaxToken,
    member: GreenNode,
    name_len: TextSize,
) -> Result<()> {
    let line_break = trailing_trivia(open)
        .into_iter()
        .find(|t| t.kind() == SyntaxKind::Newline);
    if let (Some(line_break), Some(_)) = (line_break, line_indentation(close)) {
        // Own line between the braces, indented by the formatter
        let elements = vec![NodeOrToken::Node(member), make::newline(line_break.text())];
        let replacement = rename(Replacement::elements(elements), TextSize::from(0), name_len).formatted();
        editor.insert_at(trailing_range(open).end(), replacement)?;
        return Ok(());
    }
    let mut elements = vec![make::whitespace(" "), NodeOrToken::Node(member)];
    if open.next_token().as_ref() == Some(close) {
        elements.push(make::whitespace(" "));
    }
    editor.insert_at(
        open.text_range().end(),
        rename(Replacement::elements(elements), TextSize::of(" "), name_len),
    )?;
    Ok(())
}
