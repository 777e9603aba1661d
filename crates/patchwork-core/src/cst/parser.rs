//! Hierarchical parser for the host language
//!
//! A recursive-descent parser that builds a rowan green tree from the lossless
//! token stream. Trivia placement follows one rule: pending trivia tokens are
//! flushed into whichever node is open at the moment the next node is started
//! or the next token is consumed. Consequently no node starts or ends with
//! trivia, a node's text range equals its span, and the trivia between two
//! tokens lives in their closest common ancestor.
//!
//! The parser never fails. Unexpected tokens are wrapped in `Error` nodes and
//! reported as [`ParseError`]s, so the round-trip property holds for any input.

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

use super::lexer::{CstToken, lex_with_trivia};
use super::{SyntaxKind, SyntaxTree};

/// A syntax error found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

impl ParseError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse source text into a new [`SyntaxTree`]
pub fn parse(source: &str) -> SyntaxTree {
    SyntaxTree::parse(source)
}

/// Parse source text into a green tree plus the errors found on the way
pub fn parse_green(source: &str) -> (GreenNode, Vec<ParseError>) {
    let (tokens, lexer_errors) = lex_with_trivia(source);
    let mut parser = Parser::new(tokens);
    parser.parse_compilation_unit();

    let mut errors: Vec<ParseError> = lexer_errors
        .into_iter()
        .map(|e| ParseError::new(e.message, text_range(&e.span)))
        .collect();
    errors.extend(parser.errors);
    errors.sort_by_key(|e| e.range.start());
    (parser.builder.finish(), errors)
}

fn text_range(span: &std::ops::Range<usize>) -> TextRange {
    TextRange::new(
        TextSize::from(span.start as u32),
        TextSize::from(span.end as u32),
    )
}

/// Binary operator precedences, loosest first
fn binary_precedence(kind: SyntaxKind) -> Option<u8> {
    let precedence = match kind {
        SyntaxKind::QuestionQuestion => 1,
        SyntaxKind::PipePipe => 2,
        SyntaxKind::AmpAmp => 3,
        SyntaxKind::Pipe => 4,
        SyntaxKind::Caret => 5,
        SyntaxKind::Amp => 6,
        SyntaxKind::EqEq | SyntaxKind::BangEq => 7,
        SyntaxKind::Lt
        | SyntaxKind::Gt
        | SyntaxKind::LtEq
        | SyntaxKind::GtEq
        | SyntaxKind::IsKw
        | SyntaxKind::AsKw => 8,
        SyntaxKind::LtLt => 9,
        SyntaxKind::Plus | SyntaxKind::Minus => 10,
        SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => 11,
        _ => return None,
    };
    Some(precedence)
}

const SHIFT_PRECEDENCE: u8 = 9;

fn is_assignment_operator(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Eq
            | SyntaxKind::PlusEq
            | SyntaxKind::MinusEq
            | SyntaxKind::StarEq
            | SyntaxKind::SlashEq
            | SyntaxKind::PercentEq
            | SyntaxKind::AmpEq
            | SyntaxKind::PipeEq
            | SyntaxKind::CaretEq
            | SyntaxKind::LtLtEq
            | SyntaxKind::QuestionQuestionEq
    )
}

/// Token stream parser
struct Parser {
    tokens: Vec<CstToken>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(tokens: Vec<CstToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_compilation_unit(&mut self) {
        self.builder.start_node(SyntaxKind::CompilationUnit.into());

        while !self.at_end() {
            let before = self.pos;
            self.parse_member(None);
            if self.pos == before {
                self.error_and_bump("Expected a declaration");
            }
        }

        self.flush_trivia();
        if let Some(eof) = self.tokens.get(self.pos) {
            self.builder.token(SyntaxKind::EndOfFile.into(), &eof.text);
        }
        self.builder.finish_node();
    }

    /// Parse one namespace, type or member declaration
    ///
    /// `enclosing_type` names the type whose body is being parsed, which is
    /// how constructors are told apart from methods.
    fn parse_member(&mut self, enclosing_type: Option<&str>) {
        match self.current() {
            SyntaxKind::UsingKw if enclosing_type.is_none() => {
                self.parse_using_directive();
                return;
            }
            SyntaxKind::NamespaceKw => {
                self.parse_namespace();
                return;
            }
            SyntaxKind::Semicolon | SyntaxKind::RBrace | SyntaxKind::EndOfFile => return,
            _ => {}
        }

        let checkpoint = self.checkpoint();
        let start = self.pos;
        while self.at(SyntaxKind::LBracket) {
            self.parse_attribute_list();
        }
        while self.current().is_modifier() {
            self.bump();
        }

        match self.current() {
            SyntaxKind::ClassKw => {
                self.parse_type_declaration(checkpoint, SyntaxKind::ClassDeclaration)
            }
            SyntaxKind::StructKw => {
                self.parse_type_declaration(checkpoint, SyntaxKind::StructDeclaration)
            }
            SyntaxKind::InterfaceKw => {
                self.parse_type_declaration(checkpoint, SyntaxKind::InterfaceDeclaration)
            }
            SyntaxKind::EnumKw => self.parse_enum_declaration(checkpoint),
            SyntaxKind::Ident
                if self.nth_at(1, SyntaxKind::LParen)
                    && enclosing_type.is_some_and(|name| name == self.current_text()) =>
            {
                self.parse_constructor(checkpoint)
            }
            _ => {
                let Some(after_type) = self.scan_type(0, true) else {
                    if self.pos != start {
                        self.builder
                            .start_node_at(checkpoint, SyntaxKind::Error.into());
                        self.error("Expected a member declaration");
                        self.builder.finish_node();
                    }
                    return;
                };

                if self.nth(after_type) != SyntaxKind::Ident {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::Error.into());
                    self.error("Expected a member name");
                    while !self.at_end()
                        && !self.at(SyntaxKind::Semicolon)
                        && !self.at(SyntaxKind::RBrace)
                        && !self.at(SyntaxKind::LBrace)
                    {
                        self.bump();
                    }
                    self.eat(SyntaxKind::Semicolon);
                    self.builder.finish_node();
                    return;
                }

                match self.nth(after_type + 1) {
                    SyntaxKind::LParen | SyntaxKind::Lt => self.parse_method(checkpoint),
                    SyntaxKind::LBrace | SyntaxKind::FatArrow => self.parse_property(checkpoint),
                    _ => self.parse_field(checkpoint),
                }
            }
        }
    }

    fn parse_using_directive(&mut self) {
        self.start_node(SyntaxKind::UsingDirective);
        self.bump(); // using
        self.eat(SyntaxKind::StaticKw);
        if self.at(SyntaxKind::Ident) && self.nth_at(1, SyntaxKind::Eq) {
            self.bump();
            self.bump();
        }
        self.parse_name();
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_namespace(&mut self) {
        self.start_node(SyntaxKind::NamespaceDeclaration);
        self.bump(); // namespace
        self.parse_name();

        if self.eat(SyntaxKind::Semicolon) {
            while !self.at_end() {
                let before = self.pos;
                self.parse_member(None);
                if self.pos == before {
                    self.error_and_bump("Expected a declaration");
                }
            }
        } else {
            self.expect(SyntaxKind::LBrace);
            self.parse_member_list(None);
            self.expect(SyntaxKind::RBrace);
        }
        self.finish_node();
    }

    fn parse_member_list(&mut self, enclosing_type: Option<&str>) {
        while !self.at(SyntaxKind::RBrace) && !self.at_end() {
            let before = self.pos;
            self.parse_member(enclosing_type);
            if self.pos == before {
                self.error_and_bump("Unexpected token in declaration list");
            }
        }
    }

    fn parse_name(&mut self) {
        if !self.at(SyntaxKind::Ident) {
            self.error("Expected a name");
            return;
        }
        self.start_node(SyntaxKind::Name);
        self.bump();
        while self.at(SyntaxKind::Dot) && self.nth_at(1, SyntaxKind::Ident) {
            self.bump();
            self.bump();
        }
        self.finish_node();
    }

    fn parse_attribute_list(&mut self) {
        self.start_node(SyntaxKind::AttributeList);
        self.bump(); // [
        loop {
            if self.at(SyntaxKind::Ident) {
                self.start_node(SyntaxKind::Attribute);
                self.parse_name();
                if self.at(SyntaxKind::LParen) {
                    self.parse_argument_list();
                }
                self.finish_node();
            } else {
                self.error("Expected an attribute");
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RBracket);
        self.finish_node();
    }

    fn parse_type_declaration(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
        self.bump(); // class / struct / interface

        let name = self.current_text().to_string();
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        if self.at(SyntaxKind::Colon) {
            self.parse_base_list();
        }
        self.skip_constraints();

        self.expect(SyntaxKind::LBrace);
        self.parse_member_list(Some(&name));
        self.expect(SyntaxKind::RBrace);
        self.eat(SyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    /// `where T : ...` clauses are kept verbatim inside an error-free node
    fn skip_constraints(&mut self) {
        while self.at(SyntaxKind::Ident) && self.current_text() == "where" {
            while !self.at_end() && !self.at(SyntaxKind::LBrace) && !self.at(SyntaxKind::Semicolon)
            {
                self.bump();
            }
        }
    }

    fn parse_enum_declaration(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::EnumDeclaration.into());
        self.bump(); // enum
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Colon) {
            self.parse_base_list();
        }

        self.expect(SyntaxKind::LBrace);
        while !self.at(SyntaxKind::RBrace) && !self.at_end() {
            let before = self.pos;
            if self.at(SyntaxKind::Ident) || self.at(SyntaxKind::LBracket) {
                self.parse_enum_member();
            }
            if !self.eat(SyntaxKind::Comma) {
                if self.pos == before {
                    self.error_and_bump("Expected an enum member");
                } else if !self.at(SyntaxKind::RBrace) {
                    self.error("Expected ',' or '}'");
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.eat(SyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    fn parse_enum_member(&mut self) {
        self.start_node(SyntaxKind::EnumMemberDeclaration);
        while self.at(SyntaxKind::LBracket) {
            self.parse_attribute_list();
        }
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Eq) {
            self.parse_equals_value_clause();
        }
        self.finish_node();
    }

    fn parse_type_parameter_list(&mut self) {
        self.start_node(SyntaxKind::TypeParameterList);
        self.bump(); // <
        loop {
            if self.at(SyntaxKind::Ident) {
                self.start_node(SyntaxKind::TypeParameter);
                self.bump();
                self.finish_node();
            } else {
                self.error("Expected a type parameter");
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::Gt);
        self.finish_node();
    }

    fn parse_base_list(&mut self) {
        self.start_node(SyntaxKind::BaseList);
        self.bump(); // :
        loop {
            self.parse_type();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.finish_node();
    }

    fn parse_constructor(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::ConstructorDeclaration.into());
        self.bump(); // name
        self.parse_parameter_list();

        if self.at(SyntaxKind::Colon) {
            self.start_node(SyntaxKind::ConstructorInitializer);
            self.bump(); // :
            if self.at(SyntaxKind::BaseKw) || self.at(SyntaxKind::ThisKw) {
                self.bump();
            } else {
                self.error("Expected 'base' or 'this'");
            }
            if self.at(SyntaxKind::LParen) {
                self.parse_argument_list();
            } else {
                self.error("Expected '('");
            }
            self.finish_node();
        }

        self.parse_body();
        self.builder.finish_node();
    }

    fn parse_method(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::MethodDeclaration.into());
        self.parse_type();
        self.bump(); // name
        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        self.parse_parameter_list();
        self.skip_constraints();
        self.parse_body();
        self.builder.finish_node();
    }

    /// Block body, expression body or a bare `;`
    fn parse_body(&mut self) {
        match self.current() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::FatArrow => {
                self.parse_arrow_expression_clause();
                self.expect(SyntaxKind::Semicolon);
            }
            _ => self.expect(SyntaxKind::Semicolon),
        }
    }

    fn parse_arrow_expression_clause(&mut self) {
        self.start_node(SyntaxKind::ArrowExpressionClause);
        self.bump(); // =>
        self.parse_expression();
        self.finish_node();
    }

    fn parse_property(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::PropertyDeclaration.into());
        self.parse_type();
        self.bump(); // name

        if self.at(SyntaxKind::FatArrow) {
            self.parse_arrow_expression_clause();
            self.expect(SyntaxKind::Semicolon);
        } else {
            self.parse_accessor_list();
            if self.at(SyntaxKind::Eq) {
                self.parse_equals_value_clause();
                self.expect(SyntaxKind::Semicolon);
            }
        }
        self.builder.finish_node();
    }

    fn parse_accessor_list(&mut self) {
        self.start_node(SyntaxKind::AccessorList);
        self.bump(); // {
        while !self.at(SyntaxKind::RBrace) && !self.at_end() {
            let before = self.pos;
            if self.at(SyntaxKind::Ident)
                || self.at(SyntaxKind::LBracket)
                || self.current().is_modifier()
            {
                self.start_node(SyntaxKind::AccessorDeclaration);
                while self.at(SyntaxKind::LBracket) {
                    self.parse_attribute_list();
                }
                while self.current().is_modifier() {
                    self.bump();
                }
                self.expect(SyntaxKind::Ident);
                self.parse_body();
                self.finish_node();
            }
            if self.pos == before {
                self.error_and_bump("Expected an accessor");
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_field(&mut self, checkpoint: Checkpoint) {
        self.builder
            .start_node_at(checkpoint, SyntaxKind::FieldDeclaration.into());
        self.parse_variable_declaration();
        self.expect(SyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        self.start_node(SyntaxKind::ParameterList);
        self.expect(SyntaxKind::LParen);
        if !self.at(SyntaxKind::RParen) {
            loop {
                let before = self.pos;
                self.parse_parameter();
                if self.pos == before {
                    self.error("Expected a parameter");
                    break;
                }
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_parameter(&mut self) {
        if !self.at(SyntaxKind::LBracket)
            && !self.at_parameter_modifier()
            && self.scan_type(0, true).is_none()
        {
            return;
        }
        self.start_node(SyntaxKind::Parameter);
        while self.at(SyntaxKind::LBracket) {
            self.parse_attribute_list();
        }
        while self.at_parameter_modifier() {
            self.bump();
        }
        self.parse_type();
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Eq) {
            self.parse_equals_value_clause();
        }
        self.finish_node();
    }

    fn at_parameter_modifier(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::RefKw
                | SyntaxKind::OutKw
                | SyntaxKind::InKw
                | SyntaxKind::ParamsKw
                | SyntaxKind::ThisKw
        )
    }

    fn parse_equals_value_clause(&mut self) {
        self.start_node(SyntaxKind::EqualsValueClause);
        self.bump(); // =
        self.parse_expression();
        self.finish_node();
    }

    /// Type followed by one or more declarators
    fn parse_variable_declaration(&mut self) {
        self.start_node(SyntaxKind::VariableDeclaration);
        self.parse_type();
        loop {
            if self.at(SyntaxKind::Ident) {
                self.start_node(SyntaxKind::VariableDeclarator);
                self.bump();
                if self.at(SyntaxKind::Eq) {
                    self.parse_equals_value_clause();
                }
                self.finish_node();
            } else {
                self.error("Expected a variable name");
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) {
        let kind = self.current();
        if !kind.is_predefined_type() && kind != SyntaxKind::Ident {
            self.error("Expected a type");
            return;
        }

        self.start_node(SyntaxKind::Type);
        self.bump();
        if kind == SyntaxKind::Ident {
            loop {
                if self.at(SyntaxKind::Lt) && self.scan_type_arguments(0).is_some() {
                    self.parse_type_argument_list();
                }
                if self.at(SyntaxKind::Dot) && self.nth_at(1, SyntaxKind::Ident) {
                    self.bump();
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.eat(SyntaxKind::Question);
        while self.at(SyntaxKind::LBracket)
            && matches!(self.nth(1), SyntaxKind::RBracket | SyntaxKind::Comma)
        {
            self.bump();
            while self.eat(SyntaxKind::Comma) {}
            self.expect(SyntaxKind::RBracket);
        }
        self.finish_node();
    }

    fn parse_type_argument_list(&mut self) {
        self.start_node(SyntaxKind::TypeArgumentList);
        self.bump(); // <
        loop {
            self.parse_type();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::Gt);
        self.finish_node();
    }

    /// Lookahead: if a type starts at significant token `n`, return the index
    /// just past it.
    fn scan_type(&self, n: usize, allow_nullable: bool) -> Option<usize> {
        let kind = self.nth(n);
        let mut i = n + 1;
        if kind == SyntaxKind::Ident {
            loop {
                if self.nth(i) == SyntaxKind::Lt {
                    i = self.scan_type_arguments(i)?;
                }
                if self.nth(i) == SyntaxKind::Dot && self.nth(i + 1) == SyntaxKind::Ident {
                    i += 2;
                } else {
                    break;
                }
            }
        } else if !kind.is_predefined_type() {
            return None;
        }

        if allow_nullable && self.nth(i) == SyntaxKind::Question {
            i += 1;
        }
        while self.nth(i) == SyntaxKind::LBracket {
            let mut j = i + 1;
            while self.nth(j) == SyntaxKind::Comma {
                j += 1;
            }
            if self.nth(j) != SyntaxKind::RBracket {
                break;
            }
            i = j + 1;
        }
        Some(i)
    }

    fn scan_type_arguments(&self, n: usize) -> Option<usize> {
        let mut i = n + 1;
        loop {
            i = self.scan_type(i, true)?;
            match self.nth(i) {
                SyntaxKind::Comma => i += 1,
                SyntaxKind::Gt => return Some(i + 1),
                _ => return None,
            }
        }
    }

    /// `Type name` followed by `=`, `;` or `,` starting at significant token `n`
    fn looks_like_local_declaration(&self, n: usize) -> bool {
        match self.scan_type(n, true) {
            Some(i) => {
                self.nth(i) == SyntaxKind::Ident
                    && matches!(
                        self.nth(i + 1),
                        SyntaxKind::Eq | SyntaxKind::Semicolon | SyntaxKind::Comma
                    )
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) {
        self.start_node(SyntaxKind::Block);
        self.bump(); // {
        while !self.at(SyntaxKind::RBrace) && !self.at_end() {
            let before = self.pos;
            self.parse_statement();
            if self.pos == before {
                self.error_and_bump("Expected a statement");
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_statement(&mut self) {
        match self.current() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::Semicolon => {
                self.start_node(SyntaxKind::EmptyStatement);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::IfKw => self.parse_if(),
            SyntaxKind::SwitchKw => self.parse_switch(),
            SyntaxKind::ReturnKw => self.parse_jump(SyntaxKind::ReturnStatement, true),
            SyntaxKind::ThrowKw => self.parse_jump(SyntaxKind::ThrowStatement, true),
            SyntaxKind::BreakKw => self.parse_jump(SyntaxKind::BreakStatement, false),
            SyntaxKind::ContinueKw => self.parse_jump(SyntaxKind::ContinueStatement, false),
            SyntaxKind::WhileKw => self.parse_while(),
            SyntaxKind::DoKw => self.parse_do(),
            SyntaxKind::ForKw => self.parse_for(),
            SyntaxKind::ForeachKw => self.parse_foreach(),
            SyntaxKind::TryKw => self.parse_try(),
            SyntaxKind::UsingKw if self.nth_at(1, SyntaxKind::LParen) => self.parse_using_statement(),
            SyntaxKind::UsingKw | SyntaxKind::ConstKw => {
                self.start_node(SyntaxKind::LocalDeclarationStatement);
                self.bump();
                self.parse_variable_declaration();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            _ if self.looks_like_local_declaration(0) => {
                self.start_node(SyntaxKind::LocalDeclarationStatement);
                self.parse_variable_declaration();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            _ if self.at_expression_start() => {
                self.start_node(SyntaxKind::ExpressionStatement);
                self.parse_expression();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            _ => {}
        }
    }

    /// `return`, `throw`, `break` and `continue`
    fn parse_jump(&mut self, kind: SyntaxKind, allows_expression: bool) {
        self.start_node(kind);
        self.bump();
        if allows_expression && !self.at(SyntaxKind::Semicolon) {
            self.parse_expression();
        }
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_parenthesized_condition(&mut self) {
        self.expect(SyntaxKind::LParen);
        self.parse_expression();
        self.expect(SyntaxKind::RParen);
    }

    fn parse_embedded_statement(&mut self) {
        let before = self.pos;
        self.parse_statement();
        if self.pos == before {
            self.error("Expected a statement");
        }
    }

    fn parse_if(&mut self) {
        self.start_node(SyntaxKind::IfStatement);
        self.bump(); // if
        self.parse_parenthesized_condition();
        self.parse_embedded_statement();
        if self.at(SyntaxKind::ElseKw) {
            self.start_node(SyntaxKind::ElseClause);
            self.bump();
            self.parse_embedded_statement();
            self.finish_node();
        }
        self.finish_node();
    }

    fn parse_switch(&mut self) {
        self.start_node(SyntaxKind::SwitchStatement);
        self.bump(); // switch
        self.parse_parenthesized_condition();
        self.expect(SyntaxKind::LBrace);
        while !self.at(SyntaxKind::RBrace) && !self.at_end() {
            if self.at_switch_label() {
                self.parse_switch_section();
            } else {
                self.error_and_bump("Expected 'case' or 'default'");
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn at_switch_label(&self) -> bool {
        self.at(SyntaxKind::CaseKw)
            || (self.at(SyntaxKind::DefaultKw) && self.nth_at(1, SyntaxKind::Colon))
    }

    fn parse_switch_section(&mut self) {
        self.start_node(SyntaxKind::SwitchSection);
        while self.at_switch_label() {
            if self.at(SyntaxKind::CaseKw) {
                self.start_node(SyntaxKind::CaseSwitchLabel);
                self.bump();
                self.parse_expression();
            } else {
                self.start_node(SyntaxKind::DefaultSwitchLabel);
                self.bump();
            }
            self.expect(SyntaxKind::Colon);
            self.finish_node();
        }
        while !self.at_switch_label() && !self.at(SyntaxKind::RBrace) && !self.at_end() {
            let before = self.pos;
            self.parse_statement();
            if self.pos == before {
                self.error_and_bump("Expected a statement");
            }
        }
        self.finish_node();
    }

    fn parse_while(&mut self) {
        self.start_node(SyntaxKind::WhileStatement);
        self.bump();
        self.parse_parenthesized_condition();
        self.parse_embedded_statement();
        self.finish_node();
    }

    fn parse_do(&mut self) {
        self.start_node(SyntaxKind::DoStatement);
        self.bump();
        self.parse_embedded_statement();
        self.expect(SyntaxKind::WhileKw);
        self.parse_parenthesized_condition();
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_for(&mut self) {
        self.start_node(SyntaxKind::ForStatement);
        self.bump(); // for
        self.expect(SyntaxKind::LParen);
        if self.looks_like_local_declaration(0) {
            self.parse_variable_declaration();
        } else {
            self.parse_expression_list(SyntaxKind::Semicolon);
        }
        self.expect(SyntaxKind::Semicolon);
        if !self.at(SyntaxKind::Semicolon) {
            self.parse_expression();
        }
        self.expect(SyntaxKind::Semicolon);
        self.parse_expression_list(SyntaxKind::RParen);
        self.expect(SyntaxKind::RParen);
        self.parse_embedded_statement();
        self.finish_node();
    }

    fn parse_expression_list(&mut self, terminator: SyntaxKind) {
        while !self.at(terminator) && self.at_expression_start() {
            self.parse_expression();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
    }

    fn parse_foreach(&mut self) {
        self.start_node(SyntaxKind::ForEachStatement);
        self.bump(); // foreach
        self.expect(SyntaxKind::LParen);
        self.parse_type();
        self.expect(SyntaxKind::Ident);
        self.expect(SyntaxKind::InKw);
        self.parse_expression();
        self.expect(SyntaxKind::RParen);
        self.parse_embedded_statement();
        self.finish_node();
    }

    fn parse_using_statement(&mut self) {
        self.start_node(SyntaxKind::UsingStatement);
        self.bump(); // using
        self.bump(); // (
        if self.looks_like_local_declaration(0) {
            self.parse_variable_declaration();
        } else {
            self.parse_expression();
        }
        self.expect(SyntaxKind::RParen);
        self.parse_embedded_statement();
        self.finish_node();
    }

    fn parse_try(&mut self) {
        self.start_node(SyntaxKind::TryStatement);
        self.bump(); // try
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.error("Expected '{'");
        }

        while self.at(SyntaxKind::CatchKw) {
            self.start_node(SyntaxKind::CatchClause);
            self.bump();
            if self.at(SyntaxKind::LParen) {
                self.start_node(SyntaxKind::CatchDeclaration);
                self.bump();
                self.parse_type();
                self.eat(SyntaxKind::Ident);
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            if self.at(SyntaxKind::LBrace) {
                self.parse_block();
            } else {
                self.error("Expected '{'");
            }
            self.finish_node();
        }

        if self.at(SyntaxKind::FinallyKw) {
            self.start_node(SyntaxKind::FinallyClause);
            self.bump();
            if self.at(SyntaxKind::LBrace) {
                self.parse_block();
            } else {
                self.error("Expected '{'");
            }
            self.finish_node();
        }
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn at_expression_start(&self) -> bool {
        let kind = self.current();
        kind.is_literal()
            || kind.is_predefined_type()
            || matches!(
                kind,
                SyntaxKind::Ident
                    | SyntaxKind::ThisKw
                    | SyntaxKind::BaseKw
                    | SyntaxKind::LParen
                    | SyntaxKind::NewKw
                    | SyntaxKind::TypeofKw
                    | SyntaxKind::DefaultKw
                    | SyntaxKind::LBrace
                    | SyntaxKind::Bang
                    | SyntaxKind::Minus
                    | SyntaxKind::Plus
                    | SyntaxKind::Tilde
                    | SyntaxKind::PlusPlus
                    | SyntaxKind::MinusMinus
            )
    }

    fn parse_expression(&mut self) {
        if !self.at_expression_start() {
            self.error("Expected an expression");
            return;
        }
        if self.at_lambda_start() {
            self.parse_lambda();
            return;
        }

        let checkpoint = self.checkpoint();
        self.parse_conditional();
        if is_assignment_operator(self.current()) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::AssignmentExpression.into());
            self.bump();
            self.parse_expression();
            self.builder.finish_node();
        }
    }

    fn at_lambda_start(&self) -> bool {
        if self.at(SyntaxKind::Ident) && self.nth_at(1, SyntaxKind::FatArrow) {
            return true;
        }
        if !self.at(SyntaxKind::LParen) {
            return false;
        }
        let mut depth = 0usize;
        let mut i = 0;
        loop {
            match self.nth(i) {
                SyntaxKind::LParen => depth += 1,
                SyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.nth(i + 1) == SyntaxKind::FatArrow;
                    }
                }
                SyntaxKind::EndOfFile | SyntaxKind::Semicolon | SyntaxKind::LBrace => {
                    return false;
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_lambda(&mut self) {
        self.start_node(SyntaxKind::LambdaExpression);
        if self.at(SyntaxKind::Ident) {
            self.start_node(SyntaxKind::Parameter);
            self.bump();
            self.finish_node();
        } else {
            self.start_node(SyntaxKind::ParameterList);
            self.bump(); // (
            while !self.at(SyntaxKind::RParen) && !self.at_end() {
                let before = self.pos;
                self.start_node(SyntaxKind::Parameter);
                if self.looks_like_typed_lambda_parameter() {
                    self.parse_type();
                }
                self.expect(SyntaxKind::Ident);
                self.finish_node();
                if !self.eat(SyntaxKind::Comma) {
                    if self.pos == before {
                        self.error_and_bump("Expected a parameter");
                    }
                    break;
                }
            }
            self.expect(SyntaxKind::RParen);
            self.finish_node();
        }
        self.expect(SyntaxKind::FatArrow);
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.parse_expression();
        }
        self.finish_node();
    }

    fn looks_like_typed_lambda_parameter(&self) -> bool {
        match self.scan_type(0, true) {
            Some(i) => self.nth(i) == SyntaxKind::Ident,
            None => false,
        }
    }

    fn parse_conditional(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_binary(0);
        if self.at(SyntaxKind::Question) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ConditionalExpression.into());
            self.bump();
            self.parse_expression();
            self.expect(SyntaxKind::Colon);
            self.parse_expression();
            self.builder.finish_node();
        }
    }

    /// Operator at the cursor: precedence and how many tokens it spans
    fn binary_operator(&self) -> Option<(u8, usize)> {
        let kind = self.current();
        if kind == SyntaxKind::Gt && self.adjacent_gt() {
            return Some((SHIFT_PRECEDENCE, 2));
        }
        binary_precedence(kind).map(|precedence| (precedence, 1))
    }

    /// `>` immediately followed by another `>` forms a right shift
    fn adjacent_gt(&self) -> bool {
        let index = self.nth_index(0);
        matches!(
            (self.tokens.get(index), self.tokens.get(index + 1)),
            (Some(first), Some(second))
                if first.kind == SyntaxKind::Gt && second.kind == SyntaxKind::Gt
        )
    }

    fn parse_binary(&mut self, min_precedence: u8) {
        let checkpoint = self.checkpoint();
        self.parse_unary();

        while let Some((precedence, width)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            let operator = self.current();
            self.builder
                .start_node_at(checkpoint, SyntaxKind::BinaryExpression.into());
            for _ in 0..width {
                self.bump();
            }

            if matches!(operator, SyntaxKind::IsKw | SyntaxKind::AsKw)
                && (self.current().is_predefined_type() || self.at(SyntaxKind::Ident))
                && !self.nth_at(1, SyntaxKind::Dot)
            {
                self.parse_type();
            } else if operator == SyntaxKind::QuestionQuestion {
                self.parse_binary(precedence);
            } else {
                self.parse_binary(precedence + 1);
            }
            self.builder.finish_node();
        }
    }

    fn parse_unary(&mut self) {
        match self.current() {
            SyntaxKind::Bang
            | SyntaxKind::Minus
            | SyntaxKind::Plus
            | SyntaxKind::Tilde
            | SyntaxKind::PlusPlus
            | SyntaxKind::MinusMinus => {
                self.start_node(SyntaxKind::PrefixUnaryExpression);
                self.bump();
                self.parse_unary();
                self.finish_node();
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) {
        let checkpoint = self.checkpoint();
        if !self.parse_primary() {
            return;
        }

        loop {
            match self.current() {
                SyntaxKind::Dot | SyntaxKind::QuestionDot => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::MemberAccessExpression.into());
                    self.bump();
                    if self.at(SyntaxKind::Ident) {
                        self.parse_identifier_name();
                    } else {
                        self.error("Expected a member name");
                    }
                    self.builder.finish_node();
                }
                SyntaxKind::LParen => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::InvocationExpression.into());
                    self.parse_argument_list();
                    self.builder.finish_node();
                }
                SyntaxKind::LBracket => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ElementAccessExpression.into());
                    self.parse_bracketed_argument_list();
                    self.builder.finish_node();
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::PostfixUnaryExpression.into());
                    self.bump();
                    self.builder.finish_node();
                }
                _ => break,
            }
        }
    }

    fn parse_identifier_name(&mut self) {
        self.start_node(SyntaxKind::IdentifierName);
        self.bump();
        self.finish_node();
    }

    /// Returns false when no primary expression starts at the cursor
    fn parse_primary(&mut self) -> bool {
        let kind = self.current();
        match kind {
            _ if kind.is_literal() => {
                self.start_node(SyntaxKind::LiteralExpression);
                self.bump();
                self.finish_node();
            }
            _ if kind.is_predefined_type() => self.parse_type(),
            SyntaxKind::Ident => self.parse_identifier_name(),
            SyntaxKind::ThisKw => {
                self.start_node(SyntaxKind::ThisExpression);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::BaseKw => {
                self.start_node(SyntaxKind::BaseExpression);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::LParen => {
                self.start_node(SyntaxKind::ParenthesizedExpression);
                self.bump();
                self.parse_expression();
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            SyntaxKind::NewKw => self.parse_object_creation(),
            SyntaxKind::TypeofKw => {
                self.start_node(SyntaxKind::TypeOfExpression);
                self.bump();
                self.expect(SyntaxKind::LParen);
                self.parse_type();
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            SyntaxKind::DefaultKw => {
                self.start_node(SyntaxKind::DefaultExpression);
                self.bump();
                if self.at(SyntaxKind::LParen) {
                    self.bump();
                    self.parse_type();
                    self.expect(SyntaxKind::RParen);
                }
                self.finish_node();
            }
            SyntaxKind::LBrace => self.parse_initializer(),
            _ => {
                self.error("Expected an expression");
                return false;
            }
        }
        true
    }

    fn parse_object_creation(&mut self) {
        self.start_node(SyntaxKind::ObjectCreationExpression);
        self.bump(); // new
        if self.current().is_predefined_type() || self.at(SyntaxKind::Ident) {
            self.parse_type();
        }
        if self.at(SyntaxKind::LBracket) {
            self.parse_bracketed_argument_list();
        }
        if self.at(SyntaxKind::LParen) {
            self.parse_argument_list();
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_initializer();
        }
        self.finish_node();
    }

    fn parse_initializer(&mut self) {
        self.start_node(SyntaxKind::InitializerExpression);
        self.bump(); // {
        while !self.at(SyntaxKind::RBrace) && !self.at_end() {
            let before = self.pos;
            self.parse_expression();
            if !self.eat(SyntaxKind::Comma) {
                if self.pos == before {
                    self.error_and_bump("Expected an initializer element");
                } else {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_argument_list(&mut self) {
        self.start_node(SyntaxKind::ArgumentList);
        self.bump(); // (
        self.parse_arguments(SyntaxKind::RParen);
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_bracketed_argument_list(&mut self) {
        self.start_node(SyntaxKind::BracketedArgumentList);
        self.bump(); // [
        self.parse_arguments(SyntaxKind::RBracket);
        self.expect(SyntaxKind::RBracket);
        self.finish_node();
    }

    fn parse_arguments(&mut self, terminator: SyntaxKind) {
        while !self.at(terminator) && !self.at_end() {
            let named = self.at(SyntaxKind::Ident) && self.nth_at(1, SyntaxKind::Colon);
            let has_modifier = matches!(
                self.current(),
                SyntaxKind::RefKw | SyntaxKind::OutKw | SyntaxKind::InKw
            );
            if !named && !has_modifier && !self.at_expression_start() {
                self.error("Expected an argument");
                break;
            }

            self.start_node(SyntaxKind::Argument);
            if named {
                self.bump();
                self.bump();
            }
            if has_modifier {
                self.bump();
                if self.looks_like_local_declaration_name() {
                    self.parse_type();
                }
            }
            self.parse_expression();
            self.finish_node();

            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
    }

    /// `out var x` / `out int x`
    fn looks_like_local_declaration_name(&self) -> bool {
        match self.scan_type(0, false) {
            Some(i) => i > 0 && self.nth(i) == SyntaxKind::Ident,
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    /// Index of the `n`-th significant token at or after the cursor
    fn nth_index(&self, n: usize) -> usize {
        let last = self.tokens.len().saturating_sub(1);
        let mut index = self.pos;
        let mut remaining = n;
        while index < last {
            if !self.tokens[index].kind.is_trivia() {
                if remaining == 0 {
                    return index;
                }
                remaining -= 1;
            }
            index += 1;
        }
        last
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.nth_index(n))
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EndOfFile)
    }

    fn nth_at(&self, n: usize, kind: SyntaxKind) -> bool {
        self.nth(n) == kind
    }

    fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn current_text(&self) -> &str {
        self.tokens
            .get(self.nth_index(0))
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_end(&self) -> bool {
        self.at(SyntaxKind::EndOfFile)
    }

    /// Emit pending trivia into the currently open node
    fn flush_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(token.kind.into(), &token.text);
            self.pos += 1;
        }
    }

    fn bump(&mut self) {
        self.flush_trivia();
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        if token.kind != SyntaxKind::EndOfFile {
            self.builder.token(token.kind.into(), &token.text);
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) {
        if !self.eat(kind) {
            self.error(format!("Expected {kind:?}"));
        }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self
            .tokens
            .get(self.nth_index(0))
            .map(|t| text_range(&t.span))
            .unwrap_or_default();
        self.errors.push(ParseError::new(message, range));
    }

    fn error_and_bump(&mut self, message: &str) {
        if self.at_end() {
            self.error(message);
            return;
        }
        self.error(message);
        self.start_node(SyntaxKind::Error);
        self.bump();
        self.finish_node();
    }
}
