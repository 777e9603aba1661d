//! Typed AST layer over the CST
//!
//! Thin, zero-cost wrappers over [`SyntaxNode`]s. Every accessor returns an
//! `Option` or an iterator: erroneous trees routinely lack children, and a
//! missing child is a "no match" for the caller, never a failure.
//!
//! ```ignore
//! let tree = SyntaxTree::parse("enum E { A = 1 }");
//! let decl = tree.root().descendants().find_map(EnumDeclaration::cast).unwrap();
//! assert_eq!(decl.name().as_deref(), Some("E"));
//! ```

use super::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

/// First child node of a specific kind
pub fn child_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// First direct token child of a specific kind
pub fn token_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// Last direct token child of a specific kind
fn last_token_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == kind)
        .last()
}

fn ident_text(node: &SyntaxNode) -> Option<String> {
    token_of_kind(node, SyntaxKind::Ident).map(|t| t.text().to_string())
}

/// Whether a node kind is an expression
pub fn is_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LiteralExpression
            | SyntaxKind::IdentifierName
            | SyntaxKind::ThisExpression
            | SyntaxKind::BaseExpression
            | SyntaxKind::ParenthesizedExpression
            | SyntaxKind::MemberAccessExpression
            | SyntaxKind::InvocationExpression
            | SyntaxKind::ElementAccessExpression
            | SyntaxKind::ObjectCreationExpression
            | SyntaxKind::InitializerExpression
            | SyntaxKind::BinaryExpression
            | SyntaxKind::AssignmentExpression
            | SyntaxKind::ConditionalExpression
            | SyntaxKind::PrefixUnaryExpression
            | SyntaxKind::PostfixUnaryExpression
            | SyntaxKind::TypeOfExpression
            | SyntaxKind::DefaultExpression
            | SyntaxKind::LambdaExpression
            // predefined-type member access such as `string.Empty`
            | SyntaxKind::Type
    )
}

fn expressions(node: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> + use<> {
    node.children().filter(|n| is_expression(n.kind()))
}

fn first_expression(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children().find(|n| is_expression(n.kind()) && n.kind() != SyntaxKind::Type)
}

fn statements(node: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> + use<> {
    node.children().filter(|n| n.kind().is_statement())
}

fn has_modifier(node: &SyntaxNode, kind: SyntaxKind) -> bool {
    modifiers(node).any(|t| t.kind() == kind)
}

fn modifiers(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> + use<> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind().is_modifier())
}

// ============================================================================
// Declarations
// ============================================================================

ast_node!(
    /// Root of a document
    CompilationUnit,
    CompilationUnit
);

impl CompilationUnit {
    pub fn members(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind().is_member_declaration())
    }

    pub fn usings(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind() == SyntaxKind::UsingDirective)
    }
}

ast_node!(NamespaceDeclaration, NamespaceDeclaration);

impl NamespaceDeclaration {
    pub fn name(&self) -> Option<String> {
        child_of_kind(&self.syntax, SyntaxKind::Name).map(|n| n.text().to_string())
    }

    pub fn members(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind().is_member_declaration())
    }
}

ast_node!(
    /// Class, struct or interface declaration
    TypeDeclaration,
    ClassDeclaration | StructDeclaration | InterfaceDeclaration
);

impl TypeDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        ident_text(&self.syntax)
    }

    pub fn is_static(&self) -> bool {
        has_modifier(&self.syntax, SyntaxKind::StaticKw)
    }

    pub fn has_modifier(&self, kind: SyntaxKind) -> bool {
        has_modifier(&self.syntax, kind)
    }

    pub fn base_list(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::BaseList)
    }

    pub fn members(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind().is_member_declaration())
    }

    pub fn constructors(&self) -> impl Iterator<Item = ConstructorDeclaration> + use<> {
        self.syntax.children().filter_map(ConstructorDeclaration::cast)
    }

    pub fn open_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<SyntaxToken> {
        last_token_of_kind(&self.syntax, SyntaxKind::RBrace)
    }
}

ast_node!(EnumDeclaration, EnumDeclaration);

impl EnumDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        ident_text(&self.syntax)
    }

    /// Underlying type from `enum E : byte`
    pub fn base_list(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::BaseList)
    }

    pub fn members(&self) -> impl Iterator<Item = EnumMemberDeclaration> + use<> {
        self.syntax.children().filter_map(EnumMemberDeclaration::cast)
    }

    pub fn open_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<SyntaxToken> {
        last_token_of_kind(&self.syntax, SyntaxKind::RBrace)
    }

    /// Separator commas between members, in order
    pub fn commas(&self) -> impl Iterator<Item = SyntaxToken> + use<> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Comma)
    }
}

ast_node!(EnumMemberDeclaration, EnumMemberDeclaration);

impl EnumMemberDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        ident_text(&self.syntax)
    }

    pub fn equals_value(&self) -> Option<EqualsValueClause> {
        self.syntax.children().find_map(EqualsValueClause::cast)
    }

    /// Initializer expression, if any
    pub fn value(&self) -> Option<SyntaxNode> {
        self.equals_value().and_then(|clause| clause.value())
    }
}

ast_node!(EqualsValueClause, EqualsValueClause);

impl EqualsValueClause {
    pub fn value(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }
}

ast_node!(FieldDeclaration, FieldDeclaration);

impl FieldDeclaration {
    pub fn is_const(&self) -> bool {
        has_modifier(&self.syntax, SyntaxKind::ConstKw)
    }

    pub fn is_static(&self) -> bool {
        self.is_const() || has_modifier(&self.syntax, SyntaxKind::StaticKw)
    }

    pub fn declaration(&self) -> Option<VariableDeclaration> {
        self.syntax.children().find_map(VariableDeclaration::cast)
    }
}

ast_node!(VariableDeclaration, VariableDeclaration);

impl VariableDeclaration {
    pub fn ty(&self) -> Option<TypeSyntax> {
        self.syntax.children().find_map(TypeSyntax::cast)
    }

    pub fn declarators(&self) -> impl Iterator<Item = VariableDeclarator> + use<> {
        self.syntax.children().filter_map(VariableDeclarator::cast)
    }
}

ast_node!(VariableDeclarator, VariableDeclarator);

impl VariableDeclarator {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        ident_text(&self.syntax)
    }

    pub fn initializer(&self) -> Option<SyntaxNode> {
        self.syntax
            .children()
            .find_map(EqualsValueClause::cast)
            .and_then(|clause| clause.value())
    }
}

ast_node!(
    /// A written type: `int`, `List<string>`, `int?`, `Foo.Bar[]`
    TypeSyntax,
    Type
);

impl TypeSyntax {
    /// Source text of the type without trivia
    pub fn text(&self) -> String {
        self.syntax
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| !t.kind().is_trivia())
            .map(|t| t.text().to_string())
            .collect()
    }

    /// Leading predefined keyword, e.g. `BoolKw` for `bool?`
    pub fn predefined(&self) -> Option<SyntaxKind> {
        self.syntax
            .first_token()
            .map(|t| t.kind())
            .filter(|k| k.is_predefined_type())
    }

    /// Simple name: `Bar` for `Foo.Bar<int>`
    pub fn simple_name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident || t.kind().is_predefined_type())
            .last()
            .map(|t| t.text().to_string())
    }

    pub fn is_nullable(&self) -> bool {
        token_of_kind(&self.syntax, SyntaxKind::Question).is_some()
    }

    pub fn is_array(&self) -> bool {
        token_of_kind(&self.syntax, SyntaxKind::LBracket).is_some()
    }

    pub fn type_arguments(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::TypeArgumentList)
    }
}

ast_node!(MethodDeclaration, MethodDeclaration);

impl MethodDeclaration {
    pub fn name(&self) -> Option<String> {
        ident_text(&self.syntax)
    }

    pub fn return_type(&self) -> Option<TypeSyntax> {
        self.syntax.children().find_map(TypeSyntax::cast)
    }

    pub fn is_static(&self) -> bool {
        has_modifier(&self.syntax, SyntaxKind::StaticKw)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        self.syntax.children().find_map(ParameterList::cast)
    }

    pub fn body(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }
}

ast_node!(ConstructorDeclaration, ConstructorDeclaration);

impl ConstructorDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn modifiers(&self) -> impl Iterator<Item = SyntaxToken> + use<> {
        modifiers(&self.syntax)
    }

    pub fn has_modifier(&self, kind: SyntaxKind) -> bool {
        has_modifier(&self.syntax, kind)
    }

    pub fn attribute_lists(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind() == SyntaxKind::AttributeList)
    }

    pub fn parameter_list(&self) -> Option<ParameterList> {
        self.syntax.children().find_map(ParameterList::cast)
    }

    pub fn initializer(&self) -> Option<ConstructorInitializer> {
        self.syntax.children().find_map(ConstructorInitializer::cast)
    }

    pub fn body(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }

    pub fn expression_body(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::ArrowExpressionClause)
    }
}

ast_node!(ConstructorInitializer, ConstructorInitializer);

impl ConstructorInitializer {
    pub fn is_base(&self) -> bool {
        token_of_kind(&self.syntax, SyntaxKind::BaseKw).is_some()
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        self.syntax.children().find_map(ArgumentList::cast)
    }
}

ast_node!(PropertyDeclaration, PropertyDeclaration);

impl PropertyDeclaration {
    pub fn name(&self) -> Option<String> {
        ident_text(&self.syntax)
    }

    pub fn ty(&self) -> Option<TypeSyntax> {
        self.syntax.children().find_map(TypeSyntax::cast)
    }

    pub fn is_static(&self) -> bool {
        has_modifier(&self.syntax, SyntaxKind::StaticKw)
    }
}

ast_node!(ParameterList, ParameterList);

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + use<> {
        self.syntax.children().filter_map(Parameter::cast)
    }
}

ast_node!(Parameter, Parameter);

impl Parameter {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        last_token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().to_string())
    }

    pub fn ty(&self) -> Option<TypeSyntax> {
        self.syntax.children().find_map(TypeSyntax::cast)
    }
}

// ============================================================================
// Statements
// ============================================================================

ast_node!(Block, Block);

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        statements(&self.syntax)
    }

    pub fn open_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<SyntaxToken> {
        last_token_of_kind(&self.syntax, SyntaxKind::RBrace)
    }
}

ast_node!(LocalDeclarationStatement, LocalDeclarationStatement);

impl LocalDeclarationStatement {
    /// `using var x = ...;`
    pub fn is_using(&self) -> bool {
        token_of_kind(&self.syntax, SyntaxKind::UsingKw).is_some()
    }

    pub fn is_const(&self) -> bool {
        token_of_kind(&self.syntax, SyntaxKind::ConstKw).is_some()
    }

    pub fn declaration(&self) -> Option<VariableDeclaration> {
        self.syntax.children().find_map(VariableDeclaration::cast)
    }
}

ast_node!(ExpressionStatement, ExpressionStatement);

impl ExpressionStatement {
    pub fn expression(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }
}

ast_node!(IfStatement, IfStatement);

impl IfStatement {
    pub fn if_keyword(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::IfKw)
    }

    pub fn condition(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }

    pub fn statement(&self) -> Option<SyntaxNode> {
        statements(&self.syntax).next()
    }

    pub fn else_clause(&self) -> Option<ElseClause> {
        self.syntax.children().find_map(ElseClause::cast)
    }
}

ast_node!(ElseClause, ElseClause);

impl ElseClause {
    pub fn statement(&self) -> Option<SyntaxNode> {
        statements(&self.syntax).next()
    }
}

ast_node!(ThrowStatement, ThrowStatement);

impl ThrowStatement {
    pub fn expression(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }
}

ast_node!(SwitchStatement, SwitchStatement);

impl SwitchStatement {
    pub fn expression(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }

    pub fn sections(&self) -> impl Iterator<Item = SwitchSection> + use<> {
        self.syntax.children().filter_map(SwitchSection::cast)
    }

    pub fn open_brace(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<SyntaxToken> {
        last_token_of_kind(&self.syntax, SyntaxKind::RBrace)
    }
}

ast_node!(SwitchSection, SwitchSection);

impl SwitchSection {
    pub fn labels(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax.children().filter(|n| {
            matches!(
                n.kind(),
                SyntaxKind::CaseSwitchLabel | SyntaxKind::DefaultSwitchLabel
            )
        })
    }

    pub fn statements(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        statements(&self.syntax)
    }

    /// The section's only statement when it is a block
    pub fn sole_block(&self) -> Option<Block> {
        let mut statements = self.statements();
        let first = statements.next()?;
        if statements.next().is_some() {
            return None;
        }
        Block::cast(first)
    }
}

// ============================================================================
// Expressions
// ============================================================================

ast_node!(BinaryExpression, BinaryExpression);

impl BinaryExpression {
    pub fn lhs(&self) -> Option<SyntaxNode> {
        expressions(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<SyntaxNode> {
        expressions(&self.syntax).nth(1)
    }

    pub fn operator_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    /// Operator kind; `>>` reports `Gt`, see [`BinaryExpression::is_right_shift`]
    pub fn operator(&self) -> Option<SyntaxKind> {
        self.operator_token().map(|t| t.kind())
    }

    pub fn is_right_shift(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Gt)
            .count()
            == 2
    }
}

ast_node!(PrefixUnaryExpression, PrefixUnaryExpression);

impl PrefixUnaryExpression {
    pub fn operator(&self) -> Option<SyntaxKind> {
        self.syntax.first_token().map(|t| t.kind())
    }

    pub fn operand(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }
}

ast_node!(ParenthesizedExpression, ParenthesizedExpression);

impl ParenthesizedExpression {
    pub fn expression(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }
}

ast_node!(LiteralExpression, LiteralExpression);

impl LiteralExpression {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax.first_token()
    }

    pub fn kind(&self) -> Option<SyntaxKind> {
        self.token().map(|t| t.kind())
    }
}

ast_node!(IdentifierName, IdentifierName);

impl IdentifierName {
    pub fn ident(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn text(&self) -> Option<String> {
        ident_text(&self.syntax)
    }
}

ast_node!(MemberAccessExpression, MemberAccessExpression);

impl MemberAccessExpression {
    /// Receiver, e.g. `Foo` in `Foo.Bar`; may be a predefined `Type`
    pub fn expression(&self) -> Option<SyntaxNode> {
        expressions(&self.syntax).next()
    }

    pub fn name(&self) -> Option<IdentifierName> {
        self.syntax.children().filter_map(IdentifierName::cast).last()
    }

    pub fn is_conditional(&self) -> bool {
        token_of_kind(&self.syntax, SyntaxKind::QuestionDot).is_some()
    }
}

ast_node!(InvocationExpression, InvocationExpression);

impl InvocationExpression {
    pub fn expression(&self) -> Option<SyntaxNode> {
        expressions(&self.syntax).next()
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        self.syntax.children().find_map(ArgumentList::cast)
    }
}

ast_node!(ObjectCreationExpression, ObjectCreationExpression);

impl ObjectCreationExpression {
    pub fn ty(&self) -> Option<TypeSyntax> {
        self.syntax.children().find_map(TypeSyntax::cast)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        self.syntax.children().find_map(ArgumentList::cast)
    }

    pub fn initializer(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::InitializerExpression)
    }
}

ast_node!(ArgumentList, ArgumentList);

impl ArgumentList {
    pub fn arguments(&self) -> impl Iterator<Item = Argument> + use<> {
        self.syntax.children().filter_map(Argument::cast)
    }
}

ast_node!(Argument, Argument);

impl Argument {
    pub fn expression(&self) -> Option<SyntaxNode> {
        first_expression(&self.syntax)
    }

    /// `name:` prefix of a named argument
    pub fn name(&self) -> Option<String> {
        let colon = token_of_kind(&self.syntax, SyntaxKind::Colon)?;
        colon
            .prev_token()
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| t.text().to_string())
    }

    pub fn ref_kind(&self) -> Option<SyntaxKind> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .map(|t| t.kind())
            .find(|k| matches!(k, SyntaxKind::RefKw | SyntaxKind::OutKw | SyntaxKind::InKw))
    }
}
