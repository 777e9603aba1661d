//! Syntax kinds for the host language
//!
//! One flat enum covers trivia, tokens and nodes, the way rowan expects.
//! Discriminants are assigned in declaration order starting at zero, which
//! lets [`SyntaxKind::from_raw`] index straight into [`SyntaxKind::ALL`].

macro_rules! syntax_kinds {
    ($($kind:ident),* $(,)?) => {
        /// Every token, trivia and node kind of the host language
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($kind),*
        }

        impl SyntaxKind {
            /// All kinds, indexed by their raw value
            pub const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$kind),*];
        }
    };
}

syntax_kinds! {
    // Trivia
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    DocComment,
    IfDirective,
    ElifDirective,
    ElseDirective,
    EndIfDirective,
    RegionDirective,
    EndRegionDirective,
    OtherDirective,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Question,
    QuestionQuestion,
    QuestionDot,
    QuestionQuestionEq,
    Eq,
    EqEq,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    LtLt,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LtLtEq,
    FatArrow,

    // Literals and identifiers
    IntLiteral,
    RealLiteral,
    StringLiteral,
    CharLiteral,
    Ident,

    // Keywords
    UsingKw,
    NamespaceKw,
    ClassKw,
    StructKw,
    InterfaceKw,
    EnumKw,
    PublicKw,
    PrivateKw,
    ProtectedKw,
    InternalKw,
    StaticKw,
    ReadonlyKw,
    SealedKw,
    AbstractKw,
    VirtualKw,
    OverrideKw,
    ConstKw,
    NewKw,
    ExternKw,
    UnsafeKw,
    VolatileKw,
    PartialKw,
    AsyncKw,
    ThisKw,
    BaseKw,
    NullKw,
    TrueKw,
    FalseKw,
    IfKw,
    ElseKw,
    SwitchKw,
    CaseKw,
    DefaultKw,
    ReturnKw,
    ThrowKw,
    BreakKw,
    ContinueKw,
    WhileKw,
    DoKw,
    ForKw,
    ForeachKw,
    InKw,
    TryKw,
    CatchKw,
    FinallyKw,
    IsKw,
    AsKw,
    OutKw,
    RefKw,
    ParamsKw,
    TypeofKw,
    VoidKw,
    BoolKw,
    ByteKw,
    SbyteKw,
    ShortKw,
    UshortKw,
    IntKw,
    UintKw,
    LongKw,
    UlongKw,
    CharKw,
    FloatKw,
    DoubleKw,
    DecimalKw,
    StringKw,
    ObjectKw,

    // Special tokens
    EndOfFile,
    ErrorToken,

    // Declarations
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    Name,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    AttributeList,
    Attribute,
    TypeParameterList,
    TypeParameter,
    BaseList,
    Type,
    TypeArgumentList,
    FieldDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    EqualsValueClause,
    MethodDeclaration,
    ConstructorDeclaration,
    ConstructorInitializer,
    PropertyDeclaration,
    AccessorList,
    AccessorDeclaration,
    ParameterList,
    Parameter,
    ArrowExpressionClause,
    EnumMemberDeclaration,

    // Statements
    Block,
    LocalDeclarationStatement,
    ExpressionStatement,
    IfStatement,
    ElseClause,
    SwitchStatement,
    SwitchSection,
    CaseSwitchLabel,
    DefaultSwitchLabel,
    ReturnStatement,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForEachStatement,
    UsingStatement,
    TryStatement,
    CatchClause,
    CatchDeclaration,
    FinallyClause,
    EmptyStatement,

    // Expressions
    LiteralExpression,
    IdentifierName,
    ThisExpression,
    BaseExpression,
    ParenthesizedExpression,
    MemberAccessExpression,
    InvocationExpression,
    ArgumentList,
    Argument,
    ElementAccessExpression,
    BracketedArgumentList,
    ObjectCreationExpression,
    InitializerExpression,
    BinaryExpression,
    AssignmentExpression,
    ConditionalExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    TypeOfExpression,
    DefaultExpression,
    LambdaExpression,

    // Recovery
    Error,
}

impl SyntaxKind {
    /// Map a raw rowan kind back to a `SyntaxKind`
    pub fn from_raw(raw: u16) -> Self {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(SyntaxKind::Error)
    }

    /// Formatting-only tokens: whitespace, line breaks, comments, directives
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::Newline
        ) || self.is_comment()
            || self.is_directive()
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            SyntaxKind::LineComment | SyntaxKind::BlockComment | SyntaxKind::DocComment
        )
    }

    /// Preprocessor directive trivia (`#if`, `#region`, `#pragma`, ...)
    pub fn is_directive(self) -> bool {
        matches!(
            self,
            SyntaxKind::IfDirective
                | SyntaxKind::ElifDirective
                | SyntaxKind::ElseDirective
                | SyntaxKind::EndIfDirective
                | SyntaxKind::RegionDirective
                | SyntaxKind::EndRegionDirective
                | SyntaxKind::OtherDirective
        )
    }

    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::UsingKw && self <= SyntaxKind::ObjectKw
    }

    /// Keywords naming built-in types (`int`, `string`, ...)
    pub fn is_predefined_type(self) -> bool {
        self >= SyntaxKind::VoidKw && self <= SyntaxKind::ObjectKw
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::PublicKw
                | SyntaxKind::PrivateKw
                | SyntaxKind::ProtectedKw
                | SyntaxKind::InternalKw
                | SyntaxKind::StaticKw
                | SyntaxKind::ReadonlyKw
                | SyntaxKind::SealedKw
                | SyntaxKind::AbstractKw
                | SyntaxKind::VirtualKw
                | SyntaxKind::OverrideKw
                | SyntaxKind::ConstKw
                | SyntaxKind::NewKw
                | SyntaxKind::ExternKw
                | SyntaxKind::UnsafeKw
                | SyntaxKind::VolatileKw
                | SyntaxKind::PartialKw
                | SyntaxKind::AsyncKw
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::RealLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::NullKw
                | SyntaxKind::TrueKw
                | SyntaxKind::FalseKw
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::LocalDeclarationStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::IfStatement
                | SyntaxKind::SwitchStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::BreakStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::UsingStatement
                | SyntaxKind::TryStatement
                | SyntaxKind::EmptyStatement
        )
    }

    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::EnumDeclaration
        )
    }

    pub fn is_member_declaration(self) -> bool {
        self.is_type_declaration()
            || matches!(
                self,
                SyntaxKind::NamespaceDeclaration
                    | SyntaxKind::FieldDeclaration
                    | SyntaxKind::MethodDeclaration
                    | SyntaxKind::ConstructorDeclaration
                    | SyntaxKind::PropertyDeclaration
                    | SyntaxKind::EnumMemberDeclaration
            )
    }
}

/// Look up the keyword kind for an identifier-shaped word
pub fn keyword_kind(word: &str) -> Option<SyntaxKind> {
    let kind = match word {
        "using" => SyntaxKind::UsingKw,
        "namespace" => SyntaxKind::NamespaceKw,
        "class" => SyntaxKind::ClassKw,
        "struct" => SyntaxKind::StructKw,
        "interface" => SyntaxKind::InterfaceKw,
        "enum" => SyntaxKind::EnumKw,
        "public" => SyntaxKind::PublicKw,
        "private" => SyntaxKind::PrivateKw,
        "protected" => SyntaxKind::ProtectedKw,
        "internal" => SyntaxKind::InternalKw,
        "static" => SyntaxKind::StaticKw,
        "readonly" => SyntaxKind::ReadonlyKw,
        "sealed" => SyntaxKind::SealedKw,
        "abstract" => SyntaxKind::AbstractKw,
        "virtual" => SyntaxKind::VirtualKw,
        "override" => SyntaxKind::OverrideKw,
        "const" => SyntaxKind::ConstKw,
        "new" => SyntaxKind::NewKw,
        "extern" => SyntaxKind::ExternKw,
        "unsafe" => SyntaxKind::UnsafeKw,
        "volatile" => SyntaxKind::VolatileKw,
        "partial" => SyntaxKind::PartialKw,
        "async" => SyntaxKind::AsyncKw,
        "this" => SyntaxKind::ThisKw,
        "base" => SyntaxKind::BaseKw,
        "null" => SyntaxKind::NullKw,
        "true" => SyntaxKind::TrueKw,
        "false" => SyntaxKind::FalseKw,
        "if" => SyntaxKind::IfKw,
        "else" => SyntaxKind::ElseKw,
        "switch" => SyntaxKind::SwitchKw,
        "case" => SyntaxKind::CaseKw,
        "default" => SyntaxKind::DefaultKw,
        "return" => SyntaxKind::ReturnKw,
        "throw" => SyntaxKind::ThrowKw,
        "break" => SyntaxKind::BreakKw,
        "continue" => SyntaxKind::ContinueKw,
        "while" => SyntaxKind::WhileKw,
        "do" => SyntaxKind::DoKw,
        "for" => SyntaxKind::ForKw,
        "foreach" => SyntaxKind::ForeachKw,
        "in" => SyntaxKind::InKw,
        "try" => SyntaxKind::TryKw,
        "catch" => SyntaxKind::CatchKw,
        "finally" => SyntaxKind::FinallyKw,
        "is" => SyntaxKind::IsKw,
        "as" => SyntaxKind::AsKw,
        "out" => SyntaxKind::OutKw,
        "ref" => SyntaxKind::RefKw,
        "params" => SyntaxKind::ParamsKw,
        "typeof" => SyntaxKind::TypeofKw,
        "void" => SyntaxKind::VoidKw,
        "bool" => SyntaxKind::BoolKw,
        "byte" => SyntaxKind::ByteKw,
        "sbyte" => SyntaxKind::SbyteKw,
        "short" => SyntaxKind::ShortKw,
        "ushort" => SyntaxKind::UshortKw,
        "int" => SyntaxKind::IntKw,
        "uint" => SyntaxKind::UintKw,
        "long" => SyntaxKind::LongKw,
        "ulong" => SyntaxKind::UlongKw,
        "char" => SyntaxKind::CharKw,
        "float" => SyntaxKind::FloatKw,
        "double" => SyntaxKind::DoubleKw,
        "decimal" => SyntaxKind::DecimalKw,
        "string" => SyntaxKind::StringKw,
        "object" => SyntaxKind::ObjectKw,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        for (index, kind) in SyntaxKind::ALL.iter().enumerate() {
            assert_eq!(*kind as u16 as usize, index);
            assert_eq!(SyntaxKind::from_raw(index as u16), *kind);
        }
    }

    #[test]
    fn test_unknown_raw_maps_to_error() {
        assert_eq!(SyntaxKind::from_raw(u16::MAX), SyntaxKind::Error);
    }

    #[test]
    fn test_trivia_classes() {
        assert!(SyntaxKind::Whitespace.is_trivia());
        assert!(SyntaxKind::DocComment.is_comment());
        assert!(SyntaxKind::EndIfDirective.is_directive());
        assert!(SyntaxKind::EndIfDirective.is_trivia());
        assert!(!SyntaxKind::Ident.is_trivia());
    }

    #[test]
    fn test_keyword_ranges() {
        assert!(SyntaxKind::UsingKw.is_keyword());
        assert!(SyntaxKind::ObjectKw.is_keyword());
        assert!(!SyntaxKind::Ident.is_keyword());
        assert!(SyntaxKind::IntKw.is_predefined_type());
        assert!(!SyntaxKind::IfKw.is_predefined_type());
        assert_eq!(keyword_kind("foreach"), Some(SyntaxKind::ForeachKw));
        assert_eq!(keyword_kind("nameof"), None);
    }
}
