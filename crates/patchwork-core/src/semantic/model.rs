use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rowan::TextRange;

use super::catalog::ReferenceCatalog;
use super::constant::{self, ConstantValue};
use crate::cst::ast::{
    AstNode, BinaryExpression, EnumDeclaration, EnumMemberDeclaration, FieldDeclaration,
    IdentifierName, InvocationExpression, LiteralExpression, LocalDeclarationStatement,
    MemberAccessExpression, MethodDeclaration, ObjectCreationExpression, Parameter,
    ParenthesizedExpression, PrefixUnaryExpression, PropertyDeclaration, SwitchStatement,
    TypeDeclaration, TypeSyntax, VariableDeclaration, VariableDeclarator, child_of_kind,
    token_of_kind,
};
use crate::cst::{SyntaxKind, SyntaxNode, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Local,
    Parameter,
    Field,
    Property,
    Method,
    Type,
    EnumMember,
}

/// What a name refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Range of the declaring node; `None` for referenced types
    pub declaration: Option<TextRange>,
    /// Containing type, or namespace for referenced types
    pub container: Option<String>,
    /// Declared type, return type for methods
    pub type_name: Option<String>,
    pub is_static: bool,
    pub is_const: bool,
}

impl Symbol {
    fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            declaration: None,
            container: None,
            type_name: None,
            is_static: false,
            is_const: false,
        }
    }

    fn declared_at(mut self, node: &SyntaxNode) -> Self {
        self.declaration = Some(node.text_range());
        self
    }

    fn of_type(mut self, ty: Option<TypeSyntax>) -> Self {
        self.type_name = ty.map(|t| t.text());
        self
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.container {
            Some(container) => write!(f, "{:?} {}.{}", self.kind, container, self.name),
            None => write!(f, "{:?} {}", self.kind, self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

#[derive(Debug)]
struct Member {
    symbol: Symbol,
    node: SyntaxNode,
    arity: Option<usize>,
}

#[derive(Debug)]
struct DeclaredType {
    kind: TypeKind,
    symbol: Symbol,
    members: IndexMap<String, Member>,
}

/// Name binding and constant folding for one document
///
/// Built once per document; every query walks the red tree built by
/// [`SemanticModel::new`], so nodes handed in must come from the same tree.
#[derive(Debug)]
pub struct SemanticModel {
    tree: SyntaxTree,
    root: SyntaxNode,
    catalog: Arc<ReferenceCatalog>,
    types: Vec<DeclaredType>,
}

impl SemanticModel {
    pub fn new(tree: &SyntaxTree, catalog: Arc<ReferenceCatalog>) -> Self {
        Self::with_root(tree, tree.root(), catalog)
    }

    /// Bind against an already built red root of `tree`
    pub fn with_root(tree: &SyntaxTree, root: SyntaxNode, catalog: Arc<ReferenceCatalog>) -> Self {
        let types = root.descendants().filter_map(declared_type).collect::<Vec<_>>();
        tracing::trace!("Bound {} type(s) in {}", types.len(), tree.id());
        Self {
            tree: tree.clone(),
            root,
            catalog,
            types,
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Symbol a name, member access or invocation refers to
    pub fn symbol(&self, node: &SyntaxNode) -> Option<Symbol> {
        match node.kind() {
            SyntaxKind::IdentifierName => {
                if let Some(access) = node.parent().and_then(MemberAccessExpression::cast) {
                    if access.name().is_some_and(|name| name.syntax() == node) {
                        return self.member_access_symbol(&access);
                    }
                }
                let name = IdentifierName::cast(node.clone())?.text()?;
                self.lookup_name(node, &name)
            }
            SyntaxKind::MemberAccessExpression => {
                self.member_access_symbol(&MemberAccessExpression::cast(node.clone())?)
            }
            SyntaxKind::InvocationExpression => {
                let callee = InvocationExpression::cast(node.clone())?.expression()?;
                self.symbol(&callee)
            }
            SyntaxKind::Type => {
                let ty = TypeSyntax::cast(node.clone())?;
                self.type_symbol(&ty.text())
            }
            _ => None,
        }
    }

    /// Symbol declared by a declarator, parameter, member or type node
    pub fn declared_symbol(&self, node: &SyntaxNode) -> Option<Symbol> {
        match node.kind() {
            SyntaxKind::Parameter => parameter_symbol(node),
            SyntaxKind::VariableDeclarator => {
                let declarator = VariableDeclarator::cast(node.clone())?;
                let declaration = node.parent().and_then(VariableDeclaration::cast)?;
                match declaration.syntax().parent().map(|p| p.kind()) {
                    Some(SyntaxKind::FieldDeclaration) => self.member_at(node),
                    _ => Some(local_symbol(&declarator, &declaration)?),
                }
            }
            kind if is_type_kind(kind) => self
                .types
                .iter()
                .find(|t| t.symbol.declaration == Some(node.text_range()))
                .map(|t| t.symbol.clone()),
            _ => self.member_at(node),
        }
    }

    /// Constant value of an expression, a `const` declarator or an enum member
    pub fn constant_value(&self, node: &SyntaxNode) -> Option<ConstantValue> {
        self.constant_in(node, &mut HashSet::new())
    }

    pub fn type_of_symbol(&self, symbol: &Symbol) -> Option<String> {
        match symbol.kind {
            SymbolKind::Type => Some(match &symbol.container {
                Some(container) if self.catalog.lookup(&symbol.name).is_some() => {
                    format!("{container}.{}", symbol.name)
                }
                _ => symbol.name.clone(),
            }),
            SymbolKind::EnumMember => symbol.container.clone(),
            _ => symbol.type_name.clone(),
        }
    }

    /// Static type of an expression, when it can be told without overload
    /// resolution
    pub fn type_of_expression(&self, node: &SyntaxNode) -> Option<String> {
        match node.kind() {
            SyntaxKind::LiteralExpression => {
                let kind = LiteralExpression::cast(node.clone())?.kind()?;
                let name = match kind {
                    SyntaxKind::TrueKw | SyntaxKind::FalseKw => "bool",
                    SyntaxKind::IntLiteral => "int",
                    SyntaxKind::StringLiteral => "string",
                    SyntaxKind::CharLiteral => "char",
                    _ => return None,
                };
                Some(name.to_string())
            }
            SyntaxKind::ParenthesizedExpression => {
                self.type_of_expression(&ParenthesizedExpression::cast(node.clone())?.expression()?)
            }
            SyntaxKind::PrefixUnaryExpression => {
                let unary = PrefixUnaryExpression::cast(node.clone())?;
                match unary.operator()? {
                    SyntaxKind::Bang => Some("bool".to_string()),
                    _ => self.type_of_expression(&unary.operand()?),
                }
            }
            SyntaxKind::BinaryExpression => {
                let binary = BinaryExpression::cast(node.clone())?;
                match binary.operator()? {
                    SyntaxKind::EqEq
                    | SyntaxKind::BangEq
                    | SyntaxKind::Lt
                    | SyntaxKind::LtEq
                    | SyntaxKind::GtEq
                    | SyntaxKind::AmpAmp
                    | SyntaxKind::PipePipe
                    | SyntaxKind::IsKw => Some("bool".to_string()),
                    SyntaxKind::Gt if !binary.is_right_shift() => Some("bool".to_string()),
                    _ => {
                        let lhs = self.type_of_expression(&binary.lhs()?)?;
                        let rhs = self.type_of_expression(&binary.rhs()?)?;
                        (lhs == rhs).then_some(lhs)
                    }
                }
            }
            SyntaxKind::ObjectCreationExpression => {
                Some(ObjectCreationExpression::cast(node.clone())?.ty()?.text())
            }
            SyntaxKind::IdentifierName
            | SyntaxKind::MemberAccessExpression
            | SyntaxKind::InvocationExpression => {
                let symbol = self.symbol(node)?;
                match symbol.kind {
                    SymbolKind::Type => None,
                    _ => self.type_of_symbol(&symbol),
                }
            }
            _ => None,
        }
    }

    /// `Some(true)` for reference types, `Some(false)` for value types,
    /// `None` when the type is unknown (type parameters, unbound names)
    pub fn is_reference_type(&self, type_name: &str) -> Option<bool> {
        if type_name.ends_with("[]") {
            return Some(true);
        }
        let name = type_name.trim_end_matches('?');
        let simple = name
            .split('<')
            .next()
            .unwrap_or(name)
            .rsplit('.')
            .next()
            .unwrap_or(name);
        match simple {
            "string" | "object" | "dynamic" => return Some(true),
            "bool" | "byte" | "sbyte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong"
            | "char" | "float" | "double" | "decimal" => return Some(false),
            _ => {}
        }
        if let Some(ty) = self.types.iter().find(|t| t.symbol.name == simple) {
            return Some(matches!(ty.kind, TypeKind::Class | TypeKind::Interface));
        }
        self.catalog
            .lookup(name)
            .or_else(|| self.catalog.lookup(simple))
            .map(|t| t.is_reference_type)
    }

    /// Whether a document or referenced type has a static method with
    /// `arity` parameters
    pub fn has_static_method(&self, type_name: &str, method: &str, arity: usize) -> bool {
        if let Some(ty) = self.types.iter().find(|t| t.symbol.name == type_name) {
            return ty.members.get(method).is_some_and(|m| {
                m.symbol.kind == SymbolKind::Method && m.symbol.is_static && m.arity == Some(arity)
            });
        }
        self.catalog.has_static_method(type_name, method, arity)
    }

    fn lookup_name(&self, node: &SyntaxNode, name: &str) -> Option<Symbol> {
        if let Some(symbol) = lookup_local(node, name) {
            return Some(symbol);
        }
        for ancestor in node.ancestors().filter(|a| is_type_kind(a.kind())) {
            if let Some(ty) = self.type_at(&ancestor) {
                if let Some(member) = ty.members.get(name) {
                    return Some(member.symbol.clone());
                }
            }
        }
        self.type_symbol(name)
    }

    fn type_symbol(&self, name: &str) -> Option<Symbol> {
        if let Some(ty) = self.types.iter().find(|t| t.symbol.name == name) {
            return Some(ty.symbol.clone());
        }
        let ty = self.catalog.lookup(predefined_alias(name).unwrap_or(name))?;
        let mut symbol = Symbol::new(SymbolKind::Type, ty.name.clone());
        symbol.container = Some(ty.namespace.clone());
        symbol.type_name = Some(ty.full_name());
        Some(symbol)
    }

    fn member_access_symbol(&self, access: &MemberAccessExpression) -> Option<Symbol> {
        let name = access.name()?.text()?;
        let receiver = access.expression()?;
        let receiver_type = match self.symbol(&receiver) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol,
            Some(symbol) => {
                let type_name = self.type_of_symbol(&symbol)?;
                self.type_symbol(type_name.trim_end_matches('?'))?
            }
            // namespace-qualified name such as `System.ArgumentNullException`
            None => {
                let qualified = format!("{}.{}", qualified_text(&receiver)?, name);
                return self.type_symbol(&qualified);
            }
        };

        if let Some(ty) = self.types.iter().find(|t| t.symbol.name == receiver_type.name) {
            return ty.members.get(&name).map(|m| m.symbol.clone());
        }
        let referenced = self.catalog.lookup(receiver_type.type_name.as_deref()?)?;
        let method = referenced.method(&name)?;
        let mut symbol = Symbol::new(SymbolKind::Method, name);
        symbol.container = Some(referenced.full_name());
        symbol.type_name = method.return_type.clone();
        symbol.is_static = method.is_static;
        Some(symbol)
    }

    fn type_at(&self, node: &SyntaxNode) -> Option<&DeclaredType> {
        self.types
            .iter()
            .find(|t| t.symbol.declaration == Some(node.text_range()))
    }

    fn member_at(&self, node: &SyntaxNode) -> Option<Symbol> {
        let range = node.text_range();
        self.types
            .iter()
            .flat_map(|t| t.members.values())
            .find(|m| m.node.text_range() == range && m.node.kind() == node.kind())
            .map(|m| m.symbol.clone())
    }

    fn declaration_node(&self, symbol: &Symbol) -> Option<SyntaxNode> {
        let range = symbol.declaration?;
        let element = self.root.covering_element(range);
        let start = match element {
            rowan::NodeOrToken::Node(node) => node,
            rowan::NodeOrToken::Token(token) => token.parent()?,
        };
        start.ancestors().find(|n| {
            n.text_range() == range
                && matches!(
                    n.kind(),
                    SyntaxKind::VariableDeclarator | SyntaxKind::EnumMemberDeclaration
                )
        })
    }

    fn constant_in(&self, node: &SyntaxNode, visiting: &mut HashSet<TextRange>) -> Option<ConstantValue> {
        match node.kind() {
            SyntaxKind::EnumMemberDeclaration | SyntaxKind::VariableDeclarator => {
                if !visiting.insert(node.text_range()) {
                    tracing::debug!("Constant cycle through {:?}", node.text_range());
                    return None;
                }
                let value = self.declared_constant(node, visiting);
                visiting.remove(&node.text_range());
                value
            }
            _ => constant::evaluate(node, &mut |name| self.resolve_constant(name, visiting)),
        }
    }

    fn declared_constant(&self, node: &SyntaxNode, visiting: &mut HashSet<TextRange>) -> Option<ConstantValue> {
        if let Some(member) = EnumMemberDeclaration::cast(node.clone()) {
            if let Some(value) = member.value() {
                return self.constant_in(&value, visiting);
            }
            let previous = node
                .siblings(rowan::Direction::Prev)
                .skip(1)
                .find(|n| n.kind() == SyntaxKind::EnumMemberDeclaration);
            return match previous {
                None => Some(ConstantValue::Int(0)),
                Some(previous) => {
                    let value = self.constant_in(&previous, visiting)?.as_int()?;
                    value.checked_add(1).map(ConstantValue::Int)
                }
            };
        }

        let declarator = VariableDeclarator::cast(node.clone())?;
        let owner = node.parent()?.parent()?;
        let is_const = FieldDeclaration::cast(owner.clone()).is_some_and(|f| f.is_const())
            || LocalDeclarationStatement::cast(owner).is_some_and(|l| l.is_const());
        if !is_const {
            return None;
        }
        self.constant_in(&declarator.initializer()?, visiting)
    }

    fn resolve_constant(&self, name: &SyntaxNode, visiting: &mut HashSet<TextRange>) -> Option<ConstantValue> {
        let symbol = self.symbol(name)?;
        if !symbol.is_const {
            return None;
        }
        let declaration = self.declaration_node(&symbol)?;
        self.constant_in(&declaration, visiting)
    }
}

fn is_type_kind(kind: SyntaxKind) -> bool {
    kind.is_type_declaration()
}

fn predefined_alias(name: &str) -> Option<&'static str> {
    match name {
        "string" => Some("System.String"),
        "object" => Some("System.Object"),
        _ => None,
    }
}

/// `A.B.C` for a chain of names
fn qualified_text(node: &SyntaxNode) -> Option<String> {
    match node.kind() {
        SyntaxKind::IdentifierName => IdentifierName::cast(node.clone())?.text(),
        SyntaxKind::MemberAccessExpression => {
            let access = MemberAccessExpression::cast(node.clone())?;
            Some(format!(
                "{}.{}",
                qualified_text(&access.expression()?)?,
                access.name()?.text()?
            ))
        }
        _ => None,
    }
}

fn declared_type(node: SyntaxNode) -> Option<DeclaredType> {
    let kind = match node.kind() {
        SyntaxKind::ClassDeclaration => TypeKind::Class,
        SyntaxKind::StructDeclaration => TypeKind::Struct,
        SyntaxKind::InterfaceDeclaration => TypeKind::Interface,
        SyntaxKind::EnumDeclaration => TypeKind::Enum,
        _ => return None,
    };

    let mut members = IndexMap::new();
    let (name, is_static) = if let Some(decl) = EnumDeclaration::cast(node.clone()) {
        let name = decl.name()?;
        for member in decl.members() {
            let Some(member_name) = member.name() else {
                continue;
            };
            let mut symbol = Symbol::new(SymbolKind::EnumMember, member_name.clone())
                .declared_at(member.syntax());
            symbol.container = Some(name.clone());
            symbol.type_name = Some(name.clone());
            symbol.is_static = true;
            symbol.is_const = true;
            members.entry(member_name).or_insert(Member {
                symbol,
                node: member.syntax().clone(),
                arity: None,
            });
        }
        (name, false)
    } else {
        let decl = TypeDeclaration::cast(node.clone())?;
        let name = decl.name()?;
        for member in decl.members() {
            collect_member(&name, &member, &mut members);
        }
        (name, decl.is_static())
    };

    let mut symbol = Symbol::new(SymbolKind::Type, name).declared_at(&node);
    symbol.is_static = is_static;
    Some(DeclaredType {
        kind,
        symbol,
        members,
    })
}

fn collect_member(container: &str, node: &SyntaxNode, members: &mut IndexMap<String, Member>) {
    match node.kind() {
        SyntaxKind::FieldDeclaration => {
            let Some(field) = FieldDeclaration::cast(node.clone()) else {
                return;
            };
            let Some(declaration) = field.declaration() else {
                return;
            };
            for declarator in declaration.declarators() {
                let Some(name) = declarator.name() else {
                    continue;
                };
                let mut symbol = Symbol::new(SymbolKind::Field, name.clone())
                    .declared_at(declarator.syntax())
                    .of_type(declaration.ty());
                symbol.container = Some(container.to_string());
                symbol.is_const = field.is_const();
                symbol.is_static = field.is_static() || field.is_const();
                members.entry(name).or_insert(Member {
                    symbol,
                    node: declarator.syntax().clone(),
                    arity: None,
                });
            }
        }
        SyntaxKind::MethodDeclaration => {
            let Some(method) = MethodDeclaration::cast(node.clone()) else {
                return;
            };
            let Some(name) = method.name() else {
                return;
            };
            let mut symbol = Symbol::new(SymbolKind::Method, name.clone())
                .declared_at(node)
                .of_type(method.return_type());
            symbol.container = Some(container.to_string());
            symbol.is_static = method.is_static();
            let arity = method.parameter_list().map(|p| p.parameters().count());
            members.entry(name).or_insert(Member {
                symbol,
                node: node.clone(),
                arity,
            });
        }
        SyntaxKind::PropertyDeclaration => {
            let Some(property) = PropertyDeclaration::cast(node.clone()) else {
                return;
            };
            let Some(name) = property.name() else {
                return;
            };
            let mut symbol = Symbol::new(SymbolKind::Property, name.clone())
                .declared_at(node)
                .of_type(property.ty());
            symbol.container = Some(container.to_string());
            symbol.is_static = property.is_static();
            members.entry(name).or_insert(Member {
                symbol,
                node: node.clone(),
                arity: None,
            });
        }
        _ => {}
    }
}

fn parameter_symbol(node: &SyntaxNode) -> Option<Symbol> {
    let parameter = Parameter::cast(node.clone())?;
    Some(
        Symbol::new(SymbolKind::Parameter, parameter.name()?)
            .declared_at(node)
            .of_type(parameter.ty()),
    )
}

fn local_symbol(declarator: &VariableDeclarator, declaration: &VariableDeclaration) -> Option<Symbol> {
    let mut symbol = Symbol::new(SymbolKind::Local, declarator.name()?)
        .declared_at(declarator.syntax())
        .of_type(declaration.ty());
    symbol.is_const = declaration
        .syntax()
        .parent()
        .and_then(LocalDeclarationStatement::cast)
        .is_some_and(|l| l.is_const());
    Some(symbol)
}

/// Declarator named `name` in `declaration` that ends before `offset`
fn declared_before(
    declaration: &VariableDeclaration,
    name: &str,
    offset: rowan::TextSize,
) -> Option<Symbol> {
    declaration
        .declarators()
        .filter(|d| d.syntax().text_range().end() <= offset)
        .find(|d| d.name().as_deref() == Some(name))
        .and_then(|d| local_symbol(&d, declaration))
}

/// Locals declared by the statements of one scope before `offset`
fn statement_locals<'a>(
    statements: impl Iterator<Item = SyntaxNode> + 'a,
    name: &'a str,
    offset: rowan::TextSize,
) -> Option<Symbol> {
    statements
        .filter(|s| s.text_range().start() < offset)
        .filter_map(LocalDeclarationStatement::cast)
        .filter_map(|s| s.declaration())
        .find_map(|d| declared_before(&d, name, offset))
}

fn lookup_local(node: &SyntaxNode, name: &str) -> Option<Symbol> {
    let offset = node.text_range().start();
    for scope in node.ancestors().skip(1) {
        let found = match scope.kind() {
            SyntaxKind::Block => statement_locals(
                scope.children().filter(|c| c.kind().is_statement()),
                name,
                offset,
            ),
            // every section of a switch shares one declaration space
            SyntaxKind::SwitchSection => {
                let switch = scope.parent().and_then(SwitchStatement::cast);
                switch.and_then(|switch| {
                    statement_locals(
                        switch.sections().flat_map(|s| s.statements().collect::<Vec<_>>()),
                        name,
                        offset,
                    )
                })
            }
            SyntaxKind::ForStatement | SyntaxKind::UsingStatement => scope
                .children()
                .find_map(VariableDeclaration::cast)
                .and_then(|d| declared_before(&d, name, offset)),
            SyntaxKind::ForEachStatement => token_of_kind(&scope, SyntaxKind::Ident)
                .filter(|ident| ident.text() == name && ident.text_range().end() <= offset)
                .map(|_| {
                    Symbol::new(SymbolKind::Local, name)
                        .declared_at(&scope)
                        .of_type(scope.children().find_map(TypeSyntax::cast))
                }),
            SyntaxKind::CatchClause => child_of_kind(&scope, SyntaxKind::CatchDeclaration)
                .and_then(|decl| {
                    token_of_kind(&decl, SyntaxKind::Ident)
                        .filter(|ident| ident.text() == name)
                        .map(|_| {
                            Symbol::new(SymbolKind::Local, name)
                                .declared_at(&decl)
                                .of_type(decl.children().find_map(TypeSyntax::cast))
                        })
                }),
            SyntaxKind::LambdaExpression => lambda_parameters(&scope)
                .into_iter()
                .find(|p| Parameter::cast(p.clone()).and_then(|p| p.name()).as_deref() == Some(name))
                .and_then(|p| parameter_symbol(&p)),
            SyntaxKind::MethodDeclaration | SyntaxKind::ConstructorDeclaration => {
                return child_of_kind(&scope, SyntaxKind::ParameterList)
                    .into_iter()
                    .flat_map(|list| list.children().collect::<Vec<_>>())
                    .find(|p| {
                        Parameter::cast(p.clone()).and_then(|p| p.name()).as_deref() == Some(name)
                    })
                    .and_then(|p| parameter_symbol(&p));
            }
            kind if kind.is_type_declaration() || kind == SyntaxKind::PropertyDeclaration => {
                return None;
            }
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn lambda_parameters(lambda: &SyntaxNode) -> Vec<SyntaxNode> {
    if let Some(list) = child_of_kind(lambda, SyntaxKind::ParameterList) {
        return list
            .children()
            .filter(|n| n.kind() == SyntaxKind::Parameter)
            .collect();
    }
    child_of_kind(lambda, SyntaxKind::Parameter).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::SyntaxTree;

    fn model(source: &str) -> SemanticModel {
        SemanticModel::new(&SyntaxTree::parse(source), Arc::new(ReferenceCatalog::default()))
    }

    fn name_at(model: &SemanticModel, name: &str, nth: usize) -> SyntaxNode {
        model
            .root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::IdentifierName)
            .filter(|n| n.text() == name)
            .nth(nth)
            .expect("identifier")
    }

    #[test]
    fn test_resolves_parameters_and_locals() {
        let model = model(
            "class C\n{\n    void M(string s)\n    {\n        int n = 1;\n        Use(s, n);\n    }\n}\n",
        );
        let s = model.symbol(&name_at(&model, "s", 0)).expect("parameter");
        assert_eq!(s.kind, SymbolKind::Parameter);
        assert_eq!(s.type_name.as_deref(), Some("string"));

        let n = model.symbol(&name_at(&model, "n", 0)).expect("local");
        assert_eq!(n.kind, SymbolKind::Local);
        assert_eq!(model.type_of_symbol(&n).as_deref(), Some("int"));
    }

    #[test]
    fn test_locals_honour_declaration_order() {
        let model = model("class C { void M() { Use(x); int x = 1; Use(x); } int x; }");
        let before = model.symbol(&name_at(&model, "x", 0)).expect("field");
        assert_eq!(before.kind, SymbolKind::Field);
        let after = model.symbol(&name_at(&model, "x", 1)).expect("local");
        assert_eq!(after.kind, SymbolKind::Local);
    }

    #[test]
    fn test_switch_sections_share_scope() {
        let model = model(
            "class C { void M(int k) { switch (k) { case 1: int a = 1; break; case 2: Use(a); break; } } }",
        );
        let a = model.symbol(&name_at(&model, "a", 0)).expect("local");
        assert_eq!(a.kind, SymbolKind::Local);
    }

    #[test]
    fn test_block_locals_do_not_leak() {
        let model = model("class C { void M() { { int a = 1; } Use(a); } }");
        assert_eq!(model.symbol(&name_at(&model, "a", 0)), None);
    }

    #[test]
    fn test_enum_member_values() {
        let model = model("enum E { A, B, C = 10, D, E = C | 1, F = A + B }");
        let values: Vec<_> = model
            .root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::EnumMemberDeclaration)
            .map(|n| model.constant_value(&n).and_then(|v| v.as_int()))
            .collect();
        assert_eq!(values, vec![Some(0), Some(1), Some(10), Some(11), Some(11), Some(1)]);
    }

    #[test]
    fn test_const_fields_and_qualified_members() {
        let model = model(
            "enum E { A = 4 }\nclass C { const int K = E.A * 2; const int L = K + 1; int x = L; }",
        );
        let l = model.symbol(&name_at(&model, "L", 0)).expect("const");
        assert!(l.is_const);
        let declarator = model
            .root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::VariableDeclarator)
            .nth(2)
            .expect("x");
        let initializer = VariableDeclarator::cast(declarator.clone())
            .and_then(|d| d.initializer())
            .expect("initializer");
        assert_eq!(model.constant_value(&initializer), Some(ConstantValue::Int(9)));
        assert_eq!(model.constant_value(&declarator), None);
    }

    #[test]
    fn test_constant_cycles_fold_to_none() {
        let model = model("enum E { A = B, B = A }");
        let first = model
            .root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::EnumMemberDeclaration)
            .expect("member");
        assert_eq!(model.constant_value(&first), None);
    }

    #[test]
    fn test_reference_types() {
        let model = model("class K { } struct S { } enum E { A }");
        assert_eq!(model.is_reference_type("string"), Some(true));
        assert_eq!(model.is_reference_type("int?"), Some(false));
        assert_eq!(model.is_reference_type("K"), Some(true));
        assert_eq!(model.is_reference_type("S"), Some(false));
        assert_eq!(model.is_reference_type("E"), Some(false));
        assert_eq!(model.is_reference_type("S[]"), Some(true));
        assert_eq!(model.is_reference_type("Guid"), Some(false));
        assert_eq!(model.is_reference_type("T"), None);
    }

    #[test]
    fn test_referenced_static_method() {
        let model = model("class C { void M(object o) { ArgumentNullException.ThrowIfNull(o); } }");
        let call = model
            .root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::InvocationExpression)
            .expect("call");
        let symbol = model.symbol(&call).expect("method");
        assert_eq!(symbol.kind, SymbolKind::Method);
        assert!(symbol.is_static);
        assert_eq!(symbol.container.as_deref(), Some("System.ArgumentNullException"));
        assert!(model.has_static_method("ArgumentNullException", "ThrowIfNull", 1));
    }

    #[test]
    fn test_namespace_qualified_type() {
        let model = model("class C { object o = System.ArgumentNullException.ThrowIfNull; }");
        let access = model
            .root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::MemberAccessExpression)
            .find(|n| n.text() == "System.ArgumentNullException")
            .expect("access");
        let symbol = model.symbol(&access).expect("type");
        assert_eq!(symbol.kind, SymbolKind::Type);
        assert_eq!(symbol.name, "ArgumentNullException");
    }

    #[test]
    fn test_expression_types() {
        let model = model("class C { bool f; void M(int i) { Use(f == true, i + 1, !f); } }");
        let args: Vec<_> = model
            .root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::Argument)
            .filter_map(|a| a.first_child())
            .map(|e| model.type_of_expression(&e))
            .collect();
        assert_eq!(
            args,
            vec![Some("bool".to_string()), Some("int".to_string()), Some("bool".to_string())]
        );
    }
}
