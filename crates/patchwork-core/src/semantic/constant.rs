//! Compile-time constant folding

use std::fmt;

use crate::cst::SyntaxKind;
use crate::cst::SyntaxNode;
use crate::cst::ast::{AstNode, BinaryExpression, LiteralExpression, ParenthesizedExpression, PrefixUnaryExpression};

/// A folded constant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Int(i64),
    Bool(bool),
    Char(char),
    String(String),
    Null,
}

impl ConstantValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstantValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// Source form of the value
impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(value) => write!(f, "{value}"),
            ConstantValue::Bool(value) => write!(f, "{value}"),
            ConstantValue::Char(value) => write!(f, "'{}'", value.escape_default()),
            ConstantValue::String(value) => write!(f, "\"{}\"", value.escape_default()),
            ConstantValue::Null => f.write_str("null"),
        }
    }
}

/// Fold `node`, asking `resolve` for the value of names and member accesses
pub(crate) fn evaluate(
    node: &SyntaxNode,
    resolve: &mut dyn FnMut(&SyntaxNode) -> Option<ConstantValue>,
) -> Option<ConstantValue> {
    match node.kind() {
        SyntaxKind::LiteralExpression => literal(&LiteralExpression::cast(node.clone())?),
        SyntaxKind::ParenthesizedExpression => {
            let inner = ParenthesizedExpression::cast(node.clone())?.expression()?;
            evaluate(&inner, resolve)
        }
        SyntaxKind::PrefixUnaryExpression => {
            let unary = PrefixUnaryExpression::cast(node.clone())?;
            let operand = evaluate(&unary.operand()?, resolve)?;
            match (unary.operator()?, operand) {
                (SyntaxKind::Minus, ConstantValue::Int(value)) => value.checked_neg().map(ConstantValue::Int),
                (SyntaxKind::Plus, ConstantValue::Int(value)) => Some(ConstantValue::Int(value)),
                (SyntaxKind::Tilde, ConstantValue::Int(value)) => Some(ConstantValue::Int(!value)),
                (SyntaxKind::Bang, ConstantValue::Bool(value)) => Some(ConstantValue::Bool(!value)),
                _ => None,
            }
        }
        SyntaxKind::BinaryExpression => {
            let binary = BinaryExpression::cast(node.clone())?;
            let lhs = evaluate(&binary.lhs()?, resolve)?;
            let rhs = evaluate(&binary.rhs()?, resolve)?;
            if binary.is_right_shift() {
                let (ConstantValue::Int(lhs), ConstantValue::Int(rhs)) = (lhs, rhs) else {
                    return None;
                };
                let shift = u32::try_from(rhs).ok()?;
                return lhs.checked_shr(shift).map(ConstantValue::Int);
            }
            binary_op(binary.operator()?, lhs, rhs)
        }
        SyntaxKind::IdentifierName | SyntaxKind::MemberAccessExpression => resolve(node),
        _ => None,
    }
}

fn binary_op(op: SyntaxKind, lhs: ConstantValue, rhs: ConstantValue) -> Option<ConstantValue> {
    use ConstantValue::{Bool, Int};
    let value = match (lhs, rhs) {
        (Int(a), Int(b)) => match op {
            SyntaxKind::Plus => Int(a.checked_add(b)?),
            SyntaxKind::Minus => Int(a.checked_sub(b)?),
            SyntaxKind::Star => Int(a.checked_mul(b)?),
            SyntaxKind::Slash => Int(a.checked_div(b)?),
            SyntaxKind::Percent => Int(a.checked_rem(b)?),
            SyntaxKind::LtLt => Int(a.checked_shl(u32::try_from(b).ok()?)?),
            SyntaxKind::Amp => Int(a & b),
            SyntaxKind::Pipe => Int(a | b),
            SyntaxKind::Caret => Int(a ^ b),
            SyntaxKind::EqEq => Bool(a == b),
            SyntaxKind::BangEq => Bool(a != b),
            SyntaxKind::Lt => Bool(a < b),
            SyntaxKind::Gt => Bool(a > b),
            SyntaxKind::LtEq => Bool(a <= b),
            SyntaxKind::GtEq => Bool(a >= b),
            _ => return None,
        },
        (Bool(a), Bool(b)) => match op {
            SyntaxKind::AmpAmp | SyntaxKind::Amp => Bool(a && b),
            SyntaxKind::PipePipe | SyntaxKind::Pipe => Bool(a || b),
            SyntaxKind::Caret | SyntaxKind::BangEq => Bool(a != b),
            SyntaxKind::EqEq => Bool(a == b),
            _ => return None,
        },
        (ConstantValue::String(a), ConstantValue::String(b)) => match op {
            SyntaxKind::Plus => ConstantValue::String(a + &b),
            SyntaxKind::EqEq => Bool(a == b),
            SyntaxKind::BangEq => Bool(a != b),
            _ => return None,
        },
        _ => return None,
    };
    Some(value)
}

fn literal(literal: &LiteralExpression) -> Option<ConstantValue> {
    let token = literal.token()?;
    let text = token.text();
    match token.kind() {
        SyntaxKind::IntLiteral => parse_int(text).map(ConstantValue::Int),
        SyntaxKind::TrueKw => Some(ConstantValue::Bool(true)),
        SyntaxKind::FalseKw => Some(ConstantValue::Bool(false)),
        SyntaxKind::NullKw => Some(ConstantValue::Null),
        SyntaxKind::StringLiteral => parse_string(text).map(ConstantValue::String),
        SyntaxKind::CharLiteral => {
            let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
            let unescaped = unescape(inner)?;
            let mut chars = unescaped.chars();
            let value = chars.next()?;
            chars.next().is_none().then_some(ConstantValue::Char(value))
        }
        _ => None,
    }
}

/// Integer literal text: decimal, `0x` or `0b`, with `_` separators and
/// `u`/`l` suffixes
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let digits: String = text
        .trim_end_matches(['u', 'U', 'l', 'L'])
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };
    i64::try_from(value).ok()
}

fn parse_string(text: &str) -> Option<String> {
    if let Some(verbatim) = text.strip_prefix("@\"") {
        return Some(verbatim.strip_suffix('"')?.replace("\"\"", "\""));
    }
    unescape(text.strip_prefix('"')?.strip_suffix('"')?)
}

fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}
