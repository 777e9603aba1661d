//! CST-aware lexer that preserves all trivia
//!
//! Every byte of the input ends up in exactly one token, so concatenating the
//! token texts reproduces the source. Whitespace, line breaks, comments and
//! preprocessor directives are emitted as trivia tokens; the parser decides
//! where in the tree they are stored.

use std::ops::Range;

use super::SyntaxKind;
use super::syntax_kind::keyword_kind;

/// Simple span representing a byte range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Multi-character punctuation, longest first
const PUNCTUATION: &[(&str, SyntaxKind)] = &[
    ("??=", SyntaxKind::QuestionQuestionEq),
    ("<<=", SyntaxKind::LtLtEq),
    ("??", SyntaxKind::QuestionQuestion),
    ("?.", SyntaxKind::QuestionDot),
    ("==", SyntaxKind::EqEq),
    ("!=", SyntaxKind::BangEq),
    ("<=", SyntaxKind::LtEq),
    (">=", SyntaxKind::GtEq),
    ("&&", SyntaxKind::AmpAmp),
    ("||", SyntaxKind::PipePipe),
    ("<<", SyntaxKind::LtLt),
    ("++", SyntaxKind::PlusPlus),
    ("--", SyntaxKind::MinusMinus),
    ("+=", SyntaxKind::PlusEq),
    ("-=", SyntaxKind::MinusEq),
    ("*=", SyntaxKind::StarEq),
    ("/=", SyntaxKind::SlashEq),
    ("%=", SyntaxKind::PercentEq),
    ("&=", SyntaxKind::AmpEq),
    ("|=", SyntaxKind::PipeEq),
    ("^=", SyntaxKind::CaretEq),
    ("=>", SyntaxKind::FatArrow),
    ("{", SyntaxKind::LBrace),
    ("}", SyntaxKind::RBrace),
    ("(", SyntaxKind::LParen),
    (")", SyntaxKind::RParen),
    ("[", SyntaxKind::LBracket),
    ("]", SyntaxKind::RBracket),
    (";", SyntaxKind::Semicolon),
    (",", SyntaxKind::Comma),
    (".", SyntaxKind::Dot),
    (":", SyntaxKind::Colon),
    ("?", SyntaxKind::Question),
    ("=", SyntaxKind::Eq),
    ("<", SyntaxKind::Lt),
    (">", SyntaxKind::Gt),
    ("+", SyntaxKind::Plus),
    ("-", SyntaxKind::Minus),
    ("*", SyntaxKind::Star),
    ("/", SyntaxKind::Slash),
    ("%", SyntaxKind::Percent),
    ("!", SyntaxKind::Bang),
    ("~", SyntaxKind::Tilde),
    ("&", SyntaxKind::Amp),
    ("|", SyntaxKind::Pipe),
    ("^", SyntaxKind::Caret),
];

/// Lex input preserving ALL trivia for CST construction
///
/// The token stream always ends with a zero-width `EndOfFile` token.
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut lexer = Lexer {
        input,
        pos: 0,
        at_line_start: true,
        tokens: Vec::new(),
        errors: Vec::new(),
    };

    while lexer.pos < input.len() {
        lexer.lex_token();
    }

    lexer.tokens.push(CstToken::new(
        SyntaxKind::EndOfFile,
        "",
        input.len()..input.len(),
    ));
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Only whitespace has been seen since the last line break
    at_line_start: bool,
    tokens: Vec<CstToken>,
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn push(&mut self, kind: SyntaxKind, end: usize) {
        let start = self.pos;
        self.tokens
            .push(CstToken::new(kind, &self.input[start..end], start..end));
        self.pos = end;
        if kind == SyntaxKind::Newline {
            self.at_line_start = true;
        } else if kind != SyntaxKind::Whitespace {
            self.at_line_start = false;
        }
    }

    /// Byte offset of the end of the current line, excluding the line break
    fn line_end(&self) -> usize {
        self.rest()
            .find(['\r', '\n'])
            .map(|offset| self.pos + offset)
            .unwrap_or(self.input.len())
    }

    fn lex_token(&mut self) {
        let Some(current) = self.peek() else {
            return;
        };

        match current {
            '\n' => self.push(SyntaxKind::Newline, self.pos + 1),
            '\r' => {
                let end = if self.rest().starts_with("\r\n") {
                    self.pos + 2
                } else {
                    self.pos + 1
                };
                self.push(SyntaxKind::Newline, end);
            }
            c if c.is_whitespace() => {
                let len = self
                    .rest()
                    .find(|ch: char| !ch.is_whitespace() || ch == '\n' || ch == '\r')
                    .unwrap_or(self.rest().len());
                self.push(SyntaxKind::Whitespace, self.pos + len);
            }
            '#' if self.at_line_start => self.lex_directive(),
            '/' if self.rest().starts_with("//") => {
                let kind = if self.rest().starts_with("///") && !self.rest().starts_with("////") {
                    SyntaxKind::DocComment
                } else {
                    SyntaxKind::LineComment
                };
                let end = self.line_end();
                self.push(kind, end);
            }
            '/' if self.rest().starts_with("/*") => {
                let end = match self.rest()[2..].find("*/") {
                    Some(offset) => self.pos + 2 + offset + 2,
                    None => {
                        self.errors.push(LexerError::new(
                            "Unterminated block comment",
                            self.pos..self.input.len(),
                        ));
                        self.input.len()
                    }
                };
                self.push(SyntaxKind::BlockComment, end);
            }
            c if c.is_ascii_digit() => self.lex_number(),
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            '"' => self.lex_string(1, false),
            '@' if self.peek_nth(1) == Some('"') => self.lex_string(2, true),
            '$' if self.peek_nth(1) == Some('"') => self.lex_string(2, false),
            '$' | '@'
                if matches!(
                    (self.peek_nth(1), self.peek_nth(2)),
                    (Some('@'), Some('"')) | (Some('$'), Some('"'))
                ) =>
            {
                self.lex_string(3, true)
            }
            '\'' => self.lex_char(),
            c if c.is_alphabetic() || c == '_' => self.lex_word(0),
            '@' if self
                .peek_nth(1)
                .is_some_and(|c| c.is_alphabetic() || c == '_') =>
            {
                self.lex_word(1)
            }
            _ => self.lex_punctuation(current),
        }
    }

    fn lex_directive(&mut self) {
        let end = self.line_end();
        let text = &self.input[self.pos + 1..end];
        let word: String = text
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        let kind = match word.as_str() {
            "if" => SyntaxKind::IfDirective,
            "elif" => SyntaxKind::ElifDirective,
            "else" => SyntaxKind::ElseDirective,
            "endif" => SyntaxKind::EndIfDirective,
            "region" => SyntaxKind::RegionDirective,
            "endregion" => SyntaxKind::EndRegionDirective,
            _ => SyntaxKind::OtherDirective,
        };
        self.push(kind, end);
    }

    fn lex_number(&mut self) {
        let bytes = self.input.as_bytes();
        let mut end = self.pos;
        let mut kind = SyntaxKind::IntLiteral;

        let is_hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        if is_hex {
            end += 2;
            while end < bytes.len() && (bytes[end].is_ascii_hexdigit() || bytes[end] == b'_') {
                end += 1;
            }
        } else {
            while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'_') {
                end += 1;
            }
            if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
                kind = SyntaxKind::RealLiteral;
                end += 1;
                while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'_') {
                    end += 1;
                }
            }
            if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
                let mut exp = end + 1;
                if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                    exp += 1;
                }
                if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    kind = SyntaxKind::RealLiteral;
                    end = exp;
                    while end < bytes.len() && bytes[end].is_ascii_digit() {
                        end += 1;
                    }
                }
            }
        }

        while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
            if !is_hex && matches!(bytes[end], b'f' | b'F' | b'd' | b'D' | b'm' | b'M') {
                kind = SyntaxKind::RealLiteral;
            }
            end += 1;
        }

        self.push(kind, end);
    }

    /// Lex a string literal whose opening delimiter is `prefix` bytes long
    fn lex_string(&mut self, prefix: usize, verbatim: bool) {
        let bytes = self.input.as_bytes();
        let mut end = self.pos + prefix;
        let mut terminated = false;

        while end < bytes.len() {
            match bytes[end] {
                b'"' if verbatim && bytes.get(end + 1) == Some(&b'"') => end += 2,
                b'"' => {
                    end += 1;
                    terminated = true;
                    break;
                }
                b'\\' if !verbatim => end = (end + 2).min(bytes.len()),
                b'\n' | b'\r' if !verbatim => break,
                _ => end += 1,
            }
        }

        // Never split a multi-byte character
        while !self.input.is_char_boundary(end) {
            end += 1;
        }

        if !terminated {
            self.errors.push(LexerError::new(
                "Unterminated string literal",
                self.pos..end,
            ));
        }
        self.push(SyntaxKind::StringLiteral, end);
    }

    fn lex_char(&mut self) {
        let bytes = self.input.as_bytes();
        let mut end = self.pos + 1;
        let mut terminated = false;

        while end < bytes.len() {
            match bytes[end] {
                b'\'' => {
                    end += 1;
                    terminated = true;
                    break;
                }
                b'\\' => end = (end + 2).min(bytes.len()),
                b'\n' | b'\r' => break,
                _ => end += 1,
            }
        }

        while !self.input.is_char_boundary(end) {
            end += 1;
        }

        if !terminated {
            self.errors.push(LexerError::new(
                "Unterminated character literal",
                self.pos..end,
            ));
        }
        self.push(SyntaxKind::CharLiteral, end);
    }

    fn lex_word(&mut self, prefix: usize) {
        let start = self.pos + prefix;
        let len = self.input[start..]
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(self.input.len() - start);
        let end = start + len;
        let kind = if prefix == 0 {
            keyword_kind(&self.input[start..end]).unwrap_or(SyntaxKind::Ident)
        } else {
            SyntaxKind::Ident
        };
        self.push(kind, end);
    }

    fn lex_punctuation(&mut self, current: char) {
        for (text, kind) in PUNCTUATION {
            if self.rest().starts_with(text) {
                self.push(*kind, self.pos + text.len());
                return;
            }
        }

        let end = self.pos + current.len_utf8();
        self.errors.push(LexerError::new(
            format!("Unexpected character '{current}'"),
            self.pos..end,
        ));
        self.push(SyntaxKind::ErrorToken, end);
    }
}
