//! Trivia attribution and classification
//!
//! Trivia are tokens in the tree, placed in the closest common ancestor of the
//! tokens around them. This module attributes them to tokens the usual way:
//!
//! - **Trailing trivia** of a token: the run after it, up to and including
//!   the first line break (the whole run when it has no line break)
//! - **Leading trivia** of a token: the rest of the run before it
//!
//! The full range of a node is its span extended by the leading trivia of its
//! first token and the trailing trivia of its last token.
//!
//! [`classify_between`] inspects the trivia separating two adjacent elements
//! and reports what a line-formatting rule may do with it.

use rowan::{NodeOrToken, TextRange, TextSize};

use crate::cst::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// Next non-trivia token in document order
pub fn next_significant_token(token: &SyntaxToken) -> Option<SyntaxToken> {
    let mut current = token.next_token();
    while let Some(token) = current {
        if !token.kind().is_trivia() {
            return Some(token);
        }
        current = token.next_token();
    }
    None
}

/// Previous non-trivia token in document order
pub fn prev_significant_token(token: &SyntaxToken) -> Option<SyntaxToken> {
    let mut current = token.prev_token();
    while let Some(token) = current {
        if !token.kind().is_trivia() {
            return Some(token);
        }
        current = token.prev_token();
    }
    None
}

/// First non-trivia token of an element
pub fn first_significant_token(element: &SyntaxElement) -> Option<SyntaxToken> {
    match element {
        NodeOrToken::Token(token) => Some(token.clone()),
        NodeOrToken::Node(node) => {
            let first = node.first_token()?;
            if first.kind().is_trivia() {
                next_significant_token(&first).filter(|t| node.text_range().contains_range(t.text_range()))
            } else {
                Some(first)
            }
        }
    }
}

/// Last non-trivia token of an element
pub fn last_significant_token(element: &SyntaxElement) -> Option<SyntaxToken> {
    match element {
        NodeOrToken::Token(token) => Some(token.clone()),
        NodeOrToken::Node(node) => {
            let last = node.last_token()?;
            if last.kind().is_trivia() {
                prev_significant_token(&last).filter(|t| node.text_range().contains_range(t.text_range()))
            } else {
                Some(last)
            }
        }
    }
}

fn trivia_after(token: &SyntaxToken) -> impl Iterator<Item = SyntaxToken> {
    std::iter::successors(token.next_token(), |t| t.next_token())
        .take_while(|t| t.kind().is_trivia())
}

fn trivia_before(token: &SyntaxToken) -> Vec<SyntaxToken> {
    let mut run: Vec<SyntaxToken> = std::iter::successors(token.prev_token(), |t| t.prev_token())
        .take_while(|t| t.kind().is_trivia())
        .collect();
    run.reverse();
    run
}

/// Tokens overlapping `range`, in document order
///
/// Walks from the token at the start of the range, so the cost follows the
/// size of the range rather than the size of the document.
pub fn tokens_in_range(root: &SyntaxNode, range: TextRange) -> impl Iterator<Item = SyntaxToken> + use<> {
    let end = range.end().min(root.text_range().end());
    let first = root
        .text_range()
        .intersect(range)
        .filter(|r| !r.is_empty())
        .and_then(|r| root.token_at_offset(r.start()).right_biased());
    std::iter::successors(first, |t| t.next_token()).take_while(move |t| t.text_range().start() < end)
}

/// Trivia owned by `token` on its own line
pub fn trailing_trivia(token: &SyntaxToken) -> Vec<SyntaxToken> {
    if token.kind().is_trivia() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for trivia in trivia_after(token) {
        let is_line_break = trivia.kind() == SyntaxKind::Newline;
        out.push(trivia);
        if is_line_break {
            break;
        }
    }
    out
}

/// Trivia owned by `token` before it
pub fn leading_trivia(token: &SyntaxToken) -> Vec<SyntaxToken> {
    if token.kind().is_trivia() {
        return Vec::new();
    }
    let run = trivia_before(token);
    if prev_significant_token(token).is_none() {
        return run;
    }
    match run.iter().position(|t| t.kind() == SyntaxKind::Newline) {
        Some(line_break) => run[line_break + 1..].to_vec(),
        None => Vec::new(),
    }
}

pub fn leading_range(token: &SyntaxToken) -> TextRange {
    let end = token.text_range().start();
    let start = leading_trivia(token)
        .first()
        .map(|t| t.text_range().start())
        .unwrap_or(end);
    TextRange::new(start, end)
}

pub fn trailing_range(token: &SyntaxToken) -> TextRange {
    let start = token.text_range().end();
    let end = trailing_trivia(token)
        .last()
        .map(|t| t.text_range().end())
        .unwrap_or(start);
    TextRange::new(start, end)
}

/// Span of a node extended by its first token's leading and last token's
/// trailing trivia
pub fn full_range(node: &SyntaxNode) -> TextRange {
    let element = NodeOrToken::Node(node.clone());
    element_full_range(&element)
}

pub fn element_full_range(element: &SyntaxElement) -> TextRange {
    let span = element.text_range();
    let (Some(first), Some(last)) = (
        first_significant_token(element),
        last_significant_token(element),
    ) else {
        return span;
    };
    let start = leading_range(&first).start().min(span.start());
    let end = trailing_range(&last).end().max(span.end());
    TextRange::new(start, end)
}

/// What separates two adjacent elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    /// Same line
    NoNewLine,
    /// Exactly one line break
    SingleNewLine,
    /// Two or more line breaks
    BlankLine,
    /// Comments or directives present; never rewritten
    CommentBearing,
}

/// Classified trivia between two adjacent elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaBlock {
    pub kind: TriviaKind,
    /// From the end of the first element to the start of the second
    pub range: TextRange,
    pub line_breaks: usize,
    pub has_comments: bool,
    pub has_directives: bool,
    line_break_ranges: Vec<TextRange>,
    line_break_text: String,
}

impl TriviaBlock {
    /// Comment- and directive-free blocks may be rewritten
    pub fn is_fixable(&self) -> bool {
        self.kind != TriviaKind::CommentBearing
    }

    /// Text of the first line break, `\n` when there is none
    pub fn line_break_text(&self) -> &str {
        &self.line_break_text
    }

    /// Where to insert one more line break to turn a single line break into a
    /// blank line. The first line break and the second element's indentation
    /// stay untouched.
    pub fn blank_line_insertion_point(&self) -> Option<TextSize> {
        if self.kind != TriviaKind::SingleNewLine {
            return None;
        }
        self.line_break_ranges.first().map(|r| r.end())
    }

    /// Range to delete to collapse blank lines into a single line break,
    /// keeping the first line break and the second element's indentation
    pub fn blank_lines_range(&self) -> Option<TextRange> {
        if self.kind != TriviaKind::BlankLine {
            return None;
        }
        let first = self.line_break_ranges.first()?;
        let last = self.line_break_ranges.last()?;
        Some(TextRange::new(first.end(), last.end()))
    }
}

/// Classify the trivia between two adjacent elements
///
/// Returns `None` when anything significant lies between them.
pub fn classify_between(a: &SyntaxElement, b: &SyntaxElement) -> Option<TriviaBlock> {
    let last = last_significant_token(a)?;
    let first = first_significant_token(b)?;
    classify_tokens(&last, &first)
}

/// Classify the trivia between two tokens that follow each other
pub fn classify_tokens(a: &SyntaxToken, b: &SyntaxToken) -> Option<TriviaBlock> {
    if next_significant_token(a).as_ref() != Some(b) {
        return None;
    }

    let mut line_break_ranges = Vec::new();
    let mut line_break_text = None;
    let mut has_comments = false;
    let mut has_directives = false;

    for trivia in trivia_after(a) {
        let kind = trivia.kind();
        if kind == SyntaxKind::Newline {
            line_break_ranges.push(trivia.text_range());
            if line_break_text.is_none() {
                line_break_text = Some(trivia.text().to_string());
            }
        } else if kind.is_comment() {
            has_comments = true;
        } else if kind.is_directive() {
            has_directives = true;
        }
    }

    let line_breaks = line_break_ranges.len();
    let kind = if has_comments || has_directives {
        TriviaKind::CommentBearing
    } else {
        match line_breaks {
            0 => TriviaKind::NoNewLine,
            1 => TriviaKind::SingleNewLine,
            _ => TriviaKind::BlankLine,
        }
    };

    Some(TriviaBlock {
        kind,
        range: TextRange::new(a.text_range().end(), b.text_range().start()),
        line_breaks,
        has_comments,
        has_directives,
        line_break_ranges,
        line_break_text: line_break_text.unwrap_or_else(|| "\n".to_string()),
    })
}

/// Indentation whitespace at the start of the line holding `token`, if the
/// token is the first on its line
pub fn line_indentation(token: &SyntaxToken) -> Option<String> {
    let prev = token.prev_token();
    match prev {
        None => Some(String::new()),
        Some(prev) if prev.kind() == SyntaxKind::Newline => Some(String::new()),
        Some(prev) if prev.kind() == SyntaxKind::Whitespace => {
            let before = prev.prev_token();
            match before {
                None => Some(prev.text().to_string()),
                Some(b) if b.kind() == SyntaxKind::Newline => Some(prev.text().to_string()),
                Some(_) => None,
            }
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::SyntaxTree;

    fn token_with_text(tree: &SyntaxTree, text: &str) -> SyntaxToken {
        tree.root()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.text() == text)
            .expect("token")
    }

    fn texts(tokens: &[SyntaxToken]) -> Vec<String> {
        tokens.iter().map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn test_leading_and_trailing_trivia() {
        let tree = SyntaxTree::parse("class C\n{\n    int a; // note\n    // doc\n    int b;\n}\n");
        let semicolon = tree
            .root()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::Semicolon)
            .expect("semicolon");
        assert_eq!(texts(&trailing_trivia(&semicolon)), vec![" ", "// note", "\n"]);

        let ints: Vec<_> = tree
            .root()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::IntKw)
            .collect();
        assert_eq!(texts(&leading_trivia(&ints[0])), vec!["    "]);
        assert_eq!(texts(&leading_trivia(&ints[1])), vec!["    ", "// doc", "\n", "    "]);
    }

    #[test]
    fn test_full_range_of_member() {
        let source = "class C\n{\n    int a;\n    int b;\n}\n";
        let tree = SyntaxTree::parse(source);
        let field = tree
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::FieldDeclaration)
            .expect("field");
        let range = full_range(&field);
        assert_eq!(&source[range], "    int a;\n");
    }

    #[test]
    fn test_leading_trivia_at_start_of_file() {
        let tree = SyntaxTree::parse("\n\n// header\nclass C { }");
        let class = token_with_text(&tree, "class");
        assert_eq!(leading_trivia(&class).len(), 4);
    }

    #[test]
    fn test_classify_between() {
        let source = "class C\n{\n    int a;\n\n    int b;\n    int c; int d;\n    // x\n    int e;\n}";
        let tree = SyntaxTree::parse(source);
        let fields: Vec<SyntaxElement> = tree
            .root()
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::FieldDeclaration)
            .map(NodeOrToken::Node)
            .collect();

        let blank = classify_between(&fields[0], &fields[1]).expect("adjacent");
        assert_eq!(blank.kind, TriviaKind::BlankLine);
        assert_eq!(blank.line_breaks, 2);
        let range = blank.blank_lines_range().expect("range");
        assert_eq!(&source[range], "\n");

        let single = classify_between(&fields[1], &fields[2]).expect("adjacent");
        assert_eq!(single.kind, TriviaKind::SingleNewLine);
        let point = single.blank_line_insertion_point().expect("point");
        assert_eq!(&source[usize::from(point)..usize::from(point) + 4], "    ");

        let same_line = classify_between(&fields[2], &fields[3]).expect("adjacent");
        assert_eq!(same_line.kind, TriviaKind::NoNewLine);

        let commented = classify_between(&fields[3], &fields[4]).expect("adjacent");
        assert_eq!(commented.kind, TriviaKind::CommentBearing);
        assert!(!commented.is_fixable());
        assert!(commented.blank_lines_range().is_none());

        assert!(classify_between(&fields[0], &fields[2]).is_none());
    }

    #[test]
    fn test_directives_make_trivia_comment_bearing() {
        let tree = SyntaxTree::parse("class C\n{\n    int a;\n#if X\n    int b;\n#endif\n}");
        let fields: Vec<SyntaxElement> = tree
            .root()
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::FieldDeclaration)
            .map(NodeOrToken::Node)
            .collect();
        let block = classify_between(&fields[0], &fields[1]).expect("adjacent");
        assert!(block.has_directives);
        assert_eq!(block.kind, TriviaKind::CommentBearing);
    }

    #[test]
    fn test_line_indentation() {
        let tree = SyntaxTree::parse("class C\n{\n    int a; int b;\n}");
        let ints: Vec<_> = tree
            .root()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::IntKw)
            .collect();
        assert_eq!(line_indentation(&ints[0]).as_deref(), Some("    "));
        assert_eq!(line_indentation(&ints[1]), None);
    }

    #[test]
    fn test_tokens_in_range() {
        let tree = SyntaxTree::parse("class C { int a; }");
        let root = tree.root();
        let in_range = |start: u32, end: u32| -> Vec<String> {
            tokens_in_range(&root, TextRange::new(start.into(), end.into()))
                .map(|t| t.text().to_string())
                .collect()
        };
        assert_eq!(in_range(10, 15), vec!["int", " ", "a"]);
        // partially covered tokens count
        assert_eq!(in_range(11, 16), vec!["int", " ", "a", ";"]);
        assert!(in_range(4, 4).is_empty());
        assert_eq!(in_range(17, 18), vec!["}"]);
    }
}
