// Lexer for Mesh .mesh source files.
//
// Tokenizes source using the `logos` crate for DFA-based lexing.
// Comments run from `%` to end of line; whitespace (including newlines)
// is insignificant because statements are `;`/`end` delimited.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex
//   errors.
// Failure modes: unrecognized characters produce `LexError`; lexing
//   continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Mesh token types.
///
/// Keywords and symbols are matched as fixed strings. Numeric literals
/// carry parsed values. Identifiers carry no value — use the span to
/// retrieve the text from the source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+|%[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("element")]
    Element,
    #[token("extern")]
    Extern,
    #[token("func")]
    Func,
    #[token("proc")]
    Proc,
    #[token("end")]
    End,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("inout")]
    Inout,
    #[token("while")]
    While,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("print")]
    Print,
    #[token("map")]
    Map,
    #[token("to")]
    To,
    #[token("reduce")]
    Reduce,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("xor")]
    Xor,
    #[token("not")]
    Not,
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("bool")]
    Bool,
    #[token("tensor")]
    Tensor,
    #[token("set")]
    Set,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // ── Symbols ──
    #[token("->")]
    Arrow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("'")]
    Apostrophe,
    #[token("=")]
    Assign,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,

    // ── Literals ──
    //
    // The float regex must cover fractional and exponent forms so the
    // longer match wins over a bare integer prefix.
    /// Floating-point literal.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+", parse_float)]
    FloatLit(f64),

    /// Integer literal.
    #[regex(r"[0-9]+", parse_int)]
    IntLit(i64),

    // ── Identifier ──
    //
    // Placed after keywords — logos prioritizes fixed `#[token]` matches
    // over regex for the same length, so `map` matches Map, not Ident.
    /// Identifier: `[a-zA-Z_][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Element => write!(f, "element"),
            Token::Extern => write!(f, "extern"),
            Token::Func => write!(f, "func"),
            Token::Proc => write!(f, "proc"),
            Token::End => write!(f, "end"),
            Token::Var => write!(f, "var"),
            Token::Const => write!(f, "const"),
            Token::Inout => write!(f, "inout"),
            Token::While => write!(f, "while"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::Print => write!(f, "print"),
            Token::Map => write!(f, "map"),
            Token::To => write!(f, "to"),
            Token::Reduce => write!(f, "reduce"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Xor => write!(f, "xor"),
            Token::Not => write!(f, "not"),
            Token::Int => write!(f, "int"),
            Token::Float => write!(f, "float"),
            Token::Bool => write!(f, "bool"),
            Token::Tensor => write!(f, "tensor"),
            Token::Set => write!(f, "set"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::Apostrophe => write!(f, "'"),
            Token::Assign => write!(f, "="),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::DotStar => write!(f, ".*"),
            Token::DotSlash => write!(f, "./"),
            Token::FloatLit(v) => write!(f, "{v}"),
            Token::IntLit(v) => write!(f, "{v}"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Callbacks ──

fn parse_int(lex: &mut logos::Lexer<'_, Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<'_, Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

// ── Public API ──

/// Lex a Mesh source string into tokens.
///
/// Returns all successfully parsed tokens together with any errors for
/// unrecognized characters. Lexing is non-fatal: errors are collected and
/// the lexer continues past bad characters.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: format!("unexpected character: {:?}", &source[span.start..span.end]),
            }),
        }
    }

    LexResult { tokens, errors }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        let result = lex(source);
        assert!(result.errors.is_empty(), "lex errors: {:?}", result.errors);
        result.tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("element Point end"),
            vec![Token::Element, Token::Ident, Token::End]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            kinds("3 3.5 1e3 2.5e-2"),
            vec![
                Token::IntLit(3),
                Token::FloatLit(3.5),
                Token::FloatLit(1e3),
                Token::FloatLit(2.5e-2),
            ]
        );
    }

    #[test]
    fn elementwise_operators() {
        assert_eq!(
            kinds("a .* b ./ c"),
            vec![
                Token::Ident,
                Token::DotStar,
                Token::Ident,
                Token::DotSlash,
                Token::Ident,
            ]
        );
    }

    #[test]
    fn int_then_elwise_star_does_not_lex_as_float() {
        assert_eq!(
            kinds("3.*x"),
            vec![Token::IntLit(3), Token::DotStar, Token::Ident]
        );
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            kinds("a <= b == c != d"),
            vec![
                Token::Ident,
                Token::Le,
                Token::Ident,
                Token::Eq,
                Token::Ident,
                Token::Ne,
                Token::Ident,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("x % trailing comment\ny"),
            vec![Token::Ident, Token::Ident]
        );
    }

    #[test]
    fn spans_cover_lexemes() {
        let result = lex("var xy");
        assert_eq!(result.tokens[0].1, Span { start: 0, end: 3 });
        assert_eq!(result.tokens[1].1, Span { start: 4, end: 6 });
    }

    #[test]
    fn unknown_character_is_nonfatal() {
        let result = lex("x # y");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.tokens.len(), 2);
    }

    #[test]
    fn transpose_and_column_mark() {
        assert_eq!(
            kinds("A' = b;"),
            vec![
                Token::Ident,
                Token::Apostrophe,
                Token::Assign,
                Token::Ident,
                Token::Semicolon,
            ]
        );
    }
}
