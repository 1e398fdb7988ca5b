//! Token types for the tweenscript lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text the token was read from.
    pub text: String,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
///
/// Keywords (`func`, `repeat`, `wait`, `return`, `true`, `false`) are lexed as
/// plain identifiers; the parser decides when a leading identifier is a keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Ident(String),
    Number(f64),
    /// `<...>` or `"..."`, used verbatim.
    Str(String),
    /// `&<...>`: `{name}` spans resolve against variables at run time.
    InterpStr(String),
    /// `$<...>`: `{expr}` spans are re-lexed and parsed as sub-expressions.
    SpliceStr(String),

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Assign, // =

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,

    /// Any character the lexer does not recognise, kept as a one-character operator.
    Symbol(char),

    // Special
    Eof,
}

impl TokenKind {
    /// Whether a token of this kind can end an operand. Used to tell a `<` comparison
    /// apart from the start of a `<...>` string literal.
    ///
    /// `return` and `repeat` are followed by an expression, so they do not end one.
    pub fn ends_operand(&self) -> bool {
        match self {
            TokenKind::Ident(name) => !matches!(name.as_str(), "return" | "repeat"),
            _ => matches!(
                self,
                TokenKind::Number(_)
                    | TokenKind::Str(_)
                    | TokenKind::InterpStr(_)
                    | TokenKind::SpliceStr(_)
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
            ),
        }
    }
}
