//! Lexer for tweenscript.
//!
//! Converts source text into a stream of [`Token`]s. The lexer never fails:
//! characters it cannot place become [`TokenKind::Symbol`] tokens, unclosed
//! strings run to the end of input, and every problem is recorded as a
//! [`Diagnostic`] for the caller to report.

use super::error::Diagnostic;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    /// Whether the previously emitted token can end an operand.
    after_operand: bool,
    finished: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self::with_position(source, 1, 1)
    }

    /// Create a lexer whose positions start at `line:col`. Used when re-lexing
    /// spans embedded in a string literal so diagnostics point into the script.
    pub fn with_position(source: &str, line: usize, col: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
            col,
            after_operand: false,
            finished: false,
            diagnostics: Vec::new(),
        }
    }

    /// Lex the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Problems found so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Produce the next token. After the end of input this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let line = self.line;
        let col = self.col;
        let start = self.pos;

        if self.is_at_end() {
            self.finished = true;
            return Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line,
                col,
            };
        }

        let ch = self.advance();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => self.pick('=', TokenKind::EqEq, TokenKind::Assign),
            '!' => self.pick('=', TokenKind::NotEq, TokenKind::Bang),
            '>' => self.pick('=', TokenKind::GtEq, TokenKind::Gt),
            '<' if self.after_operand => self.pick('=', TokenKind::LtEq, TokenKind::Lt),
            '<' => TokenKind::Str(self.lex_angle_body(line, col)),
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::AndAnd
            }
            '&' if self.peek() == Some('<') => {
                self.advance();
                TokenKind::InterpStr(self.lex_angle_body(line, col))
            }
            '$' if self.peek() == Some('<') => {
                self.advance();
                TokenKind::SpliceStr(self.lex_angle_body(line, col))
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::OrOr
            }
            '"' => TokenKind::Str(self.lex_quoted(line, col)),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.lex_number(start),
            '.' => TokenKind::Dot,
            '0'..='9' => self.lex_number(start),
            c if c.is_alphabetic() || c == '_' => self.lex_ident(start),
            other => {
                self.diagnostics.push(Diagnostic::lex(
                    format!("unexpected character: '{other}'"),
                    line,
                    col,
                ));
                TokenKind::Symbol(other)
            }
        };

        self.after_operand = kind.ends_operand();
        let text: String = self.chars[start..self.pos].iter().collect();
        Token {
            kind,
            text,
            line,
            col,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.finished || self.pos >= self.chars.len()
    }

    /// One-character lookahead for two-character operators.
    fn pick(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Body of a `<...>`-style literal; the opening `<` is already consumed.
    /// A `>` inside a `{...}` span does not close the literal.
    fn lex_angle_body(&mut self, line: usize, col: usize) -> String {
        let mut body = String::new();
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '>' if depth == 0 => {
                    self.advance();
                    return body;
                }
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            body.push(self.advance());
        }
        self.diagnostics
            .push(Diagnostic::lex("unclosed string literal", line, col));
        body
    }

    fn lex_quoted(&mut self, line: usize, col: usize) -> String {
        let mut body = String::new();
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '"' {
                return body;
            }
            body.push(ch);
        }
        self.diagnostics
            .push(Diagnostic::lex("unclosed string literal", line, col));
        body
    }

    fn lex_number(&mut self, start: usize) -> TokenKind {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let seen_dot = self.chars[start..self.pos].contains(&'.');
        if !seen_dot
            && self.peek() == Some('.')
            && self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        TokenKind::Number(text.parse().unwrap_or(0.0))
    }

    fn lex_ident(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        TokenKind::Ident(self.chars[start..self.pos].iter().collect())
    }
}
