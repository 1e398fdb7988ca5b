//! Parser for tweenscript.
//!
//! Recursive descent for statements, precedence climbing for binary
//! operators. The parser stops at the first syntax error: it records one
//! [`Diagnostic`], marks itself aborted and hands back every statement parsed
//! before the error.

use super::ast::*;
use super::error::Diagnostic;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};

type ParseResult<T> = Result<T, Diagnostic>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    aborted: bool,
    diagnostic: Option<Diagnostic>,
    /// Set while parsing a `repeat` count so `n { ... }` is not read as a constructor.
    no_constructor: bool,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col));
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line,
                col,
            });
        }
        Self {
            tokens,
            pos: 0,
            aborted: false,
            diagnostic: None,
            no_constructor: false,
        }
    }

    /// Parse statements until end of input or the first syntax error.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        if self.aborted {
            return statements;
        }
        loop {
            self.skip_semicolons();
            if self.is_at_end() {
                break;
            }
            let before = self.pos;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(diagnostic) => {
                    self.abort(diagnostic);
                    break;
                }
            }
            if self.pos == before {
                let t = self.peek();
                let diagnostic = Diagnostic::syntax("parser made no progress", t.line, t.col);
                self.abort(diagnostic);
                break;
            }
        }
        statements
    }

    /// Parse a single expression that must span the whole token stream.
    pub fn parse_standalone_expr(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_expr()?;
        if !self.is_at_end() {
            let t = self.peek();
            return Err(Diagnostic::syntax(
                format!("unexpected '{}' after expression", t.text),
                t.line,
                t.col,
            ));
        }
        Ok(expr)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    fn abort(&mut self, diagnostic: Diagnostic) {
        if !self.aborted {
            self.aborted = true;
            self.diagnostic = Some(diagnostic);
        }
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let (line, col) = self.position();

        if let TokenKind::Ident(word) = &self.peek().kind {
            match word.as_str() {
                "func" if matches!(self.peek_at(1).kind, TokenKind::Ident(_)) => {
                    return self.parse_func();
                }
                "repeat" => return self.parse_repeat(),
                "wait" => {
                    self.advance();
                    let duration = self.parse_expr()?;
                    return Ok(Stmt {
                        kind: StmtKind::Wait(duration),
                        line,
                        col,
                    });
                }
                "return" => return self.parse_return(),
                _ => {}
            }
        }

        let expr = self.parse_expr()?;
        if self.check(&TokenKind::Assign) {
            if !matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Member { .. }) {
                return Err(Diagnostic::syntax(
                    "invalid assignment target",
                    expr.line,
                    expr.col,
                ));
            }
            self.advance();
            let value = self.parse_expr()?;
            return Ok(Stmt {
                kind: StmtKind::Assignment {
                    target: expr,
                    value,
                },
                line,
                col,
            });
        }

        Ok(Stmt {
            kind: StmtKind::Expr(expr),
            line,
            col,
        })
    }

    fn parse_func(&mut self) -> ParseResult<Stmt> {
        let (line, col) = self.position();
        self.advance(); // func
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen, "'(' after function name")?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.expect_ident()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')' after parameters")?;
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::FuncDef(std::rc::Rc::new(FuncDef { name, params, body })),
            line,
            col,
        })
    }

    fn parse_repeat(&mut self) -> ParseResult<Stmt> {
        let (line, col) = self.position();
        self.advance(); // repeat
        let saved = std::mem::replace(&mut self.no_constructor, true);
        let count = self.parse_expr();
        self.no_constructor = saved;
        let count = count?;
        let body = self.parse_block()?;
        Ok(Stmt {
            kind: StmtKind::Repeat { count, body },
            line,
            col,
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let (line, col) = self.position();
        self.advance(); // return
        let next = self.peek();
        let has_value = next.line == line
            && !matches!(
                next.kind,
                TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof
            );
        let value = if has_value {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::Return(value),
            line,
            col,
        })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let saved = std::mem::replace(&mut self.no_constructor, false);
        let mut body = Vec::new();
        let result = loop {
            self.skip_semicolons();
            if self.eat(&TokenKind::RBrace) {
                break Ok(body);
            }
            if self.is_at_end() {
                let t = self.peek();
                break Err(Diagnostic::syntax("expected '}' before end of input", t.line, t.col));
            }
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(e) => break Err(e),
            }
        };
        self.no_constructor = saved;
        result
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = binary_op(&self.peek().kind) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            let (line, col) = self.position();
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                line,
                col,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let (line, col) = self.position();
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
            col,
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_ident()?;
                    let (line, col) = (expr.line, expr.col);
                    expr = Expr::new(
                        ExprKind::Member {
                            target: Box::new(expr),
                            name,
                        },
                        line,
                        col,
                    );
                }
                TokenKind::LParen => {
                    let args = self.parse_args()?;
                    let (line, col) = (expr.line, expr.col);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        line,
                        col,
                    );
                }
                TokenKind::LBrace if !self.no_constructor => {
                    let Some((type_name, args)) = constructor_head(&expr) else {
                        break;
                    };
                    let props = self.parse_props()?;
                    expr = Expr::new(
                        ExprKind::ObjectConstructor {
                            type_name,
                            args,
                            props,
                        },
                        expr.line,
                        expr.col,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let (line, col) = (token.line, token.col);
        let expr = |kind| Expr::new(kind, line, col);

        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(expr(ExprKind::Number(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(expr(ExprKind::String(s)))
            }
            TokenKind::InterpStr(s) => {
                self.advance();
                Ok(expr(ExprKind::Interp(interpolate_names(&s, line, col))))
            }
            TokenKind::SpliceStr(s) => {
                self.advance();
                Ok(expr(ExprKind::Interp(splice(&s, line, col)?)))
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list(&TokenKind::RBracket, "']'")?;
                Ok(expr(ExprKind::Array(items)))
            }
            TokenKind::LParen => {
                self.advance();
                let saved = std::mem::replace(&mut self.no_constructor, false);
                let inner = self.parse_expr();
                self.no_constructor = saved;
                let inner = inner?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if name == "true" || name == "false" {
                    return Ok(expr(ExprKind::Bool(name == "true")));
                }
                if name == "Add" && self.check(&TokenKind::LBrace) && !self.no_constructor {
                    self.advance();
                    let items = self.parse_list(&TokenKind::RBrace, "'}'")?;
                    return Ok(expr(ExprKind::Call {
                        callee: Box::new(expr(ExprKind::Ident(name))),
                        args: vec![Arg::Positional(expr(ExprKind::Array(items)))],
                    }));
                }
                Ok(expr(ExprKind::Ident(name)))
            }
            _ => Err(Diagnostic::syntax(
                format!("unexpected '{}'", describe(&token)),
                line,
                col,
            )),
        }
    }

    /// Comma-separated expressions up to `close`; the opener is already consumed.
    fn parse_list(&mut self, close: &TokenKind, what: &str) -> ParseResult<Vec<Expr>> {
        let saved = std::mem::replace(&mut self.no_constructor, false);
        let mut items = Vec::new();
        let result = loop {
            if self.eat(close) {
                break Ok(items);
            }
            match self.parse_expr() {
                Ok(item) => items.push(item),
                Err(e) => break Err(e),
            }
            if !self.eat(&TokenKind::Comma) {
                break self.expect(close, what).map(|_| items);
            }
        };
        self.no_constructor = saved;
        result
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Arg>> {
        self.expect(&TokenKind::LParen, "'('")?;
        let saved = std::mem::replace(&mut self.no_constructor, false);
        let result = self.parse_arg_list();
        self.no_constructor = saved;
        result
    }

    fn parse_arg_list(&mut self) -> ParseResult<Vec<Arg>> {
        let mut args = Vec::new();
        let mut seen_named = false;
        loop {
            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }
            let is_named = matches!(self.peek().kind, TokenKind::Ident(_))
                && self.peek_at(1).kind == TokenKind::Colon;
            if is_named {
                let name = self.expect_ident()?;
                self.advance(); // ':'
                args.push(Arg::Named(name, self.parse_expr()?));
                seen_named = true;
            } else {
                let (line, col) = self.position();
                if seen_named {
                    return Err(Diagnostic::syntax(
                        "positional argument after named argument",
                        line,
                        col,
                    ));
                }
                args.push(Arg::Positional(self.parse_expr()?));
            }
            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RParen, "')' after arguments")?;
                return Ok(args);
            }
        }
    }

    /// `{ key: value, ... }`; trailing comma optional.
    fn parse_props(&mut self) -> ParseResult<Vec<(String, Expr)>> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let saved = std::mem::replace(&mut self.no_constructor, false);
        let mut props = Vec::new();
        let result = loop {
            if self.eat(&TokenKind::RBrace) {
                break Ok(props);
            }
            let key = match self.peek().kind.clone() {
                TokenKind::Ident(name) | TokenKind::Str(name) => {
                    self.advance();
                    name
                }
                _ => {
                    let t = self.peek();
                    break Err(Diagnostic::syntax(
                        format!("expected property name, got '{}'", describe(t)),
                        t.line,
                        t.col,
                    ));
                }
            };
            if let Err(e) = self.expect(&TokenKind::Colon, "':' after property name") {
                break Err(e);
            }
            match self.parse_expr() {
                Ok(value) => props.push((key, value)),
                Err(e) => break Err(e),
            }
            if !self.eat(&TokenKind::Comma) {
                break self.expect(&TokenKind::RBrace, "'}'").map(|_| props);
            }
        };
        self.no_constructor = saved;
        result
    }

    // ── Token helpers ────────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn position(&self) -> (usize, usize) {
        let t = self.peek();
        (t.line, t.col)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_semicolons(&mut self) {
        while self.eat(&TokenKind::Semicolon) {}
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            let t = self.peek();
            Err(Diagnostic::syntax(
                format!("expected {what}, got '{}'", describe(t)),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => {
                let t = self.peek();
                Err(Diagnostic::syntax(
                    format!("expected identifier, got '{}'", describe(t)),
                    t.line,
                    t.col,
                ))
            }
        }
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        _ => return None,
    })
}

/// The type name and positional arguments when `expr` may take constructor braces.
fn constructor_head(expr: &Expr) -> Option<(String, Vec<Arg>)> {
    match &expr.kind {
        ExprKind::Ident(name) => Some((name.clone(), Vec::new())),
        ExprKind::Call { callee, args } => match &callee.kind {
            ExprKind::Ident(name) => Some((name.clone(), args.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn describe(token: &Token) -> &str {
    if token.kind == TokenKind::Eof {
        "end of input"
    } else {
        &token.text
    }
}

/// Split `text` into literal runs and brace-balanced `{...}` spans.
/// An unbalanced `{` is kept as literal text.
fn brace_spans(text: &str) -> Vec<(bool, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            let mut depth = 0usize;
            let mut end = None;
            for (j, &c) in chars.iter().enumerate().skip(i) {
                if c == '{' {
                    depth += 1;
                } else if c == '}' {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(j);
                        break;
                    }
                }
            }
            if let Some(end) = end {
                if !literal.is_empty() {
                    parts.push((false, std::mem::take(&mut literal)));
                }
                parts.push((true, chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        }
        literal.push(chars[i]);
        i += 1;
    }
    if !literal.is_empty() {
        parts.push((false, literal));
    }
    parts
}

/// `$<...>`: each `{expr}` span is lexed and parsed as a sub-expression.
fn splice(text: &str, line: usize, col: usize) -> ParseResult<Vec<InterpPart>> {
    let mut parts = Vec::new();
    for (is_expr, content) in brace_spans(text) {
        if !is_expr {
            parts.push(InterpPart::Text(content));
            continue;
        }
        let mut lexer = Lexer::with_position(&content, line, col);
        let tokens = lexer.tokenize();
        let mut parser = Parser::new(tokens);
        parts.push(InterpPart::Expr(parser.parse_standalone_expr()?));
    }
    Ok(parts)
}

/// `&<...>`: each `{name}` or `{obj.prop}` span reads a variable at run time.
/// Anything else inside braces stays literal.
fn interpolate_names(text: &str, line: usize, col: usize) -> Vec<InterpPart> {
    brace_spans(text)
        .into_iter()
        .map(|(is_expr, content)| {
            if is_expr {
                if let Some(expr) = dotted_name(content.trim(), line, col) {
                    return InterpPart::Expr(expr);
                }
                return InterpPart::Text(format!("{{{content}}}"));
            }
            InterpPart::Text(content)
        })
        .collect()
}

fn dotted_name(path: &str, line: usize, col: usize) -> Option<Expr> {
    let is_name = |s: &str| {
        let mut chars = s.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    };
    let mut segments = path.split('.');
    let first = segments.next().filter(|s| is_name(s))?;
    let mut expr = Expr::new(ExprKind::Ident(first.to_string()), line, col);
    for segment in segments {
        if !is_name(segment) {
            return None;
        }
        expr = Expr::new(
            ExprKind::Member {
                target: Box::new(expr),
                name: segment.to_string(),
            },
            line,
            col,
        );
    }
    Some(expr)
}
