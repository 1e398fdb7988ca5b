//! Script front end: source text → tokens → statement list.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::{Diagnostic, DiagnosticKind};

use lexer::Lexer;
use parser::Parser;

/// A parsed script: every statement before the first syntax error, plus all diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub statements: Vec<Stmt>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Script {
    /// Lex and parse `source`. Never fails; problems are logged and kept in
    /// [`Script::diagnostics`].
    pub fn parse(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize();
        let mut diagnostics = lexer.take_diagnostics();

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        if let Some(diagnostic) = parser.diagnostic() {
            diagnostics.push(diagnostic.clone());
        }

        for diagnostic in &diagnostics {
            log::warn!("{diagnostic}");
        }

        Self {
            statements,
            diagnostics,
        }
    }

    /// Whether parsing stopped early on a syntax error.
    pub fn is_truncated(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Syntax)
    }
}
