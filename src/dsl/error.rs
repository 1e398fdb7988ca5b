//! Diagnostics emitted by the script front end.

use thiserror::Error;

/// A problem found while lexing or parsing a script.
///
/// Diagnostics never abort the process: the lexer folds bad input into a
/// best-effort token and the parser stops at the first syntax error, keeping
/// every statement parsed before it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{line}:{col}] {kind:?}: {message}")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Syntax,
}

impl Diagnostic {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: DiagnosticKind::Lex,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: DiagnosticKind::Syntax,
        }
    }
}
