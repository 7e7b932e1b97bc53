// ABOUTME: Error types for the lexer, parser, and evaluator

use thiserror::Error;

/// A source position, attached to lexer/parser errors and AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("lexer error at {pos}: {message}")]
pub struct LexError {
    pub message: String,
    pub pos: Pos,
}

impl LexError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse error at {pos}: {message}{}", .lexeme.as_ref().map(|l| format!(" (near '{l}')")).unwrap_or_default())]
pub struct ParseError {
    pub message: String,
    pub pos: Pos,
    pub lexeme: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: Pos, lexeme: Option<String>) -> Self {
        Self {
            message: message.into(),
            pos,
            lexeme,
        }
    }
}

pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";

/// Runtime control-flow signals. Evaluation plumbs these alongside real
/// errors (spec.md's "exceptional signal" model), and `try/catch` must let
/// them pass through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Break,
    Continue,
    Return,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Type mismatch: function name, expected type, actual type, argument position.
    #[error("{function}: expected {expected}, got {actual} (argument {position})")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    /// Arity mismatch: function name, expected count/range, actual count.
    #[error("{function}: expected {expected} argument(s), got {actual}")]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: {message}")]
    RuntimeError { function: String, message: String },

    #[error("Undefined function or variable '{0}'")]
    UndefinedSymbol(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A user error raised via `error(...)`, with an optional MException-style identifier.
    #[error("{message}")]
    UserError {
        message: String,
        identifier: Option<String>,
    },

    /// Not a real error: a break/continue/return propagating out of a block.
    /// `try/catch` must distinguish this from the variants above and must not catch it.
    #[error("control-flow signal escaped evaluation")]
    Control(Signal),
}

impl EvalError {
    pub fn type_error(
        function: &str,
        expected: &str,
        actual: &crate::value::Value,
        position: usize,
    ) -> Self {
        EvalError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        EvalError::RuntimeError {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        EvalError::UserError {
            message: message.into(),
            identifier: None,
        }
    }

    /// True for signals that try/catch must let pass through unmodified.
    pub fn is_control(&self) -> bool {
        matches!(self, EvalError::Control(_))
    }
}

/// The three error kinds the embedder distinguishes (spec.md §6, §7).
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] EvalError),
}
