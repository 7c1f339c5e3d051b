//! Error handling for Pascal8

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer/Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Illegal character '{ch}'")]
    IllegalCharacter { ch: char, span: Span },

    // ==================== Name Errors ====================

    #[error("Undefined name: {name}")]
    NameUndefined { name: String, span: Span },

    #[error("Redefinition of {name}")]
    NameRedefinition {
        name: String,
        span: Span,
        /// Where the first declaration lives (`None` for builtins)
        previous: Option<Span>,
    },

    // ==================== Type Errors ====================

    #[error("Attempt to assign constant variable {name}")]
    AssignToConst { name: String, span: Span },

    #[error("{name} is not a variable")]
    NotAVariable { name: String, span: Span },

    #[error("{name} is not a procedure")]
    NotAProcedure { name: String, span: Span },

    #[error("Wrong arguments count for {name}: expected {expected}, got {got}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Operation unimplemented: {op}")]
    UnimplementedOperator { op: String, span: Span },

    #[error("Can't parse literal {text}")]
    InvalidLiteral { text: String, span: Span },

    #[error("Frame of {name} needs {size} bytes, at most 255 fit")]
    FrameTooLarge { name: String, size: usize, span: Span },

    // ==================== Fatal ====================

    #[error("Internal compiler error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::IllegalCharacter { span, .. } => Some(*span),
            Self::NameUndefined { span, .. } => Some(*span),
            Self::NameRedefinition { span, .. } => Some(*span),
            Self::AssignToConst { span, .. } => Some(*span),
            Self::NotAVariable { span, .. } => Some(*span),
            Self::NotAProcedure { span, .. } => Some(*span),
            Self::WrongArgumentCount { span, .. } => Some(*span),
            Self::UnimplementedOperator { span, .. } => Some(*span),
            Self::InvalidLiteral { span, .. } => Some(*span),
            Self::FrameTooLarge { span, .. } => Some(*span),
            Self::Internal(_) => None,
        }
    }

    /// Secondary location shown as a note
    pub fn note(&self) -> Option<(Span, &'static str)> {
        match self {
            Self::NameRedefinition {
                previous: Some(prev),
                ..
            } => Some((*prev, "previous declared here")),
            _ => None,
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedToken { .. } => "E0001",
            Self::IllegalCharacter { .. } => "E0002",
            Self::NameUndefined { .. } => "E0101",
            Self::NameRedefinition { .. } => "E0102",
            Self::AssignToConst { .. } => "E0201",
            Self::NotAVariable { .. } => "E0202",
            Self::NotAProcedure { .. } => "E0203",
            Self::WrongArgumentCount { .. } => "E0204",
            Self::UnimplementedOperator { .. } => "E0205",
            Self::InvalidLiteral { .. } => "E0206",
            Self::FrameTooLarge { .. } => "E0301",
            Self::Internal(_) => "E0900",
        }
    }

    /// Broken cross-pass invariant; never a user mistake
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Compiler warning, never fatal
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    #[error("Variable {name} may be used uninitialized")]
    UninitializedRead { name: String, span: Span },

    #[error("Unused variable {name}")]
    UnusedVariable { name: String, span: Span },

    #[error("Procedure {name} is never called")]
    UnusedProcedure { name: String, span: Span },
}

impl Warning {
    pub fn span(&self) -> Span {
        match self {
            Self::UninitializedRead { span, .. }
            | Self::UnusedVariable { span, .. }
            | Self::UnusedProcedure { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UninitializedRead { .. } => "W0001",
            Self::UnusedVariable { .. } => "W0002",
            Self::UnusedProcedure { .. } => "W0003",
        }
    }
}
