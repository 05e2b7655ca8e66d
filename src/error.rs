//! Error types for query compilation

use thiserror::Error;

/// Result alias used throughout the compiler
pub type Result<T> = std::result::Result<T, CompileError>;

/// Failure of a single compile call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The grammar rejected the query text
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A date field expression could not be understood
    #[error("invalid date expression `{0}`")]
    DateSyntax(String),

    /// A field, date, range or match-all operand appeared inside a proximity search
    #[error("proximity search cannot contain {0}")]
    ProximityScope(String),

    /// A proximity operand was reduced to nothing by the analyzer
    #[error("proximity search cannot contain stop words")]
    ProximityOnStopWord,

    /// The whole query reduced to nothing
    #[error("query `{0}` produced no searchable terms")]
    EmptyResult(String),

    /// The configuration is inconsistent
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A configured find/replace pattern is not a valid regex
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl CompileError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Stable short code, useful for callers that map errors to user messages
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Syntax { .. } => "syntax",
            CompileError::DateSyntax(_) => "date_syntax",
            CompileError::ProximityScope(_) => "proximity_scope",
            CompileError::ProximityOnStopWord => "proximity_stop_word",
            CompileError::EmptyResult(_) => "empty_result",
            CompileError::Configuration(_) => "configuration",
            CompileError::InvalidPattern { .. } => "configuration",
        }
    }
}
