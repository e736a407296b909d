//! Turtle errors

#[derive(Debug, thiserror::Error)]
pub enum TurtleError {
    /// Invalid token; `message` carries a source excerpt.
    #[error("lexer error at line {line}, column {column}: {message}")]
    Lexer {
        position: usize,
        line: usize,
        column: usize,
        message: String,
    },

    /// Unexpected token or structure.
    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// Relative IRI with no base to resolve it against.
    #[error("cannot resolve IRI: {0}")]
    IriResolution(String),

    #[error("undefined prefix '{0}:'")]
    UndefinedPrefix(String),
}

pub type Result<T> = std::result::Result<T, TurtleError>;

impl TurtleError {
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Byte offset into the parsed text, for lexer and parse errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Lexer { position, .. } | Self::Parse { position, .. } => Some(*position),
            Self::IriResolution(_) | Self::UndefinedPrefix(_) => None,
        }
    }

    /// The error without its location.
    pub fn detail(&self) -> String {
        match self {
            Self::Lexer { message, .. } | Self::Parse { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
