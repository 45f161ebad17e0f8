use thiserror::Error;

/// Errors raised by the actor core.
///
/// Missing optional resources (animation files, keeper tables) are never
/// reported through this type; they resolve to `false`/`None` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// A required column is absent from a table record.
    #[error("record {record} is missing required column `{column}`")]
    MissingField { column: String, record: usize },

    /// State was read before it was initialised.
    #[error("invalid actor state: {0}")]
    InvalidState(&'static str),

    /// A tabular resource could not be parsed.
    #[error("table parse error on line {line}: {message}")]
    Table { line: usize, message: String },

    /// An animation track could not be decoded.
    #[error("unable to decode animation track {name}: {message}")]
    Track { name: String, message: String },
}

pub type ActorResult<T> = std::result::Result<T, ActorError>;
