use thiserror::Error;

/// Top-level error type for the whole engine.
/// Each variant corresponds to a distinct condition class; none are retried.
#[derive(Error, Debug)]
pub enum TyrError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("shape error: {0}")]
    Shape(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("function error: {0}")]
    Function(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("round trip mismatch:\n  expected: {expected}\n    actual: {actual}")]
    RoundTripMismatch { expected: String, actual: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl TyrError {
    /// Shorthand for a `TypeMismatch` from anything printable.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub type TyrResult<T> = Result<T, TyrError>;
