use thiserror::Error;

/// The two error classes of the translation engine.
///
/// `Unmappable` is recoverable and expected: the build orchestrator converts
/// it into the degraded/residual fallback and never surfaces it to the caller
/// when partial mappings are allowed. `Invalid` marks a violated precondition
/// (a caller or schema bug) and always fails the whole build.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("cannot map to SQL: {0}")]
    Unmappable(String),

    #[error("invalid filter: {0}")]
    Invalid(String),
}

impl TranslateError {
    pub fn unmappable(msg: impl Into<String>) -> TranslateError {
        TranslateError::Unmappable(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> TranslateError {
        TranslateError::Invalid(msg.into())
    }

    pub fn is_unmappable(&self) -> bool {
        matches!(self, TranslateError::Unmappable(_))
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
