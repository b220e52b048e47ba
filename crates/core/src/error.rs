//! Error types for reviewlens.
//!
//! Every pipeline stage reports through one enum so the interactive layer can
//! tell which stage failed: authentication, query rewriting, retrieval,
//! embedding or answer synthesis.

use thiserror::Error;

/// Unified error type for reviewlens.
///
/// All fallible functions return `Result<T, AppError>`. Remote failures are
/// never turned into empty results.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown secret, or a gated retrieval without a logged-in session
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rewriter output had no usable term list. Only raised when strict term
    /// extraction is on; otherwise the rewriter searches with the question.
    #[error("Could not parse search terms: {0}")]
    RewriteParse(String),

    /// Search service errors
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Chat completion errors (rewrite or synthesis)
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Embedding endpoint errors
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Caller supplied something unusable (e.g. an empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Short name of the failing stage, for user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "login",
            AppError::RewriteParse(_) => "term extraction",
            AppError::Retrieval(_) => "search",
            AppError::Generation(_) => "generation",
            AppError::Embedding(_) => "embedding",
            AppError::InvalidInput(_) => "input",
            AppError::Config(_) => "configuration",
            AppError::Prompt(_) => "prompt",
            AppError::Io(_) | AppError::Serialization(_) | AppError::Other(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
