use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // --- Transport ---
    TransportFailed,
    HttpStatus,

    // --- Configuration ---
    InvalidSettings,
}

/// Error taxonomy of the crate. Only transport-class failures cross the
/// component boundary; cancellation is a terminal state, not an error, and
/// template/payload anomalies are absorbed with documented fallbacks.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Transport Error: {message}")]
    Transport { code: ErrorCode, message: String },

    #[error("HTTP Error: {message} (status: {status})")]
    Http {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    #[error("Config Error: {message} (context: {context})")]
    Config {
        code: ErrorCode,
        message: String,
        context: String,
    },
}
