//! Errors raised by the command layer itself.

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("SESSION_ERROR: sessions are disabled (session_persist = false)")]
    SessionsDisabled,

    #[error("SESSION_NOT_FOUND: {0}")]
    UnknownSession(String),

    #[error("INVALID_INPUT: {0}")]
    InvalidArgument(String),
}
