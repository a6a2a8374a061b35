// Error types for the orchestration engine

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while orchestrating an interview
#[derive(Debug, Error)]
pub enum EngineError {
    /// Session does not exist in the store
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Language tag is not in the supported set
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Candidate input does not match what the current stage accepts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Narrative/challenge generation error
    #[error("Generation error: {0}")]
    Generation(String),

    /// Sandbox execution error
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Create an invalid-input error
    pub fn input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        EngineError::Generation(msg.into())
    }

    /// Create a sandbox error
    pub fn sandbox(msg: impl Into<String>) -> Self {
        EngineError::Sandbox(msg.into())
    }

    /// Create a session-not-found error
    pub fn session_not_found(session_id: Uuid) -> Self {
        EngineError::SessionNotFound(session_id)
    }
}
