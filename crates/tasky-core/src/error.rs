use thiserror::Error;

/// Top-level error type for Tasky.
#[derive(Debug, Error)]
pub enum TaskyError {
    /// Error from the messaging channel (WhatsApp Cloud API, media download).
    #[error("channel error: {0}")]
    Channel(String),

    /// Error from the agent runtime (Gemini API, tool loop).
    #[error("agent error: {0}")]
    Agent(String),

    /// Storage error.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Input validation error. Distinct from `Store` so callers can report
    /// bad input as ordinary data instead of a connectivity failure.
    #[error("{0}")]
    Validation(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
