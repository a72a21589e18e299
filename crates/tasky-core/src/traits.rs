use crate::error::TaskyError;
use async_trait::async_trait;

/// Conversational agent boundary.
///
/// Consumes `(user_id, session_id, message)` and returns the agent's final
/// textual reply. Implementations own their tool dispatch and session memory.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Human-readable agent name.
    fn name(&self) -> &str;

    /// Run one conversational turn and return the final reply text.
    async fn reply(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<String, TaskyError>;

    /// One-shot text generation without tools or session memory
    /// (used by the daily summary).
    async fn generate(&self, prompt: &str) -> Result<String, TaskyError>;
}

/// Outbound message boundary — posts a text reply back to the platform.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Human-readable sender name.
    fn name(&self) -> &str;

    /// Send a text message to a phone number.
    async fn send_text(&self, to: &str, body: &str) -> Result<(), TaskyError>;
}

/// Voice-note transcription boundary: fetch the referenced media and turn it
/// into text. An empty transcript means nothing usable was recognized.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media_id: &str) -> Result<String, TaskyError>;
}
