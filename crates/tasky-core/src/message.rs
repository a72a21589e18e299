use serde::{Deserialize, Serialize};

/// What kind of content an inbound message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
}

/// The canonical record extracted from a webhook payload, regardless of how
/// deeply the platform nests it. Every field has a safe default so parsing
/// never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Sender display name ("Unknown User" when the payload carries none).
    pub username: String,
    /// Sender phone number (empty when missing).
    pub phone_number: String,
    /// Message body text. Empty for audio messages pending transcription.
    pub message: String,
    pub kind: MessageKind,
    /// Media reference for audio messages.
    pub audio_id: Option<String>,
}

impl Default for NormalizedMessage {
    fn default() -> Self {
        Self {
            username: "Unknown User".to_string(),
            phone_number: String::new(),
            message: String::new(),
            kind: MessageKind::Text,
            audio_id: None,
        }
    }
}
