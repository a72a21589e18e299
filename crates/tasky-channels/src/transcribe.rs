//! Voice-note transcription via the OpenAI Whisper API.

use async_trait::async_trait;
use serde::Deserialize;
use tasky_core::{error::TaskyError, traits::Transcriber};
use tracing::info;

use crate::whatsapp::WhatsAppClient;

/// Whisper API response.
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Fetches a voice note from the messaging platform and transcribes it.
pub struct WhisperTranscriber {
    whatsapp: WhatsAppClient,
    client: reqwest::Client,
    api_key: String,
}

impl WhisperTranscriber {
    pub fn new(whatsapp: WhatsAppClient, api_key: String) -> Self {
        Self {
            whatsapp,
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, media_id: &str) -> Result<String, TaskyError> {
        let audio_bytes = self.whatsapp.download_media(media_id).await?;
        let transcript = transcribe_whisper(&self.client, &self.api_key, &audio_bytes).await?;
        info!("transcribed voice message ({} bytes)", audio_bytes.len());
        Ok(transcript.trim().to_string())
    }
}

/// Transcribe audio bytes via OpenAI Whisper API.
pub async fn transcribe_whisper(
    client: &reqwest::Client,
    api_key: &str,
    audio_bytes: &[u8],
) -> Result<String, TaskyError> {
    let part = reqwest::multipart::Part::bytes(audio_bytes.to_vec())
        .file_name("voice.ogg")
        .mime_str("audio/ogg")
        .map_err(|e| TaskyError::Channel(format!("whisper mime error: {e}")))?;

    let form = reqwest::multipart::Form::new()
        .text("model", "whisper-1")
        .part("file", part);

    let resp = client
        .post("https://api.openai.com/v1/audio/transcriptions")
        .bearer_auth(api_key)
        .multipart(form)
        .send()
        .await
        .map_err(|e| TaskyError::Channel(format!("whisper request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TaskyError::Channel(format!(
            "whisper API error {status}: {body}"
        )));
    }

    let result: WhisperResponse = resp
        .json()
        .await
        .map_err(|e| TaskyError::Channel(format!("whisper response parse failed: {e}")))?;

    Ok(result.text)
}
