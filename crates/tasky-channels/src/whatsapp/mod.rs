//! WhatsApp Cloud API channel.
//!
//! Sends text messages through the Graph API `messages` endpoint and
//! resolves media ids to downloadable bytes. Inbound payload parsing lives
//! in [`parse`].
//! Docs: <https://developers.facebook.com/docs/whatsapp/cloud-api>

pub mod parse;

pub use parse::{is_genuine_message_event, parse_message};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tasky_core::{config::WhatsAppConfig, error::TaskyError, traits::Sender};
use tracing::{debug, error};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// WhatsApp Cloud API client.
#[derive(Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    access_token: String,
    phone_number_id: String,
    api_version: String,
}

/// Media metadata returned for a media id.
#[derive(Deserialize)]
struct MediaInfo {
    url: Option<String>,
}

impl WhatsAppClient {
    /// Create a new client from config.
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            api_version: config.api_version.clone(),
        }
    }

    /// Download media bytes by id.
    ///
    /// Two steps: resolve the id to a transient download URL, then fetch the
    /// bytes with the same bearer token.
    pub async fn download_media(&self, media_id: &str) -> Result<Vec<u8>, TaskyError> {
        let url = format!("{GRAPH_BASE_URL}/{}/{media_id}", self.api_version);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| TaskyError::Channel(format!("media lookup failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(TaskyError::Channel(format!(
                "media lookup returned {status}"
            )));
        }

        let info: MediaInfo = resp
            .json()
            .await
            .map_err(|e| TaskyError::Channel(format!("media lookup parse failed: {e}")))?;

        let download_url = info
            .url
            .ok_or_else(|| TaskyError::Channel("media lookup returned no url".into()))?;

        let bytes = self
            .client
            .get(&download_url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| TaskyError::Channel(format!("media download failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| TaskyError::Channel(format!("media read failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Sender for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), TaskyError> {
        let url = format!(
            "{GRAPH_BASE_URL}/{}/{}/messages",
            self.api_version, self.phone_number_id
        );

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        });

        debug!("whatsapp: POST messages to {to}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TaskyError::Channel(format!("whatsapp send failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(200).collect();
            error!("failed to send WhatsApp message (status {status}): {truncated}");
            return Err(TaskyError::Channel(format!(
                "whatsapp send returned {status}"
            )));
        }

        Ok(())
    }
}
