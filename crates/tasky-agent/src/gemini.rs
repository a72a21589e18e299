//! Google Gemini API client.
//!
//! Calls the `generateContent` endpoint, including the function-calling
//! surface. Auth via URL query param.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tasky_core::error::TaskyError;
use tracing::{debug, warn};

use crate::tools::ToolDef;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GeminiTool {
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<ToolDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiContent {
    pub fn user_text(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
                ..Default::default()
            }],
        }
    }

    pub fn model_text(text: &str) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
                ..Default::default()
            }],
        }
    }

    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
                ..Default::default()
            }],
        }
    }

    pub fn function_response(name: &str, response: Value) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                function_response: Some(FunctionResponse {
                    name: name.to_string(),
                    response,
                }),
                ..Default::default()
            }],
        }
    }
}

impl GeminiClient {
    /// Create a client from an API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Call `generateContent` and return the first candidate's content.
    pub(crate) async fn generate(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiContent, TaskyError> {
        let url = format!(
            "{GEMINI_BASE_URL}/models/{model}:generateContent?key={}",
            self.api_key
        );
        debug!("gemini: POST models/{model}:generateContent");

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TaskyError::Agent(format!("gemini request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TaskyError::Agent(format!("gemini returned {status}: {text}")));
        }

        let parsed: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| TaskyError::Agent(format!("gemini: failed to parse response: {e}")))?;

        parsed
            .candidates
            .and_then(|mut c| {
                if c.is_empty() {
                    None
                } else {
                    c.swap_remove(0).content
                }
            })
            .ok_or_else(|| TaskyError::Agent("gemini returned no candidates".to_string()))
    }

    /// One-shot text generation without tools or history.
    pub async fn generate_text(&self, model: &str, prompt: &str) -> Result<String, TaskyError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent::user_text(prompt)],
            system_instruction: None,
            tools: None,
        };
        let content = self.generate(model, &request).await?;
        content
            .parts
            .into_iter()
            .find_map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TaskyError::Agent("no text in gemini response".to_string()))
    }

    /// Check if the API key is usable.
    pub async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("gemini: no API key configured");
            return false;
        }
        let url = format!("{GEMINI_BASE_URL}/models?key={}", self.api_key);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("gemini not available: {e}");
                false
            }
        }
    }
}
