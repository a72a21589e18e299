//! Inbound webhook: verification handshake and message processing.
//!
//! The platform disables webhook endpoints that return server errors, so
//! only two failures are ever signalled via HTTP status: a bad signature
//! (403) and malformed JSON (400). Everything downstream — non-message
//! events, transcription failures, agent or send errors — acknowledges
//! with 200 and reports through the `status` field instead.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tasky_channels::signature::verify_signature;
use tasky_channels::whatsapp::{is_genuine_message_event, parse_message};
use tasky_core::error::TaskyError;
use tasky_core::message::{MessageKind, NormalizedMessage};
use tracing::{debug, error, info, warn};

use super::AppState;

const TRANSCRIPTION_APOLOGY: &str =
    "Sorry, I couldn't process your audio message. Please try sending a text message instead.";

#[derive(Debug, Deserialize)]
pub(super) struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// `GET /webhook` — platform verification handshake.
///
/// Echoes the challenge as plain text when the mode is `subscribe` and the
/// verify token matches; 403 otherwise.
pub(super) async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let (Some(mode), Some(token), Some(challenge)) =
        (params.mode, params.verify_token, params.challenge)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Missing query parameters"})),
        )
            .into_response();
    };

    if mode == "subscribe" && token == state.verify_token {
        return (StatusCode::OK, challenge).into_response();
    }

    (
        StatusCode::FORBIDDEN,
        Json(json!({"detail": "Verification failed"})),
    )
        .into_response()
}

/// `POST /webhook` — handle an inbound event delivery.
pub(super) async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok());

    if !verify_signature(&body, signature, &state.app_secret) {
        warn!("Invalid WhatsApp signature");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"status": "error", "detail": "Invalid signature"})),
        );
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => {
            error!("Invalid JSON payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "detail": "Invalid JSON payload"})),
            );
        }
    };

    if !is_genuine_message_event(&payload) {
        info!("Received non-message event, ignoring");
        return (
            StatusCode::OK,
            Json(json!({"status": "ignored", "detail": "Non-message event"})),
        );
    }

    let normalized = parse_message(&payload);

    match process_message(&state, normalized).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error processing message: {e}");
            (
                StatusCode::OK,
                Json(json!({"status": "error", "detail": "Message processing error"})),
            )
        }
    }
}

/// Resolve the sender, run the audio pipeline if needed, invoke the agent,
/// and send the reply.
async fn process_message(
    state: &AppState,
    msg: NormalizedMessage,
) -> Result<(StatusCode, Json<Value>), TaskyError> {
    let user = state
        .store
        .resolve_user(&msg.phone_number, &msg.username)
        .await?;

    let mut text = msg.message.clone();

    if msg.kind == MessageKind::Audio {
        if let Some(audio_id) = &msg.audio_id {
            info!(
                "Processing audio message from {} ({})",
                msg.username, msg.phone_number
            );

            let transcript = match &state.transcriber {
                Some(t) => match t.transcribe(audio_id).await {
                    Ok(transcript) => transcript,
                    Err(e) => {
                        error!("voice transcription failed: {e}");
                        String::new()
                    }
                },
                None => {
                    debug!("skipping voice (no transcriber configured)");
                    String::new()
                }
            };

            if transcript.is_empty() {
                error!("Failed to transcribe audio message");
                state
                    .sender
                    .send_text(&msg.phone_number, TRANSCRIPTION_APOLOGY)
                    .await?;
                return Ok((
                    StatusCode::OK,
                    Json(json!({"status": "error", "detail": "Audio transcription failed"})),
                ));
            }

            // UX confirmation: echo the transcript before acting on it.
            state
                .sender
                .send_text(&msg.phone_number, &format!("You said: \n{transcript}"))
                .await?;
            text = transcript;
        }
    }

    // Non-text, non-audio messages carry no processable content.
    if text.is_empty() {
        info!("No message text found for message from {}", msg.phone_number);
        return Ok((
            StatusCode::OK,
            Json(json!({"status": "ignored", "detail": "No processable content"})),
        ));
    }

    let session_id = state.store.get_or_create_session(&user.id).await?;
    let reply = state.agent.reply(&user.id, &session_id, &text).await?;

    state.sender.send_text(&msg.phone_number, &reply).await?;

    Ok((
        StatusCode::OK,
        Json(json!({"status": "success", "detail": "Message processed"})),
    ))
}
