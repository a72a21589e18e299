//! Defensive extraction of inbound webhook payloads.
//!
//! The platform nests user messages four levels deep and sends plenty of
//! non-message events (delivery receipts, status changes) through the same
//! endpoint. `is_genuine_message_event` tells them apart structurally;
//! `parse_message` never fails — any structural miss yields the default
//! record instead.

use serde_json::Value;
use tasky_core::message::{MessageKind, NormalizedMessage};

/// Whether a payload is a genuine user message event.
///
/// Structural check only: non-empty `entry` list → non-empty `changes` list
/// → `value` object → non-empty `messages` list. Anything missing or
/// wrong-typed fails the check.
pub fn is_genuine_message_event(body: &Value) -> bool {
    let entry = match body.get("entry").and_then(Value::as_array) {
        Some(e) if !e.is_empty() => &e[0],
        _ => return false,
    };
    let changes = match entry.get("changes").and_then(Value::as_array) {
        Some(c) if !c.is_empty() => &c[0],
        _ => return false,
    };
    let value = match changes.get("value") {
        Some(v) if v.is_object() => v,
        _ => return false,
    };
    matches!(value.get("messages").and_then(Value::as_array), Some(m) if !m.is_empty())
}

/// Extract the normalized message record from a webhook payload.
pub fn parse_message(body: &Value) -> NormalizedMessage {
    let value = match body
        .get("entry")
        .and_then(|e| e.get(0))
        .and_then(|e| e.get("changes"))
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("value"))
    {
        Some(v) => v,
        None => return NormalizedMessage::default(),
    };

    let message = match value.get("messages").and_then(|m| m.get(0)) {
        Some(m) => m,
        None => return NormalizedMessage::default(),
    };

    let phone_number = message
        .get("from")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let username = value
        .get("contacts")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("profile"))
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown User")
        .to_string();

    let (kind, text, audio_id) = match message.get("type").and_then(Value::as_str) {
        Some("audio") => {
            let audio_id = message
                .get("audio")
                .and_then(|a| a.get("id"))
                .and_then(Value::as_str)
                .map(|s| s.to_string());
            // Body stays empty pending transcription.
            (MessageKind::Audio, String::new(), audio_id)
        }
        _ => {
            let text = message
                .get("text")
                .and_then(|t| t.get("body"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            (MessageKind::Text, text, None)
        }
    };

    NormalizedMessage {
        username,
        phone_number,
        message: text,
        kind,
        audio_id,
    }
}
