//! # tasky-channels
//!
//! WhatsApp Cloud API integration: webhook payload parsing, signature
//! verification, outbound sends, media download, and voice transcription.

pub mod signature;
pub mod transcribe;
pub mod whatsapp;
