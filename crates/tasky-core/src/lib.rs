//! # tasky-core
//!
//! Core types, traits, configuration, and error handling for the Tasky
//! WhatsApp task assistant.

pub mod config;
pub mod error;
pub mod message;
pub mod traits;

pub use config::shellexpand;
