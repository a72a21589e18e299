//! # tasky-store
//!
//! SQLite-backed persistent store for Tasky: users, tasks, and agent sessions.

pub mod store;

pub use store::tasks::{
    CreateOutcome, DeleteOutcome, ReadOutcome, TaskDraft, TaskFilter, TaskRecord, TaskUpdate,
    UpdateOutcome,
};
pub use store::users::UserRecord;
pub use store::Store;
