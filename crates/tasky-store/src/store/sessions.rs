//! Agent session lookup and conversation history.
//!
//! One persistent session per user: the session id equals the user id and is
//! never rotated or expired.

use super::Store;
use tasky_core::error::TaskyError;

impl Store {
    /// Get the session id for a user, creating the session on first miss.
    ///
    /// `INSERT OR IGNORE` makes concurrent first lookups converge on the
    /// same row without a lock.
    pub async fn get_or_create_session(&self, user_id: &str) -> Result<String, TaskyError> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT session_id FROM sessions WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| TaskyError::Store(format!("session lookup failed: {e}")))?;

        if let Some((session_id,)) = existing {
            return Ok(session_id);
        }

        sqlx::query("INSERT OR IGNORE INTO sessions (user_id, session_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| TaskyError::Store(format!("create session failed: {e}")))?;

        Ok(user_id.to_string())
    }

    /// Append one turn to the session transcript. `role` is `user` or `model`.
    pub async fn append_session_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), TaskyError> {
        sqlx::query("INSERT INTO session_messages (session_id, role, content) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(role)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(|e| TaskyError::Store(format!("append session message failed: {e}")))?;
        Ok(())
    }

    /// The most recent `limit` transcript entries, oldest first.
    pub async fn recent_session_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<(String, String)>, TaskyError> {
        let mut rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, content FROM session_messages \
             WHERE session_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskyError::Store(format!("session history failed: {e}")))?;

        rows.reverse();
        Ok(rows)
    }
}
