//! Phone-number → user resolution, with first-contact creation.

use super::Store;
use serde::Serialize;
use tasky_core::error::TaskyError;
use uuid::Uuid;

/// A resolved user row.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub phone_number: String,
    pub username: String,
}

impl Store {
    /// Resolve a phone number to a user, creating the user on first contact.
    ///
    /// Two concurrent first contacts may both attempt the insert; the loser
    /// hits the UNIQUE constraint on `phone_number` and re-selects the row
    /// the winner created. The display name is last-seen-wins.
    pub async fn resolve_user(
        &self,
        phone_number: &str,
        username: &str,
    ) -> Result<UserRecord, TaskyError> {
        if let Some(user) = self.find_user_by_phone(phone_number).await? {
            if !username.is_empty() && username != "Unknown User" && username != user.username {
                sqlx::query("UPDATE users SET username = ? WHERE id = ?")
                    .bind(username)
                    .bind(&user.id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| TaskyError::Store(format!("update username failed: {e}")))?;
                return Ok(UserRecord {
                    username: username.to_string(),
                    ..user
                });
            }
            return Ok(user);
        }

        let id = Uuid::new_v4().to_string();
        let insert = sqlx::query("INSERT INTO users (id, phone_number, username) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(phone_number)
            .bind(username)
            .execute(&self.pool)
            .await;

        match insert {
            Ok(_) => Ok(UserRecord {
                id,
                phone_number: phone_number.to_string(),
                username: username.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(
                    "user with phone number {phone_number} already exists, fetching existing id"
                );
                self.find_user_by_phone(phone_number).await?.ok_or_else(|| {
                    TaskyError::Store("user exists but could not retrieve user id".to_string())
                })
            }
            Err(e) => Err(TaskyError::Store(format!("create user failed: {e}"))),
        }
    }

    /// Look up a user by phone number.
    pub async fn find_user_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<UserRecord>, TaskyError> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, phone_number, username FROM users WHERE phone_number = ?")
                .bind(phone_number)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| TaskyError::Store(format!("user lookup failed: {e}")))?;

        Ok(row.map(|(id, phone_number, username)| UserRecord {
            id,
            phone_number,
            username,
        }))
    }

    /// List every user, oldest first.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, TaskyError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT id, phone_number, username FROM users ORDER BY datetime(created_at) ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskyError::Store(format!("list users failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, phone_number, username)| UserRecord {
                id,
                phone_number,
                username,
            })
            .collect())
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e.as_database_error().map(|d| d.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}
