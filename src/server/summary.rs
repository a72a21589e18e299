//! Daily summary job: compose and send a personalized summary per user.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use tasky_agent::prompt::daily_summary_prompt;
use tasky_core::error::TaskyError;
use tracing::{error, info};

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct SummaryRequest {
    #[serde(default)]
    date: Option<String>,
}

/// `POST /daily-summary` — send every user their summary for the given date
/// (current UTC date when omitted).
pub(super) async fn send_daily_summary(
    State(state): State<AppState>,
    body: Result<Json<SummaryRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(request) = match body {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to parse JSON: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "details": "Invalid JSON"})),
            );
        }
    };

    let date = match &request.date {
        Some(d) => match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(parsed) => parsed,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status": "error",
                        "details": format!("Invalid date: {d}. Use YYYY-MM-DD"),
                    })),
                );
            }
        },
        None => Utc::now().date_naive(),
    };

    match run_daily_summary(&state, date).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "success", "details": "Daily summaries sent"})),
        ),
        Err(e) => {
            error!("Error sending daily summaries: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "details": "Failed to send daily summaries"})),
            )
        }
    }
}

/// Compose one message per user, then fan the sends out concurrently.
async fn run_daily_summary(state: &AppState, date: NaiveDate) -> Result<(), TaskyError> {
    let date_str = date.format("%Y-%m-%d").to_string();
    let users_tasks = state.store.users_tasks_by_date(date).await?;

    let mut sends = Vec::with_capacity(users_tasks.len());

    for (user, tasks) in &users_tasks {
        let message = if tasks.is_empty() {
            format!("Hello {}, You got no tasks today. ENJOY!!!", user.username)
        } else {
            let task_list = tasks
                .iter()
                .map(|t| {
                    format!(
                        "- {} (Due: {})",
                        t.title,
                        t.due_dt.as_deref().unwrap_or("unset")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            let prompt = daily_summary_prompt(
                state.summary_template.as_deref(),
                &date_str,
                &user.username,
                &task_list,
            );
            state.agent.generate(&prompt).await?
        };

        let sender = state.sender.clone();
        let phone_number = user.phone_number.clone();
        sends.push(async move { sender.send_text(&phone_number, &message).await });
    }

    for result in join_all(sends).await {
        result?;
    }

    info!(
        "daily summaries sent to {} user(s) for {date_str}",
        users_tasks.len()
    );
    Ok(())
}
