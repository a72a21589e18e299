//! Per-user batch CRUD over task records.
//!
//! All four operations are scoped to the owning user: a task id belonging to
//! someone else is indistinguishable from "not found". Validation failures
//! are reported per item inside the outcome; only connectivity failures
//! surface as `Err` and abort the rest of the batch.

use super::Store;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tasky_core::error::TaskyError;
use uuid::Uuid;

/// The four allowed task states.
pub const STATUSES: &[&str] = &["pending", "in_progress", "completed", "archived"];

/// Default status for a new task draft.
fn default_status() -> String {
    "pending".to_string()
}

/// Default priority for a new task draft (2 = medium).
fn default_priority() -> i64 {
    2
}

const MAX_TITLE_CHARS: usize = 255;
const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT_HINT: &str = "Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS";

/// A task to be created.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub due_dt: Option<String>,
    #[serde(default)]
    pub working_dt: Option<String>,
    #[serde(default)]
    pub duration_mins: i64,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Closed filter schema for reads. Unknown keys are rejected at
/// deserialization instead of being silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskFilter {
    #[serde(default)]
    pub working_dt: Option<String>,
    #[serde(default)]
    pub due_dt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A partial update addressed by task id.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    pub task_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_dt: Option<String>,
    #[serde(default)]
    pub working_dt: Option<String>,
    #[serde(default)]
    pub duration_mins: Option<i64>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A fully materialized task row as returned to the agent.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub due_dt: Option<String>,
    pub working_dt: Option<String>,
    pub duration_mins: i64,
    pub priority: i64,
    pub tags: Vec<String>,
}

/// Outcome of a create batch.
#[derive(Debug, Serialize)]
pub struct CreateOutcome {
    pub status: String,
    pub message: String,
    pub task_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<DraftError>,
}

/// A draft that failed validation, by position in the batch.
#[derive(Debug, Serialize)]
pub struct DraftError {
    pub task_index: usize,
    pub title: String,
    pub error: String,
}

/// Outcome of a filtered read.
#[derive(Debug, Serialize)]
pub struct ReadOutcome {
    pub status: String,
    pub tasks: Vec<TaskRecord>,
    pub count: usize,
}

/// Outcome of an update batch.
#[derive(Debug, Serialize)]
pub struct UpdateOutcome {
    pub status: String,
    pub message: String,
    pub results: UpdateResults,
}

#[derive(Debug, Serialize)]
pub struct UpdateResults {
    pub successful_updates: Vec<UpdateOk>,
    pub failed_updates: Vec<ItemFailure>,
}

#[derive(Debug, Serialize)]
pub struct UpdateOk {
    pub task_id: String,
    pub message: String,
}

/// A per-item failure with its reason.
#[derive(Debug, Serialize)]
pub struct ItemFailure {
    pub task_id: String,
    pub reason: String,
}

/// Outcome of a delete batch.
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub status: String,
    pub message: String,
    pub results: DeleteResults,
}

#[derive(Debug, Serialize)]
pub struct DeleteResults {
    pub successful_deletes: Vec<String>,
    pub failed_deletes: Vec<ItemFailure>,
}

/// A value bound into a dynamically assembled query.
enum BindValue {
    Text(String),
    Int(i64),
}

type TaskRow = (
    String,         // id
    String,         // title
    Option<String>, // description
    String,         // status
    Option<String>, // due_dt
    Option<String>, // working_dt
    i64,            // duration_mins
    i64,            // priority
    Option<String>, // tags
    String,         // created_at
    String,         // updated_at
);

const TASK_COLUMNS: &str = "id, title, description, status, due_dt, working_dt, \
     duration_mins, priority, tags, created_at, updated_at";

impl Store {
    /// Create a batch of tasks for `user_id`.
    ///
    /// Drafts failing validation land in `errors` without aborting the rest;
    /// overall status is `error` only when nothing was created.
    pub async fn create_tasks(
        &self,
        user_id: &str,
        drafts: &[TaskDraft],
    ) -> Result<CreateOutcome, TaskyError> {
        let mut errors = Vec::new();
        let mut created = 0usize;

        for (idx, draft) in drafts.iter().enumerate() {
            let fail = |error: String, errors: &mut Vec<DraftError>| {
                errors.push(DraftError {
                    task_index: idx,
                    title: draft.title.clone(),
                    error,
                });
            };

            let title = draft.title.trim().to_string();
            if title.is_empty() {
                fail("Task title must not be empty".to_string(), &mut errors);
                continue;
            }
            if title.chars().count() > MAX_TITLE_CHARS {
                fail(
                    format!("Task title exceeds {MAX_TITLE_CHARS} characters"),
                    &mut errors,
                );
                continue;
            }
            if !STATUSES.contains(&draft.status.as_str()) {
                fail(format!("Invalid status: {}", draft.status), &mut errors);
                continue;
            }
            if !(1..=3).contains(&draft.priority) {
                fail(format!("Invalid priority: {}", draft.priority), &mut errors);
                continue;
            }
            if draft.duration_mins < 0 {
                fail(
                    format!("Invalid duration: {}", draft.duration_mins),
                    &mut errors,
                );
                continue;
            }

            let due_dt = match &draft.due_dt {
                Some(v) => match parse_dt(v) {
                    Ok(dt) => Some(stamp(&dt)),
                    Err(_) => {
                        fail(
                            format!("Invalid deadline date format: {v}. {DATE_FORMAT_HINT}"),
                            &mut errors,
                        );
                        continue;
                    }
                },
                None => None,
            };
            let working_dt = match &draft.working_dt {
                Some(v) => match parse_dt(v) {
                    Ok(dt) => Some(stamp(&dt)),
                    Err(_) => {
                        fail(
                            format!("Invalid working date format: {v}. {DATE_FORMAT_HINT}"),
                            &mut errors,
                        );
                        continue;
                    }
                },
                None => None,
            };

            let now = stamp(&Utc::now().naive_utc());
            sqlx::query(
                "INSERT INTO tasks (id, user_id, title, description, status, due_dt, working_dt, \
                 duration_mins, priority, tags, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(&title)
            .bind(&draft.description)
            .bind(&draft.status)
            .bind(&due_dt)
            .bind(&working_dt)
            .bind(draft.duration_mins)
            .bind(draft.priority)
            .bind(join_tags(&draft.tags))
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| TaskyError::Store(format!("create task failed: {e}")))?;

            created += 1;
        }

        Ok(CreateOutcome {
            status: if created > 0 { "success" } else { "error" }.to_string(),
            message: if created > 0 {
                format!("Successfully created {created} task(s).")
            } else {
                "No tasks created due to errors.".to_string()
            },
            task_count: created,
            errors,
        })
    }

    /// Retrieve tasks for `user_id` matching the filter.
    ///
    /// An invalid date or enum value aborts the whole read with a
    /// `Validation` error. Tag filters are AND-matched exactly.
    pub async fn get_tasks(
        &self,
        user_id: &str,
        filter: &TaskFilter,
    ) -> Result<ReadOutcome, TaskyError> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?");
        let mut values: Vec<BindValue> = vec![BindValue::Text(user_id.to_string())];

        if let Some(v) = &filter.working_dt {
            let dt = parse_dt(v).map_err(|_| {
                TaskyError::Validation(format!(
                    "Invalid date format for working_dt: {v}. {DATE_FORMAT_HINT}"
                ))
            })?;
            sql.push_str(" AND working_dt = ?");
            values.push(BindValue::Text(stamp(&dt)));
        }
        if let Some(v) = &filter.due_dt {
            let dt = parse_dt(v).map_err(|_| {
                TaskyError::Validation(format!(
                    "Invalid date format for due_dt: {v}. {DATE_FORMAT_HINT}"
                ))
            })?;
            sql.push_str(" AND due_dt = ?");
            values.push(BindValue::Text(stamp(&dt)));
        }
        if let Some(v) = &filter.status {
            if !STATUSES.contains(&v.as_str()) {
                return Err(TaskyError::Validation(format!("Invalid status filter: {v}")));
            }
            sql.push_str(" AND status = ?");
            values.push(BindValue::Text(v.clone()));
        }
        if let Some(v) = filter.priority {
            if !(1..=3).contains(&v) {
                return Err(TaskyError::Validation(format!(
                    "Invalid priority filter: {v}"
                )));
            }
            sql.push_str(" AND priority = ?");
            values.push(BindValue::Int(v));
        }
        sql.push_str(" ORDER BY datetime(created_at) ASC");

        let mut query = sqlx::query_as::<_, TaskRow>(&sql);
        for value in &values {
            query = match value {
                BindValue::Text(s) => query.bind(s.clone()),
                BindValue::Int(i) => query.bind(*i),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TaskyError::Store(format!("get tasks failed: {e}")))?;

        let mut tasks: Vec<TaskRecord> = rows.into_iter().map(record_from_row).collect();

        // Tag membership cannot be expressed over the comma-joined column
        // without substring false positives, so it is applied here.
        if let Some(wanted) = &filter.tags {
            tasks.retain(|t| wanted.iter().all(|w| t.tags.iter().any(|have| have == w)));
        }

        let count = tasks.len();
        Ok(ReadOutcome {
            status: "success".to_string(),
            tasks,
            count,
        })
    }

    /// Apply a batch of partial updates for `user_id`.
    ///
    /// Any single invalid field fails that item entirely; other items in the
    /// batch are unaffected. Every successful update stamps `updated_at`.
    pub async fn update_tasks(
        &self,
        user_id: &str,
        updates: &[TaskUpdate],
    ) -> Result<UpdateOutcome, TaskyError> {
        let mut successful_updates = Vec::new();
        let mut failed_updates = Vec::new();

        for update in updates {
            let task_id = update.task_id.clone();

            let owned: Option<(String,)> =
                sqlx::query_as("SELECT id FROM tasks WHERE id = ? AND user_id = ?")
                    .bind(&task_id)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| TaskyError::Store(format!("task lookup failed: {e}")))?;

            if owned.is_none() {
                failed_updates.push(ItemFailure {
                    reason: format!("Task with ID {task_id} not found or not owned by user"),
                    task_id,
                });
                continue;
            }

            let (sets, values) = match build_update_sets(update) {
                Ok(pair) => pair,
                Err(reason) => {
                    failed_updates.push(ItemFailure { task_id, reason });
                    continue;
                }
            };

            if sets.is_empty() {
                failed_updates.push(ItemFailure {
                    task_id,
                    reason: "No fields provided for update".to_string(),
                });
                continue;
            }

            let sql = format!(
                "UPDATE tasks SET {}, updated_at = ? WHERE id = ? AND user_id = ?",
                sets.join(", ")
            );

            let mut query = sqlx::query(&sql);
            for value in &values {
                query = match value {
                    BindValue::Text(s) => query.bind(s.clone()),
                    BindValue::Int(i) => query.bind(*i),
                };
            }
            query = query
                .bind(stamp(&Utc::now().naive_utc()))
                .bind(&task_id)
                .bind(user_id);

            let result = query
                .execute(&self.pool)
                .await
                .map_err(|e| TaskyError::Store(format!("update task failed: {e}")))?;

            if result.rows_affected() > 0 {
                successful_updates.push(UpdateOk {
                    task_id,
                    message: "Task updated successfully".to_string(),
                });
            } else {
                failed_updates.push(ItemFailure {
                    task_id,
                    reason: "Update failed".to_string(),
                });
            }
        }

        Ok(UpdateOutcome {
            status: "success".to_string(),
            message: format!(
                "Updated {} tasks successfully, {} failed",
                successful_updates.len(),
                failed_updates.len()
            ),
            results: UpdateResults {
                successful_updates,
                failed_updates,
            },
        })
    }

    /// Delete a batch of tasks owned by `user_id`.
    ///
    /// Id validation is per-item: a malformed id fails that entry only.
    pub async fn delete_tasks(
        &self,
        user_id: &str,
        task_ids: &[String],
    ) -> Result<DeleteOutcome, TaskyError> {
        let mut successful_deletes = Vec::new();
        let mut failed_deletes = Vec::new();

        for task_id in task_ids {
            if Uuid::parse_str(task_id).is_err() {
                failed_deletes.push(ItemFailure {
                    task_id: task_id.clone(),
                    reason: format!("Invalid task ID format: {task_id}"),
                });
                continue;
            }

            let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
                .bind(task_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| TaskyError::Store(format!("delete task failed: {e}")))?;

            if result.rows_affected() > 0 {
                successful_deletes.push(task_id.clone());
            } else {
                failed_deletes.push(ItemFailure {
                    task_id: task_id.clone(),
                    reason: format!("Task with ID {task_id} not found or unauthorized"),
                });
            }
        }

        Ok(DeleteOutcome {
            status: if successful_deletes.is_empty() {
                "error"
            } else {
                "success"
            }
            .to_string(),
            message: format!(
                "Successfully deleted {} task(s), failed to delete {} task(s).",
                successful_deletes.len(),
                failed_deletes.len()
            ),
            results: DeleteResults {
                successful_deletes,
                failed_deletes,
            },
        })
    }

    /// Tasks belonging to a calendar day: scheduled for it (`working_dt`)
    /// or due on it (`due_dt`).
    pub async fn tasks_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<TaskRecord>, TaskyError> {
        let d = day.format("%Y-%m-%d").to_string();
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE user_id = ? AND (date(working_dt) = ? OR date(due_dt) = ?) \
             ORDER BY datetime(due_dt) ASC"
        ))
        .bind(user_id)
        .bind(&d)
        .bind(&d)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskyError::Store(format!("tasks for day failed: {e}")))?;

        Ok(rows.into_iter().map(record_from_row).collect())
    }

    /// Every user paired with their tasks for a calendar day (possibly none).
    pub async fn users_tasks_by_date(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<(super::users::UserRecord, Vec<TaskRecord>)>, TaskyError> {
        let users = self.list_users().await?;
        let mut out = Vec::with_capacity(users.len());
        for user in users {
            let tasks = self.tasks_for_day(&user.id, day).await?;
            out.push((user, tasks));
        }
        Ok(out)
    }
}

/// Parse one of the two accepted date formats. Case-sensitive, no timezone.
pub(crate) fn parse_dt(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    if value.contains(' ') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
    }
}

/// Render a timestamp in the stored ISO-8601 form.
fn stamp(dt: &NaiveDateTime) -> String {
    dt.format(STAMP_FORMAT).to_string()
}

fn join_tags(tags: &Option<Vec<String>>) -> Option<String> {
    match tags {
        Some(list) if !list.is_empty() => Some(list.join(",")),
        _ => None,
    }
}

fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    })
    .unwrap_or_default()
}

fn record_from_row(row: TaskRow) -> TaskRecord {
    let (
        id,
        title,
        description,
        status,
        due_dt,
        working_dt,
        duration_mins,
        priority,
        tags,
        created_at,
        updated_at,
    ) = row;
    TaskRecord {
        task_id: id,
        title,
        description,
        status,
        created_at,
        updated_at,
        due_dt,
        working_dt,
        duration_mins,
        priority,
        tags: split_tags(tags),
    }
}

/// Validate an update's fields and assemble the SET clauses.
///
/// The first invalid field fails the whole item.
fn build_update_sets(update: &TaskUpdate) -> Result<(Vec<&'static str>, Vec<BindValue>), String> {
    let mut sets = Vec::new();
    let mut values = Vec::new();

    if let Some(title) = &update.title {
        let t = title.trim();
        if t.is_empty() {
            return Err("Task title must not be empty".to_string());
        }
        if t.chars().count() > MAX_TITLE_CHARS {
            return Err(format!("Task title exceeds {MAX_TITLE_CHARS} characters"));
        }
        sets.push("title = ?");
        values.push(BindValue::Text(t.to_string()));
    }
    if let Some(description) = &update.description {
        sets.push("description = ?");
        values.push(BindValue::Text(description.clone()));
    }
    if let Some(status) = &update.status {
        if !STATUSES.contains(&status.as_str()) {
            return Err(format!("Invalid status: {status}"));
        }
        sets.push("status = ?");
        values.push(BindValue::Text(status.clone()));
    }
    if let Some(v) = &update.due_dt {
        let dt = parse_dt(v).map_err(|_| format!("Invalid date format for due_dt: {v}"))?;
        sets.push("due_dt = ?");
        values.push(BindValue::Text(stamp(&dt)));
    }
    if let Some(v) = &update.working_dt {
        let dt = parse_dt(v).map_err(|_| format!("Invalid date format for working_dt: {v}"))?;
        sets.push("working_dt = ?");
        values.push(BindValue::Text(stamp(&dt)));
    }
    if let Some(duration) = update.duration_mins {
        if duration < 0 {
            return Err(format!("Invalid duration: {duration}"));
        }
        sets.push("duration_mins = ?");
        values.push(BindValue::Int(duration));
    }
    if let Some(priority) = update.priority {
        if !(1..=3).contains(&priority) {
            return Err(format!("Invalid priority: {priority}"));
        }
        sets.push("priority = ?");
        values.push(BindValue::Int(priority));
    }
    if let Some(tags) = &update.tags {
        sets.push("tags = ?");
        match join_tags(&Some(tags.clone())) {
            Some(joined) => values.push(BindValue::Text(joined)),
            None => values.push(BindValue::Text(String::new())),
        }
    }

    Ok((sets, values))
}
