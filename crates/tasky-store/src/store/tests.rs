use super::tasks::{parse_dt, TaskDraft, TaskFilter, TaskUpdate};
use super::Store;
use chrono::NaiveDate;

async fn test_store() -> Store {
    Store::in_memory().await.unwrap()
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: None,
        status: "pending".to_string(),
        due_dt: None,
        working_dt: None,
        duration_mins: 0,
        priority: 2,
        tags: None,
    }
}

fn update(task_id: &str) -> TaskUpdate {
    TaskUpdate {
        task_id: task_id.to_string(),
        title: None,
        description: None,
        status: None,
        due_dt: None,
        working_dt: None,
        duration_mins: None,
        priority: None,
        tags: None,
    }
}

// --- User resolution ---

#[tokio::test]
async fn test_resolve_user_creates_once() {
    let store = test_store().await;
    let first = store.resolve_user("5511999887766", "Alice").await.unwrap();
    let second = store.resolve_user("5511999887766", "Alice").await.unwrap();
    assert_eq!(first.id, second.id);

    let users = store.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].phone_number, "5511999887766");
}

#[tokio::test]
async fn test_resolve_user_username_last_seen_wins() {
    let store = test_store().await;
    let first = store.resolve_user("5511999887766", "Alice").await.unwrap();
    let renamed = store
        .resolve_user("5511999887766", "Alice Smith")
        .await
        .unwrap();
    assert_eq!(first.id, renamed.id);
    assert_eq!(renamed.username, "Alice Smith");

    // The placeholder name never overwrites a real one.
    let kept = store
        .resolve_user("5511999887766", "Unknown User")
        .await
        .unwrap();
    assert_eq!(kept.username, "Alice Smith");
}

#[tokio::test]
async fn test_resolve_user_distinct_phones_distinct_users() {
    let store = test_store().await;
    let a = store.resolve_user("111", "A").await.unwrap();
    let b = store.resolve_user("222", "B").await.unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(store.list_users().await.unwrap().len(), 2);
}

// --- Create ---

#[tokio::test]
async fn test_create_tasks_basic() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let outcome = store
        .create_tasks(&user.id, &[draft("Buy milk"), draft("Call John")])
        .await
        .unwrap();
    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.task_count, 2);
    assert!(outcome.errors.is_empty());

    let read = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(read.count, 2);
    assert_eq!(read.tasks[0].status, "pending");
    assert_eq!(read.tasks[0].priority, 2);
    assert_eq!(read.tasks[0].duration_mins, 0);
    assert!(read.tasks[0].tags.is_empty());
}

#[tokio::test]
async fn test_create_rejects_bad_titles() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let long_title = "x".repeat(256);
    let outcome = store
        .create_tasks(
            &user.id,
            &[draft("   "), draft(&long_title), draft("Fine task")],
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, "success"); // partial success
    assert_eq!(outcome.task_count, 1);
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.errors[0].task_index, 0);
    assert!(outcome.errors[0].error.contains("must not be empty"));
    assert!(outcome.errors[1].error.contains("255"));

    let read = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(read.count, 1);
    assert_eq!(read.tasks[0].title, "Fine task");
}

#[tokio::test]
async fn test_create_all_failed_is_error() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let outcome = store.create_tasks(&user.id, &[draft("")]).await.unwrap();
    assert_eq!(outcome.status, "error");
    assert_eq!(outcome.task_count, 0);
    assert_eq!(outcome.message, "No tasks created due to errors.");
}

#[tokio::test]
async fn test_create_invalid_date_fails_single_draft() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let mut bad = draft("Report");
    bad.due_dt = Some("15-07-2025".to_string());
    let outcome = store
        .create_tasks(&user.id, &[bad, draft("Good one")])
        .await
        .unwrap();

    assert_eq!(outcome.task_count, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0]
        .error
        .contains("Invalid deadline date format"));
}

#[tokio::test]
async fn test_create_invalid_enum_values() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let mut bad_status = draft("A");
    bad_status.status = "done".to_string();
    let mut bad_priority = draft("B");
    bad_priority.priority = 5;
    let mut bad_duration = draft("C");
    bad_duration.duration_mins = -10;

    let outcome = store
        .create_tasks(&user.id, &[bad_status, bad_priority, bad_duration])
        .await
        .unwrap();
    assert_eq!(outcome.status, "error");
    assert_eq!(outcome.errors.len(), 3);
    assert!(outcome.errors[0].error.contains("Invalid status"));
    assert!(outcome.errors[1].error.contains("Invalid priority"));
    assert!(outcome.errors[2].error.contains("Invalid duration"));
}

// --- Read ---

#[tokio::test]
async fn test_due_date_round_trip() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let mut d = draft("Complete project report");
    d.due_dt = Some("2025-07-15".to_string());
    store.create_tasks(&user.id, &[d]).await.unwrap();

    let hit = store
        .get_tasks(
            &user.id,
            &TaskFilter {
                due_dt: Some("2025-07-15".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(hit.count, 1);
    assert_eq!(hit.tasks[0].due_dt.as_deref(), Some("2025-07-15T00:00:00"));

    let miss = store
        .get_tasks(
            &user.id,
            &TaskFilter {
                due_dt: Some("2025-07-16".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(miss.count, 0);
}

#[tokio::test]
async fn test_read_invalid_date_aborts() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let err = store
        .get_tasks(
            &user.id,
            &TaskFilter {
                due_dt: Some("July 15".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid date format for due_dt"));
}

#[tokio::test]
async fn test_read_invalid_enum_filters_abort() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    assert!(store
        .get_tasks(
            &user.id,
            &TaskFilter {
                status: Some("done".to_string()),
                ..Default::default()
            },
        )
        .await
        .is_err());
    assert!(store
        .get_tasks(
            &user.id,
            &TaskFilter {
                priority: Some(7),
                ..Default::default()
            },
        )
        .await
        .is_err());
}

#[tokio::test]
async fn test_tag_filter_is_exact_and_conjunctive() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let mut both = draft("Both tags");
    both.tags = Some(vec!["work".to_string(), "urgent".to_string()]);
    let mut one = draft("One tag");
    one.tags = Some(vec!["work".to_string()]);
    let mut similar = draft("Substring trap");
    similar.tags = Some(vec!["homework".to_string()]);
    store
        .create_tasks(&user.id, &[both, one, similar])
        .await
        .unwrap();

    let work = store
        .get_tasks(
            &user.id,
            &TaskFilter {
                tags: Some(vec!["work".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    // "homework" must not match "work".
    assert_eq!(work.count, 2);

    let both_tags = store
        .get_tasks(
            &user.id,
            &TaskFilter {
                tags: Some(vec!["work".to_string(), "urgent".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(both_tags.count, 1);
    assert_eq!(both_tags.tasks[0].title, "Both tags");
}

#[tokio::test]
async fn test_read_scoped_to_owner() {
    let store = test_store().await;
    let alice = store.resolve_user("111", "Alice").await.unwrap();
    let bob = store.resolve_user("222", "Bob").await.unwrap();

    store
        .create_tasks(&alice.id, &[draft("Alice's task")])
        .await
        .unwrap();

    let bobs = store
        .get_tasks(&bob.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(bobs.count, 0);
}

// --- Update ---

#[tokio::test]
async fn test_update_not_owned_fails_and_mutates_nothing() {
    let store = test_store().await;
    let alice = store.resolve_user("111", "Alice").await.unwrap();
    let bob = store.resolve_user("222", "Bob").await.unwrap();

    store
        .create_tasks(&alice.id, &[draft("Alice's task")])
        .await
        .unwrap();
    let task_id = store
        .get_tasks(&alice.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks[0]
        .task_id
        .clone();

    let mut u = update(&task_id);
    u.title = Some("Hijacked".to_string());
    let outcome = store.update_tasks(&bob.id, &[u]).await.unwrap();

    assert!(outcome.results.successful_updates.is_empty());
    assert_eq!(outcome.results.failed_updates.len(), 1);
    assert!(outcome.results.failed_updates[0]
        .reason
        .contains("not found or not owned"));

    let kept = store
        .get_tasks(&alice.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(kept.tasks[0].title, "Alice's task");
}

#[tokio::test]
async fn test_update_fields() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();
    store
        .create_tasks(&user.id, &[draft("Old title")])
        .await
        .unwrap();
    let task_id = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks[0]
        .task_id
        .clone();

    let mut u = update(&task_id);
    u.title = Some("New title".to_string());
    u.status = Some("completed".to_string());
    u.due_dt = Some("2025-07-15 14:00:00".to_string());
    u.priority = Some(1);
    let outcome = store.update_tasks(&user.id, &[u]).await.unwrap();
    assert_eq!(outcome.results.successful_updates.len(), 1);

    let read = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(read.tasks[0].title, "New title");
    assert_eq!(read.tasks[0].status, "completed");
    assert_eq!(read.tasks[0].due_dt.as_deref(), Some("2025-07-15T14:00:00"));
    assert_eq!(read.tasks[0].priority, 1);
}

#[tokio::test]
async fn test_update_no_fields_fails() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();
    store.create_tasks(&user.id, &[draft("Task")]).await.unwrap();
    let task_id = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks[0]
        .task_id
        .clone();

    let outcome = store.update_tasks(&user.id, &[update(&task_id)]).await.unwrap();
    assert_eq!(outcome.results.failed_updates.len(), 1);
    assert_eq!(
        outcome.results.failed_updates[0].reason,
        "No fields provided for update"
    );
}

#[tokio::test]
async fn test_update_invalid_field_fails_whole_item() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();
    store.create_tasks(&user.id, &[draft("Task")]).await.unwrap();
    let task_id = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks[0]
        .task_id
        .clone();

    // Valid title + invalid priority: the whole item fails, nothing changes.
    let mut u = update(&task_id);
    u.title = Some("Should not land".to_string());
    u.priority = Some(9);
    let outcome = store.update_tasks(&user.id, &[u]).await.unwrap();
    assert!(outcome.results.successful_updates.is_empty());
    assert!(outcome.results.failed_updates[0]
        .reason
        .contains("Invalid priority"));

    let read = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(read.tasks[0].title, "Task");
}

#[tokio::test]
async fn test_update_batch_mixes_success_and_failure() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();
    store
        .create_tasks(&user.id, &[draft("First"), draft("Second")])
        .await
        .unwrap();
    let tasks = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks;

    let mut good = update(&tasks[0].task_id);
    good.status = Some("in_progress".to_string());
    let mut bad = update(&tasks[1].task_id);
    bad.due_dt = Some("not-a-date".to_string());

    let outcome = store.update_tasks(&user.id, &[good, bad]).await.unwrap();
    assert_eq!(outcome.results.successful_updates.len(), 1);
    assert_eq!(outcome.results.failed_updates.len(), 1);
    assert_eq!(outcome.message, "Updated 1 tasks successfully, 1 failed");
}

// --- Delete ---

#[tokio::test]
async fn test_delete_per_item_validation() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();
    store.create_tasks(&user.id, &[draft("Doomed")]).await.unwrap();
    let task_id = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks[0]
        .task_id
        .clone();

    let outcome = store
        .delete_tasks(&user.id, &["not-a-uuid".to_string(), task_id])
        .await
        .unwrap();

    // The malformed id fails alone; the valid one still deletes.
    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.results.successful_deletes.len(), 1);
    assert_eq!(outcome.results.failed_deletes.len(), 1);
    assert!(outcome.results.failed_deletes[0]
        .reason
        .contains("Invalid task ID format"));

    let read = store
        .get_tasks(&user.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(read.count, 0);
}

#[tokio::test]
async fn test_delete_not_owned_reports_not_found() {
    let store = test_store().await;
    let alice = store.resolve_user("111", "Alice").await.unwrap();
    let bob = store.resolve_user("222", "Bob").await.unwrap();
    store
        .create_tasks(&alice.id, &[draft("Alice's task")])
        .await
        .unwrap();
    let task_id = store
        .get_tasks(&alice.id, &TaskFilter::default())
        .await
        .unwrap()
        .tasks[0]
        .task_id
        .clone();

    let outcome = store.delete_tasks(&bob.id, &[task_id]).await.unwrap();
    assert_eq!(outcome.status, "error");
    assert!(outcome.results.failed_deletes[0]
        .reason
        .contains("not found or unauthorized"));

    // Alice's task is untouched.
    let read = store
        .get_tasks(&alice.id, &TaskFilter::default())
        .await
        .unwrap();
    assert_eq!(read.count, 1);
}

// --- Sessions ---

#[tokio::test]
async fn test_session_equals_user_id_and_is_stable() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let first = store.get_or_create_session(&user.id).await.unwrap();
    let second = store.get_or_create_session(&user.id).await.unwrap();
    assert_eq!(first, user.id);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_session_history_order_and_limit() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();
    let session = store.get_or_create_session(&user.id).await.unwrap();

    store
        .append_session_message(&session, "user", "first")
        .await
        .unwrap();
    store
        .append_session_message(&session, "model", "second")
        .await
        .unwrap();
    store
        .append_session_message(&session, "user", "third")
        .await
        .unwrap();

    let all = store.recent_session_messages(&session, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], ("user".to_string(), "first".to_string()));
    assert_eq!(all[2], ("user".to_string(), "third".to_string()));

    let last_two = store.recent_session_messages(&session, 2).await.unwrap();
    assert_eq!(last_two.len(), 2);
    assert_eq!(last_two[0].1, "second");
    assert_eq!(last_two[1].1, "third");
}

// --- Daily view ---

#[tokio::test]
async fn test_tasks_for_day_matches_working_or_due() {
    let store = test_store().await;
    let user = store.resolve_user("111", "A").await.unwrap();

    let mut due_today = draft("Due today");
    due_today.due_dt = Some("2025-07-15 09:00:00".to_string());
    let mut working_today = draft("Working today");
    working_today.working_dt = Some("2025-07-15".to_string());
    let mut other_day = draft("Other day");
    other_day.due_dt = Some("2025-07-20".to_string());
    store
        .create_tasks(&user.id, &[due_today, working_today, other_day])
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    let tasks = store.tasks_for_day(&user.id, day).await.unwrap();
    assert_eq!(tasks.len(), 2);
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert!(titles.contains(&"Due today"));
    assert!(titles.contains(&"Working today"));
}

#[tokio::test]
async fn test_users_tasks_by_date_includes_taskless_users() {
    let store = test_store().await;
    let alice = store.resolve_user("111", "Alice").await.unwrap();
    store.resolve_user("222", "Bob").await.unwrap();

    let mut d = draft("Alice's report");
    d.due_dt = Some("2025-07-15".to_string());
    store.create_tasks(&alice.id, &[d]).await.unwrap();

    let day = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    let all = store.users_tasks_by_date(day).await.unwrap();
    assert_eq!(all.len(), 2);

    let alice_entry = all.iter().find(|(u, _)| u.username == "Alice").unwrap();
    let bob_entry = all.iter().find(|(u, _)| u.username == "Bob").unwrap();
    assert_eq!(alice_entry.1.len(), 1);
    assert!(bob_entry.1.is_empty());
}

// --- Date parsing ---

#[test]
fn test_parse_dt_date_only() {
    let dt = parse_dt("2025-07-15").unwrap();
    assert_eq!(dt.format("%Y-%m-%dT%H:%M:%S").to_string(), "2025-07-15T00:00:00");
}

#[test]
fn test_parse_dt_with_time() {
    let dt = parse_dt("2025-07-15 14:30:00").unwrap();
    assert_eq!(dt.format("%Y-%m-%dT%H:%M:%S").to_string(), "2025-07-15T14:30:00");
}

#[test]
fn test_parse_dt_rejects_other_formats() {
    assert!(parse_dt("15-07-2025").is_err());
    assert!(parse_dt("2025-07-15T14:30:00").is_err());
    assert!(parse_dt("2025-07-15 14:30:00Z").is_err());
    assert!(parse_dt("2025-13-01").is_err());
    assert!(parse_dt("tomorrow").is_err());
}
