//! Task tool definitions and dispatch.
//!
//! The agent exposes the four task-store operations to the model as
//! function declarations; every call is executed scoped to the acting user
//! and its JSON outcome handed straight back to the model.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tasky_core::error::TaskyError;
use tasky_store::{Store, TaskDraft, TaskFilter, TaskUpdate};

/// A tool definition in the function-declaration format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    /// JSON Schema for parameters.
    pub parameters: Value,
}

/// Schema fragment shared by drafts and updates.
fn task_field_properties() -> Value {
    json!({
        "title": {
            "type": "string",
            "description": "Task title (required on create, max 255 characters)"
        },
        "description": {
            "type": "string",
            "description": "Free-text task description"
        },
        "status": {
            "type": "string",
            "enum": ["pending", "in_progress", "completed", "archived"],
            "description": "Task status"
        },
        "due_dt": {
            "type": "string",
            "description": "Due date, format YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
        },
        "working_dt": {
            "type": "string",
            "description": "Date the task is scheduled for, format YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
        },
        "duration_mins": {
            "type": "integer",
            "description": "Duration in minutes"
        },
        "priority": {
            "type": "integer",
            "description": "Priority level: 1=high, 2=medium, 3=low"
        },
        "tags": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Tags associated with the task"
        }
    })
}

/// Return the definitions of the four task tools.
pub fn task_tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "create_tasks".to_string(),
            description: "Insert one or more tasks into the user's task list. \
                 Always give tasks as a list, even if it's just one task."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "tasks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": task_field_properties(),
                            "required": ["title"]
                        }
                    }
                },
                "required": ["tasks"]
            }),
        },
        ToolDef {
            name: "get_tasks".to_string(),
            description: "Retrieve the user's tasks matching the provided filters. \
                 Provide empty filters to retrieve all tasks. Returned tasks \
                 include task_id for update/delete operations."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "filters": {
                        "type": "object",
                        "properties": {
                            "working_dt": {
                                "type": "string",
                                "description": "Scheduled date, format YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
                            },
                            "due_dt": {
                                "type": "string",
                                "description": "Due date, format YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed", "archived"]
                            },
                            "priority": {
                                "type": "integer",
                                "description": "Priority level: 1=high, 2=medium, 3=low"
                            },
                            "tags": {
                                "type": "array",
                                "items": {"type": "string"},
                                "description": "A task must carry every listed tag"
                            }
                        }
                    }
                }
            }),
        },
        ToolDef {
            name: "update_tasks".to_string(),
            description: "Update existing tasks given their IDs. Use get_tasks \
                 first to obtain task IDs. Always give tasks as a list."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "tasks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": merge_task_id(task_field_properties()),
                            "required": ["task_id"]
                        }
                    }
                },
                "required": ["tasks"]
            }),
        },
        ToolDef {
            name: "delete_tasks".to_string(),
            description: "Delete tasks given their IDs. Use get_tasks first to \
                 obtain task IDs."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Task IDs (UUID strings) to delete"
                    }
                },
                "required": ["task_ids"]
            }),
        },
    ]
}

fn merge_task_id(mut properties: Value) -> Value {
    if let Some(map) = properties.as_object_mut() {
        map.insert(
            "task_id".to_string(),
            json!({"type": "string", "description": "ID (UUID string) of the task to update"}),
        );
    }
    properties
}

/// Execute a tool call by name, scoped to `user_id`.
///
/// Never fails: malformed arguments, validation problems, and store errors
/// all come back as `{"status":"error", "message": ...}` values for the
/// model to read.
pub async fn execute(store: &Store, user_id: &str, name: &str, args: &Value) -> Value {
    match name {
        "create_tasks" => {
            let drafts: Vec<TaskDraft> =
                match serde_json::from_value(args.get("tasks").cloned().unwrap_or(Value::Null)) {
                    Ok(d) => d,
                    Err(e) => return invalid_args("task", e),
                };
            render(store.create_tasks(user_id, &drafts).await)
        }
        "get_tasks" => {
            let filters: TaskFilter = match serde_json::from_value(
                args.get("filters").cloned().unwrap_or_else(|| json!({})),
            ) {
                Ok(f) => f,
                Err(e) => return invalid_args("filter", e),
            };
            render(store.get_tasks(user_id, &filters).await)
        }
        "update_tasks" => {
            let updates: Vec<TaskUpdate> =
                match serde_json::from_value(args.get("tasks").cloned().unwrap_or(Value::Null)) {
                    Ok(u) => u,
                    Err(e) => return invalid_args("task", e),
                };
            render(store.update_tasks(user_id, &updates).await)
        }
        "delete_tasks" => {
            let ids: Vec<String> = match serde_json::from_value(
                args.get("task_ids").cloned().unwrap_or(Value::Null),
            ) {
                Ok(i) => i,
                Err(e) => return invalid_args("task_ids", e),
            };
            render(store.delete_tasks(user_id, &ids).await)
        }
        other => json!({
            "status": "error",
            "message": format!("Unknown tool: {other}"),
        }),
    }
}

fn invalid_args(what: &str, e: serde_json::Error) -> Value {
    json!({
        "status": "error",
        "message": format!("Invalid {what} parameters: {e}"),
    })
}

fn render<T: Serialize>(result: Result<T, TaskyError>) -> Value {
    match result {
        Ok(outcome) => serde_json::to_value(outcome).unwrap_or_else(|e| {
            json!({"status": "error", "message": format!("Serialization error: {e}")})
        }),
        Err(TaskyError::Validation(message)) => json!({
            "status": "error",
            "message": message,
        }),
        Err(e) => json!({
            "status": "error",
            "message": format!("Database error: {e}"),
        }),
    }
}
