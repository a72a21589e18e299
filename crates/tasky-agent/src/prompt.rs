//! Default prompt templates.
//!
//! Compile-time defaults; the `[prompts]` config section may override either
//! template. Placeholders are substituted at call time.

use chrono::{DateTime, Utc};

/// System prompt for the task-manager agent. `{CURRENT_DATETIME}` is
/// substituted before every turn.
pub const TASK_MANAGER_PROMPT: &str = "\
You are a task manager assistant. Your job is to help the user manage their \
tasks: you can create, retrieve, update, and delete tasks on their behalf.

CURRENT DATETIME: {CURRENT_DATETIME}

RULES:
1. To create tasks, use the `create_tasks` tool.
2. To read tasks, use the `get_tasks` tool.
3. To update or delete tasks, call `get_tasks` first to obtain the task IDs.
4. Never show task IDs, user IDs, or other internal identifiers in your replies.
5. If the user gives a datetime, use it as both the working datetime and the \
due datetime of the task. If they give none, use the current date.
6. If the user only names a weekday, resolve it to the next such weekday \
from the current datetime above.

Keep replies conversational and easy to read, separated into short lines. \
Do not mention the tools or their parameters. When you need more \
information, ask for it clearly and politely.";

/// Daily summary template. `{date}`, `{user_name}` and `{tasks}` are
/// substituted per user.
pub const DAILY_SUMMARY_PROMPT: &str = "\
You are an assistant writing a short daily summary for a user named {user_name}.
Today's date is {date}.
Here are the tasks for today:
{tasks}

RULES:
- If no accurate user name is provided, use a generic greeting.
- Summarize the tasks briefly and highlight anything urgent.
- Plain text only: no markdown, no bullet points, no numbered lists; \
separate sections with new lines.
- Keep it short, clear, and simple.
- Close with a creative, motivational line encouraging the user to get \
their tasks done.";

/// Render the system prompt with the current datetime (and weekday) filled in.
pub fn task_manager_prompt(template: Option<&str>, now: DateTime<Utc>) -> String {
    let stamp = format!("{} ({})", now.format("%Y-%m-%d %H:%M:%S"), now.format("%A"));
    template
        .unwrap_or(TASK_MANAGER_PROMPT)
        .replace("{CURRENT_DATETIME}", &stamp)
}

/// Render the daily summary prompt for one user.
pub fn daily_summary_prompt(
    template: Option<&str>,
    date: &str,
    user_name: &str,
    tasks: &str,
) -> String {
    template
        .unwrap_or(DAILY_SUMMARY_PROMPT)
        .replace("{date}", date)
        .replace("{user_name}", user_name)
        .replace("{tasks}", tasks)
}
