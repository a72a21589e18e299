//! The conversational task agent: a bounded function-calling loop with
//! per-user persistent sessions.

use async_trait::async_trait;
use chrono::Utc;
use tasky_core::{
    config::{AgentConfig, PromptsConfig},
    error::TaskyError,
    traits::Agent,
};
use tasky_store::Store;
use tracing::{debug, info};

use crate::gemini::{GeminiClient, GeminiContent, GeminiRequest, GeminiTool};
use crate::{prompt, tools};

/// Gemini-backed task agent.
pub struct TaskAgent {
    client: GeminiClient,
    store: Store,
    model: String,
    summary_model: String,
    max_tool_turns: u32,
    max_context_messages: usize,
    system_template: Option<String>,
}

impl TaskAgent {
    /// Create the agent from config.
    pub fn new(config: &AgentConfig, prompts: &PromptsConfig, store: Store) -> Self {
        Self {
            client: GeminiClient::new(config.gemini_api_key.clone()),
            store,
            model: config.model.clone(),
            summary_model: config.summary_model.clone(),
            max_tool_turns: config.max_tool_turns,
            max_context_messages: config.max_context_messages,
            system_template: prompts.system.clone(),
        }
    }

    /// Whether the underlying API is reachable with the configured key.
    pub async fn is_available(&self) -> bool {
        self.client.is_available().await
    }
}

/// Map persisted transcript rows to request contents.
fn history_to_contents(history: &[(String, String)]) -> Vec<GeminiContent> {
    history
        .iter()
        .map(|(role, content)| {
            if role == "model" {
                GeminiContent::model_text(content)
            } else {
                GeminiContent::user_text(content)
            }
        })
        .collect()
}

#[async_trait]
impl Agent for TaskAgent {
    fn name(&self) -> &str {
        "gemini-task-agent"
    }

    async fn reply(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<String, TaskyError> {
        let system = prompt::task_manager_prompt(self.system_template.as_deref(), Utc::now());

        let history = self
            .store
            .recent_session_messages(session_id, self.max_context_messages)
            .await?;
        let mut contents = history_to_contents(&history);
        contents.push(GeminiContent::user_text(message));

        self.store
            .append_session_message(session_id, "user", message)
            .await?;

        let tool_set = vec![GeminiTool {
            function_declarations: tools::task_tool_defs(),
        }];

        for _ in 0..self.max_tool_turns {
            let request = GeminiRequest {
                contents: contents.clone(),
                system_instruction: Some(GeminiContent::system(&system)),
                tools: Some(tool_set.clone()),
            };

            let content = self.client.generate(&self.model, &request).await?;

            let call = content
                .parts
                .iter()
                .find_map(|p| p.function_call.clone());

            if let Some(call) = call {
                debug!("agent: tool call {} for user {user_id}", call.name);
                let outcome = tools::execute(&self.store, user_id, &call.name, &call.args).await;

                contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts: content.parts,
                });
                contents.push(GeminiContent::function_response(&call.name, outcome));
                continue;
            }

            let text = content
                .parts
                .into_iter()
                .find_map(|p| p.text)
                .filter(|t| !t.trim().is_empty());

            return match text {
                Some(text) => {
                    self.store
                        .append_session_message(session_id, "model", &text)
                        .await?;
                    Ok(text)
                }
                None => Err(TaskyError::Agent(
                    "no valid response generated from agent".to_string(),
                )),
            };
        }

        info!("agent: tool turn limit reached for user {user_id}");
        Err(TaskyError::Agent(
            "tool turn limit exceeded without a final response".to_string(),
        ))
    }

    async fn generate(&self, prompt: &str) -> Result<String, TaskyError> {
        self.client.generate_text(&self.summary_model, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasky_core::config::{AgentConfig, PromptsConfig};

    #[test]
    fn test_history_to_contents_roles() {
        let history = vec![
            ("user".to_string(), "create a task".to_string()),
            ("model".to_string(), "Done!".to_string()),
        ];
        let contents = history_to_contents(&history);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[0].parts[0].text.as_deref(), Some("create a task"));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
    }

    #[tokio::test]
    async fn test_agent_name_and_config_wiring() {
        let store = Store::in_memory().await.unwrap();
        let agent = TaskAgent::new(&AgentConfig::default(), &PromptsConfig::default(), store);
        assert_eq!(agent.name(), "gemini-task-agent");
        assert_eq!(agent.model, "gemini-2.0-flash");
        assert_eq!(agent.summary_model, "gemini-2.5-flash");
    }
}
