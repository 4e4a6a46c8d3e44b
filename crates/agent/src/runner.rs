//! The agent loop.
//!
//! Each step sends the conversation and the tool declarations to the model.
//! A tool call is executed and its output appended as a tool message; plain
//! text ends the run. One tool runs per step, and only the first call of a
//! turn is honoured.

use crate::tool::ToolSet;
use concierge_core::{AppConfig, AppError, AppResult};
use concierge_llm::{ChatMessage, LlmClient, LlmRequest, Role, ToolCall};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Loop limits and sampling settings.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: String,
    pub temperature: f32,

    /// Maximum model calls per run
    pub max_steps: usize,

    /// Upper bound on a whole run
    pub timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.0,
            max_steps: 8,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AgentOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_steps: config.agent.max_steps,
            timeout: Duration::from_secs(config.agent.agent_timeout_secs),
        }
    }
}

/// What the model wants to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    FinalAnswer(String),
    ToolCall {
        /// The call as the model emitted it
        call: ToolCall,
        /// The tool's string argument extracted from the call
        argument: String,
    },
}

/// Record of one executed tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    /// 0-based step index
    pub index: usize,
    pub tool: String,
    pub argument: String,
    /// Whether the output fed back was an error message
    pub is_error: bool,
    pub elapsed: Duration,
}

/// Result of a run: the full conversation plus the tool steps taken.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub messages: Vec<ChatMessage>,
    pub steps: Vec<AgentStep>,
}

impl AgentOutcome {
    /// Content of the closing assistant message.
    pub fn final_answer(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }
}

/// A tool-using chat agent bound to one model, one system instruction and one tool set.
pub struct Agent {
    client: Arc<dyn LlmClient>,
    tools: ToolSet,
    system: String,
    options: AgentOptions,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.client.provider_name())
            .field("tools", &self.tools)
            .field("options", &self.options)
            .finish()
    }
}

impl Agent {
    pub fn new(
        client: Arc<dyn LlmClient>,
        tools: ToolSet,
        system: impl Into<String>,
        options: AgentOptions,
    ) -> Self {
        Self {
            client,
            tools,
            system: system.into(),
            options,
        }
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// Run a fresh one-message conversation and return the final answer text.
    pub async fn answer(&self, message: &str) -> AppResult<String> {
        let outcome = self.run(vec![ChatMessage::user(message)]).await?;
        outcome
            .final_answer()
            .map(str::to_string)
            .ok_or_else(|| AppError::Agent("Run ended without an assistant message".to_string()))
    }

    /// Run the loop on `conversation` until a final answer, the step cap or the timeout.
    pub async fn run(&self, conversation: Vec<ChatMessage>) -> AppResult<AgentOutcome> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.options.timeout, self.run_steps(conversation))
            .await
            .map_err(|_| AppError::Timeout(self.options.timeout))??;

        tracing::info!(
            steps = outcome.steps.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Agent run finished"
        );
        Ok(outcome)
    }

    /// Ask the model for its next move.
    pub async fn decide(&self, conversation: &[ChatMessage]) -> AppResult<Decision> {
        let request = LlmRequest::new(conversation.to_vec(), &self.options.model)
            .with_system(&self.system)
            .with_temperature(self.options.temperature)
            .with_tools(self.tools.declarations());

        let response = self.client.complete(&request).await?;

        let mut calls = response.tool_calls.into_iter();
        if let Some(call) = calls.next() {
            let ignored = calls.count();
            if ignored > 0 {
                tracing::warn!(
                    tool = %call.name,
                    ignored,
                    "Model requested several tools in one turn; running only the first"
                );
            }

            let key = self.tools.get(&call.name).map(|tool| tool.argument().name);
            let argument = extract_argument(&call.arguments, key);
            return Ok(Decision::ToolCall { call, argument });
        }

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AppError::Agent(format!(
                "Model returned an empty answer (finish reason: {})",
                response.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(Decision::FinalAnswer(text.to_string()))
    }

    async fn run_steps(&self, mut messages: Vec<ChatMessage>) -> AppResult<AgentOutcome> {
        let mut steps = Vec::new();

        for index in 0..self.options.max_steps {
            match self.decide(&messages).await? {
                Decision::FinalAnswer(text) => {
                    messages.push(ChatMessage::assistant(text));
                    return Ok(AgentOutcome { messages, steps });
                }
                Decision::ToolCall { call, argument } => {
                    let started = Instant::now();
                    let (output, is_error) = self.execute(&call.name, &argument).await;
                    let elapsed = started.elapsed();

                    tracing::info!(
                        step = index,
                        tool = %call.name,
                        is_error,
                        latency_ms = elapsed.as_millis() as u64,
                        "Tool call finished"
                    );

                    let tool = call.name.clone();
                    messages.push(ChatMessage::assistant_tool_call("", call));
                    messages.push(ChatMessage::tool_result(&tool, output));
                    steps.push(AgentStep {
                        index,
                        tool,
                        argument,
                        is_error,
                        elapsed,
                    });
                }
            }
        }

        Err(AppError::Agent(format!(
            "No final answer after {} steps",
            self.options.max_steps
        )))
    }

    /// Run a tool; failures become an `Error: ...` result for the model.
    async fn execute(&self, name: &str, argument: &str) -> (String, bool) {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = %name, "Model requested an unknown tool");
            return (
                format!(
                    "Error: unknown tool '{}'. Available tools: {}",
                    name,
                    self.tools.names().join(", ")
                ),
                true,
            );
        };

        match tool.call(argument).await {
            Ok(output) => (output, false),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool execution failed");
                (format!("Error: {}", e), true)
            }
        }
    }
}

/// Pull the tool's string argument out of the model's arguments object.
///
/// Falls back to the first string field, then to the raw JSON.
fn extract_argument(arguments: &Value, key: Option<&str>) -> String {
    if let Some(value) = key.and_then(|key| arguments.get(key)) {
        return match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }

    match arguments {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .values()
            .find_map(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| arguments.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
