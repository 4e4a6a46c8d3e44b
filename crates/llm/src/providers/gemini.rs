//! Gemini LLM provider implementation.
//!
//! Talks to the Google Generative Language API `generateContent` endpoint
//! with function calling enabled.
//! Gemini API: https://ai.google.dev/api/generate-content

use super::{send_error, status_error};
use crate::client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role, ToolCall};
use concierge_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini chat client.
pub struct GeminiClient {
    /// Base URL of the Generative Language API (up to and including the version)
    base_url: String,

    api_key: String,

    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against the public Generative Language API.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_GEMINI_URL, api_key, timeout)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client,
        })
    }

    /// Convert LlmRequest to Gemini format.
    fn to_gemini_request(&self, request: &LlmRequest) -> GeminiRequest {
        let mut system_text: Vec<&str> = request.system.iter().map(String::as_str).collect();
        let mut contents = Vec::with_capacity(request.messages.len());

        for message in &request.messages {
            match message.role {
                Role::System => system_text.push(&message.content),
                Role::User => contents.push(text_content("user", &message.content)),
                Role::Assistant => contents.push(model_content(message)),
                Role::Tool => contents.push(function_response_content(message)),
            }
        }

        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(system_text.join("\n\n")),
                    ..Default::default()
                }],
            })
        };

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|tool| FunctionDeclaration {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    })
                    .collect(),
            }]
        };

        let generation_config = if request.temperature.is_some()
            || request.max_tokens.is_some()
            || request.top_p.is_some()
        {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                top_p: request.top_p,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config,
        }
    }

    /// Convert Gemini response to LlmResponse.
    fn convert_response(&self, response: GeminiResponse, model: &str) -> AppResult<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Gemini returned no candidates".to_string()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall::new(call.name, call.args));
            }
        }

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content,
            tool_calls,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            usage: LlmUsage::new(usage.prompt_token_count, usage.candidates_token_count),
            finish_reason: candidate.finish_reason,
        })
    }
}

fn text_content(role: &str, text: &str) -> GeminiContent {
    GeminiContent {
        role: Some(role.to_string()),
        parts: vec![GeminiPart {
            text: Some(text.to_string()),
            ..Default::default()
        }],
    }
}

fn model_content(message: &ChatMessage) -> GeminiContent {
    let mut parts = Vec::new();
    if !message.content.is_empty() {
        parts.push(GeminiPart {
            text: Some(message.content.clone()),
            ..Default::default()
        });
    }
    if let Some(call) = &message.tool_call {
        parts.push(GeminiPart {
            function_call: Some(FunctionCall {
                name: call.name.clone(),
                args: call.arguments.clone(),
            }),
            ..Default::default()
        });
    }
    GeminiContent {
        role: Some("model".to_string()),
        parts,
    }
}

fn function_response_content(message: &ChatMessage) -> GeminiContent {
    let name = message.tool_name.clone().unwrap_or_default();
    GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiPart {
            function_response: Some(FunctionResponse {
                name,
                response: json!({ "content": message.content }),
            }),
            ..Default::default()
        }],
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, tools = request.tools.len(), "Sending completion request to Gemini");
        tracing::debug!("Request: {:?}", request);

        let gemini_request = self.to_gemini_request(request);
        let model = request.model.trim_start_matches("models/");
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| send_error("Gemini", e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error("Gemini", response).await);
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        tracing::debug!("Response: {:?}", gemini_response);
        let converted = self.convert_response(gemini_response, model)?;
        tracing::info!(
            tool_calls = converted.tool_calls.len(),
            total_tokens = converted.usage.total_tokens,
            "Received completion from Gemini"
        );

        Ok(converted)
    }
}
