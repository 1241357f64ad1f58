//! Chat completions against an OpenAI-compatible endpoint (Groq by default).
//!
//! Supports tool-use (function calling) in the OpenAI-compatible format.

use super::ChatModel;
use crate::config::ResearchConfig;
use crate::tools::ToolDefinition;
use crate::types::*;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Inference client wrapping an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    max_retries: u32,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: &'a str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallPayload {
    id: String,
    r#type: String,
    function: FunctionCallPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCallPayload {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(InferenceResponse),
    Retry(anyhow::Error),
}

impl InferenceClient {
    /// Create a new inference client from the runtime configuration.
    pub fn new(config: &ResearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build inference HTTP client")?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolDefinition],
    ) -> ChatRequest<'a> {
        let msg_payloads = messages
            .iter()
            .map(|m| MessagePayload {
                role: m.role.as_str(),
                content: Some(m.content.as_str()),
                tool_calls: (!m.tool_calls.is_empty()).then(|| {
                    m.tool_calls
                        .iter()
                        .map(|tc| ToolCallPayload {
                            id: tc.id.clone(),
                            r#type: "function".into(),
                            function: FunctionCallPayload {
                                name: tc.name.clone(),
                                arguments: tc.arguments.clone(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: m.tool_call_id.as_deref(),
            })
            .collect();

        let tool_payloads: Option<Vec<ToolPayload>> = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| ToolPayload {
                        r#type: "function",
                        function: FunctionPayload {
                            name: &t.name,
                            description: &t.description,
                            parameters: &t.parameters,
                        },
                    })
                    .collect(),
            )
        };

        ChatRequest {
            model: &self.model,
            messages: msg_payloads,
            tool_choice: tool_payloads.as_ref().map(|_| "auto"),
            tools: tool_payloads,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn attempt(&self, url: &str, request: &ChatRequest<'_>) -> Result<Attempt> {
        let resp = match self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                return Ok(Attempt::Retry(anyhow!(e).context("Inference request failed")));
            }
            Err(e) => return Err(anyhow!(e).context("Inference request failed")),
        };

        let status = resp.status();
        if status.as_u16() == 429 || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(Attempt::Retry(anyhow!("Inference failed ({}): {}", status, body)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Inference failed ({}): {}", status, body);
        }

        let body: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse inference response")?;
        Ok(Attempt::Done(convert_response(body)))
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    /// Run inference with tool support, retrying transient failures.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<InferenceResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(messages, tools);

        debug!(
            "Inference request to model {} ({} messages, {} tools)",
            self.model,
            messages.len(),
            tools.len()
        );

        let mut attempt = 0;
        loop {
            match self.attempt(&url, &request).await? {
                Attempt::Done(resp) => {
                    debug!(
                        "Inference usage: {} prompt + {} completion tokens",
                        resp.usage.prompt_tokens, resp.usage.completion_tokens
                    );
                    return Ok(resp);
                }
                Attempt::Retry(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("{:#} (retry {}/{})", e, attempt, self.max_retries);
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Attempt::Retry(e) => return Err(e),
            }
        }
    }
}

fn convert_response(body: ChatResponse) -> InferenceResponse {
    let Some(choice) = body.choices.into_iter().next() else {
        return InferenceResponse::default();
    };

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    let usage = body
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    InferenceResponse {
        content: choice.message.content,
        tool_calls,
        usage,
    }
}
