// src/clients/llm.rs

//! Chat-completion client (OpenAI-compatible wire format).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{UpstreamError, check_status};
use crate::config::ProviderConfig;

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    /// Ask the provider for a JSON object instead of free text.
    pub json_output: bool,
}

/// A language model able to answer one system + user exchange.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError>;
}

/// Runs a JSON-mode completion and parses the answer.
pub async fn complete_json(model: &dyn LanguageModel, mut request: ChatRequest) -> Result<Value, UpstreamError> {
    request.json_output = true;
    let content = model.complete(request).await?;
    serde_json::from_str(strip_code_fence(&content))
        .map_err(|e| UpstreamError::Decode(format!("model answer is not JSON: {}", e)))
}

/// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
        }
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("LLM_API_KEY"))?;

        let messages = [
            Message { role: "system", content: &request.system },
            Message { role: "user", content: &request.user },
        ];
        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });
        if request.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %request.model, "POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let completion: CompletionResponse = check_status(response).await?.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| UpstreamError::Decode("completion has no content".to_string()))
    }
}
