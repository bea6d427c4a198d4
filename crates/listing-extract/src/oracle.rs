//! Model seam: anything that turns a conversation into one text response

use crate::config::OracleConfig;
use crate::error::{ExtractError, Result};
use crate::message::ChatMessage;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// A chat-completions model
///
/// Implementations are called with the full conversation for one attempt
/// and return the assistant's text. Deadlines are enforced by the caller.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint,
/// including Azure OpenAI deployments
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl ChatCompletionsOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ExtractError::Configuration(
                "Model endpoint not set".to_string(),
            ));
        }
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ExtractError::Configuration("API key not set".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Value {
        let mut body = json!({
            "messages": messages,
            "temperature": self.config.temperature,
        });
        // Azure selects the model by deployment
        if !self.config.is_azure() {
            body["model"] = json!(self.config.model);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl Oracle for ChatCompletionsOracle {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ExtractError::Configuration("API key not set".to_string()))?;

        let request = self
            .client
            .post(self.config.completions_url())
            .header("Content-Type", "application/json")
            .json(&self.request_body(messages));
        let request = if self.config.is_azure() {
            request.header("api-key", api_key)
        } else {
            request.header("Authorization", format!("Bearer {}", api_key))
        };

        debug!(
            url = %self.config.completions_url(),
            messages = messages.len(),
            "Calling model"
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractError::Oracle(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let response_json: Value = response.json().await?;
        parse_completion(&response_json)
    }
}

/// Pull the assistant text out of a chat-completions response
fn parse_completion(response: &Value) -> Result<String> {
    let choice = response["choices"]
        .get(0)
        .ok_or_else(|| ExtractError::Oracle("No choices in response".to_string()))?;

    if let Some(usage) = response["usage"].as_object() {
        let prompt_tokens = usage.get("prompt_tokens").and_then(|v| v.as_u64());
        let completion_tokens = usage.get("completion_tokens").and_then(|v| v.as_u64());
        debug!(prompt_tokens, completion_tokens, "Model usage");
    }

    choice["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ExtractError::Oracle("Response has no text content".to_string()))
}
