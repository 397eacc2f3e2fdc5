//! LLM Provider implementations

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{PanelError, Result};

/// Generic LLM provider trait
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &str;
    fn model(&self) -> &str;
}

/// OpenAI-compatible chat completions provider (Groq, Mistral, OpenRouter)
pub struct ChatCompletionsProvider {
    client: Client,
    name: String,
    config: ProviderConfig,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ChatCompletionsProvider {
    pub fn new(name: impl Into<String>, config: ProviderConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            config,
            api_key,
        }
    }

    fn provider_error(&self, message: impl Into<String>) -> PanelError {
        PanelError::Provider {
            provider: self.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for ChatCompletionsProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.trim().chars().take(200).collect());
            return Err(self.provider_error(format!("HTTP {}: {}", status.as_u16(), detail)));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| self.provider_error(format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| self.provider_error("no completion in response"))?;

        if content.is_empty() {
            return Err(self.provider_error("empty completion"));
        }

        Ok(content)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Factory function to create provider from config
pub fn create_provider(
    provider_name: &str,
    config: ProviderConfig,
    api_key: Option<&str>,
) -> Result<Box<dyn LlmProvider>> {
    let key = api_key.ok_or_else(|| PanelError::MissingApiKey {
        provider: provider_name.to_string(),
        var: config
            .api_key
            .strip_prefix('$')
            .unwrap_or("api_key")
            .to_string(),
    })?;
    Ok(Box::new(ChatCompletionsProvider::new(
        provider_name,
        config,
        key.to_string(),
    )))
}
