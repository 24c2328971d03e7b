//! Chat-completion HTTP client for `OpenAI`-compatible and Ollama servers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::ChatMessage;
use super::Completion;
use super::CompletionCapability;
use super::CompletionRequest;
use super::FinishReason;
use crate::config::AppConfig;
use crate::config::ServiceProvider;
use crate::errors::Result;
use crate::errors::ThreadQaError;

pub struct LlmClient {
    provider: ServiceProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl LlmClient {
    /// Create a new completion client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: ServiceProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ThreadQaError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Create a client from the `[llm]` section
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm.provider,
            config.llm_model().to_string(),
            config.llm_endpoint().to_string(),
            config.api_key(),
            Duration::from_secs(config.llm.timeout_secs),
        )
    }

    async fn complete_openai(&self, request: &CompletionRequest) -> Result<Completion> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            ThreadQaError::CompletionServiceError("OpenAI API key not provided".to_string())
        })?;

        #[derive(Serialize)]
        struct OpenAIChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: usize,
        }

        #[derive(Deserialize)]
        struct OpenAIChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
            finish_reason: Option<String>,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling OpenAI chat completions API: {}", url);

        let body = OpenAIChatRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ThreadQaError::CompletionServiceError(format!("transport: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ThreadQaError::CompletionServiceError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let result: OpenAIChatResponse = response.json().await.map_err(|e| {
            ThreadQaError::CompletionServiceError(format!("Failed to parse response: {e}"))
        })?;

        let choice = result.choices.into_iter().next().ok_or_else(|| {
            ThreadQaError::CompletionServiceError("No choices in response".to_string())
        })?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        })
    }

    async fn complete_ollama(&self, request: &CompletionRequest) -> Result<Completion> {
        #[derive(Serialize)]
        struct OllamaChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            stream: bool,
            options: OllamaOptions,
        }

        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
            num_predict: usize,
        }

        #[derive(Deserialize)]
        struct OllamaChatResponse {
            message: OllamaMessage,
            #[serde(default)]
            done_reason: Option<String>,
        }

        #[derive(Deserialize)]
        struct OllamaMessage {
            content: String,
        }

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat API: {}", url);

        let body = OllamaChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ThreadQaError::CompletionServiceError(format!("transport: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ThreadQaError::CompletionServiceError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaChatResponse = response.json().await.map_err(|e| {
            ThreadQaError::CompletionServiceError(format!("Failed to parse response: {e}"))
        })?;

        Ok(Completion {
            text: result.message.content,
            finish_reason: FinishReason::from_api(result.done_reason.as_deref()),
        })
    }
}

#[async_trait]
impl CompletionCapability for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        match self.provider {
            ServiceProvider::OpenAI => self.complete_openai(request).await,
            ServiceProvider::Ollama => self.complete_ollama(request).await,
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
