use application::error::AppError;
use application::strategy::CompletionClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::http::error_body;

const MAX_TOKENS: u32 = 256;
const TEMPERATURE: f32 = 0.5;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

/// OpenAI 文本补全客户端
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiCompletionClient {
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration("OpenAI API key is required for this operation".to_string())
        })
    }

    fn first_choice(response: CompletionResponse) -> Option<String> {
        response.choices.into_iter().next().map(|c| c.text)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    fn ensure_configured(&self) -> Result<(), AppError> {
        self.api_key().map(|_| ())
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>, AppError> {
        let request = CompletionRequest {
            model: &self.config.model,
            prompt,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.config.completion_url)
            .bearer_auth(self.api_key()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Completion(format!(
                "HTTP {}: {}",
                status,
                error_body(response).await
            )));
        }

        let payload: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Completion(format!("Malformed completion response: {}", e)))?;
        Ok(Self::first_choice(payload))
    }
}
