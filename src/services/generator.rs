use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use super::openai_client::{extract_message_content, ChatCompletionRequest, OpenAIClient};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};

/// Remote text generation used to turn the collected answers into an itinerary
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    /// Produce the itinerary text for a fully rendered prompt
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Generator backed by an OpenAI-compatible chat-completions API
#[derive(Clone, Debug)]
pub struct ChatGenerator {
    client: OpenAIClient,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl ChatGenerator {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: OpenAIClient::new(api_key, base_url),
            model: crate::config::DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.api_key(), config.base_url())
            .with_model(config.model())
            .with_temperature(config.temperature())
            .with_max_tokens(config.max_tokens())
            .with_timeout(config.timeout())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ItineraryGenerator for ChatGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let messages = vec![
            json!({ "role": "system", "content": system_prompt }),
            json!({ "role": "user", "content": user_prompt }),
        ];

        let body = ChatCompletionRequest::new(self.model.clone(), messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .into_value();

        let response = self.client.chat_completion(&body, self.timeout).await?;
        let content = extract_message_content(&response)?;

        if content.trim().is_empty() {
            return Err(PlannerError::EmptyGeneration);
        }

        if let Some(usage) = response.get("usage") {
            info!(
                model = %self.model,
                total_tokens = usage
                    .get("total_tokens")
                    .and_then(|t| t.as_u64())
                    .unwrap_or_default(),
                "itinerary generated"
            );
        }

        Ok(content.to_string())
    }
}

#[async_trait]
impl<G: ItineraryGenerator + ?Sized> ItineraryGenerator for std::sync::Arc<G> {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        (**self).generate(system_prompt, user_prompt).await
    }
}
