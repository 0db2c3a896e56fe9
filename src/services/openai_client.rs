use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};

const MAX_RETRIES: usize = 3;

/// Minimal client for OpenAI-compatible chat-completions endpoints
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    pub async fn chat_completion(&self, body: &Value, timeout: Duration) -> Result<Value> {
        let mut attempt = 0;
        let mut backoff = Duration::from_millis(250);
        let request_url = build_chat_url(&self.base_url);

        loop {
            debug!(url = %request_url, attempt, "sending chat completion request");

            let response = self
                .client
                .post(&request_url)
                .bearer_auth(&self.api_key)
                .header("Content-Type", "application/json")
                .header("X-Title", "trip-planner-rs")
                .timeout(timeout)
                .json(body)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        PlannerError::Timeout(timeout)
                    } else {
                        PlannerError::Http(format!("request failed: {err}"))
                    }
                })?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response
                .text()
                .await
                .map_err(|err| PlannerError::Http(format!("failed to read response: {err}")))?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_duration = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < MAX_RETRIES {
                    warn!(attempt, "rate limited, retrying in {:?}", retry_after_duration);
                    tokio::time::sleep(retry_after_duration).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(PlannerError::RateLimit {
                    retry_after: retry_after_duration.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!(%status, attempt, "server error, retrying in {:?}", backoff);
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            if !status.is_success() {
                let api_message = serde_json::from_str::<Value>(&response_text)
                    .ok()
                    .and_then(|body| error_message(&body))
                    .unwrap_or(response_text);

                return Err(PlannerError::Http(format!("HTTP {status}: {api_message}")));
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
                PlannerError::Generation(format!("completion response is not valid JSON: {err}"))
            })?;

            if let Some(message) = error_message(&response_json) {
                return Err(PlannerError::Generation(format!("API error: {message}")));
            }

            return Ok(response_json);
        }
    }
}

fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if error.is_null() {
        return None;
    }
    Some(
        error
            .get("message")
            .and_then(|value| value.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string()),
    )
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

/// Pull the assistant text out of a chat-completions response
pub fn extract_message_content(response: &Value) -> Result<&str> {
    let first_choice = response
        .get("choices")
        .and_then(|value| value.as_array())
        .and_then(|choices| choices.first())
        .ok_or_else(|| {
            PlannerError::Generation("completion response contained no choices".to_string())
        })?;

    first_choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .ok_or_else(|| {
            PlannerError::Generation("completion response missing message content".to_string())
        })
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://api.groq.com/openai/v1/"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost:1234/v1/chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body() {
        let body = ChatCompletionRequest::new(
            "llama-3.3-70b-versatile",
            vec![json!({"role": "user", "content": "hi"})],
        )
        .with_temperature(0.0)
        .with_max_tokens(Some(512))
        .into_value();

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn test_extract_message_content() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "Day 1"}}]
        });
        assert_eq!(extract_message_content(&response).unwrap(), "Day 1");

        let empty = json!({"choices": []});
        assert!(matches!(
            extract_message_content(&empty),
            Err(PlannerError::Generation(_))
        ));
    }
}
