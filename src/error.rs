use std::time::Duration;
use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid trip duration: {0:?} is not a positive whole number of days")]
    InvalidDuration(String),

    #[error("Interests list is empty")]
    InvalidInterests,

    #[error("Itinerary generation failed: {0}")]
    Generation(String),

    #[error("Itinerary generation returned no content")]
    EmptyGeneration,

    #[error("Itinerary generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("No conversation with id {0}")]
    ConversationNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            PlannerError::InvalidDuration(_) | PlannerError::InvalidInterests => true,
            PlannerError::RateLimit { .. } | PlannerError::Timeout(_) => true,
            PlannerError::EmptyGeneration => true,
            PlannerError::Http(_) | PlannerError::Generation(_) => true,
            _ => false,
        }
    }

    /// Whether the error came from the remote itinerary generation call
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            PlannerError::Generation(_)
                | PlannerError::EmptyGeneration
                | PlannerError::Timeout(_)
                | PlannerError::RateLimit { .. }
                | PlannerError::Http(_)
        )
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Config(_) => "CONFIG_ERROR",
            PlannerError::MissingCredential(_) => "MISSING_CREDENTIAL",
            PlannerError::InvalidDuration(_) => "INVALID_DURATION_INPUT",
            PlannerError::InvalidInterests => "INVALID_INTERESTS_INPUT",
            PlannerError::Generation(_) => "GENERATION_FAILURE",
            PlannerError::EmptyGeneration => "EMPTY_GENERATION",
            PlannerError::Timeout(_) => "TIMEOUT_ERROR",
            PlannerError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            PlannerError::Http(_) => "HTTP_ERROR",
            PlannerError::ConversationNotFound(_) => "CONVERSATION_NOT_FOUND",
            PlannerError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failures_are_grouped() {
        assert!(PlannerError::Timeout(Duration::from_secs(5)).is_generation_failure());
        assert!(PlannerError::EmptyGeneration.is_generation_failure());
        assert!(PlannerError::RateLimit { retry_after: 3 }.is_generation_failure());
        assert!(!PlannerError::InvalidDuration("abc".into()).is_generation_failure());
        assert!(!PlannerError::MissingCredential("GROQ_API_KEY".into()).is_generation_failure());
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let error = PlannerError::MissingCredential("GROQ_API_KEY is not set".into());
        assert!(!error.is_retryable());
        assert_eq!(error.error_code(), "MISSING_CREDENTIAL");
    }

    #[test]
    fn test_conversation_not_found_payload() {
        let error = PlannerError::ConversationNotFound("trip-9".into());
        assert!(!error.is_generation_failure());

        let payload = error.to_error_payload();
        assert_eq!(payload["error"]["code"], "CONVERSATION_NOT_FOUND");
        assert_eq!(payload["error"]["retryable"], false);
        assert_eq!(payload["error"]["message"], "No conversation with id trip-9");
    }

    #[test]
    fn test_error_payload() {
        let payload = PlannerError::InvalidDuration("abc".into()).to_error_payload();
        assert_eq!(payload["error"]["code"], "INVALID_DURATION_INPUT");
        assert_eq!(payload["error"]["retryable"], true);
        assert!(payload["error"]["message"]
            .as_str()
            .unwrap()
            .contains("\"abc\""));
    }
}
