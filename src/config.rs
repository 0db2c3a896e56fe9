use crate::error::{PlannerError, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7860";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_CONVERSATIONS: usize = 10_000;

/// Environment variables checked, in order, for the generation credential
pub const API_KEY_VARS: [&str; 2] = ["GROQ_API_KEY", "OPENAI_API_KEY"];

/// Process-level settings, read once at startup
#[derive(Clone)]
pub struct PlannerConfig {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    bind_addr: SocketAddr,
    session_ttl: Duration,
    max_conversations: usize,
}

impl std::fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("bind_addr", &self.bind_addr)
            .field("session_ttl", &self.session_ttl)
            .field("max_conversations", &self.max_conversations)
            .finish()
    }
}

impl PlannerConfig {
    /// Create a config with defaults for everything except the credential,
    /// which must not be blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PlannerError::MissingCredential(
                "API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: Some(2048),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7860)),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        })
    }

    /// Build the config from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|&key| lookup(key))
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                PlannerError::MissingCredential(format!(
                    "set {} before starting the planner",
                    API_KEY_VARS.join(" or ")
                ))
            })?;

        let mut config = Self::new(api_key)?;

        if let Some(base_url) =
            lookup("TRIP_PLANNER_BASE_URL").or_else(|| lookup("OPENAI_BASE_URL"))
        {
            config.base_url = base_url;
        }

        if let Some(model) = lookup("TRIP_PLANNER_MODEL") {
            config.model = model;
        }

        if let Some(raw) = lookup("TRIP_PLANNER_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PlannerError::Config(format!("TRIP_PLANNER_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("TRIP_PLANNER_SESSION_TTL_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PlannerError::Config(format!(
                    "TRIP_PLANNER_SESSION_TTL_SECS is not a number: {raw}"
                ))
            })?;
            config.session_ttl = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("TRIP_PLANNER_MAX_CONVERSATIONS") {
            config.max_conversations = raw
                .trim()
                .parse()
                .ok()
                .filter(|max: &usize| *max > 0)
                .ok_or_else(|| {
                    PlannerError::Config(format!(
                        "TRIP_PLANNER_MAX_CONVERSATIONS must be a positive number: {raw}"
                    ))
                })?;
        }

        if let Some(raw) = lookup("TRIP_PLANNER_BIND") {
            config.bind_addr = parse_bind_addr(&raw)?;
        } else if let Some(raw) = lookup("PORT") {
            let port: u16 = raw
                .trim()
                .parse()
                .map_err(|_| PlannerError::Config(format!("PORT is not a valid port: {raw}")))?;
            config.bind_addr.set_port(port);
        }

        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
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

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// How long an untouched conversation is kept by the session store
    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Upper bound on conversations held by the session store
    pub fn with_max_conversations(mut self, max_conversations: usize) -> Self {
        self.max_conversations = max_conversations.max(1);
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn max_conversations(&self) -> usize {
        self.max_conversations
    }
}

/// Parse a `host:port` bind address
pub fn parse_bind_addr(raw: &str) -> Result<SocketAddr> {
    raw.trim()
        .parse()
        .map_err(|_| PlannerError::Config(format!("invalid bind address: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_credential() {
        let result = PlannerConfig::from_lookup(lookup_from(&[("PORT", "8080")]));
        assert!(matches!(result, Err(PlannerError::MissingCredential(_))));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let result = PlannerConfig::from_lookup(lookup_from(&[("GROQ_API_KEY", "   ")]));
        assert!(matches!(result, Err(PlannerError::MissingCredential(_))));
    }

    #[test]
    fn test_openai_key_fallback() {
        let config =
            PlannerConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key(), "sk-test");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.bind_addr().to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    fn test_env_overrides() {
        let config = PlannerConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("TRIP_PLANNER_MODEL", "llama-3.1-8b-instant"),
            ("TRIP_PLANNER_TIMEOUT_SECS", "30"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.model(), "llama-3.1-8b-instant");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_session_limits() {
        let defaults = PlannerConfig::new("gsk-test").unwrap();
        assert_eq!(defaults.session_ttl(), Duration::from_secs(3600));
        assert_eq!(defaults.max_conversations(), DEFAULT_MAX_CONVERSATIONS);

        let config = PlannerConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("TRIP_PLANNER_SESSION_TTL_SECS", "600"),
            ("TRIP_PLANNER_MAX_CONVERSATIONS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.session_ttl(), Duration::from_secs(600));
        assert_eq!(config.max_conversations(), 250);

        let zero = PlannerConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("TRIP_PLANNER_MAX_CONVERSATIONS", "0"),
        ]));
        assert!(matches!(zero, Err(PlannerError::Config(_))));
    }

    #[test]
    fn test_invalid_port() {
        let result = PlannerConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("PORT", "http"),
        ]));
        assert!(matches!(result, Err(PlannerError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = PlannerConfig::new("gsk-secret").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("gsk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
