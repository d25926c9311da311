//! Configuration for the Gemini provider.

use std::env;

use chat_core::ProviderError;

/// Configuration for [`GeminiProvider`](crate::GeminiProvider).
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key, sent via the `x-goog-api-key` header.
    pub api_key: String,

    /// Model name.
    pub model: String,

    /// Maximum output tokens.
    pub max_output_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            max_output_tokens: Some(1024),
            temperature: Some(0.8),
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required: `GEMINI_API_KEY`.
    /// Optional: `GEMINI_API_URL`, `GEMINI_MODEL`,
    /// `GEMINI_MAX_OUTPUT_TOKENS`, `GEMINI_TEMPERATURE`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let mut config = Self::default();

        config.api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::Configuration("GEMINI_API_KEY not set".to_string()))?;

        if let Ok(url) = env::var("GEMINI_API_URL") {
            config.api_url = url;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(tokens) = env_parse("GEMINI_MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = Some(tokens);
        }
        if let Some(temperature) = env_parse("GEMINI_TEMPERATURE") {
            config.temperature = Some(temperature);
        }

        Ok(config)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.api_url, "https://generativelanguage.googleapis.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_output_tokens, Some(1024));
    }

    #[test]
    fn test_with_builders() {
        let config = GeminiConfig::default()
            .with_api_key("key")
            .with_model("gemini-2.5-pro")
            .with_api_url("https://proxy.example.com");

        assert_eq!(config.api_key, "key");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_url, "https://proxy.example.com");
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_vars() {
            std::env::remove_var("GEMINI_API_KEY");
            std::env::remove_var("GEMINI_API_URL");
            std::env::remove_var("GEMINI_MODEL");
            std::env::remove_var("GEMINI_MAX_OUTPUT_TOKENS");
            std::env::remove_var("GEMINI_TEMPERATURE");
        }

        clear_vars();
        assert!(matches!(
            GeminiConfig::from_env(),
            Err(ProviderError::Configuration(_))
        ));

        std::env::set_var("GEMINI_API_KEY", "env-key");
        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "gemini-2.0-flash");

        std::env::set_var("GEMINI_MODEL", "gemini-2.5-flash");
        std::env::set_var("GEMINI_MAX_OUTPUT_TOKENS", "512");
        let config = GeminiConfig::from_env().unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_output_tokens, Some(512));

        clear_vars();
    }
}
