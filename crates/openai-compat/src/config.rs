//! Configuration for OpenAI-compatible providers.

use std::env;

use chat_core::ProviderError;

/// Configuration for an [`OpenAiCompatProvider`](crate::OpenAiCompatProvider).
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Human-readable provider label ("OpenRouter", "xAI", "Groq").
    pub label: String,

    /// API base URL; `/v1/chat/completions` is appended.
    pub api_url: String,

    /// API key for bearer authentication.
    pub api_key: String,

    /// Default model name.
    pub model: String,

    /// Maximum tokens for a response.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
}

impl OpenAiCompatConfig {
    /// Preset for OpenRouter.
    pub fn openrouter() -> Self {
        Self {
            label: "OpenRouter".to_string(),
            api_url: "https://openrouter.ai/api".to_string(),
            api_key: String::new(),
            model: "deepseek/deepseek-chat-v3-0324".to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.8),
        }
    }

    /// Preset for xAI.
    pub fn xai() -> Self {
        Self {
            label: "xAI".to_string(),
            api_url: "https://api.x.ai".to_string(),
            api_key: String::new(),
            model: "grok-4-1-fast".to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.8),
        }
    }

    /// Preset for Groq.
    pub fn groq() -> Self {
        Self {
            label: "Groq".to_string(),
            api_url: "https://api.groq.com/openai".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.8),
        }
    }

    /// OpenRouter configuration from `OPENROUTER_*` environment variables.
    pub fn openrouter_from_env() -> Result<Self, ProviderError> {
        Self::openrouter().apply_env("OPENROUTER")
    }

    /// xAI configuration from `XAI_*` environment variables.
    pub fn xai_from_env() -> Result<Self, ProviderError> {
        Self::xai().apply_env("XAI")
    }

    /// Groq configuration from `GROQ_*` environment variables.
    pub fn groq_from_env() -> Result<Self, ProviderError> {
        Self::groq().apply_env("GROQ")
    }

    /// Overlay environment variables on this configuration.
    ///
    /// Required: `<PREFIX>_API_KEY`.
    /// Optional: `<PREFIX>_API_URL`, `<PREFIX>_MODEL`,
    /// `<PREFIX>_MAX_TOKENS`, `<PREFIX>_TEMPERATURE`.
    pub fn apply_env(mut self, prefix: &str) -> Result<Self, ProviderError> {
        self.api_key = env::var(format!("{}_API_KEY", prefix))
            .map_err(|_| ProviderError::Configuration(format!("{}_API_KEY not set", prefix)))?;

        if let Ok(url) = env::var(format!("{}_API_URL", prefix)) {
            self.api_url = url;
        }
        if let Ok(model) = env::var(format!("{}_MODEL", prefix)) {
            self.model = model;
        }
        if let Some(max_tokens) = env_parse(&format!("{}_MAX_TOKENS", prefix)) {
            self.max_tokens = Some(max_tokens);
        }
        if let Some(temperature) = env_parse(&format!("{}_TEMPERATURE", prefix)) {
            self.temperature = Some(temperature);
        }

        Ok(self)
    }

    /// Create a new config builder starting from the given preset.
    pub fn builder(preset: Self) -> OpenAiCompatConfigBuilder {
        OpenAiCompatConfigBuilder { config: preset }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}

/// Builder for [`OpenAiCompatConfig`].
#[derive(Debug)]
pub struct OpenAiCompatConfigBuilder {
    config: OpenAiCompatConfig,
}

impl OpenAiCompatConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiCompatConfig {
        self.config
    }
}
