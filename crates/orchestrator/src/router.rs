//! Provider routing.
//!
//! The router owns the configured providers and resolves a turn's
//! optional provider/model overrides to a concrete provider and model.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chat_core::ChatProvider;
use gemini_client::{GeminiConfig, GeminiProvider};
use openai_compat::{OpenAiCompatConfig, OpenAiCompatProvider};
use tracing::info;

use crate::error::EngineError;

/// The LLM backends Reverie can route a turn to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    /// OpenRouter (chat-completions wire).
    OpenRouter,
    /// xAI (chat-completions wire).
    Xai,
    /// Groq (chat-completions wire).
    Groq,
    /// Google Gemini.
    Gemini,
}

impl ProviderKind {
    /// Stable lowercase name used in requests and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Xai => "xai",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "xai" | "grok" => Ok(ProviderKind::Xai),
            "groq" => Ok(ProviderKind::Groq),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(EngineError::UnknownProvider(other.to_string())),
        }
    }
}

struct RegisteredProvider {
    provider: Arc<dyn ChatProvider>,
    default_model: String,
}

/// Routes chat turns to configured providers.
pub struct ProviderRouter {
    providers: BTreeMap<ProviderKind, RegisteredProvider>,
    default_kind: ProviderKind,
}

impl ProviderRouter {
    /// Create an empty router with the given default provider.
    pub fn new(default_kind: ProviderKind) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_kind,
        }
    }

    /// Build a router from environment variables.
    ///
    /// Each provider is registered when its API key is present
    /// (`OPENROUTER_API_KEY`, `XAI_API_KEY`, `GROQ_API_KEY`,
    /// `GEMINI_API_KEY`). `REVERIE_DEFAULT_PROVIDER` selects the default;
    /// otherwise the first configured provider (in the order above) wins.
    /// At least one provider must be configured.
    pub fn from_env() -> Result<Self, EngineError> {
        let mut registered: Vec<(ProviderKind, RegisteredProvider)> = Vec::new();

        if std::env::var("OPENROUTER_API_KEY").is_ok() {
            let config = OpenAiCompatConfig::openrouter_from_env()?;
            let default_model = config.model.clone();
            registered.push((
                ProviderKind::OpenRouter,
                RegisteredProvider {
                    provider: Arc::new(OpenAiCompatProvider::new(config)?),
                    default_model,
                },
            ));
        }
        if std::env::var("XAI_API_KEY").is_ok() {
            let config = OpenAiCompatConfig::xai_from_env()?;
            let default_model = config.model.clone();
            registered.push((
                ProviderKind::Xai,
                RegisteredProvider {
                    provider: Arc::new(OpenAiCompatProvider::new(config)?),
                    default_model,
                },
            ));
        }
        if std::env::var("GROQ_API_KEY").is_ok() {
            let config = OpenAiCompatConfig::groq_from_env()?;
            let default_model = config.model.clone();
            registered.push((
                ProviderKind::Groq,
                RegisteredProvider {
                    provider: Arc::new(OpenAiCompatProvider::new(config)?),
                    default_model,
                },
            ));
        }
        if std::env::var("GEMINI_API_KEY").is_ok() {
            let config = GeminiConfig::from_env()?;
            let default_model = config.model.clone();
            registered.push((
                ProviderKind::Gemini,
                RegisteredProvider {
                    provider: Arc::new(GeminiProvider::new(config)?),
                    default_model,
                },
            ));
        }

        let first_kind = registered.first().map(|(kind, _)| *kind).ok_or_else(|| {
            EngineError::InvalidRequest(
                "no providers configured; set at least one of OPENROUTER_API_KEY, \
                 XAI_API_KEY, GROQ_API_KEY, GEMINI_API_KEY"
                    .to_string(),
            )
        })?;

        let default_kind = match std::env::var("REVERIE_DEFAULT_PROVIDER") {
            Ok(name) => name.parse()?,
            Err(_) => first_kind,
        };

        let mut router = Self::new(default_kind);
        for (kind, entry) in registered {
            info!(provider = %kind, model = %entry.default_model, "Registered provider");
            router.providers.insert(kind, entry);
        }

        if !router.providers.contains_key(&router.default_kind) {
            return Err(EngineError::UnknownProvider(format!(
                "default provider {} is not configured",
                router.default_kind
            )));
        }

        Ok(router)
    }

    /// Register a provider with its default model.
    pub fn register(
        &mut self,
        kind: ProviderKind,
        provider: Arc<dyn ChatProvider>,
        default_model: impl Into<String>,
    ) {
        self.providers.insert(
            kind,
            RegisteredProvider {
                provider,
                default_model: default_model.into(),
            },
        );
    }

    /// The default provider kind.
    pub fn default_kind(&self) -> ProviderKind {
        self.default_kind
    }

    /// Configured providers with their default models, in stable order.
    pub fn configured(&self) -> Vec<(ProviderKind, &str)> {
        self.providers
            .iter()
            .map(|(kind, entry)| (*kind, entry.default_model.as_str()))
            .collect()
    }

    /// Resolve optional provider/model overrides to a concrete pair.
    pub fn resolve(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<(Arc<dyn ChatProvider>, String), EngineError> {
        let kind = match provider {
            Some(name) => name.parse()?,
            None => self.default_kind,
        };

        let entry = self
            .providers
            .get(&kind)
            .ok_or_else(|| EngineError::UnknownProvider(kind.to_string()))?;

        let model = model
            .filter(|m| !m.trim().is_empty())
            .map(|m| m.to_string())
            .unwrap_or_else(|| entry.default_model.clone());

        Ok((Arc::clone(&entry.provider), model))
    }
}
