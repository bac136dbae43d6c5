use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{parse_provider_model, LlmConfig};
use crate::error::{QuorumError, Result};
use crate::llm::api::LlmApiClient;
use crate::llm::TextCompleter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
    client: Option<LlmApiClient>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_provider_model(&config.model);

        let backend = match (provider.to_lowercase().as_str(), &config.base_url) {
            ("openai", Some(base_url)) => LlmBackend::OpenAICompatible {
                base_url: base_url.clone(),
            },
            ("openai", None) => LlmBackend::OpenAI,
            ("openrouter", _) => LlmBackend::OpenRouter,
            ("ollama", _) => LlmBackend::Ollama,
            ("lmstudio", _) => LlmBackend::LmStudio,
            _ => LlmBackend::Unavailable {
                reason: format!("Unknown provider in model: {}", config.model),
            },
        };

        if let LlmBackend::Unavailable { reason } = &backend {
            return Self::unavailable(reason);
        }

        match LlmApiClient::new(config) {
            Ok(client) => Self {
                backend,
                config: Some(Arc::new(config.clone())),
                client: Some(client),
            },
            Err(error) => {
                tracing::warn!(error = %error, model = %config.model, "LLM client unavailable");
                Self::unavailable(&error.to_string())
            }
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.client.as_ref().map(LlmApiClient::base_url)
    }

    pub async fn complete_with(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| QuorumError::LlmUnavailable(self.unavailable_reason()))?;

        client.complete(prompt, None, options).await
    }

    fn default_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.config().map(|config| config.temperature),
            ..Default::default()
        }
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client was not initialised".to_string(),
        }
    }
}

#[async_trait]
impl TextCompleter for LlmProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let options = self.default_options();
        self.complete_with(prompt, Some(&options)).await
    }
}
