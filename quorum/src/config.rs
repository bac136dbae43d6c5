use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_string_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub embeddings: EmbeddingsConfig,
    pub sources: SourcesConfig,
    pub processing: ProcessingConfig,
    pub retrieval: RetrievalConfig,
    pub quality: QualityConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `json` switches the log formatter; anything else keeps the plain one.
    pub log_format: String,
}

/// Remote embedding endpoint. `model` is `provider/model`, e.g. `openai/text-embedding-3-small`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub batch_size: usize,
}

/// Where transcripts and precomputed summary embeddings live.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub summary_index_url: String,
    pub transcript_api_url: String,
    pub timeout_secs: u64,
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Thresholds and caps applied while ranking summaries and transcript chunks.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Summaries must score strictly above this.
    pub summary_threshold: f32,
    pub summary_top_k: usize,
    /// Chunks must score at or above this.
    pub chunk_threshold: f32,
    pub chunk_top_k: usize,
    pub max_context_summaries: usize,
    pub max_context_chunks: usize,
    pub max_sources: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityConfig {
    pub min_answer_chars: usize,
    pub enable_question_rewrite: bool,
    /// Upper bound for any single oracle call made by a pipeline stage.
    pub stage_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            summary_threshold: 0.7,
            summary_top_k: 5,
            chunk_threshold: 0.4,
            chunk_top_k: 10,
            max_context_summaries: 3,
            max_context_chunks: 5,
            max_sources: 5,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_answer_chars: 30,
            enable_question_rewrite: true,
            stage_timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let retrieval = RetrievalConfig::default();
        let quality = QualityConfig::default();

        Self {
            server: ServerConfig {
                host: env_string_or("QUORUM_HOST", "0.0.0.0"),
                port: parse_env_or("QUORUM_PORT", 3000),
                log_format: env_string_or("QUORUM_LOG_FORMAT", "pretty"),
            },
            embeddings: EmbeddingsConfig {
                model: env_string_or("QUORUM_EMBEDDING_MODEL", "openai/text-embedding-3-small"),
                api_key: env::var("QUORUM_EMBEDDING_API_KEY").ok(),
                base_url: env::var("QUORUM_EMBEDDING_BASE_URL").ok(),
                timeout_secs: parse_env_or("QUORUM_EMBEDDING_TIMEOUT", 30),
                max_retries: parse_env_or("QUORUM_EMBEDDING_MAX_RETRIES", 3),
                batch_size: parse_env_or("QUORUM_EMBEDDING_BATCH_SIZE", 64),
            },
            sources: SourcesConfig {
                summary_index_url: env_string_or(
                    "QUORUM_SUMMARY_INDEX_URL",
                    "http://localhost:8001",
                ),
                transcript_api_url: env_string_or(
                    "QUORUM_TRANSCRIPT_API_URL",
                    "http://localhost:8002",
                ),
                timeout_secs: parse_env_or("QUORUM_SOURCE_TIMEOUT", 30),
            },
            processing: ProcessingConfig {
                chunk_size: parse_env_or("QUORUM_CHUNK_SIZE", 1000),
                chunk_overlap: parse_env_or("QUORUM_CHUNK_OVERLAP", 200),
            },
            retrieval: RetrievalConfig {
                summary_threshold: parse_env_or(
                    "QUORUM_SUMMARY_THRESHOLD",
                    retrieval.summary_threshold,
                ),
                chunk_threshold: parse_env_or("QUORUM_CHUNK_THRESHOLD", retrieval.chunk_threshold),
                chunk_top_k: parse_env_or("QUORUM_CHUNK_TOP_K", retrieval.chunk_top_k),
                ..retrieval
            },
            quality: QualityConfig {
                min_answer_chars: parse_env_or("QUORUM_MIN_ANSWER_CHARS", quality.min_answer_chars),
                enable_question_rewrite: parse_env_or(
                    "QUORUM_QUESTION_REWRITE",
                    quality.enable_question_rewrite,
                ),
                stage_timeout_secs: parse_env_or(
                    "QUORUM_STAGE_TIMEOUT",
                    quality.stage_timeout_secs,
                ),
            },
            llm: env::var("QUORUM_LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("QUORUM_LLM_API_KEY").ok(),
                base_url: env::var("QUORUM_LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("QUORUM_LLM_TIMEOUT", 30),
                max_retries: parse_env_or("QUORUM_LLM_MAX_RETRIES", 3),
                temperature: parse_env_or("QUORUM_LLM_TEMPERATURE", 0.0),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known providers that speak an OpenAI-compatible API.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse a model name into (provider, model) tuple.
///
/// Unknown or missing prefixes are treated as an OpenAI-compatible endpoint, so
/// `gpt-4o-mini` becomes `("openai", "gpt-4o-mini")`.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("openai", model)
}
