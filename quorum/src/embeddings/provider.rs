use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{parse_provider_model, EmbeddingsConfig};
use crate::embeddings::Embedder;
use crate::error::{QuorumError, Result};
use crate::llm::default_base_url;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    /// Position of the input this vector belongs to. Some servers omit it.
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// What one HTTP round trip produced.
enum BatchOutcome {
    Embedded(Vec<Vec<f32>>),
    Retry(QuorumError),
}

/// Embedding provider for OpenAI-compatible `POST {base}/embeddings` endpoints.
///
/// Inputs go out in batches of `batch_size`. Every batch must come back with exactly one
/// vector per input; vectors are put back in input order by their `index`. Rate limits,
/// 5xx and transport errors are retried with exponential backoff, everything else fails
/// the call.
#[derive(Clone)]
pub struct EmbeddingProvider {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    batch_size: usize,
    max_retries: u32,
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model) = parse_provider_model(&config.model);

        let base = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());
        let endpoint = Url::parse(&format!("{}/", base.trim_end_matches('/')))?.join("embeddings")?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuorumError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
            model: model.to_string(),
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
        })
    }

    async fn embed_inputs(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(100 << (attempt - 1).min(6))).await;
            }

            match self.send_batch(inputs).await? {
                BatchOutcome::Embedded(vectors) => return Ok(vectors),
                BatchOutcome::Retry(error) => {
                    tracing::warn!(attempt, inputs = inputs.len(), error = %error, "Embedding batch will be retried");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| QuorumError::Embedding("Embedding retries exhausted".to_string())))
    }

    async fn send_batch(&self, inputs: &[&str]) -> Result<BatchOutcome> {
        let mut request = self.http.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: inputs,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(BatchOutcome::Retry(QuorumError::Embedding(format!(
                    "Request failed: {e}"
                ))))
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Ok(BatchOutcome::Retry(QuorumError::ApiRateLimit { retry_after }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(QuorumError::ApiAuth(body)),
                s if s.is_server_error() => Ok(BatchOutcome::Retry(QuorumError::Embedding(
                    format!("Server error {s}: {body}"),
                ))),
                s => Err(QuorumError::Embedding(format!("API error {s}: {body}"))),
            };
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| QuorumError::Embedding(format!("Failed to parse response: {e}")))?;

        restore_input_order(body.data, inputs.len()).map(BatchOutcome::Embedded)
    }
}

/// Place every returned vector at its input position. Each position must be filled
/// exactly once; an item without `index` takes its position in the response.
fn restore_input_order(items: Vec<EmbeddingItem>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if items.len() != expected {
        return Err(QuorumError::Embedding(format!(
            "Expected {expected} embeddings, got {}",
            items.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, item) in items.into_iter().enumerate() {
        let index = item.index.unwrap_or(position);
        let slot = slots.get_mut(index).ok_or_else(|| {
            QuorumError::Embedding(format!("Embedding index {index} out of range"))
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(QuorumError::Embedding(format!(
                "Embedding index {index} returned twice"
            )));
        }
    }

    // Count matched and no slot was filled twice, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl Embedder for EmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(QuorumError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        self.embed_inputs(&[text])
            .await?
            .pop()
            .ok_or_else(|| QuorumError::Embedding("No embedding generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let inputs: Vec<&str> = batch.iter().map(String::as_str).collect();
            vectors.extend(self.embed_inputs(&inputs).await?);
        }

        tracing::debug!(
            texts = texts.len(),
            batches = texts.len().div_ceil(self.batch_size),
            model = %self.model,
            "Embedded texts"
        );
        Ok(vectors)
    }
}
