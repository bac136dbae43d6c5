use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SourcesConfig;
use crate::error::{QuorumError, Result};
use crate::models::SummaryRecord;
use crate::sources::SummaryIndex;

#[derive(Debug, Deserialize)]
struct SummaryEntry {
    embedding: Vec<f32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AllSummariesResponse {
    #[serde(default)]
    all_summaries: BTreeMap<String, SummaryEntry>,
}

#[derive(Debug, Deserialize)]
struct SelectedSummariesResponse {
    #[serde(default)]
    selected_summary: BTreeMap<String, SummaryEntry>,
}

#[derive(Debug, Serialize)]
struct SelectedSummariesRequest<'a> {
    selected_script_ids: &'a [String],
}

/// HTTP client for the summary index service.
///
/// * `GET  {base}/api/summaries` returns `{"all_summaries": {id: {embedding, ...}}}`
/// * `POST {base}/api/summaries/selected` with `{"selected_script_ids": [...]}` returns
///   `{"selected_summary": {...}}`; a 404 means nothing in the selection was found.
#[derive(Clone)]
pub struct HttpSummaryIndex {
    client: Client,
    base_url: String,
}

impl HttpSummaryIndex {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Self::with_base_url(&config.summary_index_url, config.timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self> {
        url::Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| QuorumError::SummaryIndex(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn into_records(entries: BTreeMap<String, SummaryEntry>) -> Vec<SummaryRecord> {
        entries
            .into_iter()
            .map(|(script_id, entry)| SummaryRecord {
                script_id,
                embedding: entry.embedding,
                title: entry.title,
                summary_text: entry.summary_text,
            })
            .collect()
    }

    async fn error_from(response: reqwest::Response) -> QuorumError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        QuorumError::SummaryIndex(format!("Summary index returned {status}: {body}"))
    }
}

#[async_trait]
impl SummaryIndex for HttpSummaryIndex {
    async fn all_summaries(&self) -> Result<Vec<SummaryRecord>> {
        let url = format!("{}/api/summaries", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QuorumError::SummaryIndex(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: AllSummariesResponse = response
            .json()
            .await
            .map_err(|e| QuorumError::SummaryIndex(format!("Failed to parse response: {e}")))?;

        let records = Self::into_records(body.all_summaries);
        tracing::debug!(count = records.len(), "Loaded corpus summaries");
        Ok(records)
    }

    async fn summaries_for(&self, script_ids: &[String]) -> Result<Vec<SummaryRecord>> {
        if script_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/summaries/selected", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&SelectedSummariesRequest {
                selected_script_ids: script_ids,
            })
            .send()
            .await
            .map_err(|e| QuorumError::SummaryIndex(format!("Request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(requested = script_ids.len(), "No selected summaries found");
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: SelectedSummariesResponse = response
            .json()
            .await
            .map_err(|e| QuorumError::SummaryIndex(format!("Failed to parse response: {e}")))?;

        let requested: HashSet<&str> = script_ids.iter().map(String::as_str).collect();
        let records: Vec<SummaryRecord> = Self::into_records(body.selected_summary)
            .into_iter()
            .filter(|record| requested.contains(record.script_id.as_str()))
            .collect();

        tracing::debug!(
            requested = script_ids.len(),
            resolved = records.len(),
            "Loaded selected summaries"
        );
        Ok(records)
    }
}
