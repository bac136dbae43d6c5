use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SourcesConfig;
use crate::error::{QuorumError, Result};
use crate::models::{Document, DocumentContent, Segment};
use crate::sources::TranscriptStore;

#[derive(Debug, Deserialize)]
struct SegmentRecord {
    #[serde(default)]
    speaker: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ScriptRecord {
    #[serde(default, alias = "scriptId", alias = "meeting_id", alias = "id")]
    script_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, alias = "scriptText")]
    script_text: Option<String>,
    #[serde(default)]
    segments: Option<Vec<SegmentRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptsPayload {
    Many(Vec<ScriptRecord>),
    One(ScriptRecord),
}

impl ScriptRecord {
    fn into_document(self) -> Option<Document> {
        let script_id = self.script_id.filter(|id| !id.trim().is_empty())?;

        let timestamp = match self.timestamp {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let content = match (self.script_text, self.segments) {
            (Some(text), _) if !text.trim().is_empty() => DocumentContent::Text(text),
            (_, Some(segments)) => DocumentContent::Segments(
                segments
                    .into_iter()
                    .map(|segment| Segment {
                        speaker: segment.speaker,
                        text: segment.text,
                    })
                    .collect(),
            ),
            (text, None) => DocumentContent::Text(text.unwrap_or_default()),
        };

        Some(Document {
            title: self.title.unwrap_or_else(|| script_id.clone()),
            script_id,
            timestamp,
            content,
        })
    }
}

/// HTTP client for `GET {base}/api/scripts?ids=a,b,c`.
///
/// The service answers with a single object or an array; either way the documents are
/// returned in request order with duplicates removed.
#[derive(Clone)]
pub struct HttpTranscriptStore {
    client: Client,
    base_url: String,
}

impl HttpTranscriptStore {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Self::with_base_url(&config.transcript_api_url, config.timeout_secs)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self> {
        url::Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                QuorumError::TranscriptService(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Reorder fetched documents to match `requested`, dropping duplicates and strays.
fn order_by_request(requested: &[String], documents: Vec<Document>) -> Vec<Document> {
    let mut by_id: HashMap<String, Document> = HashMap::new();
    for document in documents {
        by_id.entry(document.script_id.clone()).or_insert(document);
    }

    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match by_id.remove(id) {
            Some(document) => ordered.push(document),
            None => tracing::warn!(script_id = %id, "Transcript not returned by service"),
        }
    }

    if !by_id.is_empty() {
        tracing::debug!(extra = by_id.len(), "Ignoring unrequested transcripts");
    }

    ordered
}

#[async_trait]
impl TranscriptStore for HttpTranscriptStore {
    async fn fetch(&self, script_ids: &[String]) -> Result<Vec<Document>> {
        if script_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/scripts", self.base_url);
        let ids = script_ids.join(",");

        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.as_str())])
            .send()
            .await
            .map_err(|e| QuorumError::TranscriptService(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuorumError::TranscriptService(format!(
                "Transcript service returned {status}: {body}"
            )));
        }

        let payload: ScriptsPayload = response.json().await.map_err(|e| {
            QuorumError::TranscriptService(format!("Failed to parse response: {e}"))
        })?;

        let records = match payload {
            ScriptsPayload::Many(records) => records,
            ScriptsPayload::One(record) => vec![record],
        };

        let documents: Vec<Document> = records
            .into_iter()
            .filter_map(|record| {
                let document = record.into_document();
                if document.is_none() {
                    tracing::warn!("Skipping transcript without an id");
                }
                document
            })
            .collect();

        Ok(order_by_request(script_ids, documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_aliases_and_segments() {
        let payload: ScriptsPayload = serde_json::from_value(serde_json::json!([
            {
                "scriptId": "s1",
                "title": "Kickoff",
                "timestamp": "2024-03-04T10:00:00Z",
                "scriptText": "Hello team."
            },
            {
                "meeting_id": "s2",
                "timestamp": 1709546400,
                "segments": [
                    { "speaker": "Speaker 1", "text": "First." },
                    { "speaker": "Speaker 2", "text": "Second." }
                ]
            }
        ]))
        .unwrap();

        let ScriptsPayload::Many(records) = payload else {
            panic!("expected array payload");
        };
        let documents: Vec<Document> =
            records.into_iter().filter_map(ScriptRecord::into_document).collect();

        assert_eq!(documents[0].script_id, "s1");
        assert_eq!(documents[0].full_text(), "Hello team.");
        assert_eq!(documents[1].title, "s2");
        assert_eq!(documents[1].timestamp.as_deref(), Some("1709546400"));
        assert_eq!(
            documents[1].full_text(),
            "Speaker 1: First.\nSpeaker 2: Second."
        );
    }

    #[test]
    fn test_single_object_payload() {
        let payload: ScriptsPayload =
            serde_json::from_value(serde_json::json!({ "id": "only", "script_text": "x" }))
                .unwrap();

        assert!(matches!(payload, ScriptsPayload::One(_)));
    }

    #[test]
    fn test_order_by_request_dedupes_and_drops_strays() {
        let docs = vec![
            Document::from_text("b", "B", None, "b"),
            Document::from_text("stray", "S", None, "s"),
            Document::from_text("a", "A", None, "a"),
            Document::from_text("b", "B2", None, "b2"),
        ];
        let requested = vec!["a".to_string(), "b".to_string(), "a".to_string(), "missing".to_string()];

        let ordered = order_by_request(&requested, docs);
        let ids: Vec<&str> = ordered.iter().map(|d| d.script_id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(ordered[1].title, "B");
    }
}
