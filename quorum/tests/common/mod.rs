#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quorum::config::{ProcessingConfig, QualityConfig, RetrievalConfig};
use quorum::embeddings::Embedder;
use quorum::error::{QuorumError, Result};
use quorum::llm::TextCompleter;
use quorum::models::{Document, DocumentContent, Segment, SummaryRecord};
use quorum::pipeline::{Collaborators, PipelineSettings, QaPipeline};
use quorum::sources::{SummaryIndex, TranscriptStore};

/// Each keyword owns one dimension of the fake embedding space.
pub const VOCABULARY: &[&str] = &["budget", "launch", "hiring", "outage"];

/// Substrings that identify which prompt template the completer is looking at.
pub mod markers {
    pub const MEMORY: &str = "You maintain a running summary";
    pub const ENHANCE: &str = "Rewrite the current question";
    pub const REWRITE: &str = "improve semantic search";
    pub const ANSWER: &str = "Respond with a single JSON object in exactly this shape";
    pub const GRADE: &str = "Rate the quality";
    pub const IMPROVE: &str = "Improve it.";
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lowered = text.to_lowercase();
    VOCABULARY
        .iter()
        .map(|word| lowered.matches(word).count() as f32)
        .collect()
}

#[derive(Default)]
pub struct FakeEmbedder {
    pub single_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    pub fail_batches: bool,
}

impl FakeEmbedder {
    pub fn failing_batches() -> Self {
        Self {
            fail_batches: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches {
            return Err(QuorumError::Embedding("embedding service offline".to_string()));
        }
        Ok(texts.iter().map(|text| keyword_vector(text)).collect())
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Filtered,
    Fail,
    /// Never answers; only a stage timeout gets the run past it.
    Hang,
}

impl Reply {
    pub fn text(value: impl Into<String>) -> Self {
        Reply::Text(value.into())
    }
}

struct Rule {
    marker: &'static str,
    replies: VecDeque<Reply>,
    last: Option<Reply>,
}

/// Completer that answers by prompt template. Each template has a queue of replies;
/// the last reply repeats once the queue is drained. Unscripted prompts fail.
#[derive(Default)]
pub struct ScriptedCompleter {
    rules: Mutex<Vec<Rule>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, marker: &'static str, reply: Reply) -> Self {
        {
            let mut rules = self.rules.lock().expect("rules lock");
            match rules.iter_mut().find(|rule| rule.marker == marker) {
                Some(rule) => rule.replies.push_back(reply),
                None => rules.push(Rule {
                    marker,
                    replies: VecDeque::from([reply]),
                    last: None,
                }),
            }
        }
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }

    pub fn calls_matching(&self, marker: &str) -> usize {
        self.prompts
            .lock()
            .expect("prompts lock")
            .iter()
            .filter(|prompt| prompt.contains(marker))
            .count()
    }
}

#[async_trait]
impl TextCompleter for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());

        let reply = {
            let mut rules = self.rules.lock().expect("rules lock");
            rules
                .iter_mut()
                .find(|rule| prompt.contains(rule.marker))
                .and_then(|rule| {
                    let next = rule.replies.pop_front().or_else(|| rule.last.clone());
                    rule.last = next.clone();
                    next
                })
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Filtered) => Err(QuorumError::ContentFiltered(
                "prompt triggered the content_filter".to_string(),
            )),
            Some(Reply::Fail) => Err(QuorumError::Llm("upstream model error".to_string())),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(QuorumError::Llm("no scripted reply".to_string())),
        }
    }
}

/// Returns the stored documents that were asked for, in stored order.
#[derive(Default)]
pub struct FakeTranscriptStore {
    pub documents: Vec<Document>,
    pub fetches: AtomicUsize,
    pub fail: bool,
    pub hang: bool,
}

#[async_trait]
impl TranscriptStore for FakeTranscriptStore {
    async fn fetch(&self, script_ids: &[String]) -> Result<Vec<Document>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            return std::future::pending().await;
        }
        if self.fail {
            return Err(QuorumError::TranscriptService(
                "Transcript service returned 503".to_string(),
            ));
        }
        Ok(self
            .documents
            .iter()
            .filter(|document| script_ids.contains(&document.script_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeSummaryIndex {
    pub records: Vec<SummaryRecord>,
}

#[async_trait]
impl SummaryIndex for FakeSummaryIndex {
    async fn all_summaries(&self) -> Result<Vec<SummaryRecord>> {
        Ok(self.records.clone())
    }

    async fn summaries_for(&self, script_ids: &[String]) -> Result<Vec<SummaryRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| script_ids.contains(&record.script_id))
            .cloned()
            .collect())
    }
}

pub fn summary(script_id: &str, keywords: &str, title: &str, text: &str) -> SummaryRecord {
    SummaryRecord {
        script_id: script_id.to_string(),
        embedding: keyword_vector(keywords),
        title: Some(title.to_string()),
        summary_text: Some(text.to_string()),
    }
}

pub fn transcript(script_id: &str, title: &str, turns: &[(&str, &str)]) -> Document {
    Document {
        script_id: script_id.to_string(),
        title: title.to_string(),
        timestamp: Some("2024-05-01T09:00:00Z".to_string()),
        content: DocumentContent::Segments(
            turns
                .iter()
                .map(|(speaker, text)| Segment {
                    speaker: speaker.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        ),
    }
}

pub fn corpus_summaries() -> Vec<SummaryRecord> {
    vec![
        summary("m-budget", "budget", "Budget review", "The Q3 budget was approved."),
        summary("m-launch", "launch", "Launch sync", "The launch moved to October."),
        summary("m-hiring", "hiring", "Hiring plan", "Two hiring slots were opened."),
    ]
}

pub fn corpus_documents() -> Vec<Document> {
    vec![
        transcript(
            "m-budget",
            "Budget review",
            &[
                ("Speaker 1", "The budget for Q3 is approved at two million."),
                ("Speaker 2", "Finance will publish the budget numbers on Monday."),
            ],
        ),
        transcript(
            "m-launch",
            "Launch sync",
            &[
                ("Speaker 1", "The launch moves to October."),
                ("Speaker 2", "Marketing needs the launch assets by September."),
            ],
        ),
        transcript(
            "m-hiring",
            "Hiring plan",
            &[("Speaker 1", "We are opening two hiring slots for the platform team.")],
        ),
    ]
}

pub fn answer_json(answer: &str, quotes: &[(&str, &str)]) -> String {
    let quotes: Vec<serde_json::Value> = quotes
        .iter()
        .map(|(text, speaker)| serde_json::json!({ "text": text, "speaker": speaker }))
        .collect();
    serde_json::json!({ "answer": answer, "quotes": quotes }).to_string()
}

pub fn test_settings() -> PipelineSettings {
    PipelineSettings {
        processing: ProcessingConfig::default(),
        retrieval: RetrievalConfig::default(),
        quality: QualityConfig {
            enable_question_rewrite: false,
            stage_timeout_secs: 5,
            ..QualityConfig::default()
        },
    }
}

pub struct Harness {
    pub pipeline: QaPipeline,
    pub completer: Arc<ScriptedCompleter>,
    pub embedder: Arc<FakeEmbedder>,
    pub transcripts: Arc<FakeTranscriptStore>,
}

pub struct HarnessBuilder {
    completer: ScriptedCompleter,
    embedder: FakeEmbedder,
    summaries: Vec<SummaryRecord>,
    documents: Vec<Document>,
    transcripts_fail: bool,
    transcripts_hang: bool,
    settings: PipelineSettings,
}

impl HarnessBuilder {
    pub fn new(completer: ScriptedCompleter) -> Self {
        Self {
            completer,
            embedder: FakeEmbedder::default(),
            summaries: corpus_summaries(),
            documents: corpus_documents(),
            transcripts_fail: false,
            transcripts_hang: false,
            settings: test_settings(),
        }
    }

    pub fn summaries(mut self, summaries: Vec<SummaryRecord>) -> Self {
        self.summaries = summaries;
        self
    }

    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    pub fn embedder(mut self, embedder: FakeEmbedder) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn failing_transcripts(mut self) -> Self {
        self.transcripts_fail = true;
        self
    }

    pub fn hanging_transcripts(mut self) -> Self {
        self.transcripts_hang = true;
        self
    }

    /// Override the per-call timeout every stage runs under.
    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.quality.stage_timeout_secs = secs;
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Harness {
        let completer = Arc::new(self.completer);
        let embedder = Arc::new(self.embedder);
        let transcripts = Arc::new(FakeTranscriptStore {
            documents: self.documents,
            fail: self.transcripts_fail,
            hang: self.transcripts_hang,
            ..Default::default()
        });
        let summaries = Arc::new(FakeSummaryIndex {
            records: self.summaries,
        });

        let pipeline = QaPipeline::new(
            Collaborators {
                embedder: embedder.clone(),
                completer: completer.clone(),
                transcripts: transcripts.clone(),
                summaries,
            },
            self.settings,
        );

        Harness {
            pipeline,
            completer,
            embedder,
            transcripts,
        }
    }
}
