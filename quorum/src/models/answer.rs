use serde::{Deserialize, Serialize};

use super::{EvidenceQuote, Source};

/// Rolling summary of earlier turns, carried by the caller between questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub turns: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(default)]
    pub scoped_document_ids: Vec<String>,
    #[serde(default)]
    pub conversation: Option<ConversationMemory>,
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn scoped_to<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scoped_document_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conversation(mut self, memory: ConversationMemory) -> Self {
        self.conversation = Some(memory);
        self
    }
}

/// Where a pipeline run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStep {
    Completed,
    AnswerImproved,
    DocumentNotFound,
    ContentFiltered,
    Failed,
}

impl TerminalStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalStep::Completed => "completed",
            TerminalStep::AnswerImproved => "answer_improved",
            TerminalStep::DocumentNotFound => "document_not_found",
            TerminalStep::ContentFiltered => "content_filtered",
            TerminalStep::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub evidence_quotes: Vec<EvidenceQuote>,
    pub sources: Vec<Source>,
    pub confidence_score: f32,
    pub used_document_ids: Vec<String>,
    pub terminal_step: TerminalStep,
    pub quality_score: Option<u8>,
    pub improvement_attempts: u8,
    pub processing_steps: Vec<String>,
    pub conversation: ConversationMemory,
}
