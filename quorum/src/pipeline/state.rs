use crate::models::{
    AnswerRequest, AnswerResponse, ConversationMemory, Document, EmbeddedChunk, EvidenceQuote,
    ScoredChunk, ScoredSummary, Source, TerminalStep,
};

/// Named, non-terminal states of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    SummarizeMemory,
    EnhanceQuestion,
    ProcessQuestion,
    SearchCorpus,
    SearchSelected,
    FetchTranscripts,
    ChunkAndEmbed,
    SelectChunks,
    GenerateAnswer,
    EvaluateAnswer,
    ImproveAnswer,
}

impl Step {
    pub const FIRST: Step = Step::SummarizeMemory;

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::SummarizeMemory => "summarize_memory",
            Step::EnhanceQuestion => "enhance_question",
            Step::ProcessQuestion => "process_question",
            Step::SearchCorpus => "search_corpus",
            Step::SearchSelected => "search_selected",
            Step::FetchTranscripts => "fetch_transcripts",
            Step::ChunkAndEmbed => "chunk_and_embed",
            Step::SelectChunks => "select_chunks",
            Step::GenerateAnswer => "generate_answer",
            Step::EvaluateAnswer => "evaluate_answer",
            Step::ImproveAnswer => "improve_answer",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of executing one step.
#[derive(Debug, Clone)]
pub enum Transition {
    Next(Step, PipelineState),
    Finish(TerminalStep, PipelineState),
}

/// A failure recorded against the step that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub step: Step,
    pub message: String,
    /// Caller input was invalid; never retried.
    pub input_error: bool,
}

/// The single record threaded through every step of one run.
///
/// Steps never mutate a shared instance: each one receives the current record and hands
/// back an updated copy through the `with_*` methods.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub question: String,
    pub scoped_document_ids: Vec<String>,
    pub memory: ConversationMemory,
    pub enhanced_question: String,
    pub search_text: String,
    pub query_embedding: Option<Vec<f32>>,

    pub summaries: Vec<ScoredSummary>,
    pub selected_document_ids: Vec<String>,
    pub documents: Vec<Document>,
    pub embedded_chunks: Vec<EmbeddedChunk>,
    pub relevant_chunks: Vec<ScoredChunk>,
    pub context: String,

    pub answer: String,
    pub evidence_quotes: Vec<EvidenceQuote>,
    pub sources: Vec<Source>,
    pub used_document_ids: Vec<String>,
    pub confidence_score: f32,

    pub quality_score: Option<u8>,
    pub improvement_attempts: u8,
    pub answer_revised: bool,

    pub terminal: Option<TerminalStep>,
    pub failure: Option<StageFailure>,
    pub filtered_reason: Option<String>,
    pub processing_steps: Vec<String>,
}

impl PipelineState {
    pub fn new(request: AnswerRequest) -> Self {
        let question = request.question.trim().to_string();
        Self {
            enhanced_question: question.clone(),
            search_text: question.clone(),
            question,
            scoped_document_ids: request.scoped_document_ids,
            memory: request.conversation.unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn is_scoped(&self) -> bool {
        !self.scoped_document_ids.is_empty()
    }

    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_enhanced_question(mut self, question: impl Into<String>) -> Self {
        let question = question.into();
        self.search_text = question.clone();
        self.enhanced_question = question;
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_query_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.query_embedding = Some(embedding);
        self
    }

    /// Ranked summaries and the document ids they select, in rank order.
    pub fn with_summaries(mut self, summaries: Vec<ScoredSummary>) -> Self {
        self.selected_document_ids = summaries.iter().map(|s| s.script_id.clone()).collect();
        self.summaries = summaries;
        self
    }

    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_embedded_chunks(mut self, chunks: Vec<EmbeddedChunk>) -> Self {
        self.embedded_chunks = chunks;
        self
    }

    pub fn with_relevant_chunks(mut self, chunks: Vec<ScoredChunk>) -> Self {
        self.relevant_chunks = chunks;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>, evidence: Vec<EvidenceQuote>) -> Self {
        self.answer = answer.into();
        self.evidence_quotes = evidence;
        self
    }

    pub fn with_citations(mut self, sources: Vec<Source>, confidence_score: f32) -> Self {
        let mut used: Vec<String> = sources.iter().map(|s| s.script_id.clone()).collect();
        used.sort();
        used.dedup();
        self.used_document_ids = used;
        self.sources = sources;
        self.confidence_score = confidence_score;
        self
    }

    pub fn with_quality_score(mut self, score: u8) -> Self {
        self.quality_score = Some(score);
        self
    }

    /// Count one improvement pass. The counter only ever grows.
    pub fn with_improvement_attempt(mut self, revised: bool) -> Self {
        self.improvement_attempts = self.improvement_attempts.saturating_add(1);
        self.answer_revised |= revised;
        self
    }

    /// Terminal answer for a selection the summary index could not resolve.
    pub fn with_not_found(mut self, message: impl Into<String>) -> Self {
        self.answer = message.into();
        self.summaries.clear();
        self.selected_document_ids.clear();
        self.evidence_quotes.clear();
        self.sources.clear();
        self.used_document_ids.clear();
        self.confidence_score = 0.0;
        self
    }

    /// Replace every user-facing field with the fixed refusal.
    pub fn with_safe_response(mut self, safe_answer: &str, reason: impl Into<String>) -> Self {
        self.answer = safe_answer.to_string();
        self.evidence_quotes.clear();
        self.sources.clear();
        self.used_document_ids.clear();
        self.confidence_score = 0.0;
        self.filtered_reason = Some(reason.into());
        self
    }

    pub fn with_failure(mut self, step: Step, message: impl Into<String>, input_error: bool) -> Self {
        self.failure = Some(StageFailure {
            step,
            message: message.into(),
            input_error,
        });
        self.confidence_score = 0.0;
        self
    }

    pub fn with_step_recorded(mut self, name: &str) -> Self {
        self.processing_steps.push(name.to_string());
        self
    }

    pub fn with_terminal(mut self, terminal: TerminalStep) -> Self {
        self.terminal = Some(terminal);
        self.processing_steps.push(terminal.as_str().to_string());
        self
    }

    pub fn into_response(self) -> AnswerResponse {
        AnswerResponse {
            answer: self.answer,
            evidence_quotes: self.evidence_quotes,
            sources: self.sources,
            confidence_score: self.confidence_score,
            used_document_ids: self.used_document_ids,
            terminal_step: self.terminal.unwrap_or(TerminalStep::Failed),
            quality_score: self.quality_score,
            improvement_attempts: self.improvement_attempts,
            processing_steps: self.processing_steps,
            conversation: self.memory,
        }
    }
}
