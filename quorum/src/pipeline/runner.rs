use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, ProcessingConfig, QualityConfig, RetrievalConfig};
use crate::embeddings::Embedder;
use crate::error::{QuorumError, Result};
use crate::llm::safety::{self, OracleFailure, SAFE_RESPONSE};
use crate::llm::TextCompleter;
use crate::models::{AnswerRequest, AnswerResponse, TerminalStep};
use crate::pipeline::quality::QualityGate;
use crate::pipeline::state::{PipelineState, Step, Transition};
use crate::processing::TextChunker;
use crate::sources::{SummaryIndex, TranscriptStore};

/// Handles to the external services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub embedder: Arc<dyn Embedder>,
    pub completer: Arc<dyn TextCompleter>,
    pub transcripts: Arc<dyn TranscriptStore>,
    pub summaries: Arc<dyn SummaryIndex>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub processing: ProcessingConfig,
    pub retrieval: RetrievalConfig,
    pub quality: QualityConfig,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            processing: config.processing.clone(),
            retrieval: config.retrieval.clone(),
            quality: config.quality.clone(),
        }
    }
}

/// The question-answering pipeline.
///
/// Holds no per-question state, so one instance serves any number of concurrent runs.
#[derive(Clone)]
pub struct QaPipeline {
    pub(super) deps: Collaborators,
    pub(super) settings: PipelineSettings,
    pub(super) chunker: TextChunker,
    pub(super) gate: QualityGate,
}

impl QaPipeline {
    pub fn new(deps: Collaborators, settings: PipelineSettings) -> Self {
        Self {
            chunker: TextChunker::new(&settings.processing),
            gate: QualityGate::new(&settings.quality),
            deps,
            settings,
        }
    }

    /// Answer a question. Input errors and unrecoverable service failures come back as
    /// `Err`; every other outcome, including a filtered request, is a response.
    pub async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse> {
        let state = self.run(request).await;

        if let Some(failure) = &state.failure {
            return Err(if failure.input_error {
                QuorumError::Validation(failure.message.clone())
            } else {
                QuorumError::StageFailed {
                    step: failure.step.to_string(),
                    message: failure.message.clone(),
                }
            });
        }

        Ok(state.into_response())
    }

    /// Drive a run to its terminal state and return the final record.
    pub async fn run(&self, request: AnswerRequest) -> PipelineState {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("qa_run", run_id = %run_id);

        async move {
            tracing::info!(
                question_len = request.question.len(),
                scoped = request.scoped_document_ids.len(),
                "Starting pipeline run"
            );

            let mut step = Step::FIRST;
            let mut state = PipelineState::new(request);

            loop {
                state = state.with_step_recorded(step.as_str());
                tracing::debug!(step = %step, "Entering step");

                match self.execute(step, &state).await {
                    Ok(Transition::Next(next, updated)) => {
                        step = next;
                        state = updated;
                    }
                    Ok(Transition::Finish(terminal, updated)) => {
                        return self.finish(terminal, updated);
                    }
                    Err(error) => {
                        let (terminal, updated) = Self::recover(step, state, error);
                        return self.finish(terminal, updated);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, step: Step, state: &PipelineState) -> Result<Transition> {
        match step {
            Step::SummarizeMemory => self.summarize_memory(state).await,
            Step::EnhanceQuestion => self.enhance_question(state).await,
            Step::ProcessQuestion => self.process_question(state).await,
            Step::SearchCorpus => self.search_corpus(state).await,
            Step::SearchSelected => self.search_selected(state).await,
            Step::FetchTranscripts => self.fetch_transcripts(state).await,
            Step::ChunkAndEmbed => self.chunk_and_embed(state).await,
            Step::SelectChunks => self.select_chunks(state).await,
            Step::GenerateAnswer => self.generate_answer(state).await,
            Step::EvaluateAnswer => self.evaluate_answer(state).await,
            Step::ImproveAnswer => self.improve_answer(state).await,
        }
    }

    /// Route a step error to the safe response or a failed terminal.
    fn recover(step: Step, state: PipelineState, error: QuorumError) -> (TerminalStep, PipelineState) {
        match safety::classify(&error) {
            OracleFailure::Filtered { reason } => {
                tracing::warn!(step = %step, %reason, "Content filter triggered, returning safe response");
                (
                    TerminalStep::ContentFiltered,
                    state.with_safe_response(SAFE_RESPONSE, reason),
                )
            }
            OracleFailure::Other => {
                let input_error = matches!(error, QuorumError::Validation(_));
                if input_error {
                    tracing::warn!(step = %step, error = %error, "Rejected pipeline input");
                } else {
                    tracing::error!(step = %step, error = %error, "Pipeline step failed");
                }
                (
                    TerminalStep::Failed,
                    state.with_failure(step, error.to_string(), input_error),
                )
            }
        }
    }

    fn finish(&self, terminal: TerminalStep, state: PipelineState) -> PipelineState {
        let state = state.with_terminal(terminal);
        tracing::info!(
            terminal = terminal.as_str(),
            confidence = state.confidence_score,
            score = ?state.quality_score,
            sources = state.sources.len(),
            evidence = state.evidence_quotes.len(),
            "Pipeline run finished"
        );
        state
    }

    /// Bound an external call by the per-call timeout.
    pub(super) async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let secs = self.settings.quality.stage_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), call).await {
            Ok(result) => result,
            Err(_) => Err(QuorumError::Timeout(secs)),
        }
    }

    pub(super) async fn complete(&self, prompt: &str) -> Result<String> {
        self.bounded(self.deps.completer.complete(prompt)).await
    }

    /// For steps that may degrade: a filtered failure still short-circuits, anything
    /// else is logged and swallowed.
    pub(super) fn tolerate(step: Step, error: QuorumError) -> Result<()> {
        if error.is_content_filtered() {
            return Err(error);
        }
        tracing::warn!(step = %step, error = %error, "Step degraded, continuing");
        Ok(())
    }
}
