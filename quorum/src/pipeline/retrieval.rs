//! Question processing and summary-level retrieval.

use crate::error::{QuorumError, Result};
use crate::llm::prompts;
use crate::models::{SummaryRecord, TerminalStep};
use crate::pipeline::runner::QaPipeline;
use crate::pipeline::state::{PipelineState, Step, Transition};
use crate::search::rank_summaries;

const DISPLAY_ID_CHARS: usize = 8;

/// Answer for a selection the summary index could not resolve. Long ids are shortened.
pub fn not_found_message(requested: &[String]) -> String {
    let ids = requested
        .iter()
        .map(|id| {
            if id.chars().count() > DISPLAY_ID_CHARS {
                format!("{}...", id.chars().take(DISPLAY_ID_CHARS).collect::<String>())
            } else {
                id.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "The requested documents [{ids}] could not be found. Select different documents or search across all meetings."
    )
}

impl QaPipeline {
    /// Validate the question, optionally rewrite it for search and pick the retrieval branch.
    pub(super) async fn process_question(&self, state: &PipelineState) -> Result<Transition> {
        if state.question.is_empty() {
            return Err(QuorumError::Validation("Question must not be empty".to_string()));
        }

        let mut search_text = state.enhanced_question.clone();

        if self.settings.quality.enable_question_rewrite {
            let prompt = prompts::search_rewrite_prompt(&search_text);
            match self.complete(&prompt).await {
                Ok(text) if !text.trim().is_empty() => search_text = text.trim().to_string(),
                Ok(_) => tracing::debug!("Empty search rewrite, keeping question"),
                Err(error) => Self::tolerate(Step::ProcessQuestion, error)?,
            }
        }

        let next = if state.is_scoped() {
            Step::SearchSelected
        } else {
            Step::SearchCorpus
        };

        tracing::info!(
            question_len = state.question.len(),
            search_len = search_text.len(),
            branch = %next,
            "Question processed"
        );

        Ok(Transition::Next(next, state.clone().with_search_text(search_text)))
    }

    /// Rank summaries across the whole corpus.
    pub(super) async fn search_corpus(&self, state: &PipelineState) -> Result<Transition> {
        let records = self.bounded(self.deps.summaries.all_summaries()).await?;
        self.rank_and_route(state, &records).await
    }

    /// Rank summaries for the caller's selection, or stop if none of it resolves.
    pub(super) async fn search_selected(&self, state: &PipelineState) -> Result<Transition> {
        let mut records = self
            .bounded(self.deps.summaries.summaries_for(&state.scoped_document_ids))
            .await?;
        records.retain(|record| state.scoped_document_ids.contains(&record.script_id));

        if records.is_empty() {
            tracing::warn!(
                requested = state.scoped_document_ids.len(),
                "None of the selected documents exist in the summary index"
            );
            let message = not_found_message(&state.scoped_document_ids);
            return Ok(Transition::Finish(
                TerminalStep::DocumentNotFound,
                state.clone().with_not_found(message),
            ));
        }

        self.rank_and_route(state, &records).await
    }

    async fn rank_and_route(
        &self,
        state: &PipelineState,
        records: &[SummaryRecord],
    ) -> Result<Transition> {
        let query_embedding = self.bounded(self.deps.embedder.embed(&state.search_text)).await?;

        let retrieval = &self.settings.retrieval;
        let ranked = rank_summaries(
            &query_embedding,
            records,
            retrieval.summary_threshold,
            retrieval.summary_top_k,
        );

        tracing::info!(
            candidates = records.len(),
            selected = ranked.len(),
            top_score = ?ranked.first().map(|s| s.relevance_score),
            "Summaries ranked"
        );

        let next = if ranked.is_empty() {
            Step::GenerateAnswer
        } else {
            Step::FetchTranscripts
        };

        Ok(Transition::Next(
            next,
            state
                .clone()
                .with_query_embedding(query_embedding)
                .with_summaries(ranked),
        ))
    }
}
