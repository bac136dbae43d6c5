//! Rolling conversation memory and follow-up question enhancement.

use crate::error::Result;
use crate::llm::prompts;
use crate::models::ConversationMemory;
use crate::pipeline::runner::QaPipeline;
use crate::pipeline::state::{PipelineState, Step, Transition};

impl QaPipeline {
    /// Fold the current question into the conversation summary.
    ///
    /// The first turn only counts; there is nothing to summarize yet, and the memory
    /// starts out empty.
    pub(super) async fn summarize_memory(&self, state: &PipelineState) -> Result<Transition> {
        let previous = &state.memory;
        let turns = previous.turns.saturating_add(1);

        if previous.turns == 0 || previous.summary.trim().is_empty() {
            let memory = ConversationMemory {
                summary: String::new(),
                turns,
            };
            return Ok(Transition::Next(
                Step::EnhanceQuestion,
                state.clone().with_memory(memory),
            ));
        }

        if state.question.is_empty() {
            return Ok(Transition::Next(
                Step::EnhanceQuestion,
                state.clone().with_memory(ConversationMemory {
                    summary: previous.summary.clone(),
                    turns,
                }),
            ));
        }

        let prompt = prompts::memory_summary_prompt(&previous.summary, &state.question);
        let summary = match self.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => previous.summary.clone(),
            Err(error) => {
                Self::tolerate(Step::SummarizeMemory, error)?;
                previous.summary.clone()
            }
        };

        tracing::debug!(turns, summary_len = summary.len(), "Conversation memory updated");

        Ok(Transition::Next(
            Step::EnhanceQuestion,
            state.clone().with_memory(ConversationMemory { summary, turns }),
        ))
    }

    /// Make a follow-up self-contained using the memory carried into this turn.
    pub(super) async fn enhance_question(&self, state: &PipelineState) -> Result<Transition> {
        let memory = state.memory.summary.trim();
        if memory.is_empty() || state.question.is_empty() {
            return Ok(Transition::Next(
                Step::ProcessQuestion,
                state.clone().with_enhanced_question(state.question.clone()),
            ));
        }

        let prompt = prompts::enhance_question_prompt(memory, &state.question);
        let enhanced = match self.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => state.question.clone(),
            Err(error) => {
                Self::tolerate(Step::EnhanceQuestion, error)?;
                state.question.clone()
            }
        };

        tracing::debug!(
            original_len = state.question.len(),
            enhanced_len = enhanced.len(),
            "Question enhanced with memory"
        );

        Ok(Transition::Next(
            Step::ProcessQuestion,
            state.clone().with_enhanced_question(enhanced),
        ))
    }
}
