//! Grounded answer generation, grading and the single improvement pass.

use crate::error::Result;
use crate::llm::prompts;
use crate::llm::safety::{self, OracleFailure, SAFE_RESPONSE};
use crate::models::{ScoredChunk, ScoredSummary, TerminalStep};
use crate::pipeline::evidence::EvidenceMatcher;
use crate::pipeline::parser::parse_answer;
use crate::pipeline::quality::{QualityGate, DEFAULT_SCORE};
use crate::pipeline::runner::QaPipeline;
use crate::pipeline::state::{PipelineState, Step, Transition};
use crate::search::{build_sources, stabilize_chunks};

/// Confidence reported when nothing relevant was retrieved.
pub const NO_CONTEXT_CONFIDENCE: f32 = 0.1;

const CONFIDENCE_TOP_N: usize = 3;
const CONFIDENCE_PER_CHUNK: f32 = 0.05;
const CONFIDENCE_MAX_BONUS: f32 = 0.2;
const CONFIDENCE_FLOOR: f32 = 0.3;
const CONFIDENCE_CEILING: f32 = 0.9;

/// Deterministic reply used instead of a model call when the context is empty.
pub fn no_information_answer(question: &str) -> String {
    format!(
        "I'm sorry, I couldn't find anything in the meeting transcripts related to '{question}'. Please try a different question."
    )
}

/// Assemble the grounding context.
///
/// Summaries are ordered by document id and chunks by the stabilized order, so identical
/// retrieval results always produce byte-identical context.
pub fn build_context(
    summaries: &[ScoredSummary],
    chunks: &[ScoredChunk],
    max_summaries: usize,
    max_chunks: usize,
) -> String {
    let mut ordered_summaries: Vec<&ScoredSummary> = summaries.iter().collect();
    ordered_summaries.sort_by(|a, b| a.script_id.cmp(&b.script_id));

    let mut ordered_chunks = chunks.to_vec();
    stabilize_chunks(&mut ordered_chunks);

    let summary_blocks = ordered_summaries
        .into_iter()
        .take(max_summaries)
        .filter_map(|summary| {
            let text = summary.summary_text.as_deref()?.trim();
            if text.is_empty() {
                return None;
            }
            let label = summary.title.as_deref().unwrap_or(&summary.script_id);
            Some(format!("[Summary] {label}\n{text}"))
        });

    let chunk_blocks = ordered_chunks
        .iter()
        .take(max_chunks)
        .filter_map(|scored| {
            let text = scored.chunk.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(format!(
                "[Transcript] {} #{}\n{text}",
                scored.chunk.title, scored.chunk.chunk_index
            ))
        });

    summary_blocks
        .chain(chunk_blocks)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Mean of the top three chunk scores plus a small bonus per chunk, clamped to
/// `[0.3, 0.9]`. `chunks` must be in stabilized order.
pub fn confidence_score(chunks: &[ScoredChunk]) -> f32 {
    if chunks.is_empty() {
        return NO_CONTEXT_CONFIDENCE;
    }

    let top: Vec<f32> = chunks
        .iter()
        .take(CONFIDENCE_TOP_N)
        .map(|c| c.relevance_score)
        .collect();
    let mean = top.iter().sum::<f32>() / top.len() as f32;
    let bonus = (CONFIDENCE_PER_CHUNK * chunks.len() as f32).min(CONFIDENCE_MAX_BONUS);

    (mean + bonus).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

impl QaPipeline {
    pub(super) async fn generate_answer(&self, state: &PipelineState) -> Result<Transition> {
        let retrieval = &self.settings.retrieval;
        let context = build_context(
            &state.summaries,
            &state.relevant_chunks,
            retrieval.max_context_summaries,
            retrieval.max_context_chunks,
        );

        let (answer, evidence) = if context.is_empty() {
            tracing::warn!("Empty context, answering without a model call");
            (no_information_answer(&state.question), Vec::new())
        } else {
            let prompt =
                prompts::structured_answer_prompt(&state.question, &context, &state.memory.summary);
            let raw = self.complete(&prompt).await?;
            let parsed = parse_answer(&raw);
            let evidence = EvidenceMatcher::new(&state.relevant_chunks).reconcile(&parsed.quotes);
            (parsed.answer, evidence)
        };

        let sources = build_sources(&state.relevant_chunks, retrieval.max_sources);
        let confidence = confidence_score(&state.relevant_chunks);

        tracing::info!(
            context_len = context.len(),
            answer_len = answer.len(),
            evidence = evidence.len(),
            sources = sources.len(),
            confidence,
            "Answer generated"
        );

        Ok(Transition::Next(
            Step::EvaluateAnswer,
            state
                .clone()
                .with_context(context)
                .with_answer(answer, evidence)
                .with_citations(sources, confidence),
        ))
    }

    pub(super) async fn evaluate_answer(&self, state: &PipelineState) -> Result<Transition> {
        let score = match self
            .gate
            .rule_score(&state.answer, state.context.trim().is_empty())
        {
            Some(score) => score,
            None => {
                let prompt =
                    prompts::quality_evaluation_prompt(&state.enhanced_question, &state.answer);
                match self.complete(&prompt).await {
                    Ok(raw) => QualityGate::parse_grader_score(&raw).unwrap_or_else(|| {
                        tracing::warn!(reply = %raw.trim(), "Unreadable quality score");
                        DEFAULT_SCORE
                    }),
                    Err(error) => {
                        Self::tolerate(Step::EvaluateAnswer, error)?;
                        DEFAULT_SCORE
                    }
                }
            }
        };

        let state = state.clone().with_quality_score(score);
        let improve = QualityGate::should_improve(score, state.improvement_attempts);

        tracing::info!(
            score,
            attempts = state.improvement_attempts,
            improve,
            "Answer evaluated"
        );

        if improve {
            return Ok(Transition::Next(Step::ImproveAnswer, state));
        }

        let terminal = if state.answer_revised {
            TerminalStep::AnswerImproved
        } else {
            TerminalStep::Completed
        };
        Ok(Transition::Finish(terminal, state))
    }

    /// One retry against the same context. A failed retry keeps the previous answer.
    pub(super) async fn improve_answer(&self, state: &PipelineState) -> Result<Transition> {
        if state.context.trim().is_empty() {
            tracing::info!("Nothing to ground an improvement on, keeping answer");
            return Ok(Transition::Next(
                Step::EvaluateAnswer,
                state.clone().with_improvement_attempt(false),
            ));
        }

        let prompt = prompts::improve_answer_prompt(
            &state.enhanced_question,
            &state.answer,
            state.quality_score.unwrap_or(DEFAULT_SCORE),
            &state.context,
        );

        let raw = match self.complete(&prompt).await {
            Ok(raw) => raw,
            Err(error) => {
                let attempted = state.clone().with_improvement_attempt(false);
                return match safety::classify(&error) {
                    OracleFailure::Filtered { reason } => {
                        tracing::warn!(%reason, "Content filter triggered during improvement");
                        Ok(Transition::Finish(
                            TerminalStep::ContentFiltered,
                            attempted.with_safe_response(SAFE_RESPONSE, reason),
                        ))
                    }
                    OracleFailure::Other => {
                        tracing::warn!(error = %error, "Improvement failed, keeping previous answer");
                        Ok(Transition::Next(Step::EvaluateAnswer, attempted))
                    }
                };
            }
        };

        let parsed = parse_answer(&raw);
        if parsed.answer.trim().is_empty() {
            tracing::warn!("Improvement produced an empty answer, keeping previous answer");
            return Ok(Transition::Next(
                Step::EvaluateAnswer,
                state.clone().with_improvement_attempt(false),
            ));
        }

        let evidence = EvidenceMatcher::new(&state.relevant_chunks).reconcile(&parsed.quotes);

        tracing::info!(
            answer_len = parsed.answer.len(),
            evidence = evidence.len(),
            "Answer improved"
        );

        Ok(Transition::Next(
            Step::EvaluateAnswer,
            state
                .clone()
                .with_answer(parsed.answer, evidence)
                .with_improvement_attempt(true),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use pretty_assertions::assert_eq;

    fn scored(script_id: &str, index: usize, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                script_id: script_id.to_string(),
                chunk_index: index,
                text: text.to_string(),
                title: format!("Sync {script_id}"),
                timestamp: None,
            },
            relevance_score: score,
        }
    }

    fn summary(script_id: &str, text: Option<&str>) -> ScoredSummary {
        ScoredSummary {
            script_id: script_id.to_string(),
            title: None,
            summary_text: text.map(str::to_string),
            relevance_score: 0.8,
        }
    }

    #[test]
    fn test_context_layout_and_order() {
        let summaries = vec![summary("b", Some("Budget review.")), summary("a", None)];
        let chunks = vec![
            scored("y", 1, "Second.", 0.5),
            scored("x", 0, "  ", 0.9),
            scored("x", 3, "First.", 0.7),
        ];

        let context = build_context(&summaries, &chunks, 3, 5);

        assert_eq!(
            context,
            "[Summary] b\nBudget review.\n\n[Transcript] Sync x #3\nFirst.\n\n[Transcript] Sync y #1\nSecond."
        );
    }

    #[test]
    fn test_context_caps() {
        let summaries: Vec<ScoredSummary> = (0..5)
            .map(|i| summary(&format!("s{i}"), Some("text")))
            .collect();
        let chunks: Vec<ScoredChunk> = (0..8)
            .map(|i| scored("d", i, "words", 0.5))
            .collect();

        let context = build_context(&summaries, &chunks, 3, 5);

        assert_eq!(context.matches("[Summary]").count(), 3);
        assert_eq!(context.matches("[Transcript]").count(), 5);
        assert!(context.contains("[Summary] s0"));
        assert!(!context.contains("[Summary] s3"));
    }

    #[test]
    fn test_context_is_identical_for_permuted_input() {
        let chunks = vec![
            scored("b", 0, "beta", 0.81),
            scored("a", 2, "alpha two", 0.81),
            scored("a", 1, "alpha one", 0.81),
        ];
        let mut reversed = chunks.clone();
        reversed.reverse();

        assert_eq!(
            build_context(&[], &chunks, 3, 5),
            build_context(&[], &reversed, 3, 5)
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(build_context(&[summary("a", None)], &[], 3, 5), "");
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence_score(&[]), NO_CONTEXT_CONFIDENCE);

        let single = vec![scored("a", 0, "t", 0.1)];
        assert_eq!(confidence_score(&single), CONFIDENCE_FLOOR);

        let strong: Vec<ScoredChunk> = (0..6).map(|i| scored("a", i, "t", 0.95)).collect();
        assert_eq!(confidence_score(&strong), CONFIDENCE_CEILING);

        let mid = vec![
            scored("a", 0, "t", 0.6),
            scored("a", 1, "t", 0.5),
            scored("a", 2, "t", 0.4),
            scored("a", 3, "t", 0.1),
        ];
        assert!((confidence_score(&mid) - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_no_information_answer_mentions_question() {
        let answer = no_information_answer("who owns billing?");
        assert!(answer.contains("'who owns billing?'"));
    }
}
