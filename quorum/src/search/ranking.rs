//! Deterministic deduplication and ordering of scored candidates.
//!
//! Every ordering here is a total order over a compound key so that identical inputs
//! always produce identical output, independent of upstream collection order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{ScoredCandidate, ScoredChunk, ScoredSummary, Source, SummaryRecord};
use crate::search::similarity::cosine_similarity;

fn cmp_score_desc(left: f32, right: f32) -> Ordering {
    right.total_cmp(&left)
}

/// Keep one candidate per document: the highest-scoring one, first seen on ties.
///
/// Survivors stay at the position where their document was first encountered.
pub fn dedupe_by_document<T: ScoredCandidate>(candidates: Vec<T>) -> Vec<T> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<T> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match positions.get(candidate.document_id()) {
            Some(&position) => {
                if candidate.relevance_score() > kept[position].relevance_score() {
                    kept[position] = candidate;
                }
            }
            None => {
                positions.insert(candidate.document_id().to_string(), kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

/// Score summary embeddings against the query, keep those strictly above `threshold`,
/// deduplicate by document and return the best `top_k`.
pub fn rank_summaries(
    query_embedding: &[f32],
    records: &[SummaryRecord],
    threshold: f32,
    top_k: usize,
) -> Vec<ScoredSummary> {
    let scored: Vec<ScoredSummary> = records
        .iter()
        .map(|record| ScoredSummary {
            script_id: record.script_id.clone(),
            title: record.title.clone(),
            summary_text: record.summary_text.clone(),
            relevance_score: cosine_similarity(query_embedding, &record.embedding),
        })
        .filter(|summary| summary.relevance_score > threshold)
        .collect();

    let mut ranked = dedupe_by_document(scored);
    ranked.sort_by(|left, right| {
        cmp_score_desc(left.relevance_score, right.relevance_score)
            .then_with(|| left.script_id.cmp(&right.script_id))
    });
    ranked.truncate(top_k);
    ranked
}

/// Sort chunks by score descending, then document id ascending, then ordinal ascending.
///
/// Context assembly and citation matching both depend on this exact order.
pub fn stabilize_chunks(chunks: &mut [ScoredChunk]) {
    chunks.sort_by(|left, right| {
        cmp_score_desc(left.relevance_score, right.relevance_score)
            .then_with(|| left.chunk.script_id.cmp(&right.chunk.script_id))
            .then_with(|| left.chunk.chunk_index.cmp(&right.chunk.chunk_index))
    });
}

/// Document-level citations from the chunk list: one per document, best score, at most
/// `max_sources`.
pub fn build_sources(chunks: &[ScoredChunk], max_sources: usize) -> Vec<Source> {
    let mut ordered = chunks.to_vec();
    stabilize_chunks(&mut ordered);

    let mut sources: Vec<Source> = dedupe_by_document(ordered)
        .into_iter()
        .map(|scored| Source {
            script_id: scored.chunk.script_id,
            title: scored.chunk.title,
            timestamp: scored.chunk.timestamp,
            relevance_score: scored.relevance_score,
        })
        .collect();

    sources.sort_by(|left, right| {
        cmp_score_desc(left.relevance_score, right.relevance_score)
            .then_with(|| left.script_id.cmp(&right.script_id))
    });
    sources.truncate(max_sources);
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn scored(script_id: &str, index: usize, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                script_id: script_id.to_string(),
                chunk_index: index,
                text: format!("{script_id} chunk {index}"),
                title: format!("Meeting {script_id}"),
                timestamp: Some("2024-05-01".to_string()),
            },
            relevance_score: score,
        }
    }

    fn record(script_id: &str, embedding: Vec<f32>) -> SummaryRecord {
        SummaryRecord {
            script_id: script_id.to_string(),
            embedding,
            title: None,
            summary_text: Some(format!("summary of {script_id}")),
        }
    }

    #[test]
    fn test_dedupe_keeps_max_and_first_seen_on_tie() {
        let deduped = dedupe_by_document(vec![
            scored("a", 0, 0.5),
            scored("b", 0, 0.9),
            scored("a", 1, 0.8),
            scored("b", 1, 0.9),
        ]);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].chunk.chunk_index, 1);
        assert_eq!(deduped[0].relevance_score, 0.8);
        assert_eq!(deduped[1].chunk.chunk_index, 0);
    }

    #[test]
    fn test_rank_summaries_threshold_is_strict() {
        let records = vec![
            record("exact", vec![1.0, 0.0]),
            record("orthogonal", vec![0.0, 1.0]),
        ];

        assert_eq!(rank_summaries(&[1.0, 0.0], &records, 0.7, 5).len(), 1);
        assert!(rank_summaries(&[1.0, 0.0], &records, 1.0, 5).is_empty());
    }

    #[test]
    fn test_rank_summaries_dedupes_sorts_and_truncates() {
        let records = vec![
            record("z", vec![1.0, 0.0]),
            record("y", vec![0.9, 0.1]),
            record("z", vec![0.9, 0.2]),
            record("a", vec![1.0, 0.0]),
            record("m", vec![0.95, 0.05]),
        ];

        let ranked = rank_summaries(&[1.0, 0.0], &records, 0.7, 3);
        let ids: Vec<&str> = ranked.iter().map(|s| s.script_id.as_str()).collect();

        assert_eq!(ids, vec!["a", "z", "m"]);
        assert!(ranked.iter().all(|s| s.relevance_score > 0.7));
    }

    #[test]
    fn test_stabilize_breaks_ties_by_id_then_ordinal() {
        let mut chunks = vec![
            scored("b", 0, 0.81),
            scored("a", 4, 0.81),
            scored("a", 2, 0.81),
            scored("c", 0, 0.95),
        ];

        stabilize_chunks(&mut chunks);

        let keys: Vec<(&str, usize)> = chunks
            .iter()
            .map(|c| (c.chunk.script_id.as_str(), c.chunk.chunk_index))
            .collect();
        assert_eq!(keys, vec![("c", 0), ("a", 2), ("a", 4), ("b", 0)]);
    }

    #[test]
    fn test_sources_same_document_tie_keeps_lowest_ordinal() {
        let chunks = vec![scored("doc", 7, 0.81), scored("doc", 3, 0.81)];

        let sources = build_sources(&chunks, 5);

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].script_id, "doc");
        assert_eq!(sources[0].relevance_score, 0.81);
    }

    #[test]
    fn test_sources_capped() {
        let chunks: Vec<ScoredChunk> = (0..8)
            .map(|i| scored(&format!("d{i}"), 0, 0.5 + i as f32 * 0.01))
            .collect();

        let sources = build_sources(&chunks, 5);

        assert_eq!(sources.len(), 5);
        assert_eq!(sources[0].script_id, "d7");
        assert_eq!(sources[4].script_id, "d3");
    }

    fn arb_chunks() -> impl Strategy<Value = Vec<ScoredChunk>> {
        prop::collection::vec(("[a-e]", 0usize..6, 0u8..=20), 0..40).prop_map(|rows| {
            rows.into_iter()
                .map(|(id, index, score)| scored(&id, index, score as f32 / 20.0))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_dedupe_keeps_max_score(chunks in arb_chunks()) {
            let deduped = dedupe_by_document(chunks.clone());

            let mut seen = std::collections::HashSet::new();
            for survivor in &deduped {
                prop_assert!(seen.insert(survivor.chunk.script_id.clone()));
                let max = chunks
                    .iter()
                    .filter(|c| c.chunk.script_id == survivor.chunk.script_id)
                    .map(|c| c.relevance_score)
                    .fold(f32::MIN, f32::max);
                prop_assert_eq!(survivor.relevance_score, max);
            }

            let distinct: std::collections::HashSet<_> =
                chunks.iter().map(|c| c.chunk.script_id.clone()).collect();
            prop_assert_eq!(deduped.len(), distinct.len());
        }

        #[test]
        fn prop_stabilize_is_idempotent(chunks in arb_chunks()) {
            let mut once = chunks.clone();
            stabilize_chunks(&mut once);
            let mut twice = once.clone();
            stabilize_chunks(&mut twice);
            prop_assert_eq!(&once, &twice);

            let mut reversed = chunks;
            reversed.reverse();
            stabilize_chunks(&mut reversed);
            let key = |c: &ScoredChunk| (c.chunk.script_id.clone(), c.chunk.chunk_index, c.relevance_score.to_bits());
            prop_assert_eq!(
                once.iter().map(key).collect::<Vec<_>>(),
                reversed.iter().map(key).collect::<Vec<_>>()
            );
        }
    }
}
