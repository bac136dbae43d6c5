use crate::models::{EmbeddedChunk, ScoredChunk};
use crate::search::ranking::stabilize_chunks;

/// Cosine similarity clamped to `[0, 1]`.
///
/// Mismatched lengths, empty vectors and zero norms carry no signal and score 0, as do
/// negative similarities.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    }
}

/// Score every embedded chunk against the query and keep the best `top_k` scoring at or
/// above `threshold`, highest first.
pub fn select_relevant_chunks(
    query_embedding: &[f32],
    chunks: &[EmbeddedChunk],
    threshold: f32,
    top_k: usize,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|embedded| ScoredChunk {
            chunk: embedded.chunk.clone(),
            relevance_score: cosine_similarity(query_embedding, &embedded.embedding),
        })
        .filter(|candidate| candidate.relevance_score >= threshold)
        .collect();

    stabilize_chunks(&mut scored);
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn embedded(script_id: &str, index: usize, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                script_id: script_id.to_string(),
                chunk_index: index,
                text: format!("{script_id}-{index}"),
                title: script_id.to_string(),
                timestamp: None,
            },
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_select_relevant_chunks_threshold_is_inclusive() {
        let chunks = vec![
            embedded("a", 0, vec![1.0, 0.0]),
            embedded("b", 0, vec![0.0, 1.0]),
            embedded("c", 0, vec![1.0, 1.0]),
        ];

        let selected = select_relevant_chunks(&[1.0, 0.0], &chunks, 1.0, 10);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].chunk.script_id, "a");
    }

    #[test]
    fn test_select_relevant_chunks_orders_and_truncates() {
        let chunks = vec![
            embedded("low", 0, vec![1.0, 2.0]),
            embedded("b", 1, vec![1.0, 0.0]),
            embedded("a", 3, vec![1.0, 0.0]),
            embedded("a", 2, vec![1.0, 0.0]),
        ];

        let selected = select_relevant_chunks(&[1.0, 0.0], &chunks, 0.4, 3);
        let keys: Vec<(&str, usize)> = selected
            .iter()
            .map(|c| (c.chunk.script_id.as_str(), c.chunk.chunk_index))
            .collect();

        assert_eq!(keys, vec![("a", 2), ("a", 3), ("b", 1)]);
    }
}
