use serde::{Deserialize, Serialize};

use super::ScoredCandidate;

/// A window of one document's text. Title and timestamp are copied from the owning
/// document so citations can be built from the chunk alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub script_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub title: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub relevance_score: f32,
}

impl ScoredCandidate for ScoredChunk {
    fn document_id(&self) -> &str {
        &self.chunk.script_id
    }

    fn relevance_score(&self) -> f32 {
        self.relevance_score
    }
}
