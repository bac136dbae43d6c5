use serde::{Deserialize, Serialize};

use super::ScoredCandidate;

/// A precomputed summary embedding held by the summary index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub script_id: String,
    pub embedding: Vec<f32>,
    pub title: Option<String>,
    pub summary_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSummary {
    pub script_id: String,
    pub title: Option<String>,
    pub summary_text: Option<String>,
    pub relevance_score: f32,
}

impl ScoredCandidate for ScoredSummary {
    fn document_id(&self) -> &str {
        &self.script_id
    }

    fn relevance_score(&self) -> f32 {
        self.relevance_score
    }
}
