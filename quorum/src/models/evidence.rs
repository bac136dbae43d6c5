use serde::{Deserialize, Serialize};

/// A quotation attributed to a speaker, as produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default)]
    pub speaker: String,
}

/// Which tier of the matching cascade resolved a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Normalized,
    LeadingWords,
    PartialWords,
    Fallback,
    /// There were no chunks to match against.
    Unmatched,
}

/// A quote reconciled against the retrieved chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceQuote {
    pub quote: String,
    pub speaker: String,
    pub script_id: Option<String>,
    pub meeting_title: Option<String>,
    pub meeting_date: Option<String>,
    pub chunk_index: Option<usize>,
    pub relevance_score: Option<f32>,
    pub match_method: MatchMethod,
}

impl EvidenceQuote {
    pub fn unmatched(quote: &Quote) -> Self {
        Self {
            quote: quote.text.clone(),
            speaker: quote.speaker.clone(),
            script_id: None,
            meeting_title: None,
            meeting_date: None,
            chunk_index: None,
            relevance_score: None,
            match_method: MatchMethod::Unmatched,
        }
    }
}

/// A document-level citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub script_id: String,
    pub title: String,
    pub timestamp: Option<String>,
    pub relevance_score: f32,
}
