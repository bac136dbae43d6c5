use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

/// Substrings (lowercased) that providers use when a policy filter rejects a prompt or output.
const CONTENT_FILTER_MARKERS: &[&str] = &[
    "content filter being triggered",
    "content management policy",
    "content_filter",
    "responsibleaipolicyviolation",
];

#[derive(Error, Debug)]
pub enum QuorumError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("API rate limit exceeded, retry after {retry_after:?} seconds")]
    ApiRateLimit { retry_after: Option<u64> },

    #[error("API authentication error: {0}")]
    ApiAuth(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Transcript service error: {0}")]
    TranscriptService(String),

    #[error("Summary index error: {0}")]
    SummaryIndex(String),

    #[error("Step {step} failed: {message}")]
    StageFailed { step: String, message: String },
}

impl QuorumError {
    /// True when the failure came from a provider-side content policy rather than a fault.
    pub fn is_content_filtered(&self) -> bool {
        match self {
            QuorumError::ContentFiltered(_) => true,
            QuorumError::Llm(msg) | QuorumError::StageFailed { message: msg, .. } => {
                mentions_content_filter(msg)
            }
            _ => false,
        }
    }
}

/// Case-insensitive scan for the markers providers attach to filtered requests.
pub fn mentions_content_filter(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CONTENT_FILTER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Errors that escape a handler render through the v1 envelope.
impl IntoResponse for QuorumError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, QuorumError>;
