//! Content-policy handling for oracle failures.

use crate::error::QuorumError;

/// Fixed, non-informative reply returned when a provider policy filter fires.
pub const SAFE_RESPONSE: &str = "I'm unable to help with that request because it was flagged by a content policy. Please rephrase your question and try again.";

/// How an oracle failure should steer the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleFailure {
    /// Policy filter; the run short-circuits to the safe response.
    Filtered { reason: String },
    /// Anything else; handled by the stage that saw it.
    Other,
}

pub fn classify(error: &QuorumError) -> OracleFailure {
    if error.is_content_filtered() {
        OracleFailure::Filtered {
            reason: error.to_string(),
        }
    } else {
        OracleFailure::Other
    }
}
