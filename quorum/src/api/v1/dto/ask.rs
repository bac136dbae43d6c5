use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{AnswerRequest, ConversationMemory};

/// Body of `POST /api/v1/ask`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 4000))]
    pub question: String,
    /// Restrict the search to these transcripts. Omitted or `[]` searches everything; a
    /// list of only blank ids is rejected.
    #[serde(default)]
    #[validate(length(max = 50), custom(function = "has_real_id"))]
    pub script_ids: Option<Vec<String>>,
    #[serde(default)]
    pub conversation: Option<ConversationMemory>,
}

fn has_real_id(ids: &[String]) -> Result<(), ValidationError> {
    if !ids.is_empty() && ids.iter().all(|id| id.trim().is_empty()) {
        return Err(ValidationError::new("blank_selection")
            .with_message("script_ids must name at least one transcript".into()));
    }
    Ok(())
}

impl From<AskRequest> for AnswerRequest {
    fn from(req: AskRequest) -> Self {
        let scoped: Vec<String> = req
            .script_ids
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        let request = AnswerRequest::new(req.question).scoped_to(scoped);
        match req.conversation {
            Some(memory) => request.with_conversation(memory),
            None => request,
        }
    }
}
