use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::QuorumError;

/// `axum::Json` whose rejections render as `invalid_request` in the v1 envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(QuorumError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for QuorumError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> QuorumError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                QuorumError::Validation(format!("Missing required field: {field}"))
            } else {
                QuorumError::Validation(format!("Invalid request body: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            QuorumError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            QuorumError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            QuorumError::Internal("Failed to read request body".to_string())
        }
        _ => QuorumError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
