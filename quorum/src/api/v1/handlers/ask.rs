use axum::extract::State;
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::AskRequest;
use crate::api::v1::response::{ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::models::AnswerResponse;

/// `POST /api/v1/ask`
///
/// Runs one question through the answer pipeline. Filtered requests and unknown
/// selections still return `200` with the matching `terminal_step`.
pub async fn ask(
    State(state): State<AppState>,
    AppJson(req): AppJson<AskRequest>,
) -> ApiResponse<AnswerResponse> {
    if let Err(e) = req.validate() {
        return ApiResponse::error(ErrorCode::InvalidRequest, e.to_string());
    }

    match state.pipeline.answer(req.into()).await {
        Ok(response) => ApiResponse::success(response),
        Err(e) => e.into(),
    }
}
