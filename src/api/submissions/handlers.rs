use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentUser, RequestId};
use crate::api::pagination::{self, PaginatedResponse};
use crate::core::state::AppState;
use crate::schemas::submission::{
    AcceptedSubmissionResponse, CorrectionResponse, CreateSubmissionRequest,
    ListSubmissionsQuery, SubmissionResponse,
};
use crate::services::pipeline::{SubmitOptions, SubmitOutcome};

pub(crate) async fn create_submission(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    RequestId(request_id): RequestId,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<Response, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let options = SubmitOptions {
        text: payload.text,
        rich_text: payload.rich_text,
        include_alternatives: payload.include_alternatives,
        save_draft: payload.save_draft,
    };

    let response = match state.pipeline().submit(&user_id, &request_id, options).await? {
        SubmitOutcome::Accepted { submission, .. } => (
            StatusCode::ACCEPTED,
            Json(AcceptedSubmissionResponse {
                submission: SubmissionResponse::from(submission),
                request_id,
                message: "Submission received, proofreading started",
            }),
        )
            .into_response(),
        SubmitOutcome::Immediate { word_count, model, outcome } => (
            StatusCode::OK,
            Json(CorrectionResponse {
                request_id,
                word_count,
                model_used: model,
                corrected_text: outcome.corrected_text,
                suggestions: outcome.suggestions,
                alternatives: outcome.alternatives,
                processing_time: outcome.duration_seconds,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

pub(crate) async fn list_submissions(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<Json<PaginatedResponse<SubmissionResponse>>, ApiError> {
    let (offset, limit) = pagination::clamp(query.offset, query.limit);

    let items = state
        .store()
        .list_active(&user_id, offset, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submissions"))?;
    let total_count = state
        .store()
        .count_active(&user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count submissions"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(SubmissionResponse::from).collect(),
        total_count,
        offset,
        limit,
    }))
}

pub(crate) async fn get_submission(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = state
        .store()
        .find_for_user(&user_id, &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok(Json(SubmissionResponse::from(submission)))
}
