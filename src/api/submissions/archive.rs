use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::{expires_at, format_primitive, primitive_now_utc, retention_cutoff};
use crate::repositories::submissions::ArchiveOutcome;
use crate::schemas::submission::{
    ArchiveListResponse, ArchiveResponse, ArchivedSubmissionResponse, SubmissionResponse,
};
use crate::tasks::retention;

pub(crate) async fn archive_submission(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(submission_id): Path<String>,
) -> Result<Json<ArchiveResponse>, ApiError> {
    let outcome = state
        .store()
        .archive(&user_id, &submission_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to archive submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let (status, archived_at) = match outcome {
        ArchiveOutcome::Archived { archived_at } => ("archived", archived_at),
        ArchiveOutcome::AlreadyArchived { archived_at } => ("already_archived", archived_at),
    };

    tracing::info!(
        submission_id = %submission_id,
        user_id = %user_id,
        status,
        "Submission archived"
    );

    Ok(Json(ArchiveResponse {
        status,
        archived_at: format_primitive(archived_at),
        retention_days: state.settings().retention().retention_days,
    }))
}

pub(crate) async fn list_archived(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ArchiveListResponse>, ApiError> {
    let retention_days = state.settings().retention().retention_days;
    let window = state.settings().retention().window();
    let now = primitive_now_utc();

    if let Err(err) = retention::purge_expired_archives(state.store().as_ref(), now, window).await {
        tracing::warn!(error = %err, "Opportunistic archive sweep failed");
    }

    let items = state
        .store()
        .list_archived(&user_id, retention_cutoff(now, window))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch archived submissions"))?;

    let items = items
        .into_iter()
        .map(|submission| {
            let expires = submission.archived_at.map(|at| format_primitive(expires_at(at, window)));
            ArchivedSubmissionResponse {
                submission: SubmissionResponse::from(submission),
                expires_at: expires,
            }
        })
        .collect();

    Ok(Json(ArchiveListResponse {
        items,
        retention_days,
        notice: format!(
            "Archived submissions are permanently deleted {retention_days} days after they were archived."
        ),
    }))
}
