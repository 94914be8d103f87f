use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

use super::types::{ArchiveOutcome, CompletionUpdate, NewSubmission, COLUMNS};

pub(crate) async fn create(pool: &PgPool, new: NewSubmission) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (
            id, user_id, request_id, original_text, original_rich_text, word_count,
            model_used, include_alternatives, status, suggestions, alternatives,
            archived, created_at, updated_at
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE, $12, $12)
         RETURNING {COLUMNS}"
    ))
    .bind(new.id)
    .bind(new.user_id)
    .bind(new.request_id)
    .bind(new.original_text)
    .bind(new.original_rich_text)
    .bind(new.word_count)
    .bind(new.model_used)
    .bind(new.include_alternatives)
    .bind(SubmissionStatus::Pending)
    .bind(Json(Vec::<crate::db::models::Suggestion>::new()))
    .bind(Json(Vec::<String>::new()))
    .bind(new.created_at)
    .fetch_one(pool)
    .await
}

/// `pending -> processing`. Returns `false` when the row was not pending.
pub(crate) async fn mark_processing(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE submissions
         SET status = $1,
             updated_at = $2
         WHERE id = $3 AND status = $4",
    )
    .bind(SubmissionStatus::Processing)
    .bind(now)
    .bind(id)
    .bind(SubmissionStatus::Pending)
    .execute(pool)
    .await?;

    Ok(updated.rows_affected() > 0)
}

/// `processing | pending -> completed`. Terminal rows are never touched.
pub(crate) async fn mark_completed(
    pool: &PgPool,
    id: &str,
    update: CompletionUpdate,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE submissions
         SET status = $1,
             corrected_text = $2,
             suggestions = $3,
             alternatives = $4,
             processing_time = $5,
             error = NULL,
             updated_at = $6
         WHERE id = $7 AND status IN ($8, $9)",
    )
    .bind(SubmissionStatus::Completed)
    .bind(update.corrected_text)
    .bind(Json(update.suggestions))
    .bind(Json(update.alternatives))
    .bind(update.processing_time)
    .bind(update.completed_at)
    .bind(id)
    .bind(SubmissionStatus::Pending)
    .bind(SubmissionStatus::Processing)
    .execute(pool)
    .await?;

    Ok(updated.rows_affected() > 0)
}

/// `processing | pending -> failed`. Terminal rows are never touched.
pub(crate) async fn mark_failed(
    pool: &PgPool,
    id: &str,
    error: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE submissions
         SET status = $1,
             error = $2,
             updated_at = $3
         WHERE id = $4 AND status IN ($5, $6)",
    )
    .bind(SubmissionStatus::Failed)
    .bind(error)
    .bind(now)
    .bind(id)
    .bind(SubmissionStatus::Pending)
    .bind(SubmissionStatus::Processing)
    .execute(pool)
    .await?;

    Ok(updated.rows_affected() > 0)
}

/// Sets the archive flag once. `None` means the caller owns no such row.
pub(crate) async fn archive(
    pool: &PgPool,
    user_id: &str,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<ArchiveOutcome>, sqlx::Error> {
    let archived_at = sqlx::query_scalar::<_, PrimitiveDateTime>(
        "UPDATE submissions
         SET archived = TRUE,
             archived_at = $1,
             updated_at = $1
         WHERE id = $2 AND user_id = $3 AND archived = FALSE
         RETURNING archived_at",
    )
    .bind(now)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(archived_at) = archived_at {
        return Ok(Some(ArchiveOutcome::Archived { archived_at }));
    }

    let existing = sqlx::query_scalar::<_, Option<PrimitiveDateTime>>(
        "SELECT archived_at
         FROM submissions
         WHERE id = $1 AND user_id = $2 AND archived = TRUE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(existing.flatten().map(|archived_at| ArchiveOutcome::AlreadyArchived { archived_at }))
}

pub(crate) async fn purge_archived_before(
    pool: &PgPool,
    cutoff: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query(
        "DELETE FROM submissions
         WHERE archived = TRUE
           AND archived_at IS NOT NULL
           AND archived_at < $1",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(deleted.rows_affected())
}
