use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Submission;

use super::types::COLUMNS;

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    user_id: &str,
    id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_active_by_user(
    pool: &PgPool,
    user_id: &str,
    offset: i64,
    limit: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         WHERE user_id = $1 AND archived = FALSE
         ORDER BY created_at DESC, id DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(user_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_active_by_user(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM submissions
         WHERE user_id = $1 AND archived = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_archived_by_user(
    pool: &PgPool,
    user_id: &str,
    archived_since: PrimitiveDateTime,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS}
         FROM submissions
         WHERE user_id = $1
           AND archived = TRUE
           AND archived_at >= $2
         ORDER BY archived_at DESC, id DESC"
    ))
    .bind(user_id)
    .bind(archived_since)
    .fetch_all(pool)
    .await
}
