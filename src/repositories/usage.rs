use sqlx::PgPool;

use crate::db::models::UsageRecord;

pub(crate) async fn insert(pool: &PgPool, record: &UsageRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO usage_records (id, user_id, submission_id, word_count, model_used, recorded_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.submission_id)
    .bind(record.word_count)
    .bind(record.model_used)
    .bind(record.recorded_at)
    .execute(pool)
    .await?;
    Ok(())
}
