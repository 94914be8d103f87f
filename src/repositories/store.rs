use async_trait::async_trait;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Submission, UsageRecord};
use crate::repositories::submissions::{self, ArchiveOutcome, CompletionUpdate, NewSubmission};
use crate::repositories::usage;

/// Durable record of submissions. Status writes are guarded by the expected
/// prior status and report whether a row changed.
#[async_trait]
pub(crate) trait SubmissionStore: Send + Sync {
    async fn create(&self, new: NewSubmission) -> Result<Submission, sqlx::Error>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Submission>, sqlx::Error>;

    async fn find_for_user(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Submission>, sqlx::Error>;

    async fn list_active(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Submission>, sqlx::Error>;

    async fn count_active(&self, user_id: &str) -> Result<i64, sqlx::Error>;

    /// Archived rows with `archived_at >= archived_since`, newest first.
    async fn list_archived(
        &self,
        user_id: &str,
        archived_since: PrimitiveDateTime,
    ) -> Result<Vec<Submission>, sqlx::Error>;

    async fn mark_processing(&self, id: &str, now: PrimitiveDateTime)
        -> Result<bool, sqlx::Error>;

    async fn mark_completed(&self, id: &str, update: CompletionUpdate)
        -> Result<bool, sqlx::Error>;

    async fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now: PrimitiveDateTime,
    ) -> Result<bool, sqlx::Error>;

    async fn archive(
        &self,
        user_id: &str,
        id: &str,
        now: PrimitiveDateTime,
    ) -> Result<Option<ArchiveOutcome>, sqlx::Error>;

    /// Deletes archived rows whose `archived_at` is strictly before `cutoff`.
    async fn purge_archived_before(&self, cutoff: PrimitiveDateTime) -> Result<u64, sqlx::Error>;

    async fn record_usage(&self, record: UsageRecord) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub(crate) struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn create(&self, new: NewSubmission) -> Result<Submission, sqlx::Error> {
        submissions::create(&self.pool, new).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Submission>, sqlx::Error> {
        submissions::find_by_id(&self.pool, id).await
    }

    async fn find_for_user(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Submission>, sqlx::Error> {
        submissions::find_for_user(&self.pool, user_id, id).await
    }

    async fn list_active(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        submissions::list_active_by_user(&self.pool, user_id, offset, limit).await
    }

    async fn count_active(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        submissions::count_active_by_user(&self.pool, user_id).await
    }

    async fn list_archived(
        &self,
        user_id: &str,
        archived_since: PrimitiveDateTime,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        submissions::list_archived_by_user(&self.pool, user_id, archived_since).await
    }

    async fn mark_processing(
        &self,
        id: &str,
        now: PrimitiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        submissions::mark_processing(&self.pool, id, now).await
    }

    async fn mark_completed(
        &self,
        id: &str,
        update: CompletionUpdate,
    ) -> Result<bool, sqlx::Error> {
        submissions::mark_completed(&self.pool, id, update).await
    }

    async fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now: PrimitiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        submissions::mark_failed(&self.pool, id, error, now).await
    }

    async fn archive(
        &self,
        user_id: &str,
        id: &str,
        now: PrimitiveDateTime,
    ) -> Result<Option<ArchiveOutcome>, sqlx::Error> {
        submissions::archive(&self.pool, user_id, id, now).await
    }

    async fn purge_archived_before(&self, cutoff: PrimitiveDateTime) -> Result<u64, sqlx::Error> {
        submissions::purge_archived_before(&self.pool, cutoff).await
    }

    async fn record_usage(&self, record: UsageRecord) -> Result<(), sqlx::Error> {
        usage::insert(&self.pool, &record).await
    }
}
