use anyhow::{Context, Result};
use time::{Duration, PrimitiveDateTime};

use crate::core::time::retention_cutoff;
use crate::repositories::store::SubmissionStore;

/// Deletes archived submissions whose `archived_at` fell out of the window.
/// Active rows and rows without an archive timestamp never match.
pub(crate) async fn purge_expired_archives(
    store: &dyn SubmissionStore,
    now: PrimitiveDateTime,
    window: Duration,
) -> Result<u64> {
    let cutoff = retention_cutoff(now, window);
    let purged = store
        .purge_archived_before(cutoff)
        .await
        .context("Failed to purge expired archived submissions")?;

    if purged > 0 {
        tracing::info!(purged, retention_days = window.whole_days(), "Purged expired archives");
        metrics::counter!("archived_submissions_purged_total").increment(purged);
    }

    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::Submission;
    use crate::db::types::SubmissionStatus;
    use crate::test_support::{stored_submission, MemorySubmissionStore};

    fn row(id: &str, archived_at: Option<PrimitiveDateTime>) -> Submission {
        let created_at = primitive_now_utc() - Duration::days(60);
        Submission {
            archived: archived_at.is_some(),
            archived_at,
            ..stored_submission(id, "user-1", SubmissionStatus::Completed, created_at)
        }
    }

    #[tokio::test]
    async fn removes_only_archives_older_than_the_window() {
        let store = MemorySubmissionStore::default();
        let now = primitive_now_utc();
        store.insert(row("expired", Some(now - Duration::days(46))));
        store.insert(row("retained", Some(now - Duration::days(44))));
        store.insert(row("active", None));

        let purged = purge_expired_archives(&store, now, Duration::days(45)).await.expect("sweep");

        assert_eq!(purged, 1);
        assert!(store.get("expired").is_none());
        assert!(store.get("retained").is_some());
        assert!(store.get("active").is_some());
    }

    #[tokio::test]
    async fn repeated_sweeps_are_idempotent() {
        let store = MemorySubmissionStore::default();
        let now = primitive_now_utc();
        store.insert(row("expired", Some(now - Duration::days(90))));

        let window = Duration::days(45);
        assert_eq!(purge_expired_archives(&store, now, window).await.expect("sweep"), 1);
        assert_eq!(purge_expired_archives(&store, now, window).await.expect("sweep"), 0);
    }
}
