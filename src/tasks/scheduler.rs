use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::time::primitive_now_utc;
use crate::repositories::store::SubmissionStore;
use crate::tasks::retention;

/// Runs the archive sweep once at start-up and then every `every` until
/// `shutdown` flips to `true`.
pub(crate) fn spawn_retention_sweeper(
    store: Arc<dyn SubmissionStore>,
    window: time::Duration,
    every: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(retention_loop(store, window, every, shutdown))
}

async fn retention_loop(
    store: Arc<dyn SubmissionStore>,
    window: time::Duration,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(every.max(Duration::from_secs(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        retention_days = window.whole_days(),
        interval_seconds = every.as_secs(),
        "Archive retention sweeper started"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) =
                    retention::purge_expired_archives(store.as_ref(), primitive_now_utc(), window).await
                {
                    tracing::error!(error = %err, "purge_expired_archives failed");
                }
            }
        }
    }

    tracing::info!("Archive retention sweeper stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Submission;
    use crate::db::types::SubmissionStatus;
    use crate::test_support::{stored_submission, MemorySubmissionStore};

    fn archived(id: &str, days_ago: i64) -> Submission {
        let archived_at = primitive_now_utc() - time::Duration::days(days_ago);
        Submission {
            archived: true,
            archived_at: Some(archived_at),
            ..stored_submission(id, "user-1", SubmissionStatus::Completed, archived_at)
        }
    }

    #[tokio::test]
    async fn sweeps_immediately_and_stops_on_shutdown() {
        let store = Arc::new(MemorySubmissionStore::default());
        store.insert(archived("expired", 46));
        store.insert(archived("recent", 1));
        let (tx, rx) = watch::channel(false);

        let handle = spawn_retention_sweeper(
            store.clone(),
            time::Duration::days(45),
            Duration::from_secs(3600),
            rx,
        );

        tokio::time::timeout(Duration::from_secs(1), async {
            while store.get("expired").is_some() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first sweep ran");
        assert!(store.get("recent").is_some());

        tx.send(true).expect("send shutdown");
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper stopped")
            .expect("join");
    }
}
