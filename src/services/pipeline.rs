use std::sync::Arc;
use std::time::Instant;

use sqlx::types::Json;
use thiserror::Error;
use time::PrimitiveDateTime;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::config::SubmissionSettings;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Submission, UsageRecord};
use crate::db::types::{ModelTier, SubmissionStatus};
use crate::repositories::store::SubmissionStore;
use crate::repositories::submissions::{CompletionUpdate, NewSubmission};
use crate::schemas::submission::SubmissionResponse;
use crate::services::correction::{CorrectionOutcome, CorrectionProvider, CorrectionRequest};
use crate::services::streaming::{StreamHub, SubmissionEvent};
use crate::services::text::count_words;

#[derive(Debug, Error)]
pub(crate) enum PipelineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Provider(String),
    #[error("failed to persist submission: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub(crate) struct SubmitOptions {
    pub(crate) text: String,
    pub(crate) rich_text: Option<String>,
    pub(crate) include_alternatives: bool,
    pub(crate) save_draft: bool,
}

pub(crate) enum SubmitOutcome {
    /// Persisted as `pending`; `task` runs detached and may be dropped.
    Accepted { submission: Submission, task: JoinHandle<()> },
    /// Inline correction, nothing persisted.
    Immediate { word_count: usize, model: ModelTier, outcome: CorrectionOutcome },
}

/// Owns the lifecycle of a submission from validation to its terminal state.
#[derive(Clone)]
pub(crate) struct SubmissionPipeline {
    store: Arc<dyn SubmissionStore>,
    provider: Arc<dyn CorrectionProvider>,
    hub: StreamHub,
    permits: Arc<Semaphore>,
    max_text_bytes: usize,
    model_threshold_words: usize,
}

impl SubmissionPipeline {
    pub(crate) fn new(
        store: Arc<dyn SubmissionStore>,
        provider: Arc<dyn CorrectionProvider>,
        hub: StreamHub,
        limits: &SubmissionSettings,
    ) -> Self {
        Self {
            store,
            provider,
            hub,
            permits: Arc::new(Semaphore::new(limits.max_concurrent_corrections.max(1))),
            max_text_bytes: limits.max_text_bytes,
            model_threshold_words: limits.model_threshold_words,
        }
    }

    pub(crate) async fn submit(
        &self,
        user_id: &str,
        request_id: &str,
        options: SubmitOptions,
    ) -> Result<SubmitOutcome, PipelineError> {
        let text = options.text.trim();
        if text.is_empty() {
            return Err(PipelineError::Validation("Text cannot be empty".to_string()));
        }
        if text.len() > self.max_text_bytes {
            return Err(PipelineError::Validation(format!(
                "Text is too long (max {}KB)",
                self.max_text_bytes.div_ceil(1000)
            )));
        }

        let word_count = count_words(text);
        if word_count == 0 {
            return Err(PipelineError::Validation("No valid words found in text".to_string()));
        }
        let model = ModelTier::for_word_count(word_count, self.model_threshold_words);

        if !options.save_draft {
            let outcome = self
                .provider
                .correct(CorrectionRequest {
                    text: text.to_string(),
                    word_count,
                    model,
                    include_alternatives: options.include_alternatives,
                    request_id: request_id.to_string(),
                })
                .await
                .map_err(|err| PipelineError::Provider(error_message(&err)))?;

            metrics::counter!("submissions_created_total", "mode" => "inline").increment(1);
            return Ok(SubmitOutcome::Immediate { word_count, model, outcome });
        }

        let now = primitive_now_utc();
        let submission = self
            .store
            .create(NewSubmission {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                request_id: request_id.to_string(),
                original_text: text.to_string(),
                original_rich_text: options.rich_text,
                word_count: i32::try_from(word_count).unwrap_or(i32::MAX),
                model_used: model,
                include_alternatives: options.include_alternatives,
                created_at: now,
            })
            .await?;

        metrics::counter!("submissions_created_total", "mode" => "durable").increment(1);
        tracing::info!(
            submission_id = %submission.id,
            request_id,
            user_id,
            word_count,
            model = model.as_str(),
            "Submission accepted"
        );

        self.record_usage(&submission);
        let task = self.spawn(submission.clone());

        Ok(SubmitOutcome::Accepted { submission, task })
    }

    fn record_usage(&self, submission: &Submission) {
        let store = self.store.clone();
        let record = UsageRecord {
            id: Uuid::new_v4().to_string(),
            user_id: submission.user_id.clone(),
            submission_id: Some(submission.id.clone()),
            word_count: submission.word_count,
            model_used: submission.model_used,
            recorded_at: submission.created_at,
        };

        tokio::spawn(async move {
            if let Err(err) = store.record_usage(record).await {
                tracing::warn!(error = %err, "Failed to record usage");
            }
        });
    }

    fn spawn(&self, submission: Submission) -> JoinHandle<()> {
        let pipeline = self.clone();
        let span = tracing::info_span!(
            "submission_pipeline",
            submission_id = %submission.id,
            request_id = %submission.request_id
        );

        tokio::spawn(async move { pipeline.process(submission).await }.instrument(span))
    }

    async fn process(&self, submission: Submission) {
        // Never closed; an error would only mean running unthrottled.
        let _permit = self.permits.acquire().await.ok();

        match self.store.mark_processing(&submission.id, primitive_now_utc()).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Submission is no longer pending, skipping");
                self.publish_stored_outcome(&submission.id).await;
                self.hub.close(&submission.id);
                return;
            }
            // The terminal writes also accept `pending`, so the run continues.
            Err(err) => tracing::error!(error = %err, "Failed to mark submission processing"),
        }
        self.publish_status(&submission, SubmissionStatus::Processing);

        let started = Instant::now();
        let result = self
            .provider
            .correct(CorrectionRequest {
                text: submission.original_text.clone(),
                word_count: usize::try_from(submission.word_count).unwrap_or_default(),
                model: submission.model_used,
                include_alternatives: submission.include_alternatives,
                request_id: submission.request_id.clone(),
            })
            .await;
        metrics::histogram!("correction_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => self.complete(submission.clone(), outcome).await,
            Err(err) => self.fail(&submission, error_message(&err)).await,
        }

        self.hub.close(&submission.id);
    }

    async fn fail(&self, submission: &Submission, error: String) {
        tracing::warn!(error = %error, "Correction failed");

        match self.store.mark_failed(&submission.id, &error, primitive_now_utc()).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Submission was already terminal before failure was recorded");
                if self.publish_stored_outcome(&submission.id).await {
                    return;
                }
            }
            Err(err) => tracing::error!(error = %err, "Failed to persist submission failure"),
        }

        metrics::counter!("submission_pipeline_total", "status" => "failed").increment(1);
        self.publish_status(submission, SubmissionStatus::Failed);
        self.hub.publish(
            &submission.id,
            SubmissionEvent::Failure { submission_id: submission.id.clone(), error },
        );
        self.publish_end(submission);
    }

    async fn complete(&self, submission: Submission, outcome: CorrectionOutcome) {
        let completed_at = primitive_now_utc();
        let update = CompletionUpdate {
            corrected_text: outcome.corrected_text.clone(),
            suggestions: outcome.suggestions.clone(),
            alternatives: outcome.alternatives.clone(),
            processing_time: outcome.duration_seconds,
            completed_at,
        };

        let persisted = match self.store.mark_completed(&submission.id, update).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("Submission was already terminal before result was recorded");
                if self.publish_stored_outcome(&submission.id).await {
                    return;
                }
                false
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to persist correction result");
                false
            }
        };

        let reloaded = if persisted {
            match self.store.find_by_id(&submission.id).await {
                Ok(row) => row,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to reload completed submission");
                    None
                }
            }
        } else {
            None
        };
        let snapshot = reloaded
            .unwrap_or_else(|| apply_completion(submission.clone(), &outcome, completed_at));

        metrics::counter!("submission_pipeline_total", "status" => "completed").increment(1);
        tracing::info!(
            duration_seconds = outcome.duration_seconds,
            suggestions = outcome.suggestions.len(),
            "Submission completed"
        );

        self.publish_status(&submission, SubmissionStatus::Completed);
        self.hub.publish(
            &submission.id,
            SubmissionEvent::Result(Box::new(SubmissionResponse::from(snapshot))),
        );
        self.publish_end(&submission);
    }

    /// Publishes the terminal events of the stored row. Returns `false` when
    /// the row is missing, unreadable or not terminal.
    async fn publish_stored_outcome(&self, submission_id: &str) -> bool {
        let row = match self.store.find_by_id(submission_id).await {
            Ok(Some(row)) if row.status.is_terminal() => row,
            Ok(_) => return false,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read stored outcome");
                return false;
            }
        };

        self.publish_status(&row, row.status);
        let event = match row.status {
            SubmissionStatus::Failed => SubmissionEvent::Failure {
                submission_id: row.id.clone(),
                error: row.error.clone().unwrap_or_default(),
            },
            _ => SubmissionEvent::Result(Box::new(SubmissionResponse::from(row.clone()))),
        };
        self.hub.publish(&row.id, event);
        self.publish_end(&row);
        true
    }

    fn publish_status(&self, submission: &Submission, status: SubmissionStatus) {
        self.hub.publish(
            &submission.id,
            SubmissionEvent::Status {
                submission_id: submission.id.clone(),
                request_id: submission.request_id.clone(),
                status,
            },
        );
    }

    fn publish_end(&self, submission: &Submission) {
        self.hub.publish(&submission.id, SubmissionEvent::End { submission_id: submission.id.clone() });
    }
}

fn apply_completion(
    mut submission: Submission,
    outcome: &CorrectionOutcome,
    completed_at: PrimitiveDateTime,
) -> Submission {
    submission.status = SubmissionStatus::Completed;
    submission.corrected_text = Some(outcome.corrected_text.clone());
    submission.suggestions = Json(outcome.suggestions.clone());
    submission.alternatives = Json(outcome.alternatives.clone());
    submission.processing_time = Some(outcome.duration_seconds);
    submission.error = None;
    submission.updated_at = completed_at;
    submission
}

fn error_message(err: &anyhow::Error) -> String {
    let message = format!("{err:#}");
    if message.trim().is_empty() {
        "correction failed".to_string()
    } else {
        message
    }
}
