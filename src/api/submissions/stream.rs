use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::{
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use futures::{Stream, StreamExt};
use time::OffsetDateTime;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::format_offset;
use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;
use crate::schemas::submission::SubmissionResponse;
use crate::services::streaming::{SubmissionEvent, Subscription};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

enum Next {
    Event(SubmissionEvent),
    Closed,
    Keepalive,
}

pub(crate) async fn stream_submission(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(submission_id): Path<String>,
) -> Result<Response, ApiError> {
    let submission = state
        .store()
        .find_for_user(&user_id, &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    metrics::counter!("stream_connections_total").increment(1);
    tracing::debug!(
        submission_id = %submission_id,
        status = submission.status.as_str(),
        "Stream opened"
    );

    if submission.status.is_terminal() {
        return Ok(sse_response(replay(terminal_events(&submission))));
    }

    // Registered before returning so events published from here on are kept.
    let subscription = state.hub().register(&submission.id);

    let current = match state.store().find_by_id(&submission.id).await {
        Ok(Some(row)) => row,
        Ok(None) => submission,
        Err(err) => {
            tracing::warn!(error = %err, submission_id = %submission_id, "Failed to re-read submission");
            submission
        }
    };

    if current.status.is_terminal() {
        drop(subscription);
        return Ok(sse_response(replay(terminal_events(&current))));
    }

    let keepalive = Duration::from_secs(state.settings().streaming().keepalive_seconds.max(1));
    Ok(sse_response(live(state, current, subscription, keepalive)))
}

fn live(
    state: AppState,
    snapshot: Submission,
    mut subscription: Subscription,
    keepalive: Duration,
) -> impl Stream<Item = SubmissionEvent> {
    stream! {
        let mut last_status = snapshot.status;
        yield status_event(&snapshot, last_status);

        let mut ticker = interval_at(Instant::now() + keepalive, keepalive);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let next = tokio::select! {
                event = subscription.recv() => match event {
                    Some(event) => Next::Event(event),
                    None => Next::Closed,
                },
                _ = ticker.tick() => Next::Keepalive,
            };

            match next {
                Next::Event(SubmissionEvent::Status { status, .. }) if status == last_status => {
                    // Already sent as the opening snapshot.
                }
                Next::Event(event) => {
                    if let SubmissionEvent::Status { status, .. } = &event {
                        last_status = *status;
                    }
                    let is_end = event.is_end();
                    yield event;
                    if is_end {
                        break;
                    }
                }
                Next::Keepalive => {
                    yield SubmissionEvent::Ping { timestamp: format_offset(OffsetDateTime::now_utc()) };
                }
                Next::Closed => {
                    // The hub closed without an end event reaching this listener.
                    let events = match state.store().find_by_id(&snapshot.id).await {
                        Ok(Some(row)) if row.status.is_terminal() => terminal_events(&row),
                        Ok(_) => vec![SubmissionEvent::End { submission_id: snapshot.id.clone() }],
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                submission_id = %snapshot.id,
                                "Failed to re-read closed submission"
                            );
                            vec![SubmissionEvent::End { submission_id: snapshot.id.clone() }]
                        }
                    };
                    for event in events {
                        yield event;
                    }
                    break;
                }
            }
        }

        subscription.unregister();
        tracing::debug!(submission_id = %snapshot.id, "Stream finished");
    }
}

fn replay(events: Vec<SubmissionEvent>) -> impl Stream<Item = SubmissionEvent> {
    futures::stream::iter(events)
}

fn sse_response<S>(events: S) -> Response
where
    S: Stream<Item = SubmissionEvent> + Send + 'static,
{
    let events = events.map(|event| Ok::<_, Infallible>(to_sse(&event)));
    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (X_ACCEL_BUFFERING, HeaderValue::from_static("no")),
        ],
        Sse::new(events),
    )
        .into_response()
}

fn to_sse(event: &SubmissionEvent) -> Event {
    Event::default().event(event.kind()).data(event.payload().to_string())
}

fn status_event(submission: &Submission, status: SubmissionStatus) -> SubmissionEvent {
    SubmissionEvent::Status {
        submission_id: submission.id.clone(),
        request_id: submission.request_id.clone(),
        status,
    }
}

/// `result` or `failure` followed by `end`, rebuilt from the stored row.
fn terminal_events(submission: &Submission) -> Vec<SubmissionEvent> {
    let mut events = Vec::with_capacity(2);
    match submission.status {
        SubmissionStatus::Completed => events.push(SubmissionEvent::Result(Box::new(
            SubmissionResponse::from(submission.clone()),
        ))),
        SubmissionStatus::Failed => events.push(SubmissionEvent::Failure {
            submission_id: submission.id.clone(),
            error: submission.error.clone().unwrap_or_default(),
        }),
        SubmissionStatus::Pending | SubmissionStatus::Processing => {}
    }
    events.push(SubmissionEvent::End { submission_id: submission.id.clone() });
    events
}
