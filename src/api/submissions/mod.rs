mod archive;
mod handlers;
mod stream;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/submissions", get(handlers::list_submissions).post(handlers::create_submission))
        .route(
            "/submissions/:submission_id",
            get(handlers::get_submission).delete(archive::archive_submission),
        )
        .route("/archive", get(archive::list_archived))
        .route("/stream/submissions/:submission_id", get(stream::stream_submission))
}
