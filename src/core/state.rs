use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::repositories::store::SubmissionStore;
use crate::services::correction::CorrectionProvider;
use crate::services::pipeline::SubmissionPipeline;
use crate::services::streaming::StreamHub;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    store: Arc<dyn SubmissionStore>,
    hub: StreamHub,
    pipeline: SubmissionPipeline,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        store: Arc<dyn SubmissionStore>,
        provider: Arc<dyn CorrectionProvider>,
    ) -> Self {
        let hub = StreamHub::new(settings.streaming().listener_capacity);
        let pipeline =
            SubmissionPipeline::new(store.clone(), provider, hub.clone(), settings.submissions());

        Self { inner: Arc::new(InnerState { settings, db, store, hub, pipeline }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.inner.store
    }

    pub(crate) fn hub(&self) -> &StreamHub {
        &self.inner.hub
    }

    pub(crate) fn pipeline(&self) -> &SubmissionPipeline {
        &self.inner.pipeline
    }
}
