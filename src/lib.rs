pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::repositories::store::PgSubmissionStore;
use crate::services::correction::OpenAiCorrectionProvider;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let provider = OpenAiCorrectionProvider::from_settings(&settings)?;
    if settings.ai().openai_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; corrections will fail");
    }

    let store = Arc::new(PgSubmissionStore::new(db_pool.clone()));
    let state = AppState::new(settings, db_pool, store, Arc::new(provider));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retention = state.settings().retention();
    let sweeper = tasks::scheduler::spawn_retention_sweeper(
        state.store().clone(),
        retention.window(),
        Duration::from_secs(retention.sweep_interval_seconds),
        shutdown_rx,
    );

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Proofread API listening"
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(core::shutdown::shutdown_signal(shutdown_tx))
        .await;

    if let Err(err) = sweeper.await {
        tracing::error!(error = %err, "Retention sweeper join failed");
    }

    result?;

    Ok(())
}
