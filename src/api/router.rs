use std::time::Duration;

use axum::{
    body::Body,
    http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, ORIGIN},
    http::{HeaderName, Method, Request, Response},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::api::handlers;
use crate::api::submissions;
use crate::core::{config::Settings, state::AppState};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub(crate) fn router(state: AppState) -> Router {
    let settings = state.settings();

    let mut routes: Router<AppState> = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz).head(handlers::healthz))
        .nest(&settings.api().api_v1_str, submissions::router());

    if settings.telemetry().prometheus_enabled {
        routes = routes.route("/metrics", get(handlers::metrics));
    }

    with_http_layers(routes, settings).with_state(state)
}

/// Outermost first: CORS, tracing, request id assignment, echo, path
/// normalisation.
fn with_http_layers(routes: Router<AppState>, settings: &Settings) -> Router<AppState> {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(&REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            let status = status_class(response.status().as_u16());
            metrics::counter!("http_requests_total", "status" => status).increment(1);
            metrics::histogram!("http_request_duration_seconds", "status" => status)
                .record(latency.as_secs_f64());
        });

    routes
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        .layer(trace)
        .layer(cors_layer(settings))
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors()
        .origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT, ORIGIN, CACHE_CONTROL, REQUEST_ID])
        .expose_headers([REQUEST_ID])
        .max_age(Duration::from_secs(3600));

    // A wildcard origin cannot be combined with credentials.
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_credentials(true).allow_origin(AllowOrigin::list(origins))
    }
}
