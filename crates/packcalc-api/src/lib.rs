//! # packcalc-api — HTTP Service for the Pack Calculator
//!
//! Serves pack-size configuration and order calculation over JSON, backed by
//! `packcalc-core`. Persistence to PostgreSQL is optional.
//!
//! ## API Surface
//!
//! | Method | Path | Module |
//! |--------|------|--------|
//! | `GET`  | `/api/packs` | [`routes::packs`] |
//! | `POST` | `/api/packs` | [`routes::packs`] |
//! | `POST` | `/api/calculate` | [`routes::calculate`] |
//! | `GET`  | `/health/liveness`, `/health/readiness` | probes |
//! | `GET`  | `/metrics` | Prometheus scrape (when enabled) |
//! | `GET`  | `/openapi.json` | [`openapi`] |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! Rate limiting applies to `/api/*` only; probes, `/metrics` and the
//! OpenAPI document are never limited.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};

use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(routes::packs::router())
        .merge(routes::calculate::router());

    if let Some(config) = state.config.rate_limit.clone() {
        api = api
            .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
            .layer(Extension(RateLimiter::new(config)));
    }

    let mut public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router());

    if state.metrics.is_some() {
        public = public.route("/metrics", get(prometheus_metrics));
    }

    let mut router = Router::new().merge(public).merge(api);
    if state.metrics.is_some() {
        router = router.layer(from_fn(middleware::metrics::metrics_middleware));
    }

    router
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: checks the database when one is configured.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
