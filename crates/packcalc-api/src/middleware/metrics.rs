//! # Prometheus Metrics
//!
//! Metrics are recorded through the `metrics` facade and exported by
//! `metrics-exporter-prometheus`. Without an installed recorder every call
//! here is a no-op, which is how tests and `METRICS_ENABLED=false` run.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `packcalc_http_requests_total` | counter | method, path, status |
//! | `packcalc_http_request_duration_seconds` | histogram | method, path |
//! | `packcalc_optimizer_duration_seconds` | histogram | |
//! | `packcalc_calculation_cache_total` | counter | source, outcome |

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const HTTP_REQUESTS_TOTAL: &str = "packcalc_http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "packcalc_http_request_duration_seconds";
pub const OPTIMIZER_DURATION: &str = "packcalc_optimizer_duration_seconds";
pub const CACHE_LOOKUPS_TOTAL: &str = "packcalc_calculation_cache_total";

/// Where a calculation result was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    Database,
}

impl CacheSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Database => "database",
        }
    }
}

/// Install the global Prometheus recorder and return the scrape handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Middleware that records request counts and latency per matched route.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    // Route templates keep label cardinality bounded.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(HTTP_REQUEST_DURATION, "method" => method, "path" => path)
        .record(started.elapsed().as_secs_f64());

    response
}

pub fn record_optimizer_duration(elapsed: Duration) {
    metrics::histogram!(OPTIMIZER_DURATION).record(elapsed.as_secs_f64());
}

pub fn record_cache_lookup(source: CacheSource, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    metrics::counter!(
        CACHE_LOOKUPS_TOTAL,
        "source" => source.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_optimizer_duration(Duration::from_millis(3));
        record_cache_lookup(CacheSource::Memory, true);
        record_cache_lookup(CacheSource::Database, false);
    }

    #[test]
    fn cache_source_labels() {
        assert_eq!(CacheSource::Memory.as_str(), "memory");
        assert_eq!(CacheSource::Database.as_str(), "database");
    }
}
