//! Request metrics middleware.
//!
//! Records request count and duration using the `metrics` crate (rendered by
//! the Prometheus exporter).
//!
//! # Metrics Emitted
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `http_requests_total` | Counter | `method`, `path`, `status` | Total request count |
//! | `http_request_duration_seconds` | Histogram | `method`, `path`, `status` | Request latency |
//!
//! `path` is the normalized route: `/profile/{uid}` for any profile id, and
//! `/*` for anything unrecognized, so label cardinality stays bounded.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http::{Request, Response};
use tower::{Layer, Service};

/// Routes reported verbatim.
const KNOWN_PATHS: &[&str] = &[
    "/",
    "/health",
    "/health/live",
    "/health/ready",
    "/metrics",
    "/profile",
];

/// Label for every `/profile/<uid>` request.
const PROFILE_ROUTE: &str = "/profile/{uid}";

/// Tower layer for request metrics collection.
///
/// Must be placed right after `RequestIdLayer` so it captures the full
/// request lifecycle, including timeouts.
#[derive(Clone, Copy, Default)]
pub struct MetricsLayer;

impl MetricsLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

/// Metrics middleware service.
#[derive(Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().to_string();
        let path = normalize_path(req.uri().path()).to_string();

        let start = Instant::now();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            let duration = start.elapsed().as_secs_f64();
            let labels = [
                ("method", method),
                ("path", path),
                ("status", response.status().as_u16().to_string()),
            ];

            metrics::counter!("http_requests_total", &labels).increment(1);
            metrics::histogram!("http_request_duration_seconds", &labels).record(duration);

            Ok(response)
        })
    }
}

/// Map a request path to a bounded route label.
fn normalize_path(path: &str) -> &str {
    if let Some(known) = KNOWN_PATHS.iter().copied().find(|known| *known == path) {
        return known;
    }

    match path.strip_prefix("/profile/") {
        Some(uid) if !uid.is_empty() && !uid.contains('/') => PROFILE_ROUTE,
        _ => "/*",
    }
}
