//! Operational routes: service banner, health checks and metrics.

use axum::{Json, Router, extract::State, routing::get};
use profile_telemetry::PrometheusHandle;
use serde::Serialize;

use crate::startup::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    checks: Option<HealthChecks>,
}

#[derive(Serialize)]
pub struct HealthChecks {
    database: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<CheckResult>,
}

#[derive(Serialize)]
pub struct CheckResult {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CheckResult {
    const fn healthy() -> Self {
        Self {
            status: "healthy",
            message: None,
        }
    }

    fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            message: Some(message.into()),
        }
    }

    fn from_outcome(ok: bool, failure: &str) -> Self {
        if ok {
            Self::healthy()
        } else {
            Self::unhealthy(failure)
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Build version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Banner and health routes.
pub fn rest_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "profile-service" }))
        .route("/health", get(|| async { "OK" }))
        .route("/health/live", get(|| async { "OK" }))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
}

/// Prometheus scrape endpoint.
pub fn metrics_routes(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

async fn readiness_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_check = CheckResult::from_outcome(
        state.ctx.profiles().health_check().await,
        "Database connection failed",
    );

    let storage_check = match state.ctx.media() {
        Some(media) => Some(CheckResult::from_outcome(
            media.health_check().await,
            "S3 connection failed",
        )),
        None => None,
    };

    let healthy =
        db_check.is_healthy() && storage_check.as_ref().is_none_or(CheckResult::is_healthy);

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        version: VERSION,
        checks: Some(HealthChecks {
            database: db_check,
            storage: storage_check,
        }),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::services::testing::Harness;

    async fn ready(h: &Harness) -> Value {
        let app = rest_routes(AppState {
            ctx: h.ctx.clone(),
        });
        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn liveness_is_plain_ok() {
        let h = Harness::new(&[]);
        let app = rest_routes(AppState { ctx: h.ctx.clone() });

        let response = app
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn readiness_reports_all_checks() {
        let h = Harness::new(&[]);

        let body = ready(&h).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], VERSION);
        assert_eq!(body["checks"]["database"], json!({ "status": "healthy" }));
        assert_eq!(body["checks"]["storage"], json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn readiness_flags_database_outage() {
        let h = Harness::new(&[]);
        h.profiles.set_failing(true);

        let body = ready(&h).await;

        assert_eq!(body["status"], "unhealthy");
        assert_eq!(
            body["checks"]["database"],
            json!({ "status": "unhealthy", "message": "Database connection failed" })
        );
    }

    #[tokio::test]
    async fn readiness_omits_unconfigured_storage() {
        let h = Harness::without_media(&[]);

        let body = ready(&h).await;

        assert_eq!(body["status"], "healthy");
        assert!(body["checks"].get("storage").is_none());
    }
}
