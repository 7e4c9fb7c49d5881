//! Server startup and wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http::{HeaderName, HeaderValue, Request, StatusCode};
use profile_db::{Database, DbConfig, create_pool};
use profile_identity::IdentityToolkit;
use profile_storage::{MediaStore, S3Config, S3Storage};
use profile_telemetry::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};

use crate::config::Config;
use crate::core::ServiceContext;
use crate::middleware::{MetricsLayer, REQUEST_ID_HEADER, RequestId, RequestIdLayer};
use crate::routes::{metrics_routes, rest_routes};
use crate::services::{ProfileService, profile_routes};

/// Body allowance on top of the picture, for text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state for the operational routes.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ServiceContext>,
}

/// HTTP-level settings for [`build_app`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub max_photo_bytes: usize,
    pub request_timeout: Duration,
    pub cors_allow_origins: Option<String>,
}

impl HttpSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_photo_bytes: config.max_photo_bytes,
            request_timeout: config.request_timeout(),
            cors_allow_origins: config.cors_allow_origins.clone(),
        }
    }

    const fn max_body_bytes(&self) -> usize {
        self.max_photo_bytes.saturating_add(FORM_OVERHEAD_BYTES)
    }
}

/// Connect the external services and build the shared context.
pub async fn build_context(config: &Config) -> anyhow::Result<Arc<ServiceContext>> {
    // Database
    let db_config = DbConfig {
        url: config.database_url(),
        pool_min: config.db_pool_min,
        pool_max: config.db_pool_max,
        connect_timeout: config.db_connect_timeout(),
    };
    let pool = create_pool(&db_config).await?;
    info!("Connected to database");
    let database = Database::new(pool);
    if config.db_migrate {
        database.migrate().await?;
    }

    // Auth provider
    let identity = IdentityToolkit::new(&config.identity())?;

    // Object storage
    let media = init_s3(config)?;

    // Upload staging
    let upload_dir = config.upload_dir();
    tokio::fs::create_dir_all(&upload_dir).await?;
    info!(upload_dir = %upload_dir.display(), "Upload staging ready");

    Ok(Arc::new(ServiceContext::new(
        Arc::new(identity),
        Arc::new(database.profiles),
        media,
        upload_dir,
    )))
}

/// Build the router with all routes and the middleware stack.
pub fn build_app(
    settings: &HttpSettings,
    ctx: Arc<ServiceContext>,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let profiles = Arc::new(ProfileService::new(Arc::clone(&ctx)));

    let mut router = rest_routes(AppState { ctx })
        .merge(profile_routes(profiles, settings.max_body_bytes()));
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics_routes(handle));
    }

    let cors = build_cors(settings.cors_allow_origins.as_deref());

    // Build middleware stack with ServiceBuilder (executes top-to-bottom on request)
    let middleware = ServiceBuilder::new()
        // 1. Request ID - generate/propagate first
        .layer(RequestIdLayer::new())
        // 2. Metrics - count every response, timeouts included
        .layer(MetricsLayer::new())
        // 3. Tracing - create span with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let request_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map_or("", RequestId::as_str);
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request_id,
                    )
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG)),
        )
        // 4. Timeout - prevent hung requests
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            settings.request_timeout,
        ))
        // 5. CORS
        .layer(cors);

    router.layer(middleware)
}

fn init_s3(config: &Config) -> anyhow::Result<Option<Arc<dyn MediaStore>>> {
    match (
        &config.s3_url,
        &config.s3_access_key_id,
        &config.s3_secret_access_key,
    ) {
        (Some(url), Some(key), Some(secret)) => {
            let s3_config = S3Config::from_url(url, key.clone(), secret.clone())?
                .with_region(config.s3_region.clone())
                .with_public_url(config.s3_public_url.clone());
            Ok(Some(Arc::new(S3Storage::new(&s3_config))))
        }
        _ => {
            info!("S3 not configured, picture uploads disabled");
            Ok(None)
        }
    }
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = match origins {
        Some(o) if o.trim() == "*" => CorsLayer::permissive(),
        Some(o) => {
            let origins: Vec<HeaderValue> =
                o.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            CorsLayer::new().allow_origin(origins)
        }
        None => CorsLayer::permissive(),
    };

    cors.allow_headers(Any)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_methods(Any)
        .max_age(Duration::from_secs(3600))
}
