use std::net::SocketAddr;

use profile_service::config::Config;
use profile_service::startup::{HttpSettings, build_app, build_context};
use profile_telemetry::{init_metrics, setup_telemetry};
use tokio::signal;
use tracing::{error, info};

/// Build version (injected at compile time)
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::init()?;
    let telemetry = setup_telemetry(&config.telemetry());
    let metrics_handle = init_metrics()?;

    info!(
        version = VERSION,
        address = %config.http_address,
        otlp = config.otlp_endpoint.is_some(),
        storage = config.s3_url.is_some(),
        pid = std::process::id(),
        "Starting profile-service"
    );

    let addr: SocketAddr = config.http_address.parse()?;
    let ctx = build_context(&config).await?;
    let app = build_app(&HttpSettings::from_config(&config), ctx, Some(metrics_handle));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
