//! Serve command - runs the API with the background registry refresh

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};
use crate::infrastructure::services::{RefreshScheduler, RefreshSchedulerConfig};

/// Run the API server
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let metrics = init_metrics(&config.metrics);

    let state = crate::create_app_state_with_config(&config).await?;

    // Requests cannot be answered without categories
    match state.registry_service.refresh().await {
        Ok(count) => info!(categories = count, "Category registry initialized"),
        Err(e) => {
            error!(error = %e, "Initial category registry build failed");
            return Err(e.into());
        }
    }

    let mut scheduler = RefreshScheduler::new(
        state.registry_service.clone(),
        RefreshSchedulerConfig {
            interval: config.categories.refresh_interval(),
        },
    );
    scheduler.start();

    let mut app: Router = create_router(state);
    if let Some(m) = metrics {
        app = app.merge(create_metrics_router(m, &config.metrics.path));
    }

    let addr = build_socket_addr(&config)?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    scheduler.stop().await;
    served?;

    info!("API server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_socket_addr() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9000;

        let addr = build_socket_addr(&config).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_build_socket_addr_rejects_hostname() {
        let mut config = AppConfig::default();
        config.server.host = "localhost".to_string();

        assert!(build_socket_addr(&config).is_err());
    }
}
